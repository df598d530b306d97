//! Constant/literal rendering shared by the method emitter's default-value
//! pseudo-directives (§4.7) and the field emitter's literal-value suffix
//! (§4.8). Both reduce to the same per-kind template; only the surrounding
//! punctuation differs, which the two call sites add themselves.

use crate::format::instructions::format_round_trip;
use crate::metadata::ConstantValue;

/// The aliased primitive name a constant's own kind maps to, used as the
/// `<typename>` in `<typename>(<const>)` when the caller doesn't have a
/// more specific type in hand (e.g. an enum's underlying type).
pub fn intrinsic_type_name(value: &ConstantValue) -> &'static str {
	match value {
		ConstantValue::Bool(_) => "bool",
		ConstantValue::Char(_) => "char",
		ConstantValue::I8(_) => "int8",
		ConstantValue::U8(_) => "uint8",
		ConstantValue::I16(_) => "int16",
		ConstantValue::U16(_) => "uint16",
		ConstantValue::I32(_) => "int32",
		ConstantValue::U32(_) => "uint32",
		ConstantValue::I64(_) => "int64",
		ConstantValue::U64(_) => "uint64",
		ConstantValue::F32(_) => "float32",
		ConstantValue::F64(_) => "float64",
		ConstantValue::String(_) => "string",
		ConstantValue::NullRef => "object",
	}
}

/// Renders a constant per §4.7's per-kind template:
/// strings as a bare quoted literal, null as the bare `nullref` keyword,
/// integers as `<typename>(0xHH…)` with width-appropriate hex padding,
/// floats as `<typename>(G9/G17 text)`, everything else as
/// `<typename>(textual-form)`. `type_name` overrides the intrinsic name
/// (used for enum literals, which render under their underlying primitive's
/// name rather than their own).
pub fn render_constant(value: &ConstantValue, type_name: &str) -> String {
	match value {
		ConstantValue::String(s) => format!("\"{s}\""),
		ConstantValue::NullRef => "nullref".to_string(),
		ConstantValue::I8(v) => format!("{type_name}({:#04X})", *v as u8).to_lowercase_hex_prefix(),
		ConstantValue::U8(v) => format!("{type_name}({v:#04X})").to_lowercase_hex_prefix(),
		ConstantValue::I16(v) => format!("{type_name}({:#06X})", *v as u16).to_lowercase_hex_prefix(),
		ConstantValue::U16(v) => format!("{type_name}({v:#06X})").to_lowercase_hex_prefix(),
		ConstantValue::I32(v) => format!("{type_name}({:#010X})", *v as u32).to_lowercase_hex_prefix(),
		ConstantValue::U32(v) => format!("{type_name}({v:#010X})").to_lowercase_hex_prefix(),
		ConstantValue::I64(v) => format!("{type_name}({:#018X})", *v as u64).to_lowercase_hex_prefix(),
		ConstantValue::U64(v) => format!("{type_name}({v:#018X})").to_lowercase_hex_prefix(),
		ConstantValue::F32(v) => format!("{type_name}({})", format_round_trip(*v as f64, 9)),
		ConstantValue::F64(v) => format!("{type_name}({})", format_round_trip(*v, 17)),
		ConstantValue::Bool(v) => format!("{type_name}({})", if *v { "true" } else { "false" }),
		ConstantValue::Char(v) => format!("{type_name}({v})"),
	}
}

/// `{:#04X}`-style formatting keeps the `0x` prefix but uppercases the
/// digits; the canonical form wants lowercase hex digits after the prefix.
trait LowercaseHexDigits {
	fn to_lowercase_hex_prefix(self) -> String;
}

impl LowercaseHexDigits for String {
	fn to_lowercase_hex_prefix(self) -> String {
		let Some(hex_start) = self.find("0X") else { return self };
		let (head, tail) = self.split_at(hex_start);
		format!("{head}0x{}", tail[2..].to_lowercase())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn string_constant_is_a_bare_quoted_literal() {
		assert_eq!(render_constant(&ConstantValue::String("hi".to_string()), "string"), "\"hi\"");
	}

	#[test]
	fn null_ref_is_the_bare_keyword() {
		assert_eq!(render_constant(&ConstantValue::NullRef, "object"), "nullref");
	}

	#[test]
	fn u8_pads_to_two_hex_digits() {
		assert_eq!(render_constant(&ConstantValue::U8(0xA), "uint8"), "uint8(0x0a)");
	}

	#[test]
	fn i32_pads_to_eight_hex_digits() {
		assert_eq!(render_constant(&ConstantValue::I32(-1), "int32"), "int32(0xffffffff)");
	}

	#[test]
	fn u64_pads_to_sixteen_hex_digits() {
		assert_eq!(render_constant(&ConstantValue::U64(1), "uint64"), "uint64(0x0000000000000001)");
	}

	#[test]
	fn float_constants_use_round_trip_text() {
		assert_eq!(render_constant(&ConstantValue::F64(std::f64::consts::PI), "float64"), "float64(3.1415926535897931)");
	}

	#[test]
	fn enum_literal_renders_under_its_underlying_type_name() {
		assert_eq!(render_constant(&ConstantValue::I32(3), "int32"), "int32(0x00000003)");
	}
}
