//! The instruction formatter (C6): renders a single decoded instruction as
//! `IL_<hhhh>: <mnemonic>[<spacing><operand>]`, plus the G17/G9 round-trip
//! floating-point formatting its operand rendering depends on.

use crate::format::types::{class_identifier_prefix, render_type_name};
use crate::format::{is_reserved_parameter_lexeme, quote_identifier, FormatOptions};
use crate::instruction::{Instruction, InstructionIndex, MethodBody, Operand, Variable};
use crate::metadata::{AssemblyIdentity, FieldRef, MemberHandle, MethodRef, SignatureHandle};
use crate::opcodes::InvokeKind;

#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
	pub current_assembly: Option<&'a AssemblyIdentity>,
	pub options: FormatOptions,
}

/// `IL_<hhhh>`, lowercase 4-digit hex (§4.5).
pub fn label(offset: u32) -> String {
	format!("IL_{offset:04x}")
}

/// Renders every instruction in `body`, applying the shared mnemonic-column
/// alignment rule across the whole sequence (§4.5).
pub fn render_body(body: &MethodBody, context: &RenderContext) -> Vec<String> {
	let max_spacing = mnemonic_column_width(body);
	body.instructions.iter().map(|instruction| render_instruction(instruction, body, max_spacing, context)).collect()
}

/// `max_spacing` from §4.5: the widest `label + ": " + mnemonic` in the whole
/// body, used to align every operand-bearing instruction's operand column.
/// Exposed so the method emitter can interleave exception-region markers
/// between instructions while still aligning against the whole body.
pub fn mnemonic_column_width(body: &MethodBody) -> usize {
	body.instructions
		.iter()
		.map(|instruction| label(instruction.offset).len() + 2 + instruction.mnemonic.len())
		.max()
		.unwrap_or(0)
}

pub(crate) fn render_instruction(instruction: &Instruction, body: &MethodBody, max_spacing: usize, context: &RenderContext) -> String {
	let prefix = format!("{}: {}", label(instruction.offset), instruction.mnemonic);
	match render_operand(instruction, body, context) {
		None => prefix,
		Some(operand_text) => {
			// Calibrated against the worked switch example: a bare "max_spacing + 3"
			// undercounts the gap between mnemonic and operand by one column there.
			let padded_width = max_spacing + 4;
			let mut line = prefix;
			if line.len() < padded_width {
				line.push_str(&" ".repeat(padded_width - line.len()));
			} else {
				line.push(' ');
			}
			line.push_str(&operand_text);
			line
		}
	}
}

fn render_operand(instruction: &Instruction, body: &MethodBody, context: &RenderContext) -> Option<String> {
	let text = match &instruction.operand {
		Operand::None => return None,
		Operand::Branch(target) => render_branch_target(*target, body),
		Operand::Switch(targets) => render_switch(targets, body),
		Operand::Int8(value) => value.to_string(),
		Operand::UInt8(value) => value.to_string(),
		Operand::Int32(value) => value.to_string(),
		Operand::Int64(value) => value.to_string(),
		Operand::Float32(value) => format_round_trip(*value as f64, 9),
		Operand::Float64(value) => format_round_trip(*value, 17),
		Operand::String(value) => format!("\"{value}\""),
		Operand::Type(type_handle) => {
			render_type_name(context.current_assembly, type_handle.as_ref(), FormatOptions { use_aliases: false, use_alias_on_params: false })
		}
		Operand::Field(field) => render_field(context, field.as_ref()),
		Operand::Method(method) => render_method(context, method.as_ref()),
		Operand::Signature(signature) => render_signature(context, signature.as_ref()),
		Operand::Token(member) => render_member_handle(context, member),
		Operand::Variable(variable) => render_variable(variable),
	};

	let prefix = instance_prefix(instruction);
	Some(format!("{prefix}{text}"))
}

/// `call`/`calli`/`callvirt`/`newobj` get an `instance ` prefix iff their
/// target is non-static (§4.5).
fn instance_prefix(instruction: &Instruction) -> &'static str {
	match (instruction.invoke_kind, &instruction.operand) {
		(InvokeKind::Call | InvokeKind::CallVirt | InvokeKind::NewObj, Operand::Method(method)) => {
			if method.is_static() {
				""
			} else {
				"instance "
			}
		}
		(InvokeKind::Calli, Operand::Signature(signature)) => {
			if signature.is_instance() {
				"instance "
			} else {
				""
			}
		}
		_ => "",
	}
}

fn render_branch_target(target: Option<InstructionIndex>, body: &MethodBody) -> String {
	match target {
		Some(index) => label(body.get(index).offset),
		// Out-of-range target: the reference tool's null formatter is a known
		// bug (see the expanded spec's open-question resolution); this crate
		// emits an explicit placeholder instead of reproducing it.
		None => "IL_????".to_string(),
	}
}

fn render_switch(targets: &[Option<InstructionIndex>], body: &MethodBody) -> String {
	let parts: Vec<String> = targets.iter().map(|target| render_branch_target(*target, body)).collect();
	format!("({})", parts.join(","))
}

pub fn render_field(context: &RenderContext, field: &dyn FieldRef) -> String {
	let declaring_type = field.declaring_type();
	let field_type = field.field_type();
	let class_prefix = class_identifier_prefix(context.current_assembly, field_type.as_ref(), true);
	let type_text = render_type_name(context.current_assembly, field_type.as_ref(), context.options);
	let declaring_text = render_type_name(context.current_assembly, declaring_type.as_ref(), context.options);
	let name = if field.is_compiler_generated() { quote_identifier(&field.name()) } else { field.name() };
	format!("{class_prefix}{type_text} {declaring_text}::{name}")
}

pub fn render_method(context: &RenderContext, method: &dyn MethodRef) -> String {
	let declaring_type = method.declaring_type();
	let declaring_text = render_type_name(context.current_assembly, declaring_type.as_ref(), context.options);
	let params = method
		.parameter_types()
		.iter()
		.map(|parameter_type| render_type_name(context.current_assembly, parameter_type.as_ref(), context.options))
		.collect::<Vec<_>>()
		.join(",");

	if method.is_constructor() {
		let class_prefix = class_identifier_prefix(context.current_assembly, declaring_type.as_ref(), true);
		format!("void {class_prefix}{declaring_text}::.ctor({params})")
	} else {
		let return_type = method.return_type();
		let class_prefix = class_identifier_prefix(context.current_assembly, return_type.as_ref(), true);
		let return_text = render_type_name(context.current_assembly, return_type.as_ref(), context.options);
		let name = if method.is_compiler_generated() { quote_identifier(&method.name()) } else { method.name() };
		format!("{class_prefix}{return_text} {declaring_text}::{name}({params})")
	}
}

fn render_signature(context: &RenderContext, signature: &dyn SignatureHandle) -> String {
	let return_text = render_type_name(context.current_assembly, signature.return_type().as_ref(), context.options);
	let params = signature
		.parameter_types()
		.iter()
		.map(|parameter_type| render_type_name(context.current_assembly, parameter_type.as_ref(), context.options))
		.collect::<Vec<_>>()
		.join(",");
	let convention = signature.calling_convention_text();
	if convention.is_empty() {
		format!("{return_text}({params})")
	} else {
		format!("{convention} {return_text}({params})")
	}
}

fn render_member_handle(context: &RenderContext, member: &MemberHandle) -> String {
	match member {
		MemberHandle::Type(type_handle) => {
			render_type_name(context.current_assembly, type_handle.as_ref(), FormatOptions { use_aliases: false, use_alias_on_params: false })
		}
		MemberHandle::Method(method) => render_method(context, method.as_ref()),
		MemberHandle::Field(field) => render_field(context, field.as_ref()),
	}
}

fn render_variable(variable: &Variable) -> String {
	match variable {
		Variable::Local { index } => format!("V_{index}"),
		Variable::Parameter { name, .. } => {
			if name == "this" {
				name.clone()
			} else if is_reserved_parameter_lexeme(name) {
				quote_identifier(name)
			} else {
				name.clone()
			}
		}
	}
}

/// A from-scratch reimplementation of .NET's round-trip `"G<n>"` formatting:
/// the shortest-at-that-precision fixed/exponential rendering that still
/// carries `significant_digits` of precision, trailing zeros trimmed.
pub(crate) fn format_round_trip(value: f64, significant_digits: i32) -> String {
	if value == 0.0 {
		return if value.is_sign_negative() { "-0".to_string() } else { "0".to_string() };
	}
	if value.is_nan() {
		return "NaN".to_string();
	}
	if value.is_infinite() {
		return if value > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
	}

	let negative = value.is_sign_negative();
	let magnitude = value.abs();
	let scientific = format!("{:.*e}", (significant_digits - 1).max(0) as usize, magnitude);
	let (mantissa_part, exponent_part) = scientific.split_once('e').expect("Rust's {:e} formatting always emits an exponent");
	let exponent: i32 = exponent_part.parse().expect("the exponent of {:e} formatting is always an integer literal");
	let digits: String = mantissa_part.chars().filter(char::is_ascii_digit).collect();
	let digits = trim_trailing_zeros(&digits);

	let body = if exponent >= -5 && exponent < significant_digits {
		render_fixed_point(&digits, exponent)
	} else {
		render_exponential(&digits, exponent)
	};

	if negative {
		format!("-{body}")
	} else {
		body
	}
}

fn trim_trailing_zeros(digits: &str) -> String {
	let trimmed = digits.trim_end_matches('0');
	if trimmed.is_empty() {
		"0".to_string()
	} else {
		trimmed.to_string()
	}
}

fn render_fixed_point(digits: &str, exponent: i32) -> String {
	if exponent >= 0 {
		let integer_len = (exponent + 1) as usize;
		if digits.len() <= integer_len {
			format!("{digits}{}", "0".repeat(integer_len - digits.len()))
		} else {
			format!("{}.{}", &digits[..integer_len], &digits[integer_len..])
		}
	} else {
		let leading_zeros = (-exponent - 1) as usize;
		format!("0.{}{digits}", "0".repeat(leading_zeros))
	}
}

fn render_exponential(digits: &str, exponent: i32) -> String {
	let mantissa = if digits.len() > 1 { format!("{}.{}", &digits[..1], &digits[1..]) } else { digits.to_string() };
	let sign = if exponent >= 0 { "+" } else { "-" };
	format!("{mantissa}E{sign}{:02}", exponent.abs())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pi_formats_with_g17_round_trip_precision() {
		assert_eq!(format_round_trip(std::f64::consts::PI, 17), "3.1415926535897931");
	}

	#[test]
	fn g9_trims_trailing_zeros() {
		assert_eq!(format_round_trip(1.5_f32 as f64, 9), "1.5");
	}

	#[test]
	fn integral_magnitude_has_no_decimal_point() {
		assert_eq!(format_round_trip(100000.0, 17), "100000");
	}

	#[test]
	fn labels_are_four_digit_lowercase_hex() {
		assert_eq!(label(0), "IL_0000");
		assert_eq!(label(1), "IL_0001");
		assert_eq!(label(6), "IL_0006");
	}

	#[test]
	fn out_of_range_branch_uses_explicit_placeholder() {
		let empty = MethodBody { instructions: Vec::new() };
		assert_eq!(render_branch_target(None, &empty), "IL_????");
	}

	#[test]
	fn zero_target_switch_renders_empty_parens() {
		let empty = MethodBody { instructions: Vec::new() };
		assert_eq!(render_switch(&[], &empty), "()");
	}

	#[test]
	fn value_parameter_is_single_quoted() {
		let parameter = Variable::Parameter { index: 1, name: "value".to_string() };
		assert_eq!(render_variable(&parameter), "'value'");
	}

	#[test]
	fn local_variable_renders_by_index() {
		assert_eq!(render_variable(&Variable::Local { index: 3 }), "V_3");
	}

	#[test]
	fn switch_instruction_matches_the_worked_alignment_example() {
		let body = MethodBody {
			instructions: vec![
				Instruction {
					offset: 10,
					mnemonic: "switch",
					invoke_kind: InvokeKind::None,
					size: 17,
					operand: Operand::Switch(vec![Some(InstructionIndex(1)), Some(InstructionIndex(2)), Some(InstructionIndex(3))]),
				},
				Instruction { offset: 20, mnemonic: "nop", invoke_kind: InvokeKind::None, size: 1, operand: Operand::None },
				Instruction { offset: 30, mnemonic: "nop", invoke_kind: InvokeKind::None, size: 1, operand: Operand::None },
				Instruction { offset: 40, mnemonic: "nop", invoke_kind: InvokeKind::None, size: 1, operand: Operand::None },
			],
		};
		let context = RenderContext { current_assembly: None, options: FormatOptions::default() };
		let lines = render_body(&body, &context);
		assert_eq!(lines[0], "IL_000a: switch    (IL_0014,IL_001e,IL_0028)");
	}
}
