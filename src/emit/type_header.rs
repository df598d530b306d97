//! The type-header emitter (C11): the `.class` line, `extends`, and
//! `implements` lines, plus an empty `{ }` block (§4.9). Field/property/
//! event/method text is assembled separately into
//! [`crate::DisassembledType`]'s own sequences, not nested inside this
//! string.

use crate::emit::render_type_name_unaliased;
use crate::format::types::render_generic_parameter_list;
use crate::format::FormatOptions;
use crate::metadata::{AssemblyIdentity, TypeAttributes, TypeDefHandle};
use crate::writer::IndentingWriter;

/// Seven spaces: the `extends`/`implements` continuation lines align under
/// the type name, one column past `.class ` (§6).
const TYPE_HEADER_INDENT: usize = 7;

pub fn emit_type_header(current_assembly: Option<&AssemblyIdentity>, type_def: &dyn TypeDefHandle, options: FormatOptions) -> String {
	let mut writer = IndentingWriter::new(TYPE_HEADER_INDENT);

	let attributes = type_def.attributes();
	let tokens = type_header_tokens(attributes, type_def.is_enum(), type_def.is_value_type());
	let generic_parameters = render_generic_parameter_list(current_assembly, &type_def.generic_parameters(), options);
	writer.append_line(&format!(".class {} {}{generic_parameters}", tokens.join(" "), type_def.full_name()));

	writer.indent();
	if !attributes.contains(TypeAttributes::INTERFACE) {
		if let Some(base_type) = type_def.base_type() {
			writer.append_line(&format!("extends {}", render_type_name_unaliased(current_assembly, base_type.as_ref())));
		}
	}
	let interfaces = type_def.interfaces();
	if !interfaces.is_empty() {
		let rendered = interfaces.iter().map(|i| render_type_name_unaliased(current_assembly, i.as_ref())).collect::<Vec<_>>().join(", ");
		writer.append_line(&format!("implements {rendered}"));
	}
	writer.unindent();

	writer.append_line("{");
	writer.append_line("}");
	writer.finish()
}

/// Attribute tokens in order, empties discarded (§4.9).
fn type_header_tokens(attributes: TypeAttributes, is_enum: bool, is_value_type: bool) -> Vec<String> {
	let mut tokens = vec![".class".to_string()];

	if is_enum {
		tokens.push("enum".to_string());
	} else if is_value_type {
		tokens.push("value".to_string());
	}

	if attributes.contains(TypeAttributes::INTERFACE) {
		tokens.push("interface".to_string());
	}

	let visibility = attributes & TypeAttributes::VISIBILITY_MASK;

	if visibility == TypeAttributes::PUBLIC || visibility == TypeAttributes::NESTED_PUBLIC {
		tokens.push("public".to_string());
	} else {
		tokens.push("private".to_string());
	}

	let layout = attributes & TypeAttributes::LAYOUT_MASK;
	if layout == TypeAttributes::SEQUENTIAL_LAYOUT {
		tokens.push("sequential".to_string());
	} else if layout == TypeAttributes::EXPLICIT_LAYOUT {
		tokens.push("explicit".to_string());
	} else {
		tokens.push("auto".to_string());
	}

	let string_format = attributes & TypeAttributes::STRING_FORMAT_MASK;
	if string_format == TypeAttributes::ANSI_CLASS {
		tokens.push("ansi".to_string());
	} else if string_format == TypeAttributes::UNICODE_CLASS {
		tokens.push("unicode".to_string());
	} else if string_format == TypeAttributes::AUTO_CLASS {
		tokens.push("autochar".to_string());
	}

	if attributes.contains(TypeAttributes::ABSTRACT) {
		tokens.push("abstract".to_string());
	}
	if attributes.contains(TypeAttributes::SEALED) {
		tokens.push("sealed".to_string());
	}
	if attributes.contains(TypeAttributes::BEFORE_FIELD_INIT) {
		tokens.push("beforefieldinit".to_string());
	}

	tokens
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_public_class_token_order() {
		let attrs = TypeAttributes::PUBLIC | TypeAttributes::BEFORE_FIELD_INIT;
		let tokens = type_header_tokens(attrs, false, false);
		assert_eq!(tokens, vec![".class", "public", "auto", "ansi", "beforefieldinit"]);
	}

	#[test]
	fn bare_interface_token_order() {
		let attrs = TypeAttributes::INTERFACE | TypeAttributes::PUBLIC | TypeAttributes::ABSTRACT;
		let tokens = type_header_tokens(attrs, false, false);
		assert_eq!(tokens, vec![".class", "interface", "public", "auto", "ansi", "abstract"]);
	}

	#[test]
	fn enum_type_gets_the_enum_token() {
		let attrs = TypeAttributes::PUBLIC;
		let tokens = type_header_tokens(attrs, true, true);
		assert_eq!(tokens, vec![".class", "enum", "public", "auto", "ansi"]);
	}
}
