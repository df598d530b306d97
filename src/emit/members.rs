//! The field, property, and event emitters (C10, §4.8).

use crate::emit::render_custom_attribute;
use crate::format::constants::{intrinsic_type_name, render_constant};
use crate::format::instructions::{render_method, RenderContext};
use crate::format::types::{class_identifier_prefix, render_type_name};
use crate::format::{quote_identifier, FormatOptions};
use crate::metadata::{AssemblyIdentity, EventDefHandle, FieldAttributes, FieldDefHandle, MethodRef, PropertyDefHandle};
use crate::writer::IndentingWriter;

/// Four-space indentation below the type-header level (§6), matching
/// [`crate::BODY_INDENT`] — this module can't depend on `lib.rs` directly, so
/// the width is repeated as a literal the same way `emit/type_header.rs` does
/// for its own indent constant.
const BODY_INDENT: usize = 4;

/// `.field <attrs> <type> <name>`, optionally `= <type>(<const>)` for a
/// literal, followed by any custom-attribute lines (§4.8).
pub fn emit_field(current_assembly: Option<&AssemblyIdentity>, field: &dyn FieldDefHandle, options: FormatOptions) -> String {
	let mut tokens = field_attribute_tokens(field.attributes());
	if field.declaring_type().is_value_type() {
		tokens.push("valuetype".to_string());
	}

	let field_type = field.field_type();
	let class_prefix = class_identifier_prefix(current_assembly, field_type.as_ref(), true);
	let type_text = render_type_name(current_assembly, field_type.as_ref(), options);
	let name = if field.is_compiler_generated() { quote_identifier(&field.name()) } else { field.name() };

	let mut line = format!(".field {} {class_prefix}{type_text} {name}", tokens.join(" "));

	if let Some(constant) = field.constant_value() {
		let declaring_type = field.declaring_type();
		let type_name = if declaring_type.is_enum() {
			match declaring_type.enum_underlying_type() {
				Some(underlying) => render_type_name(current_assembly, underlying.as_ref(), FormatOptions::default()),
				None => intrinsic_type_name(&constant).to_string(),
			}
		} else {
			intrinsic_type_name(&constant).to_string()
		};
		line.push_str(&format!(" = {}", render_constant(&constant, &type_name)));
	}

	let mut lines = vec![line];
	for attribute in field.custom_attributes() {
		lines.push(render_custom_attribute(current_assembly, options, &attribute));
	}
	lines.join("\n")
}

fn field_attribute_tokens(attributes: FieldAttributes) -> Vec<String> {
	let mut tokens = Vec::new();
	let access = attributes & FieldAttributes::FIELD_ACCESS_MASK;
	let access_name = if access == FieldAttributes::PRIVATE {
		Some("private")
	} else if access == FieldAttributes::FAMILY_AND_ASSEMBLY {
		Some("famandassem")
	} else if access == FieldAttributes::ASSEMBLY {
		Some("assembly")
	} else if access == FieldAttributes::FAMILY {
		Some("family")
	} else if access == FieldAttributes::FAMILY_OR_ASSEMBLY {
		Some("famorassem")
	} else if access == FieldAttributes::PUBLIC {
		Some("public")
	} else {
		None
	};
	if let Some(access_name) = access_name {
		tokens.push(access_name.to_string());
	}

	let flag_names: &[(FieldAttributes, &str)] = &[
		(FieldAttributes::STATIC, "static"),
		(FieldAttributes::INIT_ONLY, "initonly"),
		(FieldAttributes::LITERAL, "literal"),
		(FieldAttributes::NOT_SERIALIZED, "notserialized"),
		(FieldAttributes::SPECIAL_NAME, "specialname"),
		(FieldAttributes::RT_SPECIAL_NAME, "rtspecialname"),
		(FieldAttributes::PINVOKE_IMPL, "pinvokeimpl"),
	];
	for (flag, name) in flag_names {
		if attributes.contains(*flag) {
			tokens.push((*name).to_string());
		}
	}
	tokens
}

/// `.property <instance?> <class?><type> <name>()` plus a braced block of
/// custom attributes and `.get`/`.set` accessor lines (§4.8).
pub fn emit_property(current_assembly: Option<&AssemblyIdentity>, property: &dyn PropertyDefHandle, options: FormatOptions) -> String {
	let context = RenderContext { current_assembly, options };
	let instance_token = if property.is_instance() { "instance " } else { "" };
	let property_type = property.property_type();
	let class_prefix = class_identifier_prefix(current_assembly, property_type.as_ref(), true);
	let type_text = render_type_name(current_assembly, property_type.as_ref(), options);

	let mut writer = IndentingWriter::new(BODY_INDENT);
	writer.append_line(&format!(".property {instance_token}{class_prefix}{type_text} {}()", property.name()));
	writer.append_line("{");
	writer.indent();
	for attribute in property.custom_attributes() {
		writer.append_line(&render_custom_attribute(current_assembly, options, &attribute));
	}
	if let Some(getter) = property.getter() {
		writer.append_line(&format!(".get {}", render_accessor(&context, getter.as_ref())));
	}
	if let Some(setter) = property.setter() {
		writer.append_line(&format!(".set {}", render_accessor(&context, setter.as_ref())));
	}
	writer.unindent();
	writer.append_line("}");
	writer.finish()
}

/// `.event <handler-type> <name>` plus a braced block of custom attributes
/// and `.addon`/`.removeon` accessor lines (§4.8).
pub fn emit_event(current_assembly: Option<&AssemblyIdentity>, event: &dyn EventDefHandle, options: FormatOptions) -> String {
	let context = RenderContext { current_assembly, options };
	let handler_type = event.handler_type();
	let class_prefix = class_identifier_prefix(current_assembly, handler_type.as_ref(), true);
	let type_text = render_type_name(current_assembly, handler_type.as_ref(), options);

	let mut writer = IndentingWriter::new(BODY_INDENT);
	writer.append_line(&format!(".event {class_prefix}{type_text} {}", event.name()));
	writer.append_line("{");
	writer.indent();
	for attribute in event.custom_attributes() {
		writer.append_line(&render_custom_attribute(current_assembly, options, &attribute));
	}
	writer.append_line(&format!(".addon {}", render_accessor(&context, event.add_method().as_ref())));
	writer.append_line(&format!(".removeon {}", render_accessor(&context, event.remove_method().as_ref())));
	writer.unindent();
	writer.append_line("}");
	writer.finish()
}

/// `.get`/`.set`/`.addon`/`.removeon` reference an accessor method the same
/// way an instruction operand references one, with the same `instance `
/// prefix rule as §4.5's invoke-family opcodes.
fn render_accessor(context: &RenderContext, method: &dyn MethodRef) -> String {
	let prefix = if method.is_static() { "" } else { "instance " };
	format!("{prefix}{}", render_method(context, method))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::metadata::TypeAttributes;

	#[test]
	fn public_static_literal_produces_expected_token_order() {
		let attrs = FieldAttributes::PUBLIC | FieldAttributes::STATIC | FieldAttributes::LITERAL;
		let tokens = field_attribute_tokens(attrs);
		assert_eq!(tokens, vec!["public", "static", "literal"]);
	}

	#[test]
	fn compiler_controlled_access_produces_no_token() {
		let tokens = field_attribute_tokens(FieldAttributes::STATIC);
		assert_eq!(tokens, vec!["static"]);
	}

	#[derive(Debug)]
	struct FakeType;

	impl crate::metadata::TypeHandle for FakeType {
		fn full_name(&self) -> String {
			"System.Int32".to_string()
		}
		fn assembly(&self) -> AssemblyIdentity {
			AssemblyIdentity { full_name: "mscorlib".to_string() }
		}
		fn is_class(&self) -> bool {
			false
		}
		fn is_interface(&self) -> bool {
			false
		}
		fn is_value_type(&self) -> bool {
			true
		}
		fn is_enum(&self) -> bool {
			false
		}
		fn enum_underlying_type(&self) -> Option<Box<dyn crate::metadata::TypeHandle>> {
			None
		}
		fn is_generic_parameter(&self) -> bool {
			false
		}
		fn is_generic_instantiation(&self) -> bool {
			false
		}
		fn generic_arguments(&self) -> Vec<Box<dyn crate::metadata::TypeHandle>> {
			Vec::new()
		}
		fn is_array(&self) -> bool {
			false
		}
		fn array_rank(&self) -> u32 {
			0
		}
		fn is_by_ref(&self) -> bool {
			false
		}
		fn element_type(&self) -> Option<Box<dyn crate::metadata::TypeHandle>> {
			None
		}
		fn attributes(&self) -> TypeAttributes {
			TypeAttributes::PUBLIC
		}
	}

	#[derive(Debug)]
	struct FakeAccessor {
		name: &'static str,
		is_static: bool,
	}

	impl MethodRef for FakeAccessor {
		fn name(&self) -> String {
			self.name.to_string()
		}
		fn declaring_type(&self) -> Box<dyn crate::metadata::TypeHandle> {
			Box::new(FakeType)
		}
		fn is_static(&self) -> bool {
			self.is_static
		}
		fn is_constructor(&self) -> bool {
			false
		}
		fn return_type(&self) -> Box<dyn crate::metadata::TypeHandle> {
			Box::new(FakeType)
		}
		fn parameter_types(&self) -> Vec<Box<dyn crate::metadata::TypeHandle>> {
			Vec::new()
		}
		fn is_compiler_generated(&self) -> bool {
			false
		}
	}

	#[derive(Debug)]
	struct FakeProperty;

	impl PropertyDefHandle for FakeProperty {
		fn name(&self) -> String {
			"Count".to_string()
		}
		fn property_type(&self) -> Box<dyn crate::metadata::TypeHandle> {
			Box::new(FakeType)
		}
		fn is_instance(&self) -> bool {
			true
		}
		fn getter(&self) -> Option<Box<dyn MethodRef>> {
			Some(Box::new(FakeAccessor { name: "get_Count", is_static: false }))
		}
		fn setter(&self) -> Option<Box<dyn MethodRef>> {
			None
		}
		fn custom_attributes(&self) -> Vec<crate::metadata::CustomAttribute> {
			Vec::new()
		}
	}

	#[test]
	fn property_block_indents_accessor_lines_with_four_spaces() {
		let text = emit_property(None, &FakeProperty, FormatOptions::default());
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines[0], ".property instance int32 Count()");
		assert_eq!(lines[1], "{");
		assert!(lines[2].starts_with("    .get "), "expected four-space indent, got {:?}", lines[2]);
		assert_eq!(lines[3], "}");
	}

	#[derive(Debug)]
	struct FakeEvent;

	impl EventDefHandle for FakeEvent {
		fn name(&self) -> String {
			"Changed".to_string()
		}
		fn handler_type(&self) -> Box<dyn crate::metadata::TypeHandle> {
			Box::new(FakeType)
		}
		fn add_method(&self) -> Box<dyn MethodRef> {
			Box::new(FakeAccessor { name: "add_Changed", is_static: false })
		}
		fn remove_method(&self) -> Box<dyn MethodRef> {
			Box::new(FakeAccessor { name: "remove_Changed", is_static: false })
		}
		fn custom_attributes(&self) -> Vec<crate::metadata::CustomAttribute> {
			Vec::new()
		}
	}

	#[test]
	fn event_block_indents_accessor_lines_with_four_spaces() {
		let text = emit_event(None, &FakeEvent, FormatOptions::default());
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines[1], "{");
		assert!(lines[2].starts_with("    .addon "), "expected four-space indent, got {:?}", lines[2]);
		assert!(lines[3].starts_with("    .removeon "), "expected four-space indent, got {:?}", lines[3]);
		assert_eq!(lines[4], "}");
	}
}
