//! The method emitter (C9): header, locals, default-value pseudo-directives,
//! body, and exception-handling regions (§4.7).

use fxhash::FxHashMap;

use crate::decode::decode_method_body;
use crate::emit::render_custom_attribute;
use crate::error::DisassemblerError;
use crate::exceptions::{self, RegionKind, RegionMarker, Side};
use crate::format::constants::{intrinsic_type_name, render_constant};
use crate::format::instructions::{mnemonic_column_width, render_instruction, RenderContext};
use crate::format::types::{class_identifier_prefix, render_generic_parameter_list, render_type_name};
use crate::format::FormatOptions;
use crate::instruction::MethodBody;
use crate::metadata::{AssemblyIdentity, MetadataProvider, MethodAttributes, MethodDefHandle, MethodImplAttributes};
use crate::writer::IndentingWriter;

/// `.method ...` through its closing `}` (§4.7).
#[cfg_attr(feature = "tracing", tracing::instrument(skip(method, provider)))]
pub fn emit_method(
	current_assembly: Option<&AssemblyIdentity>,
	method: &dyn MethodDefHandle,
	provider: &dyn MetadataProvider,
	options: FormatOptions,
	indent_width: usize,
) -> Result<String, DisassemblerError> {
	let context = RenderContext { current_assembly, options };
	let mut writer = IndentingWriter::new(indent_width);

	writer.append_line(&signature_line(&context, method));
	writer.append_line("{");
	writer.indent();

	for attribute in method.custom_attributes() {
		writer.append_line(&render_custom_attribute(current_assembly, options, &attribute));
	}

	for (index, parameter) in method.parameters().iter().enumerate() {
		if let Some(default) = &parameter.default_value {
			let type_name = intrinsic_type_name(default);
			writer.append_line(&format!(".param [{}] = {}", index + 1, render_constant(default, type_name)));
		}
	}

	if method.has_body() {
		emit_body(&mut writer, method, provider, &context)?;
	}

	writer.unindent();
	writer.append_line("}");
	Ok(writer.finish())
}

fn emit_body(
	writer: &mut IndentingWriter,
	method: &dyn MethodDefHandle,
	provider: &dyn MetadataProvider,
	context: &RenderContext,
) -> Result<(), DisassemblerError> {
	let body = decode_method_body(method, provider)?;
	let markers = exceptions::reconstruct(method.exception_clauses());
	let code_size = method.il_bytes().map_or(0, <[u8]>::len);

	writer.append_line(&format!("// Code size  {code_size} (0x{code_size:x})"));
	writer.append_line(&format!(".maxstack {}", method.max_stack()));

	let locals = method.locals();
	if !locals.is_empty() {
		let rendered = locals
			.iter()
			.enumerate()
			.map(|(index, local)| {
				let class_prefix = class_identifier_prefix(context.current_assembly, local.local_type.as_ref(), false);
				let type_name = render_type_name(context.current_assembly, local.local_type.as_ref(), context.options);
				format!("{class_prefix}{type_name} V_{index}")
			})
			.collect::<Vec<_>>()
			.join(", ");
		writer.append_line(&format!(".locals init ({rendered})"));
	}

	emit_instructions(writer, &body, &markers, context);
	Ok(())
}

/// Interleaves exception-region markers with the aligned instruction
/// sequence (§4.7 point 6).
fn emit_instructions(writer: &mut IndentingWriter, body: &MethodBody, markers: &FxHashMap<u32, Vec<RegionMarker>>, context: &RenderContext) {
	let max_spacing = mnemonic_column_width(body);
	let mut offsets: Vec<u32> = markers.keys().copied().collect();
	offsets.sort_unstable();
	let mut offsets = offsets.into_iter().peekable();

	for instruction in &body.instructions {
		while let Some(&next) = offsets.peek() {
			if next > instruction.offset {
				break;
			}
			offsets.next();
			for marker in &markers[&next] {
				emit_region_marker(writer, marker, context.current_assembly);
			}
		}
		writer.append_line(&render_instruction(instruction, body, max_spacing, context));
	}

	for offset in offsets {
		for marker in &markers[&offset] {
			emit_region_marker(writer, marker, context.current_assembly);
		}
	}
}

fn emit_region_marker(writer: &mut IndentingWriter, marker: &RegionMarker, current_assembly: Option<&AssemblyIdentity>) {
	match marker.side {
		Side::Begin => {
			match marker.kind {
				RegionKind::Try => writer.append_line(".try"),
				RegionKind::Filter => writer.append_line("filter"),
				RegionKind::Finally => writer.append_line("finally"),
				RegionKind::Catch => {
					let type_text = match &marker.catch_type {
						Some(catch_type) => crate::emit::render_type_name_unaliased(current_assembly, catch_type.as_ref()),
						None => String::new(),
					};
					writer.append_line(&format!("catch {type_text}"));
				}
				// The handler block following a filter's `endfilter` carries no
				// leading keyword of its own (§4.6).
				RegionKind::FilterCatch => {}
			}
			writer.append_line("{");
			writer.indent();
		}
		Side::End => {
			writer.unindent();
			writer.append_line("}");
		}
	}
}

/// The `.method` signature line: attribute tokens, `instance`/`newslot`,
/// return type, name, generic parameters, parameter list, implementation
/// flags (§4.7).
fn signature_line(context: &RenderContext, method: &dyn MethodDefHandle) -> String {
	let mut tokens = method_attribute_tokens(method.attributes());
	if !method.is_static() {
		tokens.push("instance".to_string());
	}
	if method.is_virtual() {
		tokens.push("newslot".to_string());
	}

	let return_text = if method.is_constructor() {
		"void".to_string()
	} else {
		let return_type = method.return_type();
		let class_prefix = class_identifier_prefix(context.current_assembly, return_type.as_ref(), true);
		format!("{class_prefix}{}", render_type_name(context.current_assembly, return_type.as_ref(), context.options))
	};

	let generic_parameters = render_generic_parameter_list(context.current_assembly, &method.generic_parameters(), context.options);
	let parameters =
		method.parameters().iter().map(|parameter| render_parameter(context, parameter)).collect::<Vec<_>>().join(", ");

	let mut signature = format!(
		".method {} {return_text} {}{generic_parameters}({parameters})",
		tokens.join(" "),
		method.name(),
	);

	let impl_flags = impl_flag_tokens(method.impl_attributes());
	if !impl_flags.is_empty() {
		signature.push(' ');
		signature.push_str(&impl_flags.join(" "));
	}
	signature
}

fn render_parameter(context: &RenderContext, parameter: &crate::metadata::Parameter) -> String {
	let mut prefix = String::new();
	if parameter.default_value.is_some() {
		prefix.push_str("[opt] ");
	}
	if parameter.attributes.contains(crate::metadata::ParamAttributes::OUT) {
		prefix.push_str("[out] ");
	}
	let class_prefix = class_identifier_prefix(context.current_assembly, parameter.parameter_type.as_ref(), true);
	let type_name = render_type_name(context.current_assembly, parameter.parameter_type.as_ref(), context.options);
	let name = if crate::format::is_reserved_parameter_lexeme(&parameter.name) {
		crate::format::quote_identifier(&parameter.name)
	} else {
		parameter.name.clone()
	};
	format!("{prefix}{class_prefix}{type_name} {name}")
}

/// Attribute flags lower-cased, excluding the access-mask zero value
/// (`privatescope`) and the vtable-layout mask name (`newslot`/`reuseslot`
/// are instead driven explicitly by [`MethodDefHandle::is_virtual`], §4.7).
fn method_attribute_tokens(attributes: MethodAttributes) -> Vec<String> {
	let mut tokens = Vec::new();

	let access = attributes & MethodAttributes::MEMBER_ACCESS_MASK;
	let access_name = if access == MethodAttributes::PRIVATE {
		Some("private")
	} else if access == MethodAttributes::FAMILY_AND_ASSEMBLY {
		Some("famandassem")
	} else if access == MethodAttributes::ASSEMBLY {
		Some("assembly")
	} else if access == MethodAttributes::FAMILY {
		Some("family")
	} else if access == MethodAttributes::FAMILY_OR_ASSEMBLY {
		Some("famorassem")
	} else if access == MethodAttributes::PUBLIC {
		Some("public")
	} else {
		None
	};
	if let Some(access_name) = access_name {
		tokens.push(access_name.to_string());
	}

	let flag_names: &[(MethodAttributes, &str)] = &[
		(MethodAttributes::HIDE_BY_SIG, "hidebysig"),
		(MethodAttributes::SPECIAL_NAME, "specialname"),
		(MethodAttributes::RT_SPECIAL_NAME, "rtspecialname"),
		(MethodAttributes::STATIC, "static"),
		(MethodAttributes::VIRTUAL, "virtual"),
		(MethodAttributes::FINAL, "final"),
		(MethodAttributes::ABSTRACT, "abstract"),
		(MethodAttributes::STRICT, "strict"),
		(MethodAttributes::PINVOKE_IMPL, "pinvokeimpl"),
		(MethodAttributes::UNMANAGED_EXPORT, "unmanagedexp"),
		(MethodAttributes::HAS_SECURITY, "hassecurity"),
		(MethodAttributes::REQUIRE_SEC_OBJECT, "reqsecobj"),
	];
	for (flag, name) in flag_names {
		if attributes.contains(*flag) {
			tokens.push((*name).to_string());
		}
	}

	tokens
}

fn impl_flag_tokens(impl_attributes: MethodImplAttributes) -> Vec<String> {
	let mut tokens = Vec::new();
	let code_type = impl_attributes & MethodImplAttributes::CODE_TYPE_MASK;
	if code_type == MethodImplAttributes::IL {
		tokens.push("cil".to_string());
	} else if code_type == MethodImplAttributes::RUNTIME {
		tokens.push("runtime".to_string());
	}
	if (impl_attributes & MethodImplAttributes::MANAGED_MASK) == MethodImplAttributes::MANAGED {
		tokens.push("managed".to_string());
	}
	tokens
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::metadata::MethodImplAttributes as Impl;

	#[test]
	fn method_attribute_tokens_include_static_and_hidebysig() {
		let attrs = MethodAttributes::PUBLIC | MethodAttributes::STATIC | MethodAttributes::HIDE_BY_SIG;
		let tokens = method_attribute_tokens(attrs);
		assert_eq!(tokens, vec!["public", "hidebysig", "static"]);
	}

	#[test]
	fn private_scope_access_produces_no_access_token() {
		let tokens = method_attribute_tokens(MethodAttributes::HIDE_BY_SIG);
		assert_eq!(tokens, vec!["hidebysig"]);
	}

	#[test]
	fn impl_flags_combine_cil_and_managed() {
		assert_eq!(impl_flag_tokens(Impl::IL), vec!["cil", "managed"]);
	}

	#[test]
	fn impl_flags_omit_managed_when_unmanaged_bit_set() {
		assert_eq!(impl_flag_tokens(Impl::RUNTIME | Impl::UNMANAGED), vec!["runtime"]);
	}
}
