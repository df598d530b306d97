//! The emitters (C9, C10, C11): turn decoded bodies and declared members
//! into the canonical CIL assembly text. Each one is a thin pass over a
//! [`crate::writer::IndentingWriter`], sharing the type/member formatter
//! (C5) and instruction formatter (C6) for every fragment of text it needs.

pub mod members;
pub mod method;
pub mod type_header;

use crate::format::instructions::RenderContext;
use crate::format::types::render_type_name;
use crate::format::FormatOptions;
use crate::metadata::{AssemblyIdentity, CustomAttribute};

/// `.custom instance void Ctor::.ctor(paramtypes) = ( XX XX ... )` (§B of the
/// expanded spec): named by C9/C10/C11 but left to "custom-attribute data" in
/// the metadata contract. Shared across every emitter that carries custom
/// attributes. Reproduces the known reference-tool quirk of emitting
/// `01 00 00 00` for a constructor-less (empty) argument blob rather than an
/// empty byte list (§9 Open Question 4).
pub fn render_custom_attribute(current_assembly: Option<&AssemblyIdentity>, options: FormatOptions, attribute: &CustomAttribute) -> String {
	let context = RenderContext { current_assembly, options };
	let ctor_text = crate::format::instructions::render_method(&context, attribute.constructor.as_ref());
	let bytes = if attribute.value_blob.is_empty() {
		"01 00 00 00".to_string()
	} else {
		attribute.value_blob.iter().map(|byte| format!("{byte:02X}")).collect::<Vec<_>>().join(" ")
	};
	format!(".custom instance {ctor_text} = ( {bytes} )")
}

/// `[assembly-short]FullTypeName`, rendered without aliases — used for catch
/// clause types and anywhere else §4.5 calls for an unaliased type name.
pub fn render_type_name_unaliased(current_assembly: Option<&AssemblyIdentity>, type_handle: &dyn crate::metadata::TypeHandle) -> String {
	render_type_name(current_assembly, type_handle, FormatOptions { use_aliases: false, use_alias_on_params: false })
}
