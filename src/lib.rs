//! A disassembler for ECMA-335 CIL method bodies and type metadata, emitting
//! canonical ilasm-syntax listings (§1–§2 of the design).
//!
//! The crate is a pure, synchronous transform: given a type handle and a
//! [`metadata::MetadataProvider`] implementation, [`disassemble`] produces a
//! [`DisassembledType`] — a rendered `.class` header plus the rendered text
//! of every field, property, event, and method declared directly on that
//! type. Loading the module, resolving metadata tokens, and printing the
//! result to a file are all left to the caller (§1's non-goals).

pub mod cursor;
pub mod decode;
pub mod emit;
pub mod error;
pub mod exceptions;
pub mod format;
pub mod instruction;
pub mod metadata;
pub mod opcodes;
pub mod writer;

use format::FormatOptions;
use metadata::{AssemblyIdentity, EventDefHandle, FieldDefHandle, MetadataProvider, MethodDefHandle, MethodImplAttributes, PropertyDefHandle, TypeDefHandle};

pub use error::DisassemblerError;

/// Indentation width at the type-header level: `extends`/`implements`
/// continuation lines align seven columns in, under the type name (§6).
pub const TYPE_HEADER_INDENT: usize = 7;
/// Indentation width everywhere else: method bodies, exception regions,
/// property/event blocks (§6).
pub const BODY_INDENT: usize = 4;

/// The public result of [`disassemble`]: the originating type, its rendered
/// `.class` header, and four ordered sequences of rendered member text, in
/// the order the metadata provider enumerates them (§3).
#[derive(Debug, Clone)]
pub struct DisassembledType {
	pub type_header: String,
	pub fields: Vec<String>,
	pub properties: Vec<String>,
	pub events: Vec<String>,
	pub methods: Vec<String>,
}

/// `.class <attrs> <Name>` / `extends` / `implements` / `{` / `}` (§4.9, C11).
pub fn disassemble_type_header(type_def: &dyn TypeDefHandle, options: FormatOptions) -> String {
	let current_assembly = type_def.assembly();
	emit::type_header::emit_type_header(Some(&current_assembly), type_def, options)
}

/// A declared field as `.field ...` plus any custom-attribute lines (§4.8, C10).
pub fn disassemble_field(field: &dyn FieldDefHandle, options: FormatOptions) -> String {
	let current_assembly = field.declaring_type().assembly();
	emit::members::emit_field(Some(&current_assembly), field, options)
}

/// A declared property as `.property ...` plus its accessor block (§4.8, C10).
pub fn disassemble_property(property: &dyn PropertyDefHandle, options: FormatOptions) -> String {
	let current_assembly = property_assembly(property);
	emit::members::emit_property(current_assembly.as_ref(), property, options)
}

/// A declared event as `.event ...` plus its accessor block (§4.8, C10).
pub fn disassemble_event(event: &dyn EventDefHandle, options: FormatOptions) -> String {
	let current_assembly = event.add_method().declaring_type().assembly();
	emit::members::emit_event(Some(&current_assembly), event, options)
}

/// A declared method's full `.method ... { ... }` text, including its
/// decoded body and exception regions (§4.7, C7–C9).
pub fn disassemble_method(
	method: &dyn MethodDefHandle,
	provider: &dyn MetadataProvider,
	options: FormatOptions,
) -> Result<String, DisassemblerError> {
	let current_assembly = method.declaring_type().assembly();
	emit::method::emit_method(Some(&current_assembly), method, provider, options, BODY_INDENT)
}

fn property_assembly(property: &dyn PropertyDefHandle) -> Option<AssemblyIdentity> {
	property
		.getter()
		.map(|getter| getter.declaring_type().assembly())
		.or_else(|| property.setter().map(|setter| setter.declaring_type().assembly()))
}

/// Aggregates the four public member-emitters plus the type header into one
/// [`DisassembledType`] (§6). Iterates instance and static, public and
/// non-public members; a method is included only when its implementation is
/// IL or Runtime and it is declared directly on `type_def` — inherited
/// methods are never re-emitted for a derived type.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(type_def, provider)))]
pub fn disassemble(
	type_def: &dyn TypeDefHandle,
	provider: &dyn MetadataProvider,
	options: FormatOptions,
) -> Result<DisassembledType, DisassemblerError> {
	let type_header = disassemble_type_header(type_def, options);

	let fields = type_def.fields().iter().map(|field| disassemble_field(field.as_ref(), options)).collect();
	let properties = type_def.properties().iter().map(|property| disassemble_property(property.as_ref(), options)).collect();
	let events = type_def.events().iter().map(|event| disassemble_event(event.as_ref(), options)).collect();

	let mut methods = Vec::new();
	for method in type_def.methods() {
		if !is_emittable_method(method.as_ref(), type_def) {
			continue;
		}
		methods.push(disassemble_method(method.as_ref(), provider, options)?);
	}

	Ok(DisassembledType { type_header, fields, properties, events, methods })
}

/// §6: a method is emitted only when its implementation flags are IL or
/// Runtime, and its declaring type is `type_def` itself (excludes inherited
/// methods a provider's enumeration might otherwise surface).
fn is_emittable_method(method: &dyn MethodDefHandle, type_def: &dyn TypeDefHandle) -> bool {
	let code_type = method.impl_attributes() & MethodImplAttributes::CODE_TYPE_MASK;
	let implemented_in_il_or_runtime = code_type == MethodImplAttributes::IL || code_type == MethodImplAttributes::RUNTIME;
	implemented_in_il_or_runtime && method.declaring_type().full_name() == type_def.full_name()
}
