//! The metadata provider contract (C4): everything the core treats as an
//! external collaborator. No implementation lives here — only the traits and
//! plain data the decoder and emitters are driven by.

use std::fmt::Debug;

use bitflags::bitflags;

use crate::error::TokenResolutionError;

bitflags! {
	/// ECMA-335 II.23.1.15 `TypeAttributes`.
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct TypeAttributes: u32 {
		const VISIBILITY_MASK = 0x0000_0007;
		const NOT_PUBLIC = 0x0000_0000;
		const PUBLIC = 0x0000_0001;
		const NESTED_PUBLIC = 0x0000_0002;
		const NESTED_PRIVATE = 0x0000_0003;
		const NESTED_FAMILY = 0x0000_0004;
		const NESTED_ASSEMBLY = 0x0000_0005;
		const NESTED_FAMILY_AND_ASSEMBLY = 0x0000_0006;
		const NESTED_FAMILY_OR_ASSEMBLY = 0x0000_0007;

		const LAYOUT_MASK = 0x0000_0018;
		const AUTO_LAYOUT = 0x0000_0000;
		const SEQUENTIAL_LAYOUT = 0x0000_0008;
		const EXPLICIT_LAYOUT = 0x0000_0010;

		const CLASS_SEMANTICS_MASK = 0x0000_0020;
		const CLASS = 0x0000_0000;
		const INTERFACE = 0x0000_0020;

		const ABSTRACT = 0x0000_0080;
		const SEALED = 0x0000_0100;
		const SPECIAL_NAME = 0x0000_0400;

		const IMPORTED = 0x0000_1000;
		const SERIALIZABLE = 0x0000_2000;

		const STRING_FORMAT_MASK = 0x0003_0000;
		const ANSI_CLASS = 0x0000_0000;
		const UNICODE_CLASS = 0x0001_0000;
		const AUTO_CLASS = 0x0002_0000;
		const CUSTOM_FORMAT_CLASS = 0x0003_0000;

		const BEFORE_FIELD_INIT = 0x0010_0000;
		const RT_SPECIAL_NAME = 0x0000_0800;
	}
}

bitflags! {
	/// ECMA-335 II.23.1.5 `FieldAttributes`.
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct FieldAttributes: u16 {
		const FIELD_ACCESS_MASK = 0x0007;
		const COMPILER_CONTROLLED = 0x0000;
		const PRIVATE = 0x0001;
		const FAMILY_AND_ASSEMBLY = 0x0002;
		const ASSEMBLY = 0x0003;
		const FAMILY = 0x0004;
		const FAMILY_OR_ASSEMBLY = 0x0005;
		const PUBLIC = 0x0006;

		const STATIC = 0x0010;
		const INIT_ONLY = 0x0020;
		const LITERAL = 0x0040;
		const NOT_SERIALIZED = 0x0080;
		const SPECIAL_NAME = 0x0200;
		const PINVOKE_IMPL = 0x2000;
		const RT_SPECIAL_NAME = 0x0400;
		const HAS_FIELD_MARSHAL = 0x1000;
		const HAS_DEFAULT = 0x8000;
		const HAS_FIELD_RVA = 0x0100;
	}
}

bitflags! {
	/// ECMA-335 II.23.1.10 `MethodAttributes`. The teacher left this table as
	/// an empty stub; filled in here because the method emitter's signature
	/// line (§4.7) depends on it directly.
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct MethodAttributes: u16 {
		const MEMBER_ACCESS_MASK = 0x0007;
		const COMPILER_CONTROLLED = 0x0000;
		const PRIVATE = 0x0001;
		const FAMILY_AND_ASSEMBLY = 0x0002;
		const ASSEMBLY = 0x0003;
		const FAMILY = 0x0004;
		const FAMILY_OR_ASSEMBLY = 0x0005;
		const PUBLIC = 0x0006;

		const STATIC = 0x0010;
		const FINAL = 0x0020;
		const VIRTUAL = 0x0040;
		const HIDE_BY_SIG = 0x0080;

		const VTABLE_LAYOUT_MASK = 0x0100;
		const REUSE_SLOT = 0x0000;
		const NEW_SLOT = 0x0100;

		const STRICT = 0x0200;
		const ABSTRACT = 0x0400;
		const SPECIAL_NAME = 0x0800;

		const PINVOKE_IMPL = 0x2000;
		const UNMANAGED_EXPORT = 0x0008;
		const RT_SPECIAL_NAME = 0x1000;
		const HAS_SECURITY = 0x4000;
		const REQUIRE_SEC_OBJECT = 0x8000;
	}
}

bitflags! {
	/// ECMA-335 II.23.1.11 `MethodImplAttributes`, restricted to the codes
	/// relevant here: `CodeType` (IL/native/OPTIL/runtime) plus `Managed`.
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct MethodImplAttributes: u16 {
		const CODE_TYPE_MASK = 0x0003;
		const IL = 0x0000;
		const NATIVE = 0x0001;
		const OPTIL = 0x0002;
		const RUNTIME = 0x0003;

		const MANAGED_MASK = 0x0004;
		const UNMANAGED = 0x0004;
		const MANAGED = 0x0000;

		const FORWARD_REF = 0x0010;
		const PRESERVE_SIG = 0x0080;
		const INTERNAL_CALL = 0x1000;
		const SYNCHRONIZED = 0x0020;
		const NO_INLINING = 0x0008;
		const NO_OPTIMIZATION = 0x0040;
	}
}

bitflags! {
	/// ECMA-335 II.23.1.13 `ParamAttributes`.
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct ParamAttributes: u16 {
		const IN = 0x0001;
		const OUT = 0x0002;
		const OPTIONAL = 0x0010;
		const HAS_DEFAULT = 0x1000;
		const HAS_FIELD_MARSHAL = 0x2000;
	}
}

bitflags! {
	/// ECMA-335 II.25.4.6 exception-clause flags. `CLAUSE` (the catch form)
	/// is the zero value, matching the wire encoding.
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct ExceptionHandlingClauseFlags: u32 {
		const CLAUSE = 0x0000;
		const FILTER = 0x0001;
		const FINALLY = 0x0002;
		const FAULT = 0x0004;
	}
}

bitflags! {
	/// ECMA-335 II.23.1.7 `GenericParamAttributes`.
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct GenericParameterAttributes: u16 {
		const VARIANCE_MASK = 0x0003;
		const NONE = 0x0000;
		const COVARIANT = 0x0001;
		const CONTRAVARIANT = 0x0002;

		const SPECIAL_CONSTRAINT_MASK = 0x001C;
		const REFERENCE_TYPE_CONSTRAINT = 0x0004;
		const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT = 0x0008;
		const DEFAULT_CONSTRUCTOR_CONSTRAINT = 0x0010;
	}
}

/// A resolved constant or literal value (field literals, parameter default
/// values).
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
	Bool(bool),
	Char(u16),
	I8(i8),
	U8(u8),
	I16(i16),
	U16(u16),
	I32(i32),
	U32(u32),
	I64(i64),
	U64(u64),
	F32(f32),
	F64(f64),
	String(String),
	NullRef,
}

/// An assembly identity, as needed to render `[ShortName]` prefixes (§4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyIdentity {
	pub full_name: String,
}

impl AssemblyIdentity {
	/// The first comma-separated field of the assembly's full name.
	pub fn short_name(&self) -> &str {
		self.full_name.split(',').next().unwrap_or(&self.full_name)
	}
}

/// A reference to a type: either a type definition, a generic instantiation,
/// an array, a by-ref form, or a generic parameter. Everything C5's
/// type/member formatter needs to know about a type it is rendering.
pub trait TypeHandle: Debug {
	fn full_name(&self) -> String;
	fn assembly(&self) -> AssemblyIdentity;
	fn is_class(&self) -> bool;
	fn is_interface(&self) -> bool;
	fn is_value_type(&self) -> bool;
	fn is_enum(&self) -> bool;
	/// The primitive backing a `.is_enum()` type, for literal field rendering.
	fn enum_underlying_type(&self) -> Option<Box<dyn TypeHandle>>;
	fn is_generic_parameter(&self) -> bool;
	fn is_generic_instantiation(&self) -> bool;
	fn generic_arguments(&self) -> Vec<Box<dyn TypeHandle>>;
	fn is_array(&self) -> bool;
	fn array_rank(&self) -> u32;
	fn is_by_ref(&self) -> bool;
	/// Element type of an array or by-ref form. `None` for anything else.
	fn element_type(&self) -> Option<Box<dyn TypeHandle>>;
	fn attributes(&self) -> TypeAttributes;
}

/// A type definition: a [`TypeHandle`] that also enumerates its members, the
/// input to [`crate::disassemble`].
pub trait TypeDefHandle: TypeHandle {
	fn namespace(&self) -> Option<String>;
	fn base_type(&self) -> Option<Box<dyn TypeHandle>>;
	fn interfaces(&self) -> Vec<Box<dyn TypeHandle>>;
	fn generic_parameters(&self) -> Vec<GenericParameter>;
	fn custom_attributes(&self) -> Vec<CustomAttribute>;
	fn fields(&self) -> Vec<Box<dyn FieldDefHandle>>;
	fn properties(&self) -> Vec<Box<dyn PropertyDefHandle>>;
	fn events(&self) -> Vec<Box<dyn EventDefHandle>>;
	fn methods(&self) -> Vec<Box<dyn MethodDefHandle>>;
}

/// A generic parameter on a type or method (§4.4's generic-parameter list).
#[derive(Debug)]
pub struct GenericParameter {
	pub name: String,
	pub attributes: GenericParameterAttributes,
	pub constraints: Vec<Box<dyn TypeHandle>>,
}

/// A reference to a method, as it appears as an instruction operand or inside
/// a property/event accessor table.
pub trait MethodRef: Debug {
	fn name(&self) -> String;
	fn declaring_type(&self) -> Box<dyn TypeHandle>;
	fn is_static(&self) -> bool;
	fn is_constructor(&self) -> bool;
	fn return_type(&self) -> Box<dyn TypeHandle>;
	fn parameter_types(&self) -> Vec<Box<dyn TypeHandle>>;
	fn is_compiler_generated(&self) -> bool;
}

/// A declared method, the input to the method emitter (C9).
pub trait MethodDefHandle: MethodRef {
	fn attributes(&self) -> MethodAttributes;
	fn impl_attributes(&self) -> MethodImplAttributes;
	fn is_virtual(&self) -> bool;
	fn generic_parameters(&self) -> Vec<GenericParameter>;
	fn parameters(&self) -> Vec<Parameter>;
	fn custom_attributes(&self) -> Vec<CustomAttribute>;
	fn locals(&self) -> Vec<LocalVariable>;
	fn max_stack(&self) -> u32;
	fn exception_clauses(&self) -> Vec<ExceptionClause>;
	/// `false` for abstract, extern, or otherwise IL-less methods.
	fn has_body(&self) -> bool;
	/// The raw IL byte array, or `None` if a body is declared but its bytes
	/// could not be obtained.
	fn il_bytes(&self) -> Option<&[u8]>;
	fn type_generic_arguments(&self) -> Vec<Box<dyn TypeHandle>>;
	fn method_generic_arguments(&self) -> Vec<Box<dyn TypeHandle>>;
}

/// A reference to a field, as an instruction operand.
pub trait FieldRef: Debug {
	fn name(&self) -> String;
	fn declaring_type(&self) -> Box<dyn TypeHandle>;
	fn field_type(&self) -> Box<dyn TypeHandle>;
	fn is_compiler_generated(&self) -> bool;
}

/// A declared field, the input to the field emitter (C10).
pub trait FieldDefHandle: FieldRef {
	fn attributes(&self) -> FieldAttributes;
	fn constant_value(&self) -> Option<ConstantValue>;
	fn custom_attributes(&self) -> Vec<CustomAttribute>;
}

/// A declared property, the input to the property emitter (C10).
pub trait PropertyDefHandle: Debug {
	fn name(&self) -> String;
	fn property_type(&self) -> Box<dyn TypeHandle>;
	fn is_instance(&self) -> bool;
	fn getter(&self) -> Option<Box<dyn MethodRef>>;
	fn setter(&self) -> Option<Box<dyn MethodRef>>;
	fn custom_attributes(&self) -> Vec<CustomAttribute>;
}

/// A declared event, the input to the event emitter (C10).
pub trait EventDefHandle: Debug {
	fn name(&self) -> String;
	fn handler_type(&self) -> Box<dyn TypeHandle>;
	fn add_method(&self) -> Box<dyn MethodRef>;
	fn remove_method(&self) -> Box<dyn MethodRef>;
	fn custom_attributes(&self) -> Vec<CustomAttribute>;
}

/// A declared parameter (§4.7's parameter rendering).
#[derive(Debug)]
pub struct Parameter {
	pub name: String,
	pub parameter_type: Box<dyn TypeHandle>,
	pub attributes: ParamAttributes,
	pub default_value: Option<ConstantValue>,
}

/// A declared local variable (`.locals init`, §4.7).
#[derive(Debug)]
pub struct LocalVariable {
	pub local_type: Box<dyn TypeHandle>,
}

/// A custom-attribute application: the constructor it invokes plus its raw,
/// unparsed argument blob (raw-data rendering of constructor arguments is out
/// of scope — §1).
#[derive(Debug)]
pub struct CustomAttribute {
	pub constructor: Box<dyn MethodRef>,
	pub value_blob: Vec<u8>,
}

/// One entry of a method's exception-handling clause table (input to C8).
#[derive(Debug)]
pub struct ExceptionClause {
	pub flags: ExceptionHandlingClauseFlags,
	pub try_offset: u32,
	pub try_length: u32,
	pub handler_offset: u32,
	pub handler_length: u32,
	pub filter_offset: Option<u32>,
	pub catch_type: Option<Box<dyn TypeHandle>>,
}

/// A resolved `StandAloneSig`, the operand of `calli` (§B of the expanded
/// spec).
pub trait SignatureHandle: Debug {
	/// Whether the `HASTHIS` bit is set — drives `calli`'s `instance ` prefix
	/// the same way a resolved method's staticness drives it for
	/// `call`/`callvirt`/`newobj` (§4.5).
	fn is_instance(&self) -> bool;
	fn calling_convention_text(&self) -> String;
	fn return_type(&self) -> Box<dyn TypeHandle>;
	fn parameter_types(&self) -> Vec<Box<dyn TypeHandle>>;
}

/// The result of resolving a metadata token through the unified member
/// resolver: `InlineTok`, `InlineType`, `InlineMethod`, and `InlineField`
/// operands all go through this one call (§4.3).
#[derive(Debug)]
pub enum MemberHandle {
	Type(Box<dyn TypeHandle>),
	Method(Box<dyn MethodRef>),
	Field(Box<dyn FieldRef>),
}

/// Everything the decoder and emitters need from the metadata service: token,
/// string, and signature resolution. No other collaborator (module loading,
/// disk I/O, CLI) is in scope (§1).
pub trait MetadataProvider {
	fn resolve_member(
		&self,
		token: u32,
		type_generics: &[Box<dyn TypeHandle>],
		method_generics: &[Box<dyn TypeHandle>],
	) -> Result<MemberHandle, TokenResolutionError>;

	fn resolve_string(&self, token: u32) -> Result<String, TokenResolutionError>;

	fn resolve_signature(&self, token: u32) -> Result<Box<dyn SignatureHandle>, TokenResolutionError>;
}
