//! Type and member-name rendering (C5). These rules determine bit-level
//! compatibility with the expected output, so each is grounded directly in
//! §4.4 and kept close to that ordering.

use std::sync::OnceLock;

use fxhash::FxHashMap;

use crate::format::FormatOptions;
use crate::metadata::{AssemblyIdentity, GenericParameter, GenericParameterAttributes, TypeHandle};

/// SByte→int8 … Object→object (§4.4). Keyed by the type's fully-qualified
/// name; a parallel lookup over the same table covers managed-reference
/// forms, since [`render_type_name`] recurses through the by-ref wrapper
/// before consulting this map.
fn alias_map() -> &'static FxHashMap<&'static str, &'static str> {
	static MAP: OnceLock<FxHashMap<&'static str, &'static str>> = OnceLock::new();
	MAP.get_or_init(|| {
		FxHashMap::from_iter([
			("System.SByte", "int8"),
			("System.Int16", "int16"),
			("System.Int32", "int32"),
			("System.Int64", "int64"),
			("System.Byte", "uint8"),
			("System.UInt16", "uint16"),
			("System.UInt32", "uint32"),
			("System.UInt64", "uint64"),
			("System.Single", "float32"),
			("System.Double", "float64"),
			("System.String", "string"),
			("System.Char", "char"),
			("System.Boolean", "bool"),
			("System.Void", "void"),
			("System.Object", "object"),
		])
	})
}

const NO_CLASS_MARKER_TYPES: [&str; 4] = ["System.Object", "System.String", "System.Void", "System.ValueType"];

/// Renders a type reference per §4.4's ordered rule list.
pub fn render_type_name(current_assembly: Option<&AssemblyIdentity>, type_handle: &dyn TypeHandle, options: FormatOptions) -> String {
	if type_handle.is_by_ref() {
		let element = type_handle.element_type().expect("by-ref type must have an element type");
		return format!("{}&", render_type_name(current_assembly, element.as_ref(), options));
	}

	if type_handle.is_array() {
		let element = type_handle.element_type().expect("array type must have an element type");
		let element_options = FormatOptions {
			use_aliases: options.use_aliases || options.use_alias_on_params,
			use_alias_on_params: options.use_alias_on_params,
		};
		let element_text = render_type_name(current_assembly, element.as_ref(), element_options);
		let rank = type_handle.array_rank();
		return if rank <= 1 {
			format!("{element_text}[]")
		} else {
			let dims = std::iter::repeat("0...").take(rank as usize).collect::<Vec<_>>().join(",");
			format!("{element_text}[{dims}]")
		};
	}

	if options.use_aliases {
		if let Some(alias) = alias_map().get(type_handle.full_name().as_str()) {
			return (*alias).to_string();
		}
	}

	let assembly_prefix = match current_assembly {
		Some(current) if current.full_name == type_handle.assembly().full_name => String::new(),
		_ => format!("[{}]", type_handle.assembly().short_name()),
	};

	if type_handle.is_generic_instantiation() {
		let args = type_handle
			.generic_arguments()
			.iter()
			.map(|arg| render_type_name(current_assembly, arg.as_ref(), options))
			.collect::<Vec<_>>()
			.join(",");
		return format!("{assembly_prefix}{}<{args}>", type_handle.full_name());
	}

	format!("{assembly_prefix}{}", type_handle.full_name())
}

/// Whether the leading `class ` marker (§4.4's "Type identifier" rule) is
/// required for this type reference. `in_member_position` is true whenever
/// the caller is rendering a field/parameter/return type, where the marker is
/// additionally suppressed for types declared in the current assembly.
pub fn requires_class_identifier(current_assembly: Option<&AssemblyIdentity>, type_handle: &dyn TypeHandle, in_member_position: bool) -> bool {
	let type_handle = if type_handle.is_array() {
		match type_handle.element_type() {
			Some(element) => return requires_class_identifier(current_assembly, element.as_ref(), in_member_position),
			None => return false,
		}
	} else {
		type_handle
	};

	if !(type_handle.is_class() || type_handle.is_interface()) {
		return false;
	}
	if NO_CLASS_MARKER_TYPES.contains(&type_handle.full_name().as_str()) {
		return false;
	}
	if type_handle.is_generic_parameter() {
		return false;
	}
	if in_member_position {
		if let Some(current) = current_assembly {
			if current.full_name == type_handle.assembly().full_name {
				return false;
			}
		}
	}
	true
}

/// Renders the leading `class ` token (with trailing space) if required,
/// otherwise an empty string — convenience wrapper over
/// [`requires_class_identifier`] for the emitters that just want to splice
/// the token in.
pub fn class_identifier_prefix(current_assembly: Option<&AssemblyIdentity>, type_handle: &dyn TypeHandle, in_member_position: bool) -> &'static str {
	if requires_class_identifier(current_assembly, type_handle, in_member_position) {
		"class "
	} else {
		""
	}
}

/// Renders the `<T, U>` suffix for a type's or method's generic-parameter
/// list (§4.4), or an empty string when there are none.
pub fn render_generic_parameter_list(
	current_assembly: Option<&AssemblyIdentity>,
	parameters: &[GenericParameter],
	options: FormatOptions,
) -> String {
	if parameters.is_empty() {
		return String::new();
	}
	let rendered = parameters
		.iter()
		.map(|parameter| render_generic_parameter(current_assembly, parameter, options))
		.collect::<Vec<_>>()
		.join(", ");
	format!("<{rendered}>")
}

/// Renders one generic parameter's space-joined attribute tokens, optional
/// constraint list, and display name (§4.4).
fn render_generic_parameter(current_assembly: Option<&AssemblyIdentity>, parameter: &GenericParameter, options: FormatOptions) -> String {
	let mut tokens = Vec::new();
	if parameter.attributes.contains(GenericParameterAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT) {
		tokens.push(".ctor".to_string());
	}
	if parameter.attributes.contains(GenericParameterAttributes::NOT_NULLABLE_VALUE_TYPE_CONSTRAINT) {
		tokens.push("valuetype".to_string());
	}
	if parameter.attributes.contains(GenericParameterAttributes::REFERENCE_TYPE_CONSTRAINT) {
		tokens.push("class".to_string());
	}
	let variance = parameter.attributes & GenericParameterAttributes::VARIANCE_MASK;
	if variance == GenericParameterAttributes::COVARIANT {
		tokens.push("+".to_string());
	} else if variance == GenericParameterAttributes::CONTRAVARIANT {
		tokens.push("-".to_string());
	}
	if !parameter.constraints.is_empty() {
		let constraints = parameter
			.constraints
			.iter()
			.map(|constraint| {
				let prefix = class_identifier_prefix(current_assembly, constraint.as_ref(), false);
				let name = render_type_name(current_assembly, constraint.as_ref(), options);
				format!("{prefix}{name}")
			})
			.collect::<Vec<_>>()
			.join(", ");
		tokens.push(format!("({constraints})"));
	}
	tokens.push(parameter.name.clone());
	tokens.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::metadata::TypeAttributes;

	#[derive(Debug)]
	struct FakeType {
		full_name: &'static str,
		assembly: &'static str,
		is_class: bool,
		is_interface: bool,
		is_value_type: bool,
		is_array: bool,
		rank: u32,
		is_by_ref: bool,
		element: Option<Box<FakeType>>,
		is_generic_parameter: bool,
	}

	impl FakeType {
		fn simple(full_name: &'static str, assembly: &'static str) -> Self {
			Self {
				full_name,
				assembly,
				is_class: true,
				is_interface: false,
				is_value_type: false,
				is_array: false,
				rank: 0,
				is_by_ref: false,
				element: None,
				is_generic_parameter: false,
			}
		}
	}

	impl TypeHandle for FakeType {
		fn full_name(&self) -> String {
			self.full_name.to_string()
		}
		fn assembly(&self) -> AssemblyIdentity {
			AssemblyIdentity { full_name: self.assembly.to_string() }
		}
		fn is_class(&self) -> bool {
			self.is_class
		}
		fn is_interface(&self) -> bool {
			self.is_interface
		}
		fn is_value_type(&self) -> bool {
			self.is_value_type
		}
		fn is_enum(&self) -> bool {
			false
		}
		fn enum_underlying_type(&self) -> Option<Box<dyn TypeHandle>> {
			None
		}
		fn is_generic_parameter(&self) -> bool {
			self.is_generic_parameter
		}
		fn is_generic_instantiation(&self) -> bool {
			false
		}
		fn generic_arguments(&self) -> Vec<Box<dyn TypeHandle>> {
			Vec::new()
		}
		fn is_array(&self) -> bool {
			self.is_array
		}
		fn array_rank(&self) -> u32 {
			self.rank
		}
		fn is_by_ref(&self) -> bool {
			self.is_by_ref
		}
		fn element_type(&self) -> Option<Box<dyn TypeHandle>> {
			self.element.as_ref().map(|e| Box::new(e.as_ref().clone_for_test()) as Box<dyn TypeHandle>)
		}
		fn attributes(&self) -> TypeAttributes {
			TypeAttributes::PUBLIC
		}
	}

	impl FakeType {
		fn clone_for_test(&self) -> FakeType {
			FakeType {
				full_name: self.full_name,
				assembly: self.assembly,
				is_class: self.is_class,
				is_interface: self.is_interface,
				is_value_type: self.is_value_type,
				is_array: self.is_array,
				rank: self.rank,
				is_by_ref: self.is_by_ref,
				element: self.element.clone(),
				is_generic_parameter: self.is_generic_parameter,
			}
		}
	}

	impl Clone for FakeType {
		fn clone(&self) -> Self {
			self.clone_for_test()
		}
	}

	fn mscorlib() -> AssemblyIdentity {
		AssemblyIdentity { full_name: "mscorlib, Version=4.0.0.0".to_string() }
	}

	#[test]
	fn aliases_primitive_types() {
		let int32 = FakeType::simple("System.Int32", "mscorlib");
		let text = render_type_name(Some(&mscorlib()), &int32, FormatOptions::default());
		assert_eq!(text, "int32");
	}

	#[test]
	fn prefixes_foreign_assembly_types() {
		let custom = FakeType::simple("MyNamespace.MyType", "OtherAssembly, Version=1.0.0.0");
		let text = render_type_name(Some(&mscorlib()), &custom, FormatOptions::default());
		assert_eq!(text, "[OtherAssembly]MyNamespace.MyType");
	}

	#[test]
	fn suppresses_assembly_prefix_within_current_assembly() {
		let current = AssemblyIdentity { full_name: "MyAssembly".to_string() };
		let local = FakeType::simple("MyNamespace.MyType", "MyAssembly");
		let text = render_type_name(Some(&current), &local, FormatOptions::default());
		assert_eq!(text, "MyNamespace.MyType");
	}

	#[test]
	fn by_ref_primitive_gets_aliased_and_suffixed() {
		let mut byref = FakeType::simple("System.Int32&", "mscorlib");
		byref.is_by_ref = true;
		byref.element = Some(Box::new(FakeType::simple("System.Int32", "mscorlib")));
		let text = render_type_name(Some(&mscorlib()), &byref, FormatOptions::default());
		assert_eq!(text, "int32&");
	}

	#[test]
	fn single_rank_array_uses_brackets() {
		let mut array = FakeType::simple("System.Int32[]", "mscorlib");
		array.is_array = true;
		array.rank = 1;
		array.element = Some(Box::new(FakeType::simple("System.Int32", "mscorlib")));
		let text = render_type_name(Some(&mscorlib()), &array, FormatOptions::default());
		assert_eq!(text, "int32[]");
	}

	#[test]
	fn higher_rank_array_emits_rank_commas() {
		let mut array = FakeType::simple("System.Int32[,]", "mscorlib");
		array.is_array = true;
		array.rank = 2;
		array.element = Some(Box::new(FakeType::simple("System.Int32", "mscorlib")));
		let text = render_type_name(Some(&mscorlib()), &array, FormatOptions::default());
		assert_eq!(text, "int32[0...,0...]");
	}

	#[test]
	fn class_identifier_required_for_foreign_class_types() {
		let custom = FakeType::simple("MyNamespace.MyType", "OtherAssembly");
		assert!(requires_class_identifier(Some(&mscorlib()), &custom, true));
	}

	#[test]
	fn class_identifier_suppressed_for_special_types() {
		let object = FakeType::simple("System.Object", "mscorlib");
		assert!(!requires_class_identifier(Some(&mscorlib()), &object, true));
	}

	#[test]
	fn class_identifier_suppressed_for_value_types() {
		let mut value_type = FakeType::simple("MyNamespace.MyStruct", "mscorlib");
		value_type.is_class = false;
		value_type.is_value_type = true;
		assert!(!requires_class_identifier(Some(&mscorlib()), &value_type, true));
	}

	#[test]
	fn empty_generic_parameter_list_renders_as_empty_string() {
		let text = render_generic_parameter_list(Some(&mscorlib()), &[], FormatOptions::default());
		assert_eq!(text, "");
	}

	#[test]
	fn unconstrained_generic_parameters_render_bare_names() {
		let parameters = vec![
			GenericParameter { name: "T".to_string(), attributes: GenericParameterAttributes::empty(), constraints: Vec::new() },
			GenericParameter { name: "U".to_string(), attributes: GenericParameterAttributes::empty(), constraints: Vec::new() },
		];
		let text = render_generic_parameter_list(Some(&mscorlib()), &parameters, FormatOptions::default());
		assert_eq!(text, "<T, U>");
	}

	#[test]
	fn variance_and_constructor_constraint_tokens_precede_the_name() {
		let parameters = vec![GenericParameter {
			name: "T".to_string(),
			attributes: GenericParameterAttributes::COVARIANT | GenericParameterAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT,
			constraints: Vec::new(),
		}];
		let text = render_generic_parameter_list(Some(&mscorlib()), &parameters, FormatOptions::default());
		assert_eq!(text, "<.ctor + T>");
	}

	#[test]
	fn type_constraint_is_parenthesized_with_class_prefix() {
		let parameters = vec![GenericParameter {
			name: "T".to_string(),
			attributes: GenericParameterAttributes::empty(),
			constraints: vec![Box::new(FakeType::simple("MyNamespace.IComparable", "OtherAssembly")) as Box<dyn TypeHandle>],
		}];
		let text = render_generic_parameter_list(Some(&mscorlib()), &parameters, FormatOptions::default());
		assert_eq!(text, "<([OtherAssembly]MyNamespace.IComparable) T>");
	}

	#[test]
	fn reference_type_constraint_emits_class_token() {
		let parameters = vec![GenericParameter {
			name: "T".to_string(),
			attributes: GenericParameterAttributes::REFERENCE_TYPE_CONSTRAINT,
			constraints: Vec::new(),
		}];
		let text = render_generic_parameter_list(Some(&mscorlib()), &parameters, FormatOptions::default());
		assert_eq!(text, "<class T>");
	}
}
