//! The method-body decoder (C7): drives the byte cursor and opcode tables to
//! produce a flat instruction arena, resolving embedded tokens through the
//! metadata provider and branch/switch offsets against the arena itself.

use crate::cursor::ByteCursor;
use crate::error::{DisassemblerError, IlError};
use crate::instruction::{Instruction, MethodBody, Operand, Variable};
use crate::metadata::{MemberHandle, MetadataProvider, MethodDefHandle};
use crate::opcodes::{self, OperandKind, OpcodeDescriptor};

#[cfg_attr(feature = "tracing", tracing::instrument(skip(method, provider)))]
pub fn decode_method_body(
	method: &dyn MethodDefHandle,
	provider: &dyn MetadataProvider,
) -> Result<MethodBody, DisassemblerError> {
	if !method.has_body() {
		return Err(DisassemblerError::MethodHasNoBody);
	}
	let bytes = method.il_bytes().ok_or(DisassemblerError::CannotReadIL)?;

	let locals = method.locals();
	let parameters = method.parameters();
	let type_generics = method.type_generic_arguments();
	let method_generics = method.method_generic_arguments();

	let mut cursor = ByteCursor::new(bytes);
	let mut instructions = Vec::new();
	let mut pending = Vec::new();

	while !cursor.is_at_end() {
		let offset = cursor.position() as u32;
		let first = cursor.read_u8()?;
		let descriptor = if first == 0xFE {
			let second = cursor.read_u8()?;
			opcodes::lookup_two_byte(second)
				.ok_or(IlError::UnknownOpcode { position: offset as usize, byte: second, two_byte: true })?
		} else {
			opcodes::lookup_one_byte(first)
				.ok_or(IlError::UnknownOpcode { position: offset as usize, byte: first, two_byte: false })?
		};

		let operand = decode_operand(
			descriptor,
			&mut cursor,
			provider,
			&type_generics,
			&method_generics,
			locals.len(),
			&parameters,
			method.is_static(),
			instructions.len(),
			&mut pending,
		)?;

		instructions.push(Instruction {
			offset,
			mnemonic: descriptor.mnemonic,
			invoke_kind: descriptor.invoke_kind,
			size: cursor.position() as u32 - offset,
			operand,
		});
	}

	resolve_branches(&mut instructions, pending);

	Ok(MethodBody { instructions })
}

/// A branch/switch operand whose raw offsets still need resolving against
/// the completed instruction arena (the two-phase decode the crate's own
/// design notes call for: raw offsets never escape as a public value, I3).
enum PendingTarget {
	Branch { index: usize, raw_offset: i64 },
	Switch { index: usize, raw_offsets: Vec<i64> },
}

#[allow(clippy::too_many_arguments)]
fn decode_operand(
	descriptor: &OpcodeDescriptor,
	cursor: &mut ByteCursor,
	provider: &dyn MetadataProvider,
	type_generics: &[Box<dyn crate::metadata::TypeHandle>],
	method_generics: &[Box<dyn crate::metadata::TypeHandle>],
	locals_len: usize,
	parameters: &[crate::metadata::Parameter],
	is_static: bool,
	instruction_index: usize,
	pending: &mut Vec<PendingTarget>,
) -> Result<Operand, DisassemblerError> {
	match descriptor.operand_kind {
		OperandKind::None => Ok(Operand::None),

		OperandKind::ShortBrTarget => {
			let displacement = cursor.read_i8()? as i64;
			let raw_offset = cursor.position() as i64 + displacement;
			pending.push(PendingTarget::Branch { index: instruction_index, raw_offset });
			Ok(Operand::Branch(None))
		}

		OperandKind::BrTarget => {
			let displacement = cursor.read_i32()? as i64;
			let raw_offset = cursor.position() as i64 + displacement;
			pending.push(PendingTarget::Branch { index: instruction_index, raw_offset });
			Ok(Operand::Branch(None))
		}

		OperandKind::InlineSwitch => {
			let count = cursor.read_u32()?;
			let base = cursor.position() as i64 + 4 * count as i64;
			let mut raw_offsets = Vec::with_capacity(count as usize);
			for _ in 0..count {
				let displacement = cursor.read_i32()? as i64;
				raw_offsets.push(base + displacement);
			}
			let len = raw_offsets.len();
			pending.push(PendingTarget::Switch { index: instruction_index, raw_offsets });
			Ok(Operand::Switch(vec![None; len]))
		}

		OperandKind::ShortInlineI => {
			let byte = cursor.read_u8()?;
			if descriptor.mnemonic == "ldc.i4.s" {
				Ok(Operand::Int8(byte as i8))
			} else {
				Ok(Operand::UInt8(byte))
			}
		}

		OperandKind::InlineI => Ok(Operand::Int32(cursor.read_i32()?)),
		OperandKind::InlineI8 => Ok(Operand::Int64(cursor.read_i64()?)),
		OperandKind::ShortInlineR => Ok(Operand::Float32(cursor.read_f32()?)),
		OperandKind::InlineR => Ok(Operand::Float64(cursor.read_f64()?)),

		OperandKind::InlineSig => {
			let token = cursor.read_u32()?;
			let signature = provider.resolve_signature(token)?;
			Ok(Operand::Signature(signature))
		}

		OperandKind::InlineString => {
			let token = cursor.read_u32()?;
			let string = provider.resolve_string(token)?;
			Ok(Operand::String(string))
		}

		OperandKind::InlineTok => {
			let token = cursor.read_u32()?;
			let member = provider.resolve_member(token, type_generics, method_generics)?;
			Ok(Operand::Token(member))
		}

		OperandKind::InlineType => {
			let token = cursor.read_u32()?;
			let member = provider.resolve_member(token, type_generics, method_generics)?;
			match member {
				MemberHandle::Type(t) => Ok(Operand::Type(t)),
				other => Ok(Operand::Token(other)),
			}
		}

		OperandKind::InlineMethod => {
			let token = cursor.read_u32()?;
			let member = provider.resolve_member(token, type_generics, method_generics)?;
			match member {
				MemberHandle::Method(m) => Ok(Operand::Method(m)),
				other => Ok(Operand::Token(other)),
			}
		}

		OperandKind::InlineField => {
			let token = cursor.read_u32()?;
			let member = provider.resolve_member(token, type_generics, method_generics)?;
			match member {
				MemberHandle::Field(f) => Ok(Operand::Field(f)),
				other => Ok(Operand::Token(other)),
			}
		}

		OperandKind::ShortInlineVar => {
			let index = cursor.read_u8()? as i64;
			Ok(Operand::Variable(resolve_variable(descriptor.mnemonic, index, locals_len, parameters, is_static)))
		}

		OperandKind::InlineVar => {
			let index = cursor.read_i16()? as i64;
			Ok(Operand::Variable(resolve_variable(descriptor.mnemonic, index, locals_len, parameters, is_static)))
		}
	}
}

/// Dispatches an `InlineVar`/`ShortInlineVar` index to the local-variable or
/// parameter sequence by mnemonic (§4.3): any mnemonic containing `loc`
/// indexes locals, everything else indexes parameters, with instance methods
/// offsetting by one to account for the implicit receiver at index 0.
fn resolve_variable(
	mnemonic: &'static str,
	index: i64,
	locals_len: usize,
	parameters: &[crate::metadata::Parameter],
	is_static: bool,
) -> Variable {
	if mnemonic.contains("loc") {
		let local_index = index.clamp(0, locals_len.saturating_sub(1) as i64) as u16;
		return Variable::Local { index: local_index };
	}

	if !is_static && index == 0 {
		return Variable::Parameter { index: 0, name: "this".to_string() };
	}

	let parameter_index = if is_static { index } else { index - 1 };
	match parameters.get(parameter_index.max(0) as usize) {
		Some(parameter) => Variable::Parameter { index: parameter_index as u16, name: parameter.name.clone() },
		None => Variable::Parameter { index: parameter_index.max(0) as u16, name: format!("arg{parameter_index}") },
	}
}

fn resolve_branches(instructions: &mut [Instruction], pending: Vec<PendingTarget>) {
	let offsets: Vec<u32> = instructions.iter().map(|instruction| instruction.offset).collect();
	let resolve = |raw: i64| -> Option<crate::instruction::InstructionIndex> {
		if raw < 0 {
			return None;
		}
		offsets.binary_search(&(raw as u32)).ok().map(crate::instruction::InstructionIndex)
	};

	for target in pending {
		match target {
			PendingTarget::Branch { index, raw_offset } => {
				instructions[index].operand = Operand::Branch(resolve(raw_offset));
			}
			PendingTarget::Switch { index, raw_offsets } => {
				let resolved: Vec<_> = raw_offsets.into_iter().map(resolve).collect();
				instructions[index].operand = Operand::Switch(resolved);
			}
		}
	}
}
