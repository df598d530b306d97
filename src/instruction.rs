//! The instruction model (C3): a flat, arena-owned sequence of decoded
//! instructions. The specified shape is a doubly-linked list with branch
//! cross-references; that is a cyclic object graph, so here it is flattened
//! to a `Vec<Instruction>` with `previous`/`next`/branch targets represented
//! as indices into that vector, per the crate's own design notes on porting
//! linked structures to a systems language.

use crate::metadata::{FieldRef, MemberHandle, MethodRef, SignatureHandle, TypeHandle};
use crate::opcodes::InvokeKind;

/// A position inside a decoded method's instruction arena.
///
/// There is no sentinel variant: "target absent" is `Option<InstructionIndex>`
/// rather than a magic value, so an out-of-range branch resolves to `None`
/// and can never be mistaken for index 0 (I2, I3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionIndex(pub usize);

/// Which sequence an `InlineVar`/`ShortInlineVar` index dereferences,
/// resolved at decode time by the opcode's mnemonic (§4.3): any mnemonic
/// containing `loc` indexes locals, everything else indexes parameters.
#[derive(Debug, Clone)]
pub enum Variable {
	Local { index: u16 },
	Parameter { index: u16, name: String },
}

/// The tagged union of operand shapes (§3's closed operand set, plus the
/// `calli`/`no.`/`unaligned.` fixes recorded in the expanded spec).
#[derive(Debug)]
pub enum Operand {
	None,
	Branch(Option<InstructionIndex>),
	Switch(Vec<Option<InstructionIndex>>),
	Int8(i8),
	UInt8(u8),
	Int32(i32),
	Int64(i64),
	Float32(f32),
	Float64(f64),
	String(String),
	Type(Box<dyn TypeHandle>),
	Method(Box<dyn MethodRef>),
	Field(Box<dyn FieldRef>),
	/// `ldtoken` / `sizeof`: the unified resolver may hand back any member kind.
	Token(MemberHandle),
	Signature(Box<dyn SignatureHandle>),
	Variable(Variable),
}

/// One decoded instruction. Logically immutable once the decoder has
/// finished resolving branch targets (§3).
#[derive(Debug)]
pub struct Instruction {
	/// Byte offset within the IL stream; the stable label (I1).
	pub offset: u32,
	pub mnemonic: &'static str,
	pub invoke_kind: InvokeKind,
	/// Total encoded size, opcode bytes plus operand bytes.
	pub size: u32,
	pub operand: Operand,
}

impl Instruction {
	pub fn is_invoke(&self) -> bool {
		!matches!(self.invoke_kind, InvokeKind::None)
	}
}

/// A decoded method body: the flat instruction arena plus a side index for
/// `offset -> position` lookups, built once after decode and used by branch
/// resolution and by the emitter to find markers at a given offset.
#[derive(Debug)]
pub struct MethodBody {
	pub instructions: Vec<Instruction>,
}

impl MethodBody {
	/// Binary search over the offset-ordered arena (I1 guarantees ascending
	/// offsets, so this is always valid).
	pub fn index_of_offset(&self, offset: u32) -> Option<InstructionIndex> {
		self.instructions
			.binary_search_by_key(&offset, |instruction| instruction.offset)
			.ok()
			.map(InstructionIndex)
	}

	pub fn get(&self, index: InstructionIndex) -> &Instruction {
		&self.instructions[index.0]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn instruction(offset: u32, size: u32) -> Instruction {
		Instruction { offset, mnemonic: "nop", invoke_kind: InvokeKind::None, size, operand: Operand::None }
	}

	#[test]
	fn index_of_offset_finds_exact_matches_only() {
		let body = MethodBody { instructions: vec![instruction(0, 1), instruction(1, 5), instruction(6, 1)] };
		assert_eq!(body.index_of_offset(0), Some(InstructionIndex(0)));
		assert_eq!(body.index_of_offset(6), Some(InstructionIndex(2)));
		assert_eq!(body.index_of_offset(3), None);
		assert_eq!(body.index_of_offset(100), None);
	}
}
