//! The opcode-descriptor tables (C2): two fixed-size arrays, one for the
//! one-byte encoding space and one for the two-byte `0xFE`-prefixed space,
//! built once and never mutated afterwards.

use std::sync::OnceLock;

/// The static schema for an opcode's inline argument (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
	None,
	ShortBrTarget,
	BrTarget,
	ShortInlineI,
	InlineI,
	InlineI8,
	ShortInlineR,
	InlineR,
	InlineVar,
	ShortInlineVar,
	InlineString,
	InlineSwitch,
	InlineSig,
	InlineTok,
	InlineType,
	InlineMethod,
	InlineField,
}

/// The only part of an opcode's category this crate needs: enough to detect
/// the four mnemonics whose operand rendering gets an `instance ` prefix
/// (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
	None,
	Call,
	Calli,
	CallVirt,
	NewObj,
}

/// Where an opcode lives in the lookup tables: index = low byte, `two_byte`
/// selects which array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoding {
	pub two_byte: bool,
	pub byte: u8,
}

impl Encoding {
	/// Total size, in bytes, of the opcode's own encoding (not its operand).
	pub fn size(&self) -> usize {
		if self.two_byte {
			2
		} else {
			1
		}
	}
}

/// An immutable opcode descriptor: name, encoding, operand schema, invoke
/// category (§3).
#[derive(Debug, Clone, Copy)]
pub struct OpcodeDescriptor {
	pub mnemonic: &'static str,
	pub encoding: Encoding,
	pub operand_kind: OperandKind,
	pub invoke_kind: InvokeKind,
}

const ONE_BYTE_LEN: usize = 0xE1;
const TWO_BYTE_LEN: usize = 0x1F;

macro_rules! descriptors {
	($($byte:literal, $mnemonic:literal, $kind:expr $(, $invoke:expr)?);* $(;)?) => {
		&[
			$(
				(
					$byte,
					$mnemonic,
					$kind,
					descriptors!(@invoke $($invoke)?),
				)
			),*
		]
	};
	(@invoke) => { InvokeKind::None };
	(@invoke $invoke:expr) => { $invoke };
}

#[rustfmt::skip]
const ONE_BYTE_DESCRIPTORS: &[(u8, &str, OperandKind, InvokeKind)] = descriptors! {
	0x00, "nop", OperandKind::None;
	0x01, "break", OperandKind::None;
	0x02, "ldarg.0", OperandKind::None;
	0x03, "ldarg.1", OperandKind::None;
	0x04, "ldarg.2", OperandKind::None;
	0x05, "ldarg.3", OperandKind::None;
	0x06, "ldloc.0", OperandKind::None;
	0x07, "ldloc.1", OperandKind::None;
	0x08, "ldloc.2", OperandKind::None;
	0x09, "ldloc.3", OperandKind::None;
	0x0A, "stloc.0", OperandKind::None;
	0x0B, "stloc.1", OperandKind::None;
	0x0C, "stloc.2", OperandKind::None;
	0x0D, "stloc.3", OperandKind::None;
	0x0E, "ldarg.s", OperandKind::ShortInlineVar;
	0x0F, "ldarga.s", OperandKind::ShortInlineVar;
	0x10, "starg.s", OperandKind::ShortInlineVar;
	0x11, "ldloc.s", OperandKind::ShortInlineVar;
	0x12, "ldloca.s", OperandKind::ShortInlineVar;
	0x13, "stloc.s", OperandKind::ShortInlineVar;
	0x14, "ldnull", OperandKind::None;
	0x15, "ldc.i4.m1", OperandKind::None;
	0x16, "ldc.i4.0", OperandKind::None;
	0x17, "ldc.i4.1", OperandKind::None;
	0x18, "ldc.i4.2", OperandKind::None;
	0x19, "ldc.i4.3", OperandKind::None;
	0x1A, "ldc.i4.4", OperandKind::None;
	0x1B, "ldc.i4.5", OperandKind::None;
	0x1C, "ldc.i4.6", OperandKind::None;
	0x1D, "ldc.i4.7", OperandKind::None;
	0x1E, "ldc.i4.8", OperandKind::None;
	0x1F, "ldc.i4.s", OperandKind::ShortInlineI;
	0x20, "ldc.i4", OperandKind::InlineI;
	0x21, "ldc.i8", OperandKind::InlineI8;
	0x22, "ldc.r4", OperandKind::ShortInlineR;
	0x23, "ldc.r8", OperandKind::InlineR;
	0x25, "dup", OperandKind::None;
	0x26, "pop", OperandKind::None;
	0x27, "jmp", OperandKind::InlineMethod;
	0x28, "call", OperandKind::InlineMethod, InvokeKind::Call;
	0x29, "calli", OperandKind::InlineSig, InvokeKind::Calli;
	0x2A, "ret", OperandKind::None;
	0x2B, "br.s", OperandKind::ShortBrTarget;
	0x2C, "brfalse.s", OperandKind::ShortBrTarget;
	0x2D, "brtrue.s", OperandKind::ShortBrTarget;
	0x2E, "beq.s", OperandKind::ShortBrTarget;
	0x2F, "bge.s", OperandKind::ShortBrTarget;
	0x30, "bgt.s", OperandKind::ShortBrTarget;
	0x31, "ble.s", OperandKind::ShortBrTarget;
	0x32, "blt.s", OperandKind::ShortBrTarget;
	0x33, "bne.un.s", OperandKind::ShortBrTarget;
	0x34, "bge.un.s", OperandKind::ShortBrTarget;
	0x35, "bgt.un.s", OperandKind::ShortBrTarget;
	0x36, "ble.un.s", OperandKind::ShortBrTarget;
	0x37, "blt.un.s", OperandKind::ShortBrTarget;
	0x38, "br", OperandKind::BrTarget;
	0x39, "brfalse", OperandKind::BrTarget;
	0x3A, "brtrue", OperandKind::BrTarget;
	0x3B, "beq", OperandKind::BrTarget;
	0x3C, "bge", OperandKind::BrTarget;
	0x3D, "bgt", OperandKind::BrTarget;
	0x3E, "ble", OperandKind::BrTarget;
	0x3F, "blt", OperandKind::BrTarget;
	0x40, "bne.un", OperandKind::BrTarget;
	0x41, "bge.un", OperandKind::BrTarget;
	0x42, "bgt.un", OperandKind::BrTarget;
	0x43, "ble.un", OperandKind::BrTarget;
	0x44, "blt.un", OperandKind::BrTarget;
	0x45, "switch", OperandKind::InlineSwitch;
	0x46, "ldind.i1", OperandKind::None;
	0x47, "ldind.u1", OperandKind::None;
	0x48, "ldind.i2", OperandKind::None;
	0x49, "ldind.u2", OperandKind::None;
	0x4A, "ldind.i4", OperandKind::None;
	0x4B, "ldind.u4", OperandKind::None;
	0x4C, "ldind.i8", OperandKind::None;
	0x4D, "ldind.i", OperandKind::None;
	0x4E, "ldind.r4", OperandKind::None;
	0x4F, "ldind.r8", OperandKind::None;
	0x50, "ldind.ref", OperandKind::None;
	0x51, "stind.ref", OperandKind::None;
	0x52, "stind.i1", OperandKind::None;
	0x53, "stind.i2", OperandKind::None;
	0x54, "stind.i4", OperandKind::None;
	0x55, "stind.i8", OperandKind::None;
	0x56, "stind.r4", OperandKind::None;
	0x57, "stind.r8", OperandKind::None;
	0x58, "add", OperandKind::None;
	0x59, "sub", OperandKind::None;
	0x5A, "mul", OperandKind::None;
	0x5B, "div", OperandKind::None;
	0x5C, "div.un", OperandKind::None;
	0x5D, "rem", OperandKind::None;
	0x5E, "rem.un", OperandKind::None;
	0x5F, "and", OperandKind::None;
	0x60, "or", OperandKind::None;
	0x61, "xor", OperandKind::None;
	0x62, "shl", OperandKind::None;
	0x63, "shr", OperandKind::None;
	0x64, "shr.un", OperandKind::None;
	0x65, "neg", OperandKind::None;
	0x66, "not", OperandKind::None;
	0x67, "conv.i1", OperandKind::None;
	0x68, "conv.i2", OperandKind::None;
	0x69, "conv.i4", OperandKind::None;
	0x6A, "conv.i8", OperandKind::None;
	0x6B, "conv.r4", OperandKind::None;
	0x6C, "conv.r8", OperandKind::None;
	0x6D, "conv.u4", OperandKind::None;
	0x6E, "conv.u8", OperandKind::None;
	0x6F, "callvirt", OperandKind::InlineMethod, InvokeKind::CallVirt;
	0x70, "cpobj", OperandKind::InlineType;
	0x71, "ldobj", OperandKind::InlineType;
	0x72, "ldstr", OperandKind::InlineString;
	0x73, "newobj", OperandKind::InlineMethod, InvokeKind::NewObj;
	0x74, "castclass", OperandKind::InlineType;
	0x75, "isinst", OperandKind::InlineType;
	0x76, "conv.r.un", OperandKind::None;
	0x79, "unbox", OperandKind::InlineType;
	0x7A, "throw", OperandKind::None;
	0x7B, "ldfld", OperandKind::InlineField;
	0x7C, "ldflda", OperandKind::InlineField;
	0x7D, "stfld", OperandKind::InlineField;
	0x7E, "ldsfld", OperandKind::InlineField;
	0x7F, "ldsflda", OperandKind::InlineField;
	0x80, "stsfld", OperandKind::InlineField;
	0x81, "stobj", OperandKind::InlineType;
	0x82, "conv.ovf.i1.un", OperandKind::None;
	0x83, "conv.ovf.i2.un", OperandKind::None;
	0x84, "conv.ovf.i4.un", OperandKind::None;
	0x85, "conv.ovf.i8.un", OperandKind::None;
	0x86, "conv.ovf.u1.un", OperandKind::None;
	0x87, "conv.ovf.u2.un", OperandKind::None;
	0x88, "conv.ovf.u4.un", OperandKind::None;
	0x89, "conv.ovf.u8.un", OperandKind::None;
	0x8A, "conv.ovf.i.un", OperandKind::None;
	0x8B, "conv.ovf.u.un", OperandKind::None;
	0x8C, "box", OperandKind::InlineType;
	0x8D, "newarr", OperandKind::InlineType;
	0x8E, "ldlen", OperandKind::None;
	0x8F, "ldelema", OperandKind::InlineType;
	0x90, "ldelem.i1", OperandKind::None;
	0x91, "ldelem.u1", OperandKind::None;
	0x92, "ldelem.i2", OperandKind::None;
	0x93, "ldelem.u2", OperandKind::None;
	0x94, "ldelem.i4", OperandKind::None;
	0x95, "ldelem.u4", OperandKind::None;
	0x96, "ldelem.i8", OperandKind::None;
	0x97, "ldelem.i", OperandKind::None;
	0x98, "ldelem.r4", OperandKind::None;
	0x99, "ldelem.r8", OperandKind::None;
	0x9A, "ldelem.ref", OperandKind::None;
	0x9B, "stelem.i", OperandKind::None;
	0x9C, "stelem.i1", OperandKind::None;
	0x9D, "stelem.i2", OperandKind::None;
	0x9E, "stelem.i4", OperandKind::None;
	0x9F, "stelem.i8", OperandKind::None;
	0xA0, "stelem.r4", OperandKind::None;
	0xA1, "stelem.r8", OperandKind::None;
	0xA2, "stelem.ref", OperandKind::None;
	0xA3, "ldelem", OperandKind::InlineType;
	0xA4, "stelem", OperandKind::InlineType;
	0xA5, "unbox.any", OperandKind::InlineType;
	0xB3, "conv.ovf.i1", OperandKind::None;
	0xB4, "conv.ovf.u1", OperandKind::None;
	0xB5, "conv.ovf.i2", OperandKind::None;
	0xB6, "conv.ovf.u2", OperandKind::None;
	0xB7, "conv.ovf.i4", OperandKind::None;
	0xB8, "conv.ovf.u4", OperandKind::None;
	0xB9, "conv.ovf.i8", OperandKind::None;
	0xBA, "conv.ovf.u8", OperandKind::None;
	0xC2, "refanyval", OperandKind::InlineType;
	0xC3, "ckfinite", OperandKind::None;
	0xC6, "mkrefany", OperandKind::InlineType;
	0xD0, "ldtoken", OperandKind::InlineTok;
	0xD1, "conv.u2", OperandKind::None;
	0xD2, "conv.u1", OperandKind::None;
	0xD3, "conv.i", OperandKind::None;
	0xD4, "conv.ovf.i", OperandKind::None;
	0xD5, "conv.ovf.u", OperandKind::None;
	0xD6, "add.ovf", OperandKind::None;
	0xD7, "add.ovf.un", OperandKind::None;
	0xD8, "mul.ovf", OperandKind::None;
	0xD9, "mul.ovf.un", OperandKind::None;
	0xDA, "sub.ovf", OperandKind::None;
	0xDB, "sub.ovf.un", OperandKind::None;
	0xDC, "endfinally", OperandKind::None;
	0xDD, "leave", OperandKind::BrTarget;
	0xDE, "leave.s", OperandKind::ShortBrTarget;
	0xDF, "stind.i", OperandKind::None;
	0xE0, "conv.u", OperandKind::None;
};

#[rustfmt::skip]
const TWO_BYTE_DESCRIPTORS: &[(u8, &str, OperandKind, InvokeKind)] = descriptors! {
	0x00, "arglist", OperandKind::None;
	0x01, "ceq", OperandKind::None;
	0x02, "cgt", OperandKind::None;
	0x03, "cgt.un", OperandKind::None;
	0x04, "clt", OperandKind::None;
	0x05, "clt.un", OperandKind::None;
	0x06, "ldftn", OperandKind::InlineMethod;
	0x07, "ldvirtftn", OperandKind::InlineMethod;
	0x09, "ldarg", OperandKind::InlineVar;
	0x0A, "ldarga", OperandKind::InlineVar;
	0x0B, "starg", OperandKind::InlineVar;
	0x0C, "ldloc", OperandKind::InlineVar;
	0x0D, "ldloca", OperandKind::InlineVar;
	0x0E, "stloc", OperandKind::InlineVar;
	0x0F, "localloc", OperandKind::None;
	0x11, "endfilter", OperandKind::None;
	0x12, "unaligned.", OperandKind::ShortInlineI;
	0x13, "volatile.", OperandKind::None;
	0x14, "tail.", OperandKind::None;
	0x15, "initobj", OperandKind::InlineType;
	0x16, "constrained.", OperandKind::InlineType;
	0x17, "cpblk", OperandKind::None;
	0x18, "initblk", OperandKind::None;
	0x19, "no.", OperandKind::ShortInlineI;
	0x1A, "rethrow", OperandKind::None;
	0x1C, "sizeof", OperandKind::InlineType;
	0x1D, "refanytype", OperandKind::None;
	0x1E, "readonly.", OperandKind::None;
};

fn build_table(
	descriptors: &'static [(u8, &'static str, OperandKind, InvokeKind)],
	len: usize,
	two_byte: bool,
) -> Vec<Option<OpcodeDescriptor>> {
	let mut table = vec![None; len];
	for &(byte, mnemonic, operand_kind, invoke_kind) in descriptors {
		let index = byte as usize;
		assert!(
			table[index].is_none(),
			"duplicate opcode index {index:#04x} (two_byte={two_byte})",
		);
		table[index] = Some(OpcodeDescriptor {
			mnemonic,
			encoding: Encoding { two_byte, byte },
			operand_kind,
			invoke_kind,
		});
	}
	table
}

static ONE_BYTE_TABLE: OnceLock<Vec<Option<OpcodeDescriptor>>> = OnceLock::new();
static TWO_BYTE_TABLE: OnceLock<Vec<Option<OpcodeDescriptor>>> = OnceLock::new();

fn one_byte_table() -> &'static [Option<OpcodeDescriptor>] {
	ONE_BYTE_TABLE.get_or_init(|| build_table(ONE_BYTE_DESCRIPTORS, ONE_BYTE_LEN, false))
}

fn two_byte_table() -> &'static [Option<OpcodeDescriptor>] {
	TWO_BYTE_TABLE.get_or_init(|| build_table(TWO_BYTE_DESCRIPTORS, TWO_BYTE_LEN, true))
}

/// Looks up the one-byte opcode at `byte`, if it names a known opcode.
pub fn lookup_one_byte(byte: u8) -> Option<&'static OpcodeDescriptor> {
	one_byte_table().get(byte as usize).and_then(|slot| slot.as_ref())
}

/// Looks up the two-byte, `0xFE`-prefixed opcode whose second byte is `byte`.
pub fn lookup_two_byte(byte: u8) -> Option<&'static OpcodeDescriptor> {
	two_byte_table().get(byte as usize).and_then(|slot| slot.as_ref())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn one_byte_table_round_trips_its_own_index() {
		for (byte, descriptor) in one_byte_table().iter().enumerate() {
			if let Some(descriptor) = descriptor {
				assert_eq!(descriptor.encoding.byte as usize, byte);
			}
		}
	}

	#[test]
	fn call_family_is_tagged_for_instance_prefix() {
		assert_eq!(lookup_one_byte(0x28).unwrap().invoke_kind, InvokeKind::Call);
		assert_eq!(lookup_one_byte(0x29).unwrap().invoke_kind, InvokeKind::Calli);
		assert_eq!(lookup_one_byte(0x6F).unwrap().invoke_kind, InvokeKind::CallVirt);
		assert_eq!(lookup_one_byte(0x73).unwrap().invoke_kind, InvokeKind::NewObj);
		assert_eq!(lookup_one_byte(0x58).unwrap().invoke_kind, InvokeKind::None);
	}

	#[test]
	fn calli_resolves_through_stand_alone_signature_not_method() {
		assert_eq!(lookup_one_byte(0x29).unwrap().operand_kind, OperandKind::InlineSig);
	}

	#[test]
	fn unused_one_byte_slots_are_absent() {
		assert!(lookup_one_byte(0x24).is_none());
		assert!(lookup_one_byte(0x77).is_none());
	}

	#[test]
	fn switch_is_a_known_two_byte_prefix_case() {
		assert_eq!(lookup_one_byte(0x45).unwrap().mnemonic, "switch");
		assert_eq!(lookup_two_byte(0x19).unwrap().mnemonic, "no.");
		assert_eq!(lookup_two_byte(0x12).unwrap().mnemonic, "unaligned.");
	}
}
