use std::fmt::{Debug, Display, Formatter};

/// Errors surfaced while decoding and formatting a method body or type.
///
/// Mirrors the four error kinds the core is specified to raise: a missing body,
/// an unreadable body, a malformed byte stream, and a token the metadata
/// provider could not resolve. Decoding errors abort the current method and
/// propagate to the caller; there is no partial recovery.
#[derive(Debug)]
pub enum DisassemblerError {
	/// The method handle carries no IL body (abstract, extern, or otherwise
	/// implemented without IL).
	MethodHasNoBody,
	/// The method has a body, but its raw bytes could not be obtained.
	CannotReadIL,
	/// The IL byte stream is malformed: a bounds violation, an unknown opcode,
	/// or an operand kind this decoder does not support.
	MalformedIL(IlError),
	/// The metadata provider could not resolve an embedded token.
	TokenResolutionFailed(TokenResolutionError),
}

impl Display for DisassemblerError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::MethodHasNoBody => write!(f, "method has no IL body"),
			Self::CannotReadIL => write!(f, "method body bytes could not be read"),
			Self::MalformedIL(err) => write!(f, "malformed IL: {err}"),
			Self::TokenResolutionFailed(err) => write!(f, "token resolution failed: {err}"),
		}
	}
}

impl std::error::Error for DisassemblerError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::TokenResolutionFailed(err) => Some(err),
			_ => None,
		}
	}
}

impl From<IlError> for DisassemblerError {
	fn from(value: IlError) -> Self {
		Self::MalformedIL(value)
	}
}

impl From<TokenResolutionError> for DisassemblerError {
	fn from(value: TokenResolutionError) -> Self {
		Self::TokenResolutionFailed(value)
	}
}

/// A bounds violation or unsupported encoding encountered while decoding a raw
/// IL byte stream (C1/C7).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IlError {
	/// A read would have consumed bytes past the end of the method body.
	UnexpectedEof { position: usize },
	/// The byte at `position` does not name a known one- or two-byte opcode.
	UnknownOpcode { position: usize, byte: u8, two_byte: bool },
	/// The opcode at `position` declares an operand kind this decoder does not
	/// implement.
	UnsupportedOperand { position: usize },
}

impl Display for IlError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::UnexpectedEof { position } => {
				write!(f, "unexpected end of IL stream at offset {position:#x}")
			}
			Self::UnknownOpcode { position, byte, two_byte } => write!(
				f,
				"unknown {} opcode {byte:#04x} at offset {position:#x}",
				if *two_byte { "two-byte" } else { "one-byte" },
			),
			Self::UnsupportedOperand { position } => {
				write!(f, "unsupported operand kind for opcode at offset {position:#x}")
			}
		}
	}
}

impl std::error::Error for IlError {}

/// Raised by a [`crate::metadata::MetadataProvider`] implementation when it
/// cannot resolve a token, string, or signature embedded in a method body.
///
/// This is a thin, owned wrapper: the core never inspects the contents, it only
/// threads the message through to its own caller (§7: "surfaced transparently
/// from the provider").
#[derive(Debug, Clone)]
pub struct TokenResolutionError {
	pub token: u32,
	pub message: String,
}

impl TokenResolutionError {
	pub fn new(token: u32, message: impl Into<String>) -> Self {
		Self { token, message: message.into() }
	}
}

impl Display for TokenResolutionError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "token {:#010x}: {}", self.token, self.message)
	}
}

impl std::error::Error for TokenResolutionError {}
