//! The indenting output writer (C12): a line buffer with an indentation
//! stack, shared by every emitter that needs to nest text (method bodies,
//! exception regions, property/event blocks). Resilient to mixed raw/line
//! appends — `append` and `append_line` can be interleaved freely.

/// `indent_width` is a constructor parameter rather than a hard-coded
/// constant (§A.3 of the expanded spec) so a caller embedding this crate in a
/// different pretty-printer can retarget the two widths §6 names: seven
/// spaces at the type-header level, four spaces elsewhere.
#[derive(Debug)]
pub struct IndentingWriter {
	buffer: String,
	prefix: String,
	indent_width: usize,
}

impl IndentingWriter {
	pub fn new(indent_width: usize) -> Self {
		Self { buffer: String::new(), prefix: String::new(), indent_width }
	}

	pub fn indent(&mut self) {
		self.prefix.push_str(&" ".repeat(self.indent_width));
	}

	pub fn unindent(&mut self) {
		let new_len = self.prefix.len().saturating_sub(self.indent_width);
		self.prefix.truncate(new_len);
	}

	/// Writes `prefix + s + '\n'`.
	pub fn append_line(&mut self, s: &str) {
		self.buffer.push_str(&self.prefix);
		self.buffer.push_str(s);
		self.buffer.push('\n');
	}

	/// Writes `s` with no prefix and no trailing newline.
	pub fn append(&mut self, s: &str) {
		self.buffer.push_str(s);
	}

	/// Writes the current indentation prefix with no trailing newline, for
	/// callers building up a line in pieces via `append`.
	pub fn append_indent(&mut self) {
		self.buffer.push_str(&self.prefix);
	}

	/// Consumes the writer, trimming trailing CR/LF from the buffer.
	pub fn finish(self) -> String {
		self.buffer.trim_end_matches(['\r', '\n']).to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn indent_and_unindent_adjust_the_prefix() {
		let mut writer = IndentingWriter::new(4);
		writer.append_line("{");
		writer.indent();
		writer.append_line("nested");
		writer.unindent();
		writer.append_line("}");
		assert_eq!(writer.finish(), "{\n    nested\n}");
	}

	#[test]
	fn unindent_past_zero_saturates_instead_of_panicking() {
		let mut writer = IndentingWriter::new(4);
		writer.unindent();
		writer.append_line("x");
		assert_eq!(writer.finish(), "x");
	}

	#[test]
	fn trailing_newline_is_trimmed_on_finish() {
		let mut writer = IndentingWriter::new(4);
		writer.append_line("a");
		writer.append_line("b");
		assert_eq!(writer.finish(), "a\nb");
	}

	#[test]
	fn append_and_append_indent_compose_a_single_line() {
		let mut writer = IndentingWriter::new(4);
		writer.indent();
		writer.append_indent();
		writer.append("partial");
		writer.append(" line");
		writer.buffer.push('\n');
		assert_eq!(writer.finish(), "    partial line");
	}
}
