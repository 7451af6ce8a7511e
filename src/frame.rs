//! Stack frame allocator
//!
//! The whole program shares one flat frame. Offsets are `$sp` relative, start
//! at 0 and only ever move down; a slot is never handed out twice, even after
//! the scope that owned it is gone.
use crate::error::{SemanticError, SemanticResult};

/// Bytes per stack word
pub const WORD_SIZE: i32 = 4;

#[derive(Debug, Default)]
pub struct StackFrame {
	offset: i32,
}
impl StackFrame {
	pub fn new() -> Self {
		Self::default()
	}
	/// Returns the current offset and reserves `words` words below it. Fails
	/// rather than wrapping once the frame no longer fits an `i32` offset.
	pub fn allocate(&mut self, words: u32) -> SemanticResult<i32> {
		let loc = self.offset;
		self.offset = i32::try_from(words)
			.ok()
			.and_then(|words| words.checked_mul(WORD_SIZE))
			.and_then(|bytes| loc.checked_sub(bytes))
			.ok_or(SemanticError::FrameOverflow { words })?;
		log::trace!("allocated {words} word(s) at {loc}, cursor now {}", self.offset);
		Ok(loc)
	}
	pub fn current(&self) -> i32 {
		self.offset
	}
	pub fn size_bytes(&self) -> usize {
		self.offset.unsigned_abs() as usize
	}
}
