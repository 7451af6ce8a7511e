//! Address register pool
//!
//! Indirect array accesses need a register holding `$sp + offset` for the
//! duration of one load or store. `$t3`..`$t9` are handed out in rotation and
//! must be released once the access has been emitted, so two accesses live at
//! the same time never share a register.
use crate::error::{SemanticError, SemanticResult};

const REGISTERS: [&str; 7] = ["$t3", "$t4", "$t5", "$t6", "$t7", "$t8", "$t9"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRegister(usize);
impl AddressRegister {
	pub fn name(self) -> &'static str {
		REGISTERS[self.0]
	}
	/// Operand form used by `lw`/`sw`, e.g. `($t3)`
	pub fn indirect(self) -> String {
		format!("({})", self.name())
	}
}

#[derive(Debug, Default)]
pub struct AddressRegisters {
	in_use: [bool; REGISTERS.len()],
	next: usize,
}
impl AddressRegisters {
	pub fn acquire(&mut self) -> SemanticResult<AddressRegister> {
		let index = (0..REGISTERS.len())
			.map(|i| (self.next + i) % REGISTERS.len())
			.find(|&i| !self.in_use[i])
			.ok_or(SemanticError::RegisterPoolExhausted)?;
		self.in_use[index] = true;
		self.next = (index + 1) % REGISTERS.len();
		Ok(AddressRegister(index))
	}
	pub fn release(&mut self, register: AddressRegister) {
		self.in_use[register.0] = false;
	}
	pub fn in_use(&self) -> usize {
		self.in_use.iter().filter(|&&used| used).count()
	}
}
