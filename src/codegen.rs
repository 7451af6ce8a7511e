//! Semantic actions and MIPS code generation
//!
//! The parser calls into a `Compilation` once per grammar rule, in source
//! order. Each action checks the rule, allocates frame slots and appends its
//! instructions right away; there is no tree and no second pass. Values are
//! passed between actions as `ExpressionRecord`s.
//!
//! Scratch registers: `$t0` holds results and computed offsets, `$t1`/`$t2`
//! hold operands, `$t3`/`$t4` are clobbered by `&&` once its operands are
//! loaded, and `$t3`..`$t9` carry indirect array addresses.
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
	emitter::{
		Emitter, SYSCALL_PRINT_CHAR, SYSCALL_PRINT_INT, SYSCALL_PRINT_STRING, SYSCALL_READ_CHAR,
		SYSCALL_READ_INT,
	},
	error::{SemanticError, SemanticResult},
	frame::{StackFrame, WORD_SIZE},
	options::Options,
	registers::{AddressRegister, AddressRegisters},
	symbol_table::{Symbol, SymbolId, SymbolTable, Type},
};

lazy_static! {
	static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_]\w*$").expect("valid pattern");
	static ref ARRAY_DECLARATION: Regex =
		Regex::new(r"^([A-Za-z_]\w*)\s*\[\s*([1-9][0-9]*)\s*\]$").expect("valid pattern");
	static ref ARRAY_ACCESS: Regex =
		Regex::new(r"^([A-Za-z_]\w*)\s*\[\s*([^\]\s]+)\s*\]$").expect("valid pattern");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
	/// The value lives at this `$sp` offset
	Stack(i32),
	/// The slot at this `$sp` offset holds the `$sp` offset of the value
	Indirect(i32),
	/// String literal in the data segment
	Label(String),
}

/// Type and location of an evaluated expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionRecord {
	ty: Type,
	location: Location,
}
impl ExpressionRecord {
	fn stack(ty: Type, loc: i32) -> Self {
		Self {
			ty,
			location: Location::Stack(loc),
		}
	}
	pub fn ty(&self) -> Type {
		self.ty
	}
	pub fn location(&self) -> &Location {
		&self.location
	}
	pub fn loc(&self) -> Option<i32> {
		match self.location {
			Location::Stack(loc) | Location::Indirect(loc) => Some(loc),
			Location::Label(_) => None,
		}
	}
	pub fn label(&self) -> Option<&str> {
		match &self.location {
			Location::Label(label) => Some(label),
			_ => None,
		}
	}
	pub fn is_indirect(&self) -> bool {
		matches!(self.location, Location::Indirect(_))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperation {
	Less,
	Greater,
	Add,
	Sub,
	Mul,
	Div,
	Equal,
	Or,
	And,
}
impl BinaryOperation {
	pub fn from_symbol(symbol: &str) -> Option<BinaryOperation> {
		match symbol {
			"<" => Some(Self::Less),
			">" => Some(Self::Greater),
			"+" => Some(Self::Add),
			"-" => Some(Self::Sub),
			"*" => Some(Self::Mul),
			"/" => Some(Self::Div),
			"==" => Some(Self::Equal),
			"||" => Some(Self::Or),
			"&&" => Some(Self::And),
			_ => None,
		}
	}
}

/// An operand string ready for `lw`/`sw`, plus the register backing it when
/// the access is indirect.
struct Address {
	operand: String,
	register: Option<AddressRegister>,
}

enum Subscript<'a> {
	Literal(i32),
	Ident(&'a str),
}

/// All state of one compilation unit. Nothing is shared between instances.
#[derive(Debug)]
pub struct Compilation {
	symbols: SymbolTable,
	frame: StackFrame,
	emitter: Emitter,
	registers: AddressRegisters,
	first_error: Option<SemanticError>,
}
impl Default for Compilation {
	fn default() -> Self {
		Self::new(Options::default())
	}
}
impl Compilation {
	pub fn new(options: Options) -> Self {
		Self {
			symbols: SymbolTable::new(options.retain_retired_scopes),
			frame: StackFrame::new(),
			emitter: Emitter::new(options.annotate),
			registers: AddressRegisters::default(),
			first_error: None,
		}
	}

	/// Runs one semantic action. The first failure is recorded and every
	/// action after it is refused without emitting anything.
	fn action<T>(
		&mut self,
		f: impl FnOnce(&mut Self) -> SemanticResult<T>,
	) -> SemanticResult<T> {
		if self.first_error.is_some() {
			return Err(SemanticError::Aborted);
		}
		f(self).map_err(|err| {
			log::error!("compilation aborted: {err}");
			self.first_error = Some(err.clone());
			err
		})
	}

	pub fn enter_scope(&mut self) -> SemanticResult<()> {
		self.action(|this| {
			this.symbols.enter_scope();
			Ok(())
		})
	}
	pub fn leave_scope(&mut self) -> SemanticResult<()> {
		self.action(|this| this.symbols.leave_scope())
	}

	/// `name_spec` is either a plain name or `name[N]` with a positive literal `N`.
	pub fn declare_variable(&mut self, type_name: &str, name_spec: &str) -> SemanticResult<SymbolId> {
		self.action(|this| {
			let ty = Type::from_name(type_name).ok_or_else(|| SemanticError::InvalidType {
				type_name: type_name.to_string(),
			})?;
			let (name, size) = parse_declaration(name_spec)?;
			if let Some(previous) = this.symbols.find_local(name) {
				return Err(SemanticError::DuplicateDeclaration {
					name: name.to_string(),
					loc: this.symbols[previous].loc,
				});
			}
			let loc = this.frame.allocate(size)?;
			log::debug!("declared {ty} {name} ({size} word(s)) at {loc}");
			this.emitter.comment(format!("{ty} {name_spec} at {loc}"));
			this.symbols.insert(Symbol {
				name: name.to_string(),
				ty,
				loc,
				size,
			})
		})
	}

	/// Resolves `x`, `a[3]` or `a[i]`. A literal subscript is folded into the
	/// offset; an identifier subscript emits the offset computation into a
	/// temporary and yields an indirect record. String labels are not
	/// variables and never resolve.
	pub fn resolve_identifier(&mut self, name_spec: &str) -> SemanticResult<ExpressionRecord> {
		self.action(|this| {
			let (name, subscript) = parse_access(name_spec)?;
			let symbol = this.symbols.lookup(name)?;
			let (ty, base) = (this.symbols[symbol].ty, this.symbols[symbol].loc);
			if !ty.is_scalar() {
				return Err(SemanticError::UndeclaredSymbol {
					name: name.to_string(),
				});
			}
			match subscript {
				None => Ok(ExpressionRecord::stack(ty, base)),
				Some(Subscript::Literal(index)) => index
					.checked_mul(WORD_SIZE)
					.and_then(|bytes| base.checked_sub(bytes))
					.map(|loc| ExpressionRecord::stack(ty, loc))
					.ok_or_else(|| SemanticError::InvalidArrayIndex {
						spec: name_spec.to_string(),
					}),
				Some(Subscript::Ident(index)) => {
					let index = this.symbols.lookup(index)?;
					let index_loc = this.symbols[index].loc;
					let slot = this.new_temp(Type::Int)?;
					this.emitter.comment(format!("&{name_spec} -> {slot}"));
					this.emitter.emit(format!("lw $t0, {index_loc}($sp)"));
					// scale by the word size
					this.emitter.emit("add $t0, $t0, $t0");
					this.emitter.emit("add $t0, $t0, $t0");
					this.emitter.emit(format!("li $t1, {base}"));
					this.emitter.emit("sub $t0, $t1, $t0");
					this.emitter.emit(format!("sw $t0, {slot}($sp)"));
					Ok(ExpressionRecord {
						ty,
						location: Location::Indirect(slot),
					})
				}
			}
		})
	}

	pub fn int_literal(&mut self, value: i32) -> SemanticResult<ExpressionRecord> {
		self.action(|this| this.scalar_literal(Type::Int, value))
	}
	pub fn char_literal(&mut self, value: char) -> SemanticResult<ExpressionRecord> {
		self.action(|this| this.scalar_literal(Type::Char, value as i32))
	}
	/// `text` is the literal's content without quotes.
	pub fn string_literal(&mut self, text: &str) -> SemanticResult<ExpressionRecord> {
		self.action(|this| {
			let id = this.symbols.new_string_label()?;
			let label = this.symbols[id].name.clone();
			this.emitter.add_static_string(label.clone(), text);
			Ok(ExpressionRecord {
				ty: Type::Str,
				location: Location::Label(label),
			})
		})
	}

	pub fn evaluate_binary(
		&mut self,
		left: &ExpressionRecord,
		right: &ExpressionRecord,
		operation: BinaryOperation,
	) -> SemanticResult<ExpressionRecord> {
		enum Sequence {
			ThreeRegister(&'static str),
			// result lands in LO
			WideResult(&'static str),
			// `and` is bitwise, operands are normalised to 0/1 first
			LogicalAnd,
		}
		self.action(|this| {
			for record in [left, right] {
				if !record.ty.is_scalar() {
					return Err(SemanticError::InvalidOperandType {
						ty: record.ty,
						context: "arithmetic",
					});
				}
			}
			let result = this.new_temp(Type::Int)?;
			this.emitter.comment(format!("{operation:?} -> {result}"));
			let lhs = this.address(left, "arithmetic")?;
			let rhs = this.address(right, "arithmetic")?;
			this.emitter.emit(format!("lw $t1, {}", lhs.operand));
			this.emitter.emit(format!("lw $t2, {}", rhs.operand));
			this.release(lhs);
			this.release(rhs);
			let sequence = match operation {
				BinaryOperation::Less => Sequence::ThreeRegister("slt"),
				BinaryOperation::Greater => Sequence::ThreeRegister("sgt"),
				BinaryOperation::Add => Sequence::ThreeRegister("add"),
				BinaryOperation::Sub => Sequence::ThreeRegister("sub"),
				BinaryOperation::Equal => Sequence::ThreeRegister("seq"),
				BinaryOperation::Or => Sequence::ThreeRegister("or"),
				BinaryOperation::Mul => Sequence::WideResult("mult"),
				BinaryOperation::Div => Sequence::WideResult("div"),
				BinaryOperation::And => Sequence::LogicalAnd,
			};
			match sequence {
				Sequence::ThreeRegister(op_code) => {
					this.emitter.emit(format!("{op_code} $t0, $t1, $t2"));
				}
				Sequence::WideResult(op_code) => {
					this.emitter.emit(format!("{op_code} $t1, $t2"));
					this.emitter.emit("mflo $t0");
				}
				Sequence::LogicalAnd => {
					this.emitter.emit("sne $t3, $t1, $zero");
					this.emitter.emit("sne $t4, $t2, $zero");
					this.emitter.emit("and $t0, $t3, $t4");
				}
			}
			this.emitter.emit(format!("sw $t0, {result}($sp)"));
			Ok(ExpressionRecord::stack(Type::Int, result))
		})
	}

	/// A char target accepts an int value; every other pairing must match.
	pub fn assign(&mut self, target: &ExpressionRecord, value: &ExpressionRecord) -> SemanticResult<()> {
		self.action(|this| {
			let coerced = match (target.ty, value.ty) {
				(Type::Char, Type::Int) => Type::Char,
				(_, found) => found,
			};
			if coerced != target.ty {
				return Err(SemanticError::TypeMismatch {
					expected: target.ty,
					found: value.ty,
				});
			}
			let dest = this.address(target, "assignment")?;
			let src = this.address(value, "assignment")?;
			this.emitter.emit(format!("lw $t1, {}", src.operand));
			this.emitter.emit(format!("sw $t1, {}", dest.operand));
			this.release(src);
			this.release(dest);
			Ok(())
		})
	}

	/// Branches to a fresh label when `condition` is zero and returns that
	/// label for the caller to place later.
	pub fn branch_if_zero(&mut self, condition: &ExpressionRecord) -> SemanticResult<String> {
		self.action(|this| {
			let label = this.symbols.new_label();
			let address = this.address(condition, "condition")?;
			this.emitter.emit(format!("lw $t0, {}", address.operand));
			this.release(address);
			this.emitter.emit(format!("beqz $t0, {label}"));
			Ok(label)
		})
	}
	/// Jumps over what follows to a fresh label, then places `pending`.
	/// Returns the fresh label, e.g. the end of an if/else.
	pub fn branch_then_label(&mut self, pending: &str) -> SemanticResult<String> {
		self.action(|this| {
			let label = this.symbols.new_label();
			this.emitter.emit(format!("b {label}"));
			this.emitter.emit(format!("{pending}:"));
			Ok(label)
		})
	}
	/// `b branch_to` followed by `label:`, closing a while loop.
	pub fn branch_and_label(&mut self, branch_to: &str, label: &str) -> SemanticResult<()> {
		self.action(|this| {
			this.emitter.emit(format!("b {branch_to}"));
			this.emitter.emit(format!("{label}:"));
			Ok(())
		})
	}
	pub fn define_label(&mut self, name: Option<&str>) -> SemanticResult<String> {
		self.action(|this| {
			let label = match name {
				Some(name) => name.to_string(),
				None => this.symbols.new_label(),
			};
			this.emitter.emit(format!("{label}:"));
			Ok(label)
		})
	}

	pub fn emit_read(&mut self, target: &ExpressionRecord) -> SemanticResult<()> {
		self.action(|this| {
			let syscall = match target.ty {
				Type::Int => SYSCALL_READ_INT,
				Type::Char => SYSCALL_READ_CHAR,
				Type::Str => {
					return Err(SemanticError::InvalidOperandType {
						ty: Type::Str,
						context: "input",
					})
				}
			};
			let dest = this.address(target, "input")?;
			this.emitter.emit(format!("li $v0, {syscall}"));
			this.emitter.emit("syscall");
			this.emitter.emit(format!("sw $v0, {}", dest.operand));
			this.release(dest);
			Ok(())
		})
	}
	pub fn emit_write(&mut self, value: &ExpressionRecord) -> SemanticResult<()> {
		self.action(|this| {
			if let Location::Label(label) = &value.location {
				this.emitter.emit(format!("la $a0, {label}"));
				this.emitter.emit(format!("li $v0, {SYSCALL_PRINT_STRING}"));
			} else {
				let src = this.address(value, "output")?;
				this.emitter.emit(format!("lw $a0, {}", src.operand));
				this.release(src);
				let syscall = match value.ty {
					Type::Int => SYSCALL_PRINT_INT,
					Type::Char => SYSCALL_PRINT_CHAR,
					Type::Str => {
						return Err(SemanticError::InvalidOperandType {
							ty: Type::Str,
							context: "output",
						})
					}
				};
				this.emitter.emit(format!("li $v0, {syscall}"));
			}
			this.emitter.emit("syscall");
			Ok(())
		})
	}
	pub fn emit_newline(&mut self) -> SemanticResult<()> {
		self.action(|this| {
			this.emitter.emit("li $a0, '\\n'");
			this.emitter.emit(format!("li $v0, {SYSCALL_PRINT_CHAR}"));
			this.emitter.emit("syscall");
			Ok(())
		})
	}

	pub fn symbols(&self) -> &SymbolTable {
		&self.symbols
	}
	pub fn frame(&self) -> &StackFrame {
		&self.frame
	}
	pub fn body(&self) -> &[String] {
		self.emitter.body()
	}
	pub fn is_aborted(&self) -> bool {
		self.first_error.is_some()
	}
	pub fn first_error(&self) -> Option<&SemanticError> {
		self.first_error.as_ref()
	}
	/// Renders the complete assembly file. After an abort this still holds
	/// everything emitted up to the failing action.
	pub fn finish(self) -> String {
		self.emitter.render()
	}

	fn new_temp(&mut self, ty: Type) -> SemanticResult<i32> {
		let loc = self.frame.allocate(1)?;
		self.symbols.new_temp(ty, loc)?;
		Ok(loc)
	}
	fn scalar_literal(&mut self, ty: Type, value: i32) -> SemanticResult<ExpressionRecord> {
		let loc = self.new_temp(ty)?;
		self.emitter.emit(format!("li $t0, {value}"));
		self.emitter.emit(format!("sw $t0, {loc}($sp)"));
		Ok(ExpressionRecord::stack(ty, loc))
	}
	/// Clobbers `$t0`/`$t1` for indirect records, so every operand of an
	/// instruction must be resolved before any of them is loaded.
	fn address(&mut self, record: &ExpressionRecord, context: &'static str) -> SemanticResult<Address> {
		if !record.ty.is_scalar() {
			return Err(SemanticError::InvalidOperandType {
				ty: record.ty,
				context,
			});
		}
		match record.location {
			Location::Stack(loc) => Ok(Address {
				operand: format!("{loc}($sp)"),
				register: None,
			}),
			Location::Indirect(loc) => {
				let register = self.registers.acquire()?;
				self.emitter.emit("move $t0, $sp");
				self.emitter.emit(format!("lw $t1, {loc}($sp)"));
				self.emitter.emit(format!("add {}, $t0, $t1", register.name()));
				Ok(Address {
					operand: register.indirect(),
					register: Some(register),
				})
			}
			Location::Label(_) => Err(SemanticError::InvalidOperandType {
				ty: record.ty,
				context,
			}),
		}
	}
	fn release(&mut self, address: Address) {
		if let Some(register) = address.register {
			self.registers.release(register);
		}
	}
}

fn parse_declaration(name_spec: &str) -> SemanticResult<(&str, u32)> {
	let name_spec = name_spec.trim();
	if !name_spec.contains('[') {
		if !IDENTIFIER.is_match(name_spec) {
			return Err(SemanticError::InvalidIdentifier {
				spec: name_spec.to_string(),
			});
		}
		return Ok((name_spec, 1));
	}
	ARRAY_DECLARATION
		.captures(name_spec)
		.and_then(|captures| {
			let name = captures.get(1)?.as_str();
			let size: u32 = captures.get(2)?.as_str().parse().ok()?;
			// the whole array must be addressable with an i32 byte offset
			i32::try_from(size).ok()?.checked_mul(WORD_SIZE)?;
			Some((name, size))
		})
		.ok_or_else(|| SemanticError::InvalidArrayDeclaration {
			spec: name_spec.to_string(),
		})
}

/// Anything that is not a well formed `name[subscript]` is looked up as is
/// and reported undeclared. A subscript starting with a digit or `-` is a
/// literal and must be a non-negative `i32`.
fn parse_access(name_spec: &str) -> SemanticResult<(&str, Option<Subscript<'_>>)> {
	let name_spec = name_spec.trim();
	let Some(captures) = ARRAY_ACCESS.captures(name_spec) else {
		return Ok((name_spec, None));
	};
	let (Some(name), Some(index)) = (captures.get(1), captures.get(2)) else {
		return Ok((name_spec, None));
	};
	let index = index.as_str();
	if !index.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
		return Ok((name.as_str(), Some(Subscript::Ident(index))));
	}
	match index.parse::<i32>() {
		Ok(value) if value >= 0 => Ok((name.as_str(), Some(Subscript::Literal(value)))),
		_ => Err(SemanticError::InvalidArrayIndex {
			spec: name_spec.to_string(),
		}),
	}
}
