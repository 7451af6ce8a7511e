//! Scoped symbol table
//!
//! Active scopes are kept innermost last so lookups can walk outward without
//! popping anything. A left scope is retired rather than searched again.
//! Symbols themselves live in one arena for the whole compilation and are
//! handed out as `SymbolId`s, so a retired scope costs only its name map.
use std::{collections::HashMap, fmt, ops::Index};

use crate::error::{SemanticError, SemanticResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
	Int,
	Char,
	Str,
}
impl Type {
	/// Declarable types only, strings never name a variable.
	pub fn from_name(name: &str) -> Option<Type> {
		match name {
			"int" => Some(Type::Int),
			"char" => Some(Type::Char),
			_ => None,
		}
	}
	pub fn is_scalar(self) -> bool {
		matches!(self, Type::Int | Type::Char)
	}
}
impl fmt::Display for Type {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Type::Int => "int",
			Type::Char => "char",
			Type::Str => "string",
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
	/// Variable name, `t#<n>` for temporaries or `str_<n>` for string labels
	pub name: String,
	pub ty: Type,
	/// `$sp` relative byte offset, zero or negative
	pub loc: i32,
	/// Size in words, 0 for string labels which take no frame space
	pub size: u32,
}

/// Handle into the symbol arena, stable for the whole compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

pub type Scope = HashMap<String, SymbolId>;

#[derive(Debug)]
pub struct SymbolTable {
	symbols: Vec<Symbol>,
	active: Vec<Scope>,
	retired: Vec<Scope>,
	retain_retired: bool,
	counter: usize,
}
impl Default for SymbolTable {
	fn default() -> Self {
		Self::new(true)
	}
}
impl SymbolTable {
	pub fn new(retain_retired: bool) -> Self {
		Self {
			symbols: Vec::new(),
			active: Vec::new(),
			retired: Vec::new(),
			retain_retired,
			counter: 0,
		}
	}
	pub fn enter_scope(&mut self) {
		self.active.push(Scope::new());
		log::trace!("entered scope {}", self.active.len());
	}
	pub fn leave_scope(&mut self) -> SemanticResult<()> {
		let scope = self.active.pop().ok_or(SemanticError::ScopeUnderflow)?;
		log::trace!("left scope {} ({} symbols)", self.active.len() + 1, scope.len());
		if self.retain_retired {
			self.retired.push(scope);
		}
		Ok(())
	}
	/// Adds `symbol` to the innermost scope. Uniqueness is the caller's job,
	/// a repeated name simply rebinds to the newer symbol.
	pub fn insert(&mut self, symbol: Symbol) -> SemanticResult<SymbolId> {
		let Some(scope) = self.active.last_mut() else {
			return Err(SemanticError::NoActiveScope { name: symbol.name });
		};
		let id = SymbolId(self.symbols.len());
		scope.insert(symbol.name.clone(), id);
		self.symbols.push(symbol);
		Ok(id)
	}
	pub fn find_local(&self, name: &str) -> Option<SymbolId> {
		self.active.last()?.get(name).copied()
	}
	pub fn find_any(&self, name: &str) -> Option<SymbolId> {
		self.active
			.iter()
			.rev()
			.find_map(|scope| scope.get(name).copied())
	}
	pub fn lookup(&self, name: &str) -> SemanticResult<SymbolId> {
		self.find_local(name)
			.or_else(|| self.find_any(name))
			.ok_or_else(|| SemanticError::UndeclaredSymbol { name: name.to_string() })
	}
	pub fn get(&self, id: SymbolId) -> &Symbol {
		&self.symbols[id.0]
	}
	pub fn new_temp(&mut self, ty: Type, loc: i32) -> SemanticResult<SymbolId> {
		let name = format!("t#{}", self.next_count());
		log::debug!("temporary {name}: {ty} at {loc}");
		self.insert(Symbol {
			name,
			ty,
			loc,
			size: 1,
		})
	}
	pub fn new_string_label(&mut self) -> SemanticResult<SymbolId> {
		let name = format!("str_{}", self.next_count());
		log::debug!("string label {name}");
		self.insert(Symbol {
			name,
			ty: Type::Str,
			loc: 0,
			size: 0,
		})
	}
	/// Branch label drawn from the same counter as temporaries.
	pub fn new_label(&mut self) -> String {
		format!("label{}", self.next_count())
	}
	fn next_count(&mut self) -> usize {
		self.counter += 1;
		self.counter - 1
	}
	pub fn depth(&self) -> usize {
		self.active.len()
	}
	pub fn retired_scopes(&self) -> &[Scope] {
		&self.retired
	}
	/// Number of symbols created so far, retired ones included
	pub fn len(&self) -> usize {
		self.symbols.len()
	}
	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}
}
impl Index<SymbolId> for SymbolTable {
	type Output = Symbol;
	fn index(&self, id: SymbolId) -> &Symbol {
		self.get(id)
	}
}
/// Lists the names in every active scope, outermost first.
impl fmt::Display for SymbolTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, scope) in self.active.iter().enumerate() {
			let mut names: Vec<&str> = scope.keys().map(String::as_str).collect();
			names.sort_unstable();
			writeln!(f, "scope {}: {}", i + 1, names.join(" "))?;
		}
		Ok(())
	}
}
