//! Semantic errors
//!
//! Every variant is fatal: the first error aborts the compilation and all
//! later semantic actions are refused with `SemanticError::Aborted`.
use thiserror::Error;

use crate::symbol_table::Type;

pub type SemanticResult<T> = Result<T, SemanticError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
	#[error("symbol not found: {name}")]
	UndeclaredSymbol { name: String },
	#[error("symbol already exists: {name} (at offset {loc})")]
	DuplicateDeclaration { name: String, loc: i32 },
	#[error("invalid type in variable declaration: {type_name}")]
	InvalidType { type_name: String },
	#[error("invalid array declaration: {spec}")]
	InvalidArrayDeclaration { spec: String },
	#[error("assignment types do not match: expected {expected}, found {found}")]
	TypeMismatch { expected: Type, found: Type },
	#[error("{context} operand type must be int or char, found {ty}")]
	InvalidOperandType { ty: Type, context: &'static str },
	#[error("leaving a scope with no active scope")]
	ScopeUnderflow,
	#[error("no active scope to hold {name}")]
	NoActiveScope { name: String },
	#[error("invalid identifier: {spec:?}")]
	InvalidIdentifier { spec: String },
	#[error("invalid array subscript: {spec}")]
	InvalidArrayIndex { spec: String },
	#[error("stack frame cannot hold {words} more word(s)")]
	FrameOverflow { words: u32 },
	#[error("all address registers are in use")]
	RegisterPoolExhausted,
	#[error("compilation already aborted")]
	Aborted,
}
