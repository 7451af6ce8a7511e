//! Single pass semantic analysis and MIPS code generation for a small
//! imperative language.
//!
//! A parser drives a `codegen::Compilation` with one semantic action per
//! grammar rule; the pieces underneath are
//! - `symbol_table`, scoped declarations, temporaries and string labels,
//! - `frame`, the stack offset allocator,
//! - `registers`, the pool of indirect address registers,
//! - `emitter`, the output buffer with prolog, postlog and data segment.
pub mod codegen;
pub mod emitter;
pub mod error;
pub mod frame;
mod options;
pub mod registers;
pub mod symbol_table;

pub use codegen::{BinaryOperation, Compilation, ExpressionRecord, Location};
pub use error::{SemanticError, SemanticResult};
pub use options::Options;
pub use symbol_table::{Symbol, SymbolId, SymbolTable, Type};
