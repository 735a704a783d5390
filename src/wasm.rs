//! The Wasm module under construction: typed names, GC type definitions,
//! the instruction set, and the append-only module store.

pub mod instrs;
pub mod module;
pub mod names;
pub mod types;

pub use module::{Export, ExportKind, Expr, Function, Global, Import, ImportDesc, Local, Module};
