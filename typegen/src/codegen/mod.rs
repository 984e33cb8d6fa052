//! Code generation module: AST, symbol table, transformer and serializer

mod adapter;
mod ast;
mod code_generator;
mod collector;
mod diff_checker;
mod naming;
mod serializer;
mod symbols;
mod transformer;

pub use adapter::*;
pub use ast::*;
pub use code_generator::*;
pub use collector::*;
pub use diff_checker::*;
pub use naming::*;
pub use serializer::*;
pub use symbols::*;
pub use transformer::*;
