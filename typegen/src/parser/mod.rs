//! SQL schema introspection using sqlparser-rs

mod enum_collection;
mod matcher;
mod metadata;
mod schema_parser;

pub use enum_collection::*;
pub use matcher::*;
pub use metadata::*;
pub use schema_parser::*;
