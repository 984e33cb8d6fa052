//! Configuration loading and validation

pub mod defaults;
mod settings;

pub use settings::*;
