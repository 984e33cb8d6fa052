//! Default configuration values - single source of truth

use crate::codegen::DialectKind;

/// Default SQL dialect of the schema file
pub const DIALECT: DialectKind = DialectKind::Postgres;

/// Default path of the generated declaration file
pub const OUT_FILE: &str = "./db.d.ts";

/// Whether to print the output instead of writing it
pub const PRINT: bool = false;

/// Whether to compare the output against the existing file instead of writing it
pub const VERIFY: bool = false;

/// Whether to camelCase table and column identifiers
pub const CAMEL_CASE: bool = false;

/// Whether to include partition tables
pub const PARTITIONS: bool = false;

/// Whether to singularize table interface names
pub const SINGULARIZE: bool = false;

/// Whether to emit `import type` rather than `import`
pub const TYPE_ONLY_IMPORTS: bool = true;

/// Prefix of environment variables overriding the configuration
pub const ENV_PREFIX: &str = "TYPEGEN";

/// Base name of the configuration file looked up when none is given
pub const CONFIG_FILE: &str = "typegen";
