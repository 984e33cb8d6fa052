//! typegen: Generate TypeScript table and enum declarations from SQL schema DDL
//!
//! This crate provides both a CLI tool and a library. It parses SQL DDL using
//! `sqlparser-rs` and generates a declaration file for a typed query builder:
//!
//! - One interface per table, with nullable, array and generated columns
//! - Shared helper types (`Generated<T>`, `Json`, `Timestamp`, ...) emitted
//!   only when referenced
//! - Enum types as string literal unions or runtime enums
//! - A `DB` interface mapping table names to their interfaces
//!
//! # Usage in build.rs (Recommended)
//!
//! Configure in your `Cargo.toml`:
//!
//! ```toml
//! [package.metadata.typegen]
//! schema_file = "schema.sql"
//! dialect = "postgres"
//! out_file = "web/src/db.d.ts"
//! camel_case = true
//! ```
//!
//! Then use a minimal `build.rs`:
//!
//! ```rust,ignore
//! fn main() {
//!     typegen::generate_from_cargo_metadata()
//!         .expect("Failed to generate types");
//! }
//! ```
//!
//! # Alternative: Programmatic Configuration
//!
//! ```rust,ignore
//! use typegen::codegen::DialectKind;
//!
//! fn main() {
//!     typegen::CodegenBuilder::new("schema.sql")
//!         .dialect(DialectKind::Sqlite)
//!         .out_file("web/src/db.d.ts")
//!         .camel_case(true)
//!         .generate()
//!         .expect("Failed to generate types");
//!
//!     println!("cargo:rerun-if-changed=schema.sql");
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! typegen --schema schema.sql --dialect postgres --out-file db.d.ts
//! typegen --schema schema.sql --verify   # fail if db.d.ts is stale
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod parser;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use codegen::{diff, CodeGenerator, DialectKind, RuntimeEnumStyle};
use parser::{DatabaseMetadata, DdlIntrospector, Introspector, TableMatcher};

pub use config::CodegenConfig;
pub use error::{CodegenError, Result};

/// Main entry point for code generation.
///
/// Prints, verifies or writes the output depending on the configuration and
/// returns the generated text.
pub fn generate(config: &CodegenConfig) -> Result<String> {
    let metadata = introspect(config)?;
    let metadata = filter_tables(
        metadata,
        config.include_pattern.as_deref(),
        config.exclude_pattern.as_deref(),
        config.partitions,
    )?;

    let output = CodeGenerator::from_config(config)?.generate(&metadata);

    if config.print {
        print!("{}", output);
    } else if config.verify {
        verify_output(&config.out_file, &output)?;
    } else {
        write_output(&config.out_file, &output)?;
    }

    info!("Code generation complete");
    Ok(output)
}

/// Read the configured schema file into database metadata
pub fn introspect(config: &CodegenConfig) -> Result<DatabaseMetadata> {
    info!("Parsing schema: {:?} ({})", config.schema_file, config.dialect);
    DdlIntrospector::from_file(&config.schema_file, config.dialect)?
        .with_default_schema(config.introspection_schema())
        .introspect()
}

/// Filter tables based on include/exclude patterns and partition handling
pub fn filter_tables(
    mut metadata: DatabaseMetadata,
    include: Option<&str>,
    exclude: Option<&str>,
    partitions: bool,
) -> Result<DatabaseMetadata> {
    let include = include.map(TableMatcher::new).transpose()?;
    let exclude = exclude.map(TableMatcher::new).transpose()?;

    let before = metadata.tables.len();
    metadata.tables.retain(|t| {
        let schema = t.schema.as_deref();
        let included = include
            .as_ref()
            .map_or(true, |m| m.is_match(schema, &t.name));
        let excluded = exclude
            .as_ref()
            .is_some_and(|m| m.is_match(schema, &t.name));
        included && !excluded && (partitions || !t.is_partition)
    });
    debug!(
        "After filtering: {} of {} tables (partitions={})",
        metadata.tables.len(),
        before,
        partitions
    );

    Ok(metadata)
}

/// Compare `output` against the file at `path`; a missing file counts as empty
pub fn verify_output(path: &Path, output: &str) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(existing) => existing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    match diff(&existing, output) {
        None => {
            info!("Generated types are up-to-date: {}", path.display());
            Ok(())
        }
        Some(diff) => Err(CodegenError::VerifyMismatch {
            path: path.to_path_buf(),
            diff,
        }),
    }
}

/// Write `output` to `path`, creating parent directories
pub fn write_output(path: &Path, output: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, output)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Builder pattern for easy configuration in build.rs
pub struct CodegenBuilder {
    config: CodegenConfig,
}

impl CodegenBuilder {
    /// Create a new builder with the given schema file
    pub fn new(schema_file: impl AsRef<Path>) -> Self {
        Self {
            config: CodegenConfig::default_with_schema(schema_file.as_ref().to_path_buf()),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: CodegenConfig) -> Self {
        Self { config }
    }

    pub fn dialect(mut self, dialect: DialectKind) -> Self {
        self.config.dialect = dialect;
        self
    }

    /// Set the path of the generated file
    pub fn out_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config.out_file = path.as_ref().to_path_buf();
        self
    }

    pub fn camel_case(mut self, enabled: bool) -> Self {
        self.config.camel_case = enabled;
        self
    }

    /// Add a schema whose tables are referenced without qualification
    pub fn default_schema(mut self, schema: &str) -> Self {
        self.config.default_schemas.push(schema.to_string());
        self
    }

    pub fn include_pattern(mut self, pattern: &str) -> Self {
        self.config.include_pattern = Some(pattern.to_string());
        self
    }

    pub fn exclude_pattern(mut self, pattern: &str) -> Self {
        self.config.exclude_pattern = Some(pattern.to_string());
        self
    }

    /// Keep partition tables
    pub fn partitions(mut self, enabled: bool) -> Self {
        self.config.partitions = enabled;
        self
    }

    pub fn runtime_enums(mut self, style: RuntimeEnumStyle) -> Self {
        self.config.runtime_enums = Some(style);
        self
    }

    pub fn singularize(mut self, enabled: bool) -> Self {
        self.config.singularize = enabled;
        self
    }

    /// Add a singularization rule (regex pattern -> replacement)
    pub fn singular_rule(mut self, pattern: &str, replacement: &str) -> Self {
        self.config
            .singular_rules
            .insert(pattern.to_string(), replacement.to_string());
        self
    }

    pub fn type_only_imports(mut self, enabled: bool) -> Self {
        self.config.type_only_imports = enabled;
        self
    }

    /// Override the type of `table.column` (or `schema.table.column`)
    pub fn override_column(mut self, column: &str, code: &str) -> Self {
        self.config
            .overrides
            .columns
            .insert(column.to_string(), code.to_string());
        self
    }

    /// Import `name` from `spec` (`module` or `module#ExportedName`)
    pub fn custom_import(mut self, name: &str, spec: &str) -> Self {
        self.config
            .custom_imports
            .insert(name.to_string(), spec.to_string());
        self
    }

    /// Map a data type to custom type text
    pub fn type_mapping(mut self, data_type: &str, code: &str) -> Self {
        self.config
            .type_mapping
            .insert(data_type.to_string(), code.to_string());
        self
    }

    /// Verify the existing file instead of writing it
    pub fn verify(mut self) -> Self {
        self.config.verify = true;
        self
    }

    /// Print to stdout instead of writing a file
    pub fn print(mut self) -> Self {
        self.config.print = true;
        self
    }

    /// Validate the configuration and generate the code
    pub fn generate(self) -> Result<String> {
        self.config.validate()?;
        generate(&self.config)
    }
}

#[derive(Debug, serde::Deserialize)]
struct CargoToml {
    package: Option<CargoPackage>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackage {
    metadata: Option<CargoPackageMetadata>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackageMetadata {
    typegen: Option<toml::Value>,
}

/// Generate code from `[package.metadata.typegen]` in Cargo.toml
///
/// The section takes the same keys as [`CodegenConfig`]. `schema_file` and
/// `out_file` are resolved relative to the manifest directory; without
/// `out_file` the output goes to `$OUT_DIR/db.d.ts`.
pub fn generate_from_cargo_metadata() -> Result<String> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").map_err(|_| {
        CodegenError::ConfigError(
            "CARGO_MANIFEST_DIR not set - are you running from build.rs?".into(),
        )
    })?;
    let manifest_dir = PathBuf::from(manifest_dir);

    let cargo_toml_path = manifest_dir.join("Cargo.toml");
    let cargo_toml_content = std::fs::read_to_string(&cargo_toml_path)?;

    let cargo_toml: CargoToml = toml::from_str(&cargo_toml_content).map_err(|e| {
        CodegenError::ConfigError(format!(
            "Failed to parse {}: {}",
            cargo_toml_path.display(),
            e
        ))
    })?;

    let section = cargo_toml
        .package
        .and_then(|p| p.metadata)
        .and_then(|m| m.typegen)
        .ok_or_else(|| {
            CodegenError::ConfigError(
                "Missing [package.metadata.typegen] section in Cargo.toml".into(),
            )
        })?;
    let has_out_file = section.get("out_file").is_some();
    let mut config: CodegenConfig = section.try_into().map_err(|e| {
        CodegenError::ConfigError(format!("Invalid [package.metadata.typegen]: {}", e))
    })?;

    config.schema_file = manifest_dir.join(&config.schema_file);
    config.out_file = if has_out_file {
        manifest_dir.join(&config.out_file)
    } else {
        let out_dir = std::env::var("OUT_DIR").map_err(|_| {
            CodegenError::ConfigError("OUT_DIR not set - are you running from build.rs?".into())
        })?;
        PathBuf::from(out_dir).join("db.d.ts")
    };

    println!("cargo:rerun-if-changed={}", config.schema_file.display());
    println!("cargo:rerun-if-changed={}", cargo_toml_path.display());

    CodegenBuilder::from_config(config).generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{EnumCollection, TableMetadata};

    fn metadata() -> DatabaseMetadata {
        let mut partition = TableMetadata::new(Some("public".into()), "events_2024");
        partition.is_partition = true;
        DatabaseMetadata {
            tables: vec![
                TableMetadata::new(Some("public".into()), "users"),
                TableMetadata::new(Some("public".into()), "users_archive"),
                TableMetadata::new(Some("audit".into()), "logs"),
                partition,
            ],
            enums: EnumCollection::new(),
        }
    }

    fn names(metadata: &DatabaseMetadata) -> Vec<&str> {
        metadata.tables.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_filter_tables() {
        let all = filter_tables(metadata(), None, None, false).unwrap();
        assert_eq!(names(&all), vec!["users", "users_archive", "logs"]);

        let with_partitions = filter_tables(metadata(), None, None, true).unwrap();
        assert_eq!(with_partitions.tables.len(), 4);

        let included = filter_tables(metadata(), Some("users*"), Some("*_archive"), false).unwrap();
        assert_eq!(names(&included), vec!["users"]);

        let by_schema = filter_tables(metadata(), Some("audit.*"), None, false).unwrap();
        assert_eq!(names(&by_schema), vec!["logs"]);

        assert!(filter_tables(metadata(), Some("{bad"), None, false).is_err());
    }

    #[test]
    fn test_verify_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.d.ts");

        assert!(matches!(
            verify_output(&path, "export interface DB {}\n"),
            Err(CodegenError::VerifyMismatch { .. })
        ));

        write_output(&path, "export interface DB {}\n").unwrap();
        assert!(verify_output(&path, "export interface DB {}\n").is_ok());

        match verify_output(&path, "export interface DB {\n  a: A;\n}\n") {
            Err(CodegenError::VerifyMismatch { path: reported, diff }) => {
                assert_eq!(reported, path);
                assert!(diff.contains("-export interface DB {}"));
                assert!(diff.contains("+  a: A;"));
            }
            other => panic!("expected a mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_write_output_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/types/db.d.ts");
        write_output(&path, "x").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");
    }

    #[test]
    fn test_builder_generates_file() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.sql");
        std::fs::write(
            &schema,
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, user_name TEXT);",
        )
        .unwrap();
        let out_file = dir.path().join("out/db.d.ts");

        let output = CodegenBuilder::new(&schema)
            .dialect(DialectKind::Sqlite)
            .out_file(&out_file)
            .camel_case(true)
            .singularize(true)
            .generate()
            .unwrap();

        assert!(output.contains("export interface User {\n  id: Generated<number>;\n  userName: string | null;\n}"));
        assert!(output.contains("export interface DB {\n  users: User;\n}"));
        assert_eq!(std::fs::read_to_string(&out_file).unwrap(), output);

        let verified = CodegenBuilder::new(&schema)
            .dialect(DialectKind::Sqlite)
            .out_file(&out_file)
            .camel_case(true)
            .singularize(true)
            .verify()
            .generate();
        assert!(verified.is_ok());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = CodegenBuilder::new("does-not-exist.sql").generate();
        assert!(matches!(result, Err(CodegenError::ValidationError(_))));
    }
}
