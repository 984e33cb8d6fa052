//! Configuration settings for typegen

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use super::defaults;
use crate::codegen::{
    Adapter, DialectKind, Override, Overrides, RuntimeEnumStyle, Singularizer, TransformOptions,
};
use crate::error::{CodegenError, Result};
use crate::parser::TableMatcher;

/// Column type overrides as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverridesConfig {
    /// `table.column` or `schema.table.column` -> type text
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

/// Main configuration struct for code generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Path to the SQL schema file
    #[serde(default)]
    pub schema_file: PathBuf,

    /// SQL dialect of the schema file
    #[serde(default = "default_dialect")]
    pub dialect: DialectKind,

    /// Path of the generated declaration file
    #[serde(default = "default_out_file")]
    pub out_file: PathBuf,

    /// Print the output to stdout instead of writing it
    #[serde(default = "default_print")]
    pub print: bool,

    /// Compare the output with `out_file` and fail on any difference
    #[serde(default = "default_verify")]
    pub verify: bool,

    /// camelCase table and column identifiers
    #[serde(default = "default_camel_case")]
    pub camel_case: bool,

    /// Schemas whose tables are referenced without qualification
    /// (empty means the dialect's default)
    #[serde(default)]
    pub default_schemas: Vec<String>,

    /// Only generate tables matching this glob
    #[serde(default)]
    pub include_pattern: Option<String>,

    /// Skip tables matching this glob
    #[serde(default)]
    pub exclude_pattern: Option<String>,

    /// Include partition tables
    #[serde(default = "default_partitions")]
    pub partitions: bool,

    /// Emit enums as runtime values in the given member style
    #[serde(default)]
    pub runtime_enums: Option<RuntimeEnumStyle>,

    /// Singularize table interface names
    #[serde(default = "default_singularize")]
    pub singularize: bool,

    /// Extra singularization rules (regex -> replacement), tried first
    #[serde(default)]
    pub singular_rules: BTreeMap<String, String>,

    /// Emit `import type { .. }` instead of `import { .. }`
    #[serde(default = "default_type_only_imports")]
    pub type_only_imports: bool,

    #[serde(default)]
    pub overrides: OverridesConfig,

    /// Local name -> `module` or `module#ExportedName`
    #[serde(default)]
    pub custom_imports: BTreeMap<String, String>,

    /// Data type -> type text
    #[serde(default)]
    pub type_mapping: BTreeMap<String, String>,

    /// Log level (trace, debug, info, warn, error)
    /// Can be overridden by RUST_LOG env var
    #[serde(default)]
    pub log_level: Option<String>,
}

// Default value functions for serde
fn default_dialect() -> DialectKind {
    defaults::DIALECT
}
fn default_out_file() -> PathBuf {
    PathBuf::from(defaults::OUT_FILE)
}
fn default_print() -> bool {
    defaults::PRINT
}
fn default_verify() -> bool {
    defaults::VERIFY
}
fn default_camel_case() -> bool {
    defaults::CAMEL_CASE
}
fn default_partitions() -> bool {
    defaults::PARTITIONS
}
fn default_singularize() -> bool {
    defaults::SINGULARIZE
}
fn default_type_only_imports() -> bool {
    defaults::TYPE_ONLY_IMPORTS
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            schema_file: PathBuf::new(),
            dialect: default_dialect(),
            out_file: default_out_file(),
            print: default_print(),
            verify: default_verify(),
            camel_case: default_camel_case(),
            default_schemas: Vec::new(),
            include_pattern: None,
            exclude_pattern: None,
            partitions: default_partitions(),
            runtime_enums: None,
            singularize: default_singularize(),
            singular_rules: BTreeMap::new(),
            type_only_imports: default_type_only_imports(),
            overrides: OverridesConfig::default(),
            custom_imports: BTreeMap::new(),
            type_mapping: BTreeMap::new(),
            log_level: None,
        }
    }
}

impl CodegenConfig {
    /// Create a default config with the given schema file
    pub fn default_with_schema(schema_file: PathBuf) -> Self {
        Self {
            schema_file,
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CodegenConfig = toml::from_str(&content).map_err(|e| {
            CodegenError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(config)
    }

    /// Load configuration using config-rs (file + environment variables)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        } else {
            builder = builder.add_source(File::with_name(defaults::CONFIG_FILE).required(false));
        }

        // TYPEGEN_OUT_FILE, TYPEGEN_OVERRIDES__COLUMNS__..., etc.
        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: CodegenConfig = builder.build()?.try_deserialize()?;

        Ok(config)
    }

    /// Validate the configuration before touching the schema
    pub fn validate(&self) -> Result<()> {
        if self.schema_file.as_os_str().is_empty() {
            return Err(CodegenError::ValidationError(
                "schema_file is required".into(),
            ));
        }

        if !self.schema_file.exists() {
            return Err(CodegenError::ValidationError(format!(
                "Schema file not found: {}",
                self.schema_file.display()
            )));
        }

        if self.print && self.verify {
            return Err(CodegenError::ValidationError(
                "print and verify cannot be used together".into(),
            ));
        }

        if !self.print && self.out_file.as_os_str().is_empty() {
            return Err(CodegenError::ValidationError(
                "out_file is required unless print is set".into(),
            ));
        }

        for pattern in [&self.include_pattern, &self.exclude_pattern]
            .into_iter()
            .flatten()
        {
            TableMatcher::new(pattern)?;
        }

        for (name, spec) in &self.custom_imports {
            validate_custom_import(name, spec)?;
        }

        if self.singularize {
            Singularizer::new(&self.singular_rules)?;
        }

        Ok(())
    }

    /// The built-in adapter for the configured dialect
    pub fn adapter(&self) -> Adapter {
        Adapter::for_dialect(self.dialect)
    }

    /// Schema unqualified DDL names are placed in
    pub fn introspection_schema(&self) -> Option<String> {
        self.default_schemas
            .first()
            .cloned()
            .or_else(|| self.dialect.default_schema().map(String::from))
    }

    /// Options for the transformer
    pub fn transform_options(&self) -> Result<TransformOptions> {
        let singularizer = if self.singularize {
            Some(Singularizer::new(&self.singular_rules)?)
        } else {
            None
        };

        Ok(TransformOptions {
            camel_case: self.camel_case,
            default_schemas: if self.default_schemas.is_empty() {
                None
            } else {
                Some(self.default_schemas.clone())
            },
            overrides: Overrides {
                columns: self
                    .overrides
                    .columns
                    .iter()
                    .map(|(key, code)| (key.clone(), Override::Raw(code.clone())))
                    .collect(),
            },
            custom_imports: self.custom_imports.clone(),
            type_mapping: self
                .type_mapping
                .iter()
                .map(|(data_type, code)| (data_type.to_lowercase(), code.clone()))
                .collect(),
            runtime_enums: self.runtime_enums,
            singularizer,
        })
    }
}

/// A custom import is `module` or `module#ExportedName`, neither part empty
pub fn validate_custom_import(name: &str, spec: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(CodegenError::ValidationError(format!(
            "Invalid custom import {} = {:?}: {}",
            name, spec, reason
        )))
    };

    if name.trim().is_empty() {
        return invalid("empty import name");
    }
    match spec.split_once('#') {
        Some((module, _)) if module.trim().is_empty() => invalid("empty module name"),
        Some((_, export)) if export.trim().is_empty() => invalid("empty export name"),
        None if spec.trim().is_empty() => invalid("empty module name"),
        _ => Ok(()),
    }
}

/// Parse a JSON object of strings given on the command line
pub fn parse_json_map(flag: &str, json: &str) -> Result<BTreeMap<String, String>> {
    serde_json::from_str(json).map_err(|e| {
        CodegenError::ConfigError(format!("Invalid JSON for --{}: {}", flag, e))
    })
}

/// Parse the `--overrides` flag: `{"columns": {"table.column": "Type"}}`
pub fn parse_overrides(json: &str) -> Result<OverridesConfig> {
    serde_json::from_str(json)
        .map_err(|e| CodegenError::ConfigError(format!("Invalid JSON for --overrides: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CodegenConfig::default();
        assert_eq!(config.dialect, DialectKind::Postgres);
        assert_eq!(config.out_file, PathBuf::from("./db.d.ts"));
        assert!(config.type_only_imports);
        assert!(!config.camel_case);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_validation_missing_schema() {
        let config = CodegenConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_print_and_verify_conflict() {
        let mut schema = tempfile::NamedTempFile::new().unwrap();
        writeln!(schema, "CREATE TABLE t (id INT);").unwrap();

        let mut config = CodegenConfig::default_with_schema(schema.path().to_path_buf());
        assert!(config.validate().is_ok());

        config.print = true;
        config.verify = true;
        assert!(matches!(
            config.validate(),
            Err(CodegenError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_bad_pattern_and_import() {
        let schema = tempfile::NamedTempFile::new().unwrap();

        let mut config = CodegenConfig::default_with_schema(schema.path().to_path_buf());
        config.include_pattern = Some("{users".into());
        assert!(matches!(
            config.validate(),
            Err(CodegenError::InvalidPattern(_))
        ));

        let mut config = CodegenConfig::default_with_schema(schema.path().to_path_buf());
        config
            .custom_imports
            .insert("Instant".into(), "./time#".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_custom_import() {
        assert!(validate_custom_import("Foo", "./foo").is_ok());
        assert!(validate_custom_import("Foo", "./foo#Bar").is_ok());
        assert!(validate_custom_import("Foo", "#Bar").is_err());
        assert!(validate_custom_import("Foo", "").is_err());
        assert!(validate_custom_import("", "./foo").is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
            schema_file = "test.sql"
            dialect = "sqlite"
            camel_case = true
            runtime_enums = "screaming-snake-case"
            log_level = "debug"

            [overrides.columns]
            "users.settings" = "UserSettings"

            [custom_imports]
            UserSettings = "./settings#Settings"
        "#;
        let config: CodegenConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.dialect, DialectKind::Sqlite);
        assert!(config.camel_case);
        assert_eq!(
            config.runtime_enums,
            Some(RuntimeEnumStyle::ScreamingSnakeCase)
        );
        assert_eq!(config.log_level, Some("debug".to_string()));
        assert_eq!(
            config.overrides.columns.get("users.settings"),
            Some(&"UserSettings".to_string())
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "schema_file = \"schema.sql\"\ndialect = \"mysql\"").unwrap();

        let config = CodegenConfig::from_file(file.path()).unwrap();
        assert_eq!(config.dialect, DialectKind::Mysql);
        assert_eq!(config.schema_file, PathBuf::from("schema.sql"));
    }

    #[test]
    fn test_transform_options() {
        let mut config = CodegenConfig::default();
        config.default_schemas = vec!["app".into()];
        config.singularize = true;
        config.type_mapping.insert("TIMESTAMPTZ".into(), "Date".into());
        config
            .overrides
            .columns
            .insert("users.id".into(), "UserId".into());

        let options = config.transform_options().unwrap();
        assert_eq!(options.default_schemas, Some(vec!["app".to_string()]));
        assert!(options.singularizer.is_some());
        assert_eq!(options.type_mapping.get("timestamptz"), Some(&"Date".to_string()));
        assert_eq!(
            options.overrides.columns.get("users.id"),
            Some(&Override::Raw("UserId".into()))
        );
        assert_eq!(config.introspection_schema(), Some("app".to_string()));
    }

    #[test]
    fn test_parse_json_flags() {
        let map = parse_json_map("type-mapping", r#"{"timestamptz": "Date"}"#).unwrap();
        assert_eq!(map.get("timestamptz"), Some(&"Date".to_string()));
        assert!(parse_json_map("type-mapping", "{not json").is_err());

        let overrides = parse_overrides(r#"{"columns": {"users.id": "UserId"}}"#).unwrap();
        assert_eq!(overrides.columns.len(), 1);
    }
}
