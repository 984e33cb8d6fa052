//! CLI entry point for typegen

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use typegen::codegen::{DialectKind, RuntimeEnumStyle};
use typegen::config::{parse_json_map, parse_overrides, CodegenConfig};
use typegen::CodegenError;

#[derive(Parser)]
#[command(name = "typegen")]
#[command(about = "Generate TypeScript table and enum declarations from SQL schema DDL")]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to SQL schema file (overrides config)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// SQL dialect of the schema file
    #[arg(short, long, value_enum)]
    dialect: Option<DialectArg>,

    /// Path of the generated declaration file
    #[arg(short, long)]
    out_file: Option<PathBuf>,

    /// Print the generated output to stdout instead of writing it
    #[arg(long)]
    print: bool,

    /// Fail if the generated output differs from the existing file
    #[arg(long)]
    verify: bool,

    /// camelCase table and column identifiers
    #[arg(long)]
    camel_case: bool,

    /// Schema whose tables are referenced without qualification (repeatable)
    #[arg(long = "default-schema")]
    default_schemas: Vec<String>,

    /// Only generate tables matching this glob (e.g. "public.*", "(users|orders)")
    #[arg(long)]
    include_pattern: Option<String>,

    /// Skip tables matching this glob
    #[arg(long)]
    exclude_pattern: Option<String>,

    /// Include partition tables
    #[arg(long)]
    partitions: bool,

    /// Emit enums as runtime values instead of literal unions
    #[arg(
        long,
        value_enum,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "screaming-snake-case"
    )]
    runtime_enums: Option<EnumStyleArg>,

    /// Singularize table interface names
    #[arg(long)]
    singularize: bool,

    /// Column type overrides as JSON: {"columns": {"table.column": "Type"}}
    #[arg(long)]
    overrides: Option<String>,

    /// Custom imports as JSON: {"Name": "module#ExportedName"}
    #[arg(long)]
    custom_imports: Option<String>,

    /// Data type mappings as JSON: {"timestamptz": "Temporal.Instant"}
    #[arg(long)]
    type_mapping: Option<String>,

    /// Emit plain `import` statements instead of `import type`
    #[arg(long)]
    no_type_only_imports: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the declaration file (default)
    Generate,
    /// Inspect schema (print introspected metadata as JSON)
    Inspect,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    #[value(alias = "postgresql", alias = "pg")]
    Postgres,
    Mysql,
    Sqlite,
}

impl From<DialectArg> for DialectKind {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => DialectKind::Postgres,
            DialectArg::Mysql => DialectKind::Mysql,
            DialectArg::Sqlite => DialectKind::Sqlite,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EnumStyleArg {
    PascalCase,
    ScreamingSnakeCase,
}

impl From<EnumStyleArg> for RuntimeEnumStyle {
    fn from(arg: EnumStyleArg) -> Self {
        match arg {
            EnumStyleArg::PascalCase => RuntimeEnumStyle::PascalCase,
            EnumStyleArg::ScreamingSnakeCase => RuntimeEnumStyle::ScreamingSnakeCase,
        }
    }
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Load configuration first (before logging, so we can use config.log_level)
    let mut config = CodegenConfig::load(cli.config.as_deref())?;
    if cli.log_level.is_some() {
        config.log_level = cli.log_level.clone();
    }

    // Initialize logging
    // Priority: RUST_LOG env var > config.log_level > default (debug for dev, info for release)
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let log_level = config.log_level.as_deref().unwrap_or(default_level);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    let command = cli.command.take().unwrap_or(Commands::Generate);
    apply_cli_overrides(&mut config, cli)?;

    if let Commands::Inspect = command {
        return inspect_schema(&config);
    }

    // Validate configuration
    config.validate()?;

    info!("Generating types from schema: {:?}", config.schema_file);
    match typegen::generate(&config) {
        Ok(_) => {
            info!("Code generation completed successfully");
            Ok(())
        }
        Err(CodegenError::VerifyMismatch { path, diff }) => {
            error!("Generated types differ from {}:\n{}", path.display(), diff);
            anyhow::bail!("{} is out of date", path.display())
        }
        Err(e) => Err(e.into()),
    }
}

/// Apply CLI flags on top of the loaded configuration
fn apply_cli_overrides(config: &mut CodegenConfig, cli: Cli) -> Result<()> {
    if let Some(schema) = cli.schema {
        config.schema_file = schema;
    }
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect.into();
    }
    if let Some(out_file) = cli.out_file {
        config.out_file = out_file;
    }
    config.print |= cli.print;
    config.verify |= cli.verify;
    config.camel_case |= cli.camel_case;
    config.partitions |= cli.partitions;
    config.singularize |= cli.singularize;
    if cli.no_type_only_imports {
        config.type_only_imports = false;
    }
    if !cli.default_schemas.is_empty() {
        config.default_schemas = cli.default_schemas;
    }
    if cli.include_pattern.is_some() {
        config.include_pattern = cli.include_pattern;
    }
    if cli.exclude_pattern.is_some() {
        config.exclude_pattern = cli.exclude_pattern;
    }
    if let Some(style) = cli.runtime_enums {
        config.runtime_enums = Some(style.into());
    }

    // JSON flags are parsed before any schema I/O so malformed input fails fast
    if let Some(json) = cli.overrides {
        config.overrides.columns.extend(parse_overrides(&json)?.columns);
    }
    if let Some(json) = cli.custom_imports {
        config
            .custom_imports
            .extend(parse_json_map("custom-imports", &json)?);
    }
    if let Some(json) = cli.type_mapping {
        config
            .type_mapping
            .extend(parse_json_map("type-mapping", &json)?);
    }

    Ok(())
}

fn inspect_schema(config: &CodegenConfig) -> Result<()> {
    let metadata = typegen::introspect(config)?;
    let metadata = typegen::filter_tables(
        metadata,
        config.include_pattern.as_deref(),
        config.exclude_pattern.as_deref(),
        config.partitions,
    )?;

    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
