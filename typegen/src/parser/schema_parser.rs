//! SQL schema introspection from DDL using sqlparser-rs

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use sqlparser::ast::{
    ColumnDef, ColumnOption, CreateTable, DataType, EnumMember, Expr, IndexColumn, ObjectName,
    PrimaryKeyConstraint, Statement, TableConstraint,
};
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use tracing::{debug, info, warn};

use super::enum_collection::EnumCollection;
use super::metadata::*;
use crate::codegen::DialectKind;
use crate::error::Result;

/// Data type of columns whose labels are carried inline (`ENUM(...)`, SQLite
/// `CHECK (col IN (...))`)
const INLINE_ENUM_TYPE: &str = "enum";

/// Source of database metadata
pub trait Introspector {
    fn introspect(&self) -> Result<DatabaseMetadata>;
}

/// Parse a SQL schema string into database metadata
pub fn parse_schema(sql: &str, dialect: DialectKind) -> Result<DatabaseMetadata> {
    DdlIntrospector::new(sql, dialect).introspect()
}

/// Reads tables, enum types, domains and column comments from DDL text
#[derive(Debug, Clone)]
pub struct DdlIntrospector {
    sql: String,
    dialect: DialectKind,
    default_schema: Option<String>,
}

impl DdlIntrospector {
    pub fn new(sql: impl Into<String>, dialect: DialectKind) -> Self {
        Self {
            sql: sql.into(),
            dialect,
            default_schema: dialect.default_schema().map(String::from),
        }
    }

    pub fn from_file(path: &Path, dialect: DialectKind) -> Result<Self> {
        let sql = std::fs::read_to_string(path)?;
        Ok(Self::new(sql, dialect))
    }

    /// Schema that unqualified tables and types are placed in
    pub fn with_default_schema(mut self, schema: Option<String>) -> Self {
        self.default_schema = schema;
        self
    }

    fn sql_dialect(&self) -> Box<dyn Dialect> {
        match self.dialect {
            DialectKind::Postgres => Box::new(PostgreSqlDialect {}),
            DialectKind::Mysql => Box::new(MySqlDialect {}),
            DialectKind::Sqlite => Box::new(SQLiteDialect {}),
        }
    }

    /// `(schema, name)` of a possibly qualified, possibly quoted name, with
    /// the default schema filled in.
    fn split_qualified(&self, text: &str) -> (Option<String>, String) {
        let parts: Vec<String> = text.split('.').map(unquote).collect();
        match parts.as_slice() {
            [.., schema, name] => (Some(schema.clone()), name.clone()),
            _ => (self.default_schema.clone(), parts.concat()),
        }
    }

    fn qualify(&self, text: &str) -> String {
        match self.split_qualified(text) {
            (Some(schema), name) => format!("{}.{}", schema, name),
            (None, name) => name,
        }
    }
}

impl Introspector for DdlIntrospector {
    fn introspect(&self) -> Result<DatabaseMetadata> {
        let patterns = Patterns::new()?;
        let dialect = self.sql_dialect();
        let statements = Parser::parse_sql(dialect.as_ref(), &self.sql)?;
        debug!("Parsed {} statements", statements.len());

        let mut enums = EnumCollection::new();
        let mut domains: HashMap<String, String> = HashMap::new();
        let mut comments: Vec<(String, String)> = Vec::new();
        let mut creates: Vec<&CreateTable> = Vec::new();
        let mut views: Vec<ViewDefinition> = Vec::new();

        for statement in &statements {
            if let Statement::CreateTable(create) = statement {
                creates.push(create);
                continue;
            }

            let text = statement.to_string();
            if let Some(caps) = patterns.create_enum.captures(&text) {
                let key = self.qualify(&caps[1]);
                let mut labels: Vec<String> = Vec::new();
                for label in patterns.string_list(&caps[2]) {
                    if !labels.contains(&label) {
                        labels.push(label);
                    }
                }
                debug!("Enum {} with {} labels", key, labels.len());
                enums.set(&key, labels);
            } else if let Some(caps) = patterns.create_domain.captures(&text) {
                let key = self.qualify(&caps[1]).to_lowercase();
                let base = patterns.domain_base_type(&caps[2]);
                debug!("Domain {} over {}", key, base);
                domains.insert(key, base);
            } else if let Some(caps) = patterns.comment_on_column.captures(&text) {
                comments.push((caps[1].to_string(), caps[2].replace("''", "'")));
            } else if let Some(caps) = patterns.create_view.captures(&text) {
                views.push(ViewDefinition {
                    name: caps[1].to_string(),
                    projection: caps[2].to_string(),
                    source: caps[3].to_string(),
                });
            }
        }

        let resolver = TypeResolver {
            introspector: self,
            patterns: &patterns,
            domains: &domains,
        };
        let mut tables: Vec<TableMetadata> = creates
            .into_iter()
            .map(|create| resolver.table(create))
            .collect();

        for (target, comment) in comments {
            apply_column_comment(self, &mut tables, &target, comment);
        }

        // Views may select from earlier views
        for definition in &views {
            if let Some(view) = resolver.view(definition, &tables) {
                tables.push(view);
            }
        }

        info!(
            "Introspected {} tables and {} enums",
            tables.len(),
            enums.len()
        );
        Ok(DatabaseMetadata { tables, enums })
    }
}

/// View columns are nullable and carry no defaults
fn view_column(mut column: ColumnMetadata) -> ColumnMetadata {
    column.is_nullable = true;
    column.has_default_value = false;
    column.is_auto_incrementing = false;
    column
}

/// `CREATE VIEW name AS SELECT projection FROM source [WHERE ...]`
struct ViewDefinition {
    name: String,
    projection: String,
    source: String,
}

fn apply_column_comment(
    introspector: &DdlIntrospector,
    tables: &mut [TableMetadata],
    target: &str,
    comment: String,
) {
    let Some((table_name, column_name)) = target.rsplit_once('.') else {
        warn!("Ignoring comment on unqualified column {}", target);
        return;
    };
    let (schema, table_name) = introspector.split_qualified(table_name);
    let column_name = unquote(column_name);

    let column = tables
        .iter_mut()
        .filter(|t| t.name == table_name && t.schema == schema)
        .find_map(|t| t.get_column_mut(&column_name));
    match column {
        Some(column) => column.comment = Some(comment),
        None => warn!("Comment target {} not found", target),
    }
}

/// Regexes over the rendered text of statements sqlparser does not model
/// in detail.
struct Patterns {
    create_enum: Regex,
    create_domain: Regex,
    domain_tail: Regex,
    comment_on_column: Regex,
    check_in: Regex,
    create_view: Regex,
    view_column: Regex,
    type_params: Regex,
    string_literal: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Self {
            create_enum: Regex::new(r"(?is)^CREATE\s+TYPE\s+(\S+)\s+AS\s+ENUM\s*\((.*)\)\s*$")?,
            create_domain: Regex::new(r"(?is)^CREATE\s+DOMAIN\s+(\S+)\s+(?:AS\s+)?(.+)$")?,
            domain_tail: Regex::new(
                r"(?is)\s+(COLLATE|DEFAULT|CONSTRAINT|NOT\s+NULL|NULL|CHECK)\b.*$",
            )?,
            comment_on_column: Regex::new(r"(?is)^COMMENT\s+ON\s+COLUMN\s+(\S+)\s+IS\s+'(.*)'$")?,
            check_in: Regex::new(
                r#"(?is)^(?:CONSTRAINT\s+\S+\s+)?CHECK\s*\(\s*[`"]?(\w+)[`"]?\s+IN\s*\((.*)\)\s*\)$"#,
            )?,
            create_view: Regex::new(
                r"(?is)^CREATE\s+(?:OR\s+REPLACE\s+)?(?:MATERIALIZED\s+)?VIEW\s+(?:IF\s+NOT\s+EXISTS\s+)?(\S+)\s+AS\s+SELECT\s+(.+?)\s+FROM\s+(\S+)(?:\s+WHERE\b.*)?$",
            )?,
            view_column: Regex::new(
                r#"(?i)^(?:[`"]?\w+[`"]?\.)?[`"]?(\w+)[`"]?(?:\s+AS\s+[`"]?(\w+)[`"]?)?$"#,
            )?,
            type_params: Regex::new(r"\s*\([^)]*\)")?,
            string_literal: Regex::new(r"'((?:[^']|'')*)'")?,
        })
    }

    /// Labels of a `'a', 'b'` list; bare identifiers are accepted too
    fn string_list(&self, text: &str) -> Vec<String> {
        let quoted: Vec<String> = self
            .string_literal
            .captures_iter(text)
            .map(|caps| caps[1].replace("''", "'"))
            .collect();
        if !quoted.is_empty() {
            return quoted;
        }
        text.split(',')
            .map(unquote)
            .filter(|label| !label.is_empty())
            .collect()
    }

    fn domain_base_type(&self, text: &str) -> String {
        self.domain_tail.replace(text.trim(), "").trim().to_string()
    }

    /// `(column, labels)` of a `CHECK (column IN (...))` constraint
    fn check_values(&self, text: &str) -> Option<(String, Vec<String>)> {
        let caps = self.check_in.captures(text.trim())?;
        Some((caps[1].to_string(), self.string_list(&caps[2])))
    }
}

/// A column type after alias normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedType {
    pub data_type: String,
    pub schema: Option<String>,
    pub is_array: bool,
    /// `serial` and friends carry an implicit default
    pub implies_default: bool,
}

struct TypeResolver<'a> {
    introspector: &'a DdlIntrospector,
    patterns: &'a Patterns,
    domains: &'a HashMap<String, String>,
}

impl TypeResolver<'_> {
    fn table(&self, create: &CreateTable) -> TableMetadata {
        let (schema, name) = self.introspector.split_qualified(&object_name(&create.name));
        let mut table = TableMetadata::new(schema, name);
        table.is_partition = create.to_string().to_uppercase().contains(" PARTITION OF ");

        for column_def in &create.columns {
            table.columns.push(self.column(column_def));
        }

        for constraint in &create.constraints {
            match constraint {
                TableConstraint::PrimaryKey(PrimaryKeyConstraint { columns, .. }) => {
                    for index_column in columns {
                        let column_name = extract_ident_from_index_column(index_column);
                        if let Some(column) = table.get_column_mut(&column_name) {
                            column.is_nullable = false;
                        }
                    }
                }
                other => {
                    if let Some((column_name, values)) =
                        self.patterns.check_values(&other.to_string())
                    {
                        if let Some(column) = table.get_column_mut(&column_name) {
                            self.apply_check_values(column, values);
                        }
                    }
                }
            }
        }

        debug!(
            "Table {} with {} columns",
            table.qualified_name(),
            table.columns.len()
        );
        table
    }

    fn column(&self, column_def: &ColumnDef) -> ColumnMetadata {
        let name = column_def.name.value.clone();
        let (resolved, enum_values) = match extract_enum_values(&column_def.data_type) {
            Some(values) => (
                NormalizedType {
                    data_type: INLINE_ENUM_TYPE.to_string(),
                    schema: None,
                    is_array: false,
                    implies_default: false,
                },
                Some(values),
            ),
            None => (self.resolve(&column_def.data_type.to_string()), None),
        };

        let mut column = ColumnMetadata {
            name,
            data_type: resolved.data_type,
            data_type_schema: resolved.schema,
            enum_values,
            has_default_value: resolved.implies_default,
            is_array: resolved.is_array,
            is_auto_incrementing: false,
            is_nullable: true,
            comment: None,
        };

        for option in &column_def.options {
            match &option.option {
                ColumnOption::NotNull => column.is_nullable = false,
                ColumnOption::Null => column.is_nullable = true,
                ColumnOption::Default(_) => column.has_default_value = true,
                ColumnOption::PrimaryKey(_) => {
                    column.is_nullable = false;
                    if is_auto_increment(&option.option.to_string()) {
                        column.is_auto_incrementing = true;
                    }
                }
                ColumnOption::Comment(comment) => column.comment = Some(comment.clone()),
                other => {
                    let text = other.to_string();
                    let upper = text.to_uppercase();
                    if is_auto_increment(&upper) {
                        column.is_auto_incrementing = true;
                    } else if upper.starts_with("GENERATED") || upper.starts_with("AS ") {
                        column.has_default_value = true;
                    } else if let Some((checked, values)) = self.patterns.check_values(&text) {
                        if checked == column.name {
                            self.apply_check_values(&mut column, values);
                        }
                    }
                }
            }
        }

        column
    }

    /// A view over a single table or view, typed from its source columns.
    /// Projections other than `*` and plain (optionally aliased) column
    /// references cannot be typed, so such views are skipped.
    fn view(
        &self,
        definition: &ViewDefinition,
        tables: &[TableMetadata],
    ) -> Option<TableMetadata> {
        let (schema, name) = self.introspector.split_qualified(&definition.name);
        let (source_schema, source_name) = self.introspector.split_qualified(&definition.source);
        let Some(source) = tables
            .iter()
            .find(|t| t.name == source_name && t.schema == source_schema)
        else {
            warn!("Skipping view {}: source {} not found", name, definition.source);
            return None;
        };

        let mut view = TableMetadata::new(schema, name);
        view.is_view = true;
        for item in definition.projection.split(',').map(str::trim) {
            if item == "*" {
                view.columns
                    .extend(source.columns.iter().cloned().map(view_column));
                continue;
            }
            let column = self
                .patterns
                .view_column
                .captures(item)
                .and_then(|caps| {
                    let mut column = view_column(source.get_column(&caps[1])?.clone());
                    if let Some(alias) = caps.get(2) {
                        column.name = alias.as_str().to_string();
                    }
                    Some(column)
                });
            match column {
                Some(column) => view.columns.push(column),
                None => {
                    warn!("Skipping view {}: cannot type '{}'", view.name, item);
                    return None;
                }
            }
        }

        debug!(
            "View {} with {} columns",
            view.qualified_name(),
            view.columns.len()
        );
        Some(view)
    }

    /// SQLite has no enum types, so a `CHECK (col IN (...))` list stands in for
    /// one. Labels are sorted like enum type labels.
    fn apply_check_values(&self, column: &mut ColumnMetadata, mut values: Vec<String>) {
        if self.introspector.dialect != DialectKind::Sqlite {
            return;
        }
        values.sort();
        debug!("Column {} checked against {:?}", column.name, values);
        column.data_type = INLINE_ENUM_TYPE.to_string();
        column.enum_values = Some(values);
    }

    /// Normalize a type, looking through domains to their base type
    fn resolve(&self, text: &str) -> NormalizedType {
        let dialect = self.introspector.dialect;
        let normalized = normalize_type(text, dialect, &self.patterns.type_params);

        let domain_key = match &normalized.schema {
            Some(schema) => format!("{}.{}", schema, normalized.data_type),
            None => self.introspector.qualify(&normalized.data_type),
        };
        match self.domains.get(&domain_key) {
            Some(base) => {
                let mut base = normalize_type(base, dialect, &self.patterns.type_params);
                base.is_array |= normalized.is_array;
                base
            }
            None => normalized,
        }
    }
}

fn is_auto_increment(text: &str) -> bool {
    let upper = text.to_uppercase();
    upper.contains("AUTO_INCREMENT") || upper.contains("AUTOINCREMENT") || upper.contains("IDENTITY")
}

/// Lower-case a rendered SQL type, strip parameters and array suffixes, and
/// map dialect aliases to catalog names.
pub fn normalize_type(text: &str, dialect: DialectKind, type_params: &Regex) -> NormalizedType {
    let mut text = text.trim().to_lowercase();
    let mut is_array = false;

    loop {
        if text.ends_with(']') {
            if let Some(open) = text.rfind('[') {
                text.truncate(open);
                text.truncate(text.trim_end().len());
                is_array = true;
                continue;
            }
        }
        if let Some(stripped) = text.strip_suffix(" array") {
            text = stripped.trim_end().to_string();
            is_array = true;
            continue;
        }
        break;
    }

    let mut text = type_params.replace_all(&text, "").to_string();
    if dialect == DialectKind::Mysql {
        for modifier in [" unsigned", " signed", " zerofill"] {
            text = text.replace(modifier, "");
        }
    }
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let (schema, name) = match text.rsplit_once('.') {
        Some((schema, name)) => (Some(unquote(schema)), unquote(name)),
        None => (None, unquote(&text)),
    };

    let (data_type, implies_default) = match dialect {
        DialectKind::Postgres => postgres_alias(&name),
        DialectKind::Mysql => mysql_alias(&name),
        DialectKind::Sqlite => (sqlite_affinity(&name), false),
    };

    NormalizedType {
        data_type: data_type.to_string(),
        schema,
        is_array,
        implies_default,
    }
}

fn postgres_alias(name: &str) -> (&str, bool) {
    match name {
        "int" | "integer" => ("int4", false),
        "smallint" => ("int2", false),
        "bigint" => ("int8", false),
        "serial" | "serial4" => ("int4", true),
        "smallserial" | "serial2" => ("int2", true),
        "bigserial" | "serial8" => ("int8", true),
        "boolean" => ("bool", false),
        "real" => ("float4", false),
        "float" | "double precision" => ("float8", false),
        "character varying" => ("varchar", false),
        "character" | "char" => ("bpchar", false),
        "decimal" => ("numeric", false),
        "timestamp without time zone" => ("timestamp", false),
        "timestamp with time zone" => ("timestamptz", false),
        "time without time zone" => ("time", false),
        "time with time zone" => ("timetz", false),
        "bit varying" => ("varbit", false),
        other => (other, false),
    }
}

fn mysql_alias(name: &str) -> (&str, bool) {
    match name {
        "integer" => ("int", false),
        "bool" | "boolean" => ("tinyint", false),
        "dec" | "numeric" | "fixed" => ("decimal", false),
        "double precision" | "real" => ("double", false),
        "character varying" => ("varchar", false),
        "character" => ("char", false),
        "serial" => ("bigint", true),
        other => (other, false),
    }
}

/// SQLite column affinity of a declared type
fn sqlite_affinity(name: &str) -> &str {
    match name {
        "any" | "blob" | "boolean" | "integer" | "numeric" | "real" | "text" => name,
        "bool" => "boolean",
        "" => "blob",
        _ if name.contains("int") => "integer",
        _ if name.contains("char") || name.contains("clob") || name.contains("text") => "text",
        _ if name.contains("blob") => "blob",
        _ if name.contains("real") || name.contains("floa") || name.contains("doub") => "real",
        _ => "numeric",
    }
}

fn unquote(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '"' || c == '`' || c == '\'')
        .to_string()
}

/// Extract enum values from a data type
fn extract_enum_values(data_type: &DataType) -> Option<Vec<String>> {
    match data_type {
        DataType::Enum(members, _) => Some(
            members
                .iter()
                .map(|m| match m {
                    EnumMember::Name(s) => s.clone(),
                    EnumMember::NamedValue(s, _) => s.clone(),
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Dotted name with each part unquoted
fn object_name(name: &ObjectName) -> String {
    name.0
        .iter()
        .filter_map(|part| part.as_ident())
        .map(|ident| ident.value.clone())
        .collect::<Vec<_>>()
        .join(".")
}

/// Extract a column name string from an IndexColumn
fn extract_ident_from_index_column(ic: &IndexColumn) -> String {
    match &ic.column.expr {
        Expr::Identifier(ident) => ident.value.clone(),
        other => format!("{}", other),
    }
}
