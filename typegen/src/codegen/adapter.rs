//! Dialect adapters: scalar type maps and shared helper definitions

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ast::{Definition, ExpressionNode, ModuleReferenceNode, PropertyNode, TemplateNode};
use crate::error::CodegenError;

/// The SQL dialect an adapter targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
    Mysql,
    Sqlite,
}

impl DialectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectKind::Postgres => "postgres",
            DialectKind::Mysql => "mysql",
            DialectKind::Sqlite => "sqlite",
        }
    }

    /// Schema that unqualified names live in
    pub fn default_schema(&self) -> Option<&'static str> {
        match self {
            DialectKind::Postgres => Some("public"),
            DialectKind::Mysql | DialectKind::Sqlite => None,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "mysql" => Ok(DialectKind::Mysql),
            "sqlite" => Ok(DialectKind::Sqlite),
            other => Err(CodegenError::ConfigError(format!(
                "Unknown dialect '{}' (expected postgres, mysql or sqlite)",
                other
            ))),
        }
    }
}

/// Dialect-specific type policy consumed by the transformer
#[derive(Debug, Clone)]
pub struct Adapter {
    pub kind: DialectKind,
    pub default_scalar: ExpressionNode,
    pub default_schemas: Vec<String>,
    pub definitions: BTreeMap<String, Definition>,
    pub imports: BTreeMap<String, ModuleReferenceNode>,
    /// Lower-cased raw data type name -> type
    pub scalars: BTreeMap<String, ExpressionNode>,
}

fn id(name: &str) -> ExpressionNode {
    ExpressionNode::identifier(name)
}

fn union(names: &[&str]) -> ExpressionNode {
    ExpressionNode::Union(names.iter().map(|n| id(n)).collect())
}

fn scalars(entries: &[(&str, &str)]) -> BTreeMap<String, ExpressionNode> {
    entries
        .iter()
        .map(|(data_type, name)| (data_type.to_string(), id(name)))
        .collect()
}

fn point() -> Definition {
    Definition::Expression(ExpressionNode::object(vec![
        PropertyNode::new("x", id("number")),
        PropertyNode::new("y", id("number")),
    ]))
}

/// `Json*` helpers shared by the Postgres and MySQL adapters
fn json_definitions(definitions: &mut BTreeMap<String, Definition>) {
    definitions.insert(
        "Json".into(),
        Definition::Expression(ExpressionNode::column_type(
            id("JsonValue"),
            id("string"),
            id("string"),
        )),
    );
    definitions.insert(
        "JsonArray".into(),
        Definition::Expression(ExpressionNode::array(id("JsonValue"))),
    );
    definitions.insert(
        "JsonObject".into(),
        Definition::Expression(ExpressionNode::raw(
            "{\n  [x: string]: JsonValue | undefined;\n}",
        )),
    );
    definitions.insert(
        "JsonPrimitive".into(),
        Definition::Expression(union(&["boolean", "number", "string", "null"])),
    );
    definitions.insert(
        "JsonValue".into(),
        Definition::Expression(union(&["JsonArray", "JsonObject", "JsonPrimitive"])),
    );
}

/// Helpers every generated file may reference, regardless of dialect
pub fn global_definitions() -> BTreeMap<String, Definition> {
    let mut definitions = BTreeMap::new();

    // Distributes the array over a ColumnType triple when T carries one.
    definitions.insert(
        "ArrayType".into(),
        Definition::Template(TemplateNode::new(
            &["T"],
            ExpressionNode::extends(
                "ArrayTypeImpl<T>",
                ExpressionNode::array(ExpressionNode::infer("U")),
                ExpressionNode::array(id("U")),
                ExpressionNode::generic("ArrayTypeImpl", vec![id("T")]),
            ),
        )),
    );
    definitions.insert(
        "ArrayTypeImpl".into(),
        Definition::Template(TemplateNode::new(
            &["T"],
            ExpressionNode::extends(
                "T",
                ExpressionNode::column_type(
                    ExpressionNode::infer("S"),
                    ExpressionNode::infer("I"),
                    ExpressionNode::infer("U"),
                ),
                ExpressionNode::column_type(
                    ExpressionNode::array(id("S")),
                    ExpressionNode::array(id("I")),
                    ExpressionNode::array(id("U")),
                ),
                ExpressionNode::array(id("T")),
            ),
        )),
    );
    definitions.insert(
        "Generated".into(),
        Definition::Template(TemplateNode::new(
            &["T"],
            ExpressionNode::extends(
                "T",
                ExpressionNode::column_type(
                    ExpressionNode::infer("S"),
                    ExpressionNode::infer("I"),
                    ExpressionNode::infer("U"),
                ),
                ExpressionNode::column_type(id("S"), union(&["I", "undefined"]), id("U")),
                ExpressionNode::column_type(id("T"), union(&["T", "undefined"]), id("T")),
            ),
        )),
    );

    definitions
}

/// Imports every generated file may reference, regardless of dialect
pub fn global_imports() -> BTreeMap<String, ModuleReferenceNode> {
    let mut imports = BTreeMap::new();
    imports.insert("ColumnType".into(), ModuleReferenceNode::new("kysely"));
    imports
}

impl Adapter {
    /// The built-in adapter for a dialect
    pub fn for_dialect(kind: DialectKind) -> Self {
        match kind {
            DialectKind::Postgres => Self::postgres(),
            DialectKind::Mysql => Self::mysql(),
            DialectKind::Sqlite => Self::sqlite(),
        }
    }

    pub fn postgres() -> Self {
        let mut definitions = BTreeMap::new();
        definitions.insert(
            "Circle".into(),
            Definition::Expression(ExpressionNode::object(vec![
                PropertyNode::new("x", id("number")),
                PropertyNode::new("y", id("number")),
                PropertyNode::new("radius", id("number")),
            ])),
        );
        definitions.insert(
            "Int8".into(),
            Definition::Expression(ExpressionNode::column_type(
                id("string"),
                union(&["string", "number", "bigint"]),
                union(&["string", "number", "bigint"]),
            )),
        );
        definitions.insert(
            "Interval".into(),
            Definition::Expression(ExpressionNode::column_type(
                id("IPostgresInterval"),
                union(&["IPostgresInterval", "number", "string"]),
                union(&["IPostgresInterval", "number", "string"]),
            )),
        );
        definitions.insert(
            "Numeric".into(),
            Definition::Expression(ExpressionNode::column_type(
                id("string"),
                union(&["number", "string"]),
                union(&["number", "string"]),
            )),
        );
        definitions.insert("Point".into(), point());
        definitions.insert(
            "Timestamp".into(),
            Definition::Expression(ExpressionNode::column_type(
                id("Date"),
                union(&["Date", "string"]),
                union(&["Date", "string"]),
            )),
        );
        json_definitions(&mut definitions);

        let mut imports = BTreeMap::new();
        imports.insert(
            "IPostgresInterval".into(),
            ModuleReferenceNode::new("postgres-interval"),
        );

        Self {
            kind: DialectKind::Postgres,
            default_scalar: id("string"),
            default_schemas: vec!["public".into()],
            definitions,
            imports,
            scalars: scalars(&[
                ("bit", "string"),
                ("bool", "boolean"),
                ("box", "string"),
                ("bpchar", "string"),
                ("bytea", "Buffer"),
                ("cidr", "string"),
                ("circle", "Circle"),
                ("date", "Timestamp"),
                ("daterange", "string"),
                ("float4", "number"),
                ("float8", "number"),
                ("inet", "string"),
                ("int2", "number"),
                ("int4", "number"),
                ("int4range", "string"),
                ("int8", "Int8"),
                ("int8range", "string"),
                ("interval", "Interval"),
                ("json", "Json"),
                ("jsonb", "Json"),
                ("line", "string"),
                ("lseg", "string"),
                ("macaddr", "string"),
                ("money", "string"),
                ("numeric", "Numeric"),
                ("numrange", "string"),
                ("oid", "number"),
                ("path", "string"),
                ("point", "Point"),
                ("polygon", "string"),
                ("text", "string"),
                ("time", "string"),
                ("timestamp", "Timestamp"),
                ("timestamptz", "Timestamp"),
                ("timetz", "string"),
                ("tsquery", "string"),
                ("tsrange", "string"),
                ("tstzrange", "string"),
                ("tsvector", "string"),
                ("txid_snapshot", "string"),
                ("uuid", "string"),
                ("varbit", "string"),
                ("varchar", "string"),
                ("xml", "string"),
            ]),
        }
    }

    pub fn mysql() -> Self {
        let mut definitions = BTreeMap::new();
        definitions.insert(
            "Decimal".into(),
            Definition::Expression(ExpressionNode::column_type(
                id("string"),
                union(&["number", "string"]),
                union(&["number", "string"]),
            )),
        );
        definitions.insert(
            "Geometry".into(),
            Definition::Expression(ExpressionNode::Union(vec![
                id("LineString"),
                id("Point"),
                id("Polygon"),
                ExpressionNode::array(id("Geometry")),
            ])),
        );
        definitions.insert(
            "LineString".into(),
            Definition::Expression(ExpressionNode::array(id("Point"))),
        );
        definitions.insert("Point".into(), point());
        definitions.insert(
            "Polygon".into(),
            Definition::Expression(ExpressionNode::array(id("LineString"))),
        );
        json_definitions(&mut definitions);

        Self {
            kind: DialectKind::Mysql,
            default_scalar: id("unknown"),
            default_schemas: Vec::new(),
            definitions,
            imports: BTreeMap::new(),
            scalars: scalars(&[
                ("bigint", "number"),
                ("binary", "Buffer"),
                ("bit", "Buffer"),
                ("blob", "Buffer"),
                ("char", "string"),
                ("date", "Date"),
                ("datetime", "Date"),
                ("decimal", "Decimal"),
                ("double", "number"),
                ("float", "number"),
                ("geometry", "Geometry"),
                ("int", "number"),
                ("json", "Json"),
                ("linestring", "LineString"),
                ("longblob", "Buffer"),
                ("longtext", "string"),
                ("mediumblob", "Buffer"),
                ("mediumint", "number"),
                ("mediumtext", "string"),
                ("point", "Point"),
                ("polygon", "Polygon"),
                ("smallint", "number"),
                ("text", "string"),
                ("time", "string"),
                ("timestamp", "Date"),
                ("tinyblob", "Buffer"),
                ("tinyint", "number"),
                ("tinytext", "string"),
                ("varbinary", "Buffer"),
                ("varchar", "string"),
                ("year", "number"),
            ]),
        }
    }

    pub fn sqlite() -> Self {
        Self {
            kind: DialectKind::Sqlite,
            default_scalar: id("unknown"),
            default_schemas: Vec::new(),
            definitions: BTreeMap::new(),
            imports: BTreeMap::new(),
            scalars: scalars(&[
                ("any", "unknown"),
                ("blob", "Buffer"),
                ("boolean", "number"),
                ("integer", "number"),
                ("numeric", "number"),
                ("real", "number"),
                ("text", "string"),
            ]),
        }
    }

    /// Whether `data_type` is a range type this dialect understands
    pub fn is_range_type(&self, data_type: &str) -> bool {
        self.kind == DialectKind::Postgres
            && (data_type.ends_with("range") || data_type.ends_with("multirange"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("postgres".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("PostgreSQL".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("sqlite".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        assert!("oracle".parse::<DialectKind>().is_err());
    }

    #[test]
    fn test_postgres_adapter() {
        let adapter = Adapter::postgres();
        assert_eq!(adapter.default_schemas, vec!["public".to_string()]);
        assert_eq!(adapter.scalars.get("int4"), Some(&id("number")));
        assert_eq!(adapter.scalars.get("timestamptz"), Some(&id("Timestamp")));
        assert!(adapter.definitions.contains_key("Timestamp"));
        assert!(adapter.imports.contains_key("IPostgresInterval"));
        assert!(adapter.is_range_type("int4range"));
        assert!(adapter.is_range_type("my_custom_range"));
    }

    #[test]
    fn test_sqlite_adapter() {
        let adapter = Adapter::sqlite();
        assert!(adapter.default_schemas.is_empty());
        assert_eq!(adapter.scalars.get("boolean"), Some(&id("number")));
        assert!(!adapter.is_range_type("int4range"));
    }

    #[test]
    fn test_global_definitions() {
        let definitions = global_definitions();
        let keys: Vec<&str> = definitions.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["ArrayType", "ArrayTypeImpl", "Generated"]);
        assert!(global_imports().contains_key("ColumnType"));
    }
}
