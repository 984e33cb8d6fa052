//! Metadata structures produced by schema introspection

use serde::{Deserialize, Serialize};

use super::enum_collection::EnumCollection;

/// Metadata for a whole database
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Tables (order is irrelevant, the transformer sorts them)
    pub tables: Vec<TableMetadata>,

    /// Enum types declared in the database
    pub enums: EnumCollection,
}

/// Metadata for a database table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Schema the table lives in (if the dialect has schemas)
    pub schema: Option<String>,

    /// Table name
    pub name: String,

    /// Columns in definition order
    pub columns: Vec<ColumnMetadata>,

    /// Whether this is a view (typed from the table it selects from)
    #[serde(default)]
    pub is_view: bool,

    /// Whether this is a partition of another table
    #[serde(default)]
    pub is_partition: bool,
}

/// Metadata for a column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,

    /// Lower-cased dialect type name without parameters (e.g., "int4", "varchar")
    pub data_type: String,

    /// Schema qualifying a custom data type (if any)
    pub data_type_schema: Option<String>,

    /// Inline enum values (MySQL `ENUM(...)`, SQLite `CHECK (c IN (...))`)
    pub enum_values: Option<Vec<String>>,

    /// Whether the column has a default value
    pub has_default_value: bool,

    /// Whether the column is an array of `data_type`
    pub is_array: bool,

    /// Whether this column is auto-increment / identity
    pub is_auto_incrementing: bool,

    /// Whether the column is nullable
    pub is_nullable: bool,

    /// Column comment (if any)
    pub comment: Option<String>,
}

impl TableMetadata {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
            columns: Vec::new(),
            is_view: false,
            is_partition: false,
        }
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get a mutable column by name
    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut ColumnMetadata> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// `schema.name`, or the bare name when there is no schema
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

impl ColumnMetadata {
    /// A non-null, non-default column of the given type
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into().to_lowercase(),
            data_type_schema: None,
            enum_values: None,
            has_default_value: false,
            is_array: false,
            is_auto_incrementing: false,
            is_nullable: false,
            comment: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default_value = true;
        self
    }

    pub fn auto_incrementing(mut self) -> Self {
        self.is_auto_incrementing = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.data_type_schema = Some(schema.into());
        self
    }

    pub fn with_enum_values(mut self, values: Vec<String>) -> Self {
        self.enum_values = Some(values);
        self
    }
}
