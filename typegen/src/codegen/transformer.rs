//! Maps database metadata into the declaration AST

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::adapter::{global_definitions, global_imports, Adapter};
use super::ast::{
    AliasDeclarationNode, DeclarationNode, Definition, ExpressionNode, ExtendsClauseNode,
    GenericExpressionNode, IdentifierNode, ImportClauseNode, ImportStatementNode,
    InterfaceDeclarationNode, ModuleReferenceNode, ObjectExpressionNode, PropertyNode,
    RuntimeEnumDeclarationNode, StatementNode, TemplateNode,
};
use super::collector::SymbolCollector;
use super::naming::{to_kysely_camel_case, Singularizer};
use super::symbols::{IdentifierStyle, SymbolCollection, SymbolNode};
use crate::parser::{ColumnMetadata, DatabaseMetadata, TableMetadata};

/// Name of the aggregate interface listing every table
pub const DB_INTERFACE_NAME: &str = "DB";

/// How enums are emitted when they are generated as runtime values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeEnumStyle {
    PascalCase,
    ScreamingSnakeCase,
}

impl RuntimeEnumStyle {
    pub fn identifier_style(self) -> IdentifierStyle {
        match self {
            RuntimeEnumStyle::PascalCase => IdentifierStyle::KyselyPascalCase,
            RuntimeEnumStyle::ScreamingSnakeCase => IdentifierStyle::ScreamingSnakeCase,
        }
    }
}

/// A user-provided column type that replaces the inferred one entirely
#[derive(Debug, Clone, PartialEq)]
pub enum Override {
    /// Type text emitted verbatim
    Raw(String),
    Node(ExpressionNode),
}

/// Type overrides keyed by `table.column` or `schema.table.column`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub columns: BTreeMap<String, Override>,
}

/// Options driving a single transformation
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// camelCase table identifiers and column keys
    pub camel_case: bool,
    /// Replaces the adapter's default schemas when set
    pub default_schemas: Option<Vec<String>>,
    pub overrides: Overrides,
    /// Local name -> `module` or `module#ExportedName`
    pub custom_imports: BTreeMap<String, String>,
    /// Lower-cased data type -> type text
    pub type_mapping: BTreeMap<String, String>,
    pub runtime_enums: Option<RuntimeEnumStyle>,
    /// Singularize table interface names
    pub singularizer: Option<Singularizer>,
}

/// Symbol id of a table interface; kept apart from type ids so a table never
/// shadows a definition, import or enum of the same name.
fn table_symbol_id(identifier: &str) -> String {
    format!("table:{}", identifier)
}

/// Symbol id of an enum type (`status` or `schema.status`)
fn enum_symbol_id(type_id: &str) -> String {
    format!("enum:{}", type_id)
}

/// Parse a custom import spec (`module` or `module#ExportedName`)
pub fn parse_custom_import(local_name: &str, spec: &str) -> ModuleReferenceNode {
    match spec.rsplit_once('#') {
        Some((module, export)) if export != local_name => {
            ModuleReferenceNode::with_source_name(module, export)
        }
        Some((module, _)) => ModuleReferenceNode::new(module),
        None => ModuleReferenceNode::new(spec),
    }
}

/// Transform introspected metadata into the ordered statement list:
/// imports, runtime enums, definitions, table interfaces, then `DB`.
pub fn transform(
    metadata: &DatabaseMetadata,
    adapter: &Adapter,
    options: &TransformOptions,
) -> Vec<StatementNode> {
    Transformer::new(metadata, adapter, options).run()
}

struct Transformer<'a> {
    metadata: &'a DatabaseMetadata,
    adapter: &'a Adapter,
    options: &'a TransformOptions,
    definitions: BTreeMap<String, Definition>,
    imports: BTreeMap<String, ModuleReferenceNode>,
    default_schemas: Vec<String>,
    symbols: SymbolCollection,
}

impl<'a> Transformer<'a> {
    fn new(
        metadata: &'a DatabaseMetadata,
        adapter: &'a Adapter,
        options: &'a TransformOptions,
    ) -> Self {
        let mut definitions = global_definitions();
        definitions.extend(adapter.definitions.clone());

        let mut imports = global_imports();
        imports.extend(adapter.imports.clone());
        for (name, spec) in &options.custom_imports {
            imports.insert(name.clone(), parse_custom_import(name, spec));
        }

        let default_schemas = options
            .default_schemas
            .clone()
            .unwrap_or_else(|| adapter.default_schemas.clone());

        Self {
            metadata,
            adapter,
            options,
            definitions,
            imports,
            default_schemas,
            symbols: SymbolCollection::default(),
        }
    }

    fn run(mut self) -> Vec<StatementNode> {
        let metadata = self.metadata;
        let mut tables: Vec<&TableMetadata> = metadata.tables.iter().collect();
        tables.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        info!("Transforming {} tables", tables.len());

        let mut interfaces: Vec<InterfaceDeclarationNode> = tables
            .iter()
            .map(|table| self.transform_table(table))
            .collect();
        // Display names are final once every column has been collected
        for interface in &mut interfaces {
            for property in &mut interface.body.properties {
                property.value = self.resolve(&property.value, &[]);
            }
        }
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));

        let database = self.transform_database(&tables);
        let (imports, runtime_enums, definitions) = self.collect_declarations();
        debug!(
            "Emitting {} imports, {} runtime enums, {} definitions",
            imports.len(),
            runtime_enums.len(),
            definitions.len()
        );

        let mut statements: Vec<StatementNode> =
            imports.into_iter().map(StatementNode::Import).collect();
        statements.extend(
            runtime_enums
                .into_iter()
                .map(|node| StatementNode::Export(DeclarationNode::RuntimeEnum(node))),
        );
        statements.extend(
            definitions
                .into_iter()
                .map(|node| StatementNode::Export(DeclarationNode::Alias(node))),
        );
        statements.extend(
            interfaces
                .into_iter()
                .map(|node| StatementNode::Export(DeclarationNode::Interface(node))),
        );
        statements.push(StatementNode::Export(DeclarationNode::Interface(database)));
        statements
    }

    fn is_default_schema(&self, schema: &str) -> bool {
        self.default_schemas.iter().any(|s| s == schema)
    }

    fn transform_name(&self, name: &str) -> String {
        if self.options.camel_case {
            to_kysely_camel_case(name)
        } else {
            name.to_string()
        }
    }

    /// `schema.name` for tables outside the default schemas, otherwise `name`
    fn raw_table_identifier(&self, table: &TableMetadata) -> String {
        match &table.schema {
            Some(schema) if !self.is_default_schema(schema) => {
                format!("{}.{}", schema, table.name)
            }
            _ => table.name.clone(),
        }
    }

    fn table_identifier(&self, table: &TableMetadata) -> String {
        self.transform_name(&self.raw_table_identifier(table))
    }

    fn collect_symbols(&mut self, node: &ExpressionNode) {
        SymbolCollector::new(&self.definitions, &self.imports).collect(node, &mut self.symbols);
    }

    fn collect_symbol(&mut self, name: &str) {
        SymbolCollector::new(&self.definitions, &self.imports)
            .collect_symbol(name, &mut self.symbols);
    }

    fn transform_table(&mut self, table: &TableMetadata) -> InterfaceDeclarationNode {
        let identifier = self.table_identifier(table);
        let source = match &self.options.singularizer {
            Some(singularizer) => singularizer.singularize(&identifier),
            None => identifier.clone(),
        };
        let name = self.symbols.set_with_source(
            &table_symbol_id(&identifier),
            &source,
            SymbolNode::Table,
        );
        debug!("Table {} -> interface {}", table.qualified_name(), name);

        let mut properties = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let value = match self.find_override(table, column) {
                Some(Override::Raw(code)) => {
                    let node = ExpressionNode::raw(code.clone());
                    self.collect_symbols(&node);
                    node
                }
                Some(Override::Node(node)) => {
                    let node = node.clone();
                    self.collect_symbols(&node);
                    node
                }
                None => self.transform_column(column),
            };
            properties.push(
                PropertyNode::new(self.transform_name(&column.name), value)
                    .with_comment(column.comment.clone()),
            );
        }

        InterfaceDeclarationNode {
            name,
            body: ObjectExpressionNode { properties },
        }
    }

    /// `table.column` first; tables in a default schema may also be keyed by
    /// `schema.table.column`.
    fn find_override(&self, table: &TableMetadata, column: &ColumnMetadata) -> Option<&'a Override> {
        let options = self.options;
        let columns = &options.overrides.columns;
        let key = format!("{}.{}", self.raw_table_identifier(table), column.name);
        if let Some(found) = columns.get(&key) {
            return Some(found);
        }
        match &table.schema {
            Some(schema) if self.is_default_schema(schema) => {
                columns.get(&format!("{}.{}.{}", schema, table.name, column.name))
            }
            _ => None,
        }
    }

    fn transform_column(&mut self, column: &ColumnMetadata) -> ExpressionNode {
        let mut args = self.transform_column_to_args(column);

        if column.is_array {
            let element = ExpressionNode::unionize(args);
            args = if element.is_simple_identifier() {
                vec![ExpressionNode::array(element)]
            } else {
                vec![ExpressionNode::generic("ArrayType", vec![element])]
            };
        }

        if column.is_nullable {
            args.push(ExpressionNode::identifier("null"));
        }

        let mut node = ExpressionNode::unionize(args);
        if column.has_default_value || column.is_auto_incrementing {
            node = ExpressionNode::generic("Generated", vec![node]);
        }

        self.collect_symbols(&node);
        node
    }

    fn transform_column_to_args(&mut self, column: &ColumnMetadata) -> Vec<ExpressionNode> {
        let options = self.options;
        let data_type = column.data_type.to_lowercase();

        if let Some(mapped) = options.type_mapping.get(&data_type) {
            if self.is_known_type(column, &data_type) {
                if let Some((namespace, _)) = mapped.split_once('.') {
                    self.collect_symbol(namespace);
                }
                return vec![ExpressionNode::raw(mapped.clone())];
            }
            warn!(
                "Ignoring type mapping for unknown data type '{}' (column {})",
                data_type, column.name
            );
        }

        if let Some(scalar) = self.adapter.scalars.get(&data_type) {
            return vec![scalar.clone()];
        }

        let symbol_id = self.type_symbol_id(column, &data_type);

        if let Some(labels) = self.find_enum(column, &data_type) {
            let enum_id = enum_symbol_id(&symbol_id);
            let symbol = match options.runtime_enums {
                Some(style) => SymbolNode::RuntimeEnumDefinition(RuntimeEnumDeclarationNode::new(
                    symbol_id.clone(),
                    &labels,
                    style.identifier_style(),
                )),
                None => SymbolNode::Definition(Definition::Expression(ExpressionNode::unionize(
                    labels.into_iter().map(ExpressionNode::string_literal).collect(),
                ))),
            };
            self.symbols.set_with_source(&enum_id, &symbol_id, symbol);
            return vec![ExpressionNode::identifier(enum_id)];
        }

        if self.symbols.has(&symbol_id) {
            return vec![ExpressionNode::identifier(symbol_id)];
        }

        if let Some(values) = &column.enum_values {
            return values
                .iter()
                .map(|value| ExpressionNode::string_literal(value.clone()))
                .collect();
        }

        warn!(
            "Unknown data type '{}' for column {}, using default scalar",
            data_type, column.name
        );
        vec![self.adapter.default_scalar.clone()]
    }

    /// Symbol id for a custom type: bare when its schema is a default schema
    fn type_symbol_id(&self, column: &ColumnMetadata, data_type: &str) -> String {
        match &column.data_type_schema {
            Some(schema) if !self.is_default_schema(schema) => {
                format!("{}.{}", schema, data_type)
            }
            _ => data_type.to_string(),
        }
    }

    /// Labels of the enum `data_type` refers to, looked up under its own
    /// schema or, when unqualified, under each default schema.
    fn find_enum(&self, column: &ColumnMetadata, data_type: &str) -> Option<Vec<String>> {
        let enums = &self.metadata.enums;
        match &column.data_type_schema {
            Some(schema) => enums.get(&format!("{}.{}", schema, data_type)),
            None => self
                .default_schemas
                .iter()
                .find_map(|schema| enums.get(&format!("{}.{}", schema, data_type)))
                .or_else(|| enums.get(data_type)),
        }
    }

    fn is_known_type(&self, column: &ColumnMetadata, data_type: &str) -> bool {
        self.adapter.scalars.contains_key(data_type)
            || self.find_enum(column, data_type).is_some()
            || self.adapter.is_range_type(data_type)
    }

    fn transform_database(&self, tables: &[&TableMetadata]) -> InterfaceDeclarationNode {
        let mut properties: BTreeMap<String, PropertyNode> = BTreeMap::new();
        for table in tables {
            let identifier = self.table_identifier(table);
            if let Some(name) = self.symbols.get_name(&table_symbol_id(&identifier)) {
                let value = ExpressionNode::table_identifier(name);
                properties.insert(identifier.clone(), PropertyNode::new(identifier, value));
            }
        }

        InterfaceDeclarationNode {
            name: DB_INTERFACE_NAME.to_string(),
            body: ObjectExpressionNode {
                properties: properties.into_values().collect(),
            },
        }
    }

    /// Display name of a referenced symbol; tables and unknown names are kept
    fn resolve_name(&self, name: &str, params: &[String]) -> Option<&str> {
        if params.iter().any(|param| param == name) {
            return None;
        }
        match self.symbols.get(name)? {
            SymbolNode::Definition(_)
            | SymbolNode::ModuleReference(_)
            | SymbolNode::RuntimeEnumDefinition(_) => self.symbols.get_name(name),
            SymbolNode::RuntimeEnumMember | SymbolNode::Table => None,
        }
    }

    /// Rewrite symbol ids in `node` to their display names. `params` are
    /// template parameters, which are never symbols.
    fn resolve(&self, node: &ExpressionNode, params: &[String]) -> ExpressionNode {
        match node {
            ExpressionNode::Identifier(identifier) if !identifier.is_table_identifier => {
                match self.resolve_name(&identifier.name, params) {
                    Some(name) => ExpressionNode::Identifier(IdentifierNode {
                        name: name.to_string(),
                        is_table_identifier: false,
                    }),
                    None => node.clone(),
                }
            }
            ExpressionNode::Array(element) => ExpressionNode::array(self.resolve(element, params)),
            ExpressionNode::Union(args) => ExpressionNode::Union(
                args.iter().map(|arg| self.resolve(arg, params)).collect(),
            ),
            ExpressionNode::Object(object) => ExpressionNode::Object(ObjectExpressionNode {
                properties: object
                    .properties
                    .iter()
                    .map(|property| PropertyNode {
                        key: property.key.clone(),
                        value: self.resolve(&property.value, params),
                        comment: property.comment.clone(),
                    })
                    .collect(),
            }),
            ExpressionNode::Generic(generic) => ExpressionNode::Generic(GenericExpressionNode {
                name: self
                    .resolve_name(&generic.name, params)
                    .unwrap_or(generic.name.as_str())
                    .to_string(),
                args: generic
                    .args
                    .iter()
                    .map(|arg| self.resolve(arg, params))
                    .collect(),
            }),
            ExpressionNode::Extends(clause) => ExpressionNode::Extends(ExtendsClauseNode {
                check_type: self.resolve_text(&clause.check_type, params),
                extends_type: Box::new(self.resolve(&clause.extends_type, params)),
                true_type: Box::new(self.resolve(&clause.true_type, params)),
                false_type: Box::new(self.resolve(&clause.false_type, params)),
            }),
            ExpressionNode::Raw(code) => ExpressionNode::Raw(self.resolve_text(code, params)),
            ExpressionNode::Identifier(_)
            | ExpressionNode::Literal(_)
            | ExpressionNode::Infer(_)
            | ExpressionNode::ModuleReference(_) => node.clone(),
        }
    }

    /// Rewrite identifier tokens of type text; members after a `.` are kept
    fn resolve_text(&self, text: &str, params: &[String]) -> String {
        let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(is_word) {
            let (before, tail) = rest.split_at(start);
            out.push_str(before);
            let end = tail.find(|c: char| !is_word(c)).unwrap_or(tail.len());
            let (word, after) = tail.split_at(end);
            let qualified = out.ends_with('.');
            match self.resolve_name(word, params) {
                Some(name) if !qualified => out.push_str(name),
                _ => out.push_str(word),
            }
            rest = after;
        }
        out.push_str(rest);
        out
    }

    fn resolve_definition(&self, definition: &Definition) -> Definition {
        match definition {
            Definition::Expression(node) => Definition::Expression(self.resolve(node, &[])),
            Definition::Template(template) => Definition::Template(TemplateNode {
                params: template.params.clone(),
                expression: self.resolve(&template.expression, &template.params),
            }),
        }
    }

    fn collect_declarations(
        &self,
    ) -> (
        Vec<ImportStatementNode>,
        Vec<RuntimeEnumDeclarationNode>,
        Vec<AliasDeclarationNode>,
    ) {
        let mut modules: BTreeMap<String, Vec<ImportClauseNode>> = BTreeMap::new();
        let mut runtime_enums = Vec::new();
        let mut definitions = Vec::new();

        for entry in self.symbols.entries() {
            match entry.symbol {
                SymbolNode::Definition(body) => definitions.push(AliasDeclarationNode {
                    name: entry.name.to_string(),
                    body: self.resolve_definition(body),
                }),
                SymbolNode::RuntimeEnumDefinition(node) => {
                    runtime_enums.push(RuntimeEnumDeclarationNode {
                        name: entry.name.to_string(),
                        members: node.members.clone(),
                    })
                }
                SymbolNode::ModuleReference(reference) => {
                    // Imported under its display name, which differs from the
                    // export when renamed or when a table took the name
                    let name = reference.source_name.as_deref().unwrap_or(entry.id);
                    let clause = ImportClauseNode {
                        name: name.to_string(),
                        alias: (name != entry.name).then(|| entry.name.to_string()),
                    };
                    modules
                        .entry(reference.name.clone())
                        .or_default()
                        .push(clause);
                }
                SymbolNode::RuntimeEnumMember | SymbolNode::Table => {}
            }
        }

        runtime_enums.sort_by(|a, b| a.name.cmp(&b.name));
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        let imports = modules
            .into_iter()
            .map(|(module_name, clauses)| ImportStatementNode {
                module_name,
                clauses,
            })
            .collect();

        (imports, runtime_enums, definitions)
    }
}
