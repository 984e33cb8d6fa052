//! Symbol table mapping stable ids to unique display names

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::ast::{Definition, ModuleReferenceNode, RuntimeEnumDeclarationNode};
use super::naming::{to_kysely_pascal_case, to_screaming_snake_case};

/// How display names are derived from stable ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierStyle {
    #[default]
    KyselyPascalCase,
    ScreamingSnakeCase,
}

impl IdentifierStyle {
    pub fn convert(self, value: &str) -> String {
        match self {
            IdentifierStyle::KyselyPascalCase => to_kysely_pascal_case(value),
            IdentifierStyle::ScreamingSnakeCase => to_screaming_snake_case(value),
        }
    }
}

/// Payload registered under a stable id
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolNode {
    Definition(Definition),
    ModuleReference(ModuleReferenceNode),
    /// The declaration's own name is the stable id; the emitted name is the
    /// display name this collection assigns.
    RuntimeEnumDefinition(RuntimeEnumDeclarationNode),
    RuntimeEnumMember,
    Table,
}

/// A registered symbol
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub symbol: &'a SymbolNode,
}

#[derive(Debug, Clone)]
struct Registered {
    name: String,
    symbol: SymbolNode,
}

/// Collision-free registry of output symbols.
///
/// Registration is idempotent per id, so shared definitions are emitted once
/// no matter how many columns reference them.
#[derive(Debug, Clone, Default)]
pub struct SymbolCollection {
    identifier_style: IdentifierStyle,
    symbols: BTreeMap<String, Registered>,
    names: HashSet<String>,
}

impl SymbolCollection {
    pub fn new(identifier_style: IdentifierStyle) -> Self {
        Self {
            identifier_style,
            ..Default::default()
        }
    }

    /// Register `symbol` under `id` and return its display name
    pub fn set(&mut self, id: &str, symbol: SymbolNode) -> String {
        self.set_with_source(id, id, symbol)
    }

    /// Like [`set`](Self::set), but derive the display name from `source`
    /// instead of the id (used for singularized table names).
    pub fn set_with_source(&mut self, id: &str, source: &str, symbol: SymbolNode) -> String {
        if let Some(existing) = self.symbols.get(id) {
            return existing.name.clone();
        }

        let name = self.generate_name(source);
        debug!("Registered symbol {:?} as {}", id, name);
        self.names.insert(name.clone());
        self.symbols.insert(
            id.to_string(),
            Registered {
                name: name.clone(),
                symbol,
            },
        );
        name
    }

    fn generate_name(&self, source: &str) -> String {
        let sanitized: String = source
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' || c == '$' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        let mut name = self.identifier_style.convert(&sanitized);
        if name.is_empty() {
            name.push('_');
        }

        if self.names.contains(&name) {
            let mut suffix = 2;
            while self.names.contains(&format!("{}{}", name, suffix)) {
                suffix += 1;
            }
            name = format!("{}{}", name, suffix);
        }

        if name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        name
    }

    pub fn get(&self, id: &str) -> Option<&SymbolNode> {
        self.symbols.get(id).map(|r| &r.symbol)
    }

    pub fn get_name(&self, id: &str) -> Option<&str> {
        self.symbols.get(id).map(|r| r.name.as_str())
    }

    pub fn has(&self, id: &str) -> bool {
        self.symbols.contains_key(id)
    }

    /// All registered symbols, sorted by id
    pub fn entries(&self) -> impl Iterator<Item = SymbolEntry<'_>> {
        self.symbols.iter().map(|(id, r)| SymbolEntry {
            id,
            name: &r.name,
            symbol: &r.symbol,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_is_idempotent() {
        let mut symbols = SymbolCollection::default();
        let first = symbols.set("foo", SymbolNode::Table);
        let second = symbols.set("foo", SymbolNode::Table);

        assert_eq!(first, "Foo");
        assert_eq!(second, "Foo");
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn test_collisions_get_numeric_suffix() {
        let mut symbols = SymbolCollection::default();
        assert_eq!(symbols.set("a.b", SymbolNode::Table), "AB");
        assert_eq!(symbols.set("a_b", SymbolNode::Table), "AB2");
        assert_eq!(symbols.set("a-b", SymbolNode::Table), "AB3");
    }

    #[test]
    fn test_leading_digit_is_prefixed() {
        let mut symbols = SymbolCollection::default();
        assert_eq!(symbols.set("1st_place", SymbolNode::Table), "_1stPlace");
    }

    #[test]
    fn test_screaming_snake_case_style() {
        let mut symbols = SymbolCollection::new(IdentifierStyle::ScreamingSnakeCase);
        assert_eq!(
            symbols.set("in progress", SymbolNode::RuntimeEnumMember),
            "IN_PROGRESS"
        );
        assert_eq!(
            symbols.set("inProgress", SymbolNode::RuntimeEnumMember),
            "IN_PROGRESS2"
        );
    }

    #[test]
    fn test_entries_are_sorted_by_id() {
        let mut symbols = SymbolCollection::default();
        symbols.set("zebra", SymbolNode::Table);
        symbols.set("apple", SymbolNode::Table);
        symbols.set("mango", SymbolNode::Table);

        let ids: Vec<&str> = symbols.entries().map(|e| e.id).collect();
        assert_eq!(ids, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_lookups() {
        let mut symbols = SymbolCollection::default();
        symbols.set_with_source("users", "user", SymbolNode::Table);

        assert!(symbols.has("users"));
        assert!(!symbols.has("user"));
        assert_eq!(symbols.get_name("users"), Some("User"));
        assert_eq!(symbols.get("users"), Some(&SymbolNode::Table));
        assert_eq!(symbols.get("missing"), None);
    }
}
