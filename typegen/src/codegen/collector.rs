//! Reachability pass registering the definitions and imports an expression uses

use std::collections::BTreeMap;

use super::ast::{Definition, ExpressionNode, ModuleReferenceNode};
use super::symbols::{SymbolCollection, SymbolNode};

/// Walks expression trees and registers every named definition or import they
/// reach, transitively. Only freshly registered definitions are walked, which
/// bounds the walk to the reachable closure even for self-referencing helpers.
pub struct SymbolCollector<'a> {
    definitions: &'a BTreeMap<String, Definition>,
    imports: &'a BTreeMap<String, ModuleReferenceNode>,
}

impl<'a> SymbolCollector<'a> {
    pub fn new(
        definitions: &'a BTreeMap<String, Definition>,
        imports: &'a BTreeMap<String, ModuleReferenceNode>,
    ) -> Self {
        Self {
            definitions,
            imports,
        }
    }

    /// Register the symbol named `name` if it is a known definition or import
    pub fn collect_symbol(&self, name: &str, symbols: &mut SymbolCollection) {
        if let Some(definition) = self.definitions.get(name) {
            if symbols.has(name) {
                return;
            }
            symbols.set(name, SymbolNode::Definition(definition.clone()));
            self.collect_definition(definition, symbols);
            return;
        }

        if let Some(reference) = self.imports.get(name) {
            if symbols.has(name) {
                return;
            }
            symbols.set(name, SymbolNode::ModuleReference(reference.clone()));
        }
    }

    pub fn collect_definition(&self, definition: &Definition, symbols: &mut SymbolCollection) {
        match definition {
            Definition::Expression(node) => self.collect(node, symbols),
            Definition::Template(template) => self.collect(&template.expression, symbols),
        }
    }

    pub fn collect(&self, node: &ExpressionNode, symbols: &mut SymbolCollection) {
        match node {
            ExpressionNode::Array(element) => self.collect(element, symbols),
            ExpressionNode::Extends(clause) => {
                self.collect(&clause.extends_type, symbols);
                self.collect(&clause.true_type, symbols);
                self.collect(&clause.false_type, symbols);
            }
            ExpressionNode::Generic(generic) => {
                self.collect_symbol(&generic.name, symbols);
                for arg in &generic.args {
                    self.collect(arg, symbols);
                }
            }
            ExpressionNode::Identifier(identifier) => {
                self.collect_symbol(&identifier.name, symbols);
            }
            ExpressionNode::Object(object) => {
                for property in &object.properties {
                    self.collect(&property.value, symbols);
                }
            }
            ExpressionNode::Raw(code) => self.collect_symbol(code, symbols),
            ExpressionNode::Union(args) => {
                for arg in args {
                    self.collect(arg, symbols);
                }
            }
            ExpressionNode::Infer(_)
            | ExpressionNode::Literal(_)
            | ExpressionNode::ModuleReference(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::ast::TemplateNode;

    fn self_referencing_definitions() -> BTreeMap<String, Definition> {
        let mut definitions = BTreeMap::new();
        definitions.insert(
            "Wrapper".to_string(),
            Definition::Template(TemplateNode::new(
                &["T"],
                ExpressionNode::generic("WrapperImpl", vec![ExpressionNode::identifier("T")]),
            )),
        );
        definitions.insert(
            "WrapperImpl".to_string(),
            Definition::Template(TemplateNode::new(
                &["T"],
                ExpressionNode::extends(
                    "T",
                    ExpressionNode::array(ExpressionNode::infer("U")),
                    ExpressionNode::generic("WrapperImpl", vec![ExpressionNode::identifier("U")]),
                    ExpressionNode::generic("ColumnType", vec![ExpressionNode::identifier("T")]),
                ),
            )),
        );
        definitions.insert(
            "Unused".to_string(),
            Definition::Expression(ExpressionNode::identifier("string")),
        );
        definitions
    }

    fn imports() -> BTreeMap<String, ModuleReferenceNode> {
        let mut imports = BTreeMap::new();
        imports.insert("ColumnType".to_string(), ModuleReferenceNode::new("kysely"));
        imports.insert("Temporal".to_string(), ModuleReferenceNode::new("temporal"));
        imports
    }

    #[test]
    fn test_collects_reachable_closure_only() {
        let definitions = self_referencing_definitions();
        let imports = imports();
        let collector = SymbolCollector::new(&definitions, &imports);
        let mut symbols = SymbolCollection::default();

        let node = ExpressionNode::generic("Wrapper", vec![ExpressionNode::identifier("number")]);
        collector.collect(&node, &mut symbols);

        let ids: Vec<&str> = symbols.entries().map(|e| e.id).collect();
        assert_eq!(ids, vec!["ColumnType", "Wrapper", "WrapperImpl"]);
        assert!(matches!(
            symbols.get("ColumnType"),
            Some(SymbolNode::ModuleReference(_))
        ));
    }

    #[test]
    fn test_raw_expression_registers_its_text() {
        let definitions = BTreeMap::new();
        let imports = imports();
        let collector = SymbolCollector::new(&definitions, &imports);
        let mut symbols = SymbolCollection::default();

        collector.collect(&ExpressionNode::raw("Temporal"), &mut symbols);
        collector.collect(&ExpressionNode::raw("string | null"), &mut symbols);

        assert!(symbols.has("Temporal"));
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn test_infer_and_check_types_are_ignored() {
        let definitions = self_referencing_definitions();
        let imports = imports();
        let collector = SymbolCollector::new(&definitions, &imports);
        let mut symbols = SymbolCollection::default();

        let node = ExpressionNode::extends(
            "Unused",
            ExpressionNode::infer("Wrapper"),
            ExpressionNode::identifier("string"),
            ExpressionNode::identifier("number"),
        );
        collector.collect(&node, &mut symbols);

        assert!(symbols.is_empty());
    }
}
