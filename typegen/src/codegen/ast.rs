//! Expression and declaration nodes for the emitted type language
//!
//! The node set is closed: every consumer (the symbol collector, the
//! serializer) matches on it exhaustively. Nodes are plain data and are never
//! mutated after construction.

use super::symbols::{IdentifierStyle, SymbolCollection, SymbolNode};

/// Identifiers that are emitted as plain TypeScript arrays (`T[]`) rather than
/// through the `ArrayType<T>` helper.
pub const SIMPLE_IDENTIFIERS: &[&str] = &["boolean", "number", "string"];

/// A type expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    Identifier(IdentifierNode),
    Literal(LiteralNode),
    Array(Box<ExpressionNode>),
    Union(Vec<ExpressionNode>),
    Object(ObjectExpressionNode),
    Generic(GenericExpressionNode),
    /// `infer U`, only meaningful inside a template body
    Infer(String),
    Extends(ExtendsClauseNode),
    ModuleReference(ModuleReferenceNode),
    /// User-supplied type text emitted verbatim
    Raw(String),
}

/// A reference to a named type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierNode {
    pub name: String,
    pub is_table_identifier: bool,
}

/// A string or number literal type
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralNode {
    String(String),
    Number(f64),
}

/// `{ key: value; ... }`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectExpressionNode {
    pub properties: Vec<PropertyNode>,
}

/// A single member of an object expression
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyNode {
    pub key: String,
    pub value: ExpressionNode,
    pub comment: Option<String>,
}

/// A parametrized type application such as `ColumnType<S, I, U>`
#[derive(Debug, Clone, PartialEq)]
pub struct GenericExpressionNode {
    pub name: String,
    pub args: Vec<ExpressionNode>,
}

/// `check extends extends_type ? true_type : false_type`
///
/// `check_type` is structural text (a template parameter or an already
/// collected generic application), so it never contributes symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendsClauseNode {
    pub check_type: String,
    pub extends_type: Box<ExpressionNode>,
    pub true_type: Box<ExpressionNode>,
    pub false_type: Box<ExpressionNode>,
}

/// An export of an external module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReferenceNode {
    /// Module specifier, e.g. `kysely` or `./types`
    pub name: String,
    /// Exported name when it differs from the local one
    pub source_name: Option<String>,
}

/// A generic type definition with formal parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateNode {
    pub params: Vec<String>,
    pub expression: ExpressionNode,
}

/// The body of a shared definition
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Expression(ExpressionNode),
    Template(TemplateNode),
}

/// `type Name = body`
#[derive(Debug, Clone, PartialEq)]
pub struct AliasDeclarationNode {
    pub name: String,
    pub body: Definition,
}

/// `interface Name { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDeclarationNode {
    pub name: String,
    pub body: ObjectExpressionNode,
}

/// One `KEY = "label"` entry of a runtime enum
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeEnumMember {
    pub key: String,
    pub value: LiteralNode,
}

/// `enum Name { KEY = "label", ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeEnumDeclarationNode {
    pub name: String,
    pub members: Vec<RuntimeEnumMember>,
}

/// A declaration that can be exported
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationNode {
    Alias(AliasDeclarationNode),
    Interface(InterfaceDeclarationNode),
    RuntimeEnum(RuntimeEnumDeclarationNode),
}

/// `{ name as alias }` inside an import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportClauseNode {
    pub name: String,
    pub alias: Option<String>,
}

/// `import { ... } from "module"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatementNode {
    pub module_name: String,
    pub clauses: Vec<ImportClauseNode>,
}

/// A top-level statement of the generated file
#[derive(Debug, Clone, PartialEq)]
pub enum StatementNode {
    Import(ImportStatementNode),
    Export(DeclarationNode),
}

impl ExpressionNode {
    pub fn identifier(name: impl Into<String>) -> Self {
        ExpressionNode::Identifier(IdentifierNode {
            name: name.into(),
            is_table_identifier: false,
        })
    }

    pub fn table_identifier(name: impl Into<String>) -> Self {
        ExpressionNode::Identifier(IdentifierNode {
            name: name.into(),
            is_table_identifier: true,
        })
    }

    pub fn string_literal(value: impl Into<String>) -> Self {
        ExpressionNode::Literal(LiteralNode::String(value.into()))
    }

    pub fn array(element: ExpressionNode) -> Self {
        ExpressionNode::Array(Box::new(element))
    }

    pub fn generic(name: impl Into<String>, args: Vec<ExpressionNode>) -> Self {
        ExpressionNode::Generic(GenericExpressionNode {
            name: name.into(),
            args,
        })
    }

    pub fn infer(name: impl Into<String>) -> Self {
        ExpressionNode::Infer(name.into())
    }

    pub fn raw(code: impl Into<String>) -> Self {
        ExpressionNode::Raw(code.into())
    }

    pub fn object(properties: Vec<PropertyNode>) -> Self {
        ExpressionNode::Object(ObjectExpressionNode { properties })
    }

    pub fn extends(
        check_type: impl Into<String>,
        extends_type: ExpressionNode,
        true_type: ExpressionNode,
        false_type: ExpressionNode,
    ) -> Self {
        ExpressionNode::Extends(ExtendsClauseNode {
            check_type: check_type.into(),
            extends_type: Box::new(extends_type),
            true_type: Box::new(true_type),
            false_type: Box::new(false_type),
        })
    }

    /// `ColumnType<select, insert, update>`
    pub fn column_type(
        select: ExpressionNode,
        insert: ExpressionNode,
        update: ExpressionNode,
    ) -> Self {
        Self::generic("ColumnType", vec![select, insert, update])
    }

    /// Collapse a list of alternatives: none → `never`, one → itself,
    /// more → a union.
    pub fn unionize(mut args: Vec<ExpressionNode>) -> Self {
        match args.len() {
            0 => Self::identifier("never"),
            1 => args.remove(0),
            _ => ExpressionNode::Union(args),
        }
    }

    /// Whether this is one of the scalar identifiers that need no
    /// `ArrayType<T>` distribution when wrapped in an array.
    pub fn is_simple_identifier(&self) -> bool {
        matches!(self, ExpressionNode::Identifier(id) if SIMPLE_IDENTIFIERS.contains(&id.name.as_str()))
    }
}

impl PropertyNode {
    pub fn new(key: impl Into<String>, value: ExpressionNode) -> Self {
        Self {
            key: key.into(),
            value,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }
}

impl ModuleReferenceNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_name: None,
        }
    }

    pub fn with_source_name(name: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_name: Some(source_name.into()),
        }
    }
}

impl TemplateNode {
    pub fn new(params: &[&str], expression: ExpressionNode) -> Self {
        Self {
            params: params.iter().map(|p| p.to_string()).collect(),
            expression,
        }
    }
}

impl RuntimeEnumDeclarationNode {
    /// Build a runtime enum whose member keys are collision-free identifiers
    /// derived from the labels in `style`.
    pub fn new(name: impl Into<String>, labels: &[String], style: IdentifierStyle) -> Self {
        let mut keys = SymbolCollection::new(style);
        let members = labels
            .iter()
            .map(|label| RuntimeEnumMember {
                key: keys.set(label, SymbolNode::RuntimeEnumMember),
                value: LiteralNode::String(label.clone()),
            })
            .collect();
        Self {
            name: name.into(),
            members,
        }
    }
}

impl DeclarationNode {
    /// Name of the declared symbol
    pub fn name(&self) -> &str {
        match self {
            DeclarationNode::Alias(node) => &node.name,
            DeclarationNode::Interface(node) => &node.name,
            DeclarationNode::RuntimeEnum(node) => &node.name,
        }
    }
}
