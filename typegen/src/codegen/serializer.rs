//! Renders the statement list as TypeScript declaration text

use super::ast::{
    AliasDeclarationNode, DeclarationNode, Definition, ExpressionNode, ImportStatementNode,
    InterfaceDeclarationNode, LiteralNode, ObjectExpressionNode, PropertyNode,
    RuntimeEnumDeclarationNode, StatementNode,
};
use super::naming::is_valid_identifier;

/// Banner placed at the top of every generated file
pub const HEADER: &str = "/**\n * This file was generated by typegen.\n * Please do not edit it manually.\n */\n";

const INDENT: &str = "  ";

/// Stateless renderer; identical statements always produce identical text
#[derive(Debug, Clone)]
pub struct Serializer {
    type_only_imports: bool,
}

impl Default for Serializer {
    fn default() -> Self {
        Self {
            type_only_imports: true,
        }
    }
}

impl Serializer {
    pub fn new(type_only_imports: bool) -> Self {
        Self { type_only_imports }
    }

    /// Render a full file: header, import block, then one export per
    /// paragraph.
    pub fn serialize(&self, statements: &[StatementNode]) -> String {
        let mut out = String::from(HEADER);
        let mut in_imports = false;

        for statement in statements {
            match statement {
                StatementNode::Import(node) => {
                    if !in_imports {
                        out.push('\n');
                        in_imports = true;
                    }
                    out.push_str(&self.serialize_import(node));
                    out.push('\n');
                }
                StatementNode::Export(node) => {
                    in_imports = false;
                    out.push('\n');
                    out.push_str("export ");
                    out.push_str(&self.serialize_declaration(node));
                    out.push('\n');
                }
            }
        }

        out
    }

    fn serialize_import(&self, node: &ImportStatementNode) -> String {
        let clauses: Vec<String> = node
            .clauses
            .iter()
            .map(|clause| match &clause.alias {
                Some(alias) => format!("{} as {}", clause.name, alias),
                None => clause.name.clone(),
            })
            .collect();
        let keyword = if self.type_only_imports {
            "import type"
        } else {
            "import"
        };
        format!(
            "{} {{ {} }} from {};",
            keyword,
            clauses.join(", "),
            quote(&node.module_name)
        )
    }

    pub fn serialize_declaration(&self, node: &DeclarationNode) -> String {
        match node {
            DeclarationNode::Alias(alias) => self.serialize_alias(alias),
            DeclarationNode::Interface(interface) => self.serialize_interface(interface),
            DeclarationNode::RuntimeEnum(runtime_enum) => self.serialize_runtime_enum(runtime_enum),
        }
    }

    fn serialize_alias(&self, node: &AliasDeclarationNode) -> String {
        match &node.body {
            Definition::Expression(expression) => {
                format!("type {} = {};", node.name, self.serialize_expression(expression, 0))
            }
            Definition::Template(template) => format!(
                "type {}<{}> = {};",
                node.name,
                template.params.join(", "),
                self.serialize_expression(&template.expression, 0)
            ),
        }
    }

    fn serialize_interface(&self, node: &InterfaceDeclarationNode) -> String {
        format!(
            "interface {} {}",
            node.name,
            self.serialize_object(&node.body, 0)
        )
    }

    fn serialize_runtime_enum(&self, node: &RuntimeEnumDeclarationNode) -> String {
        let mut out = format!("enum {} {{\n", node.name);
        for member in &node.members {
            out.push_str(&format!(
                "{}{} = {},\n",
                INDENT,
                member.key,
                serialize_literal(&member.value)
            ));
        }
        out.push('}');
        out
    }

    /// Render an expression; `depth` is the indentation level of the line the
    /// expression starts on.
    pub fn serialize_expression(&self, node: &ExpressionNode, depth: usize) -> String {
        match node {
            ExpressionNode::Identifier(identifier) => identifier.name.clone(),
            ExpressionNode::Literal(literal) => serialize_literal(literal),
            ExpressionNode::Array(element) => {
                let inner = self.serialize_expression(element, depth);
                match element.as_ref() {
                    ExpressionNode::Union(_)
                    | ExpressionNode::Extends(_)
                    | ExpressionNode::Infer(_) => format!("({})[]", inner),
                    _ => format!("{}[]", inner),
                }
            }
            ExpressionNode::Union(args) => args
                .iter()
                .map(|arg| self.serialize_expression(arg, depth))
                .collect::<Vec<_>>()
                .join(" | "),
            ExpressionNode::Object(object) => self.serialize_object(object, depth),
            ExpressionNode::Generic(generic) => {
                let args: Vec<String> = generic
                    .args
                    .iter()
                    .map(|arg| self.serialize_expression(arg, depth))
                    .collect();
                format!("{}<{}>", generic.name, args.join(", "))
            }
            ExpressionNode::Infer(name) => format!("infer {}", name),
            ExpressionNode::Extends(clause) => {
                let indent = INDENT.repeat(depth + 1);
                format!(
                    "{} extends {}\n{}? {}\n{}: {}",
                    clause.check_type,
                    self.serialize_expression(&clause.extends_type, depth),
                    indent,
                    self.serialize_expression(&clause.true_type, depth + 1),
                    indent,
                    self.serialize_expression(&clause.false_type, depth + 1)
                )
            }
            ExpressionNode::ModuleReference(reference) => reference
                .source_name
                .clone()
                .unwrap_or_else(|| reference.name.clone()),
            ExpressionNode::Raw(code) => code.clone(),
        }
    }

    fn serialize_object(&self, node: &ObjectExpressionNode, depth: usize) -> String {
        if node.properties.is_empty() {
            return "{}".to_string();
        }

        let mut out = String::from("{\n");
        for property in &node.properties {
            out.push_str(&self.serialize_property(property, depth + 1));
        }
        out.push_str(&INDENT.repeat(depth));
        out.push('}');
        out
    }

    fn serialize_property(&self, node: &PropertyNode, depth: usize) -> String {
        let indent = INDENT.repeat(depth);
        let mut out = String::new();

        if let Some(comment) = &node.comment {
            out.push_str(&format!("{}/**\n", indent));
            for line in comment.replace("*/", "*\\/").lines() {
                if line.trim().is_empty() {
                    out.push_str(&format!("{} *\n", indent));
                } else {
                    out.push_str(&format!("{} * {}\n", indent, line.trim_end()));
                }
            }
            out.push_str(&format!("{} */\n", indent));
        }

        let key = if is_valid_identifier(&node.key) {
            node.key.clone()
        } else {
            quote(&node.key)
        };
        out.push_str(&format!(
            "{}{}: {};\n",
            indent,
            key,
            self.serialize_expression(&node.value, depth)
        ));
        out
    }
}

fn serialize_literal(node: &LiteralNode) -> String {
    match node {
        LiteralNode::String(value) => quote(value),
        LiteralNode::Number(value) => value.to_string(),
    }
}

/// Double-quoted, JSON-escaped string
fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::adapter::global_definitions;
    use crate::codegen::ast::{ImportClauseNode, RuntimeEnumMember};
    use pretty_assertions::assert_eq;

    fn alias(name: &str, definition: Definition) -> StatementNode {
        StatementNode::Export(DeclarationNode::Alias(AliasDeclarationNode {
            name: name.to_string(),
            body: definition,
        }))
    }

    fn id(name: &str) -> ExpressionNode {
        ExpressionNode::identifier(name)
    }

    #[test]
    fn test_serialize_file_layout() {
        let statements = vec![
            StatementNode::Import(ImportStatementNode {
                module_name: "kysely".into(),
                clauses: vec![ImportClauseNode {
                    name: "ColumnType".into(),
                    alias: None,
                }],
            }),
            alias(
                "Generated",
                global_definitions().remove("Generated").unwrap(),
            ),
            StatementNode::Export(DeclarationNode::Interface(InterfaceDeclarationNode {
                name: "Foo".into(),
                body: ObjectExpressionNode {
                    properties: vec![PropertyNode::new(
                        "id",
                        ExpressionNode::generic("Generated", vec![id("number")]),
                    )],
                },
            })),
        ];

        let expected = r#"/**
 * This file was generated by typegen.
 * Please do not edit it manually.
 */

import type { ColumnType } from "kysely";

export type Generated<T> = T extends ColumnType<infer S, infer I, infer U>
  ? ColumnType<S, I | undefined, U>
  : ColumnType<T, T | undefined, T>;

export interface Foo {
  id: Generated<number>;
}
"#;
        assert_eq!(Serializer::default().serialize(&statements), expected);
    }

    #[test]
    fn test_serialize_array_type_helpers() {
        let mut definitions = global_definitions();
        let serializer = Serializer::default();

        assert_eq!(
            serializer.serialize_declaration(&DeclarationNode::Alias(AliasDeclarationNode {
                name: "ArrayType".into(),
                body: definitions.remove("ArrayType").unwrap(),
            })),
            "type ArrayType<T> = ArrayTypeImpl<T> extends (infer U)[]\n  ? U[]\n  : ArrayTypeImpl<T>;"
        );
        assert_eq!(
            serializer.serialize_declaration(&DeclarationNode::Alias(AliasDeclarationNode {
                name: "ArrayTypeImpl".into(),
                body: definitions.remove("ArrayTypeImpl").unwrap(),
            })),
            "type ArrayTypeImpl<T> = T extends ColumnType<infer S, infer I, infer U>\n  ? ColumnType<S[], I[], U[]>\n  : T[];"
        );
    }

    #[test]
    fn test_union_inside_array_is_parenthesized() {
        let node = ExpressionNode::array(ExpressionNode::Union(vec![id("string"), id("number")]));
        assert_eq!(
            Serializer::default().serialize_expression(&node, 0),
            "(string | number)[]"
        );
    }

    #[test]
    fn test_plain_imports_and_aliases() {
        let statements = vec![StatementNode::Import(ImportStatementNode {
            module_name: "./types".into(),
            clauses: vec![
                ImportClauseNode {
                    name: "A".into(),
                    alias: None,
                },
                ImportClauseNode {
                    name: "Settings".into(),
                    alias: Some("UserSettings".into()),
                },
            ],
        })];

        let output = Serializer::new(false).serialize(&statements);
        assert!(output.ends_with("\nimport { A, Settings as UserSettings } from \"./types\";\n"));
    }

    #[test]
    fn test_interface_comments_and_quoted_keys() {
        let node = DeclarationNode::Interface(InterfaceDeclarationNode {
            name: "Events".into(),
            body: ObjectExpressionNode {
                properties: vec![
                    PropertyNode::new("created at", id("Timestamp"))
                        .with_comment(Some("When the event happened".into())),
                    PropertyNode::new("kind", ExpressionNode::Union(vec![
                        ExpressionNode::string_literal("a\"b"),
                        id("null"),
                    ])),
                ],
            },
        });

        let expected = r#"interface Events {
  /**
   * When the event happened
   */
  "created at": Timestamp;
  kind: "a\"b" | null;
}"#;
        assert_eq!(Serializer::default().serialize_declaration(&node), expected);
    }

    #[test]
    fn test_nested_object_indentation() {
        let node = DeclarationNode::Alias(AliasDeclarationNode {
            name: "Point".into(),
            body: Definition::Expression(ExpressionNode::object(vec![
                PropertyNode::new("x", id("number")),
                PropertyNode::new("y", id("number")),
            ])),
        });
        assert_eq!(
            Serializer::default().serialize_declaration(&node),
            "type Point = {\n  x: number;\n  y: number;\n};"
        );
    }

    #[test]
    fn test_runtime_enum_and_empty_interface() {
        let serializer = Serializer::default();
        let runtime_enum = DeclarationNode::RuntimeEnum(RuntimeEnumDeclarationNode {
            name: "Status".into(),
            members: vec![RuntimeEnumMember {
                key: "CONFIRMED".into(),
                value: LiteralNode::String("confirmed".into()),
            }],
        });
        assert_eq!(
            serializer.serialize_declaration(&runtime_enum),
            "enum Status {\n  CONFIRMED = \"confirmed\",\n}"
        );

        let empty = DeclarationNode::Interface(InterfaceDeclarationNode {
            name: "Empty".into(),
            body: ObjectExpressionNode::default(),
        });
        assert_eq!(serializer.serialize_declaration(&empty), "interface Empty {}");
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(serialize_literal(&LiteralNode::Number(1.0)), "1");
        assert_eq!(serialize_literal(&LiteralNode::Number(2.5)), "2.5");
    }
}
