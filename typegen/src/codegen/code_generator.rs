//! Main code generator orchestrator

use tracing::info;

use super::adapter::Adapter;
use super::ast::StatementNode;
use super::serializer::Serializer;
use super::transformer::{transform, TransformOptions};
use crate::config::CodegenConfig;
use crate::error::Result;
use crate::parser::DatabaseMetadata;

/// Turns database metadata into declaration text for one dialect
pub struct CodeGenerator {
    adapter: Adapter,
    options: TransformOptions,
    serializer: Serializer,
}

impl CodeGenerator {
    pub fn new(adapter: Adapter, options: TransformOptions, serializer: Serializer) -> Self {
        Self {
            adapter,
            options,
            serializer,
        }
    }

    /// Create a code generator with the given configuration
    pub fn from_config(config: &CodegenConfig) -> Result<Self> {
        Ok(Self::new(
            config.adapter(),
            config.transform_options()?,
            Serializer::new(config.type_only_imports),
        ))
    }

    /// Build the statement list without rendering it
    pub fn transform(&self, metadata: &DatabaseMetadata) -> Vec<StatementNode> {
        transform(metadata, &self.adapter, &self.options)
    }

    /// Generate the declaration file contents
    pub fn generate(&self, metadata: &DatabaseMetadata) -> String {
        let statements = self.transform(metadata);
        info!(
            "Serializing {} statements for {}",
            statements.len(),
            self.adapter.kind
        );
        self.serializer.serialize(&statements)
    }
}
