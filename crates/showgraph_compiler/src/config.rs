// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiler configuration.
//!
//! Settings are persisted as RON. Every field has a default, so a partial
//! file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Limits and output options for a compile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Maximum nesting of virtual filter expansion
    pub max_expansion_depth: usize,
    /// Maximum rewrites applied to a single reference
    pub max_substitution_steps: usize,
    /// Schema identification written to the document root
    pub schema: SchemaInfo,
    /// Indentation width for written documents, `None` for compact output
    pub indent: Option<usize>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_expansion_depth: 32,
            max_substitution_steps: 64,
            schema: SchemaInfo::default(),
            indent: Some(2),
        }
    }
}

/// Namespace and schema location of the show file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaInfo {
    /// XML namespace
    pub namespace: String,
    /// Schema location hint, identifying the format version
    pub schema_location: String,
}

impl Default for SchemaInfo {
    fn default() -> Self {
        Self {
            namespace: "http://www.technikradio.org/schemas/showfile".to_string(),
            schema_location: "http://www.technikradio.org/schemas/showfile showfile-v1.xsd"
                .to_string(),
        }
    }
}

impl CompilerConfig {
    /// Serialize to RON format
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&contents)?;
        tracing::debug!("Loaded compiler configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let ron_str = self.to_ron()?;
        std::fs::write(path, ron_str)?;
        Ok(())
    }
}

/// Error loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Configuration could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}
