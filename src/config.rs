//! Loading of the schema registry and compiler settings from a JSON file.

use crate::error::ConfigError;
use crate::schema::StaticSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// How much `ExpressionColumn.expression` is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionPolicy {
    /// Emitted verbatim. For dashboard components authored by admins.
    #[default]
    Trusted,
    /// Tokenized and checked against the column universe and a function
    /// whitelist. For ad-hoc queries from end users.
    Validated,
}

/// Compile-time bounds on a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// LIMIT used when the query does not give one.
    pub default_limit: u64,
    /// Hard ceiling; larger limits are clamped.
    pub max_limit: u64,
    pub max_filter_depth: usize,
    /// Maximum entries in one filter group.
    pub max_group_conditions: usize,
    pub expression_policy: ExpressionPolicy,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_limit: 1000,
            max_limit: 10_000,
            max_filter_depth: 10,
            max_group_conditions: 100,
            expression_policy: ExpressionPolicy::Trusted,
        }
    }
}

/// Contents of a schema file:
///
/// ```json
/// {
///   "tables": { "Referenda": ["id", { "name": "amount", "type": "real" }] },
///   "compiler": { "default_limit": 500 }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub tables: StaticSchema,
    #[serde(default)]
    pub compiler: CompilerConfig,
}

impl SchemaConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let shown = path_ref.display().to_string();

        if !path_ref.exists() {
            return Err(ConfigError::NotFound(shown));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Unreadable {
            path: shown.clone(),
            source,
        })?;

        let config = Self::from_json_str(&content).map_err(|source| ConfigError::Malformed {
            path: shown.clone(),
            source,
        })?;

        info!(path = %shown, tables = config.tables.len(), "loaded schema config");
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
