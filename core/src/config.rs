use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default attribute name holding integer edge weights.
pub const DEFAULT_WEIGHT_ATTRIBUTE: &str = "weight";

/// Largest node count Floyd-Warshall will allocate matrices for by default.
///
/// Two n×n matrices of 16-byte cells: 10k nodes is ~3.2GB.
pub const DEFAULT_MAX_MATRIX_NODES: usize = 10_000;

/// Construction-time settings for a [`Graph`](crate::Graph).
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub directed: bool,
    pub weighted: bool,
    pub weight_attribute: String,
    /// Upper bound on the node count accepted by matrix algorithms.
    pub max_matrix_nodes: usize,
}

impl GraphConfig {
    /// Parse a config from JSON, filling omitted fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            directed: true,
            weighted: false,
            weight_attribute: DEFAULT_WEIGHT_ATTRIBUTE.to_string(),
            max_matrix_nodes: DEFAULT_MAX_MATRIX_NODES,
        }
    }
}
