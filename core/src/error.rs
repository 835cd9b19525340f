use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Recoverable failures surfaced to callers.
///
/// Invariant violations inside the engine are not represented here; they
/// cannot occur through the public API.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A requested start or end node is absent from the graph.
    #[error("node '{0}' not found")]
    NodeNotFound(String),

    /// No edge joins the two nodes.
    #[error("no edge {src} -> {dst}")]
    EdgeNotFound { src: String, dst: String },

    /// An algorithm that assumes acyclic input found a cycle.
    #[error("cycle detected while traversing from '{source_id}'")]
    CycleDetected { source_id: String },

    /// Ordinal indices were never assigned, or nodes were added since.
    #[error("ordinal indices are missing or stale; call assign_indices() after loading")]
    StaleIndex,

    /// A weighted edge has no weight attribute parseable as an integer.
    #[error("edge {src} -> {dst} has no integer weight")]
    InvalidWeight { src: String, dst: String },

    /// The graph is too large for an n×n matrix algorithm.
    #[error("{nodes} nodes exceeds the matrix limit of {limit}")]
    MatrixTooLarge { nodes: usize, limit: usize },

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}
