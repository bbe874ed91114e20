// src/error.rs

use thiserror::Error;

/// Input-shape problems that must abort a run instead of producing a misjoined file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("no value column in {source_name}: every header is reserved ({headers:?})")]
    NoValueColumn {
        source_name: String,
        headers: Vec<String>,
    },

    #[error("column `{column}` not found in {source_name} (headers: {headers:?})")]
    MissingColumn {
        source_name: String,
        column: String,
        headers: Vec<String>,
    },

    #[error("pipeline `{0}` has no secondary sources")]
    NoSecondarySources(String),

    #[error("source `{source_name}` declares no metric columns")]
    NoMetrics { source_name: String },

    #[error("pipeline `{pipeline}` expects {expected} tables, got {actual}")]
    TableCount {
        pipeline: String,
        expected: usize,
        actual: usize,
    },
}
