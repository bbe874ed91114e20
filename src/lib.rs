pub mod config;
pub mod error;
pub mod merge;
pub mod pipeline;

pub use config::{JoinMode, PipelineConfig, ReservedColumns, SourceConfig, ValueColumn};
pub use error::MergeError;
pub use pipeline::{merge_tables, run, RunSummary};
