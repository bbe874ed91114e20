// src/config/mod.rs

pub mod presets;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::MergeError;

/// How the primary source is combined with its secondaries. Chosen once per pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// Keep only keys present in every source.
    Inner,
    /// Keep every valid primary row; unmatched secondaries become missing values.
    LeftEnrich,
}

/// Where a metric's values come from in its source file.
///
/// In YAML this is a plain string: `first_unreserved`, `last_unreserved`,
/// or anything else as an explicit column name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ValueColumn {
    /// First header that is not in the reserved set.
    FirstUnreserved,
    /// Last header that is not in the reserved set.
    LastUnreserved,
    /// An explicit header; exact match preferred, then case-insensitive.
    Named(String),
}

impl From<String> for ValueColumn {
    fn from(s: String) -> Self {
        match s.trim() {
            "first_unreserved" => ValueColumn::FirstUnreserved,
            "last_unreserved" => ValueColumn::LastUnreserved,
            _ => ValueColumn::Named(s),
        }
    }
}

impl ValueColumn {
    pub fn named(name: impl Into<String>) -> Self {
        ValueColumn::Named(name.into())
    }
}

/// Structural header names that are never picked as a value column.
/// Stored lowercase; membership checks are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct ReservedColumns(BTreeSet<String>);

impl From<Vec<String>> for ReservedColumns {
    fn from(names: Vec<String>) -> Self {
        ReservedColumns::new(names)
    }
}

impl Default for ReservedColumns {
    fn default() -> Self {
        ReservedColumns::owid()
    }
}

impl ReservedColumns {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ReservedColumns(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .collect(),
        )
    }

    /// `{entity, code, year, owid_region}`
    pub fn owid() -> Self {
        ReservedColumns::new(["entity", "code", "year", "owid_region"])
    }

    /// The OWID set plus `country`, as used for the World Bank GDP export.
    pub fn owid_with_country() -> Self {
        ReservedColumns::new(["entity", "code", "year", "owid_region", "country"])
    }

    pub fn contains(&self, header: &str) -> bool {
        self.0.contains(&header.trim().to_lowercase())
    }
}

/// One output metric: the output header and where to read it from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetricColumn {
    pub output: String,
    pub column: ValueColumn,
}

impl MetricColumn {
    pub fn new(output: impl Into<String>, column: ValueColumn) -> Self {
        Self {
            output: output.into(),
            column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Used in logs and error messages.
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub reserved: ReservedColumns,
    pub metrics: Vec<MetricColumn>,
    /// Drop rows where any metric fails to parse instead of carrying a missing marker.
    #[serde(default)]
    pub skip_missing_values: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub join: JoinMode,
    pub primary: SourceConfig,
    pub secondaries: Vec<SourceConfig>,
    pub output: PathBuf,
}

impl PipelineConfig {
    /// Checks the parts of the config that do not depend on file contents.
    pub fn validate(&self) -> Result<(), MergeError> {
        if self.secondaries.is_empty() {
            return Err(MergeError::NoSecondarySources(self.name.clone()));
        }
        for source in self.sources() {
            if source.metrics.is_empty() {
                return Err(MergeError::NoMetrics {
                    source_name: source.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Primary first, then secondaries in configured order.
    pub fn sources(&self) -> impl Iterator<Item = &SourceConfig> {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }

    /// `Entity, Code, Year`, then every source's metric outputs in order.
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = ["Entity", "Code", "Year"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for source in self.sources() {
            headers.extend(source.metrics.iter().map(|m| m.output.clone()));
        }
        headers
    }
}

pub const DATA_DIR_ENV: &str = "MOBILITY_DATA_DIR";
pub const PIPELINES_ENV: &str = "MOBILITY_PIPELINES";

/// Base directory for the built-in pipelines: `$MOBILITY_DATA_DIR` or `data`.
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Pipelines from `$MOBILITY_PIPELINES` if set, otherwise every built-in preset.
pub fn configured_pipelines() -> Result<Vec<PipelineConfig>> {
    match std::env::var_os(PIPELINES_ENV) {
        Some(path) => load_pipelines(PathBuf::from(path)),
        None => Ok(presets::all(&data_dir())),
    }
}

/// Load a YAML list of pipelines, validating each one.
pub fn load_pipelines<P: AsRef<Path>>(path: P) -> Result<Vec<PipelineConfig>> {
    let path = path.as_ref();
    let text =
        fs::read_to_string(path).with_context(|| format!("reading pipeline config {:?}", path))?;
    let pipelines: Vec<PipelineConfig> =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {:?}", path))?;
    for p in &pipelines {
        p.validate()
            .with_context(|| format!("invalid pipeline `{}` in {:?}", p.name, path))?;
    }
    debug!(count = pipelines.len(), "loaded pipelines from {:?}", path);
    Ok(pipelines)
}
