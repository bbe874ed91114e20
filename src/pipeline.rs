// src/pipeline.rs

use anyhow::{Context, Result};
use std::{collections::BTreeSet, fmt, path::PathBuf};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::MergeError;
use crate::merge::{self, MergedRecord, SourceStats, SourceTable, Table};

/// The joined rows of one pipeline, ready to serialize.
#[derive(Debug, Clone)]
pub struct Merged {
    pub headers: Vec<String>,
    pub records: Vec<MergedRecord>,
    /// Primary first, then secondaries.
    pub sources: Vec<SourceStats>,
}

/// What a successful run produced. Printed by the binaries.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub pipeline: String,
    pub output: PathBuf,
    pub rows: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub year_count: usize,
    pub sources: Vec<SourceStats>,
}

impl RunSummary {
    fn new(config: &PipelineConfig, merged: &Merged) -> Self {
        let years: BTreeSet<i32> = merged.records.iter().map(|r| r.key.year).collect();
        Self {
            pipeline: config.name.clone(),
            output: config.output.clone(),
            rows: merged.records.len(),
            first_year: years.iter().next().copied(),
            last_year: years.iter().next_back().copied(),
            year_count: years.len(),
            sources: merged.sources.clone(),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Saved: {}", self.output.display())?;
        for s in &self.sources {
            writeln!(f, "  {}", s)?;
        }
        write!(f, "Rows: {}", self.rows)?;
        if let (Some(a), Some(b)) = (self.first_year, self.last_year) {
            write!(f, "\nYears: {} to {} ({} years)", a, b, self.year_count)?;
        }
        Ok(())
    }
}

/// Join in-memory tables according to `config`. No filesystem access.
///
/// `secondaries` must line up with `config.secondaries`.
pub fn merge_tables(
    config: &PipelineConfig,
    primary: &Table,
    secondaries: &[Table],
) -> Result<Merged, MergeError> {
    config.validate()?;
    if secondaries.len() != config.secondaries.len() {
        return Err(MergeError::TableCount {
            pipeline: config.name.clone(),
            expected: config.secondaries.len() + 1,
            actual: secondaries.len() + 1,
        });
    }

    let primary = SourceTable::from_table(primary, &config.primary)?;
    let secondaries = secondaries
        .iter()
        .zip(&config.secondaries)
        .map(|(t, c)| SourceTable::from_table(t, c))
        .collect::<Result<Vec<_>, _>>()?;
    let widths: Vec<usize> = config.secondaries.iter().map(|c| c.metrics.len()).collect();

    let records = merge::join(config.join, &primary, &secondaries, &widths);

    let mut sources = vec![primary.stats];
    sources.extend(secondaries.into_iter().map(|s| s.stats));

    Ok(Merged {
        headers: config.output_headers(),
        records,
        sources,
    })
}

/// Read every input, join, then write the output in one step.
/// Inputs are fully read before anything is written.
#[tracing::instrument(level = "info", skip(config), fields(pipeline = %config.name))]
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    config
        .validate()
        .with_context(|| format!("invalid pipeline `{}`", config.name))?;

    let primary = merge::read_table(&config.primary.path)
        .with_context(|| format!("loading primary source `{}`", config.primary.name))?;
    let secondaries = config
        .secondaries
        .iter()
        .map(|s| {
            merge::read_table(&s.path).with_context(|| format!("loading source `{}`", s.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let merged = merge_tables(config, &primary, &secondaries)
        .with_context(|| format!("merging pipeline `{}`", config.name))?;
    if merged.records.is_empty() {
        warn!("join produced no rows");
    }

    merge::write_output(&config.output, &merged.headers, &merged.records)?;

    let summary = RunSummary::new(config, &merged);
    info!(
        rows = summary.rows,
        first_year = ?summary.first_year,
        last_year = ?summary.last_year,
        "pipeline done"
    );
    Ok(summary)
}
