use std::{collections::HashMap, fmt};
use tracing::{debug, info, trace};

use super::columns::{find_header, require_header, resolve_value_column, CODE, ENTITY, YEAR};
use super::key::{normalize_key, JoinKey};
use super::table::Table;
use super::value::Metric;
use crate::config::SourceConfig;
use crate::error::MergeError;

/// One valid input row after key normalization and value coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub entity: String,
    pub key: JoinKey,
    /// One entry per configured metric, in configured order.
    pub values: Vec<Metric>,
}

/// Per-source counters for the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub name: String,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub invalid_key: usize,
    pub missing_value: usize,
    /// Keys seen more than once; the later row replaced the earlier one in the lookup.
    pub overwritten: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
}

impl SourceStats {
    fn observe_year(&mut self, year: i32) {
        self.first_year = Some(self.first_year.map_or(year, |y| y.min(year)));
        self.last_year = Some(self.last_year.map_or(year, |y| y.max(year)));
    }
}

impl fmt::Display for SourceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} of {} rows kept",
            self.name, self.rows_kept, self.rows_read
        )?;
        if let (Some(a), Some(b)) = (self.first_year, self.last_year) {
            write!(f, ", years {} to {}", a, b)?;
        }
        Ok(())
    }
}

/// A source after filtering: its valid rows in input order and a key lookup.
#[derive(Debug, Clone)]
pub struct SourceTable {
    /// Every valid row, duplicates included, in input order.
    pub rows: Vec<SourceRow>,
    /// Last row per key wins.
    pub lookup: HashMap<JoinKey, SourceRow>,
    pub stats: SourceStats,
}

impl SourceTable {
    /// Resolve columns, drop rows with invalid keys, coerce metrics, build the lookup.
    ///
    /// Only column resolution can fail; bad rows are counted and skipped.
    pub fn from_table(table: &Table, config: &SourceConfig) -> Result<Self, MergeError> {
        let name = config.name.as_str();
        if config.metrics.is_empty() {
            return Err(MergeError::NoMetrics {
                source_name: name.to_string(),
            });
        }

        let code_idx = require_header(name, &table.headers, &CODE)?;
        let year_idx = require_header(name, &table.headers, &YEAR)?;
        let entity_idx = find_header(&table.headers, &ENTITY);
        let metric_idx = config
            .metrics
            .iter()
            .map(|m| resolve_value_column(name, &table.headers, &config.reserved, &m.column))
            .collect::<Result<Vec<_>, _>>()?;

        let mut stats = SourceStats {
            name: name.to_string(),
            ..Default::default()
        };
        let mut rows = Vec::with_capacity(table.len());
        let mut lookup: HashMap<JoinKey, SourceRow> = HashMap::with_capacity(table.len());

        for r in 0..table.len() {
            stats.rows_read += 1;

            let Some(key) = normalize_key(table.cell(r, code_idx), table.cell(r, year_idx)) else {
                trace!(
                    source = name,
                    code = table.cell(r, code_idx),
                    year = table.cell(r, year_idx),
                    "skipping row with invalid key"
                );
                stats.invalid_key += 1;
                continue;
            };

            let values: Vec<Metric> = metric_idx
                .iter()
                .map(|&c| Metric::parse(table.cell(r, c)))
                .collect();
            if config.skip_missing_values && values.iter().any(Metric::is_missing) {
                trace!(source = name, %key, "skipping row with missing value");
                stats.missing_value += 1;
                continue;
            }

            let entity = entity_idx
                .map(|c| table.cell(r, c).trim().to_string())
                .unwrap_or_default();

            stats.rows_kept += 1;
            stats.observe_year(key.year);

            let row = SourceRow {
                entity,
                key: key.clone(),
                values,
            };
            if lookup.insert(key, row.clone()).is_some() {
                stats.overwritten += 1;
            }
            rows.push(row);
        }

        if stats.overwritten > 0 {
            debug!(
                source = name,
                overwritten = stats.overwritten,
                "duplicate keys, later rows won"
            );
        }
        info!(
            source = name,
            read = stats.rows_read,
            kept = stats.rows_kept,
            invalid_key = stats.invalid_key,
            missing_value = stats.missing_value,
            "built lookup"
        );

        Ok(Self {
            rows,
            lookup,
            stats,
        })
    }

    pub fn get(&self, key: &JoinKey) -> Option<&SourceRow> {
        self.lookup.get(key)
    }
}
