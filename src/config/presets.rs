//! Built-in pipelines for the student mobility datasets.

use std::path::Path;

use super::{JoinMode, MetricColumn, PipelineConfig, ReservedColumns, SourceConfig, ValueColumn};

pub const INBOUND_FILE: &str = "share-of-students-from-abroad.csv";
pub const OUTBOUND_FILE: &str = "share-of-students-studying-abroad.csv";
pub const GDP_FILE: &str = "gdp-per-capita-worldbank.csv";
pub const MOBILITY_MERGED_FILE: &str = "student-mobility-merged.csv";
pub const MOBILITY_PLUS_GDP_FILE: &str = "student-mobility-merged-plus-gdp.csv";

/// Inbound and outbound rates; both must be present for a country-year to be kept.
pub fn student_mobility(data_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        name: "student-mobility".into(),
        join: JoinMode::Inner,
        primary: SourceConfig {
            name: "inbound".into(),
            path: data_dir.join(INBOUND_FILE),
            reserved: ReservedColumns::owid(),
            metrics: vec![MetricColumn::new(
                "inbound_pct",
                ValueColumn::named("Inbound mobility rate, both sexes"),
            )],
            skip_missing_values: true,
        },
        secondaries: vec![SourceConfig {
            name: "outbound".into(),
            path: data_dir.join(OUTBOUND_FILE),
            reserved: ReservedColumns::owid(),
            metrics: vec![MetricColumn::new(
                "outbound_pct",
                ValueColumn::named("Share of students studying abroad"),
            )],
            skip_missing_values: true,
        }],
        output: data_dir.join(MOBILITY_MERGED_FILE),
    }
}

/// The merged mobility file enriched with GDP per capita where available.
pub fn mobility_plus_gdp(data_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        name: "mobility-plus-gdp".into(),
        join: JoinMode::LeftEnrich,
        primary: SourceConfig {
            name: "mobility".into(),
            path: data_dir.join(MOBILITY_MERGED_FILE),
            reserved: ReservedColumns::owid(),
            metrics: vec![
                MetricColumn::new("inbound_pct", ValueColumn::named("inbound_pct")),
                MetricColumn::new("outbound_pct", ValueColumn::named("outbound_pct")),
            ],
            skip_missing_values: false,
        },
        secondaries: vec![SourceConfig {
            name: "gdp".into(),
            path: data_dir.join(GDP_FILE),
            reserved: ReservedColumns::owid_with_country(),
            metrics: vec![MetricColumn::new(
                "gdp_per_capita",
                ValueColumn::FirstUnreserved,
            )],
            skip_missing_values: false,
        }],
        output: data_dir.join(MOBILITY_PLUS_GDP_FILE),
    }
}

/// Every built-in pipeline, in dependency order.
pub fn all(data_dir: &Path) -> Vec<PipelineConfig> {
    vec![student_mobility(data_dir), mobility_plus_gdp(data_dir)]
}
