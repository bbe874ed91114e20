use std::collections::HashSet;
use tracing::debug;

use super::key::JoinKey;
use super::lookup::{SourceRow, SourceTable};
use super::value::Metric;
use crate::config::JoinMode;

/// One output row: the key, a display name, and every source's metrics side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub entity: String,
    pub key: JoinKey,
    pub metrics: Vec<Metric>,
}

impl MergedRecord {
    /// CSV fields in output header order.
    pub fn to_fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(3 + self.metrics.len());
        fields.push(self.entity.clone());
        fields.push(self.key.code.to_string());
        fields.push(self.key.year.to_string());
        fields.extend(self.metrics.iter().map(Metric::to_string));
        fields
    }
}

/// Join `primary` with `secondaries` and return rows sorted by `(year, code)`.
///
/// `metric_widths[i]` is how many metrics secondary `i` contributes; it is used
/// to pad with `Missing` when a secondary has no row for a key.
pub fn join(
    mode: JoinMode,
    primary: &SourceTable,
    secondaries: &[SourceTable],
    metric_widths: &[usize],
) -> Vec<MergedRecord> {
    let mut records = match mode {
        JoinMode::Inner => inner_join(primary, secondaries),
        JoinMode::LeftEnrich => left_enrich(primary, secondaries, metric_widths),
    };
    sort_records(&mut records);
    debug!(?mode, rows = records.len(), "joined");
    records
}

/// Keys present in every source; one row per key.
fn inner_join(primary: &SourceTable, secondaries: &[SourceTable]) -> Vec<MergedRecord> {
    let mut common: HashSet<&JoinKey> = primary.lookup.keys().collect();
    for s in secondaries {
        common.retain(|k| s.lookup.contains_key(*k));
    }

    common
        .into_iter()
        .filter_map(|key| {
            let p = primary.lookup.get(key)?;
            let matched = secondaries
                .iter()
                .map(|s| s.lookup.get(key))
                .collect::<Option<Vec<&SourceRow>>>()?;
            Some(combine(p, matched.iter().map(|m| Some(*m)), &[]))
        })
        .collect()
}

/// Every valid primary row in input order; secondaries fill in what they have.
fn left_enrich(
    primary: &SourceTable,
    secondaries: &[SourceTable],
    metric_widths: &[usize],
) -> Vec<MergedRecord> {
    let mut unmatched = 0usize;
    let records: Vec<MergedRecord> = primary
        .rows
        .iter()
        .map(|p| {
            let matched: Vec<Option<&SourceRow>> =
                secondaries.iter().map(|s| s.get(&p.key)).collect();
            if matched.iter().any(Option::is_none) {
                unmatched += 1;
            }
            combine(p, matched.into_iter(), metric_widths)
        })
        .collect();
    if unmatched > 0 {
        debug!(unmatched, "primary rows without a full set of secondary matches");
    }
    records
}

/// Primary entity wins unless empty; then the first non-empty secondary entity.
fn combine<'a, I>(primary: &SourceRow, secondaries: I, widths: &[usize]) -> MergedRecord
where
    I: Iterator<Item = Option<&'a SourceRow>>,
{
    let mut entity = primary.entity.clone();
    let mut metrics = primary.values.clone();

    for (i, matched) in secondaries.enumerate() {
        match matched {
            Some(row) => {
                if entity.is_empty() && !row.entity.is_empty() {
                    entity = row.entity.clone();
                }
                metrics.extend_from_slice(&row.values);
            }
            None => {
                let width = widths.get(i).copied().unwrap_or(0);
                metrics.extend(std::iter::repeat(Metric::Missing).take(width));
            }
        }
    }

    MergedRecord {
        entity,
        key: primary.key.clone(),
        metrics,
    }
}

/// Year ascending, then code ascending. Stable, so equal keys keep input order.
pub fn sort_records(records: &mut [MergedRecord]) {
    records.sort_by(|a, b| a.key.sort_key().cmp(&b.key.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MetricColumn, ReservedColumns, SourceConfig, ValueColumn};
    use crate::merge::key::normalize_key;
    use crate::merge::table::Table;

    fn source_table(name: &str, metric: &str, rows: &[(&str, &str, &str, &str)]) -> SourceTable {
        let table = Table::new(
            vec!["Entity".into(), "Code".into(), "Year".into(), metric.into()],
            rows.iter()
                .map(|(e, c, y, v)| vec![e.to_string(), c.to_string(), y.to_string(), v.to_string()])
                .collect(),
        );
        let cfg = SourceConfig {
            name: name.into(),
            path: "unused.csv".into(),
            reserved: ReservedColumns::owid(),
            metrics: vec![MetricColumn::new(metric, ValueColumn::named(metric))],
            skip_missing_values: false,
        };
        SourceTable::from_table(&table, &cfg).unwrap()
    }

    fn keys(records: &[MergedRecord]) -> Vec<(i32, String)> {
        records
            .iter()
            .map(|r| (r.key.year, r.key.code.to_string()))
            .collect()
    }

    #[test]
    fn usa_fra_example() {
        let a = source_table("inbound", "inbound_pct", &[("United States", "USA", "2010", "5.0")]);
        let b = source_table(
            "outbound",
            "outbound_pct",
            &[("United States", "USA", "2010", "3.0"), ("France", "FRA", "2010", "4.0")],
        );

        let inner = join(JoinMode::Inner, &a, &[b.clone()], &[1]);
        let enriched = join(JoinMode::LeftEnrich, &a, &[b], &[1]);

        for records in [inner, enriched] {
            assert_eq!(records.len(), 1);
            assert_eq!(
                records[0].to_fields(),
                vec!["United States", "USA", "2010", "5.0", "3.0"]
            );
        }
    }

    #[test]
    fn inner_join_is_the_key_intersection() {
        let a = source_table(
            "a",
            "x",
            &[
                ("", "USA", "2010", "1"),
                ("", "FRA", "2010", "2"),
                ("", "DEU", "2011", "3"),
                ("", "OWID_WRL", "2010", "4"),
            ],
        );
        let b = source_table(
            "b",
            "y",
            &[
                ("", "usa", "2010", "1"),
                ("", "DEU", "2011.0", "n/a"),
                ("", "ESP", "2011", "5"),
                ("", "OWID_WRL", "2010", "4"),
            ],
        );

        let records = join(JoinMode::Inner, &a, &[b.clone()], &[1]);

        let expected: HashSet<&JoinKey> = a
            .lookup
            .keys()
            .filter(|k| b.lookup.contains_key(*k))
            .collect();
        let got: HashSet<&JoinKey> = records.iter().map(|r| &r.key).collect();
        assert_eq!(got, expected);
        assert_eq!(keys(&records), vec![(2010, "USA".into()), (2011, "DEU".into())]);
        // a missing value on one side does not drop the key
        assert_eq!(records[1].metrics, vec![Metric::Value(3.0), Metric::Missing]);
    }

    #[test]
    fn inner_join_across_three_sources() {
        let a = source_table("a", "x", &[("", "USA", "2010", "1"), ("", "FRA", "2010", "2")]);
        let b = source_table("b", "y", &[("", "USA", "2010", "3"), ("", "FRA", "2010", "4")]);
        let c = source_table("c", "z", &[("", "FRA", "2010", "5")]);

        let records = join(JoinMode::Inner, &a, &[b, c], &[1, 1]);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].metrics,
            vec![Metric::Value(2.0), Metric::Value(4.0), Metric::Value(5.0)]
        );
    }

    #[test]
    fn enrichment_keeps_every_primary_row() {
        let a = source_table(
            "mobility",
            "inbound_pct",
            &[
                ("Chile", "CHL", "2012", "0.4"),
                ("Chile", "CHL", "2012", "0.5"),
                ("Peru", "PER", "2011", "n/a"),
                ("World", "OWID_WRL", "2011", "2.0"),
            ],
        );
        let gdp = source_table("gdp", "gdp", &[("Chile", "CHL", "2012", "15000")]);

        let records = join(JoinMode::LeftEnrich, &a, &[gdp], &[1]);
        assert_eq!(records.len(), a.rows.len());
        assert_eq!(records.len(), 3);
        assert_eq!(
            keys(&records),
            vec![(2011, "PER".into()), (2012, "CHL".into()), (2012, "CHL".into())]
        );
        assert_eq!(records[0].to_fields(), vec!["Peru", "PER", "2011", "", ""]);
        // duplicates stay in input order
        assert_eq!(records[1].metrics[0], Metric::Value(0.4));
        assert_eq!(records[2].metrics[0], Metric::Value(0.5));
        assert_eq!(records[2].metrics[1], Metric::Value(15000.0));
    }

    #[test]
    fn entity_falls_back_to_secondary() {
        let a = source_table("a", "x", &[("", "NOR", "2015", "1")]);
        let b = source_table("b", "y", &[("Norway", "NOR", "2015", "2")]);

        for mode in [JoinMode::Inner, JoinMode::LeftEnrich] {
            let records = join(mode, &a, &[b.clone()], &[1]);
            assert_eq!(records[0].entity, "Norway");
        }
    }

    #[test]
    fn output_order_ignores_input_order() {
        let rows = [
            ("", "ZAF", "2010", "1"),
            ("", "ARG", "2012", "2"),
            ("", "BRA", "2010", "3"),
            ("", "ARG", "2010", "4"),
        ];
        let mut shuffled = rows;
        shuffled.reverse();
        shuffled.swap(0, 2);

        let other = source_table("b", "y", &rows);
        let first = join(JoinMode::Inner, &source_table("a", "x", &rows), &[other.clone()], &[1]);
        let second = join(
            JoinMode::Inner,
            &source_table("a", "x", &shuffled),
            &[other],
            &[1],
        );

        assert_eq!(first, second);
        assert_eq!(
            keys(&first),
            vec![
                (2010, "ARG".into()),
                (2010, "BRA".into()),
                (2010, "ZAF".into()),
                (2012, "ARG".into())
            ]
        );
        assert!(first
            .windows(2)
            .all(|w| w[0].key.sort_key() < w[1].key.sort_key()));
    }

    #[test]
    fn enrichment_order_ignores_input_order() {
        let rows = [
            ("South Africa", "ZAF", "2010", "1"),
            ("Argentina", "ARG", "2012", "2"),
            ("Brazil", "BRA", "2010", "3"),
            ("Argentina", "ARG", "2010", "4"),
            ("Mexico", "MEX", "2011", "5"),
        ];
        let mut shuffled = rows;
        shuffled.rotate_left(2);
        shuffled.swap(1, 4);

        // secondary covers only part of the primary, in yet another order
        let gdp = source_table(
            "gdp",
            "gdp",
            &[("", "MEX", "2011", "9000"), ("", "ARG", "2010", "8000")],
        );
        let first = join(
            JoinMode::LeftEnrich,
            &source_table("a", "x", &rows),
            &[gdp.clone()],
            &[1],
        );
        let second = join(
            JoinMode::LeftEnrich,
            &source_table("a", "x", &shuffled),
            &[gdp],
            &[1],
        );

        assert_eq!(first, second);
        assert_eq!(first.len(), rows.len());
        assert_eq!(
            keys(&first),
            vec![
                (2010, "ARG".into()),
                (2010, "BRA".into()),
                (2010, "ZAF".into()),
                (2011, "MEX".into()),
                (2012, "ARG".into())
            ]
        );
        assert!(first
            .windows(2)
            .all(|w| w[0].key.sort_key() < w[1].key.sort_key()));
        assert_eq!(first[0].metrics, vec![Metric::Value(4.0), Metric::Value(8000.0)]);
        assert_eq!(first[1].metrics, vec![Metric::Value(3.0), Metric::Missing]);
    }

    #[test]
    fn normalized_keys_match_across_casing() {
        let a = source_table("a", "x", &[("", "gbr", "2010.0", "1")]);
        let b = source_table("b", "y", &[("", "GBR", "2010", "2")]);
        let records = join(JoinMode::Inner, &a, &[b], &[1]);
        assert_eq!(records[0].key, normalize_key("GBR", "2010").unwrap());
    }
}
