use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{fs::File, io::Read, path::Path};
use tracing::debug;

/// A CSV file held in memory: header row plus every data row as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names from the header row, as written in the file.
    pub headers: Vec<String>,
    /// Each data row, one `String` per field. Short rows are allowed.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Parse CSV text with a header row. Record lengths may vary.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .context("reading CSV header row")?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            // +2: one for the header, one for 1-based lines
            let record = result.with_context(|| format!("CSV parse error at line {}", idx + 2))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Field `col` of row `row`, or `""` when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read a whole CSV file into a `Table`. The handle is closed before returning.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening input {:?}", path))?;
    let table = Table::from_reader(file).with_context(|| format!("reading {:?}", path))?;
    debug!(
        columns = table.headers.len(),
        rows = table.len(),
        "loaded table"
    );
    Ok(table)
}
