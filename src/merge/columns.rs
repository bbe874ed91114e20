use tracing::debug;

use crate::config::{ReservedColumns, ValueColumn};
use crate::error::MergeError;

pub const ENTITY: [&str; 2] = ["Entity", "entity"];
pub const CODE: [&str; 2] = ["Code", "code"];
pub const YEAR: [&str; 2] = ["Year", "year"];

/// Find a header by its canonical spellings in preference order, then by any casing.
pub fn find_header(headers: &[String], names: &[&str]) -> Option<usize> {
    for name in names {
        if let Some(idx) = headers.iter().position(|h| h.trim() == *name) {
            return Some(idx);
        }
    }
    headers.iter().position(|h| {
        let h = h.trim();
        names.iter().any(|n| h.eq_ignore_ascii_case(n))
    })
}

/// Like `find_header`, but a missing column is a shape error.
pub fn require_header(
    source_name: &str,
    headers: &[String],
    names: &[&str],
) -> Result<usize, MergeError> {
    find_header(headers, names).ok_or_else(|| MergeError::MissingColumn {
        source_name: source_name.to_string(),
        column: names[0].to_string(),
        headers: headers.to_vec(),
    })
}

/// Resolve a value column with the given strategy.
pub fn resolve_value_column(
    source_name: &str,
    headers: &[String],
    reserved: &ReservedColumns,
    strategy: &ValueColumn,
) -> Result<usize, MergeError> {
    let unreserved: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !reserved.contains(h.as_str()))
        .map(|(i, _)| i)
        .collect();
    let no_value_column = || MergeError::NoValueColumn {
        source_name: source_name.to_string(),
        headers: headers.to_vec(),
    };

    let idx = match strategy {
        ValueColumn::FirstUnreserved => unreserved.first().copied().ok_or_else(no_value_column)?,
        ValueColumn::LastUnreserved => unreserved.last().copied().ok_or_else(no_value_column)?,
        ValueColumn::Named(name) => require_header(source_name, headers, &[name.as_str()])?,
    };
    debug!(
        source = source_name,
        column = %headers[idx],
        ?strategy,
        "resolved value column"
    );
    Ok(idx)
}
