// src/merge/mod.rs
//! Key normalization, lookup construction and the (code, year) join.

pub mod columns;
pub mod join;
pub mod key;
pub mod lookup;
pub mod output;
pub mod table;
pub mod value;

pub use join::{join, sort_records, MergedRecord};
pub use key::{normalize_code, normalize_key, parse_year, CountryCode, JoinKey};
pub use lookup::{SourceRow, SourceStats, SourceTable};
pub use output::{write_output, write_records};
pub use table::{read_table, Table};
pub use value::Metric;
