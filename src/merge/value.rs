use std::fmt;

use super::key::clean_cell;

/// A numeric cell, or an explicit marker that it had no usable value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    Missing,
}

impl Metric {
    /// Never fails: anything that is not a finite float becomes `Missing`.
    pub fn parse(raw: &str) -> Self {
        match clean_cell(raw).parse::<f64>() {
            Ok(v) if v.is_finite() => Metric::Value(v),
            _ => Metric::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Metric::Missing)
    }
}

/// Shortest round-trip digits, laid out the way the existing data files are:
/// fixed notation with at least one decimal (`5.0`, `0.0001`) for decimal
/// exponents in `-4..16`, otherwise `1e-05` / `2.5e+16` with a signed,
/// two-digit-minimum exponent.
pub fn format_float(v: f64) -> String {
    let sci = format!("{:e}", v);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if !(-4..16).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exp.abs());
    }

    let fixed = v.to_string();
    if fixed.contains('.') {
        fixed
    } else {
        fixed + ".0"
    }
}

/// `Missing` writes as an empty field, never `0`.
impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Missing => Ok(()),
            Metric::Value(v) => f.write_str(&format_float(*v)),
        }
    }
}
