use std::fmt;

/// Trim whitespace + strip outer quotes if present.
pub fn clean_cell(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// A normalized three-letter country code (uppercase, alphabetic).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uppercase first, then require exactly three alphabetic chars.
/// Aggregates like `OWID_WRL`, blanks and region codes all fail the shape check.
pub fn normalize_code(raw: &str) -> Option<CountryCode> {
    let upper = clean_cell(raw).to_uppercase();
    if upper.chars().count() == 3 && upper.chars().all(char::is_alphabetic) {
        Some(CountryCode(upper))
    } else {
        None
    }
}

/// Parses `"2005"` or `"2005.0"`. Fractional years truncate toward zero.
pub fn parse_year(raw: &str) -> Option<i32> {
    let cleaned = clean_cell(raw);
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(y) = cleaned.parse::<i32>() {
        return Some(y);
    }
    let f = cleaned.parse::<f64>().ok()?;
    if !f.is_finite() {
        return None;
    }
    let t = f.trunc();
    if t < i32::MIN as f64 || t > i32::MAX as f64 {
        return None;
    }
    Some(t as i32)
}

/// The `(code, year)` pair rows are aligned on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKey {
    pub code: CountryCode,
    pub year: i32,
}

impl JoinKey {
    /// Output order: year first, then code.
    pub fn sort_key(&self) -> (i32, &str) {
        (self.year, self.code.as_str())
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.code, self.year)
    }
}

/// `None` if either half is rejected; callers drop the row.
pub fn normalize_key(code: &str, year: &str) -> Option<JoinKey> {
    Some(JoinKey {
        code: normalize_code(code)?,
        year: parse_year(year)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_normalize_case_insensitively() {
        for raw in ["usa", "USA", "uSa", "  Usa  ", "\"usa\""] {
            assert_eq!(normalize_code(raw).unwrap().as_str(), "USA");
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["fra", "DEU", " gBr", "ÅLA"] {
            let once = normalize_code(raw).unwrap();
            let twice = normalize_code(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn bad_shapes_are_rejected() {
        for raw in ["", "  ", "US", "USAA", "OWID_WRL", "U1A", "12 ", "A-B", "EU 27"] {
            assert!(normalize_code(raw).is_none(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn uppercase_expansion_fails_shape() {
        // "ß" uppercases to "SS", so this is four chars once normalized
        assert!(normalize_code("ßab").is_none());
    }

    #[test]
    fn years_accept_integer_valued_floats() {
        assert_eq!(parse_year("2005"), Some(2005));
        assert_eq!(parse_year("2005.0"), Some(2005));
        assert_eq!(parse_year(" 1999 "), Some(1999));
        assert_eq!(parse_year("2010.7"), Some(2010));
    }

    #[test]
    fn years_reject_non_numeric() {
        for raw in ["", "n/a", "twenty", "NaN", "inf", "1e20"] {
            assert_eq!(parse_year(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn key_needs_both_halves() {
        assert_eq!(
            normalize_key("usa", "2010.0"),
            Some(JoinKey {
                code: normalize_code("USA").unwrap(),
                year: 2010
            })
        );
        assert!(normalize_key("OWID_WRL", "2010").is_none());
        assert!(normalize_key("USA", "").is_none());
    }
}
