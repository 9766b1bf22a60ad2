use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Best-effort field coercion for CSV ingestion
// ---------------------------------------------------------------------------
//
// Every function here is total: malformed input resolves to a default value,
// never to an error. Malformed data is deliberately ingested with
// zeroed/blank fields instead of rejecting the row.

/// Parse a base-10 integer; anything unparseable (including None) yields 0.
pub fn to_int(val: Option<&str>) -> i32 {
    val.and_then(|v| v.trim().parse::<i32>().ok()).unwrap_or(0)
}

/// Parse a decimal number; anything unparseable yields 0.0.
pub fn to_float(val: Option<&str>) -> f64 {
    val.and_then(|v| v.trim().parse::<f64>().ok()).unwrap_or(0.0)
}

/// Trimmed string; None yields the empty string.
pub fn to_str(val: Option<&str>) -> String {
    val.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Strict `YYYY-MM-DD` date; any failure yields None.
///
/// No lenient fallback parser: formats like `2/1/2025` are ambiguous
/// between locales and are treated as unparseable.
pub fn to_date(val: Option<&str>) -> Option<NaiveDate> {
    let v = val?.trim();
    if v.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(v, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(Some("10")), 10);
        assert_eq!(to_int(Some(" 10 ")), 10);
        assert_eq!(to_int(Some("ten")), 0);
        assert_eq!(to_int(Some("")), 0);
        assert_eq!(to_int(None), 0);
    }

    #[test]
    fn test_to_float() {
        assert_eq!(to_float(Some("20.5")), 20.5);
        assert_eq!(to_float(Some("12.3.4")), 0.0);
        assert_eq!(to_float(Some("N/A")), 0.0);
        assert_eq!(to_float(None), 0.0);
    }

    #[test]
    fn test_to_str() {
        assert_eq!(to_str(Some(" Soap ")), "Soap");
        assert_eq!(to_str(Some("")), "");
        assert_eq!(to_str(None), "");
    }

    #[test]
    fn test_to_date_strict_format() {
        assert_eq!(
            to_date(Some("2025-01-02")),
            NaiveDate::from_ymd_opt(2025, 1, 2)
        );
        assert_eq!(to_date(Some("")), None);
        assert_eq!(to_date(None), None);
        assert_eq!(to_date(Some("2/1/2025")), None);
        assert_eq!(to_date(Some("2025-01-02 08:00")), None);
        assert_eq!(to_date(Some("not a date")), None);
    }
}
