//! Query string parsing.
//!
//! Parameters arrive as optional strings so that a missing value and an
//! unparseable one produce different errors.

use chrono::NaiveDate;

use wind_common::{parse_date, Batch, RunKey, WindError, WindResult};

pub fn required<'a>(value: &'a Option<String>, name: &str) -> WindResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(WindError::MissingParameter(name.to_string())),
    }
}

pub fn required_f64(value: &Option<String>, name: &str) -> WindResult<f64> {
    let raw = required(value, name)?;
    let parsed: f64 = raw
        .parse()
        .map_err(|_| WindError::invalid_parameter(name, format!("'{}' is not a number", raw)))?;
    if !parsed.is_finite() {
        return Err(WindError::invalid_parameter(name, format!("'{}' is not finite", raw)));
    }
    Ok(parsed)
}

pub fn required_date(value: &Option<String>, name: &str) -> WindResult<NaiveDate> {
    parse_date(name, required(value, name)?)
}

pub fn required_batch(value: &Option<String>) -> WindResult<Batch> {
    required(value, "batch")?.parse()
}

pub fn run_key(date: &Option<String>, batch: &Option<String>) -> WindResult<RunKey> {
    Ok(RunKey::new(
        required_date(date, "date")?,
        required_batch(batch)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_missing_vs_invalid() {
        assert!(matches!(
            required_f64(&None, "lat"),
            Err(WindError::MissingParameter(ref p)) if p == "lat"
        ));
        assert!(matches!(
            required_f64(&s("  "), "lat"),
            Err(WindError::MissingParameter(_))
        ));
        assert!(matches!(
            required_f64(&s("north"), "lat"),
            Err(WindError::InvalidParameter { .. })
        ));
        assert!(required_f64(&s("NaN"), "lat").is_err());
        assert_eq!(required_f64(&s("-12.5"), "lat").unwrap(), -12.5);
    }

    #[test]
    fn test_run_key() {
        let key = run_key(&s("20240101"), &s("06z")).unwrap();
        assert_eq!(key.to_string(), "20240101-06z");
        assert!(run_key(&s("2024-01-01"), &s("06z")).unwrap_err().is_parameter_error());
        assert!(run_key(&s("20240101"), &s("03z")).unwrap_err().is_parameter_error());
        assert!(matches!(
            run_key(&s("20240101"), &None),
            Err(WindError::MissingParameter(_))
        ));
    }
}
