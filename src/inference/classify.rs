//! Leaf classification of single JSON values.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

use super::unify::{Scalar, Ty};
use crate::config::RFC3339;

/// Date recognition driven by the configured format list.
#[derive(Clone, Debug)]
pub struct DateFormats {
    rfc3339: bool,
    patterns: Vec<String>,
}

impl DateFormats {
    pub fn new(formats: &[String]) -> Self {
        let rfc3339 = formats.iter().any(|f| f.eq_ignore_ascii_case(RFC3339));
        let patterns = formats
            .iter()
            .filter(|f| !f.eq_ignore_ascii_case(RFC3339))
            .cloned()
            .collect();
        Self { rfc3339, patterns }
    }

    pub fn matches(&self, s: &str) -> bool {
        let s = s.trim();
        // every supported pattern needs at least a digit; skip the common case early
        if s.is_empty() || !s.bytes().any(|b| b.is_ascii_digit()) {
            return false;
        }
        if self.rfc3339 && DateTime::parse_from_rfc3339(s).is_ok() {
            return true;
        }
        self.patterns.iter().any(|fmt| {
            NaiveDateTime::parse_from_str(s, fmt).is_ok()
                || NaiveDate::parse_from_str(s, fmt).is_ok()
                || DateTime::parse_from_str(s, fmt).is_ok()
        })
    }
}

/// Classify a value without recursing. Non-empty arrays and objects return
/// `None`; walking those is the merger's job.
pub fn classify<O>(value: &Value, dates: &DateFormats) -> Option<Ty<O>> {
    let ty = match value {
        Value::Null => Ty::Null,
        Value::Bool(_) => Ty::scalar(Scalar::Boolean),
        Value::Number(n) => Ty::scalar(classify_number(n)),
        Value::String(s) if dates.matches(s) => Ty::scalar(Scalar::Date),
        Value::String(_) => Ty::scalar(Scalar::String),
        Value::Array(xs) if xs.is_empty() => Ty::array(Ty::Unknown),
        Value::Array(_) | Value::Object(_) => return None,
    };
    Some(ty)
}

fn classify_number(n: &Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        if i32::try_from(i).is_ok() { Scalar::Integer } else { Scalar::Long }
    } else {
        // u64 above i64::MAX has no signed 64-bit home; fractions and exponents land here too
        Scalar::Float
    }
}
