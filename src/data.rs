use std::{cmp::Ordering, fmt};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dataset::StorageType;

/// A single non-missing cell. Missing cells are `None` at the column level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Boolean(b) => if *b { "True" } else { "False" }.to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Numeric view used by the continuous statistics. Text never converts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(_) | Value::DateTime(_) => None,
        }
    }

    /// Ordering between two values, or `None` when the variants cannot be
    /// compared (text against a number, and so on).
    pub fn try_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            (Value::Integer(a), Value::Float(b)) => Some((*a as f64).total_cmp(b)),
            (Value::Float(a), Value::Integer(b)) => Some(a.total_cmp(&(*b as f64))),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::String(_) => "str",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Boolean(_) => "bool",
            Value::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Float text the way a dataframe prints a scalar: integral values keep a
/// trailing `.0`, NaN prints as `nan`, and decimal exponents outside
/// `-4..16` switch to `1.5e-07` / `1e+16` notation.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let shortest = format!("{value:e}");
    if value != 0.0
        && let Some((mantissa, exponent)) = shortest.split_once('e')
        && let Ok(exponent) = exponent.parse::<i32>()
        && !(-4..16).contains(&exponent)
    {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d", "%m/%d/%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Date-only text is promoted to midnight so a column mixing both forms
/// still lands on a single temporal storage type.
pub fn parse_temporal(value: &str) -> Result<NaiveDateTime> {
    parse_naive_datetime(value).or_else(|_| {
        parse_naive_date(value)
            .map(|date| date.and_hms_opt(0, 0, 0).unwrap_or_default())
            .map_err(|_| anyhow!("Failed to parse '{value}' as date or datetime"))
    })
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

pub fn parse_typed_value(value: &str, ty: StorageType) -> Result<Option<Value>> {
    if value.is_empty() {
        return Ok(None);
    }
    let parsed = match ty {
        StorageType::Object => Value::String(value.to_string()),
        StorageType::Int64 => {
            let parsed: i64 = value
                .trim()
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as integer"))?;
            Value::Integer(parsed)
        }
        StorageType::Float64 => {
            let parsed: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as float"))?;
            if parsed.is_nan() {
                return Ok(None);
            }
            Value::Float(parsed)
        }
        StorageType::Bool => match parse_boolean(value.trim()) {
            Some(b) => Value::Boolean(b),
            None => bail!("Failed to parse '{value}' as boolean"),
        },
        StorageType::DateTime64 => Value::DateTime(parse_temporal(value.trim())?),
    };
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_float_keeps_fraction_marker() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(-0.125), "-0.125");
    }

    #[test]
    fn format_float_uses_exponents_at_the_extremes() {
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1e15), "1000000000000000.0");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(-1.5e-7), "-1.5e-07");
        assert_eq!(format_float(2.5e20), "2.5e+20");
        assert_eq!(format_float(0.0), "0.0");
    }

    #[test]
    fn parse_temporal_promotes_dates_to_midnight() {
        let parsed = parse_temporal("2024-05-06").unwrap();
        assert_eq!(
            Value::DateTime(parsed).as_display(),
            "2024-05-06 00:00:00"
        );
        let parsed = parse_temporal("2024-05-06T14:30:00").unwrap();
        assert_eq!(
            Value::DateTime(parsed).as_display(),
            "2024-05-06 14:30:00"
        );
        assert!(parse_temporal("yesterday").is_err());
    }

    #[test]
    fn parse_typed_value_handles_empty_and_boolean_inputs() {
        assert_eq!(parse_typed_value("", StorageType::Int64).unwrap(), None);
        assert_eq!(
            parse_typed_value("TRUE", StorageType::Bool).unwrap(),
            Some(Value::Boolean(true))
        );
        assert!(parse_typed_value("maybe", StorageType::Bool).is_err());
        assert!(parse_typed_value("1.5", StorageType::Int64).is_err());
    }

    #[test]
    fn try_cmp_refuses_text_against_numbers() {
        let text = Value::String("a".into());
        let number = Value::Integer(1);
        assert_eq!(text.try_cmp(&number), None);
        assert_eq!(
            Value::Integer(2).try_cmp(&Value::Float(1.5)),
            Some(Ordering::Greater)
        );
    }
}
