//! Engine-level cell values.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::{AnyValue, TimeUnit};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::datetime::{format_datetime, parse_datetime};
use crate::frame::{format_numeric, parse_f64};

/// A single cell value, detached from the Polars buffer it was read from.
///
/// Equality and hashing treat `-0.0` and `0.0` as the same value and all NaN
/// payloads as one value, so scalars can be used as hash-set keys.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Scalar {
    /// Converts a Polars `AnyValue` into an owned scalar.
    ///
    /// Types without a dedicated variant fall back to their display text.
    pub fn from_any(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Self::Null,
            AnyValue::Boolean(b) => Self::Bool(b),
            AnyValue::Int8(v) => Self::Int(i64::from(v)),
            AnyValue::Int16(v) => Self::Int(i64::from(v)),
            AnyValue::Int32(v) => Self::Int(i64::from(v)),
            AnyValue::Int64(v) => Self::Int(v),
            AnyValue::UInt8(v) => Self::Int(i64::from(v)),
            AnyValue::UInt16(v) => Self::Int(i64::from(v)),
            AnyValue::UInt32(v) => Self::Int(i64::from(v)),
            AnyValue::UInt64(v) => match i64::try_from(v) {
                Ok(v) => Self::Int(v),
                Err(_) => Self::Float(v as f64),
            },
            AnyValue::Float32(v) => Self::Float(f64::from(v)),
            AnyValue::Float64(v) => Self::Float(v),
            AnyValue::String(s) => Self::Text(s.to_string()),
            AnyValue::StringOwned(s) => Self::Text(s.to_string()),
            AnyValue::Date(days) => date_from_days(days).map_or(Self::Null, Self::Date),
            AnyValue::Datetime(v, unit, _) => {
                datetime_from_epoch(v, unit).map_or(Self::Null, Self::DateTime)
            }
            other => {
                let s = other.to_string();
                // Nested and categorical values render with surrounding quotes
                if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
                    Self::Text(s[1..s.len() - 1].to_string())
                } else {
                    Self::Text(s)
                }
            }
        }
    }

    /// True for `Null` and for floating-point NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value: numbers, booleans, and numeric text.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) if !v.is_nan() => Some(*v),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => parse_f64(s),
            _ => None,
        }
    }

    /// Temporal view of the value: dates become midnight, text is parsed.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Self::DateTime(dt) => Some(*dt),
            Self::Text(s) => parse_datetime(s),
            _ => None,
        }
    }

    /// Text view of the value; `None` only for missing values.
    pub fn to_text(&self) -> Option<String> {
        if self.is_missing() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Orders `self` against `other`, coercing `self` to the kind of `other`.
    ///
    /// A text `other` is first read as the kind of `self` when `self` is
    /// numeric or temporal, so `"9"` bounds an integer column numerically.
    /// Plain text ordering applies only when that parse fails.
    ///
    /// Returns `None` when either side is missing or `self` cannot be read
    /// as the kind of `other`.
    pub fn compare_coerced(&self, other: &Scalar) -> Option<Ordering> {
        if self.is_missing() || other.is_missing() {
            return None;
        }
        match other {
            Self::Int(_) | Self::Float(_) | Self::Bool(_) => {
                self.to_f64()?.partial_cmp(&other.to_f64()?)
            }
            Self::Date(_) | Self::DateTime(_) => {
                Some(self.to_datetime()?.cmp(&other.to_datetime()?))
            }
            Self::Text(expected) => {
                match self {
                    Self::Int(_) | Self::Float(_) => {
                        if let (Some(value), Some(bound)) = (self.to_f64(), parse_f64(expected)) {
                            return value.partial_cmp(&bound);
                        }
                    }
                    Self::Date(_) | Self::DateTime(_) => {
                        if let (Some(value), Some(bound)) =
                            (self.to_datetime(), parse_datetime(expected))
                        {
                            return Some(value.cmp(&bound));
                        }
                    }
                    _ => {}
                }
                Some(self.to_text()?.as_str().cmp(expected.as_str()))
            }
            Self::Null => None,
        }
    }
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    DateTime::from_timestamp(i64::from(days) * 86_400, 0).map(|dt| dt.date_naive())
}

fn datetime_from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value)?,
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value)?,
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(value),
    };
    Some(dt.naive_utc())
}

/// Canonical bit pattern so that `0.0 == -0.0` and NaN == NaN.
fn float_key(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_key(*a) == float_key(*b),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => float_key(*v).hash(state),
            Self::Text(s) => s.hash(state),
            Self::Date(d) => d.hash(state),
            Self::DateTime(dt) => dt.hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_numeric(*v)),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => f.write_str(&format_datetime(dt)),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) if v.is_nan() => serializer.serialize_none(),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Date(_) | Self::DateTime(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a null, boolean, number, or string value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Scalar, E> {
        Ok(Scalar::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Scalar, E> {
        Ok(Scalar::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
        Ok(Scalar::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
        Ok(Scalar::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
        Ok(i64::try_from(v).map_or(Scalar::Float(v as f64), Scalar::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
        Ok(Scalar::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
        Ok(Scalar::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
        Ok(Scalar::Text(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_from_any_numbers_and_text() {
        assert_eq!(Scalar::from_any(AnyValue::Null), Scalar::Null);
        assert_eq!(Scalar::from_any(AnyValue::Int32(42)), Scalar::Int(42));
        assert_eq!(Scalar::from_any(AnyValue::UInt8(7)), Scalar::Int(7));
        assert_eq!(Scalar::from_any(AnyValue::Float64(1.5)), Scalar::Float(1.5));
        assert_eq!(
            Scalar::from_any(AnyValue::String("Clinic")),
            Scalar::Text("Clinic".to_string())
        );
    }

    #[test]
    fn test_from_any_temporal() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        // 2024-01-01 is 19723 days after the epoch
        assert_eq!(
            Scalar::from_any(AnyValue::Date(19_723)),
            Scalar::Date(expected)
        );
        let micros = 19_723i64 * 86_400 * 1_000_000;
        assert_eq!(
            Scalar::from_any(AnyValue::Datetime(micros, TimeUnit::Microseconds, None)),
            Scalar::DateTime(expected.and_time(NaiveTime::MIN))
        );
    }

    #[test]
    fn test_float_equality_is_hash_safe() {
        assert_eq!(Scalar::Float(0.0), Scalar::Float(-0.0));
        assert_eq!(Scalar::Float(f64::NAN), Scalar::Float(f64::NAN));
        assert_ne!(Scalar::Float(1.0), Scalar::Int(1));

        let set: HashSet<Scalar> = [Scalar::Float(0.0), Scalar::Float(-0.0)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_views() {
        assert_eq!(Scalar::from("10.5").to_f64(), Some(10.5));
        assert_eq!(Scalar::from("abc").to_f64(), None);
        assert_eq!(Scalar::Bool(true).to_f64(), Some(1.0));
        assert_eq!(Scalar::Null.to_text(), None);
        assert_eq!(Scalar::Float(10.0).to_text(), Some("10".to_string()));
        assert!(Scalar::Float(f64::NAN).is_missing());
        assert_eq!(
            Scalar::from("2024-01-01").to_datetime(),
            NaiveDate::from_ymd_opt(2024, 1, 1).map(|d| d.and_time(NaiveTime::MIN))
        );
    }

    #[test]
    fn test_compare_coerced() {
        assert_eq!(
            Scalar::Int(-5).compare_coerced(&Scalar::Int(0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Scalar::from("7").compare_coerced(&Scalar::Float(7.0)),
            Some(Ordering::Equal)
        );
        let bound = Scalar::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(
            Scalar::from("2023-12-31").compare_coerced(&bound),
            Some(Ordering::Less)
        );
        assert_eq!(Scalar::from("abc").compare_coerced(&Scalar::Int(0)), None);
        assert_eq!(Scalar::Null.compare_coerced(&Scalar::Int(0)), None);
    }

    #[test]
    fn test_compare_against_text_bound_uses_value_kind() {
        assert_eq!(
            Scalar::Int(10).compare_coerced(&Scalar::from("9")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Scalar::Float(2.5).compare_coerced(&Scalar::from(" 10 ")),
            Some(Ordering::Less)
        );
        let value = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(13, 5, 0)
            .unwrap();
        assert_eq!(
            Scalar::DateTime(value).compare_coerced(&Scalar::from("2024-01-01T12:00:00")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Scalar::Date(value.date()).compare_coerced(&Scalar::from("2024-01-01 12:00:00")),
            Some(Ordering::Less)
        );
        // Unparseable bounds keep plain text ordering
        assert_eq!(
            Scalar::Int(10).compare_coerced(&Scalar::from("abc")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_json_round_trip_shapes() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[null, true, 3, 2.5, "Lab"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Scalar::Null,
                Scalar::Bool(true),
                Scalar::Int(3),
                Scalar::Float(2.5),
                Scalar::Text("Lab".to_string()),
            ]
        );

        let date = Scalar::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(serde_json::to_string(&date).unwrap(), r#""2024-01-01""#);
    }
}
