// used for date valued (continuous) columns
use chrono::NaiveDate;
// used so values can be exported to the rendering layer
use serde::{Deserialize, Serialize};

// used to print out readable forms of a value
use std::fmt;
// used to indicate that values need to be hashable (group and facet keys)
use std::hash::{Hash, Hasher};
// used for the ranking order
use std::cmp::Ordering;

/// Columns are either discrete (categorical or boolean) or continuous (numeric or temporal).
/// Only discrete columns can take part in grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Discrete,
    Continuous,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ColumnKind::Discrete => write!(f, "discrete"),
            ColumnKind::Continuous => write!(f, "continuous"),
        }
    }
}

/// Native Rust types that can be stored in a dataset cell.
pub trait DataType: Into<Value> {
    // static stuff which needs to be implemented downstream
    const DATA_TYPE: &'static str;
    const KIND: ColumnKind;
    // instance callable with pre-made implementation
    fn data_type(&self) -> &'static str {
        Self::DATA_TYPE
    }
}

impl DataType for bool {
    const DATA_TYPE: &'static str = "boolean";
    const KIND: ColumnKind = ColumnKind::Discrete;
}
impl DataType for String {
    const DATA_TYPE: &'static str = "text";
    const KIND: ColumnKind = ColumnKind::Discrete;
}
impl DataType for &str {
    const DATA_TYPE: &'static str = "text";
    const KIND: ColumnKind = ColumnKind::Discrete;
}
impl DataType for f64 {
    const DATA_TYPE: &'static str = "numeric";
    const KIND: ColumnKind = ColumnKind::Continuous;
}
impl DataType for i64 {
    const DATA_TYPE: &'static str = "numeric";
    const KIND: ColumnKind = ColumnKind::Continuous;
}
impl DataType for NaiveDate {
    const DATA_TYPE: &'static str = "date";
    const KIND: ColumnKind = ColumnKind::Continuous;
}

/// A single typed cell.
///
/// Equality and hashing are structural (numbers compare by bit pattern), which
/// makes values usable as group keys. Comparison semantics for predicates live
/// in [`Value::compare`], the deterministic ranking order in [`Value::rank_cmp`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Boolean(bool),
    Numeric(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn data_type(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Boolean(_) => bool::DATA_TYPE,
            Value::Numeric(_) => f64::DATA_TYPE,
            Value::Text(_) => String::DATA_TYPE,
            Value::Date(_) => NaiveDate::DATA_TYPE,
        }
    }
    /// The column kind this value may live in; missing fits either.
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Value::Missing => None,
            Value::Boolean(_) | Value::Text(_) => Some(ColumnKind::Discrete),
            Value::Numeric(_) | Value::Date(_) => Some(ColumnKind::Continuous),
        }
    }
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
    /// Numeric view; booleans coerce to 0/1 so `mean(flag)` works.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Comparison used by predicates. `None` when the two values are not comparable
    /// (different types, NaN, or a missing side).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    /// Total order used for ranking: missing and NaN sort below every present value,
    /// values of the same type compare naturally, mixed types order by type.
    pub fn rank_cmp(&self, other: &Value) -> Ordering {
        match (self.rank_class(), other.rank_class()) {
            (a, b) if a != b => a.cmp(&b),
            _ => match (self, other) {
                (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
                (Value::Numeric(a), Value::Numeric(b)) => a.total_cmp(b),
                (Value::Text(a), Value::Text(b)) => a.cmp(b),
                (Value::Date(a), Value::Date(b)) => a.cmp(b),
                _ => Ordering::Equal,
            },
        }
    }
    fn rank_class(&self) -> u8 {
        match self {
            Value::Missing => 0,
            Value::Numeric(n) if n.is_nan() => 0,
            Value::Boolean(_) => 1,
            Value::Numeric(_) => 2,
            Value::Date(_) => 3,
            Value::Text(_) => 4,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Numeric(a), Value::Numeric(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Missing => (),
            Value::Boolean(b) => b.hash(state),
            Value::Numeric(n) => n.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "NA"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Numeric(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Numeric(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Numeric(n)
    }
}
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Numeric(n as f64)
    }
}
impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Numeric(f64::from(n))
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::Missing, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ranks_below_everything() {
        let mut values = vec![
            Value::Missing,
            Value::from(3.0),
            Value::from(f64::NAN),
            Value::from(-1.0),
        ];
        values.sort_by(|a, b| b.rank_cmp(a));
        assert_eq!(values[0], Value::from(3.0));
        assert_eq!(values[1], Value::from(-1.0));
        assert!(values[2].is_missing() || values[2].as_f64().is_some_and(f64::is_nan));
    }

    #[test]
    fn booleans_coerce_for_comparison() {
        assert_eq!(Value::from(true).compare(&Value::from(0.5)), Some(Ordering::Greater));
        assert_eq!(Value::from("a").compare(&Value::from(1.0)), None);
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(Value::from(20.0).to_string(), "20");
        assert_eq!(Value::from(0.55).to_string(), "0.55");
    }
}
