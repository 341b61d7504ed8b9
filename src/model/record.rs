//! Flat records and their scalar values

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use super::fields::Field;

/// A flat row: dataset-qualified key to scalar value
pub type Record = BTreeMap<String, Scalar>;

/// Builds the dataset-qualified key `<id>_<field>`
pub fn dataset_key(dataset_id: &str, field: Field) -> String {
    format!("{}_{}", dataset_id, field.name())
}

/// A record value: number or string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn text(s: impl Into<String>) -> Self {
        Scalar::Text(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Number(_) => None,
            Scalar::Text(s) => Some(s),
        }
    }

    /// Hashable identity of the value, used for grouping and distinct counts
    pub fn key(&self) -> ScalarKey {
        match self {
            // -0.0 and 0.0 are the same group
            Scalar::Number(n) if *n == 0.0 => ScalarKey::Number(0f64.to_bits()),
            Scalar::Number(n) => ScalarKey::Number(n.to_bits()),
            Scalar::Text(s) => ScalarKey::Text(s.clone()),
        }
    }

    /// Numeric when both values are numbers, lexicographic otherwise
    pub fn compare(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::Number(a), Scalar::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            (a, b) => a.to_string().cmp(&b.to_string()),
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

// Integral numbers are written without a fractional part so that
// `1900` round-trips as `1900` rather than `1900.0`.
impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Scalar::Number(n) => serializer.serialize_f64(*n),
            Scalar::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Hashable form of a [`Scalar`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarKey {
    Number(u64),
    Text(String),
}
