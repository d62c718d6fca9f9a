//! Sample types produced by shard iterators.
//!
//! A [`Sample`] is a single `(timestamp, value, real_count)` triple. Values
//! keep track of whether they were recorded as integers or as doubles so
//! the serializer can preserve integerness on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from milliseconds since the epoch.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp in milliseconds since the epoch.
    pub const fn as_millis(self) -> i64 {
        self.0
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Self(millis)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A numeric sample value, tagged with the type it was recorded as.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NumericValue {
    /// An exact integer.
    Integer(i64),
    /// An IEEE-754 double, including NaN and the infinities.
    Float(f64),
}

impl NumericValue {
    /// Returns `true` if the value was recorded as an integer.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer(_))
    }

    /// Returns the value as a double.
    #[allow(clippy::cast_precision_loss)] // Only used for display and comparisons
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Integer(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

impl From<i64> for NumericValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for NumericValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for NumericValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for NumericValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A single data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// When the value was observed.
    pub timestamp: Timestamp,
    /// The observed value.
    pub value: NumericValue,
    /// Number of raw values that contributed to this sample.
    pub real_count: u32,
}

impl Sample {
    /// Creates a new sample.
    pub fn new(timestamp: Timestamp, value: impl Into<NumericValue>, real_count: u32) -> Self {
        Self {
            timestamp,
            value: value.into(),
            real_count,
        }
    }
}
