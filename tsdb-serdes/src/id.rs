//! Time series and group identities.
//!
//! A [`TimeSeriesId`] names one series: a metric plus its tags. Tags live in
//! a `BTreeMap`, so they always iterate (and serialize) in lexicographic key
//! order regardless of the order they were added in.
//!
//! ```rust
//! use tsdb_serdes::id::TimeSeriesId;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let id = TimeSeriesId::builder()
//!     .add_metric("sys.cpu.user")
//!     .add_tag("host", "web01")
//!     .add_tag("dc", "phx")
//!     .build()?;
//!
//! assert_eq!(id.metric(), "sys.cpu.user");
//! let keys: Vec<&str> = id.tags().keys().map(String::as_str).collect();
//! assert_eq!(keys, ["dc", "host"]);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IdError, Result};

/// Identity of a time series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSeriesId {
    alias: Option<String>,
    namespace: Option<String>,
    metrics: Vec<String>,
    tags: BTreeMap<String, String>,
    aggregated_tags: Vec<String>,
    disjoint_tags: Vec<String>,
}

impl TimeSeriesId {
    /// Starts building a new id.
    pub fn builder() -> TimeSeriesIdBuilder {
        TimeSeriesIdBuilder::default()
    }

    /// Returns the primary metric name (the first one if several were set).
    pub fn metric(&self) -> &str {
        self.metrics.first().map_or("", String::as_str)
    }

    /// Returns every metric name.
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Returns the tags, ordered by key.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Returns tag keys that were aggregated away.
    pub fn aggregated_tags(&self) -> &[String] {
        &self.aggregated_tags
    }

    /// Returns tag keys that were present on only some of the aggregated series.
    pub fn disjoint_tags(&self) -> &[String] {
        &self.disjoint_tags
    }

    /// Returns the display alias, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Returns the namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for TimeSeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.metric())?;
        for (i, (k, v)) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}

/// Builder for [`TimeSeriesId`].
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesIdBuilder {
    alias: Option<String>,
    namespace: Option<String>,
    metrics: Vec<String>,
    tags: BTreeMap<String, String>,
    aggregated_tags: Vec<String>,
    disjoint_tags: Vec<String>,
}

impl TimeSeriesIdBuilder {
    /// Replaces the metric list.
    #[must_use]
    pub fn set_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a metric name.
    #[must_use]
    pub fn add_metric(mut self, metric: impl Into<String>) -> Self {
        self.metrics.push(metric.into());
        self
    }

    /// Adds a tag. A key that is already present has its value replaced.
    #[must_use]
    pub fn add_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Replaces all tags.
    #[must_use]
    pub fn set_tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tags = tags
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Appends an aggregated tag key.
    #[must_use]
    pub fn add_aggregated_tag(mut self, key: impl Into<String>) -> Self {
        self.aggregated_tags.push(key.into());
        self
    }

    /// Appends a disjoint tag key.
    #[must_use]
    pub fn add_disjoint_tag(mut self, key: impl Into<String>) -> Self {
        self.disjoint_tags.push(key.into());
        self
    }

    /// Sets the display alias.
    #[must_use]
    pub fn set_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the namespace.
    #[must_use]
    pub fn set_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Builds the id.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::MissingMetric`] if no metric was set and
    /// [`IdError::EmptyTagKey`] if any tag has an empty key.
    pub fn build(self) -> Result<TimeSeriesId> {
        if self.metrics.is_empty() {
            return Err(IdError::MissingMetric.into());
        }
        if let Some(value) = self.tags.get("") {
            return Err(IdError::EmptyTagKey {
                value: value.clone(),
            }
            .into());
        }
        Ok(TimeSeriesId {
            alias: self.alias,
            namespace: self.namespace,
            metrics: self.metrics,
            tags: self.tags,
            aggregated_tags: self.aggregated_tags,
            disjoint_tags: self.disjoint_tags,
        })
    }
}

/// Identifier of a group of shard iterators.
///
/// Groups only determine output order; they never appear on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Creates a group id.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::EmptyGroupId`] if `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::EmptyGroupId.into());
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
