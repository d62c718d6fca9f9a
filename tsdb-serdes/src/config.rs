//! Serializer configuration.
//!
//! The defaults produce the canonical v2 document, so most callers never
//! build a config explicitly. A config can also be loaded from JSON:
//!
//! ```rust
//! use tsdb_serdes::config::{AggregatedTagsKey, SerdesConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SerdesConfig::from_json(r#"{"aggregated_tags_key": "aggregate_tags"}"#)?;
//! assert_eq!(config.aggregated_tags_key, AggregatedTagsKey::AggregateTags);
//! assert_eq!(config.flush_threshold, SerdesConfig::DEFAULT_FLUSH_THRESHOLD);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Field name used for the aggregated tag list of each series element.
///
/// Consumers have historically accepted either spelling. Exactly one is
/// emitted per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatedTagsKey {
    /// Emit `"aggregatedTags"`.
    #[default]
    AggregatedTags,
    /// Emit `"aggregateTags"`.
    AggregateTags,
}

impl AggregatedTagsKey {
    /// Returns the JSON field name for this variant.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::AggregatedTags => "aggregatedTags",
            Self::AggregateTags => "aggregateTags",
        }
    }
}

/// Tunables for [`JsonV2QuerySerdes`](crate::serdes::JsonV2QuerySerdes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerdesConfig {
    /// Which spelling of the aggregated tags field to emit.
    pub aggregated_tags_key: AggregatedTagsKey,

    /// Number of buffered bytes after which the token writer is drained
    /// into the sink mid-document.
    pub flush_threshold: usize,
}

impl SerdesConfig {
    /// Default flush threshold (8 KiB).
    pub const DEFAULT_FLUSH_THRESHOLD: usize = 8 * 1024;

    /// Parses a config from a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this type or
    /// the resulting config fails [`validate`](Self::validate).
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(data).map_err(|e| ConfigError::Parse { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the aggregated tags field spelling.
    #[must_use]
    pub fn with_aggregated_tags_key(mut self, key: AggregatedTagsKey) -> Self {
        self.aggregated_tags_key = key;
        self
    }

    /// Sets the flush threshold in bytes.
    #[must_use]
    pub fn with_flush_threshold(mut self, bytes: usize) -> Self {
        self.flush_threshold = bytes;
        self
    }

    /// Checks the config for values the serializer cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroFlushThreshold`] if `flush_threshold` is 0.
    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold == 0 {
            return Err(ConfigError::ZeroFlushThreshold.into());
        }
        Ok(())
    }
}

impl Default for SerdesConfig {
    fn default() -> Self {
        Self {
            aggregated_tags_key: AggregatedTagsKey::default(),
            flush_threshold: Self::DEFAULT_FLUSH_THRESHOLD,
        }
    }
}
