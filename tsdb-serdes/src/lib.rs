//! # tsdb-serdes
//!
//! Streaming OpenTSDB v2 JSON serializer for time-series query results.
//!
//! The query layer hands over an [`IteratorGroups`]: shard iterators bucketed
//! by group. This crate flattens it into the v2 wire format dashboards
//! expect, streaming into any [`std::io::Write`] sink without building the
//! whole response in memory.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Output order is fully determined by group and shard insertion order
//! - Integer samples stay integers on the wire (`42`, never `42.0`)
//! - NaN and the infinities are written as `"NaN"`, `"Infinity"`, `"-Infinity"`
//! - Absent arguments are rejected before a single byte is written
//!
//! ## Quick Start
//!
//! ```rust
//! use tsdb_serdes::{
//!     GroupId, IteratorGroups, JsonGenerator, JsonV2QuerySerdes, NumericMillisecondShard,
//!     QuerySerdes, TimeSeriesId, Timestamp,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let id = TimeSeriesId::builder()
//!     .add_metric("sys.cpu.user")
//!     .add_tag("host", "web01")
//!     .add_tag("dc", "phx")
//!     .build()?;
//!
//! let mut shard = NumericMillisecondShard::new(
//!     id,
//!     Timestamp::from_millis(1_486_045_800_000),
//!     Timestamp::from_millis(1_486_046_000_000),
//! )?;
//! shard.add(1_486_045_801_000, 42, 1)?;
//! shard.add(1_486_045_871_000, f64::NAN, 0)?;
//!
//! let mut groups = IteratorGroups::new();
//! groups.add_iterator(&GroupId::new("a")?, shard);
//!
//! let mut serdes = JsonV2QuerySerdes::new(Some(JsonGenerator::new()))?;
//! let mut out = Vec::new();
//! serdes.serialize(Some(&mut out), Some(&groups))?;
//!
//! let json = String::from_utf8(out)?;
//! assert!(json.contains(r#""1486045801000":42"#));
//! assert!(json.contains(r#""1486045871000":"NaN""#));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`JsonV2QuerySerdes`] - The serializer; owns a token writer and a config
//! - [`JsonGenerator`] - Buffered streaming JSON token writer
//! - [`IteratorGroups`] - Insertion-ordered groups of shard iterators
//! - [`TimeSeriesIterator`] - Trait the serializer pulls samples through
//!
//! ## Modules
//!
//! - [`serdes`] - The v2 serializer and the [`QuerySerdes`] trait
//! - [`generator`] - JSON token writer
//! - [`numeric`] - Numeric token classification
//! - [`groups`] - Iterator groups
//! - [`shard`] - Shard iterators and the in-memory shard
//! - [`id`] - Time series and group identities
//! - [`sample`] - Timestamps, values and samples
//! - [`config`] - Serializer configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod generator;
pub mod groups;
pub mod id;
pub mod numeric;
pub mod sample;
pub mod serdes;
pub mod shard;

// Re-export primary API types at crate root for convenience.
pub use config::{AggregatedTagsKey, SerdesConfig};
pub use error::{Result, SerdesError};
pub use generator::JsonGenerator;
pub use groups::{IteratorGroup, IteratorGroups};
pub use id::{GroupId, TimeSeriesId};
pub use numeric::NumericToken;
pub use sample::{NumericValue, Sample, Timestamp};
pub use serdes::{JsonV2QuerySerdes, QuerySerdes};
pub use shard::{NumericMillisecondShard, TimeSeriesIterator};
