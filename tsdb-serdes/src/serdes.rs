//! OpenTSDB v2 JSON serialization of query results.
//!
//! [`JsonV2QuerySerdes`] flattens an [`IteratorGroups`] into a JSON array
//! with one element per shard iterator, groups first and shards within each
//! group second, both in insertion order:
//!
//! ```text
//! [{"metric":"sys.cpu.user",
//!   "tags":{"dc":"phx","host":"web01"},
//!   "aggregatedTags":[],
//!   "dps":{"1486045801000":42,"1486045871000":9866.854}}]
//! ```
//!
//! Output is streamed: samples are pulled from each iterator one at a time
//! and the token writer is drained into the sink whenever its buffer
//! reaches [`SerdesConfig::flush_threshold`]. On failure the bytes already
//! written stay in the sink; the document is left incomplete.
//!
//! # Example
//!
//! ```rust
//! use tsdb_serdes::generator::JsonGenerator;
//! use tsdb_serdes::groups::IteratorGroups;
//! use tsdb_serdes::id::{GroupId, TimeSeriesId};
//! use tsdb_serdes::sample::Timestamp;
//! use tsdb_serdes::serdes::{JsonV2QuerySerdes, QuerySerdes};
//! use tsdb_serdes::shard::NumericMillisecondShard;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let id = TimeSeriesId::builder().add_metric("sys.cpu.user").build()?;
//! let mut shard = NumericMillisecondShard::new(
//!     id,
//!     Timestamp::from_millis(1_486_045_800_000),
//!     Timestamp::from_millis(1_486_046_000_000),
//! )?;
//! shard.add(1_486_045_801_000, 42, 1)?;
//!
//! let mut groups = IteratorGroups::new();
//! groups.add_iterator(&GroupId::new("a")?, shard);
//!
//! let mut serdes = JsonV2QuerySerdes::new(Some(JsonGenerator::new()))?;
//! let mut out = Vec::new();
//! serdes.serialize(Some(&mut out), Some(&groups))?;
//! assert!(String::from_utf8(out)?.contains(r#""1486045801000":42"#));
//! # Ok(())
//! # }
//! ```

use std::fmt::Write as _;
use std::io::{Read, Write};

use crate::config::SerdesConfig;
use crate::error::{Result, SerdesError};
use crate::generator::JsonGenerator;
use crate::groups::IteratorGroups;
use crate::id::TimeSeriesId;
use crate::sample::Sample;
use crate::shard::TimeSeriesIterator;

/// Conversion between query results and a wire format.
pub trait QuerySerdes {
    /// Writes `groups` to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`SerdesError::InvalidArgument`] if either argument is
    /// absent, and propagates sink and iterator failures unchanged.
    fn serialize<W: Write + ?Sized>(
        &mut self,
        sink: Option<&mut W>,
        groups: Option<&IteratorGroups>,
    ) -> Result<()>;

    /// Reads query results from `source`.
    ///
    /// # Errors
    ///
    /// Implementations that only write return [`SerdesError::Unsupported`].
    fn deserialize<R: Read + ?Sized>(
        &mut self,
        source: Option<&mut R>,
    ) -> Result<IteratorGroups>;
}

/// Per-call counters, reported when serialization finishes.
#[derive(Debug, Default, Clone, Copy)]
struct SerializeStats {
    series: usize,
    samples: usize,
    flushes: usize,
}

/// Serializer for the OpenTSDB v2 JSON query response format.
///
/// Holds the token writer it was constructed with and no other state
/// between calls. Not meant for concurrent use; give each thread its own
/// instance and sink.
#[derive(Debug)]
pub struct JsonV2QuerySerdes {
    generator: JsonGenerator,
    config: SerdesConfig,
    key: String,
}

impl JsonV2QuerySerdes {
    /// Creates a serializer with the default config.
    ///
    /// # Errors
    ///
    /// Returns [`SerdesError::InvalidArgument`] if `generator` is `None`.
    pub fn new(generator: Option<JsonGenerator>) -> Result<Self> {
        Self::with_config(generator, SerdesConfig::default())
    }

    /// Creates a serializer with an explicit config.
    ///
    /// # Errors
    ///
    /// Returns [`SerdesError::InvalidArgument`] if `generator` is `None`,
    /// or a config error if `config` fails validation.
    pub fn with_config(generator: Option<JsonGenerator>, config: SerdesConfig) -> Result<Self> {
        let Some(generator) = generator else {
            tracing::warn!("rejecting serializer construction without a token writer");
            return Err(SerdesError::invalid_argument("token writer is required"));
        };
        config.validate()?;
        Ok(Self {
            generator,
            config,
            key: String::with_capacity(20),
        })
    }

    /// Returns the active config.
    pub fn config(&self) -> &SerdesConfig {
        &self.config
    }

    /// Consumes the serializer and hands back its token writer.
    pub fn into_generator(self) -> JsonGenerator {
        self.generator
    }

    /// Writes one series element.
    fn write_series<W: Write + ?Sized>(
        &mut self,
        sink: &mut W,
        iterator: &dyn TimeSeriesIterator,
        stats: &mut SerializeStats,
    ) -> Result<()> {
        let mut samples = iterator.samples();
        let first = samples.next().transpose()?;

        self.generator.write_start_object()?;
        self.write_id(iterator.id())?;
        self.generator.write_field_name("dps")?;
        self.generator.write_start_object()?;

        if let Some(first) = first {
            self.write_sample(first)?;
            stats.samples += 1;
            self.maybe_flush(sink, stats)?;
            for sample in samples {
                self.write_sample(sample?)?;
                stats.samples += 1;
                self.maybe_flush(sink, stats)?;
            }
        }

        self.generator.write_end_object()?;
        self.generator.write_end_object()?;
        stats.series += 1;
        tracing::trace!(series = %iterator.id(), "wrote series element");
        Ok(())
    }

    fn write_id(&mut self, id: &TimeSeriesId) -> Result<()> {
        let generator = &mut self.generator;

        generator.write_field_name("metric")?;
        generator.write_string(id.metric())?;

        generator.write_field_name("tags")?;
        generator.write_start_object()?;
        for (key, value) in id.tags() {
            generator.write_field_name(key)?;
            generator.write_string(value)?;
        }
        generator.write_end_object()?;

        generator.write_field_name(self.config.aggregated_tags_key.field_name())?;
        generator.write_start_array()?;
        for tag in id.aggregated_tags() {
            generator.write_string(tag)?;
        }
        generator.write_end_array()
    }

    fn write_sample(&mut self, sample: Sample) -> Result<()> {
        self.key.clear();
        // Writing into a String cannot fail.
        let _ = write!(self.key, "{}", sample.timestamp);
        self.generator.write_field_name(&self.key)?;
        self.generator.write_numeric(sample.value)
    }

    fn maybe_flush<W: Write + ?Sized>(
        &mut self,
        sink: &mut W,
        stats: &mut SerializeStats,
    ) -> Result<()> {
        let buffered = self.generator.buffered_len();
        if buffered >= self.config.flush_threshold {
            self.generator.flush_into(sink)?;
            stats.flushes += 1;
            tracing::trace!(bytes = buffered, "flushed token writer into sink");
        }
        Ok(())
    }
}

impl QuerySerdes for JsonV2QuerySerdes {
    fn serialize<W: Write + ?Sized>(
        &mut self,
        sink: Option<&mut W>,
        groups: Option<&IteratorGroups>,
    ) -> Result<()> {
        let Some(sink) = sink else {
            tracing::warn!("rejecting serialize call without a sink");
            return Err(SerdesError::invalid_argument("output sink is required"));
        };
        let Some(groups) = groups else {
            tracing::warn!("rejecting serialize call without iterator groups");
            return Err(SerdesError::invalid_argument("iterator groups are required"));
        };

        tracing::debug!(
            groups = groups.len(),
            iterators = groups.iterator_count(),
            "serializing query results"
        );

        // Leftovers from an aborted call must not leak into this document.
        self.generator.reset();

        let mut stats = SerializeStats::default();
        self.generator.write_start_array()?;
        for iterator in groups.flattened_iterators() {
            self.write_series(sink, iterator, &mut stats)?;
        }
        self.generator.write_end_array()?;
        self.generator.flush_into(sink)?;
        stats.flushes += 1;

        tracing::debug!(
            series = stats.series,
            samples = stats.samples,
            flushes = stats.flushes,
            "serialized query results"
        );
        Ok(())
    }

    fn deserialize<R: Read + ?Sized>(
        &mut self,
        _source: Option<&mut R>,
    ) -> Result<IteratorGroups> {
        Err(SerdesError::Unsupported {
            operation: "deserialize",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregatedTagsKey;
    use crate::error::{ConfigError, IteratorError};
    use crate::id::GroupId;
    use crate::sample::Timestamp;
    use crate::shard::NumericMillisecondShard;

    const START: i64 = 1_486_045_800_000;
    const END: i64 = 1_486_046_000_000;

    fn id(host: &str) -> TimeSeriesId {
        TimeSeriesId::builder()
            .add_metric("sys.cpu.user")
            .add_tag("host", host)
            .add_tag("dc", "phx")
            .build()
            .unwrap()
    }

    fn shard(host: &str, samples: &[(i64, f64)]) -> NumericMillisecondShard {
        let mut shard = NumericMillisecondShard::new(
            id(host),
            Timestamp::from_millis(START),
            Timestamp::from_millis(END),
        )
        .unwrap();
        for &(ts, value) in samples {
            shard.add(ts, value, 1).unwrap();
        }
        shard
    }

    fn serialize(serdes: &mut JsonV2QuerySerdes, groups: &IteratorGroups) -> String {
        let mut out = Vec::new();
        serdes.serialize(Some(&mut out), Some(groups)).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Iterator that yields one sample and then fails.
    #[derive(Debug)]
    struct FailingIterator {
        id: TimeSeriesId,
    }

    impl TimeSeriesIterator for FailingIterator {
        fn id(&self) -> &TimeSeriesId {
            &self.id
        }

        fn start(&self) -> Timestamp {
            Timestamp::from_millis(START)
        }

        fn end(&self) -> Timestamp {
            Timestamp::from_millis(END)
        }

        fn samples(&self) -> Box<dyn Iterator<Item = Result<Sample>> + '_> {
            let ok = Sample::new(Timestamp::from_millis(START + 1000), 1, 1);
            let failed = IteratorError::Failed {
                metric: self.id.metric().to_string(),
                reason: "storage went away".to_string(),
            };
            Box::new([Ok(ok), Err(SerdesError::from(failed))].into_iter())
        }
    }

    /// Sink that accepts a fixed number of bytes and then errors.
    struct LimitedSink {
        written: Vec<u8>,
        limit: usize,
    }

    impl Write for LimitedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written.len() + buf.len() > self.limit {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "sink closed",
                ));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_empty_groups() {
        let mut serdes = JsonV2QuerySerdes::new(Some(JsonGenerator::new())).unwrap();
        assert_eq!(serialize(&mut serdes, &IteratorGroups::new()), "[]");
    }

    #[test]
    fn test_exact_element_layout() {
        let mut groups = IteratorGroups::new();
        groups.add_iterator(
            &GroupId::new("a").unwrap(),
            shard("web01", &[(1_486_045_801_000, 42.0), (1_486_045_871_000, 9866.854)]),
        );

        let mut serdes = JsonV2QuerySerdes::new(Some(JsonGenerator::new())).unwrap();
        assert_eq!(
            serialize(&mut serdes, &groups),
            concat!(
                r#"[{"metric":"sys.cpu.user","tags":{"dc":"phx","host":"web01"},"#,
                r#""aggregatedTags":[],"dps":{"1486045801000":42,"1486045871000":9866.854}}]"#
            )
        );
    }

    #[test]
    fn test_empty_shard_still_emits_element() {
        let mut groups = IteratorGroups::new();
        groups.add_iterator(&GroupId::new("a").unwrap(), shard("web01", &[]));

        let mut serdes = JsonV2QuerySerdes::new(Some(JsonGenerator::new())).unwrap();
        let json = serialize(&mut serdes, &groups);
        assert!(json.ends_with(r#""aggregatedTags":[],"dps":{}}]"#));
    }

    #[test]
    fn test_aggregate_tags_spelling() {
        let id = TimeSeriesId::builder()
            .add_metric("sys.cpu.user")
            .add_aggregated_tag("host")
            .build()
            .unwrap();
        let shard = NumericMillisecondShard::new(
            id,
            Timestamp::from_millis(START),
            Timestamp::from_millis(END),
        )
        .unwrap();
        let mut groups = IteratorGroups::new();
        groups.add_iterator(&GroupId::new("a").unwrap(), shard);

        let config =
            SerdesConfig::default().with_aggregated_tags_key(AggregatedTagsKey::AggregateTags);
        let mut serdes =
            JsonV2QuerySerdes::with_config(Some(JsonGenerator::new()), config).unwrap();
        let json = serialize(&mut serdes, &groups);
        assert!(json.contains(r#""aggregateTags":["host"]"#));
        assert!(!json.contains("aggregatedTags"));
    }

    #[test]
    fn test_small_flush_threshold_streams_same_bytes() {
        let mut groups = IteratorGroups::new();
        let a = GroupId::new("a").unwrap();
        groups.add_iterator(&a, shard("web01", &[(START, 1.0), (START + 1, 2.5)]));
        groups.add_iterator(&a, shard("web02", &[(START, f64::NAN)]));

        let mut buffered = JsonV2QuerySerdes::new(Some(JsonGenerator::new())).unwrap();
        let expected = serialize(&mut buffered, &groups);

        let config = SerdesConfig::default().with_flush_threshold(1);
        let mut streaming =
            JsonV2QuerySerdes::with_config(Some(JsonGenerator::new()), config).unwrap();
        assert_eq!(serialize(&mut streaming, &groups), expected);
    }

    #[test]
    fn test_serializer_is_reusable() {
        let mut groups = IteratorGroups::new();
        groups.add_iterator(&GroupId::new("a").unwrap(), shard("web01", &[(START, 3.0)]));

        let mut serdes = JsonV2QuerySerdes::new(Some(JsonGenerator::new())).unwrap();
        let first = serialize(&mut serdes, &groups);
        let second = serialize(&mut serdes, &groups);
        assert_eq!(first, second);
    }

    #[test]
    fn test_iterator_failure_propagates() {
        let mut groups = IteratorGroups::new();
        groups.add_iterator(
            &GroupId::new("a").unwrap(),
            FailingIterator { id: id("web01") },
        );

        let config = SerdesConfig::default().with_flush_threshold(1);
        let mut serdes =
            JsonV2QuerySerdes::with_config(Some(JsonGenerator::new()), config).unwrap();
        let mut out = Vec::new();
        let err = serdes.serialize(Some(&mut out), Some(&groups)).unwrap_err();
        assert!(matches!(
            err,
            SerdesError::Iterator(IteratorError::Failed { .. })
        ));

        // Partial output is left in place and is not valid JSON.
        let partial = String::from_utf8(out).unwrap();
        assert!(partial.starts_with(r#"[{"metric":"sys.cpu.user""#));
        assert!(serde_json::from_str::<serde_json::Value>(&partial).is_err());

        // A later call starts a fresh document.
        let json = serialize(&mut serdes, &IteratorGroups::new());
        assert_eq!(json, "[]");
    }

    #[test]
    fn test_sink_error_propagates_unchanged() {
        let mut groups = IteratorGroups::new();
        groups.add_iterator(&GroupId::new("a").unwrap(), shard("web01", &[(START, 1.0)]));

        let mut serdes = JsonV2QuerySerdes::new(Some(JsonGenerator::new())).unwrap();
        let mut sink = LimitedSink {
            written: Vec::new(),
            limit: 4,
        };
        let err = serdes.serialize(Some(&mut sink), Some(&groups)).unwrap_err();
        match err {
            SerdesError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
            other => panic!("expected Io error, got {other:?}"),
        }
        assert!(sink.written.is_empty());
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            JsonV2QuerySerdes::new(None).unwrap_err(),
            SerdesError::InvalidArgument { .. }
        ));

        let mut serdes = JsonV2QuerySerdes::new(Some(JsonGenerator::new())).unwrap();
        let groups = IteratorGroups::new();
        let mut out = Vec::new();

        let err = serdes
            .serialize(None::<&mut Vec<u8>>, Some(&groups))
            .unwrap_err();
        assert!(matches!(err, SerdesError::InvalidArgument { .. }));

        let err = serdes.serialize(Some(&mut out), None).unwrap_err();
        assert!(matches!(err, SerdesError::InvalidArgument { .. }));
        assert!(out.is_empty());

        let err = serdes.deserialize(None::<&mut &[u8]>).unwrap_err();
        assert!(matches!(
            err,
            SerdesError::Unsupported {
                operation: "deserialize"
            }
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SerdesConfig::default().with_flush_threshold(0);
        let err = JsonV2QuerySerdes::with_config(Some(JsonGenerator::new()), config).unwrap_err();
        assert!(matches!(
            err,
            SerdesError::Config(ConfigError::ZeroFlushThreshold)
        ));
    }

    #[test]
    fn test_into_generator() {
        let serdes = JsonV2QuerySerdes::new(Some(JsonGenerator::new())).unwrap();
        assert_eq!(serdes.config(), &SerdesConfig::default());
        let generator = serdes.into_generator();
        assert_eq!(generator.buffered_len(), 0);
    }
}
