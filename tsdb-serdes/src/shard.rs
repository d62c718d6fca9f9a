//! Shard iterators over numeric samples.
//!
//! A shard is a contiguous slice `[start, end)` of a single time series.
//! The serializer only depends on the [`TimeSeriesIterator`] trait; the
//! in-memory [`NumericMillisecondShard`] is the implementation used by the
//! query layer and by tests.

use std::fmt;

use crate::error::{Result, ShardError};
use crate::id::TimeSeriesId;
use crate::sample::{NumericValue, Sample, Timestamp};

/// A lazy, forward-only source of samples for one time series.
///
/// Implementations must yield samples in non-decreasing timestamp order,
/// all within `[start(), end())`. A yielded `Err` aborts serialization and
/// is propagated to the caller unchanged.
pub trait TimeSeriesIterator: fmt::Debug {
    /// Identity of the series this iterator produces.
    fn id(&self) -> &TimeSeriesId;

    /// Inclusive start of the time window.
    fn start(&self) -> Timestamp;

    /// Exclusive end of the time window.
    fn end(&self) -> Timestamp;

    /// Returns a fresh cursor over the samples.
    fn samples(&self) -> Box<dyn Iterator<Item = Result<Sample>> + '_>;
}

/// In-memory shard of millisecond-resolution numeric samples.
#[derive(Debug, Clone)]
pub struct NumericMillisecondShard {
    id: TimeSeriesId,
    start: Timestamp,
    end: Timestamp,
    samples: Vec<Sample>,
}

impl NumericMillisecondShard {
    /// Creates an empty shard covering `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`ShardError::InvalidWindow`] if `start > end`.
    pub fn new(id: TimeSeriesId, start: Timestamp, end: Timestamp) -> Result<Self> {
        if start > end {
            return Err(ShardError::InvalidWindow {
                start: start.as_millis(),
                end: end.as_millis(),
            }
            .into());
        }
        Ok(Self {
            id,
            start,
            end,
            samples: Vec::new(),
        })
    }

    /// Appends a sample.
    ///
    /// # Errors
    ///
    /// Returns [`ShardError::OutOfWindow`] if the timestamp is outside
    /// `[start, end)` and [`ShardError::OutOfOrder`] if it is older than the
    /// previously added sample.
    pub fn add(
        &mut self,
        timestamp_ms: i64,
        value: impl Into<NumericValue>,
        real_count: u32,
    ) -> Result<()> {
        let timestamp = Timestamp::from_millis(timestamp_ms);
        if timestamp < self.start || timestamp >= self.end {
            return Err(ShardError::OutOfWindow {
                timestamp: timestamp_ms,
                start: self.start.as_millis(),
                end: self.end.as_millis(),
            }
            .into());
        }
        if let Some(last) = self.samples.last()
            && timestamp < last.timestamp
        {
            return Err(ShardError::OutOfOrder {
                timestamp: timestamp_ms,
                previous: last.timestamp.as_millis(),
            }
            .into());
        }
        self.samples.push(Sample::new(timestamp, value, real_count));
        Ok(())
    }

    /// Number of samples in the shard.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the shard holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl TimeSeriesIterator for NumericMillisecondShard {
    fn id(&self) -> &TimeSeriesId {
        &self.id
    }

    fn start(&self) -> Timestamp {
        self.start
    }

    fn end(&self) -> Timestamp {
        self.end
    }

    fn samples(&self) -> Box<dyn Iterator<Item = Result<Sample>> + '_> {
        Box::new(self.samples.iter().copied().map(Ok))
    }
}
