//! Error types for the tsdb-serdes serializer.

use thiserror::Error;

/// The main error type for all tsdb-serdes operations.
///
/// Argument validation failures surface as [`SerdesError::InvalidArgument`]
/// before any bytes are written. Failures from the byte sink and from shard
/// iterators are propagated as-is, never retried or replaced.
#[derive(Error, Debug)]
pub enum SerdesError {
    /// A required argument was absent or unusable.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// The requested operation is not supported by this serializer.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// Name of the refused operation.
        operation: &'static str,
    },

    /// Error writing to the byte sink.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A shard iterator failed while producing samples.
    #[error("iterator error: {0}")]
    Iterator(#[from] IteratorError),

    /// A sample could not be added to a shard.
    #[error("shard error: {0}")]
    Shard(#[from] ShardError),

    /// A time series or group identity was malformed.
    #[error("id error: {0}")]
    Id(#[from] IdError),

    /// The serializer configuration was invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The token writer was driven into an invalid state.
    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),
}

impl SerdesError {
    /// Shorthand for building an [`SerdesError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// Errors produced by shard iterators while yielding samples.
#[derive(Error, Debug)]
pub enum IteratorError {
    /// The iterator could not produce its next sample.
    #[error("iterator for metric '{metric}' failed: {reason}")]
    Failed {
        /// Metric of the failing series.
        metric: String,
        /// Description of the failure.
        reason: String,
    },

    /// The iterator's backing source was closed before it was drained.
    #[error("iterator for metric '{metric}' was closed")]
    Closed {
        /// Metric of the closed series.
        metric: String,
    },
}

/// Errors that can occur when building a shard.
#[derive(Error, Debug)]
pub enum ShardError {
    /// The shard window ends before it starts.
    #[error("invalid shard window: start {start} > end {end}")]
    InvalidWindow {
        /// Window start in milliseconds.
        start: i64,
        /// Window end in milliseconds.
        end: i64,
    },

    /// The sample timestamp lies outside `[start, end)`.
    #[error("timestamp {timestamp} is outside shard window {start}..{end}")]
    OutOfWindow {
        /// The rejected timestamp.
        timestamp: i64,
        /// Window start in milliseconds.
        start: i64,
        /// Window end in milliseconds.
        end: i64,
    },

    /// The sample timestamp is older than the last accepted one.
    #[error("timestamp {timestamp} is older than previous sample at {previous}")]
    OutOfOrder {
        /// The rejected timestamp.
        timestamp: i64,
        /// Timestamp of the last sample in the shard.
        previous: i64,
    },
}

/// Errors that can occur when building identities.
#[derive(Error, Debug)]
pub enum IdError {
    /// A time series id was built without any metric.
    #[error("time series id requires at least one metric")]
    MissingMetric,

    /// A tag was added with an empty key.
    #[error("tag key must not be empty (value '{value}')")]
    EmptyTagKey {
        /// The value supplied with the empty key.
        value: String,
    },

    /// A group id was empty.
    #[error("group id must not be empty")]
    EmptyGroupId,
}

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("failed to parse serializer config: {source}")]
    Parse {
        /// The underlying JSON parsing error.
        #[source]
        source: serde_json::Error,
    },

    /// The flush threshold must be positive.
    #[error("flush_threshold must be > 0")]
    ZeroFlushThreshold,
}

/// Errors raised when the token writer is driven out of sequence.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// An end token did not match the innermost open container.
    #[error("cannot close {expected}: innermost open container is {actual}")]
    MismatchedEnd {
        /// The container the caller tried to close.
        expected: &'static str,
        /// The container actually open, or `"none"`.
        actual: &'static str,
    },

    /// A value was written inside an object without a preceding field name.
    #[error("value written inside an object without a field name")]
    MissingFieldName,

    /// A field name was written outside an object or twice in a row.
    #[error("field name '{name}' is not allowed here")]
    UnexpectedFieldName {
        /// The rejected field name.
        name: String,
    },

    /// A second root value was written into the same document.
    #[error("document already has a root value")]
    MultipleRoots,
}

/// Type alias for `Result<T, SerdesError>`.
pub type Result<T> = std::result::Result<T, SerdesError>;
