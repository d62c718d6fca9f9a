//! Streaming JSON token writer.
//!
//! [`JsonGenerator`] emits compact JSON tokens into an internal buffer using
//! `serde_json`'s [`CompactFormatter`], inserting separators itself from a
//! small nesting stack. The buffer is drained into a byte sink with
//! [`flush_into`](JsonGenerator::flush_into), so a caller decides how much
//! output is held in memory before it reaches the sink.
//!
//! ```rust
//! use tsdb_serdes::generator::JsonGenerator;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut generator = JsonGenerator::new();
//! generator.write_start_object()?;
//! generator.write_field_name("dps")?;
//! generator.write_start_object()?;
//! generator.write_field_name("1486045801000")?;
//! generator.write_i64(42)?;
//! generator.write_end_object()?;
//! generator.write_end_object()?;
//!
//! let mut sink = Vec::new();
//! generator.flush_into(&mut sink)?;
//! assert_eq!(sink, br#"{"dps":{"1486045801000":42}}"#);
//! # Ok(())
//! # }
//! ```

use std::io::Write;

use serde_json::ser::{CompactFormatter, Formatter};

use crate::error::{GeneratorError, Result};
use crate::numeric::{self, NumericToken};
use crate::sample::NumericValue;

/// Open container on the nesting stack.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Array { first: bool },
    Object { first: bool, has_key: bool },
}

impl Frame {
    fn name(self) -> &'static str {
        match self {
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
        }
    }
}

/// Buffered, compact JSON token writer.
#[derive(Debug)]
pub struct JsonGenerator {
    buf: Vec<u8>,
    formatter: CompactFormatter,
    stack: Vec<Frame>,
    root_written: bool,
}

impl JsonGenerator {
    /// Creates a generator with an empty buffer.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a generator whose buffer can hold `capacity` bytes before
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            formatter: CompactFormatter,
            stack: Vec::new(),
            root_written: false,
        }
    }

    /// Opens an array.
    ///
    /// # Errors
    ///
    /// Returns a [`GeneratorError`] if a value is not allowed here.
    pub fn write_start_array(&mut self) -> Result<()> {
        self.before_value()?;
        self.formatter.begin_array(&mut self.buf)?;
        self.stack.push(Frame::Array { first: true });
        Ok(())
    }

    /// Closes the innermost array.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::MismatchedEnd`] if the innermost open
    /// container is not an array.
    pub fn write_end_array(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Frame::Array { .. }) => {}
            other => return Err(mismatched("array", other.copied())),
        }
        self.stack.pop();
        self.formatter.end_array(&mut self.buf)?;
        self.after_value()
    }

    /// Opens an object.
    ///
    /// # Errors
    ///
    /// Returns a [`GeneratorError`] if a value is not allowed here.
    pub fn write_start_object(&mut self) -> Result<()> {
        self.before_value()?;
        self.formatter.begin_object(&mut self.buf)?;
        self.stack.push(Frame::Object {
            first: true,
            has_key: false,
        });
        Ok(())
    }

    /// Closes the innermost object.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::MismatchedEnd`] if the innermost open
    /// container is not an object, or a field name is still waiting for
    /// its value.
    pub fn write_end_object(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Frame::Object { has_key: false, .. }) => {}
            Some(Frame::Object { has_key: true, .. }) => {
                return Err(GeneratorError::MismatchedEnd {
                    expected: "object",
                    actual: "field without value",
                }
                .into());
            }
            other => return Err(mismatched("object", other.copied())),
        }
        self.stack.pop();
        self.formatter.end_object(&mut self.buf)?;
        self.after_value()
    }

    /// Writes an object field name.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::UnexpectedFieldName`] outside an object or
    /// directly after another field name.
    pub fn write_field_name(&mut self, name: &str) -> Result<()> {
        let Some(Frame::Object { first, has_key }) = self.stack.last_mut() else {
            return Err(unexpected_field(name));
        };
        if *has_key {
            return Err(unexpected_field(name));
        }
        self.formatter.begin_object_key(&mut self.buf, *first)?;
        *first = false;
        *has_key = true;
        serde_json::to_writer(&mut self.buf, name).map_err(std::io::Error::from)?;
        self.formatter.end_object_key(&mut self.buf)?;
        Ok(())
    }

    /// Writes an escaped string value.
    ///
    /// # Errors
    ///
    /// Returns a [`GeneratorError`] if a value is not allowed here.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.before_value()?;
        serde_json::to_writer(&mut self.buf, value).map_err(std::io::Error::from)?;
        self.after_value()
    }

    /// Writes an integer value.
    ///
    /// # Errors
    ///
    /// Returns a [`GeneratorError`] if a value is not allowed here.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.before_value()?;
        self.formatter.write_i64(&mut self.buf, value)?;
        self.after_value()
    }

    /// Writes a double value in shortest round-trip form.
    ///
    /// NaN and the infinities have no JSON number form and are written as
    /// the strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
    ///
    /// # Errors
    ///
    /// Returns a [`GeneratorError`] if a value is not allowed here.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        if let NumericToken::NonFinite(text) = NumericToken::classify_f64(value) {
            return self.write_string(text);
        }
        self.before_value()?;
        self.formatter.write_f64(&mut self.buf, value)?;
        self.after_value()
    }

    /// Writes a pre-rendered number verbatim.
    ///
    /// The caller guarantees `digits` is a valid JSON number.
    ///
    /// # Errors
    ///
    /// Returns a [`GeneratorError`] if a value is not allowed here.
    pub fn write_number_digits(&mut self, digits: &str) -> Result<()> {
        self.before_value()?;
        self.formatter.write_number_str(&mut self.buf, digits)?;
        self.after_value()
    }

    /// Writes a sample value using its [`NumericToken`] shape.
    ///
    /// # Errors
    ///
    /// Returns a [`GeneratorError`] if a value is not allowed here.
    pub fn write_numeric(&mut self, value: NumericValue) -> Result<()> {
        match NumericToken::classify(value) {
            NumericToken::Integer(v) => self.write_i64(v),
            NumericToken::IntegralDigits(v) => {
                self.write_number_digits(&numeric::integral_digits(v))
            }
            NumericToken::Decimal(v) => self.write_f64(v),
            NumericToken::NonFinite(text) => self.write_string(text),
        }
    }

    /// Number of bytes waiting to be flushed.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` once a root value has been fully written.
    pub fn is_complete(&self) -> bool {
        self.root_written && self.stack.is_empty()
    }

    /// Drains the buffered bytes into `sink`.
    ///
    /// Only `write_all` is called on the sink; flushing or closing it is
    /// left to the owner.
    ///
    /// # Errors
    ///
    /// Returns the sink's I/O error unchanged. The buffer is kept intact
    /// when the write fails.
    pub fn flush_into<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        sink.write_all(&self.buf)?;
        self.buf.clear();
        Ok(())
    }

    /// Discards buffered bytes and nesting state.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.stack.clear();
        self.root_written = false;
    }

    fn before_value(&mut self) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                if self.root_written {
                    return Err(GeneratorError::MultipleRoots.into());
                }
                self.root_written = true;
            }
            Some(Frame::Array { first }) => {
                self.formatter.begin_array_value(&mut self.buf, *first)?;
                *first = false;
            }
            Some(Frame::Object { has_key, .. }) => {
                if !*has_key {
                    return Err(GeneratorError::MissingFieldName.into());
                }
                self.formatter.begin_object_value(&mut self.buf)?;
            }
        }
        Ok(())
    }

    fn after_value(&mut self) -> Result<()> {
        match self.stack.last_mut() {
            None => {}
            Some(Frame::Array { .. }) => self.formatter.end_array_value(&mut self.buf)?,
            Some(Frame::Object { has_key, .. }) => {
                *has_key = false;
                self.formatter.end_object_value(&mut self.buf)?;
            }
        }
        Ok(())
    }
}

impl Default for JsonGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn mismatched(expected: &'static str, actual: Option<Frame>) -> crate::error::SerdesError {
    GeneratorError::MismatchedEnd {
        expected,
        actual: actual.map_or("none", Frame::name),
    }
    .into()
}

fn unexpected_field(name: &str) -> crate::error::SerdesError {
    GeneratorError::UnexpectedFieldName {
        name: name.to_string(),
    }
    .into()
}
