//! Numeric token classification for sample values.
//!
//! JSON has no tokens for NaN or the infinities, and JavaScript consumers
//! turn `42.0` into a float. Every sample value is therefore mapped onto a
//! [`NumericToken`] before it is written:
//!
//! | Value                                  | Token                      |
//! |----------------------------------------|----------------------------|
//! | integer, or integral finite double     | bare integer, e.g. `42`    |
//! | finite fractional double               | shortest round-trip, `0.5` |
//! | NaN, +inf, -inf                        | `"NaN"`, `"Infinity"`, `"-Infinity"` |

use crate::sample::NumericValue;

/// Lower bound (inclusive) of doubles that convert to `i64` exactly.
const I64_MIN_F64: f64 = -9_223_372_036_854_775_808.0;

/// Upper bound (exclusive) of doubles that convert to `i64` exactly.
const I64_MAX_EXCLUSIVE_F64: f64 = 9_223_372_036_854_775_808.0;

/// The JSON shape a sample value is written as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericToken {
    /// A bare integer literal.
    Integer(i64),
    /// An integral double too large for `i64`, written as plain digits.
    IntegralDigits(f64),
    /// A finite, fractional double written in shortest round-trip form.
    Decimal(f64),
    /// A non-finite double written as a JSON string.
    NonFinite(&'static str),
}

impl NumericToken {
    /// Classifies a sample value.
    pub fn classify(value: NumericValue) -> Self {
        match value {
            NumericValue::Integer(v) => Self::Integer(v),
            NumericValue::Float(v) => Self::classify_f64(v),
        }
    }

    /// Classifies a raw double.
    #[allow(clippy::cast_possible_truncation)] // Range checked before the cast
    pub fn classify_f64(v: f64) -> Self {
        if v.is_nan() {
            return Self::NonFinite("NaN");
        }
        if v.is_infinite() {
            return Self::NonFinite(if v > 0.0 { "Infinity" } else { "-Infinity" });
        }
        if v.fract() != 0.0 {
            return Self::Decimal(v);
        }
        if (I64_MIN_F64..I64_MAX_EXCLUSIVE_F64).contains(&v) {
            Self::Integer(v as i64)
        } else {
            Self::IntegralDigits(v)
        }
    }

    /// Returns `true` if the token is written as a JSON string.
    pub fn is_quoted(&self) -> bool {
        matches!(self, Self::NonFinite(_))
    }
}

/// Renders an integral double as decimal digits with no exponent.
///
/// `f64`'s `Display` never switches to scientific notation, and for an
/// integral value it prints no fractional part.
pub(crate) fn integral_digits(v: f64) -> String {
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_pass_through() {
        assert_eq!(
            NumericToken::classify(NumericValue::Integer(42)),
            NumericToken::Integer(42)
        );
        assert_eq!(
            NumericToken::classify(NumericValue::Integer(i64::MIN)),
            NumericToken::Integer(i64::MIN)
        );
    }

    #[test]
    fn test_integral_doubles_downcast() {
        assert_eq!(NumericToken::classify_f64(42.0), NumericToken::Integer(42));
        assert_eq!(NumericToken::classify_f64(-128.0), NumericToken::Integer(-128));
        assert_eq!(NumericToken::classify_f64(5000.0), NumericToken::Integer(5000));
        assert_eq!(NumericToken::classify_f64(-0.0), NumericToken::Integer(0));
    }

    #[test]
    fn test_i64_boundaries() {
        assert_eq!(
            NumericToken::classify_f64(-9_223_372_036_854_775_808.0),
            NumericToken::Integer(i64::MIN)
        );
        // 2^63 is the first double past i64::MAX.
        assert_eq!(
            NumericToken::classify_f64(9_223_372_036_854_775_808.0),
            NumericToken::IntegralDigits(9_223_372_036_854_775_808.0)
        );
    }

    #[test]
    fn test_fractional_doubles() {
        assert_eq!(
            NumericToken::classify_f64(9866.854),
            NumericToken::Decimal(9866.854)
        );
        assert_eq!(NumericToken::classify_f64(-0.5), NumericToken::Decimal(-0.5));
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(NumericToken::classify_f64(f64::NAN), NumericToken::NonFinite("NaN"));
        assert_eq!(
            NumericToken::classify_f64(f64::INFINITY),
            NumericToken::NonFinite("Infinity")
        );
        assert_eq!(
            NumericToken::classify_f64(f64::NEG_INFINITY),
            NumericToken::NonFinite("-Infinity")
        );
        assert!(NumericToken::classify_f64(f64::NAN).is_quoted());
        assert!(!NumericToken::classify_f64(1.0).is_quoted());
    }

    #[test]
    fn test_integral_digits_have_no_exponent() {
        let digits = integral_digits(1e300);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(digits.len(), 301);
        assert_eq!(integral_digits(-1e20), "-100000000000000000000");
    }
}
