//! Numeric normalization.
//!
//! Decoders disagree about numeric subtypes: JSON has only doubles, TOML
//! always signs its integers, YAML produces whichever fits. Every value
//! returned from a lookup passes through [`normalize`] so callers see two
//! numeric kinds only — whole numbers (signed, or unsigned when beyond
//! signed range) and floats.

use crate::value::Value;

/// 2^63, the first float beyond `i64`.
const SIGNED_BOUND: f64 = 9_223_372_036_854_775_808.0;
/// 2^64, the first float beyond `u64`.
const UNSIGNED_BOUND: f64 = 18_446_744_073_709_551_616.0;

/// Collapse a value's numeric representation onto the canonical kinds.
///
/// An integral float within signed range becomes [`Value::Integer`]; within
/// unsigned-but-not-signed range it becomes [`Value::Unsigned`]; anything
/// larger (or smaller than `i64::MIN`) stays a float. An unsigned value
/// that fits the signed range is re-signed. Non-numeric values pass through
/// untouched, and the function is idempotent.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Float(f) if f.is_finite() && f.trunc() == f => {
            if f >= i64::MIN as f64 && f < SIGNED_BOUND {
                Value::Integer(f as i64)
            } else if f >= SIGNED_BOUND && f < UNSIGNED_BOUND {
                Value::Unsigned(f as u64)
            } else {
                Value::Float(f)
            }
        }
        Value::Unsigned(u) if u <= i64::MAX as u64 => Value::Integer(u as i64),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_float_in_signed_range_becomes_integer() {
        assert_eq!(normalize(Value::Float(100.0)), Value::Integer(100));
        assert_eq!(normalize(Value::Float(0.0)), Value::Integer(0));
        assert_eq!(
            normalize(Value::Float(i64::MIN as f64)),
            Value::Integer(i64::MIN)
        );
        // 1e2 is how a decoder hands over scientific notation.
        assert_eq!(normalize(Value::Float(1e2)), Value::Integer(100));
    }

    #[test]
    fn integral_float_beyond_signed_range_becomes_unsigned() {
        // 2^63 is past i64::MAX but well inside u64.
        let v = normalize(Value::Float(SIGNED_BOUND));
        assert_eq!(v, Value::Unsigned(9_223_372_036_854_775_808));

        let v = normalize(Value::Float(1.5e19));
        assert!(matches!(v, Value::Unsigned(_)));
    }

    #[test]
    fn float_beyond_unsigned_range_stays_float() {
        assert_eq!(normalize(Value::Float(4e19)), Value::Float(4e19));
        assert_eq!(normalize(Value::Float(-4e19)), Value::Float(-4e19));
    }

    #[test]
    fn fractional_float_stays_float() {
        assert_eq!(normalize(Value::Float(1.5)), Value::Float(1.5));
        assert!(matches!(normalize(Value::Float(f64::NAN)), Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn unsigned_within_signed_range_is_resigned() {
        assert_eq!(normalize(Value::Unsigned(0)), Value::Integer(0));
        assert_eq!(
            normalize(Value::Unsigned(i64::MAX as u64)),
            Value::Integer(i64::MAX)
        );
        assert_eq!(
            normalize(Value::Unsigned(u64::MAX)),
            Value::Unsigned(u64::MAX)
        );
    }

    #[test]
    fn non_numeric_values_pass_through() {
        assert_eq!(
            normalize(Value::String("1e2".to_string())),
            Value::String("1e2".to_string())
        );
        assert_eq!(normalize(Value::Null), Value::Null);
        assert_eq!(normalize(Value::Bool(true)), Value::Bool(true));
    }

    #[test]
    fn normalization_is_idempotent() {
        let cases = vec![
            Value::Float(100.0),
            Value::Float(1.5),
            Value::Float(SIGNED_BOUND),
            Value::Float(4e19),
            Value::Unsigned(u64::MAX),
            Value::Unsigned(7),
            Value::Integer(-3),
        ];

        for case in cases {
            let once = normalize(case.clone());
            let twice = normalize(once.clone());
            assert_eq!(once, twice, "normalize(normalize({:?}))", case);
        }
    }
}
