//! Primitive conversions: nil, booleans, numbers, strings

use crate::value::HostValue;
use mlua::{Lua, Value};

/// 2^63, the first float past `i64::MAX`
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Decode a Lua float.
///
/// Integral values inside the `i64` range come back as `Int`; everything else
/// (fractions, NaN, infinities, huge magnitudes) stays `Float`.
pub(crate) fn number_to_host(n: f64) -> HostValue {
    if n.fract() == 0.0 && (-I64_LIMIT..I64_LIMIT).contains(&n) {
        HostValue::Int(n as i64)
    } else {
        HostValue::Float(n)
    }
}

/// Copy a Lua string's bytes
pub(crate) fn string_to_host(s: &mlua::String) -> HostValue {
    HostValue::String(s.as_bytes().to_vec())
}

/// Copy host bytes into a new Lua string
pub(crate) fn string_to_script(lua: &Lua, bytes: &[u8]) -> mlua::Result<Value> {
    lua.create_string(bytes).map(Value::String)
}

/// Field name for a numeric table key
///
/// Integral floats print without a fractional part; `f64`'s `Display` never
/// switches to exponent notation.
pub(crate) fn number_key_name(n: f64) -> String {
    match number_to_host(n) {
        HostValue::Int(i) => i.to_string(),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_float_becomes_int() {
        assert_eq!(number_to_host(2.0), HostValue::Int(2));
        assert_eq!(number_to_host(-7.0), HostValue::Int(-7));
        assert_eq!(number_to_host(-0.0), HostValue::Int(0));
    }

    #[test]
    fn test_fractional_float_stays_float() {
        assert_eq!(number_to_host(2.5), HostValue::Float(2.5));
        assert_eq!(number_to_host(-0.125), HostValue::Float(-0.125));
    }

    #[test]
    fn test_non_finite_stays_float() {
        assert!(matches!(number_to_host(f64::NAN), HostValue::Float(n) if n.is_nan()));
        assert_eq!(number_to_host(f64::INFINITY), HostValue::Float(f64::INFINITY));
        assert_eq!(
            number_to_host(f64::NEG_INFINITY),
            HostValue::Float(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_out_of_range_stays_float() {
        assert_eq!(number_to_host(1e300), HostValue::Float(1e300));
        assert_eq!(number_to_host(I64_LIMIT), HostValue::Float(I64_LIMIT));
        assert_eq!(number_to_host(-I64_LIMIT), HostValue::Int(i64::MIN));
    }

    #[test]
    fn test_number_key_names() {
        assert_eq!(number_key_name(3.0), "3");
        assert_eq!(number_key_name(1.5), "1.5");
        assert_eq!(number_key_name(1e21), "1000000000000000000000");
    }
}
