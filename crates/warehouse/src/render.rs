//! Cell rendering shared by the backends.
//!
//! Values are shown the way the agent's prompt examples show them: floats
//! use the shortest round-trip digits with a decimal point or a two-digit
//! exponent, booleans are `True`/`False`, bytes are `b'..'` literals and
//! timestamps carry microseconds only when they have some.

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, Timelike};

/// Exponents outside `[-4, 16)` switch to scientific notation.
const MIN_PLAIN_EXP: i32 = -4;
const MAX_PLAIN_EXP: i32 = 16;

pub(crate) fn float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        let sign = if v > 0.0 { "" } else { "-" };
        return format!("{sign}inf");
    }

    let scientific = format!("{v:e}");
    let (mantissa, exp) = match scientific.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if v != 0.0 && !(MIN_PLAIN_EXP..MAX_PLAIN_EXP).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
    } else if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

pub(crate) fn boolean(v: bool) -> String {
    let s = if v { "True" } else { "False" };
    s.to_string()
}

pub(crate) fn bytes(v: &[u8]) -> String {
    format!("b'{}'", v.escape_ascii())
}

pub(crate) fn datetime(v: NaiveDateTime) -> String {
    format!("{}{}", v.format("%Y-%m-%d %H:%M:%S"), micros(v.nanosecond()))
}

pub(crate) fn datetime_offset(v: DateTime<FixedOffset>) -> String {
    format!(
        "{}{}{}",
        v.format("%Y-%m-%d %H:%M:%S"),
        micros(v.nanosecond()),
        v.format("%:z")
    )
}

pub(crate) fn time(v: NaiveTime) -> String {
    format!("{}{}", v.format("%H:%M:%S"), micros(v.nanosecond()))
}

/// `.ffffff` when the sub-second part has microseconds, else nothing.
fn micros(nanos: u32) -> String {
    let micros = (nanos % 1_000_000_000) / 1_000;
    if micros == 0 {
        String::new()
    } else {
        format!(".{micros:06}")
    }
}
