// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";
pub const DATETIME_LAYOUT: &str = "YYYY-MM-DD HH:MM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidMoney,
    NegativeMoney,
    InvalidDate,
    InvalidDateTime,
    InvalidInt,
    NegativeInt,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMoney => f.write_str("invalid money value"),
            Self::NegativeMoney => f.write_str("negative money value"),
            Self::InvalidDate => write!(f, "invalid date value (use {DATE_LAYOUT})"),
            Self::InvalidDateTime => {
                write!(f, "invalid date/time value (use {DATETIME_LAYOUT})")
            }
            Self::InvalidInt => f.write_str("invalid integer value"),
            Self::NegativeInt => f.write_str("negative integer value"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

pub fn parse_required_cents(input: &str) -> ValidationResult<i64> {
    parse_cents(input.trim())
}

pub fn parse_optional_cents(input: &str) -> ValidationResult<Option<i64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_cents(trimmed).map(Some)
}

/// Plain `1234.56` form used to pre-fill money fields.
pub fn format_cents_input(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    format!("{sign}{}.{:02}", absolute / 100, absolute % 100)
}

pub fn parse_required_date(input: &str) -> ValidationResult<Date> {
    parse_date(input.trim())
}

pub fn parse_optional_date(input: &str) -> ValidationResult<Option<Date>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date(trimmed).map(Some)
}

/// Accepts `YYYY-MM-DD HH:MM` or a bare date, which means midnight.
pub fn parse_required_datetime(input: &str) -> ValidationResult<PrimitiveDateTime> {
    let trimmed = input.trim();
    if let Ok(value) = PrimitiveDateTime::parse(
        trimmed,
        &format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ) {
        return Ok(value);
    }
    parse_date(trimmed)
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
        .map_err(|_| ValidationError::InvalidDateTime)
}

pub fn format_datetime_input(value: PrimitiveDateTime) -> String {
    format!(
        "{} {:02}:{:02}",
        crate::table::format_date(value.date()),
        value.hour(),
        value.minute()
    )
}

pub fn parse_optional_int(input: &str) -> ValidationResult<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let value = trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidInt)?;
    if value < 0 {
        return Err(ValidationError::NegativeInt);
    }
    Ok(value)
}

pub fn parse_required_int(input: &str) -> ValidationResult<i64> {
    if input.trim().is_empty() {
        return Err(ValidationError::InvalidInt);
    }
    parse_optional_int(input)
}

fn parse_cents(input: &str) -> ValidationResult<i64> {
    let clean = input.replace(',', "");
    if clean.starts_with('-') {
        return Err(ValidationError::NegativeMoney);
    }

    let clean = clean.strip_prefix('$').unwrap_or(&clean);
    if clean.is_empty() {
        return Err(ValidationError::InvalidMoney);
    }

    let (whole, fraction) = match clean.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (clean, None),
    };

    let whole = parse_digits(whole, true)?;
    if whole > i64::MAX / 100 {
        return Err(ValidationError::InvalidMoney);
    }

    let fraction = match fraction {
        None => 0,
        Some(digits) if digits.len() > 2 || digits.contains('.') => {
            return Err(ValidationError::InvalidMoney);
        }
        Some(digits) => {
            let value = parse_digits(digits, false)?;
            if digits.len() == 1 { value * 10 } else { value }
        }
    };

    whole
        .checked_mul(100)
        .and_then(|value| value.checked_add(fraction))
        .ok_or(ValidationError::InvalidMoney)
}

fn parse_digits(input: &str, allow_empty: bool) -> ValidationResult<i64> {
    if input.is_empty() {
        if allow_empty {
            return Ok(0);
        }
        return Err(ValidationError::InvalidMoney);
    }
    if !input.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidMoney);
    }
    input
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidMoney)
}

fn parse_date(input: &str) -> ValidationResult<Date> {
    Date::parse(input, &format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidDate)
}

#[cfg(test)]
mod tests {
    use super::{
        ValidationError, format_cents_input, format_datetime_input, parse_optional_cents,
        parse_optional_date, parse_optional_int, parse_required_cents, parse_required_date,
        parse_required_datetime, parse_required_int,
    };
    use std::collections::BTreeMap;
    use time::macros::datetime;

    #[test]
    fn parse_required_cents_test() {
        let cases = BTreeMap::from([
            ("100", 10_000),
            ("100.5", 10_050),
            ("100.05", 10_005),
            ("$1,234.56", 123_456),
            (".75", 75),
            ("0.99", 99),
        ]);
        for (input, expected) in cases {
            let got = parse_required_cents(input).expect("money should parse");
            assert_eq!(got, expected, "input {input}");
        }
    }

    #[test]
    fn parse_required_cents_invalid() {
        for input in ["", "12.345", "abc", "1.2.3"] {
            assert!(parse_required_cents(input).is_err(), "input {input}");
        }
        assert_eq!(
            parse_required_cents("-5").expect_err("negative should fail"),
            ValidationError::NegativeMoney
        );
    }

    #[test]
    fn optional_cents_round_trip_through_input_format() {
        assert_eq!(parse_optional_cents("  ").expect("blank ok"), None);
        let cents = parse_optional_cents(&format_cents_input(1_250)).expect("formatted parses");
        assert_eq!(cents, Some(1_250));
    }

    #[test]
    fn dates_use_iso_layout() {
        let date = parse_required_date(" 2026-02-28 ").expect("date should parse");
        assert_eq!(date.to_string(), "2026-02-28");
        assert!(parse_required_date("28/02/2026").is_err());
        assert_eq!(parse_optional_date("").expect("blank ok"), None);
    }

    #[test]
    fn datetime_accepts_bare_dates_as_midnight() {
        let value = parse_required_datetime("2026-05-04 09:30").expect("datetime parses");
        assert_eq!(value, datetime!(2026-05-04 09:30));
        assert_eq!(format_datetime_input(value), "2026-05-04 09:30");

        let midnight = parse_required_datetime("2026-05-04").expect("date parses");
        assert_eq!(midnight, datetime!(2026-05-04 00:00));

        assert_eq!(
            parse_required_datetime("soon").expect_err("garbage fails"),
            ValidationError::InvalidDateTime
        );
    }

    #[test]
    fn integers_reject_negatives() {
        assert_eq!(parse_optional_int("").expect("blank is zero"), 0);
        assert_eq!(parse_required_int("42").expect("parses"), 42);
        assert_eq!(
            parse_required_int("-1").expect_err("negative"),
            ValidationError::NegativeInt
        );
        assert_eq!(
            parse_required_int("").expect_err("blank"),
            ValidationError::InvalidInt
        );
    }
}
