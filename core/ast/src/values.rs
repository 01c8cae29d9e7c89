//! Native values produced by [`crate::types::Type::parse_expression`].
//!
//! Every value renders as the literal it was parsed from, in canonical form.
//! Values written as string literals render quoted.

use core::fmt;
use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use url::Url;
use uuid::Uuid;

use crate::expression::{write_quoted, write_sequence};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const NAIVE_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
pub(crate) const OFFSET_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// A date-time either with an explicit UTC offset or without one. No
/// timezone conversion is ever applied.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DateTimeValue {
    Naive(NaiveDateTime),
    Offset(chrono::DateTime<FixedOffset>),
}

impl Display for DateTimeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DateTimeValue::Naive(value) => write!(f, "{}", value.format(NAIVE_DATE_TIME_FORMAT)),
            DateTimeValue::Offset(value) => {
                write!(f, "{}", value.format(OFFSET_DATE_TIME_FORMAT))
            }
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTimeValue),
    Time(NaiveTime),
    Duration(TimeDelta),
    Directory(PathBuf),
    Filename(PathBuf),
    Guid(Uuid),
    Uri(Url),
    Tuple(Vec<Value>),
    List(Vec<Value>),
}

/// Renders `[D.]H:MM:SS[.ffffff]`.
pub(crate) fn format_duration(f: &mut Formatter<'_>, value: &TimeDelta) -> fmt::Result {
    let (sign, value) = if *value < TimeDelta::zero() {
        ("-", value.abs())
    } else {
        ("", *value)
    };
    let total_seconds = value.num_seconds();
    let micros = value.subsec_nanos() / 1_000;
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    write!(f, "{sign}")?;
    if days > 0 {
        write!(f, "{days}.")?;
    }
    write!(f, "{hours}:{minutes:02}:{seconds:02}")?;
    if micros > 0 {
        write!(f, ".{micros:06}")?;
    }
    Ok(())
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
            Value::String(value) => write_quoted(f, value),
            Value::Date(value) => write!(f, "\"{}\"", value.format(DATE_FORMAT)),
            Value::DateTime(value) => write!(f, "\"{value}\""),
            Value::Time(value) => write!(f, "\"{}\"", value.format(TIME_FORMAT)),
            Value::Duration(value) => {
                write!(f, "\"")?;
                format_duration(f, value)?;
                write!(f, "\"")
            }
            Value::Directory(value) | Value::Filename(value) => {
                write_quoted(f, &value.to_string_lossy())
            }
            Value::Guid(value) => write!(f, "\"{}\"", value.hyphenated()),
            Value::Uri(value) => write_quoted(f, value.as_str()),
            Value::Tuple(values) => write_sequence(f, "(", ")", values),
            Value::List(values) => write_sequence(f, "[", "]", values),
        }
    }
}
