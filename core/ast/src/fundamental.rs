//! Fundamental (scalar) types.
//!
//! Fundamental types are referenced by reserved names. Their constraints are
//! written as metadata items on the reference, e.g. `Integer { min: 0 }`,
//! and are consumed from the metadata when the type is built.

use std::{path::PathBuf, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use regex::Regex;
use url::Url;
use uuid::Uuid;

use crate::{
    errors::{Diagnostic, DiagnosticKind},
    expression::{Expression, ExpressionKind},
    metadata::{Metadata, MetadataItem},
    values::{DATE_FORMAT, DateTimeValue, NAIVE_DATE_TIME_FORMAT, TIME_FORMAT, Value},
};

pub const RESERVED_TYPE_NAMES: [&str; 12] = [
    "Boolean",
    "Integer",
    "Number",
    "String",
    "Date",
    "DateTime",
    "Time",
    "Duration",
    "Directory",
    "Filename",
    "Guid",
    "Uri",
];

#[must_use]
pub fn is_reserved_type_name(name: &str) -> bool {
    RESERVED_TYPE_NAMES.contains(&name)
}

/// An anchored regular expression; compares by its source text.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(&format!("^(?:{source})$"))?,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl serde::Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

#[derive(Clone, PartialEq, Debug, Default, serde::Serialize)]
pub struct IntegerConstraints {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub bits: Option<u8>,
}

#[derive(Clone, PartialEq, Debug, Default, serde::Serialize)]
pub struct NumberConstraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub bits: Option<u8>,
}

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct StringConstraints {
    pub min_length: usize,
    pub max_length: Option<usize>,
    pub pattern: Option<Pattern>,
}

impl Default for StringConstraints {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: None,
            pattern: None,
        }
    }
}

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub enum FundamentalType {
    Boolean,
    Integer(IntegerConstraints),
    Number(NumberConstraints),
    String(StringConstraints),
    Date,
    DateTime,
    Time,
    Duration,
    Directory { ensure_exists: bool },
    Filename { ensure_exists: bool, match_any: bool },
    Guid,
    Uri,
}

impl FundamentalType {
    /// Builds the fundamental type called `name`, consuming its constraint
    /// items from `metadata`. Returns `Ok(None)` if `name` is not reserved.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConstraint` if a constraint has the wrong literal kind
    /// or an impossible value.
    pub fn from_constraints(
        name: &str,
        metadata: &mut Option<Metadata>,
    ) -> Result<Option<Self>, Diagnostic> {
        let mut constraints = Constraints {
            type_name: "",
            metadata,
        };
        let fundamental = match name {
            "Boolean" => FundamentalType::Boolean,
            "Integer" => {
                constraints.type_name = "Integer";
                let min = constraints.integer("min")?.map(|(v, _)| v);
                let max = constraints.integer("max")?;
                if let (Some(min), Some((max, item))) = (min, &max)
                    && *max < min
                {
                    return Err(constraints.invalid(item, "max", "must not be less than `min`"));
                }
                let bits = constraints.bits("bits", |bits| (1..=64).contains(&bits))?;
                FundamentalType::Integer(IntegerConstraints {
                    min,
                    max: max.map(|(v, _)| v),
                    bits,
                })
            }
            "Number" => {
                constraints.type_name = "Number";
                let min = constraints.number("min")?.map(|(v, _)| v);
                let max = constraints.number("max")?;
                if let (Some(min), Some((max, item))) = (min, &max)
                    && *max < min
                {
                    return Err(constraints.invalid(item, "max", "must not be less than `min`"));
                }
                let bits = constraints.bits("bits", |bits| matches!(bits, 16 | 32 | 64))?;
                FundamentalType::Number(NumberConstraints {
                    min,
                    max: max.map(|(v, _)| v),
                    bits,
                })
            }
            "String" => {
                constraints.type_name = "String";
                let min_length = constraints.length("min_length")?.map(|(v, _)| v);
                let max_length = constraints.length("max_length")?;
                let min_length = min_length.unwrap_or(1);
                if let Some((max_length, item)) = &max_length
                    && *max_length < min_length
                {
                    return Err(constraints.invalid(
                        item,
                        "max_length",
                        "must not be less than `min_length`",
                    ));
                }
                let pattern = match constraints.string("pattern")? {
                    Some((source, item)) => Some(Pattern::new(&source).map_err(|err| {
                        constraints.invalid(&item, "pattern", &err.to_string())
                    })?),
                    None => None,
                };
                FundamentalType::String(StringConstraints {
                    min_length,
                    max_length: max_length.map(|(v, _)| v),
                    pattern,
                })
            }
            "Date" => FundamentalType::Date,
            "DateTime" => FundamentalType::DateTime,
            "Time" => FundamentalType::Time,
            "Duration" => FundamentalType::Duration,
            "Directory" => {
                constraints.type_name = "Directory";
                FundamentalType::Directory {
                    ensure_exists: constraints.boolean("ensure_exists")?.unwrap_or(false),
                }
            }
            "Filename" => {
                constraints.type_name = "Filename";
                FundamentalType::Filename {
                    ensure_exists: constraints.boolean("ensure_exists")?.unwrap_or(false),
                    match_any: constraints.boolean("match_any")?.unwrap_or(false),
                }
            }
            "Guid" => FundamentalType::Guid,
            "Uri" => FundamentalType::Uri,
            _ => return Ok(None),
        };
        Ok(Some(fundamental))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FundamentalType::Boolean => "Boolean",
            FundamentalType::Integer(_) => "Integer",
            FundamentalType::Number(_) => "Number",
            FundamentalType::String(_) => "String",
            FundamentalType::Date => "Date",
            FundamentalType::DateTime => "DateTime",
            FundamentalType::Time => "Time",
            FundamentalType::Duration => "Duration",
            FundamentalType::Directory { .. } => "Directory",
            FundamentalType::Filename { .. } => "Filename",
            FundamentalType::Guid => "Guid",
            FundamentalType::Uri => "Uri",
        }
    }

    /// Converts a literal into a native value, honoring the constraints.
    ///
    /// # Errors
    ///
    /// Returns a conversion diagnostic anchored at the expression.
    #[allow(clippy::cast_precision_loss)]
    pub fn parse(&self, expression: &Expression) -> Result<Value, Diagnostic> {
        let fail = |kind| Err(Diagnostic::new(kind, expression.range.clone()));
        match (self, &expression.kind) {
            (FundamentalType::Boolean, ExpressionKind::Boolean(value)) => Ok(Value::Boolean(*value)),
            (FundamentalType::Integer(constraints), ExpressionKind::Integer(value)) => {
                let value = *value;
                if let Some(min) = constraints.min
                    && value < min
                {
                    return fail(DiagnosticKind::ValueTooSmall {
                        value: value.to_string(),
                        min: min.to_string(),
                    });
                }
                if let Some(max) = constraints.max
                    && value > max
                {
                    return fail(DiagnosticKind::ValueTooLarge {
                        value: value.to_string(),
                        max: max.to_string(),
                    });
                }
                if let Some(bits) = constraints.bits
                    && !fits_signed_bits(value, bits)
                {
                    return fail(DiagnosticKind::ValueOutOfBits {
                        value: value.to_string(),
                        bits,
                    });
                }
                Ok(Value::Integer(value))
            }
            (FundamentalType::Number(constraints), ExpressionKind::Integer(value)) => {
                parse_number(constraints, *value as f64, expression)
            }
            (FundamentalType::Number(constraints), ExpressionKind::Number(value)) => {
                parse_number(constraints, *value, expression)
            }
            (FundamentalType::String(constraints), ExpressionKind::String(value)) => {
                let length = value.chars().count();
                if length < constraints.min_length {
                    return fail(DiagnosticKind::StringTooShort {
                        length,
                        min_length: constraints.min_length,
                    });
                }
                if let Some(max_length) = constraints.max_length
                    && length > max_length
                {
                    return fail(DiagnosticKind::StringTooLong { length, max_length });
                }
                if let Some(pattern) = &constraints.pattern
                    && !pattern.is_match(value)
                {
                    return fail(DiagnosticKind::PatternMismatch {
                        value: value.clone(),
                        pattern: pattern.as_str().to_string(),
                    });
                }
                Ok(Value::String(value.clone()))
            }
            (FundamentalType::Date, ExpressionKind::String(value)) => {
                NaiveDate::parse_from_str(value, DATE_FORMAT)
                    .map(Value::Date)
                    .or_else(|err| fail(invalid_value("Date", value, err)))
            }
            (FundamentalType::DateTime, ExpressionKind::String(value)) => {
                DateTime::parse_from_rfc3339(value)
                    .map(DateTimeValue::Offset)
                    .or_else(|_| {
                        NaiveDateTime::parse_from_str(value, NAIVE_DATE_TIME_FORMAT)
                            .map(DateTimeValue::Naive)
                    })
                    .map(Value::DateTime)
                    .or_else(|err| fail(invalid_value("DateTime", value, err)))
            }
            (FundamentalType::Time, ExpressionKind::String(value)) => {
                NaiveTime::parse_from_str(value, TIME_FORMAT)
                    .map(Value::Time)
                    .or_else(|err| fail(invalid_value("Time", value, err)))
            }
            (FundamentalType::Duration, ExpressionKind::String(value)) => parse_duration(value)
                .map(Value::Duration)
                .or_else(|reason| fail(invalid_value("Duration", value, reason))),
            (FundamentalType::Directory { ensure_exists }, ExpressionKind::String(value)) => {
                let path = PathBuf::from(value);
                if *ensure_exists && !path.is_dir() {
                    return fail(DiagnosticKind::PathNotFound { path });
                }
                Ok(Value::Directory(path))
            }
            (
                FundamentalType::Filename {
                    ensure_exists,
                    match_any,
                },
                ExpressionKind::String(value),
            ) => {
                let path = PathBuf::from(value);
                let found = if *match_any { path.exists() } else { path.is_file() };
                if *ensure_exists && !found {
                    return fail(DiagnosticKind::PathNotFound { path });
                }
                Ok(Value::Filename(path))
            }
            (FundamentalType::Guid, ExpressionKind::String(value)) => Uuid::from_str(value)
                .map(Value::Guid)
                .or_else(|err| fail(invalid_value("Guid", value, err))),
            (FundamentalType::Uri, ExpressionKind::String(value)) => Url::parse(value)
                .map(Value::Uri)
                .or_else(|err| fail(invalid_value("Uri", value, err))),
            (fundamental, _) => fail(DiagnosticKind::InvalidExpressionKind {
                expected: fundamental.expected_literal(),
                found: expression.kind_name(),
            }),
        }
    }

    fn expected_literal(&self) -> &'static str {
        match self {
            FundamentalType::Boolean => "a boolean",
            FundamentalType::Integer(_) => "an integer",
            FundamentalType::Number(_) => "a number",
            _ => "a string",
        }
    }
}

fn parse_number(
    constraints: &NumberConstraints,
    value: f64,
    expression: &Expression,
) -> Result<Value, Diagnostic> {
    let kind = if let Some(min) = constraints.min
        && value < min
    {
        DiagnosticKind::ValueTooSmall {
            value: value.to_string(),
            min: min.to_string(),
        }
    } else if let Some(max) = constraints.max
        && value > max
    {
        DiagnosticKind::ValueTooLarge {
            value: value.to_string(),
            max: max.to_string(),
        }
    } else if let Some(bits) = constraints.bits
        && !fits_float_bits(value, bits)
    {
        DiagnosticKind::ValueOutOfBits {
            value: value.to_string(),
            bits,
        }
    } else {
        return Ok(Value::Number(value));
    };
    Err(Diagnostic::new(kind, expression.range.clone()))
}

fn invalid_value(type_name: &'static str, value: &str, reason: impl ToString) -> DiagnosticKind {
    DiagnosticKind::InvalidValue {
        type_name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn fits_signed_bits(value: i64, bits: u8) -> bool {
    if bits >= 64 {
        return true;
    }
    let bound = 1_i64 << (bits - 1);
    (-bound..bound).contains(&value)
}

fn fits_float_bits(value: f64, bits: u8) -> bool {
    let max = match bits {
        16 => 65_504.0,
        32 => f64::from(f32::MAX),
        _ => f64::MAX,
    };
    value.is_finite() && value.abs() <= max
}

/// Parses `[D.]H:MM:SS[.ffffff]`.
fn parse_duration(value: &str) -> Result<TimeDelta, String> {
    let (days, clock) = match value.split_once('.') {
        Some((days, rest)) if rest.contains(':') => (Some(days), rest),
        _ => (None, value),
    };
    let (clock, fraction) = match clock.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (clock, None),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err("expected `[D.]H:MM:SS[.ffffff]`".to_string());
    };
    let number = |text: &str, what: &str| {
        if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid {what} `{text}`"));
        }
        text.parse::<i64>().map_err(|err| format!("invalid {what}: {err}"))
    };
    let days = days.map(|d| number(d, "days")).transpose()?.unwrap_or(0);
    let hours = number(hours, "hours")?;
    if minutes.len() != 2 || seconds.len() != 2 {
        return Err("minutes and seconds must have two digits".to_string());
    }
    let minutes = number(minutes, "minutes")?;
    let seconds = number(seconds, "seconds")?;
    if minutes > 59 || seconds > 59 {
        return Err("minutes and seconds must be below 60".to_string());
    }
    let micros = match fraction {
        Some(fraction) if fraction.len() <= 6 => {
            number(fraction, "fraction")? * 10_i64.pow(6 - u32::try_from(fraction.len()).unwrap_or(6))
        }
        Some(_) => return Err("at most six fractional digits are allowed".to_string()),
        None => 0,
    };
    days.checked_mul(86_400)
        .and_then(|s| s.checked_add(hours.checked_mul(3_600)?))
        .and_then(|s| s.checked_add(minutes * 60 + seconds))
        .and_then(|s| s.checked_mul(1_000_000))
        .and_then(|us| us.checked_add(micros))
        .map(TimeDelta::microseconds)
        .ok_or_else(|| "duration is out of range".to_string())
}

/// Typed access to the constraint items of one metadata block.
struct Constraints<'a> {
    type_name: &'static str,
    metadata: &'a mut Option<Metadata>,
}

impl Constraints<'_> {
    fn take(&mut self, name: &str) -> Option<MetadataItem> {
        self.metadata.as_mut().and_then(|m| m.take(name))
    }

    fn invalid(&self, item: &MetadataItem, constraint: &str, reason: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::InvalidConstraint {
                type_name: self.type_name,
                constraint: constraint.to_string(),
                reason: reason.to_string(),
            },
            item.range.clone(),
        )
    }

    fn wrong_kind(&self, item: &MetadataItem, name: &str, expected: &str) -> Diagnostic {
        self.invalid(
            item,
            name,
            &format!("{expected} was expected, found {}", item.value.kind_name()),
        )
    }

    fn integer(&mut self, name: &str) -> Result<Option<(i64, MetadataItem)>, Diagnostic> {
        let Some(item) = self.take(name) else {
            return Ok(None);
        };
        match item.value.kind {
            ExpressionKind::Integer(value) => Ok(Some((value, item))),
            _ => Err(self.wrong_kind(&item, name, "an integer")),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn number(&mut self, name: &str) -> Result<Option<(f64, MetadataItem)>, Diagnostic> {
        let Some(item) = self.take(name) else {
            return Ok(None);
        };
        match item.value.kind {
            ExpressionKind::Integer(value) => Ok(Some((value as f64, item))),
            ExpressionKind::Number(value) => Ok(Some((value, item))),
            _ => Err(self.wrong_kind(&item, name, "a number")),
        }
    }

    fn length(&mut self, name: &str) -> Result<Option<(usize, MetadataItem)>, Diagnostic> {
        match self.integer(name)? {
            Some((value, item)) => usize::try_from(value)
                .map(|value| Some((value, item.clone())))
                .map_err(|_| self.invalid(&item, name, "must not be negative")),
            None => Ok(None),
        }
    }

    fn bits(
        &mut self,
        name: &str,
        valid: impl Fn(u8) -> bool,
    ) -> Result<Option<u8>, Diagnostic> {
        match self.integer(name)? {
            Some((value, item)) => match u8::try_from(value) {
                Ok(bits) if valid(bits) => Ok(Some(bits)),
                _ => Err(self.invalid(&item, name, "unsupported bit width")),
            },
            None => Ok(None),
        }
    }

    fn boolean(&mut self, name: &str) -> Result<Option<bool>, Diagnostic> {
        let Some(item) = self.take(name) else {
            return Ok(None);
        };
        match item.value.kind {
            ExpressionKind::Boolean(value) => Ok(Some(value)),
            _ => Err(self.wrong_kind(&item, name, "a boolean")),
        }
    }

    fn string(&mut self, name: &str) -> Result<Option<(String, MetadataItem)>, Diagnostic> {
        let Some(item) = self.take(name) else {
            return Ok(None);
        };
        match &item.value.kind {
            ExpressionKind::String(value) => Ok(Some((value.clone(), item))),
            _ => Err(self.wrong_kind(&item, name, "a string")),
        }
    }
}
