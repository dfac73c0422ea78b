//! Single-field predicates
//!
//! A [`Predicate`] is a small boolean expression tree over the fields of a
//! row. It is evaluated directly by in-memory sources and compiled to
//! parameterised SQL by database sources. The builders in this module turn
//! one filter clause (column, raw value, match mode) into a predicate.
//!
//! Null field values never satisfy a comparison or a text test. The only
//! predicate that selects nulls is [`Predicate::IsNull`].

use std::cmp::Ordering;
use std::sync::Arc;

use super::columns::{Column, DataType};
use super::dates::{DateFormatContext, DateFormatter, local_day_utc_range, parse_filter_date};
use super::error::TableError;
use super::value::{CellValue, FilterValue, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    fn matches(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }

    /// Numeric match modes
    pub fn from_match_mode(mode: &str) -> Option<Self> {
        match mode {
            "equals" => Some(CompareOp::Eq),
            "notEquals" => Some(CompareOp::Ne),
            "lt" => Some(CompareOp::Lt),
            "lte" => Some(CompareOp::Lte),
            "gt" => Some(CompareOp::Gt),
            "gte" => Some(CompareOp::Gte),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    StartsWith,
    Contains,
    NotContains,
    EndsWith,
    Equals,
    NotEquals,
}

impl TextOp {
    pub fn from_match_mode(mode: &str) -> Option<Self> {
        match mode {
            "startsWith" => Some(TextOp::StartsWith),
            "contains" => Some(TextOp::Contains),
            "notContains" => Some(TextOp::NotContains),
            "endsWith" => Some(TextOp::EndsWith),
            "equals" => Some(TextOp::Equals),
            "notEquals" => Some(TextOp::NotEquals),
            _ => None,
        }
    }

    /// Apply to an already uppercased haystack and needle
    fn matches(self, haystack: &str, needle: &str) -> bool {
        match self {
            TextOp::StartsWith => haystack.starts_with(needle),
            TextOp::Contains => haystack.contains(needle),
            TextOp::NotContains => !haystack.contains(needle),
            TextOp::EndsWith => haystack.ends_with(needle),
            TextOp::Equals => haystack == needle,
            TextOp::NotEquals => haystack != needle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOp {
    Is,
    IsNot,
    Before,
    After,
}

impl DateOp {
    pub fn from_match_mode(mode: &str) -> Option<Self> {
        match mode {
            "dateIs" => Some(DateOp::Is),
            "dateIsNot" => Some(DateOp::IsNot),
            "dateBefore" => Some(DateOp::Before),
            "dateAfter" => Some(DateOp::After),
            _ => None,
        }
    }
}

/// How a field is turned into text before a text test
#[derive(Debug, Clone)]
pub enum TextSource {
    /// Field is stored as text
    Plain,
    /// Generic to-string of a non-text value
    Stringify,
    /// Date rendered through a formatter
    FormatDate {
        formatter: Arc<dyn DateFormatter>,
        context: DateFormatContext,
    },
}

#[derive(Debug, Clone)]
pub enum Predicate {
    True,
    False,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    IsNull {
        field: String,
    },
    Compare {
        field: String,
        op: CompareOp,
        value: CellValue,
    },
    /// Case-insensitive text test; `needle` is stored uppercased
    Text {
        field: String,
        op: TextOp,
        needle: String,
        source: TextSource,
    },
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::True, p) | (p, Predicate::True) => p,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), p) => {
                left.push(p);
                Predicate::And(left)
            }
            (p, q) => Predicate::And(vec![p, q]),
        }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::False, p) | (p, Predicate::False) => p,
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), p) => {
                left.push(p);
                Predicate::Or(left)
            }
            (p, q) => Predicate::Or(vec![p, q]),
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Predicate::True)
    }

    /// Evaluate against a row given as a field accessor
    pub fn evaluate<R>(&self, row: &R) -> bool
    where
        R: Fn(&str) -> CellValue,
    {
        match self {
            Predicate::True => true,
            Predicate::False => false,
            Predicate::And(items) => items.iter().all(|p| p.evaluate(row)),
            Predicate::Or(items) => items.iter().any(|p| p.evaluate(row)),
            Predicate::IsNull { field } => row(field).is_null(),
            Predicate::Compare { field, op, value } => row(field)
                .compare(value)
                .is_some_and(|ordering| op.matches(ordering)),
            Predicate::Text {
                field,
                op,
                needle,
                source,
            } => {
                let cell = row(field);
                let text = match source {
                    TextSource::Plain | TextSource::Stringify => cell.to_text(),
                    TextSource::FormatDate { formatter, context } => cell
                        .as_datetime()
                        .map(|dt| formatter.format(dt, context)),
                };
                text.is_some_and(|t| op.matches(&t.to_uppercase(), needle))
            }
        }
    }
}

/// Date formatting available to predicate builders
#[derive(Debug, Clone)]
pub struct DateText<'a> {
    pub formatter: Option<&'a Arc<dyn DateFormatter>>,
    pub context: DateFormatContext,
}

fn text_source(column: &Column, date: &DateText<'_>) -> Result<TextSource, TableError> {
    match column.kind() {
        ValueKind::Text => Ok(TextSource::Plain),
        ValueKind::DateTime => match date.formatter {
            Some(formatter) => Ok(TextSource::FormatDate {
                formatter: Arc::clone(formatter),
                context: date.context.clone(),
            }),
            None => Err(TableError::UnsupportedConversion {
                field: column.field().to_string(),
            }),
        },
        _ => Ok(TextSource::Stringify),
    }
}

/// Case-insensitive text test. Non-text columns are converted to text first.
pub fn text_predicate(
    column: &Column,
    value: &str,
    match_mode: &str,
    date: &DateText<'_>,
) -> Result<Predicate, TableError> {
    let op = TextOp::from_match_mode(match_mode).ok_or_else(|| {
        TableError::invalid_match_mode(column.field(), column.data_type(), match_mode)
    })?;
    Ok(Predicate::Text {
        field: column.field().to_string(),
        op,
        needle: value.to_uppercase(),
        source: text_source(column, date)?,
    })
}

/// Parse a numeric filter value into the column's storage kind
fn numeric_value(column: &Column, raw: &str) -> Result<CellValue, TableError> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| TableError::invalid_filter_value(column.field(), raw, reason);
    match column.kind() {
        ValueKind::Integer => trimmed
            .parse::<i64>()
            .map(CellValue::Integer)
            .map_err(|_| invalid("expected an integer")),
        ValueKind::Float => match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(CellValue::Float(v)),
            _ => Err(invalid("expected a number")),
        },
        other => Err(invalid(&format!("numeric filter on {} storage", other))),
    }
}

/// Numeric comparison with nullable semantics:
/// `notEquals` also selects nulls, every other mode rejects them.
pub fn numeric_predicate(
    column: &Column,
    value: &FilterValue,
    match_mode: &str,
) -> Result<Predicate, TableError> {
    let op = CompareOp::from_match_mode(match_mode).ok_or_else(|| {
        TableError::invalid_match_mode(column.field(), column.data_type(), match_mode)
    })?;
    let raw = value.as_text().ok_or_else(|| {
        TableError::invalid_filter_value(column.field(), value.to_string(), "expected a scalar")
    })?;
    let compare = Predicate::Compare {
        field: column.field().to_string(),
        op,
        value: numeric_value(column, &raw)?,
    };

    if op == CompareOp::Ne && column.nullable() {
        Ok(compare.or(Predicate::IsNull {
            field: column.field().to_string(),
        }))
    } else {
        Ok(compare)
    }
}

/// Boolean equality. Values that don't parse as a boolean yield no predicate.
pub fn boolean_predicate(column: &Column, value: &FilterValue) -> Option<Predicate> {
    let parsed = match value {
        FilterValue::Bool(b) => Some(*b),
        FilterValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }?;
    Some(Predicate::Compare {
        field: column.field().to_string(),
        op: CompareOp::Eq,
        value: CellValue::Boolean(parsed),
    })
}

/// Local-day date test in `timezone`. Unparsable dates yield no predicate;
/// unknown match modes are an error.
pub fn date_predicate(
    column: &Column,
    value: &FilterValue,
    match_mode: &str,
    timezone: &str,
) -> Result<Option<Predicate>, TableError> {
    let op = DateOp::from_match_mode(match_mode).ok_or_else(|| {
        TableError::invalid_match_mode(column.field(), column.data_type(), match_mode)
    })?;
    let Some(day) = value.as_text().as_deref().and_then(parse_filter_date) else {
        return Ok(None);
    };

    let Some((start, end)) = local_day_utc_range(day, timezone) else {
        tracing::debug!(field = column.field(), %day, "Date filter out of range, clause omitted");
        return Ok(None);
    };
    let field = column.field().to_string();
    let bound = |op: CompareOp, at| Predicate::Compare {
        field: field.clone(),
        op,
        value: CellValue::DateTime(at),
    };

    let predicate = match op {
        DateOp::Is => bound(CompareOp::Gte, start).and(bound(CompareOp::Lt, end)),
        DateOp::Before => bound(CompareOp::Lt, start),
        DateOp::After => bound(CompareOp::Gte, end),
        DateOp::IsNot => bound(CompareOp::Lt, start).or(bound(CompareOp::Gte, end)),
    };
    Ok(Some(predicate))
}

/// Containment test on semicolon-delimited list text
pub fn list_predicate(column: &Column, value: &FilterValue) -> Result<Predicate, TableError> {
    let raw = value.as_text().ok_or_else(|| {
        TableError::invalid_filter_value(column.field(), value.to_string(), "expected a scalar")
    })?;
    let source = match column.kind() {
        ValueKind::Text => TextSource::Plain,
        _ => TextSource::Stringify,
    };
    Ok(Predicate::Text {
        field: column.field().to_string(),
        op: TextOp::Contains,
        needle: raw.to_uppercase(),
        source,
    })
}

/// Global search test for one column. Boolean columns never take part;
/// Date columns only when a formatter is available.
pub fn global_predicate(column: &Column, value: &str, date: &DateText<'_>) -> Option<Predicate> {
    match column.data_type() {
        DataType::Boolean => None,
        DataType::Date if date.formatter.is_none() => None,
        _ => text_predicate(column, value, "contains", date).ok(),
    }
}
