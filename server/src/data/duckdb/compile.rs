//! Predicate to SQL compilation
//!
//! Turns a table [`Predicate`] into a DuckDB WHERE fragment with `?`
//! placeholders and an ORDER BY clause. Comparisons and text tests are
//! wrapped in `COALESCE(.., FALSE)` so NULL fields never match, the same
//! two-valued logic the in-memory evaluator uses.

use chrono::{DateTime, Utc};
use duckdb::types::{TimeUnit, Value};

use crate::table::predicate::{TextOp, TextSource};
use crate::table::{CellValue, Predicate, SortKey, TableError};
use crate::utils::sql::{escape_like_pattern, quote_identifier};

/// Positional parameters collected while compiling
#[derive(Debug, Default)]
pub struct SqlParams {
    pub values: Vec<Value>,
}

impl SqlParams {
    fn push(&mut self, value: Value) -> &'static str {
        self.values.push(value);
        "?"
    }
}

pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::Timestamp(TimeUnit::Microsecond, at.timestamp_micros())
}

pub fn cell_to_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Text(s) => Value::Text(s.clone()),
        CellValue::Integer(i) => Value::BigInt(*i),
        CellValue::Float(f) => Value::Double(*f),
        CellValue::Boolean(b) => Value::Boolean(*b),
        CellValue::DateTime(dt) => timestamp_value(*dt),
    }
}

/// Compile a predicate into a boolean SQL expression
pub fn compile_predicate(predicate: &Predicate, params: &mut SqlParams) -> Result<String, TableError> {
    match predicate {
        Predicate::True => Ok("TRUE".to_string()),
        Predicate::False => Ok("FALSE".to_string()),
        Predicate::And(items) => join(items, " AND ", "TRUE", params),
        Predicate::Or(items) => join(items, " OR ", "FALSE", params),
        Predicate::IsNull { field } => Ok(format!("{} IS NULL", quote_identifier(field))),
        Predicate::Compare { field, op, value } => Ok(format!(
            "COALESCE({} {} {}, FALSE)",
            quote_identifier(field),
            op.as_sql(),
            params.push(cell_to_value(value))
        )),
        Predicate::Text {
            field,
            op,
            needle,
            source,
        } => {
            let expr = text_expr(field, source, params)?;
            let test = match op {
                TextOp::StartsWith => like(&expr, format!("{}%", escape_like_pattern(needle)), params),
                TextOp::Contains => like(&expr, format!("%{}%", escape_like_pattern(needle)), params),
                TextOp::NotContains => format!(
                    "NOT ({})",
                    like(&expr, format!("%{}%", escape_like_pattern(needle)), params)
                ),
                TextOp::EndsWith => like(&expr, format!("%{}", escape_like_pattern(needle)), params),
                TextOp::Equals => format!("UPPER({}) = {}", expr, params.push(Value::Text(needle.clone()))),
                TextOp::NotEquals => format!("UPPER({}) <> {}", expr, params.push(Value::Text(needle.clone()))),
            };
            Ok(format!("COALESCE({}, FALSE)", test))
        }
    }
}

fn join(
    items: &[Predicate],
    separator: &str,
    empty: &str,
    params: &mut SqlParams,
) -> Result<String, TableError> {
    if items.is_empty() {
        return Ok(empty.to_string());
    }
    let parts = items
        .iter()
        .map(|p| compile_predicate(p, params))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", parts.join(separator)))
}

fn like(expr: &str, pattern: String, params: &mut SqlParams) -> String {
    format!("UPPER({}) LIKE {} ESCAPE '\\'", expr, params.push(Value::Text(pattern)))
}

/// SQL expression yielding the field as text
fn text_expr(field: &str, source: &TextSource, params: &mut SqlParams) -> Result<String, TableError> {
    let column = quote_identifier(field);
    match source {
        TextSource::Plain => Ok(column),
        TextSource::Stringify => Ok(format!("CAST({} AS VARCHAR)", column)),
        TextSource::FormatDate { formatter, context } => {
            let pattern = formatter
                .strftime_pattern(context)
                .ok_or_else(|| TableError::UnsupportedConversion {
                    field: field.to_string(),
                })?;
            let shift = i64::from(context.offset_at(Utc::now()).local_minus_utc());
            let shift = params.push(Value::BigInt(shift));
            let pattern = params.push(Value::Text(pattern));
            Ok(format!(
                "strftime({} + to_seconds(CAST({} AS BIGINT)), {})",
                column, shift, pattern
            ))
        }
    }
}

/// ORDER BY clause, or an empty string. `tie_breaker` is appended ascending
/// unless already among the keys, so paging stays deterministic.
pub fn order_clause(keys: &[SortKey], tie_breaker: Option<&str>) -> String {
    let mut parts: Vec<String> = keys
        .iter()
        .map(|k| {
            let direction = if k.is_ascending() {
                "ASC NULLS FIRST"
            } else {
                "DESC NULLS LAST"
            };
            format!("{} {}", quote_identifier(&k.field), direction)
        })
        .collect();

    if let Some(key) = tie_breaker
        && !keys.iter().any(|k| k.field == key)
    {
        parts.push(format!("{} ASC", quote_identifier(key)));
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", parts.join(", "))
    }
}
