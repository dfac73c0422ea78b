//! DuckDB-backed table source

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use duckdb::types::{TimeUnit, Value};
use duckdb::{Connection, params_from_iter};

use super::compile::{SqlParams, compile_predicate, order_clause};
use crate::table::pagination::PageWindow;
use crate::table::{CellValue, Record, SourceQuery, TableError, TableSchema, TableSource, ValueKind};
use crate::utils::sql::quote_identifier;

/// Runs table queries against one DuckDB table whose columns are named after
/// the schema's canonical fields.
pub struct DuckdbSource<'a> {
    conn: &'a Connection,
    table: &'a str,
    schema: &'a TableSchema,
    tie_breaker: Option<&'a str>,
}

impl<'a> DuckdbSource<'a> {
    pub fn new(conn: &'a Connection, table: &'a str, schema: &'a TableSchema) -> Self {
        Self {
            conn,
            table,
            schema,
            tie_breaker: None,
        }
    }

    /// Unique field appended to every ORDER BY
    pub fn with_tie_breaker(mut self, field: &'a str) -> Self {
        self.tie_breaker = Some(field);
        self
    }

    fn where_clause(&self, query: &SourceQuery, params: &mut SqlParams) -> Result<String, TableError> {
        if query.predicate().is_true() {
            return Ok(String::new());
        }
        Ok(format!(" WHERE {}", compile_predicate(query.predicate(), params)?))
    }
}

impl TableSource for DuckdbSource<'_> {
    fn count(&self, query: &SourceQuery) -> Result<u64, TableError> {
        let mut params = SqlParams::default();
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            quote_identifier(self.table),
            self.where_clause(query, &mut params)?
        );
        tracing::trace!(%sql, params = params.values.len(), "DuckDB count");

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.values.iter()), |row| row.get(0))
            .map_err(TableError::source)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn fetch(
        &self,
        query: &SourceQuery,
        window: PageWindow,
        fields: &[&str],
    ) -> Result<Vec<Record>, TableError> {
        let columns = fields
            .iter()
            .map(|f| self.schema.require(f).map(|c| (c.field(), c.kind())))
            .collect::<Result<Vec<_>, _>>()?;

        let select = if columns.is_empty() {
            "1".to_string()
        } else {
            columns
                .iter()
                .map(|(field, _)| quote_identifier(field))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut params = SqlParams::default();
        let filter = self.where_clause(query, &mut params)?;
        params.values.push(Value::BigInt(i64::try_from(window.limit).unwrap_or(i64::MAX)));
        params.values.push(Value::BigInt(i64::try_from(window.offset).unwrap_or(i64::MAX)));

        let sql = format!(
            "SELECT {} FROM {}{}{} LIMIT ? OFFSET ?",
            select,
            quote_identifier(self.table),
            filter,
            order_clause(query.order(), self.tie_breaker)
        );
        tracing::trace!(%sql, params = params.values.len(), "DuckDB fetch");

        let mut stmt = self.conn.prepare(&sql).map_err(TableError::source)?;
        let rows = stmt
            .query_map(params_from_iter(params.values.iter()), |row| {
                let mut record = Record::new();
                for (i, (field, kind)) in columns.iter().enumerate() {
                    let value: Value = row.get(i)?;
                    record.push(*field, cell_from_value(value, *kind));
                }
                Ok(record)
            })
            .map_err(TableError::source)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(TableError::source)
    }
}

fn timestamp_from(unit: TimeUnit, value: i64) -> Option<DateTime<Utc>> {
    let micros = match unit {
        TimeUnit::Second => value.checked_mul(1_000_000)?,
        TimeUnit::Millisecond => value.checked_mul(1_000)?,
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    };
    DateTime::from_timestamp_micros(micros)
}

fn integer(value: i64, kind: ValueKind) -> CellValue {
    match kind {
        ValueKind::Float => CellValue::Float(value as f64),
        _ => CellValue::Integer(value),
    }
}

/// Convert a DuckDB value into the column's cell representation
fn cell_from_value(value: Value, kind: ValueKind) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Boolean(b) => CellValue::Boolean(b),
        Value::TinyInt(v) => integer(v.into(), kind),
        Value::SmallInt(v) => integer(v.into(), kind),
        Value::Int(v) => integer(v.into(), kind),
        Value::BigInt(v) => integer(v, kind),
        Value::UTinyInt(v) => integer(v.into(), kind),
        Value::USmallInt(v) => integer(v.into(), kind),
        Value::UInt(v) => integer(v.into(), kind),
        Value::UBigInt(v) => i64::try_from(v)
            .map(|v| integer(v, kind))
            .unwrap_or(CellValue::Float(v as f64)),
        Value::HugeInt(v) => i64::try_from(v)
            .map(|v| integer(v, kind))
            .unwrap_or(CellValue::Float(v as f64)),
        Value::Float(v) => CellValue::Float(v.into()),
        Value::Double(v) => CellValue::Float(v),
        Value::Text(s) => CellValue::Text(s),
        Value::Timestamp(unit, v) => timestamp_from(unit, v)
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Null),
        Value::Date32(days) => DateTime::UNIX_EPOCH
            .checked_add_signed(TimeDelta::days(days.into()))
            .map(|d| CellValue::DateTime(d.date_naive().and_time(NaiveTime::MIN).and_utc()))
            .unwrap_or(CellValue::Null),
        other => {
            tracing::debug!(value = ?other, "Unsupported DuckDB value, rendering as text");
            CellValue::Text(format!("{:?}", other))
        }
    }
}
