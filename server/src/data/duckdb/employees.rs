//! Demo "employees" table: entity, column metadata and seed data

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use duckdb::types::Value;
use duckdb::{Connection, params_from_iter};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::compile::timestamp_value;
use super::error::DuckdbError;
use super::in_transaction;
use super::schema::EMPLOYEES_TABLE;
use crate::table::columns::{DataAlignHorizontal, FrozenColumnAlign};
use crate::table::{
    CellValue, ChronoDateFormatter, ColumnDef, DataType, DefaultSort, QueryPipeline, SortDirection,
    TableEntity, TableSchema, ValueKind,
};

pub const EMPLOYMENT_STATUSES: [&str; 5] =
    ["Full-time", "Part-time", "Contractor", "Unemployed", "Retired"];

const FIRST_NAMES: [&str; 12] = [
    "alice", "bruno", "carmen", "dmitri", "elena", "farid", "greta", "hugo", "ines", "jonas",
    "kaori", "lucia",
];
const LAST_NAMES: [&str; 10] = [
    "moreno", "schmidt", "okafor", "rossi", "tanaka", "novak", "silva", "berg", "dubois", "kim",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub row_id: i64,
    pub can_be_deleted: bool,
    pub username: String,
    pub age: Option<i64>,
    pub employment_status_name: Option<String>,
    pub employment_status_name_list: Option<String>,
    pub birthdate: Option<DateTime<Utc>>,
    pub payed_taxes: bool,
    pub salary: Option<f64>,
}

impl TableEntity for Employee {
    fn fields() -> &'static [&'static str] {
        &[
            "rowId",
            "canBeDeleted",
            "username",
            "age",
            "employmentStatusName",
            "employmentStatusNameList",
            "birthdate",
            "payedTaxes",
            "salary",
        ]
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("rowId", DataType::Numeric)
                .storage(ValueKind::Integer, false)
                .hidden_from_client(),
            ColumnDef::new("canBeDeleted", DataType::Boolean)
                .required()
                .hidden_from_client(),
            ColumnDef::new("username", DataType::Text)
                .header("Username")
                .required()
                .align_horizontal(DataAlignHorizontal::Left, true)
                .hideable(false, false)
                .description("A random username")
                .frozen(FrozenColumnAlign::Left)
                .initial_width(400.0),
            ColumnDef::new("age", DataType::Numeric)
                .header("Age")
                .storage(ValueKind::Integer, true)
                .description("The age of the user"),
            ColumnDef::new("employmentStatusName", DataType::Text)
                .header("Employment status")
                .predefined_values("employmentStatusPredefinedFilter")
                .description("The employment status of the user"),
            ColumnDef::new("employmentStatusNameList", DataType::List)
                .header("Employment status list")
                .align_horizontal(DataAlignHorizontal::Left, true)
                .predefined_values("employmentStatusPredefinedFilter")
                .description("Employment statuses separated by ; in the database"),
            ColumnDef::new("birthdate", DataType::Date)
                .header("Birthdate")
                .align_horizontal(DataAlignHorizontal::Left, true)
                .hideable(true, true)
                .description("When was the user born"),
            ColumnDef::new("payedTaxes", DataType::Boolean)
                .header("Payed taxes?")
                .required()
                .hideable(true, true)
                .description("Whether the user has paid their taxes"),
            ColumnDef::new("salary", DataType::Numeric)
                .header("Salary")
                .global_filterable(false)
                .description("Yearly gross salary"),
        ]
    }

    fn cell(&self, field: &str) -> CellValue {
        match field {
            "rowId" => self.row_id.into(),
            "canBeDeleted" => self.can_be_deleted.into(),
            "username" => self.username.as_str().into(),
            "age" => self.age.into(),
            "employmentStatusName" => self.employment_status_name.clone().into(),
            "employmentStatusNameList" => self.employment_status_name_list.clone().into(),
            "birthdate" => self.birthdate.into(),
            "payedTaxes" => self.payed_taxes.into(),
            "salary" => self.salary.into(),
            _ => CellValue::Null,
        }
    }
}

/// Pipeline used by the employees endpoints: oldest first, then by status
pub fn pipeline(schema: Arc<TableSchema>) -> QueryPipeline {
    QueryPipeline::new(schema)
        .with_date_formatter(Arc::new(ChronoDateFormatter))
        .with_default_sort(DefaultSort::new(
            ["age", "employmentStatusName"],
            vec![SortDirection::Descending, SortDirection::Ascending],
        ))
}

/// Deterministic pseudo-random employees, `rowId` counting up from 0
pub fn generate(count: u32, seed: u64) -> Vec<Employee> {
    let mut rng = StdRng::seed_from_u64(seed);
    let epoch = Utc.with_ymd_and_hms(1955, 1, 1, 0, 0, 0).single().unwrap_or_default();

    (0..count)
        .map(|i| {
            let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
            let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];

            let mut statuses = EMPLOYMENT_STATUSES.to_vec();
            statuses.shuffle(&mut rng);
            let listed = rng.gen_range(1..=3);

            let birthdate = epoch
                + TimeDelta::days(rng.gen_range(0..18_000))
                + TimeDelta::seconds(rng.gen_range(0..86_400));

            Employee {
                row_id: i64::from(i),
                can_be_deleted: rng.gen_bool(0.3),
                username: format!("{}.{}{:04}", first, last, i),
                age: (!rng.gen_bool(0.1)).then(|| rng.gen_range(18..=70)),
                employment_status_name: (!rng.gen_bool(0.05))
                    .then(|| statuses[0].to_string()),
                employment_status_name_list: (!rng.gen_bool(0.05))
                    .then(|| statuses[..listed].join(";")),
                birthdate: (!rng.gen_bool(0.05)).then_some(birthdate),
                payed_taxes: rng.gen_bool(0.5),
                salary: (!rng.gen_bool(0.1))
                    .then(|| (rng.gen_range(18_000.0..150_000.0_f64) * 100.0).round() / 100.0),
            }
        })
        .collect()
}

/// Insert rows in one transaction
pub fn insert(conn: &Connection, rows: &[Employee]) -> Result<u64, DuckdbError> {
    let sql = format!(
        "INSERT INTO {} VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        crate::utils::sql::quote_identifier(EMPLOYEES_TABLE)
    );

    in_transaction(conn, |conn| {
        let mut stmt = conn.prepare(&sql)?;
        for row in rows {
            let values: [Value; 9] = [
                Value::BigInt(row.row_id),
                Value::Boolean(row.can_be_deleted),
                Value::Text(row.username.clone()),
                row.age.map(Value::BigInt).unwrap_or(Value::Null),
                row.employment_status_name.clone().map(Value::Text).unwrap_or(Value::Null),
                row.employment_status_name_list.clone().map(Value::Text).unwrap_or(Value::Null),
                row.birthdate.map(timestamp_value).unwrap_or(Value::Null),
                Value::Boolean(row.payed_taxes),
                row.salary.map(Value::Double).unwrap_or(Value::Null),
            ];
            stmt.execute(params_from_iter(values.iter()))?;
        }
        Ok(rows.len() as u64)
    })
}

/// Seed the table when it holds no rows. Returns the number inserted.
pub fn seed_if_empty(conn: &Connection, count: u32) -> Result<u64, DuckdbError> {
    let existing: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {}",
            crate::utils::sql::quote_identifier(EMPLOYEES_TABLE)
        ),
        [],
        |row| row.get(0),
    )?;
    if existing > 0 || count == 0 {
        return Ok(0);
    }

    let inserted = insert(conn, &generate(count, u64::from(count)))?;
    tracing::debug!(rows = inserted, "Seeded employees table");
    Ok(inserted)
}
