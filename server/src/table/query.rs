//! Query orchestration
//!
//! Runs a [`TableQueryRequest`] against a [`TableSource`]: resolve field
//! references, order, count, filter, count again, paginate and project.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::ValidationError;

use super::columns::{TableSchema, validate_columns, validate_page_size};
use super::dates::{DateFormatter, RequestDateContext};
use super::error::TableError;
use super::filter::{ColumnFilters, FilterContext, build_filter};
use super::pagination::paginate;
use super::sort::{ColumnSort, DefaultSort, build_order};
use super::source::{SourceQuery, TableSource};
use super::value::Record;

/// Page, sort and filter request sent by a table client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableQueryRequest {
    /// Zero-based page index
    #[serde(default)]
    pub page: i32,
    /// Missing means 0, which no allowed list contains; exports ignore it
    #[serde(default)]
    pub page_size: u8,
    #[serde(default)]
    pub sort: Option<Vec<ColumnSort>>,
    #[serde(default)]
    pub filter: ColumnFilters,
    #[serde(default)]
    pub global_filter: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub date_timezone: Option<String>,
    #[serde(default)]
    pub date_culture: Option<String>,
}

impl TableQueryRequest {
    /// Page size must be allowed and at least one column requested
    pub fn validate(&self, allowed_page_sizes: &[u8]) -> Result<(), ValidationError> {
        validate_page_size(self.page_size, allowed_page_sizes)?;
        validate_columns(self.columns.as_deref())
    }

    pub fn date_context(&self) -> RequestDateContext<'_> {
        RequestDateContext {
            format: self.date_format.as_deref(),
            timezone: self.date_timezone.as_deref(),
            culture: self.date_culture.as_deref(),
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePagedResponse {
    /// Page actually served, after clamping
    pub page: i32,
    pub total_records: u64,
    pub total_records_not_filtered: u64,
    pub data: Vec<Record>,
}

/// Which transforms the base query applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryToggles {
    pub sort: bool,
    pub filter: bool,
}

impl Default for QueryToggles {
    fn default() -> Self {
        Self {
            sort: true,
            filter: true,
        }
    }
}

/// Ordered and filtered query plus its pre- and post-filter counts
#[derive(Debug, Clone)]
pub struct QueryBase {
    pub query: SourceQuery,
    pub total_records_not_filtered: u64,
    pub total_records: u64,
}

/// Table pipeline for one entity schema
#[derive(Debug, Clone)]
pub struct QueryPipeline {
    schema: Arc<TableSchema>,
    formatter: Option<Arc<dyn DateFormatter>>,
    default_sort: DefaultSort,
    excluded_columns: Vec<String>,
}

impl QueryPipeline {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            formatter: None,
            default_sort: DefaultSort::default(),
            excluded_columns: Vec::new(),
        }
    }

    /// Enables text matching on date columns
    pub fn with_date_formatter(mut self, formatter: Arc<dyn DateFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn with_default_sort(mut self, default_sort: DefaultSort) -> Self {
        self.default_sort = default_sort;
        self
    }

    /// Columns never projected, matched case-insensitively
    pub fn with_excluded_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        self.excluded_columns
            .iter()
            .any(|c| c.eq_ignore_ascii_case(field))
    }

    /// Order, count, filter and count again
    pub fn query_base<S: TableSource + ?Sized>(
        &self,
        source: &S,
        request: &TableQueryRequest,
        toggles: QueryToggles,
    ) -> Result<QueryBase, TableError> {
        let mut query = SourceQuery::new();
        if toggles.sort {
            let order = build_order(&self.schema, request.sort.as_deref(), &self.default_sort)?;
            query = query.order_by(order);
        }
        let total_records_not_filtered = source.count(&query)?;

        // Clauses are only parsed when they will be applied
        if toggles.filter {
            let ctx = FilterContext {
                schema: &self.schema,
                formatter: self.formatter.as_ref(),
                dates: request.date_context(),
            };
            let predicate =
                build_filter(&ctx, &request.filter, request.global_filter.as_deref())?;
            query = query.filter(predicate);
        }
        let total_records = source.count(&query)?;

        tracing::debug!(
            total_records_not_filtered,
            total_records,
            sort = toggles.sort,
            filter = toggles.filter,
            "Query base ready"
        );

        Ok(QueryBase {
            query,
            total_records_not_filtered,
            total_records,
        })
    }

    /// Fields to project: requested plus always-included columns, minus
    /// excluded ones, in schema order.
    pub fn projection(&self, requested: &[String]) -> Result<Vec<&str>, TableError> {
        let mut wanted = Vec::with_capacity(requested.len());
        for name in requested {
            wanted.push(self.schema.require(name)?.field());
        }

        Ok(self
            .schema
            .columns()
            .iter()
            .filter(|c| c.always_included() || wanted.contains(&c.field()))
            .map(|c| c.field())
            .filter(|f| !self.is_excluded(f))
            .collect())
    }

    /// Run the full pipeline and package one page
    pub fn perform<S: TableSource + ?Sized>(
        &self,
        source: &S,
        request: &TableQueryRequest,
    ) -> Result<TablePagedResponse, TableError> {
        let fields = self.projection(request.columns.as_deref().unwrap_or_default())?;
        let base = self.query_base(source, request, QueryToggles::default())?;

        let page = paginate(base.total_records, request.page, request.page_size);
        let data = if page.window.len_within(base.total_records) == 0 {
            Vec::new()
        } else {
            source.fetch(&base.query, page.window, &fields)?
        };

        tracing::debug!(
            page = page.page,
            rows = data.len(),
            "Table page served"
        );

        Ok(TablePagedResponse {
            page: page.page,
            total_records: base.total_records,
            total_records_not_filtered: base.total_records_not_filtered,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::columns::{ColumnDef, DataType, SortDirection, TableEntity};
    use crate::table::dates::ChronoDateFormatter;
    use crate::table::source::MemorySource;
    use crate::table::value::{CellValue, ValueKind};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    #[derive(Debug, Clone)]
    struct Employee {
        row_id: i64,
        username: String,
        age: Option<i64>,
        status: &'static str,
        hired: DateTime<Utc>,
        remote: bool,
    }

    impl TableEntity for Employee {
        fn fields() -> &'static [&'static str] {
            &["rowId", "username", "age", "status", "hired", "remote"]
        }

        fn columns() -> Vec<ColumnDef> {
            vec![
                ColumnDef::new("rowId", DataType::Numeric)
                    .storage(ValueKind::Integer, false)
                    .hidden_from_client(),
                ColumnDef::new("username", DataType::Text).header("Username"),
                ColumnDef::new("age", DataType::Numeric).storage(ValueKind::Integer, true),
                ColumnDef::new("status", DataType::List),
                ColumnDef::new("hired", DataType::Date),
                ColumnDef::new("remote", DataType::Boolean),
            ]
        }

        fn cell(&self, field: &str) -> CellValue {
            match field {
                "rowId" => self.row_id.into(),
                "username" => self.username.clone().into(),
                "age" => self.age.into(),
                "status" => self.status.into(),
                "hired" => self.hired.into(),
                "remote" => self.remote.into(),
                _ => CellValue::Null,
            }
        }
    }

    /// 1000 rows: every 10th age is null, ages cycle 20..=69, status cycles
    fn employees() -> Vec<Employee> {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
        (0..1000)
            .map(|i| Employee {
                row_id: i,
                username: format!("user{:04}", i),
                age: if i % 10 == 0 { None } else { Some(20 + i % 50) },
                status: ["Active", "Inactive;Remote", "Active;Remote"][(i % 3) as usize],
                hired: start + TimeDelta::days(i),
                remote: i % 2 == 0,
            })
            .collect()
    }

    fn pipeline() -> QueryPipeline {
        QueryPipeline::new(Arc::new(TableSchema::of::<Employee>())).with_default_sort(
            DefaultSort::new(["age", "username"], vec![SortDirection::Descending, SortDirection::Ascending]),
        )
    }

    fn request(columns: &[&str]) -> TableQueryRequest {
        TableQueryRequest {
            page: 0,
            page_size: 10,
            columns: Some(columns.iter().map(|c| c.to_string()).collect()),
            ..Default::default()
        }
    }

    fn parse_request(json: serde_json::Value) -> TableQueryRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_request_deserializes_from_client_json() {
        let req = parse_request(serde_json::json!({
            "page": 2,
            "pageSize": 20,
            "sort": [{"field": "age", "order": 1}],
            "filter": {"username": [{"value": "user", "matchMode": "startsWith", "operator": "and"}]},
            "globalFilter": null,
            "columns": ["username"],
            "dateFormat": "dd-MMM-yyyy",
            "dateTimezone": "+02:00",
            "dateCulture": "en-US"
        }));
        assert_eq!(req.page, 2);
        assert_eq!(req.page_size, 20);
        assert_eq!(req.filter["username"].len(), 1);
        assert!(req.validate(&[10, 20]).is_ok());
        assert!(req.validate(&[10]).is_err());
    }

    #[test]
    fn test_validation_requires_columns() {
        let mut req = request(&[]);
        assert!(req.validate(&[10]).is_err());
        req.columns = None;
        assert!(req.validate(&[10]).is_err());
    }

    #[test]
    fn test_end_to_end_unfiltered() {
        let source = MemorySource::new(employees());
        let response = pipeline().perform(&source, &request(&["username", "age"])).unwrap();

        assert_eq!(response.total_records, 1000);
        assert_eq!(response.total_records_not_filtered, 1000);
        assert_eq!(response.page, 0);
        assert_eq!(response.data.len(), 10);

        let first = &response.data[0];
        let fields: Vec<&str> = first.fields().collect();
        assert_eq!(fields, vec!["rowId", "username", "age"]);
        assert_eq!(first.get("age"), Some(&CellValue::Integer(69)));
    }

    #[test]
    fn test_end_to_end_filters_and_clamping() {
        let source = MemorySource::new(employees());
        let mut req = parse_request(serde_json::json!({
            "page": 99,
            "pageSize": 20,
            "columns": ["USERNAME", "Age"],
            "filter": {
                "age": [{"value": 60, "matchMode": "gte", "operator": "and"}],
                "status": [{"value": "remote", "matchMode": "contains", "operator": "and"}]
            }
        }));
        let response = pipeline().perform(&source, &req).unwrap();

        let expected = employees()
            .iter()
            .filter(|e| e.age.is_some_and(|a| a >= 60) && e.status.contains("Remote"))
            .count() as u64;
        assert_eq!(response.total_records, expected);
        assert_eq!(response.total_records_not_filtered, 1000);
        assert_eq!(response.page as u64, expected.div_ceil(20));
        assert!(response.data.is_empty());

        req.page = 0;
        let response = pipeline().perform(&source, &req).unwrap();
        assert_eq!(response.data.len(), 20);
        for row in &response.data {
            match row.get("age") {
                Some(CellValue::Integer(age)) => assert!(*age >= 60),
                other => panic!("unexpected age {other:?}"),
            }
        }
    }

    #[test]
    fn test_status_filter_pages_of_fifty() {
        let source = MemorySource::new(employees());
        for needle in ["Active", "Inactive"] {
            let expected = employees()
                .iter()
                .filter(|e| e.status.to_uppercase().contains(&needle.to_uppercase()))
                .count() as u64;
            let last_page = (expected.div_ceil(50) - 1) as i32;

            for page in [0, last_page] {
                let req = parse_request(serde_json::json!({
                    "page": page,
                    "pageSize": 50,
                    "columns": ["username", "status"],
                    "filter": {"status": [{"value": needle, "matchMode": "equals"}]}
                }));
                let response = pipeline().perform(&source, &req).unwrap();

                assert_eq!(response.total_records, expected);
                assert_eq!(response.total_records_not_filtered, 1000);
                let remaining = expected - page as u64 * 50;
                assert_eq!(response.data.len() as u64, remaining.min(50));
            }
        }
    }

    #[test]
    fn test_multi_key_sort_is_repeatable() {
        let source = MemorySource::new(employees());
        let req = |page: i32| {
            parse_request(serde_json::json!({
                "page": page,
                "pageSize": 100,
                "columns": ["status", "remote", "age"],
                "sort": [
                    {"field": "status", "order": 1},
                    {"field": "remote", "order": -1},
                    {"field": "age", "order": 1}
                ]
            }))
        };

        let mut seen = Vec::new();
        for page in 0..10 {
            let first = pipeline().perform(&source, &req(page)).unwrap();
            let second = pipeline().perform(&source, &req(page)).unwrap();
            assert_eq!(first, second);
            seen.extend(first.data.iter().map(|r| r.get("rowId").cloned()));
        }

        assert_eq!(seen.len(), 1000);
        let mut ids: Vec<i64> = seen
            .into_iter()
            .map(|id| match id {
                Some(CellValue::Integer(id)) => id,
                other => panic!("unexpected rowId {other:?}"),
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_explicit_sort_overrides_default() {
        let source = MemorySource::new(employees());
        let mut req = request(&["username"]);
        req.sort = Some(vec![ColumnSort {
            field: "username".into(),
            order: -1,
        }]);
        let response = pipeline().perform(&source, &req).unwrap();
        assert_eq!(
            response.data[0].get("username"),
            Some(&CellValue::from("user0999"))
        );
    }

    #[test]
    fn test_default_sort_puts_null_ages_last() {
        let source = MemorySource::new(employees());
        let mut req = request(&["age"]);
        req.page_size = 100;
        req.page = 9;
        let response = pipeline().perform(&source, &req).unwrap();
        assert!(response.data.iter().all(|r| r.get("age") == Some(&CellValue::Null)));
    }

    #[test]
    fn test_global_filter_with_date_formatter() {
        let source = MemorySource::new(employees());
        let mut req = request(&["username", "hired"]);
        req.global_filter = Some("02-Jan-2020".into());
        req.date_format = Some("dd-MMM-yyyy".into());

        let without = pipeline().perform(&source, &req).unwrap();
        assert_eq!(without.total_records, 0);

        let with = pipeline()
            .with_date_formatter(Arc::new(ChronoDateFormatter))
            .perform(&source, &req)
            .unwrap();
        assert_eq!(with.total_records, 1);
        assert_eq!(
            with.data[0].get("username"),
            Some(&CellValue::from("user0001"))
        );
    }

    #[test]
    fn test_excluded_and_unknown_columns() {
        let source = MemorySource::new(employees());
        let response = pipeline()
            .with_excluded_columns(["ROWID"])
            .perform(&source, &request(&["username"]))
            .unwrap();
        let fields: Vec<&str> = response.data[0].fields().collect();
        assert_eq!(fields, vec!["username"]);

        let err = pipeline()
            .perform(&source, &request(&["username", "salary"]))
            .unwrap_err();
        assert!(matches!(err, TableError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_invalid_match_mode_aborts() {
        let source = MemorySource::new(employees());
        let req = parse_request(serde_json::json!({
            "pageSize": 10,
            "columns": ["username"],
            "filter": {"hired": [{"value": "2020-01-01", "matchMode": "contains"}]}
        }));
        assert!(matches!(
            pipeline().perform(&source, &req),
            Err(TableError::InvalidMatchMode { .. })
        ));
    }

    #[test]
    fn test_query_base_toggles() {
        let source = MemorySource::new(employees());
        let req = parse_request(serde_json::json!({
            "pageSize": 10,
            "columns": ["username"],
            "filter": {"remote": [{"value": true, "matchMode": "equals"}]}
        }));

        let filtered = pipeline()
            .query_base(&source, &req, QueryToggles::default())
            .unwrap();
        assert_eq!(filtered.total_records, 500);

        let unfiltered = pipeline()
            .query_base(
                &source,
                &req,
                QueryToggles {
                    sort: false,
                    filter: false,
                },
            )
            .unwrap();
        assert_eq!(unfiltered.total_records, 1000);
        assert!(unfiltered.query.order().is_empty());
    }
}
