//! Employees table endpoints
//!
//! Configuration, paged data and CSV export for the demo table, all driven by
//! the generic table pipeline over DuckDB.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::api::extractors::ApiJson;
use crate::api::types::{ApiError, CODE_EXPORT_FAILED};
use crate::core::config::TableConfig;
use crate::data::duckdb::employees::{self, EMPLOYMENT_STATUSES, Employee};
use crate::data::duckdb::schema::EMPLOYEES_TABLE;
use crate::data::duckdb::{DuckdbError, DuckdbSource};
use crate::data::{DataError, DuckdbService};
use crate::table::{
    ChronoDateFormatter, CsvSink, DateFormatContext, DateFormatter, ExportRequest, QueryPipeline,
    TableConfiguration, TablePagedResponse, TableQueryRequest, TableSchema,
};

/// Unique column appended to every ORDER BY so pages never overlap
const TIE_BREAKER: &str = "rowId";
const DEFAULT_EXPORT_FILENAME: &str = "employees";
const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

#[derive(Clone)]
pub struct EmployeesApiState {
    pub duckdb: Arc<DuckdbService>,
    pub pipeline: Arc<QueryPipeline>,
    pub table: TableConfig,
}

pub fn routes(duckdb: Arc<DuckdbService>, table: TableConfig) -> Router<()> {
    let schema = Arc::new(TableSchema::of::<Employee>());
    let state = EmployeesApiState {
        duckdb,
        pipeline: Arc::new(employees::pipeline(schema)),
        table,
    };

    Router::new()
        .route("/config", get(get_config))
        .route("/statuses", get(list_statuses))
        .route("/data", post(get_data))
        .route("/export", post(export))
        .with_state(state)
}

/// Column metadata and table defaults for the client, with the configured
/// column overrides applied
pub async fn get_config(State(state): State<EmployeesApiState>) -> Json<TableConfiguration> {
    let mut configuration = state.pipeline.schema().configuration(&state.table.options);
    configuration.apply_overrides(&state.table.column_overrides);
    Json(configuration)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusOption {
    pub label: &'static str,
    pub value: &'static str,
}

/// Values behind the `employmentStatusPredefinedFilter` dropdown
pub async fn list_statuses() -> Json<Vec<StatusOption>> {
    Json(
        EMPLOYMENT_STATUSES
            .iter()
            .map(|&s| StatusOption { label: s, value: s })
            .collect(),
    )
}

/// One page of employees
pub async fn get_data(
    State(state): State<EmployeesApiState>,
    ApiJson(request): ApiJson<TableQueryRequest>,
) -> Result<Json<TablePagedResponse>, ApiError> {
    request
        .validate(&state.table.options.allowed_items_per_page)
        .map_err(ApiError::invalid_request)?;

    let pipeline = Arc::clone(&state.pipeline);
    let page = state
        .duckdb
        .with_conn(move |conn| {
            let source = DuckdbSource::new(conn, EMPLOYEES_TABLE, pipeline.schema())
                .with_tie_breaker(TIE_BREAKER);
            pipeline.perform(&source, &request).map_err(DuckdbError::Table)
        })
        .await
        .map_err(DataError::from)?;

    Ok(Json(page))
}

/// CSV download of the current view
pub async fn export(
    State(state): State<EmployeesApiState>,
    ApiJson(request): ApiJson<ExportRequest>,
) -> Result<Response, ApiError> {
    let options = &state.table.options;
    let formatter: Arc<dyn DateFormatter> = Arc::new(ChronoDateFormatter);
    let dates = DateFormatContext::new(
        options.export_date_format.clone(),
        non_blank(request.query.date_timezone.as_deref()).unwrap_or(&options.date_timezone),
        non_blank(request.query.date_culture.as_deref()).unwrap_or(&options.date_culture),
    );
    let sink = CsvSink::new(formatter, dates);
    let export_options = state.table.export.clone();
    let filename = export_filename(&request.filename);

    let pipeline = Arc::clone(&state.pipeline);
    let outcome = state
        .duckdb
        .with_conn(move |conn| {
            let source = DuckdbSource::new(conn, EMPLOYEES_TABLE, pipeline.schema())
                .with_tie_breaker(TIE_BREAKER);
            Ok(pipeline.export(&source, &request, &export_options, sink))
        })
        .await
        .map_err(DataError::from)?;

    match outcome.file {
        Some(bytes) if outcome.success => Ok((
            [
                (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            bytes,
        )
            .into_response()),
        _ => Err(ApiError::bad_request(CODE_EXPORT_FAILED, outcome.message)),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Safe download name ending in `.csv`
fn export_filename(requested: &str) -> String {
    let cleaned: String = requested
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = cleaned.trim_matches(|c| c == '.' || c == ' ');
    let stem = if stem.is_empty() {
        DEFAULT_EXPORT_FILENAME
    } else {
        stem
    };

    if stem.to_ascii_lowercase().ends_with(".csv") {
        stem.to_string()
    } else {
        format!("{}.csv", stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn app(rows: u32) -> Router {
        let duckdb = Arc::new(DuckdbService::open_in_memory().unwrap());
        duckdb.seed_employees(rows).await.unwrap();
        routes(duckdb, TableConfig::default())
    }

    async fn post_json(router: Router, uri: &str, body: serde_json::Value) -> Response {
        router
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename(""), "employees.csv");
        assert_eq!(export_filename("report"), "report.csv");
        assert_eq!(export_filename("Report.CSV"), "Report.CSV");
        assert_eq!(export_filename("../etc/passwd"), "_etc_passwd.csv");
        assert_eq!(export_filename("a\"b"), "a_b.csv");
    }

    #[tokio::test]
    async fn test_config_hides_internal_columns() {
        let response = app(0)
            .await
            .oneshot(Request::get("/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let fields: Vec<&str> = body["columnsInfo"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"username"));
        assert!(!fields.contains(&"rowId"));
        assert!(!fields.contains(&"canBeDeleted"));
        assert_eq!(body["maxViews"], 10);
    }

    #[tokio::test]
    async fn test_config_applies_column_overrides() {
        let duckdb = Arc::new(DuckdbService::open_in_memory().unwrap());
        let mut table = TableConfig::default();
        table.column_overrides.insert(
            "SALARY".to_string(),
            serde_json::from_value(serde_json::json!({"header": "Pay", "startHidden": true}))
                .unwrap(),
        );
        let response = routes(duckdb, table)
            .oneshot(Request::get("/config").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = json_body(response).await;
        let salary = body["columnsInfo"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["field"] == "salary")
            .unwrap();
        assert_eq!(salary["header"], "Pay");
        assert_eq!(salary["startHidden"], true);
        assert_eq!(salary["columnDescription"], "Yearly gross salary");
    }

    #[tokio::test]
    async fn test_statuses() {
        let response = app(0)
            .await
            .oneshot(Request::get("/statuses").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), EMPLOYMENT_STATUSES.len());
        assert_eq!(body[0]["value"], EMPLOYMENT_STATUSES[0]);
    }

    #[tokio::test]
    async fn test_data_page() {
        let response = post_json(
            app(25).await,
            "/data",
            serde_json::json!({
                "page": 1,
                "pageSize": 10,
                "columns": ["username", "age"]
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["page"], 1);
        assert_eq!(body["totalRecords"], 25);
        assert_eq!(body["totalRecordsNotFiltered"], 25);

        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 10);
        assert!(rows[0].get("username").is_some());
        assert!(rows[0].get("rowId").is_some());
        assert!(rows[0].get("salary").is_none());
    }

    #[tokio::test]
    async fn test_data_filter_narrows_total() {
        let response = post_json(
            app(50).await,
            "/data",
            serde_json::json!({
                "page": 0,
                "pageSize": 50,
                "columns": ["username", "payedTaxes"],
                "filter": {
                    "payedTaxes": [{ "value": true, "matchMode": "equals", "operator": "and" }]
                }
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let total = body["totalRecords"].as_u64().unwrap();
        assert!(total < 50);
        assert_eq!(body["totalRecordsNotFiltered"], 50);
        for row in body["data"].as_array().unwrap() {
            assert_eq!(row["payedTaxes"], true);
        }
    }

    #[tokio::test]
    async fn test_data_rejects_page_size() {
        let response = post_json(
            app(0).await,
            "/data",
            serde_json::json!({ "page": 0, "pageSize": 7, "columns": ["username"] }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_data_rejects_unknown_column() {
        let response = post_json(
            app(0).await,
            "/data",
            serde_json::json!({ "page": 0, "pageSize": 10, "columns": ["nope"] }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "INVALID_QUERY");
    }

    #[tokio::test]
    async fn test_data_rejects_malformed_json() {
        let response = app(0)
            .await
            .oneshot(
                Request::post("/data")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "JSON_PARSE_ERROR");
    }

    #[tokio::test]
    async fn test_export_csv() {
        let response = post_json(
            app(12).await,
            "/export",
            serde_json::json!({
                "columns": ["username", "age"],
                "filename": "staff"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"staff.csv\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines[0], "MAIN");
        assert!(lines[1].starts_with("Report date:"));
        assert_eq!(lines[2], "Username,Age");
        assert_eq!(lines.len(), 3 + 12);
    }

    #[tokio::test]
    async fn test_export_failure_is_bad_request() {
        let response = post_json(
            app(3).await,
            "/export",
            serde_json::json!({ "columns": ["nope"] }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["code"], CODE_EXPORT_FAILED);
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Error generating the export file")
        );
    }
}
