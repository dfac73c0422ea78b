//! Export adapter
//!
//! Drives the query pipeline in fixed-size batches and writes each row to a
//! [`RowSink`]. Sorting and filtering can be switched off independently.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::columns::DataType;
use super::dates::{DateFormatContext, DateFormatter};
use super::error::TableError;
use super::pagination::paginate;
use super::query::{QueryPipeline, QueryToggles, TableQueryRequest};
use super::source::TableSource;
use super::value::{CellValue, Record};

pub const DEFAULT_SHEET_NAME: &str = "MAIN";
pub const DEFAULT_EXPORT_BATCH_SIZE: u8 = 250;

const EXPORT_OK_MESSAGE: &str = "Export file generated OK.";
const REPORT_DATE_PATTERN: &str = "%d-%b-%Y %I:%M:%S";

const ICON_TRUE: &str = "✔";
const ICON_FALSE: &str = "✘";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(flatten)]
    pub query: TableQueryRequest,
    /// Export every configured column instead of `columns`
    #[serde(default)]
    pub all_columns: bool,
    #[serde(default)]
    pub apply_filters: bool,
    #[serde(default)]
    pub apply_sorts: bool,
    #[serde(default)]
    pub filename: String,
    #[serde(default, alias = "useIconInBools")]
    pub use_icon_for_booleans: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub sheet_name: String,
    pub batch_size: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            batch_size: DEFAULT_EXPORT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportColumn {
    pub field: String,
    pub header: String,
    pub data_type: DataType,
}

/// What a sink learns before the first row
#[derive(Debug, Clone, PartialEq)]
pub struct ExportLayout {
    pub generated_at: DateTime<Utc>,
    pub sheet_name: String,
    pub columns: Vec<ExportColumn>,
}

impl ExportLayout {
    /// Report timestamp, UTC, 12-hour clock
    pub fn report_date(&self) -> String {
        self.generated_at.format(REPORT_DATE_PATTERN).to_string()
    }
}

/// One exported cell after type-directed coercion
#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Boolean rendered as a check or cross mark
    Icon {
        symbol: &'static str,
        positive: bool,
    },
    Date(DateTime<Utc>),
}

impl ExportCell {
    pub fn coerce(value: &CellValue, data_type: DataType, use_icons: bool) -> Self {
        if value.is_null() {
            return ExportCell::Empty;
        }
        match data_type {
            DataType::Numeric => value
                .as_f64()
                .map(ExportCell::Number)
                .unwrap_or(ExportCell::Empty),
            DataType::Boolean => match value.as_bool() {
                Some(b) if use_icons => ExportCell::Icon {
                    symbol: if b { ICON_TRUE } else { ICON_FALSE },
                    positive: b,
                },
                Some(b) => ExportCell::Bool(b),
                None => ExportCell::Empty,
            },
            DataType::Date => match value.as_datetime() {
                Some(dt) => ExportCell::Date(dt),
                None => value.to_text().map(ExportCell::Text).unwrap_or(ExportCell::Empty),
            },
            DataType::Text | DataType::List => value
                .to_text()
                .map(ExportCell::Text)
                .unwrap_or(ExportCell::Empty),
        }
    }
}

/// Destination of an export: one layout, rows in order, then one finish
pub trait RowSink {
    type Output;

    fn begin(&mut self, layout: &ExportLayout) -> Result<(), TableError>;

    fn write_row(&mut self, cells: &[ExportCell]) -> Result<(), TableError>;

    fn finish(self) -> Result<Self::Output, TableError>;
}

/// Keeps everything in memory
#[derive(Debug, Clone, Default)]
pub struct CollectSink {
    pub layout: Option<ExportLayout>,
    pub rows: Vec<Vec<ExportCell>>,
}

impl RowSink for CollectSink {
    type Output = CollectSink;

    fn begin(&mut self, layout: &ExportLayout) -> Result<(), TableError> {
        self.layout = Some(layout.clone());
        Ok(())
    }

    fn write_row(&mut self, cells: &[ExportCell]) -> Result<(), TableError> {
        self.rows.push(cells.to_vec());
        Ok(())
    }

    fn finish(self) -> Result<Self::Output, TableError> {
        Ok(self)
    }
}

/// RFC 4180 CSV: sheet name title, report date line, header row, then data
#[derive(Debug)]
pub struct CsvSink {
    formatter: Arc<dyn DateFormatter>,
    dates: DateFormatContext,
    out: String,
    columns: usize,
}

impl CsvSink {
    /// `dates` controls how date cells render
    pub fn new(formatter: Arc<dyn DateFormatter>, dates: DateFormatContext) -> Self {
        Self {
            formatter,
            dates,
            out: String::new(),
            columns: 0,
        }
    }

    fn push_line<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = String>,
    {
        let line: Vec<String> = fields.into_iter().map(|f| quote_csv(&f)).collect();
        self.out.push_str(&line.join(","));
        self.out.push_str("\r\n");
    }

    fn render(&self, cell: &ExportCell) -> String {
        match cell {
            ExportCell::Empty => String::new(),
            ExportCell::Text(s) => s.clone(),
            ExportCell::Number(n) => n.to_string(),
            ExportCell::Bool(b) => b.to_string(),
            ExportCell::Icon { symbol, .. } => symbol.to_string(),
            ExportCell::Date(dt) => self.formatter.format(*dt, &self.dates),
        }
    }
}

fn quote_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl RowSink for CsvSink {
    type Output = Vec<u8>;

    fn begin(&mut self, layout: &ExportLayout) -> Result<(), TableError> {
        self.columns = layout.columns.len();
        self.push_line([layout.sheet_name.clone()]);
        self.push_line([format!("Report date: {} UTC", layout.report_date())]);
        self.push_line(layout.columns.iter().map(|c| c.header.clone()));
        Ok(())
    }

    fn write_row(&mut self, cells: &[ExportCell]) -> Result<(), TableError> {
        if cells.len() != self.columns {
            return Err(TableError::source(format!(
                "row has {} cells, expected {}",
                cells.len(),
                self.columns
            )));
        }
        let rendered: Vec<String> = cells.iter().map(|c| self.render(c)).collect();
        self.push_line(rendered);
        Ok(())
    }

    fn finish(self) -> Result<Self::Output, TableError> {
        Ok(self.out.into_bytes())
    }
}

/// Result of an export; failures carry no file
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome<T> {
    pub success: bool,
    pub file: Option<T>,
    pub message: String,
    pub filename: String,
}

impl QueryPipeline {
    /// Columns an export writes, in request order
    pub fn export_columns(&self, request: &ExportRequest) -> Result<Vec<ExportColumn>, TableError> {
        let schema = self.schema();
        let columns: Vec<_> = if request.all_columns {
            schema
                .columns()
                .iter()
                .filter(|c| c.send_to_client())
                .collect()
        } else {
            request
                .query
                .columns
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|name| schema.require(name))
                .collect::<Result<_, _>>()?
        };

        Ok(columns
            .into_iter()
            .filter(|c| !self.is_excluded(c.field()))
            .map(|c| ExportColumn {
                field: c.field().to_string(),
                header: c.header().to_string(),
                data_type: c.data_type(),
            })
            .collect())
    }

    /// Run the export, converting any failure into an unsuccessful outcome
    pub fn export<S, K>(
        &self,
        source: &S,
        request: &ExportRequest,
        options: &ExportOptions,
        sink: K,
    ) -> ExportOutcome<K::Output>
    where
        S: TableSource + ?Sized,
        K: RowSink,
    {
        match self.write_export(source, request, options, sink) {
            Ok((file, rows)) => {
                tracing::debug!(rows, filename = %request.filename, "Export finished");
                ExportOutcome {
                    success: true,
                    file: Some(file),
                    message: EXPORT_OK_MESSAGE.to_string(),
                    filename: request.filename.clone(),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, filename = %request.filename, "Export failed");
                ExportOutcome {
                    success: false,
                    file: None,
                    message: format!("Error generating the export file: {}", e),
                    filename: request.filename.clone(),
                }
            }
        }
    }

    fn write_export<S, K>(
        &self,
        source: &S,
        request: &ExportRequest,
        options: &ExportOptions,
        mut sink: K,
    ) -> Result<(K::Output, u64), TableError>
    where
        S: TableSource + ?Sized,
        K: RowSink,
    {
        let mut query = request.query.clone();
        if !request.apply_sorts {
            query.sort = Some(Vec::new());
        }

        let columns = self.export_columns(request)?;
        let base = self.query_base(
            source,
            &query,
            QueryToggles {
                sort: true,
                filter: request.apply_filters,
            },
        )?;

        let layout = ExportLayout {
            generated_at: Utc::now(),
            sheet_name: options.sheet_name.clone(),
            columns,
        };
        sink.begin(&layout)?;

        let fields: Vec<&str> = layout.columns.iter().map(|c| c.field.as_str()).collect();
        let mut written = 0u64;
        let mut current = -1i32;
        loop {
            let previous = current;
            let page = paginate(base.total_records, current.saturating_add(1), options.batch_size);
            current = page.page;
            if current == previous {
                break;
            }
            if page.window.len_within(base.total_records) == 0 {
                continue;
            }

            let rows = source.fetch(&base.query, page.window, &fields)?;
            for row in &rows {
                sink.write_row(&export_row(&layout, row, request.use_icon_for_booleans))?;
                written += 1;
            }
        }

        Ok((sink.finish()?, written))
    }
}

fn export_row(layout: &ExportLayout, row: &Record, use_icons: bool) -> Vec<ExportCell> {
    layout
        .columns
        .iter()
        .map(|c| {
            row.get(&c.field)
                .map(|v| ExportCell::coerce(v, c.data_type, use_icons))
                .unwrap_or(ExportCell::Empty)
        })
        .collect()
}
