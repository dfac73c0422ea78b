//! Data table engine
//!
//! Turns generic page/sort/filter requests into queries over a
//! [`TableSource`]:
//! - `columns` - column metadata, schemas and published configuration
//! - `predicate` / `filter` - per-column predicates and their assembly
//! - `sort` / `pagination` - ordering keys and page windows
//! - `query` - the request pipeline
//! - `export` - batched export into a [`RowSink`]
//! - `views` - saved per-user table layouts

pub mod columns;
pub mod dates;
pub mod error;
pub mod export;
pub mod filter;
pub mod pagination;
pub mod predicate;
pub mod query;
pub mod sort;
pub mod source;
pub mod value;
pub mod views;

pub use columns::{
    ColumnDef, ColumnMetadata, ColumnMetadataOverride, DataType, SortDirection, TableConfiguration,
    TableEntity, TableOptions, TableSchema,
};
pub use dates::{ChronoDateFormatter, DateFormatContext, DateFormatter};
pub use error::TableError;
pub use export::{CollectSink, CsvSink, ExportOptions, ExportOutcome, ExportRequest, RowSink};
pub use filter::{ColumnFilter, ColumnFilters, FilterOperator};
pub use predicate::Predicate;
pub use query::{QueryPipeline, TablePagedResponse, TableQueryRequest};
pub use sort::{ColumnSort, DefaultSort, SortKey};
pub use source::{MemorySource, SourceQuery, TableSource};
pub use value::{CellValue, FilterValue, Record, ValueKind};
pub use views::{ViewData, ViewLoadRequest, ViewSaveRequest, ViewStore};
