//! TableKit server library
//!
//! Server-side paging, sorting, filtering and export for data tables, with a
//! demo HTTP API over a DuckDB table and SQLite-backed saved views.

pub mod api;
mod app;
pub mod core;
pub mod data;
pub mod table;
pub mod utils;
