//! SQLite repositories

pub mod table_view;
