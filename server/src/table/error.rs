//! Error types for the table query pipeline

use thiserror::Error;

use super::columns::DataType;

/// Errors raised while building or running a table query.
///
/// Every variant except `Source` indicates a misconfigured column or a
/// malformed request reference; these abort the whole query. Bad user input
/// for Boolean and Date filters never reaches this type, those clauses are
/// dropped instead.
#[derive(Error, Debug)]
pub enum TableError {
    /// A request referenced a field with no (or unusable) column metadata
    #[error("Invalid column configuration: {0}")]
    InvalidConfiguration(String),

    /// Unknown match mode for the column data type
    #[error("Invalid match mode '{match_mode}' for {data_type} column '{field}'")]
    InvalidMatchMode {
        field: String,
        data_type: DataType,
        match_mode: String,
    },

    /// Filter value could not be converted to the column's value kind
    #[error("Invalid filter value '{value}' for column '{field}': {reason}")]
    InvalidFilterValue {
        field: String,
        value: String,
        reason: String,
    },

    /// A date column was compared as text without a date formatter
    #[error("Column '{field}' needs a date formatter to be compared as text")]
    UnsupportedConversion { field: String },

    /// The underlying data source failed
    #[error("Data source error: {0}")]
    Source(String),
}

impl TableError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn invalid_match_mode(field: &str, data_type: DataType, match_mode: &str) -> Self {
        Self::InvalidMatchMode {
            field: field.to_string(),
            data_type,
            match_mode: match_mode.to_string(),
        }
    }

    pub fn invalid_filter_value(
        field: &str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFilterValue {
            field: field.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn source(message: impl std::fmt::Display) -> Self {
        Self::Source(message.to_string())
    }

    /// Stable code used when surfacing the error over the API
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            Self::InvalidMatchMode { .. } => "INVALID_MATCH_MODE",
            Self::InvalidFilterValue { .. } => "INVALID_FILTER_VALUE",
            Self::UnsupportedConversion { .. } => "UNSUPPORTED_CONVERSION",
            Self::Source(_) => "SOURCE_ERROR",
        }
    }

    /// Whether the error was caused by the request rather than the backend
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Source(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_match_mode_display() {
        let err = TableError::invalid_match_mode("age", DataType::Numeric, "between");
        assert_eq!(
            err.to_string(),
            "Invalid match mode 'between' for numeric column 'age'"
        );
    }

    #[test]
    fn test_invalid_filter_value_display() {
        let err = TableError::invalid_filter_value("age", "abc", "not a number");
        assert_eq!(
            err.to_string(),
            "Invalid filter value 'abc' for column 'age': not a number"
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            TableError::invalid_configuration("x").code(),
            "INVALID_CONFIGURATION"
        );
        assert_eq!(
            TableError::UnsupportedConversion {
                field: "birthdate".into()
            }
            .code(),
            "UNSUPPORTED_CONVERSION"
        );
        assert_eq!(TableError::source("boom").code(), "SOURCE_ERROR");
    }

    #[test]
    fn test_is_client_error() {
        assert!(TableError::invalid_configuration("x").is_client_error());
        assert!(!TableError::source("disk full").is_client_error());
    }
}
