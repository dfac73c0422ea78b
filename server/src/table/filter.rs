//! Filter assembly
//!
//! Folds the per-column clauses of a request and the global search text into
//! one [`Predicate`]. Clauses of one column combine with each clause's own
//! operator; columns and the global search are ANDed.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::columns::{Column, DataType, TableSchema};
use super::dates::{DateFormatContext, DateFormatter, RequestDateContext};
use super::error::TableError;
use super::predicate::{
    DateText, Predicate, boolean_predicate, date_predicate, global_predicate, list_predicate,
    numeric_predicate, text_predicate,
};
use super::value::FilterValue;

const MATCH_IN: &str = "in";
const MATCH_NOT_IN: &str = "notIn";

/// How a clause joins the clauses before it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[default]
    #[serde(rename = "and", alias = "AND", alias = "And")]
    And,
    #[serde(rename = "or", alias = "OR", alias = "Or")]
    Or,
}

/// One filter clause on a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFilter {
    /// Scalar value, or an array for `in`/`notIn`. `null` disables the clause.
    #[serde(default)]
    pub value: Option<FilterValue>,
    #[serde(default = "default_match_mode")]
    pub match_mode: String,
    #[serde(default)]
    pub operator: FilterOperator,
}

fn default_match_mode() -> String {
    "contains".to_string()
}

/// Per-column filters keyed by field name (any casing)
pub type ColumnFilters = BTreeMap<String, Vec<ColumnFilter>>;

/// Everything predicate builders need besides the clause itself
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub schema: &'a TableSchema,
    pub formatter: Option<&'a Arc<dyn DateFormatter>>,
    pub dates: RequestDateContext<'a>,
}

impl<'a> FilterContext<'a> {
    fn date_text(&self, column: &Column) -> DateText<'a> {
        DateText {
            formatter: self.formatter,
            context: DateFormatContext::resolve(column.metadata(), &self.dates),
        }
    }
}

/// Predicate for a single clause value. `None` means the clause is a no-op.
fn clause_predicate(
    ctx: &FilterContext<'_>,
    column: &Column,
    value: &FilterValue,
    match_mode: &str,
) -> Result<Option<Predicate>, TableError> {
    match column.data_type() {
        DataType::Text => {
            let raw = value.as_text().ok_or_else(|| {
                TableError::invalid_filter_value(
                    column.field(),
                    value.to_string(),
                    "expected a scalar",
                )
            })?;
            text_predicate(column, &raw, match_mode, &ctx.date_text(column)).map(Some)
        }
        DataType::Numeric => numeric_predicate(column, value, match_mode).map(Some),
        DataType::Boolean => Ok(boolean_predicate(column, value)),
        DataType::Date => {
            let timezone = ctx.date_text(column).context.timezone;
            date_predicate(column, value, match_mode, &timezone)
        }
        DataType::List => list_predicate(column, value).map(Some),
    }
}

/// Match mode each list item is tested with when expanding in/not-in
fn expanded_match_mode(data_type: DataType, negate: bool) -> &'static str {
    match (data_type, negate) {
        (DataType::Date, false) => "dateIs",
        (DataType::Date, true) => "dateIsNot",
        (_, false) => "equals",
        (_, true) => "notEquals",
    }
}

fn fold(acc: Option<Predicate>, next: Predicate, operator: FilterOperator) -> Option<Predicate> {
    Some(match acc {
        None => next,
        Some(acc) => match operator {
            FilterOperator::And => acc.and(next),
            FilterOperator::Or => acc.or(next),
        },
    })
}

/// Fold the clauses of one column. The first valid clause replaces the
/// always-true base; a column without valid clauses yields `True`.
pub fn column_predicate(
    ctx: &FilterContext<'_>,
    column: &Column,
    clauses: &[ColumnFilter],
) -> Result<Predicate, TableError> {
    let mut acc: Option<Predicate> = None;

    for clause in clauses {
        let Some(value) = &clause.value else {
            continue;
        };

        let negate = match clause.match_mode.as_str() {
            MATCH_IN => Some(false),
            MATCH_NOT_IN => Some(true),
            _ => None,
        };

        match negate {
            Some(negate) => {
                let Some(items) = value.as_list() else {
                    tracing::debug!(
                        field = column.field(),
                        "Ignoring in/notIn clause with a scalar value"
                    );
                    continue;
                };
                let mode = expanded_match_mode(column.data_type(), negate);
                for item in items {
                    if let Some(p) = clause_predicate(ctx, column, item, mode)? {
                        acc = fold(acc, p, clause.operator);
                    }
                }
            }
            None => {
                if let Some(p) = clause_predicate(ctx, column, value, &clause.match_mode)? {
                    acc = fold(acc, p, clause.operator);
                }
            }
        }
    }

    Ok(acc.unwrap_or(Predicate::True))
}

/// OR of the contains tests of every globally filterable column, or `None`
/// when the search text is blank or no column supports it.
pub fn global_filter_predicate(ctx: &FilterContext<'_>, global: Option<&str>) -> Option<Predicate> {
    let value = global.filter(|g| !g.trim().is_empty())?;

    let tests: Vec<Predicate> = ctx
        .schema
        .columns()
        .iter()
        .filter(|c| c.metadata().can_be_global_filtered)
        .filter_map(|c| global_predicate(c, value, &ctx.date_text(c)))
        .collect();

    if tests.is_empty() {
        None
    } else {
        Some(Predicate::Or(tests))
    }
}

/// Combine the global search and every column's clauses.
///
/// Filter keys must name a filterable column.
pub fn build_filter(
    ctx: &FilterContext<'_>,
    filters: &ColumnFilters,
    global: Option<&str>,
) -> Result<Predicate, TableError> {
    let mut combined = global_filter_predicate(ctx, global).unwrap_or(Predicate::True);

    for (key, clauses) in filters {
        let column = ctx.schema.require(key)?;
        if !column.metadata().can_be_filtered {
            return Err(TableError::invalid_configuration(format!(
                "Column '{}' cannot be filtered",
                column.field()
            )));
        }
        combined = combined.and(column_predicate(ctx, column, clauses)?);
    }

    tracing::debug!(columns = filters.len(), "Filter assembled");
    Ok(combined)
}
