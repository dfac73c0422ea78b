//! Sort assembly

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::columns::{SortDirection, TableSchema};
use super::error::TableError;
use super::value::CellValue;

/// Requested sort on one column. `order == 1` is ascending, anything else
/// descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSort {
    pub field: String,
    #[serde(default)]
    pub order: i32,
}

/// One resolved ordering key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == SortDirection::Ascending
    }
}

/// Ordering used when a request carries no explicit sort.
///
/// Fields pair with directions by position; fields without a direction sort
/// descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultSort {
    pub fields: Vec<String>,
    pub directions: Vec<SortDirection>,
}

impl DefaultSort {
    pub fn new<I, S>(fields: I, directions: Vec<SortDirection>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            directions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Resolve the ordering keys for a request.
///
/// Explicit keys win when present and must name sortable columns. Otherwise
/// the default sort applies. With neither the result is empty and row order
/// is left to the source.
pub fn build_order(
    schema: &TableSchema,
    explicit: Option<&[ColumnSort]>,
    default: &DefaultSort,
) -> Result<Vec<SortKey>, TableError> {
    if let Some(explicit) = explicit.filter(|s| !s.is_empty()) {
        return explicit
            .iter()
            .map(|sort| {
                let column = schema.require(&sort.field)?;
                if !column.metadata().can_be_sorted {
                    return Err(TableError::invalid_configuration(format!(
                        "Column '{}' cannot be sorted",
                        column.field()
                    )));
                }
                let direction = if sort.order == 1 {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                };
                Ok(SortKey::new(column.field(), direction))
            })
            .collect();
    }

    default
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let column = schema.require(field)?;
            let direction = default
                .directions
                .get(i)
                .copied()
                .unwrap_or(SortDirection::Descending);
            Ok(SortKey::new(column.field(), direction))
        })
        .collect()
}

/// Compare two rows key by key. Nulls sort first ascending, last descending.
pub fn compare_rows<A, B>(keys: &[SortKey], a: &A, b: &B) -> Ordering
where
    A: Fn(&str) -> CellValue,
    B: Fn(&str) -> CellValue,
{
    for key in keys {
        let ordering = a(&key.field).sort_cmp(&b(&key.field));
        let ordering = if key.is_ascending() {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
