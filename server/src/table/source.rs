//! Queryable data sources

use super::columns::TableEntity;
use super::error::TableError;
use super::pagination::PageWindow;
use super::predicate::Predicate;
use super::sort::{SortKey, compare_rows};
use super::value::Record;

/// Ordering and filtering applied to a source before counting or fetching
#[derive(Debug, Clone)]
pub struct SourceQuery {
    order: Vec<SortKey>,
    predicate: Predicate,
}

impl Default for SourceQuery {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            predicate: Predicate::True,
        }
    }
}

impl SourceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, keys: Vec<SortKey>) -> Self {
        self.order = keys;
        self
    }

    /// AND a predicate onto the query
    pub fn filter(mut self, predicate: Predicate) -> Self {
        let current = std::mem::replace(&mut self.predicate, Predicate::True);
        self.predicate = current.and(predicate);
        self
    }

    pub fn order(&self) -> &[SortKey] {
        &self.order
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

/// A collection the table pipeline can count and page through.
///
/// `fetch` returns the rows of `window` in query order, each projected to
/// `fields` (canonical names, in the given order).
pub trait TableSource {
    fn count(&self, query: &SourceQuery) -> Result<u64, TableError>;

    fn fetch(
        &self,
        query: &SourceQuery,
        window: PageWindow,
        fields: &[&str],
    ) -> Result<Vec<Record>, TableError>;
}

/// Source over entities held in memory
#[derive(Debug, Clone)]
pub struct MemorySource<E> {
    rows: Vec<E>,
}

impl<E: TableEntity> MemorySource<E> {
    pub fn new(rows: Vec<E>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn matching<'a>(&'a self, query: &'a SourceQuery) -> impl Iterator<Item = &'a E> + 'a {
        self.rows
            .iter()
            .filter(move |row| query.predicate().evaluate(&|f: &str| row.cell(f)))
    }
}

impl<E: TableEntity> TableSource for MemorySource<E> {
    fn count(&self, query: &SourceQuery) -> Result<u64, TableError> {
        Ok(self.matching(query).count() as u64)
    }

    fn fetch(
        &self,
        query: &SourceQuery,
        window: PageWindow,
        fields: &[&str],
    ) -> Result<Vec<Record>, TableError> {
        let mut rows: Vec<&E> = self.matching(query).collect();
        if !query.order().is_empty() {
            rows.sort_by(|a, b| {
                compare_rows(query.order(), &|f: &str| a.cell(f), &|f: &str| b.cell(f))
            });
        }

        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| {
                fields
                    .iter()
                    .map(|f| (f.to_string(), row.cell(f)))
                    .collect()
            })
            .collect())
    }
}
