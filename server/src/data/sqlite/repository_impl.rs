//! ViewStore implementation for SQLite

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::table::{ViewData, ViewStore};

use super::SqliteService;
use super::repositories::table_view;

#[async_trait]
impl ViewStore for Arc<SqliteService> {
    type Error = DataError;

    async fn get_views(&self, username: &str, table_key: &str) -> Result<Vec<ViewData>, DataError> {
        table_view::get_views(self.pool(), username, table_key)
            .await
            .map_err(Into::into)
    }

    async fn save_views(
        &self,
        username: &str,
        table_key: &str,
        views: &[ViewData],
    ) -> Result<(), DataError> {
        table_view::save_views(self.pool(), username, table_key, views)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_through_trait_object() {
        let service = Arc::new(SqliteService::open_in_memory().await.unwrap());
        let store: Arc<dyn ViewStore<Error = DataError>> = Arc::new(service);

        let views = vec![ViewData {
            view_alias: "mine".to_string(),
            view_data: "{\"columns\":[]}".to_string(),
            last_active: true,
        }];
        store.save_views("ana", "employees", &views).await.unwrap();

        assert_eq!(store.get_views("ana", "employees").await.unwrap(), views);
        assert!(store.get_views("bob", "employees").await.unwrap().is_empty());
    }
}
