//! Saved table views
//!
//! A view is an opaque client layout blob stored per user and table key.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewData {
    pub view_alias: String,
    /// Serialized by the client, never inspected here
    pub view_data: String,
    #[serde(default)]
    pub last_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewLoadRequest {
    pub table_view_save_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSaveRequest {
    pub table_view_save_key: String,
    #[serde(default)]
    pub views: Vec<ViewData>,
}

fn require_key(key: &str) -> Result<(), ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::new("view_key_empty")
            .with_message("A table view save key is required".into()));
    }
    Ok(())
}

impl ViewLoadRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_key(&self.table_view_save_key)
    }
}

impl ViewSaveRequest {
    /// Key present, at most `max_views` views, aliases non-empty and unique
    pub fn validate(&self, max_views: u8) -> Result<(), ValidationError> {
        require_key(&self.table_view_save_key)?;

        if self.views.len() > usize::from(max_views) {
            return Err(ValidationError::new("too_many_views").with_message(
                format!(
                    "At most {} views can be saved, got {}",
                    max_views,
                    self.views.len()
                )
                .into(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.views.len());
        for view in &self.views {
            if view.view_alias.trim().is_empty() {
                return Err(ValidationError::new("view_alias_empty")
                    .with_message("View aliases cannot be empty".into()));
            }
            if !seen.insert(view.view_alias.as_str()) {
                return Err(ValidationError::new("view_alias_duplicate")
                    .with_message(format!("Duplicate view alias '{}'", view.view_alias).into()));
            }
        }
        Ok(())
    }
}

/// Persistence for saved views
#[async_trait]
pub trait ViewStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Views of one user and table, ordered by alias
    async fn get_views(
        &self,
        username: &str,
        table_key: &str,
    ) -> Result<Vec<ViewData>, Self::Error>;

    /// Replace the stored set atomically: upsert by alias, delete the rest
    async fn save_views(
        &self,
        username: &str,
        table_key: &str,
        views: &[ViewData],
    ) -> Result<(), Self::Error>;
}
