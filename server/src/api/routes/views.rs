//! Saved table views
//!
//! Views belong to the caller named by the `X-User` header and are keyed by
//! the client's table view save key.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use crate::api::extractors::{ApiJson, Username};
use crate::api::types::ApiError;
use crate::data::SharedViewStore;
use crate::table::{ViewData, ViewLoadRequest, ViewSaveRequest};

const VIEWS_SAVED_MESSAGE: &str = "Views saved OK";

#[derive(Clone)]
pub struct ViewsApiState {
    pub store: SharedViewStore,
    pub max_views: u8,
}

pub fn routes(store: SharedViewStore, max_views: u8) -> Router<()> {
    let state = ViewsApiState { store, max_views };

    Router::new()
        .route("/load", post(load_views))
        .route("/save", post(save_views))
        .with_state(state)
}

pub async fn load_views(
    State(state): State<ViewsApiState>,
    user: Username,
    ApiJson(request): ApiJson<ViewLoadRequest>,
) -> Result<Json<Vec<ViewData>>, ApiError> {
    request.validate().map_err(ApiError::invalid_request)?;

    let views = state
        .store
        .get_views(&user, &request.table_view_save_key)
        .await?;
    Ok(Json(views))
}

#[derive(Debug, Serialize)]
pub struct SaveViewsResponse {
    pub message: &'static str,
    pub saved: usize,
}

/// Replace the caller's views for one table
pub async fn save_views(
    State(state): State<ViewsApiState>,
    user: Username,
    ApiJson(request): ApiJson<ViewSaveRequest>,
) -> Result<Json<SaveViewsResponse>, ApiError> {
    request
        .validate(state.max_views)
        .map_err(ApiError::invalid_request)?;

    state
        .store
        .save_views(&user, &request.table_view_save_key, &request.views)
        .await?;

    tracing::debug!(
        user = %user.0,
        key = %request.table_view_save_key,
        count = request.views.len(),
        "Views saved"
    );
    Ok(Json(SaveViewsResponse {
        message: VIEWS_SAVED_MESSAGE,
        saved: request.views.len(),
    }))
}
