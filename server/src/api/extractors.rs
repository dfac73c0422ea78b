//! Request extractors with structured rejections

use std::ops::Deref;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;

use crate::core::constants::{DEFAULT_USERNAME, USER_HEADER};

/// Maximum accepted username length
pub const MAX_USERNAME_LENGTH: usize = 128;

/// Caller identity taken from the `X-User` header.
///
/// Requests without the header act as [`DEFAULT_USERNAME`]. Surrounding
/// whitespace is trimmed; blank values fall back to the default too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(pub String);

impl Deref for Username {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Username
where
    S: Send + Sync,
{
    type Rejection = ExtractRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_HEADER) else {
            return Ok(Self(DEFAULT_USERNAME.to_string()));
        };

        let value = value
            .to_str()
            .map_err(|_| ExtractRejection::InvalidUsername)?
            .trim();
        if value.is_empty() {
            return Ok(Self(DEFAULT_USERNAME.to_string()));
        }
        if value.len() > MAX_USERNAME_LENGTH {
            return Err(ExtractRejection::InvalidUsername);
        }
        Ok(Self(value.to_string()))
    }
}

/// JSON body extractor whose parse failures use the API error body
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ExtractRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ExtractRejection::Json)?;
        Ok(Self(value))
    }
}

pub enum ExtractRejection {
    /// Failed to parse JSON body
    Json(JsonRejection),
    /// `X-User` is not visible ASCII or too long
    InvalidUsername,
}

impl IntoResponse for ExtractRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Json(rejection) => (
                rejection.status(),
                "JSON_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::InvalidUsername => (
                StatusCode::BAD_REQUEST,
                "INVALID_USERNAME",
                format!(
                    "Invalid {} header: must be 1-{} visible characters",
                    USER_HEADER, MAX_USERNAME_LENGTH
                ),
            ),
        };
        tracing::debug!(code, %message, "Rejected request");
        (
            status,
            Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    async fn username(header: Option<&str>) -> Result<Username, StatusCode> {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Username::from_request_parts(&mut parts, &())
            .await
            .map_err(|r| r.into_response().status())
    }

    #[tokio::test]
    async fn test_username_defaults() {
        assert_eq!(username(None).await.unwrap().0, DEFAULT_USERNAME);
        assert_eq!(username(Some("   ")).await.unwrap().0, DEFAULT_USERNAME);
    }

    #[tokio::test]
    async fn test_username_trimmed() {
        assert_eq!(username(Some(" maria ")).await.unwrap().0, "maria");
    }

    #[tokio::test]
    async fn test_username_too_long() {
        let long = "u".repeat(MAX_USERNAME_LENGTH + 1);
        assert_eq!(
            username(Some(&long)).await.unwrap_err(),
            StatusCode::BAD_REQUEST
        );
    }
}
