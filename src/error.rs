use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::fetcher::FetchError;
use crate::models::ErrorBody;
use crate::token::TokenError;

/// Failures surfaced at the HTTP boundary.
///
/// Per-record extraction anomalies never reach this type; they are dropped
/// inside the extractor.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{context}")]
    Upstream {
        context: &'static str,
        #[source]
        source: FetchError,
    },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn upstream(context: &'static str, source: FetchError) -> Self {
        ApiError::Upstream { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        ApiError::BadRequest(format!("Invalid data parameter encoding: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = match &self {
            ApiError::Upstream { source, .. } => {
                tracing::error!(error = %source, "{}", self);
                Some(source.to_string())
            }
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            details,
        };
        (self.status(), Json(body)).into_response()
    }
}
