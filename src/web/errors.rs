//! Error types and handling for web handlers

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::core::catalog::CatalogError;
use crate::core::engine::EngineError;
use crate::web::pages::{ErrorPage, render};

/// Served if the error page itself fails to render
const FALLBACK_ERROR_HTML: &str = "<!DOCTYPE html><html><body><h1>Something went wrong</h1>\
<p><a href=\"/\">Back to Dashboard</a></p></body></html>";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] EngineError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<CatalogError> for ApiError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound(key) => ApiError::NotFound(key),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(EngineError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing page; never carries the underlying error text
    fn page(&self) -> ErrorPage {
        match self {
            ApiError::NotFound(_) => ErrorPage {
                heading: "Not found",
                message: "The analysis you asked for does not exist.",
            },
            ApiError::Upstream(EngineError::Timeout(_)) => ErrorPage {
                heading: "Something went wrong",
                message: "The analysis took too long to run. Please try again later.",
            },
            ApiError::Upstream(_) | ApiError::Internal(_) => ErrorPage {
                heading: "Something went wrong",
                message: "We could not run this analysis right now. Please try again later.",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match render(&self.page()) {
            Ok(body) => (status, body).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error page: {e}");
                (status, Html(FALLBACK_ERROR_HTML)).into_response()
            }
        }
    }
}
