use axum::http::StatusCode;
use inkwire_dotcms::DotcmsApiError;
use inkwire_wrike::WrikeApiError;
use serde_json::Value;
use thiserror::Error;

use crate::pdf_renderer::PdfRenderError;

/// Failures of the review and sync endpoints, mapped onto HTTP statuses.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Tracker(#[from] WrikeApiError),
    #[error(transparent)]
    Content(#[from] DotcmsApiError),
    #[error(transparent)]
    Pdf(#[from] PdfRenderError),
}

impl ReviewError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Upstream client errors keep their status; everything else upstream is a 502.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Tracker(error) => upstream_status(error.status()),
            Self::Content(error) => upstream_status(error.status()),
            Self::Pdf(PdfRenderError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            Self::Pdf(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Upstream response body, decoded as JSON when possible.
    pub fn details(&self) -> Value {
        let body = match self {
            Self::Tracker(error) => error.body(),
            Self::Content(DotcmsApiError::Status { body, .. }) => Some(body.as_str()),
            Self::Content(DotcmsApiError::MissingIdentifier { fired }) => {
                return fired.clone();
            }
            _ => None,
        };
        match body {
            Some(body) => serde_json::from_str::<Value>(body)
                .unwrap_or_else(|_| Value::String(body.to_string())),
            None => Value::Null,
        }
    }
}

fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|code| StatusCode::from_u16(code).ok())
        .filter(|code| code.is_client_error() || code.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}
