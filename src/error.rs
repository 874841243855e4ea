use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Period;

pub const UPSTREAM_FAILURE_MESSAGE: &str = "failed to fetch market data";

#[derive(Error, Debug)]
pub enum ProviderError {
    /// Connection, TLS or body read failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("upstream request timed out")]
    Timeout,

    /// Non-success HTTP status without a parseable error payload.
    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    /// The payload did not have the expected shape.
    #[error("malformed upstream payload: {0}")]
    Decode(String),

    /// The provider answered with an explicit error object.
    #[error("upstream rejected request ({code}): {description}")]
    Rejected { code: String, description: String },

    /// Cookie/crumb handshake failed or expired.
    #[error("upstream authentication failed: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("no trading data for '{ticker}' in the last {period}")]
    NotFound { ticker: String, period: Period },

    #[error("failed to fetch market data")]
    Upstream {
        ticker: String,
        #[source]
        source: ProviderError,
    },
}

impl LookupError {
    pub fn status(&self) -> StatusCode {
        match self {
            LookupError::InvalidTicker(_) => StatusCode::BAD_REQUEST,
            LookupError::NotFound { .. } => StatusCode::NOT_FOUND,
            LookupError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body, shaped like the `{"detail": ...}` payloads clients already parse.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            detail: self.to_string(),
        });
        (status, body).into_response()
    }
}
