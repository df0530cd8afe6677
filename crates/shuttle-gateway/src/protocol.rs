//! Gateway HTTP protocol: JSON bodies exchanged with clients

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use shuttle_core::{ProviderError, ProviderStatus};

/// Client → Gateway: change the default provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchRequest {
    pub provider: String,
}

/// Gateway → Client: result of a provider switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchResponse {
    pub provider: String,
}

/// Gateway → Client: every registered provider plus the active default
#[derive(Debug, Clone, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderStatus>,
    pub active: String,
}

/// Error body; the message is the only thing a client sees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error with the status code it is served under
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Chat failures all map to 500 with the error text
impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        Self::internal(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}
