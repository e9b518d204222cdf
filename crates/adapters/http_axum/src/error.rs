//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use vehiclehub_app::serial::SerialError;
use vehiclehub_domain::error::HubError;

/// JSON body shared by every endpoint reporting an outcome.
#[derive(Debug, Serialize)]
pub struct Outcome<T> {
    #[serde(rename = "OK")]
    pub ok: bool,
    pub output: T,
}

impl Outcome<&'static str> {
    #[must_use]
    pub fn done() -> Self {
        Self {
            ok: true,
            output: "OK",
        }
    }
}

/// Maps application errors to an HTTP response with the matching status
/// code.
#[derive(Debug)]
pub enum ApiError {
    Hub(HubError),
    Serial(SerialError),
    /// The request body was not the JSON the endpoint expects.
    Body(JsonRejection),
}

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        Self::Hub(err)
    }
}

impl From<SerialError> for ApiError {
    fn from(err: SerialError) -> Self {
        Self::Serial(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self::Body(err)
    }
}

impl From<vehiclehub_domain::error::ValidationError> for ApiError {
    fn from(err: vehiclehub_domain::error::ValidationError) -> Self {
        Self::Hub(err.into())
    }
}

impl From<vehiclehub_domain::error::NotFoundError> for ApiError {
    fn from(err: vehiclehub_domain::error::NotFoundError) -> Self {
        Self::Hub(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Hub(HubError::Validation(err)) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Hub(HubError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Hub(HubError::Storage(err)) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            Self::Hub(HubError::Device(err)) => {
                tracing::warn!(error = %err, "device error");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            Self::Serial(SerialError::EmptyMessage) => {
                (StatusCode::BAD_REQUEST, SerialError::EmptyMessage.to_string())
            }
            Self::Serial(err @ SerialError::Timeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, err.to_string())
            }
            Self::Serial(err) => {
                tracing::warn!(error = %err, "serial error");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            Self::Body(err) => (StatusCode::BAD_REQUEST, err.body_text()),
        };

        (
            status,
            Json(Outcome {
                ok: false,
                output: message,
            }),
        )
            .into_response()
    }
}
