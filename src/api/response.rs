//! Response envelope and error mapping

use agentpad_core::{render, CompactRender, Error, OutputFormat};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// JSON envelope for every API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: Some(code.into()),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            code: None,
        }
    }
}

/// Core error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::SessionNotFound(_) | Error::TodoNotFound { .. } => StatusCode::NOT_FOUND,
            Error::OwnerMismatch(_) => StatusCode::FORBIDDEN,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateId(_) => StatusCode::CONFLICT,
            Error::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::GenerationExhausted { .. }
            | Error::Backend(_)
            | Error::Serialization(_)
            | Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.code(), "Request failed");
        }
        let body = ApiResponse::<()>::error(self.0.to_string(), self.0.code());
        (status, Json(body)).into_response()
    }
}

/// Render `value` as a JSON envelope or as compact text
pub fn respond<T>(value: T, format: OutputFormat) -> Result<Response, ApiError>
where
    T: Serialize + CompactRender,
{
    match format {
        OutputFormat::Json => Ok(Json(ApiResponse::success(value)).into_response()),
        OutputFormat::Compact => {
            let text = render(&value, format)?;
            Ok((
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                text,
            )
                .into_response())
        }
    }
}
