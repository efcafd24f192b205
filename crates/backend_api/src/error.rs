use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use projection_engine::EngineError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    InsufficientData(String),

    #[error("Assistant request failed: {0}")]
    Assistant(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::PeriodOutOfRange { .. } | EngineError::UnknownSeries(_) => {
                ApiError::BadRequest(err.to_string())
            }
            EngineError::RowNotFound(what) => ApiError::NotFound(what),
            EngineError::InsufficientHistory { .. } => ApiError::InsufficientData(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Assistant(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) | ApiError::JsonError(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_statuses() {
        let cases = [
            (EngineError::PeriodOutOfRange { index: 12, len: 12 }, StatusCode::BAD_REQUEST),
            (EngineError::UnknownSeries("x".into()), StatusCode::BAD_REQUEST),
            (EngineError::RowNotFound("salary row 9".into()), StatusCode::NOT_FOUND),
            (
                EngineError::InsufficientHistory { required: 3, actual: 1 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_assistant_failure_is_bad_gateway() {
        let response = ApiError::Assistant("timeout".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
