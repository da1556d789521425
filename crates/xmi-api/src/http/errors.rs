//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};
use xmi_core::ConversionError;

/// Error rendered as `{"error": "..."}` with a 400 or 500 status.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

impl From<ConversionError> for ApiError {
    fn from(err: ConversionError) -> Self {
        let kind = err.kind();
        if err.is_client_error() {
            warn!(kind, error = %err, "conversion rejected");
            Self::bad_request(err.to_string())
        } else {
            error!(kind, error = %err, "conversion failed");
            Self::internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: &self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn client_errors_map_to_bad_request() {
        for err in [
            ConversionError::bad_request("Provide inputZip or repoUrl"),
            ConversionError::PathTraversal {
                entry: "../evil".to_string(),
            },
            ConversionError::InvalidArchive {
                detail: "invalid Zip archive".to_string(),
            },
        ] {
            assert_eq!(ApiError::from(err).status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn environment_errors_map_to_internal() {
        let timed_out = ApiError::from(ConversionError::TimedOut {
            program: "java".to_string(),
            timeout: Duration::from_secs(300),
        });
        assert_eq!(timed_out.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(timed_out.message(), "Command timed out after 300s: java");

        let failed = ApiError::from(ConversionError::ExternalToolFailed {
            program: "java".to_string(),
            exit_code: Some(2),
            stderr: "line one\nline two\n".to_string(),
        });
        assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.message(), "Command failed (2): java: line one | line two");
    }
}
