//! HTTP error response handling for the API
//!
//! Converts domain errors into `{"status":"error","code":...,"message":...}`
//! bodies with the status code from [`ToHttpStatus`].

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Details of server-side faults stay in the log
        if status_code.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        }

        let api_error: ApiError = self.into();
        (status_code, Json(api_error)).into_response()
    }
}

/// Bare `ApiError`s are request validation failures raised by handlers
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = match self.code.as_str() {
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "internal_error" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        (status_code, Json(self)).into_response()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_ERROR_MESSAGE;

    async fn body_of(response: Response) -> ApiError {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_failure_into_response() {
        let response = Error::FetchFailure("TikTok error: private video".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let api_error = body_of(response).await;
        assert_eq!(api_error.status, "error");
        assert_eq!(api_error.code, "fetch_failed");
        assert_eq!(api_error.message, "TikTok error: private video");
    }

    #[tokio::test]
    async fn test_packaging_error_into_response_hides_details() {
        let response =
            Error::Packaging("/tmp/bakraload_bulk_x/Bulk_vid_ABC123.zip: disk full".into())
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let api_error = body_of(response).await;
        assert_eq!(api_error.code, "packaging_error");
        assert_eq!(api_error.message, GENERIC_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_bulk_failed_into_response_lists_urls() {
        let response = Error::BulkFailed {
            errors: vec!["URL 1: Invalid or unsupported URL.".into()],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let api_error = body_of(response).await;
        assert_eq!(
            api_error.message,
            "No downloadable content found.\nURL 1: Invalid or unsupported URL."
        );
    }

    #[tokio::test]
    async fn test_api_error_status_follows_code() {
        assert_eq!(
            ApiError::invalid_input("No URL provided.").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::rate_limited("Too many requests").into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::internal(GENERIC_ERROR_MESSAGE).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
