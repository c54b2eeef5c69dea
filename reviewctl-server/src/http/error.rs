//! API error type with IntoResponse
//!
//! Wraps the domain [`Error`]; the status comes from its `HTTP_STATUS`
//! parameter, 500 when none was recorded.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{Error, ErrorKind};

/// Error envelope sent to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.0
            .status()
            .and_then(|status| StatusCode::from_u16(status).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = self.0;

        if status.is_server_error() {
            tracing::error!(
                code = err.code(),
                status = status.as_u16(),
                error = %err.chain(),
                stack = %err.stack_trace(),
                "request failed"
            );
        } else {
            tracing::debug!(
                code = err.code(),
                status = status.as_u16(),
                message = err.message(),
                "request rejected"
            );
        }

        let body = ErrorBody {
            code: err.code(),
            message: err.message().to_owned(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl From<ErrorKind> for ApiError {
    fn from(kind: ErrorKind) -> Self {
        Self(kind.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status().as_u16();
        let message = rejection.body_text();
        Self(Error::internal(rejection).with_message(message).with_status(status))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        let status = rejection.status().as_u16();
        let message = rejection.body_text();
        Self(Error::internal(rejection).with_message(message).with_status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn team_exists_is_400_with_code() {
        let response = ApiError::from(ErrorKind::TeamExists).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "TEAM_EXISTS");
        assert_eq!(body["message"], "team_name already exists");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let response = ApiError::from(ErrorKind::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn conflicts_are_409() {
        for kind in [
            ErrorKind::PrExists,
            ErrorKind::PrMerged,
            ErrorKind::NotAssigned,
            ErrorKind::NoCandidate,
        ] {
            let response = ApiError::from(kind).into_response();
            assert_eq!(response.status(), StatusCode::CONFLICT, "{kind}");
        }
    }

    #[tokio::test]
    async fn internal_error_is_500_without_internals() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let err = Error::internal(cause).with_message("database error");
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "database error");
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn explicit_status_param_wins() {
        let err = Error::internal_msg("body too large").with_status(413);
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn out_of_range_status_falls_back_to_500() {
        let err = Error::internal_msg("weird").with_status(1_000);
        assert_eq!(ApiError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
