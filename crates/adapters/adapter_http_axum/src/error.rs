//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use agora_domain::error::{AgoraError, InvalidInputError};

/// JSON error body returned by every endpoint.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`AgoraError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(AgoraError);

impl From<AgoraError> for ApiError {
    fn from(err: AgoraError) -> Self {
        Self(err)
    }
}

impl From<InvalidInputError> for ApiError {
    fn from(err: InvalidInputError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AgoraError::Validation(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            AgoraError::InvalidInput(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            AgoraError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            AgoraError::Forbidden(err) => (StatusCode::FORBIDDEN, err.to_string()),
            AgoraError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            AgoraError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::error::{ForbiddenError, NotFoundError, ValidationError};
    use agora_domain::permission::Action;

    fn status(err: AgoraError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn should_map_each_error_kind_to_its_status() {
        assert_eq!(
            status(
                NotFoundError {
                    entity: "Topic",
                    id: "1".to_string()
                }
                .into()
            ),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(
                ForbiddenError {
                    action: Action::ForumModerate
                }
                .into()
            ),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(AgoraError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(ValidationError::EmptyTitle.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(InvalidInputError::NotIssueTopic.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(AgoraError::Storage("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
