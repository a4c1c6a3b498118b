//! Authenticated user id supplied by the upstream gateway.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use agora_domain::error::AgoraError;
use agora_domain::id::UserId;

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_HEADER: &str = "x-user-id";

/// User id of the request; `None` for guests.
///
/// A header that is present but not a valid id is rejected with `401`
/// rather than silently treated as a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub Option<UserId>);

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_HEADER) else {
            return Ok(Self(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map(|id| Self(Some(id)))
            .ok_or_else(|| ApiError::from(AgoraError::Unauthenticated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<Identity, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_HEADER, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn should_treat_missing_header_as_guest() {
        assert_eq!(extract(None).await.unwrap(), Identity(None));
    }

    #[tokio::test]
    async fn should_parse_user_id_header() {
        assert_eq!(
            extract(Some("42")).await.unwrap(),
            Identity(Some(UserId::new(42)))
        );
    }

    #[tokio::test]
    async fn should_reject_malformed_header() {
        assert!(extract(Some("peppy")).await.is_err());
    }
}
