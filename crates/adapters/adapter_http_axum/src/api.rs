//! JSON API handler modules, mounted under `/api/v2`.

#[allow(clippy::missing_errors_doc)]
pub mod matches;
#[allow(clippy::missing_errors_doc)]
pub mod topics;

use axum::Router;
use axum::routing::{get, post};

use agora_app::ports::{
    EventPublisher, ForumRepository, MatchRepository, PermissionChecker, ReadMarkerRepository,
    UserRepository,
};

use crate::state::AppState;

/// Build the `/api/v2` sub-router.
pub fn routes<F, U, R, M, P, E>() -> Router<AppState<F, U, R, M, P, E>>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Topics
        .route("/forums/topics", post(topics::store::<F, U, R, M, P, E>))
        .route(
            "/forums/topics/{topic}",
            get(topics::show::<F, U, R, M, P, E>).put(topics::update::<F, U, R, M, P, E>),
        )
        .route(
            "/forums/topics/{topic}/reply",
            post(topics::reply::<F, U, R, M, P, E>),
        )
        // Matches
        .route("/matches/{match}", get(matches::show::<F, U, R, M, P, E>))
}
