//! Web mode: server-rendered pages and fragments under `/community`.
//!
//! Mutations answer with a [`Directive`](crate::ujs::Directive) script;
//! reads render askama templates.

#[allow(clippy::missing_errors_doc)]
pub mod matches;
#[allow(clippy::missing_errors_doc)]
pub mod moderation;
#[allow(clippy::missing_errors_doc)]
pub mod topics;
pub mod views;

use axum::Router;
use axum::routing::{get, post};

use agora_app::ports::{
    EventPublisher, ForumRepository, MatchRepository, PermissionChecker, ReadMarkerRepository,
    UserRepository,
};

use crate::state::AppState;

/// Path prefix the web routes are mounted under.
pub const PREFIX: &str = "/community";

/// Location of a topic page.
#[must_use]
pub fn topic_url(topic_id: impl std::fmt::Display) -> String {
    format!("{PREFIX}/forums/topics/{topic_id}")
}

/// Location of a forum listing.
#[must_use]
pub fn forum_url(forum_id: impl std::fmt::Display) -> String {
    format!("{PREFIX}/forums/{forum_id}")
}

/// Build the `/community` sub-router.
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
            get(topics::show::<F, U, R, M, P, E>)
                .put(topics::update::<F, U, R, M, P, E>)
                .delete(moderation::destroy::<F, U, R, M, P, E>),
        )
        .route(
            "/forums/topics/{topic}/reply",
            post(topics::reply::<F, U, R, M, P, E>),
        )
        .route(
            "/forums/topics/{topic}/vote",
            post(topics::vote::<F, U, R, M, P, E>),
        )
        .route(
            "/forums/topics/{topic}/vote-feature",
            post(topics::vote_feature::<F, U, R, M, P, E>),
        )
        // Moderation
        .route(
            "/forums/topics/{topic}/restore",
            post(moderation::restore::<F, U, R, M, P, E>),
        )
        .route(
            "/forums/topics/{topic}/lock",
            post(moderation::lock::<F, U, R, M, P, E>),
        )
        .route(
            "/forums/topics/{topic}/pin",
            post(moderation::pin::<F, U, R, M, P, E>),
        )
        .route(
            "/forums/topics/{topic}/move",
            post(moderation::move_topic::<F, U, R, M, P, E>),
        )
        .route(
            "/forums/topics/{topic}/issue-tag",
            post(moderation::issue_tag::<F, U, R, M, P, E>),
        )
        .route(
            "/forums/topics/{topic}/edit-poll",
            post(moderation::edit_poll::<F, U, R, M, P, E>),
        )
        // Matches
        .route("/matches/{match}", get(matches::show::<F, U, R, M, P, E>))
        .route(
            "/matches/{match}/history",
            get(matches::history::<F, U, R, M, P, E>),
        )
}
