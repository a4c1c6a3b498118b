//! Shared application state for axum handlers.

use std::sync::Arc;

use agora_app::ports::{
    EventPublisher, ForumRepository, MatchRepository, PermissionChecker, ReadMarkerRepository,
    UserRepository,
};
use agora_app::services::match_service::MatchService;
use agora_app::services::moderation_service::ModerationService;
use agora_app::services::topic_service::TopicService;
use agora_app::services::user_service::UserService;
use agora_domain::error::AgoraError;
use agora_domain::id::UserId;
use agora_domain::user::Actor;

/// Application state shared across all axum handlers.
///
/// Generic over the port implementations to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`: only the `Arc` wrappers are cloned.
pub struct AppState<F, U, R, M, P, E> {
    /// Post viewer and member-level topic writes.
    pub topic_service: Arc<TopicService<F, U, R, P, E>>,
    /// Audited moderator actions.
    pub moderation_service: Arc<ModerationService<F, P>>,
    /// Match event history.
    pub match_service: Arc<MatchService<M, U, P>>,
    /// Request actor resolution.
    pub user_service: Arc<UserService<U>>,
}

impl<F, U, R, M, P, E> Clone for AppState<F, U, R, M, P, E> {
    fn clone(&self) -> Self {
        Self {
            topic_service: Arc::clone(&self.topic_service),
            moderation_service: Arc::clone(&self.moderation_service),
            match_service: Arc::clone(&self.match_service),
            user_service: Arc::clone(&self.user_service),
        }
    }
}

impl<F, U, R, M, P, E> AppState<F, U, R, M, P, E>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        topic_service: TopicService<F, U, R, P, E>,
        moderation_service: ModerationService<F, P>,
        match_service: MatchService<M, U, P>,
        user_service: UserService<U>,
    ) -> Self {
        Self {
            topic_service: Arc::new(topic_service),
            moderation_service: Arc::new(moderation_service),
            match_service: Arc::new(match_service),
            user_service: Arc::new(user_service),
        }
    }

    /// Resolve the request's actor from the authenticated user id.
    ///
    /// # Errors
    ///
    /// Returns [`AgoraError::Unauthenticated`] for an unknown user id.
    pub async fn actor(&self, user_id: Option<UserId>) -> Result<Actor, AgoraError> {
        self.user_service.resolve_actor(user_id).await
    }
}
