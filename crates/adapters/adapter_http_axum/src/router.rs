//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use agora_app::ports::{
    EventPublisher, ForumRepository, MatchRepository, PermissionChecker, ReadMarkerRepository,
    UserRepository,
};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the JSON API under `/api/v2` and the web mode under `/community`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<F, U, R, M, P, E>(state: AppState<F, U, R, M, P, E>) -> Router
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v2", crate::api::routes())
        .nest(crate::web::PREFIX, crate::web::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::USER_HEADER;
    use agora_app::services::match_service::MatchService;
    use agora_app::services::moderation_service::ModerationService;
    use agora_app::services::topic_service::TopicService;
    use agora_app::services::user_service::UserService;
    use agora_domain::error::AgoraError;
    use agora_domain::event::ForumEvent;
    use agora_domain::feature_vote::{FeatureVote, FeatureVoteKind};
    use agora_domain::forum::Forum;
    use agora_domain::id::{
        ForumId, GameId, MatchEventId, MatchId, PollOptionId, PostId, TopicId, UserId,
    };
    use agora_domain::matches::{Match, MatchEvent};
    use agora_domain::moderation::ModerationLogEntry;
    use agora_domain::pagination::WindowQuery;
    use agora_domain::permission::{Action, Authorizable};
    use agora_domain::poll::PollVote;
    use agora_domain::post::{NewPost, Post};
    use agora_domain::topic::{NewTopic, Topic, TopicChange};
    use agora_domain::user::{Actor, User};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct StubForums;
    struct StubUsers;
    struct StubReads;
    struct StubMatches;
    struct AllowAll;
    struct StubPublisher;

    fn not_stubbed() -> AgoraError {
        AgoraError::Storage("not stubbed".into())
    }

    impl ForumRepository for StubForums {
        async fn get_forum(&self, _id: ForumId) -> Result<Option<Forum>, AgoraError> {
            Ok(None)
        }
        async fn get_topic(&self, _id: TopicId) -> Result<Option<Topic>, AgoraError> {
            Ok(None)
        }
        async fn fetch_posts(&self, _topic_id: TopicId, _query: WindowQuery) -> Result<Vec<Post>, AgoraError> {
            Ok(vec![])
        }
        async fn nth_post_id(&self, _topic_id: TopicId, _position: i64, _include_deleted: bool) -> Result<Option<PostId>, AgoraError> {
            Ok(None)
        }
        async fn post_position(&self, _topic_id: TopicId, _post_id: PostId, _include_deleted: bool) -> Result<i64, AgoraError> {
            Ok(1)
        }
        async fn create_topic(&self, _topic: NewTopic) -> Result<(Topic, Post), AgoraError> {
            Err(not_stubbed())
        }
        async fn create_post(&self, _post: NewPost) -> Result<Post, AgoraError> {
            Err(not_stubbed())
        }
        async fn apply_change(&self, _topic_id: TopicId, _change: TopicChange, _log: Option<ModerationLogEntry>) -> Result<Topic, AgoraError> {
            Err(not_stubbed())
        }
        async fn poll_votes(&self, _topic_id: TopicId) -> Result<Vec<PollVote>, AgoraError> {
            Ok(vec![])
        }
        async fn replace_poll_votes(&self, _topic_id: TopicId, _user_id: UserId, _option_ids: Vec<PollOptionId>) -> Result<(), AgoraError> {
            Ok(())
        }
        async fn feature_votes(&self, _topic_id: TopicId) -> Result<Vec<FeatureVote>, AgoraError> {
            Ok(vec![])
        }
        async fn add_feature_vote(&self, _topic_id: TopicId, _user_id: UserId, _kind: FeatureVoteKind) -> Result<FeatureVote, AgoraError> {
            Err(not_stubbed())
        }
        async fn moderation_log(&self, _topic_id: TopicId) -> Result<Vec<ModerationLogEntry>, AgoraError> {
            Ok(vec![])
        }
    }

    impl UserRepository for StubUsers {
        async fn get_by_id(&self, id: UserId) -> Result<Option<User>, AgoraError> {
            Ok((id == UserId::new(1)).then(|| User::new(id, "alice")))
        }
        async fn get_many(&self, _ids: Vec<UserId>) -> Result<Vec<User>, AgoraError> {
            Ok(vec![])
        }
    }

    impl ReadMarkerRepository for StubReads {
        async fn last_read(&self, _user_id: UserId, _topic_id: TopicId) -> Result<Option<PostId>, AgoraError> {
            Ok(None)
        }
        async fn mark_read(&self, _user_id: UserId, _topic_id: TopicId, _post_id: PostId) -> Result<(), AgoraError> {
            Ok(())
        }
    }

    impl MatchRepository for StubMatches {
        async fn get_match(&self, _id: MatchId) -> Result<Option<Match>, AgoraError> {
            Ok(None)
        }
        async fn fetch_events(&self, _match_id: MatchId, _query: WindowQuery) -> Result<Vec<MatchEvent>, AgoraError> {
            Ok(vec![])
        }
        async fn first_event_id(&self, _match_id: MatchId) -> Result<Option<MatchEventId>, AgoraError> {
            Ok(None)
        }
        async fn latest_event_id(&self, _match_id: MatchId) -> Result<Option<MatchEventId>, AgoraError> {
            Ok(None)
        }
        async fn current_game_id(&self, _match_id: MatchId) -> Result<Option<GameId>, AgoraError> {
            Ok(None)
        }
    }

    impl PermissionChecker for AllowAll {
        fn can(&self, _actor: &Actor, _action: Action, _subject: Authorizable<'_>) -> bool {
            true
        }
    }

    impl EventPublisher for StubPublisher {
        async fn publish(&self, _event: ForumEvent) -> Result<(), AgoraError> {
            Ok(())
        }
    }

    fn app() -> Router {
        let state = AppState::new(
            TopicService::new(StubForums, StubUsers, StubReads, AllowAll, StubPublisher),
            ModerationService::new(StubForums, AllowAll),
            MatchService::new(StubMatches, StubUsers, AllowAll),
            UserService::new(StubUsers),
        );
        build(state)
    }

    async fn send(request: Request<Body>) -> (StatusCode, String) {
        let resp = app().oneshot(request).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let (status, body) = send(get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn should_return_404_when_api_topic_missing() {
        let (status, body) = send(get("/api/v2/forums/topics/42")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Topic 42 not found"));
    }

    #[tokio::test]
    async fn should_return_404_when_web_match_missing() {
        let (status, _) = send(get("/community/matches/3")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_return_401_for_unknown_user_header() {
        let request = Request::builder()
            .uri("/api/v2/matches/3")
            .header(USER_HEADER, "77")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn should_look_up_topic_before_reading_moderation_form() {
        let request = Request::builder()
            .method("POST")
            .uri("/community/forums/topics/1/pin")
            .header(USER_HEADER, "1")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("pin=sticky"))
            .unwrap();

        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Topic 1 not found"));
    }
}
