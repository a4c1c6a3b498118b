//! JSON handlers for forum topics.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use agora_app::ports::{
    EventPublisher, ForumRepository, MatchRepository, PermissionChecker, ReadMarkerRepository,
    UserRepository,
};
use agora_app::services::topic_service::{ShowMode, TopicView};
use agora_domain::id::{ForumId, TopicId};
use agora_domain::pagination::{Cursor, SortOrder};
use agora_domain::poll::PollDraft;
use agora_domain::post::Post;
use agora_domain::topic::Topic;
use agora_domain::user::UserCompact;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::params::ShowQuery;
use crate::state::AppState;

/// One window of a topic's posts.
#[derive(Debug, Serialize)]
pub struct ShowBody {
    pub topic: Topic,
    pub posts: Vec<Post>,
    pub users: Vec<UserCompact>,
    pub cursor: Option<Cursor>,
    pub cursor_string: Option<String>,
    pub sort: SortOrder,
}

impl From<TopicView> for ShowBody {
    fn from(view: TopicView) -> Self {
        Self {
            topic: view.topic,
            posts: view.posts,
            users: view.users,
            cursor_string: view.cursor.map(Cursor::to_token),
            cursor: view.cursor,
            sort: view.sort,
        }
    }
}

/// Poll fields of a topic creation request.
#[derive(Debug, Deserialize)]
pub struct PollRequest {
    pub title: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub max_options: Option<u32>,
    pub length_days: Option<u32>,
    #[serde(default)]
    pub hide_results: bool,
    #[serde(default)]
    pub vote_change: bool,
}

impl From<PollRequest> for PollDraft {
    fn from(req: PollRequest) -> Self {
        let defaults = Self::default();
        Self {
            title: req.title,
            options: req.options,
            max_options: req.max_options.unwrap_or(defaults.max_options),
            length_days: req.length_days.unwrap_or(defaults.length_days),
            hide_results: req.hide_results,
            vote_change: req.vote_change,
        }
    }
}

/// Request body for creating a topic.
#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    pub forum_id: ForumId,
    pub title: String,
    pub body: String,
    /// The poll is only read when this is set.
    #[serde(default)]
    pub with_poll: bool,
    pub forum_topic_poll: Option<PollRequest>,
}

impl StoreRequest {
    fn poll(&mut self) -> Option<PollDraft> {
        if !self.with_poll {
            return None;
        }
        // A missing poll block still goes through validation.
        Some(self.forum_topic_poll.take().map(PollDraft::from).unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
pub struct StoreBody {
    pub topic: Topic,
    pub post: Post,
}

/// Request body for replying to a topic.
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct TopicFields {
    pub topic_title: String,
}

/// Request body for editing a topic.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub forum_topic: TopicFields,
}

/// Possible responses from the create endpoints.
pub enum CreateResponse<T> {
    Created(Json<T>),
}

impl<T: Serialize> IntoResponse for CreateResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// `GET /api/v2/forums/topics/{topic}`
pub async fn show<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Query(query): Query<ShowQuery>,
) -> Result<Json<ShowBody>, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    let view = state
        .topic_service
        .show(&actor, topic_id, query.into(), ShowMode::Json)
        .await?;
    Ok(Json(ShowBody::from(view)))
}

/// `POST /api/v2/forums/topics`
pub async fn store<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Json(mut req): Json<StoreRequest>,
) -> Result<CreateResponse<StoreBody>, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    let poll = req.poll();
    let (topic, post) = state
        .topic_service
        .store(&actor, req.forum_id, req.title, req.body, poll)
        .await?;
    Ok(CreateResponse::Created(Json(StoreBody { topic, post })))
}

/// `POST /api/v2/forums/topics/{topic}/reply`
pub async fn reply<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Json(req): Json<ReplyRequest>,
) -> Result<CreateResponse<Post>, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    let reply = state.topic_service.reply(&actor, topic_id, req.body).await?;
    Ok(CreateResponse::Created(Json(reply.post)))
}

/// `PUT /api/v2/forums/topics/{topic}`
pub async fn update<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<Topic>, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    let topic = state
        .topic_service
        .update_title(&actor, topic_id, req.forum_topic.topic_title)
        .await?;
    Ok(Json(topic))
}
