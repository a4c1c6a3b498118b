//! Topic pages and member-level topic writes.

use axum::Form;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use agora_app::ports::{
    EventPublisher, ForumRepository, MatchRepository, PermissionChecker, ReadMarkerRepository,
    UserRepository,
};
use agora_app::services::topic_service::ShowMode;
use agora_domain::error::InvalidInputError;
use agora_domain::id::TopicId;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::params::{ReplyForm, ShowQuery, StoreForm, UpdateForm, VoteForm};
use crate::state::AppState;
use crate::ujs::Directive;
use crate::web::views::{PostsTemplate, TopicTemplate, next_cursor, post_rows};
use crate::web::topic_url;

/// Possible responses from the topic page endpoint.
pub enum ShowResponse {
    Page(Box<TopicTemplate>),
    Posts(PostsTemplate),
    /// Fragment request past the last post.
    NoContent,
}

impl IntoResponse for ShowResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Page(page) => page.into_response(),
            Self::Posts(posts) => posts.into_response(),
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /community/forums/topics/{topic}`
///
/// A full page, or with `skip_layout` only the posts fragment.
pub async fn show<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Query(query): Query<ShowQuery>,
) -> Result<ShowResponse, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    let mut view = state
        .topic_service
        .show(&actor, topic_id, query.into(), ShowMode::Page)
        .await?;

    if let Some(page) = view.page.take() {
        return Ok(ShowResponse::Page(Box::new(TopicTemplate::new(view, page))));
    }
    let Some(first) = view.posts.first().map(|post| post.id) else {
        return Ok(ShowResponse::NoContent);
    };

    // Fragments continue the numbering of the page they are appended to.
    let first_position = state
        .topic_service
        .position(topic_id, first, view.show_deleted)
        .await?;
    Ok(ShowResponse::Posts(PostsTemplate {
        next_cursor: next_cursor(view.cursor),
        posts: post_rows(view.posts, &view.users, first_position),
    }))
}

/// `POST /community/forums/topics`
pub async fn store<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Form(mut form): Form<StoreForm>,
) -> Result<Directive, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    let forum_id = form
        .forum_id
        .ok_or(InvalidInputError::MissingParameter("forum_id"))?;
    let title = std::mem::take(&mut form.title);
    let body = std::mem::take(&mut form.body);

    let (topic, _) = state
        .topic_service
        .store(&actor, forum_id, title, body, form.poll())
        .await?;
    Ok(Directive::RedirectTo(topic_url(topic.id)))
}

/// `POST /community/forums/topics/{topic}/reply`
///
/// Answers with the new post, ready to append to the page.
pub async fn reply<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Form(form): Form<ReplyForm>,
) -> Result<PostsTemplate, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    let reply = state.topic_service.reply(&actor, topic_id, form.body).await?;

    let authors: Vec<_> = actor.user().map(|user| user.compact()).into_iter().collect();
    Ok(PostsTemplate {
        posts: post_rows(vec![reply.post], &authors, reply.position),
        next_cursor: String::new(),
    })
}

/// `PUT /community/forums/topics/{topic}`
pub async fn update<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Form(form): Form<UpdateForm>,
) -> Result<StatusCode, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    state
        .topic_service
        .update_title(&actor, topic_id, form.title)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /community/forums/topics/{topic}/vote`
pub async fn vote<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Form(form): Form<VoteForm>,
) -> Result<Directive, ApiError>
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
        .vote(&actor, topic_id, form.option_ids)
        .await?;
    Ok(Directive::RedirectTo(topic_url(topic.id)))
}

/// `POST /community/forums/topics/{topic}/vote-feature`
pub async fn vote_feature<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
) -> Result<Directive, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    state.topic_service.vote_feature(&actor, topic_id).await?;
    Ok(Directive::RedirectTo(topic_url(topic_id)))
}
