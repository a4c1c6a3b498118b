//! Moderator actions on topics.
//!
//! Each action is audited by the moderation service; a successful action
//! reloads the page it was triggered from.

use axum::Form;
use axum::extract::{Path, State};

use agora_app::ports::{
    EventPublisher, ForumRepository, MatchRepository, PermissionChecker, ReadMarkerRepository,
    UserRepository,
};
use agora_domain::id::TopicId;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::params::{IssueTagForm, LockForm, MoveForm, PinForm, PollForm};
use crate::state::AppState;
use crate::ujs::Directive;
use crate::web::forum_url;
use crate::web::views::PollTemplate;

/// `DELETE /community/forums/topics/{topic}`
///
/// Moderators stay on the (now deleted) topic; its author is sent back to
/// the forum.
pub async fn destroy<F, U, R, M, P, E>(
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
    let destroyed = state.moderation_service.destroy(&actor, topic_id).await?;
    if destroyed.by_moderator {
        Ok(Directive::Reload)
    } else {
        Ok(Directive::RedirectTo(forum_url(destroyed.forum.id)))
    }
}

/// `POST /community/forums/topics/{topic}/restore`
pub async fn restore<F, U, R, M, P, E>(
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
    state.moderation_service.restore(&actor, topic_id).await?;
    Ok(Directive::Reload)
}

/// `POST /community/forums/topics/{topic}/lock`
///
/// `lock=1` locks; `lock=0` or a missing value unlocks.
pub async fn lock<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Form(form): Form<LockForm>,
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
    state
        .moderation_service
        .lock(&actor, topic_id, form.lock)
        .await?;
    Ok(Directive::Reload)
}

/// `POST /community/forums/topics/{topic}/pin`
pub async fn pin<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Form(form): Form<PinForm>,
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
    state
        .moderation_service
        .pin(&actor, topic_id, form.pin)
        .await?;
    Ok(Directive::Reload)
}

/// `POST /community/forums/topics/{topic}/move`
pub async fn move_topic<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Form(form): Form<MoveForm>,
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
    state
        .moderation_service
        .move_topic(&actor, topic_id, form.destination_forum_id)
        .await?;
    Ok(Directive::Reload)
}

/// `POST /community/forums/topics/{topic}/issue-tag`
pub async fn issue_tag<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Form(form): Form<IssueTagForm>,
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
    state
        .moderation_service
        .issue_tag(&actor, topic_id, form.issue_tag.as_deref(), form.state)
        .await?;
    Ok(Directive::Reload)
}

/// `POST /community/forums/topics/{topic}/edit-poll`
///
/// Answers with the replaced poll block.
pub async fn edit_poll<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(topic_id): Path<TopicId>,
    Form(form): Form<PollForm>,
) -> Result<PollTemplate, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    let edited = state
        .moderation_service
        .edit_poll(&actor, topic_id, form.into())
        .await?;
    Ok(PollTemplate::new(
        edited.topic.id.get(),
        edited.summary,
        edited.can_edit,
    ))
}
