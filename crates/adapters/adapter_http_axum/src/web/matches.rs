//! Match pages.

use axum::Json;
use axum::extract::{Path, Query, State};

use agora_app::ports::{
    EventPublisher, ForumRepository, MatchRepository, PermissionChecker, ReadMarkerRepository,
    UserRepository,
};
use agora_domain::error::AgoraError;
use agora_domain::id::MatchId;

use crate::api::matches::HistoryBody;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::params::{HistoryQuery, MatchShowQuery};
use crate::state::AppState;
use crate::web::views::{MatchTemplate, script_json};

/// `GET /community/matches/{match}`
///
/// The page carries the first window as JSON. `event` opens the history
/// around that event; otherwise `after`/`before` pick the window as on the
/// history endpoint.
pub async fn show<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(match_id): Path<MatchId>,
    Query(query): Query<MatchShowQuery>,
) -> Result<MatchTemplate, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    let history = state
        .match_service
        .show(&actor, match_id, query.event, query.window.into())
        .await?;

    let name = history.game.name.clone();
    let jump_to = history.jump_to.map_or(0, |id| id.get());
    let json = serde_json::to_string(&HistoryBody::from(history))
        .map_err(|err| AgoraError::Storage(Box::new(err)))?;

    Ok(MatchTemplate {
        name,
        json: script_json(&json),
        jump_to,
    })
}

/// `GET /community/matches/{match}/history`
///
/// Same payload as the JSON API, polled by the match page.
pub async fn history<F, U, R, M, P, E>(
    State(state): State<AppState<F, U, R, M, P, E>>,
    Identity(user_id): Identity,
    Path(match_id): Path<MatchId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryBody>, ApiError>
where
    F: ForumRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: ReadMarkerRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    P: PermissionChecker + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let actor = state.actor(user_id).await?;
    let history = state
        .match_service
        .history(&actor, match_id, query.into())
        .await?;
    Ok(Json(HistoryBody::from(history)))
}
