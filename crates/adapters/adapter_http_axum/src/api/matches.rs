//! JSON handlers for multiplayer matches.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Serialize;

use agora_app::ports::{
    EventPublisher, ForumRepository, MatchRepository, PermissionChecker, ReadMarkerRepository,
    UserRepository,
};
use agora_app::services::match_service::MatchHistory;
use agora_domain::id::{GameId, MatchEventId, MatchId};
use agora_domain::matches::{Match, MatchEvent};
use agora_domain::user::UserCompact;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::params::HistoryQuery;
use crate::state::AppState;

/// A window of match events; also embedded in the match page.
#[derive(Debug, Serialize)]
pub struct HistoryBody {
    #[serde(rename = "match")]
    pub game: Match,
    pub events: Vec<MatchEvent>,
    pub users: Vec<UserCompact>,
    pub latest_event_id: Option<MatchEventId>,
    pub current_game_id: Option<GameId>,
}

impl From<MatchHistory> for HistoryBody {
    fn from(history: MatchHistory) -> Self {
        Self {
            game: history.game,
            events: history.events,
            users: history.users,
            latest_event_id: history.latest_event_id,
            current_game_id: history.current_game_id,
        }
    }
}

/// `GET /api/v2/matches/{match}`
pub async fn show<F, U, R, M, P, E>(
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
