//! Multiplayer matches and their event stream.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::id::{GameId, MatchEventId, MatchId, UserId};
use crate::pagination::Keyed;
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub name: String,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub is_private: bool,
}

/// What happened in a match event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventDetail {
    MatchCreated,
    MatchDisbanded,
    HostChanged,
    PlayerJoined,
    PlayerLeft,
    PlayerKicked,
    /// A game was played; the event carries it.
    Other,
}

impl EventDetail {
    pub const ALL: [Self; 7] = [
        Self::MatchCreated,
        Self::MatchDisbanded,
        Self::HostChanged,
        Self::PlayerJoined,
        Self::PlayerLeft,
        Self::PlayerKicked,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MatchCreated => "match-created",
            Self::MatchDisbanded => "match-disbanded",
            Self::HostChanged => "host-changed",
            Self::PlayerJoined => "player-joined",
            Self::PlayerLeft => "player-left",
            Self::PlayerKicked => "player-kicked",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for EventDetail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|detail| detail.as_str() == s)
            .ok_or_else(|| format!("unknown event detail `{s}`"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub id: MatchEventId,
    pub match_id: MatchId,
    pub user_id: Option<UserId>,
    pub detail: EventDetail,
    pub game: Option<Game>,
    #[serde(rename = "timestamp")]
    pub created_at: Timestamp,
}

impl Keyed for MatchEvent {
    const CURSOR_FIELD: &'static str = "event_id";

    fn key(&self) -> i64 {
        self.id.get()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub beatmap_id: i64,
    pub mode: String,
    pub start_time: Timestamp,
    /// `None` while the game is still being played.
    pub end_time: Option<Timestamp>,
    pub scores: Vec<Score>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub user_id: UserId,
    pub score: i64,
    pub accuracy: f64,
    pub passed: bool,
}

/// Distinct users referenced by `events`, either as the event's actor or as
/// a player in the event's game, in first-seen order.
#[must_use]
pub fn referenced_users(events: &[MatchEvent]) -> Vec<UserId> {
    let mut seen = HashSet::new();
    events
        .iter()
        .flat_map(|event| {
            event.user_id.into_iter().chain(
                event
                    .game
                    .iter()
                    .flat_map(|game| game.scores.iter().map(|score| score.user_id)),
            )
        })
        .filter(|user_id| seen.insert(*user_id))
        .collect()
}
