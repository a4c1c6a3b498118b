//! `SQLite` implementation of [`MatchRepository`].
//!
//! Events are fetched one window at a time; the games they carry (and the
//! games' scores) are loaded in two follow-up queries for that window only.

use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use agora_app::ports::MatchRepository;
use agora_domain::error::AgoraError;
use agora_domain::id::{GameId, MatchEventId, MatchId, UserId};
use agora_domain::matches::{EventDetail, Game, Match, MatchEvent, Score};
use agora_domain::pagination::WindowQuery;

use crate::decode;
use crate::error::StorageError;
use crate::window;

struct MatchRow(Match);

impl<'r> FromRow<'r, SqliteRow> for MatchRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let start_time: String = row.try_get("start_time")?;

        Ok(Self(Match {
            id: MatchId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            start_time: decode::time(&start_time)?,
            end_time: decode::optional_time(row.try_get("end_time")?)?,
            is_private: row.try_get("is_private")?,
        }))
    }
}

/// An event row plus the id of its game, resolved afterwards.
struct EventRow(MatchEvent, Option<i64>);

impl<'r> FromRow<'r, SqliteRow> for EventRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let user_id: Option<i64> = row.try_get("user_id")?;
        let detail: String = row.try_get("detail")?;
        let timestamp: String = row.try_get("timestamp")?;

        Ok(Self(
            MatchEvent {
                id: MatchEventId::new(row.try_get("id")?),
                match_id: MatchId::new(row.try_get("match_id")?),
                user_id: user_id.map(UserId::new),
                detail: decode::parsed::<EventDetail>(&detail)?,
                game: None,
                created_at: decode::time(&timestamp)?,
            },
            row.try_get("game_id")?,
        ))
    }
}

struct GameRow(Game);

impl<'r> FromRow<'r, SqliteRow> for GameRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let start_time: String = row.try_get("start_time")?;

        Ok(Self(Game {
            id: GameId::new(row.try_get("id")?),
            beatmap_id: row.try_get("beatmap_id")?,
            mode: row.try_get("mode")?,
            start_time: decode::time(&start_time)?,
            end_time: decode::optional_time(row.try_get("end_time")?)?,
            scores: Vec::new(),
        }))
    }
}

const SELECT_MATCH: &str = "SELECT * FROM matches WHERE id = ?";
const FIRST_EVENT: &str = "SELECT MIN(id) FROM match_events WHERE match_id = ?";
const LATEST_EVENT: &str = "SELECT MAX(id) FROM match_events WHERE match_id = ?";
const CURRENT_GAME: &str = r"
    SELECT id FROM match_games
    WHERE match_id = ? AND end_time IS NULL
    ORDER BY id DESC LIMIT 1
";

/// `SQLite`-backed match repository.
pub struct SqliteMatchRepository {
    pool: SqlitePool,
}

impl SqliteMatchRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn games(&self, ids: &[i64]) -> Result<HashMap<i64, Game>, StorageError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM match_games WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        let rows: Vec<GameRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT game_id, user_id, score, accuracy, passed FROM match_scores WHERE game_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY rowid");
        let scores: Vec<(i64, i64, i64, f64, bool)> =
            builder.build_query_as().fetch_all(&self.pool).await?;

        let mut games: HashMap<i64, Game> = rows.into_iter().map(|w| (w.0.id.get(), w.0)).collect();
        for (game_id, user_id, score, accuracy, passed) in scores {
            if let Some(game) = games.get_mut(&game_id) {
                game.scores.push(Score {
                    user_id: UserId::new(user_id),
                    score,
                    accuracy,
                    passed,
                });
            }
        }
        Ok(games)
    }

    async fn scalar_id(&self, sql: &'static str, match_id: MatchId) -> Result<Option<i64>, AgoraError> {
        let id: Option<i64> = sqlx::query_scalar(sql)
            .bind(match_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(id)
    }
}

impl MatchRepository for SqliteMatchRepository {
    async fn get_match(&self, id: MatchId) -> Result<Option<Match>, AgoraError> {
        let row: Option<MatchRow> = sqlx::query_as(SELECT_MATCH)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn fetch_events(&self, match_id: MatchId, query: WindowQuery) -> Result<Vec<MatchEvent>, AgoraError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM match_events WHERE match_id = ");
        builder.push_bind(match_id.get());
        window::push(&mut builder, "id", &query);

        let rows: Vec<EventRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let game_ids: Vec<i64> = rows.iter().filter_map(|row| row.1).collect();
        let mut games = self.games(&game_ids).await?;

        Ok(rows
            .into_iter()
            .map(|EventRow(mut event, game_id)| {
                event.game = game_id.and_then(|id| games.remove(&id));
                event
            })
            .collect())
    }

    async fn first_event_id(&self, match_id: MatchId) -> Result<Option<MatchEventId>, AgoraError> {
        Ok(self.scalar_id(FIRST_EVENT, match_id).await?.map(MatchEventId::new))
    }

    async fn latest_event_id(&self, match_id: MatchId) -> Result<Option<MatchEventId>, AgoraError> {
        Ok(self.scalar_id(LATEST_EVENT, match_id).await?.map(MatchEventId::new))
    }

    async fn current_game_id(&self, match_id: MatchId) -> Result<Option<GameId>, AgoraError> {
        let id: Option<i64> = sqlx::query_scalar(CURRENT_GAME)
            .bind(match_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(id.map(GameId::new))
    }
}
