//! Match service: windows over a match's event stream.

use std::future::Future;

use agora_domain::error::{AgoraError, NotFoundError};
use agora_domain::id::{GameId, MatchEventId, MatchId};
use agora_domain::matches::{self, Match, MatchEvent};
use agora_domain::pagination::{Anchor, Cursor, EVENT_LIMIT, Keyed, SortOrder, WindowQuery};
use agora_domain::permission::{Action, Authorizable};
use agora_domain::user::{Actor, UserCompact};

use crate::pagination::{self, Boundaries, WindowSource};
use crate::ports::{MatchRepository, PermissionChecker, UserRepository};

/// Raw history parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryParams {
    /// Events strictly after this id, oldest first.
    pub after: Option<i64>,
    /// Events strictly before this id; ignored when `after` is set.
    pub before: Option<i64>,
    pub limit: Option<i64>,
}

/// A run of events in ascending id order with the users they reference.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchHistory {
    pub game: Match,
    pub events: Vec<MatchEvent>,
    pub users: Vec<UserCompact>,
    pub latest_event_id: Option<MatchEventId>,
    pub current_game_id: Option<GameId>,
    /// Event the page should scroll to, when one was requested.
    pub jump_to: Option<MatchEventId>,
}

struct MatchEvents<'a, M> {
    repo: &'a M,
    match_id: MatchId,
}

impl<M: MatchRepository + Sync> WindowSource<MatchEvent> for MatchEvents<'_, M> {
    fn fetch(&self, query: WindowQuery) -> impl Future<Output = Result<Vec<MatchEvent>, AgoraError>> + Send {
        self.repo.fetch_events(self.match_id, query)
    }
}

pub struct MatchService<M, U, P> {
    matches: M,
    users: U,
    permissions: P,
}

impl<M, U, P> MatchService<M, U, P>
where
    M: MatchRepository + Sync,
    U: UserRepository + Sync,
    P: PermissionChecker + Sync,
{
    pub fn new(matches: M, users: U, permissions: P) -> Self {
        Self {
            matches,
            users,
            permissions,
        }
    }

    async fn visible_match(&self, actor: &Actor, match_id: MatchId) -> Result<Match, AgoraError> {
        let game = self
            .matches
            .get_match(match_id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Match",
                id: match_id.to_string(),
            })?;
        self.permissions
            .ensure_can(actor, Action::MatchView, Authorizable::Match(&game))?;
        Ok(game)
    }

    /// One window of events: after `after` oldest first, otherwise the
    /// newest events before `before` (or overall). Either way the result is
    /// ascending.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the match does not exist
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`] for a
    ///   private match
    pub async fn history(
        &self,
        actor: &Actor,
        match_id: MatchId,
        params: HistoryParams,
    ) -> Result<MatchHistory, AgoraError> {
        let game = self.visible_match(actor, match_id).await?;
        let limit = EVENT_LIMIT.clamp(params.limit);
        let field = MatchEvent::CURSOR_FIELD;
        let query = match (params.after, params.before) {
            (Some(after), _) => {
                WindowQuery::new(SortOrder::IdAsc, limit).after(Some(Cursor::new(field, after)))
            }
            (None, before) => WindowQuery::new(SortOrder::IdDesc, limit)
                .after(before.map(|key| Cursor::new(field, key))),
        };

        let source = MatchEvents {
            repo: &self.matches,
            match_id,
        };
        let events = pagination::fetch(&source, query).await?.into_ascending();
        self.finish(game, events, None).await
    }

    /// First view of a match: the events around `event` when given,
    /// otherwise the same window [`Self::history`] answers for `window`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::history`].
    pub async fn show(
        &self,
        actor: &Actor,
        match_id: MatchId,
        event: Option<i64>,
        window: HistoryParams,
    ) -> Result<MatchHistory, AgoraError> {
        let Some(event) = event else {
            return self.history(actor, match_id, window).await;
        };

        let game = self.visible_match(actor, match_id).await?;
        let limit = EVENT_LIMIT.clamp(window.limit);
        let query = match Anchor::Start(event).primary(MatchEvent::CURSOR_FIELD) {
            Some((cursor, sort)) => WindowQuery::new(sort, limit).after(Some(cursor)),
            None => WindowQuery::new(SortOrder::IdAsc, limit),
        };
        let boundaries = Boundaries {
            first: self.matches.first_event_id(match_id).await?.map(MatchEventId::get),
            last: self.matches.latest_event_id(match_id).await?.map(MatchEventId::get),
        };

        let source = MatchEvents {
            repo: &self.matches,
            match_id,
        };
        let assembled = pagination::assemble(&source, query, boundaries).await?;
        self.finish(game, assembled.items, assembled.jump_to.map(MatchEventId::new))
            .await
    }

    async fn finish(
        &self,
        game: Match,
        events: Vec<MatchEvent>,
        jump_to: Option<MatchEventId>,
    ) -> Result<MatchHistory, AgoraError> {
        let users = self
            .users
            .get_many(matches::referenced_users(&events))
            .await?
            .iter()
            .map(|user| user.compact())
            .collect();
        let latest_event_id = self.matches.latest_event_id(game.id).await?;
        let current_game_id = self.matches.current_game_id(game.id).await?;

        Ok(MatchHistory {
            game,
            events,
            users,
            latest_event_id,
            current_game_id,
            jump_to,
        })
    }
}
