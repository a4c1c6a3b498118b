//! Topic polls: definition, vote validation and result summaries.

use std::collections::BTreeSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{PollOptionId, UserId};
use crate::time::{Timestamp, days_after};

/// Minimum number of options a poll must offer.
pub const MIN_OPTIONS: usize = 2;

/// Maximum number of options a poll may offer.
pub const MAX_OPTIONS: usize = 20;

/// How long after it started the poster may still edit a poll.
pub const EDIT_WINDOW_HOURS: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: PollOptionId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub title: String,
    pub options: Vec<PollOption>,
    /// Votes each user may cast.
    pub max_options: u32,
    /// Voting period; `0` never ends.
    pub length_days: u32,
    /// Hide results until the voting period ends.
    pub hide_results: bool,
    /// Users may replace their votes.
    pub vote_change: bool,
    pub started_at: Timestamp,
}

/// One user's vote for one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollVote {
    pub user_id: UserId,
    pub option_id: PollOptionId,
}

impl Poll {
    #[must_use]
    pub fn ends_at(&self) -> Option<Timestamp> {
        (self.length_days > 0).then(|| days_after(self.started_at, self.length_days))
    }

    #[must_use]
    pub fn is_open(&self, now: Timestamp) -> bool {
        self.ends_at().is_none_or(|end| now < end)
    }

    /// Whether the poster is still inside the edit window.
    #[must_use]
    pub fn can_edit(&self, now: Timestamp) -> bool {
        now < self.started_at + Duration::hours(EDIT_WINDOW_HOURS)
    }

    #[must_use]
    pub fn option(&self, id: PollOptionId) -> Option<&PollOption> {
        self.options.iter().find(|option| option.id == id)
    }

    /// Check a ballot and return the distinct option ids, in ballot order.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the poll is closed, the ballot is
    /// empty, too large, names an unknown option, or replaces earlier votes
    /// on a poll that forbids it.
    pub fn validate_ballot(
        &self,
        option_ids: &[PollOptionId],
        already_voted: bool,
        now: Timestamp,
    ) -> Result<Vec<PollOptionId>, ValidationError> {
        if !self.is_open(now) {
            return Err(ValidationError::PollClosed);
        }
        if already_voted && !self.vote_change {
            return Err(ValidationError::VoteChangeNotAllowed);
        }

        let mut seen = BTreeSet::new();
        let ballot: Vec<PollOptionId> = option_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        if ballot.is_empty() {
            return Err(ValidationError::NoPollOptionSelected);
        }
        if ballot.len() > self.max_options as usize {
            return Err(ValidationError::TooManyVotes {
                max: self.max_options,
            });
        }
        if let Some(unknown) = ballot.iter().find(|id| self.option(**id).is_none()) {
            return Err(ValidationError::UnknownPollOption(unknown.get()));
        }
        Ok(ballot)
    }

    /// Tally `votes` for display to `viewer`.
    ///
    /// Counts stay hidden while a `hide_results` poll is open unless
    /// `reveal` is set (moderators).
    #[must_use]
    pub fn summarize(
        &self,
        votes: &[PollVote],
        viewer: Option<UserId>,
        reveal: bool,
        now: Timestamp,
    ) -> PollSummary {
        let results_hidden = self.hide_results && self.is_open(now) && !reveal;
        let options = self
            .options
            .iter()
            .map(|option| OptionSummary {
                id: option.id,
                text: option.text.clone(),
                votes: (!results_hidden).then(|| {
                    votes
                        .iter()
                        .filter(|vote| vote.option_id == option.id)
                        .count() as u64
                }),
            })
            .collect();
        let user_votes = viewer
            .map(|user_id| {
                votes
                    .iter()
                    .filter(|vote| vote.user_id == user_id)
                    .map(|vote| vote.option_id)
                    .collect()
            })
            .unwrap_or_default();

        PollSummary {
            title: self.title.clone(),
            options,
            total_votes: (!results_hidden).then_some(votes.len() as u64),
            user_votes,
            results_hidden,
            max_options: self.max_options,
            ends_at: self.ends_at(),
            is_open: self.is_open(now),
        }
    }
}

/// Poll parameters as submitted, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDraft {
    pub title: String,
    pub options: Vec<String>,
    pub max_options: u32,
    pub length_days: u32,
    pub hide_results: bool,
    pub vote_change: bool,
}

impl Default for PollDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            options: Vec::new(),
            max_options: 1,
            length_days: 0,
            hide_results: false,
            vote_change: false,
        }
    }
}

impl PollDraft {
    /// Check the draft.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyPollTitle);
        }
        let options = self.cleaned_options();
        if options.len() < MIN_OPTIONS {
            return Err(ValidationError::TooFewPollOptions { min: MIN_OPTIONS });
        }
        if options.len() > MAX_OPTIONS {
            return Err(ValidationError::TooManyPollOptions { max: MAX_OPTIONS });
        }
        if self.max_options == 0 || self.max_options as usize > options.len() {
            return Err(ValidationError::MaxOptionsOutOfRange {
                options: options.len(),
            });
        }
        if self.hide_results && self.length_days == 0 {
            return Err(ValidationError::HiddenResultsWithoutLength);
        }
        Ok(())
    }

    /// Validate and turn the draft into a poll starting at `started_at`.
    /// Options are numbered from 1 in submission order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn into_poll(self, started_at: Timestamp) -> Result<Poll, ValidationError> {
        self.validate()?;
        let options = self
            .cleaned_options()
            .into_iter()
            .zip(1_i64..)
            .map(|(text, id)| PollOption {
                id: PollOptionId::new(id),
                text,
            })
            .collect();
        Ok(Poll {
            title: self.title.trim().to_string(),
            options,
            max_options: self.max_options,
            length_days: self.length_days,
            hide_results: self.hide_results,
            vote_change: self.vote_change,
            started_at,
        })
    }

    fn cleaned_options(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|option| option.trim())
            .filter(|option| !option.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Poll state as shown to one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    pub title: String,
    pub options: Vec<OptionSummary>,
    pub total_votes: Option<u64>,
    pub user_votes: Vec<PollOptionId>,
    pub results_hidden: bool,
    pub max_options: u32,
    pub ends_at: Option<Timestamp>,
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSummary {
    pub id: PollOptionId,
    pub text: String,
    pub votes: Option<u64>,
}
