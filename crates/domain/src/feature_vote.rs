//! Feature votes on topics of a feature-request forum.

use serde::{Deserialize, Serialize};

use crate::id::{TopicId, UserId};
use crate::time::Timestamp;

/// How much weight a vote carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureVoteKind {
    /// A regular member's vote.
    Voice,
    /// A supporter's vote.
    Supporter,
}

impl FeatureVoteKind {
    #[must_use]
    pub const fn increment(self) -> i64 {
        match self {
            Self::Voice => 1,
            Self::Supporter => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Supporter => "supporter",
        }
    }
}

impl std::str::FromStr for FeatureVoteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "voice" => Ok(Self::Voice),
            "supporter" => Ok(Self::Supporter),
            other => Err(format!("unknown feature vote kind `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVote {
    pub topic_id: TopicId,
    pub user_id: UserId,
    /// Voter name, when the user still exists.
    pub username: Option<String>,
    pub kind: FeatureVoteKind,
    pub created_at: Timestamp,
}

/// Signed vote total of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureVoteTally {
    pub username: String,
    pub total: i64,
}

/// Fold `votes` into one tally per username, highest first.
///
/// Ties keep the order in which the user first appeared. Votes whose user
/// no longer exists are skipped.
#[must_use]
pub fn tally(votes: &[FeatureVote]) -> Vec<FeatureVoteTally> {
    let mut tallies = votes
        .iter()
        .filter_map(|vote| vote.username.as_deref().map(|name| (name, vote.kind)))
        .fold(Vec::<FeatureVoteTally>::new(), |mut acc, (name, kind)| {
            match acc.iter_mut().find(|entry| entry.username == name) {
                Some(entry) => entry.total += kind.increment(),
                None => acc.push(FeatureVoteTally {
                    username: name.to_string(),
                    total: kind.increment(),
                }),
            }
            acc
        });
    // stable: ties stay in first-seen order
    tallies.sort_by(|a, b| b.total.cmp(&a.total));
    tallies
}
