//! Topic: a thread of posts inside a forum.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidInputError, ValidationError};
use crate::id::{ForumId, PostId, TopicId, UserId};
use crate::poll::Poll;
use crate::time::Timestamp;

/// Longest accepted topic title, in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub forum_id: ForumId,
    pub title: String,
    pub user_id: UserId,
    pub first_post_id: Option<PostId>,
    pub last_post_id: Option<PostId>,
    pub post_count: i64,
    #[serde(rename = "type")]
    pub topic_type: TopicType,
    pub is_locked: bool,
    pub issue_tags: BTreeSet<IssueTag>,
    pub poll: Option<Poll>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Topic {
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    #[must_use]
    pub fn has_tag(&self, tag: IssueTag) -> bool {
        self.issue_tags.contains(&tag)
    }

    /// Apply `change` in place, stamping `updated_at`.
    ///
    /// Votes of a replaced poll live outside the topic; stores drop them.
    pub fn apply(&mut self, change: TopicChange, at: Timestamp) {
        match change {
            TopicChange::Delete => self.deleted_at = Some(at),
            TopicChange::Restore => self.deleted_at = None,
            TopicChange::Lock(locked) => self.is_locked = locked,
            TopicChange::SetType(topic_type) => self.topic_type = topic_type,
            TopicChange::Move(forum_id) => self.forum_id = forum_id,
            TopicChange::IssueTag { tag, enabled: true } => {
                self.issue_tags.insert(tag);
            }
            TopicChange::IssueTag { tag, enabled: false } => {
                self.issue_tags.remove(&tag);
            }
            TopicChange::Rename(title) => self.title = title,
            TopicChange::ReplacePoll(poll) => self.poll = Some(poll),
        }
        self.updated_at = at;
    }
}

/// Placement of a topic in its forum listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum TopicType {
    #[default]
    Normal,
    Sticky,
    Announcement,
}

impl TopicType {
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Normal => 0,
            Self::Sticky => 1,
            Self::Announcement => 2,
        }
    }
}

impl From<TopicType> for i64 {
    fn from(value: TopicType) -> Self {
        value.code()
    }
}

impl TryFrom<i64> for TopicType {
    type Error = InvalidInputError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Sticky),
            2 => Ok(Self::Announcement),
            other => Err(InvalidInputError::UnknownTopicType(other)),
        }
    }
}

/// Label a moderator can toggle on topics of an issue-tracker forum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueTag {
    Added,
    Assigned,
    Confirmed,
    Duplicate,
    Invalid,
    Resolved,
}

impl IssueTag {
    pub const ALL: [Self; 6] = [
        Self::Added,
        Self::Assigned,
        Self::Confirmed,
        Self::Duplicate,
        Self::Invalid,
        Self::Resolved,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Assigned => "assigned",
            Self::Confirmed => "confirmed",
            Self::Duplicate => "duplicate",
            Self::Invalid => "invalid",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IssueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueTag {
    type Err = InvalidInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == name)
            .ok_or_else(|| InvalidInputError::UnknownIssueTag(s.to_string()))
    }
}

/// A state transition applied to an existing topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicChange {
    Delete,
    Restore,
    Lock(bool),
    SetType(TopicType),
    Move(ForumId),
    IssueTag { tag: IssueTag, enabled: bool },
    Rename(String),
    /// Replace the poll and drop every vote cast on the previous one.
    ReplacePoll(Poll),
}

/// A topic about to be created together with its first post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub forum_id: ForumId,
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    /// Already validated.
    pub poll: Option<Poll>,
}

/// Check a topic title.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyTitle`] or
/// [`ValidationError::TitleTooLong`].
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong {
            max: MAX_TITLE_LENGTH,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_blank_title() {
        assert_eq!(validate_title("   "), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn should_reject_title_over_limit() {
        let title = "x".repeat(MAX_TITLE_LENGTH + 1);
        assert_eq!(
            validate_title(&title),
            Err(ValidationError::TitleTooLong {
                max: MAX_TITLE_LENGTH
            })
        );
        assert!(validate_title(&"x".repeat(MAX_TITLE_LENGTH)).is_ok());
    }

    #[test]
    fn should_reject_unknown_topic_type() {
        assert_eq!(TopicType::try_from(2), Ok(TopicType::Announcement));
        assert_eq!(
            TopicType::try_from(3),
            Err(InvalidInputError::UnknownTopicType(3))
        );
    }

    #[test]
    fn should_serialize_topic_type_as_number() {
        assert_eq!(
            serde_json::to_value(TopicType::Sticky).unwrap(),
            serde_json::json!(1)
        );
    }

    #[test]
    fn should_parse_issue_tag_case_insensitively() {
        assert_eq!("Confirmed".parse::<IssueTag>(), Ok(IssueTag::Confirmed));
        assert_eq!(
            "wontfix".parse::<IssueTag>(),
            Err(InvalidInputError::UnknownIssueTag("wontfix".to_string()))
        );
    }

    #[test]
    fn should_toggle_issue_tags_and_stamp_update_time() {
        let at = crate::time::now();
        let mut topic = Topic {
            id: TopicId::new(1),
            forum_id: ForumId::new(1),
            title: "Crash".to_string(),
            user_id: UserId::new(1),
            first_post_id: None,
            last_post_id: None,
            post_count: 0,
            topic_type: TopicType::Normal,
            is_locked: false,
            issue_tags: BTreeSet::new(),
            poll: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        };
        let later = at + chrono::Duration::minutes(5);

        topic.apply(
            TopicChange::IssueTag {
                tag: IssueTag::Added,
                enabled: true,
            },
            later,
        );
        assert!(topic.has_tag(IssueTag::Added));
        assert_eq!(topic.updated_at, later);

        topic.apply(
            TopicChange::IssueTag {
                tag: IssueTag::Added,
                enabled: false,
            },
            later,
        );
        assert!(topic.issue_tags.is_empty());
    }
}
