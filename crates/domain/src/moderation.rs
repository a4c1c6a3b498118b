//! Moderation audit log.
//!
//! Every moderator-initiated state change is recorded as a
//! [`ModerationLogEntry`] written in the same transaction as the change.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::id::{ForumId, TopicId, UserId};
use crate::time::Timestamp;
use crate::topic::{IssueTag, Topic, TopicType};

/// Audit code of a moderation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModerationAction {
    #[serde(rename = "LOG_DELETE_TOPIC")]
    DeleteTopic,
    #[serde(rename = "LOG_RESTORE_TOPIC")]
    RestoreTopic,
    #[serde(rename = "LOG_EDIT_TOPIC")]
    EditTopic,
    #[serde(rename = "LOG_EDIT_POLL")]
    EditPoll,
    #[serde(rename = "LOG_ISSUE_TAG")]
    IssueTag,
    #[serde(rename = "LOG_LOCK")]
    Lock,
    #[serde(rename = "LOG_UNLOCK")]
    Unlock,
    #[serde(rename = "LOG_MOVE")]
    Move,
    #[serde(rename = "LOG_TOPIC_TYPE")]
    TopicType,
}

impl ModerationAction {
    pub const ALL: [Self; 9] = [
        Self::DeleteTopic,
        Self::RestoreTopic,
        Self::EditTopic,
        Self::EditPoll,
        Self::IssueTag,
        Self::Lock,
        Self::Unlock,
        Self::Move,
        Self::TopicType,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DeleteTopic => "LOG_DELETE_TOPIC",
            Self::RestoreTopic => "LOG_RESTORE_TOPIC",
            Self::EditTopic => "LOG_EDIT_TOPIC",
            Self::EditPoll => "LOG_EDIT_POLL",
            Self::IssueTag => "LOG_ISSUE_TAG",
            Self::Lock => "LOG_LOCK",
            Self::Unlock => "LOG_UNLOCK",
            Self::Move => "LOG_MOVE",
            Self::TopicType => "LOG_TOPIC_TYPE",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.code() == code)
    }
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationLogEntry {
    pub action: ModerationAction,
    /// Free-form values describing the change (titles, names, states).
    pub context: Value,
    pub forum_id: ForumId,
    pub topic_id: TopicId,
    pub user_id: UserId,
    pub created_at: Timestamp,
}

impl ModerationLogEntry {
    fn on(topic: &Topic, action: ModerationAction, context: Value, user_id: UserId, at: Timestamp) -> Self {
        Self {
            action,
            context,
            forum_id: topic.forum_id,
            topic_id: topic.id,
            user_id,
            created_at: at,
        }
    }

    #[must_use]
    pub fn delete(topic: &Topic, user_id: UserId, at: Timestamp) -> Self {
        Self::on(topic, ModerationAction::DeleteTopic, json!([topic.title]), user_id, at)
    }

    #[must_use]
    pub fn restore(topic: &Topic, user_id: UserId, at: Timestamp) -> Self {
        Self::on(topic, ModerationAction::RestoreTopic, json!([topic.title]), user_id, at)
    }

    /// Rename entry; records the new title.
    #[must_use]
    pub fn edit_title(topic: &Topic, title: &str, user_id: UserId, at: Timestamp) -> Self {
        Self::on(topic, ModerationAction::EditTopic, json!([title]), user_id, at)
    }

    #[must_use]
    pub fn edit_poll(topic: &Topic, poll_title: &str, user_id: UserId, at: Timestamp) -> Self {
        Self::on(topic, ModerationAction::EditPoll, json!([poll_title]), user_id, at)
    }

    #[must_use]
    pub fn issue_tag(topic: &Topic, tag: IssueTag, state: bool, user_id: UserId, at: Timestamp) -> Self {
        Self::on(
            topic,
            ModerationAction::IssueTag,
            json!({ "issueTag": tag.as_str(), "state": state }),
            user_id,
            at,
        )
    }

    #[must_use]
    pub fn lock(topic: &Topic, locked: bool, user_id: UserId, at: Timestamp) -> Self {
        let action = if locked {
            ModerationAction::Lock
        } else {
            ModerationAction::Unlock
        };
        Self::on(topic, action, json!([topic.title]), user_id, at)
    }

    /// Move entry; subject is the topic's origin forum.
    #[must_use]
    pub fn move_from(topic: &Topic, origin_name: &str, user_id: UserId, at: Timestamp) -> Self {
        Self::on(topic, ModerationAction::Move, json!([origin_name]), user_id, at)
    }

    #[must_use]
    pub fn topic_type(topic: &Topic, topic_type: TopicType, user_id: UserId, at: Timestamp) -> Self {
        Self::on(
            topic,
            ModerationAction::TopicType,
            json!({ "title": topic.title, "type": topic_type.code() }),
            user_id,
            at,
        )
    }
}
