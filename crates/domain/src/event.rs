//! Domain events published after successful forum writes.

use serde::{Deserialize, Serialize};

use crate::id::{ForumId, PostId, TopicId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForumEvent {
    TopicCreated {
        forum_id: ForumId,
        topic_id: TopicId,
        post_id: PostId,
        user_id: UserId,
    },
    TopicReplied {
        topic_id: TopicId,
        post_id: PostId,
        user_id: UserId,
    },
}

impl ForumEvent {
    #[must_use]
    pub const fn topic_id(&self) -> TopicId {
        match self {
            Self::TopicCreated { topic_id, .. } | Self::TopicReplied { topic_id, .. } => *topic_id,
        }
    }
}
