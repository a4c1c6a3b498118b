//! Post: a single message inside a topic.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{ForumId, PostId, TopicId, UserId};
use crate::pagination::Keyed;
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub topic_id: TopicId,
    pub forum_id: ForumId,
    pub user_id: UserId,
    pub body: String,
    pub created_at: Timestamp,
    pub edited_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
}

impl Post {
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Keyed for Post {
    const CURSOR_FIELD: &'static str = "post_id";

    fn key(&self) -> i64 {
        self.id.get()
    }
}

/// A post about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub topic_id: TopicId,
    pub forum_id: ForumId,
    pub user_id: UserId,
    pub body: String,
}

/// Reject empty bodies.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyBody`] when `body` is blank.
pub fn validate_body(body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::EmptyBody);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_blank_body() {
        assert_eq!(validate_body("  \n"), Err(ValidationError::EmptyBody));
        assert!(validate_body("hello").is_ok());
    }
}
