//! Users and the request actor.
//!
//! Identity is established outside this system; every operation that needs
//! to know who is asking receives an explicit [`Actor`].

use serde::{Deserialize, Serialize};

use crate::error::AgoraError;
use crate::id::{ForumId, UserId};

/// A registered member of the community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub country_code: String,
    pub is_admin: bool,
    pub is_supporter: bool,
    /// Restricted users can read but not write.
    pub is_restricted: bool,
    /// Forums this user moderates.
    pub moderated_forums: Vec<ForumId>,
    pub preferences: UserPreferences,
}

/// Per-user display preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Moderators: show soft-deleted posts unless the request says otherwise.
    pub forum_posts_show_deleted: bool,
}

impl User {
    #[must_use]
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            country_code: String::new(),
            is_admin: false,
            is_supporter: false,
            is_restricted: false,
            moderated_forums: Vec::new(),
            preferences: UserPreferences::default(),
        }
    }

    #[must_use]
    pub fn moderates(&self, forum_id: ForumId) -> bool {
        self.is_admin || self.moderated_forums.contains(&forum_id)
    }

    #[must_use]
    pub fn compact(&self) -> UserCompact {
        UserCompact {
            id: self.id,
            username: self.username.clone(),
            country_code: self.country_code.clone(),
        }
    }
}

/// Public subset of a user embedded in other payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCompact {
    pub id: UserId,
    pub username: String,
    pub country_code: String,
}

/// Who is performing a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Actor {
    #[default]
    Guest,
    User(User),
}

impl Actor {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Guest => None,
            Self::User(user) => Some(user),
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<UserId> {
        self.user().map(|user| user.id)
    }

    /// The authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`AgoraError::Unauthenticated`] for guests.
    pub fn require_user(&self) -> Result<&User, AgoraError> {
        self.user().ok_or(AgoraError::Unauthenticated)
    }

    #[must_use]
    pub fn moderates(&self, forum_id: ForumId) -> bool {
        self.user().is_some_and(|user| user.moderates(forum_id))
    }

    /// Whether this actor is the user `id`.
    #[must_use]
    pub fn is(&self, id: UserId) -> bool {
        self.id() == Some(id)
    }
}
