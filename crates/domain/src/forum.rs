//! Forum: the container topics are posted into.

use serde::{Deserialize, Serialize};

use crate::id::ForumId;

/// What a forum record represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForumKind {
    /// Groups other forums; holds no topics.
    Category,
    #[default]
    Forum,
    /// Points elsewhere; holds no topics.
    Link,
}

impl ForumKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Forum => "forum",
            Self::Link => "link",
        }
    }
}

impl std::str::FromStr for ForumKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Self::Category),
            "forum" => Ok(Self::Forum),
            "link" => Ok(Self::Link),
            other => Err(format!("unknown forum kind `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    pub id: ForumId,
    pub name: String,
    pub kind: ForumKind,
    /// Search engines may index topics of this forum.
    pub enable_indexing: bool,
    /// Help forum: topic authors watch their topics by mail.
    pub is_help: bool,
    /// Feature-request forum: topics collect feature votes.
    pub is_feature: bool,
    /// Issue tracker: topics carry issue tags.
    pub is_issue: bool,
}

impl Forum {
    #[must_use]
    pub fn new(id: ForumId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ForumKind::Forum,
            enable_indexing: true,
            is_help: false,
            is_feature: false,
            is_issue: false,
        }
    }

    #[must_use]
    pub fn accepts_topics(&self) -> bool {
        self.kind == ForumKind::Forum
    }
}
