//! Permission vocabulary: what an actor attempts, and on which subject.
//!
//! The decision itself lives behind the `PermissionChecker` port in the
//! application layer.

use std::fmt;

use crate::forum::Forum;
use crate::matches::Match;
use crate::topic::Topic;

/// A guarded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ForumView,
    ForumModerate,
    ForumTopicStore,
    ForumTopicReply,
    ForumTopicDelete,
    ForumTopicEdit,
    ForumTopicPollEdit,
    ForumTopicVote,
    MatchView,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForumView => "ForumView",
            Self::ForumModerate => "ForumModerate",
            Self::ForumTopicStore => "ForumTopicStore",
            Self::ForumTopicReply => "ForumTopicReply",
            Self::ForumTopicDelete => "ForumTopicDelete",
            Self::ForumTopicEdit => "ForumTopicEdit",
            Self::ForumTopicPollEdit => "ForumTopicPollEdit",
            Self::ForumTopicVote => "ForumTopicVote",
            Self::MatchView => "MatchView",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record an [`Action`] is checked against.
#[derive(Debug, Clone, Copy)]
pub enum Authorizable<'a> {
    Forum(&'a Forum),
    /// A topic together with the forum that holds it.
    Topic { topic: &'a Topic, forum: &'a Forum },
    Match(&'a Match),
}

impl Authorizable<'_> {
    /// Forum the subject belongs to, if any.
    #[must_use]
    pub fn forum(&self) -> Option<&Forum> {
        match self {
            Self::Forum(forum) | Self::Topic { forum, .. } => Some(forum),
            Self::Match(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ForumId;

    #[test]
    fn should_display_action_by_name() {
        assert_eq!(Action::ForumTopicPollEdit.to_string(), "ForumTopicPollEdit");
    }

    #[test]
    fn should_expose_forum_of_forum_subject() {
        let forum = Forum::new(ForumId::new(3), "Help");
        let subject = Authorizable::Forum(&forum);
        assert_eq!(subject.forum().map(|f| f.id), Some(ForumId::new(3)));
    }
}
