//! Default permission rules.

use agora_domain::forum::Forum;
use agora_domain::permission::{Action, Authorizable};
use agora_domain::time::now;
use agora_domain::topic::Topic;
use agora_domain::user::{Actor, User};

use crate::ports::PermissionChecker;

/// Rules for a community where forum moderators (and admins) can do
/// anything inside their forums and members act on their own content.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPolicy;

impl PermissionChecker for StandardPolicy {
    fn can(&self, actor: &Actor, action: Action, subject: Authorizable<'_>) -> bool {
        match (action, subject) {
            (Action::MatchView, Authorizable::Match(game)) => {
                !game.is_private || actor.user().is_some_and(|user| user.is_admin)
            }
            (Action::ForumView, Authorizable::Forum(_)) => true,
            (Action::ForumView, Authorizable::Topic { topic, forum }) => {
                !topic.is_deleted() || actor.moderates(forum.id)
            }
            (Action::ForumModerate, subject) => {
                subject.forum().is_some_and(|forum| actor.moderates(forum.id))
            }
            (Action::ForumTopicStore, Authorizable::Forum(forum)) => {
                writer(actor).is_some() && forum.accepts_topics()
            }
            (action, Authorizable::Topic { topic, forum }) => {
                writer(actor).is_some_and(|user| can_on_topic(user, action, topic, forum))
            }
            _ => false,
        }
    }
}

/// The actor as a user allowed to write at all.
fn writer(actor: &Actor) -> Option<&User> {
    actor.user().filter(|user| !user.is_restricted)
}

fn can_on_topic(user: &User, action: Action, topic: &Topic, forum: &Forum) -> bool {
    if user.moderates(forum.id) {
        return true;
    }
    let owner = topic.user_id == user.id;
    let open = !topic.is_locked && !topic.is_deleted();
    match action {
        Action::ForumTopicReply => open,
        Action::ForumTopicEdit => owner && open,
        Action::ForumTopicDelete => owner && open && topic.post_count <= 1,
        Action::ForumTopicPollEdit => {
            owner && open && topic.poll.as_ref().is_some_and(|poll| poll.can_edit(now()))
        }
        Action::ForumTopicVote => open && topic.poll.as_ref().is_some_and(|poll| poll.is_open(now())),
        _ => false,
    }
}
