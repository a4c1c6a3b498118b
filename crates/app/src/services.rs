//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.
//! Every call receives the requesting [`Actor`](agora_domain::user::Actor)
//! explicitly.

pub mod match_service;
pub mod moderation_service;
pub mod topic_service;
pub mod user_service;

use agora_domain::error::{AgoraError, NotFoundError};
use agora_domain::forum::Forum;
use agora_domain::id::TopicId;
use agora_domain::topic::Topic;

use crate::ports::ForumRepository;

/// Which topics a lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trashed {
    Include,
    Exclude,
}

/// Load a topic and the forum holding it.
pub(crate) async fn load_topic<F: ForumRepository>(
    repo: &F,
    id: TopicId,
    trashed: Trashed,
) -> Result<(Topic, Forum), AgoraError> {
    let missing = || NotFoundError {
        entity: "Topic",
        id: id.to_string(),
    };
    let topic = repo
        .get_topic(id)
        .await?
        .filter(|topic| trashed == Trashed::Include || !topic.is_deleted())
        .ok_or_else(missing)?;
    let forum = repo.get_forum(topic.forum_id).await?.ok_or_else(missing)?;
    Ok((topic, forum))
}
