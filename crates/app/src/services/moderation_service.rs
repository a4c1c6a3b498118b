//! Moderation service: topic state changes recorded in the audit log.
//!
//! Each operation checks permission first, then hands the change and its
//! [`ModerationLogEntry`] to the repository to be written together.

use tracing::info;

use agora_domain::error::{AgoraError, InvalidInputError, NotFoundError};
use agora_domain::forum::Forum;
use agora_domain::id::{ForumId, TopicId};
use agora_domain::moderation::ModerationLogEntry;
use agora_domain::permission::{Action, Authorizable};
use agora_domain::poll::{PollDraft, PollSummary};
use agora_domain::time::now;
use agora_domain::topic::{IssueTag, Topic, TopicChange, TopicType};
use agora_domain::user::Actor;

use crate::ports::{ForumRepository, PermissionChecker};
use crate::services::{Trashed, load_topic};

/// Outcome of deleting a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destroyed {
    pub topic: Topic,
    pub forum: Forum,
    /// The actor moderates the forum and keeps seeing the deleted topic.
    pub by_moderator: bool,
}

/// Poll after an edit, as shown to the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedPoll {
    pub topic: Topic,
    pub summary: PollSummary,
    pub can_edit: bool,
}

pub struct ModerationService<F, P> {
    forums: F,
    permissions: P,
}

impl<F, P> ModerationService<F, P>
where
    F: ForumRepository + Sync,
    P: PermissionChecker + Sync,
{
    pub fn new(forums: F, permissions: P) -> Self {
        Self {
            forums,
            permissions,
        }
    }

    async fn moderated_topic(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        trashed: Trashed,
    ) -> Result<(Topic, Forum), AgoraError> {
        let (topic, forum) = load_topic(&self.forums, topic_id, trashed).await?;
        self.permissions
            .ensure_can(actor, Action::ForumModerate, Authorizable::Forum(&forum))?;
        Ok((topic, forum))
    }

    async fn apply(
        &self,
        topic: &Topic,
        change: TopicChange,
        log: Option<ModerationLogEntry>,
    ) -> Result<Topic, AgoraError> {
        if let Some(entry) = &log {
            info!(
                action = %entry.action,
                topic_id = %topic.id,
                forum_id = %topic.forum_id,
                user_id = %entry.user_id,
                "moderation action"
            );
        }
        self.forums.apply_change(topic.id, change, log).await
    }

    /// Soft-delete a topic; logged when the actor is not its poster.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic is missing
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`]
    pub async fn destroy(&self, actor: &Actor, topic_id: TopicId) -> Result<Destroyed, AgoraError> {
        let (topic, forum) = load_topic(&self.forums, topic_id, Trashed::Include).await?;
        self.permissions.ensure_can(
            actor,
            Action::ForumTopicDelete,
            Authorizable::Topic {
                topic: &topic,
                forum: &forum,
            },
        )?;
        let user = actor.require_user()?;

        let log = (user.id != topic.user_id).then(|| ModerationLogEntry::delete(&topic, user.id, now()));
        let topic = self.apply(&topic, TopicChange::Delete, log).await?;
        let by_moderator = self
            .permissions
            .can(actor, Action::ForumModerate, Authorizable::Forum(&forum));

        Ok(Destroyed {
            topic,
            forum,
            by_moderator,
        })
    }

    /// Undo a soft delete.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic is missing
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`]
    pub async fn restore(&self, actor: &Actor, topic_id: TopicId) -> Result<Topic, AgoraError> {
        let (topic, _) = self.moderated_topic(actor, topic_id, Trashed::Include).await?;
        let user = actor.require_user()?;
        let log = ModerationLogEntry::restore(&topic, user.id, now());
        self.apply(&topic, TopicChange::Restore, Some(log)).await
    }

    /// Lock or unlock a topic.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic is missing
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`]
    pub async fn lock(&self, actor: &Actor, topic_id: TopicId, locked: bool) -> Result<Topic, AgoraError> {
        let (topic, _) = self.moderated_topic(actor, topic_id, Trashed::Include).await?;
        let user = actor.require_user()?;
        let log = ModerationLogEntry::lock(&topic, locked, user.id, now());
        self.apply(&topic, TopicChange::Lock(locked), Some(log)).await
    }

    /// Change the topic type (`0` normal, `1` sticky, `2` announcement).
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic is missing
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`]
    /// - [`AgoraError::InvalidInput`] for a missing or unknown type code
    pub async fn pin(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        type_code: Option<i64>,
    ) -> Result<Topic, AgoraError> {
        let (topic, _) = self.moderated_topic(actor, topic_id, Trashed::Include).await?;
        let user = actor.require_user()?;
        let type_code = type_code.ok_or(InvalidInputError::MissingParameter("pin"))?;
        let topic_type = TopicType::try_from(type_code)?;
        let log = ModerationLogEntry::topic_type(&topic, topic_type, user.id, now());
        self.apply(&topic, TopicChange::SetType(topic_type), Some(log))
            .await
    }

    /// Move a topic into another forum; the actor must moderate both.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic or destination is missing
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`]
    /// - [`AgoraError::InvalidInput`] when the destination is missing, is the
    ///   current forum or does not hold topics
    pub async fn move_topic(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        destination_id: Option<ForumId>,
    ) -> Result<Topic, AgoraError> {
        let (topic, origin) = self.moderated_topic(actor, topic_id, Trashed::Include).await?;
        let destination_id =
            destination_id.ok_or(InvalidInputError::MissingParameter("destination_forum_id"))?;
        let destination = self
            .forums
            .get_forum(destination_id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Forum",
                id: destination_id.to_string(),
            })?;
        self.permissions
            .ensure_can(actor, Action::ForumModerate, Authorizable::Forum(&destination))?;
        let user = actor.require_user()?;

        if destination.id == origin.id {
            return Err(InvalidInputError::SameForum(destination.id.get()).into());
        }
        if !destination.accepts_topics() {
            return Err(InvalidInputError::ForumNotPostable(destination.id.get()).into());
        }

        let log = ModerationLogEntry::move_from(&topic, &origin.name, user.id, now());
        self.apply(&topic, TopicChange::Move(destination.id), Some(log))
            .await
    }

    /// Set or clear an issue tag on a topic of an issue-tracker forum.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic is missing or deleted
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`]
    /// - [`AgoraError::InvalidInput`] for a missing or unknown tag, or a
    ///   topic outside an issue forum
    pub async fn issue_tag(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        tag: Option<&str>,
        state: bool,
    ) -> Result<Topic, AgoraError> {
        let (topic, forum) = self.moderated_topic(actor, topic_id, Trashed::Exclude).await?;
        let user = actor.require_user()?;
        let tag: IssueTag = tag
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .ok_or(InvalidInputError::MissingParameter("issue_tag"))?
            .parse()?;
        if !forum.is_issue {
            return Err(InvalidInputError::NotIssueTopic.into());
        }

        let log = ModerationLogEntry::issue_tag(&topic, tag, state, user.id, now());
        self.apply(
            &topic,
            TopicChange::IssueTag {
                tag,
                enabled: state,
            },
            Some(log),
        )
        .await
    }

    /// Replace a topic's poll, dropping the votes of the old one; logged
    /// when the actor is not the poster.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic is missing or deleted
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`]
    /// - [`AgoraError::Validation`] for an invalid poll; the old poll is kept
    pub async fn edit_poll(&self, actor: &Actor, topic_id: TopicId, draft: PollDraft) -> Result<EditedPoll, AgoraError> {
        let (topic, forum) = load_topic(&self.forums, topic_id, Trashed::Exclude).await?;
        self.permissions.ensure_can(
            actor,
            Action::ForumTopicPollEdit,
            Authorizable::Topic {
                topic: &topic,
                forum: &forum,
            },
        )?;
        let user = actor.require_user()?;

        let at = now();
        let poll = draft.into_poll(at)?;
        let log = (user.id != topic.user_id)
            .then(|| ModerationLogEntry::edit_poll(&topic, &poll.title, user.id, at));
        let summary = poll.summarize(
            &[],
            Some(user.id),
            self.permissions
                .can(actor, Action::ForumModerate, Authorizable::Forum(&forum)),
            at,
        );
        let can_edit = poll.can_edit(at);
        let topic = self.apply(&topic, TopicChange::ReplacePoll(poll), log).await?;

        Ok(EditedPoll {
            topic,
            summary,
            can_edit,
        })
    }
}
