//! Topic service: reading a topic's posts and member-level writes.
//!
//! [`TopicService::show`] is the windowed post viewer: it resolves an anchor
//! (`n`, `start`, `end`) into a primary window and, for full pages, fetches
//! the preceding context so the anchored post is shown in place.

use std::collections::HashSet;
use std::future::Future;

use tracing::{debug, warn};

use agora_domain::error::{AgoraError, ForbiddenError, NotFoundError, ValidationError};
use agora_domain::event::ForumEvent;
use agora_domain::feature_vote::{self, FeatureVote, FeatureVoteKind, FeatureVoteTally};
use agora_domain::forum::Forum;
use agora_domain::id::{ForumId, PollOptionId, PostId, TopicId};
use agora_domain::moderation::ModerationLogEntry;
use agora_domain::pagination::{
    Anchor, Cursor, Keyed, POST_LIMIT, SortOrder, StartAnchor, WindowQuery,
};
use agora_domain::permission::{Action, Authorizable};
use agora_domain::poll::{PollDraft, PollSummary};
use agora_domain::post::{self, NewPost, Post};
use agora_domain::time::now;
use agora_domain::topic::{self, NewTopic, Topic, TopicChange};
use agora_domain::user::{Actor, User, UserCompact};

use crate::pagination::{self, Boundaries, WindowSource};
use crate::ports::{
    EventPublisher, ForumRepository, PermissionChecker, ReadMarkerRepository, UserRepository,
};
use crate::services::{Trashed, load_topic};

/// Query parameters of the post viewer, already type-checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowParams {
    /// Explicit resumption point; disables anchor resolution.
    pub cursor: Option<Cursor>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    /// Moderators only; defaults to their preference.
    pub with_deleted: Option<bool>,
    /// 1-indexed position of the post to show first.
    pub n: Option<i64>,
    pub start: Option<StartAnchor>,
    pub end: Option<i64>,
    /// Posts fragment only (web mode).
    pub skip_layout: bool,
}

/// How the viewer is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowMode {
    /// API response: one window in fetch order with its next cursor.
    Json,
    /// Web page (or posts fragment with `skip_layout`).
    Page,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicView {
    pub topic: Topic,
    pub forum: Forum,
    /// Fetch order in [`ShowMode::Json`], ascending otherwise.
    pub posts: Vec<Post>,
    /// Authors of `posts`.
    pub users: Vec<UserCompact>,
    pub cursor: Option<Cursor>,
    pub sort: SortOrder,
    pub show_deleted: bool,
    pub user_can_moderate: bool,
    /// Extra page data, [`ShowMode::Page`] only.
    pub page: Option<PageContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub poll: Option<PollSummary>,
    pub can_edit_poll: bool,
    pub feature_votes: Vec<FeatureVoteTally>,
    pub noindex: bool,
    /// Position of the first shown post; later posts count up from it.
    pub first_post_position: i64,
    /// Post the page scrolls to.
    pub jump_to: Option<PostId>,
}

/// A newly created reply and where it sits in the topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub topic: Topic,
    pub post: Post,
    pub position: i64,
}

/// Posts of one topic as a [`WindowSource`].
struct TopicPosts<'a, F> {
    repo: &'a F,
    topic_id: TopicId,
}

impl<F: ForumRepository + Sync> WindowSource<Post> for TopicPosts<'_, F> {
    fn fetch(&self, query: WindowQuery) -> impl Future<Output = Result<Vec<Post>, AgoraError>> + Send {
        self.repo.fetch_posts(self.topic_id, query)
    }
}

pub struct TopicService<F, U, R, P, E> {
    forums: F,
    users: U,
    reads: R,
    permissions: P,
    events: E,
}

impl<F, U, R, P, E> TopicService<F, U, R, P, E>
where
    F: ForumRepository + Sync,
    U: UserRepository + Sync,
    R: ReadMarkerRepository + Sync,
    P: PermissionChecker + Sync,
    E: EventPublisher + Sync,
{
    pub fn new(forums: F, users: U, reads: R, permissions: P, events: E) -> Self {
        Self {
            forums,
            users,
            reads,
            permissions,
            events,
        }
    }

    /// Show a window of a topic's posts.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic (or its forum) is missing,
    ///   deleted and the actor cannot moderate, when `n` names no post, or
    ///   when a full page would be empty
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`] when the
    ///   forum cannot be viewed
    /// - storage errors from the repositories
    pub async fn show(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        params: ShowParams,
        mode: ShowMode,
    ) -> Result<TopicView, AgoraError> {
        let (topic, forum) = load_topic(&self.forums, topic_id, Trashed::Include).await?;
        let user_can_moderate =
            self.permissions
                .can(actor, Action::ForumModerate, Authorizable::Forum(&forum));

        if topic.is_deleted() && !user_can_moderate {
            return Err(NotFoundError {
                entity: "Topic",
                id: topic_id.to_string(),
            }
            .into());
        }

        let show_deleted = match actor.user() {
            Some(user) if user_can_moderate => params
                .with_deleted
                .unwrap_or(user.preferences.forum_posts_show_deleted),
            _ => false,
        };

        self.permissions
            .ensure_can(actor, Action::ForumView, Authorizable::Forum(&forum))?;

        let limit = POST_LIMIT.clamp(params.limit);
        let query = match params.cursor {
            Some(cursor) => {
                WindowQuery::new(SortOrder::resolve(params.sort.as_deref(), SortOrder::IdAsc), limit)
                    .after(Some(cursor))
            }
            None => {
                let anchor = self.resolve_anchor(actor, &topic, &params, show_deleted).await?;
                match anchor.primary(Post::CURSOR_FIELD) {
                    Some((cursor, sort)) => WindowQuery::new(sort, limit).after(Some(cursor)),
                    None => WindowQuery::new(
                        SortOrder::resolve(params.sort.as_deref(), SortOrder::IdAsc),
                        limit,
                    ),
                }
            }
        }
        .include_deleted(show_deleted);

        let source = TopicPosts {
            repo: &self.forums,
            topic_id,
        };

        if mode == ShowMode::Json {
            let window = pagination::fetch(&source, query).await?;
            let cursor = window.next_cursor();
            let posts = window.into_fetch_order();
            let users = self.authors(&posts).await?;
            return Ok(TopicView {
                topic,
                forum,
                posts,
                users,
                cursor,
                sort: query.sort,
                show_deleted,
                user_can_moderate,
                page: None,
            });
        }

        let (posts, cursor, jump_to) = if params.skip_layout {
            let window = pagination::fetch(&source, query).await?;
            let cursor = window.next_cursor();
            (window.into_ascending(), cursor, None)
        } else {
            let boundaries = Boundaries {
                first: topic.first_post_id.map(PostId::get),
                last: topic.last_post_id.map(PostId::get),
            };
            let assembled = pagination::assemble(&source, query, boundaries).await?;
            (
                assembled.items,
                assembled.next_cursor,
                assembled.jump_to.map(PostId::new),
            )
        };

        let (Some(first_shown), Some(last_shown)) =
            (posts.first().map(|p| p.id), posts.last().map(|p| p.id))
        else {
            debug!(topic_id = %topic_id, skip_layout = params.skip_layout, "empty post window");
            if params.skip_layout {
                return Ok(TopicView {
                    topic,
                    forum,
                    posts,
                    users: Vec::new(),
                    cursor,
                    sort: query.sort,
                    show_deleted,
                    user_can_moderate,
                    page: None,
                });
            }
            return Err(NotFoundError {
                entity: "Post page",
                id: topic_id.to_string(),
            }
            .into());
        };

        if let Some(user_id) = actor.id() {
            self.reads.mark_read(user_id, topic_id, last_shown).await?;
        }

        if params.skip_layout {
            let users = self.authors(&posts).await?;
            return Ok(TopicView {
                topic,
                forum,
                posts,
                users,
                cursor,
                sort: query.sort,
                show_deleted,
                user_can_moderate,
                page: None,
            });
        }

        let first_post_position = self
            .forums
            .post_position(topic_id, first_shown, show_deleted)
            .await?;
        let (poll, can_edit_poll) = self.poll_state(actor, &topic, &forum, user_can_moderate).await?;
        let feature_votes = if forum.is_feature {
            feature_vote::tally(&self.forums.feature_votes(topic_id).await?)
        } else {
            Vec::new()
        };
        let users = self.authors(&posts).await?;

        Ok(TopicView {
            page: Some(PageContext {
                poll,
                can_edit_poll,
                feature_votes,
                noindex: !forum.enable_indexing,
                first_post_position,
                jump_to,
            }),
            topic,
            forum,
            posts,
            users,
            cursor,
            sort: query.sort,
            show_deleted,
            user_can_moderate,
        })
    }

    /// 1-indexed position of `post_id` among the posts of `topic_id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    pub async fn position(
        &self,
        topic_id: TopicId,
        post_id: PostId,
        include_deleted: bool,
    ) -> Result<i64, AgoraError> {
        self.forums
            .post_position(topic_id, post_id, include_deleted)
            .await
    }

    /// Resolve `n`, `start` and `end` (in that priority) into an anchor.
    async fn resolve_anchor(
        &self,
        actor: &Actor,
        topic: &Topic,
        params: &ShowParams,
        include_deleted: bool,
    ) -> Result<Anchor, AgoraError> {
        if let Some(n) = params.n {
            let post_id = self
                .forums
                .nth_post_id(topic.id, n, include_deleted)
                .await?
                .ok_or_else(|| NotFoundError {
                    entity: "Post",
                    id: format!("#{n} of topic {}", topic.id),
                })?;
            return Ok(Anchor::Start(post_id.get()));
        }

        let start = match params.start {
            Some(StartAnchor::Key(key)) => Some(key),
            Some(StartAnchor::Unread) => self.first_unread(actor, topic).await?.map(PostId::get),
            None => None,
        };
        if let Some(key) = start {
            return Ok(Anchor::Start(key));
        }

        Ok(params.end.map_or(Anchor::Beginning, Anchor::End))
    }

    /// First post after the actor's read marker, or the topic's last post
    /// once everything is read. `None` for guests and unread topics.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repositories.
    pub async fn first_unread(&self, actor: &Actor, topic: &Topic) -> Result<Option<PostId>, AgoraError> {
        let Some(user_id) = actor.id() else {
            return Ok(None);
        };
        let Some(last_read) = self.reads.last_read(user_id, topic.id).await? else {
            return Ok(None);
        };
        let query = WindowQuery::new(SortOrder::IdAsc, 1)
            .after(Some(Cursor::new(Post::CURSOR_FIELD, last_read.get())));
        let next = self.forums.fetch_posts(topic.id, query).await?;
        Ok(next.first().map(|post| post.id).or(topic.last_post_id))
    }

    async fn poll_state(
        &self,
        actor: &Actor,
        topic: &Topic,
        forum: &Forum,
        user_can_moderate: bool,
    ) -> Result<(Option<PollSummary>, bool), AgoraError> {
        let Some(poll) = &topic.poll else {
            return Ok((None, false));
        };
        let at = now();
        let votes = self.forums.poll_votes(topic.id).await?;
        let summary = poll.summarize(&votes, actor.id(), user_can_moderate, at);
        let can_edit = poll.can_edit(at)
            && self.permissions.can(
                actor,
                Action::ForumTopicPollEdit,
                Authorizable::Topic { topic, forum },
            );
        Ok((Some(summary), can_edit))
    }

    async fn authors(&self, posts: &[Post]) -> Result<Vec<UserCompact>, AgoraError> {
        let mut seen = HashSet::new();
        let ids = posts
            .iter()
            .map(|post| post.user_id)
            .filter(|id| seen.insert(*id))
            .collect();
        let users = self.users.get_many(ids).await?;
        Ok(users.iter().map(User::compact).collect())
    }

    /// Create a topic with its first post and an optional poll.
    ///
    /// The poll is validated before anything is written.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the forum is missing
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`]
    /// - [`AgoraError::Validation`] for an invalid poll, title or body
    pub async fn store(
        &self,
        actor: &Actor,
        forum_id: ForumId,
        title: String,
        body: String,
        poll: Option<PollDraft>,
    ) -> Result<(Topic, Post), AgoraError> {
        let forum = self.forums.get_forum(forum_id).await?.ok_or_else(|| NotFoundError {
            entity: "Forum",
            id: forum_id.to_string(),
        })?;
        self.permissions
            .ensure_can(actor, Action::ForumTopicStore, Authorizable::Forum(&forum))?;
        let user = actor.require_user()?;

        let poll = poll.map(|draft| draft.into_poll(now())).transpose()?;
        topic::validate_title(&title)?;
        post::validate_body(&body)?;

        let (topic, post) = self
            .forums
            .create_topic(NewTopic {
                forum_id,
                user_id: user.id,
                title: title.trim().to_string(),
                body,
                poll,
            })
            .await?;
        self.reads.mark_read(user.id, topic.id, post.id).await?;
        self.publish(ForumEvent::TopicCreated {
            forum_id,
            topic_id: topic.id,
            post_id: post.id,
            user_id: user.id,
        })
        .await;

        Ok((topic, post))
    }

    /// Append a reply to a topic.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic is missing or deleted
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`]
    /// - [`AgoraError::Validation`] for an empty body
    pub async fn reply(&self, actor: &Actor, topic_id: TopicId, body: String) -> Result<Reply, AgoraError> {
        let (topic, forum) = load_topic(&self.forums, topic_id, Trashed::Exclude).await?;
        self.permissions.ensure_can(
            actor,
            Action::ForumTopicReply,
            Authorizable::Topic {
                topic: &topic,
                forum: &forum,
            },
        )?;
        let user = actor.require_user()?;
        post::validate_body(&body)?;

        let post = self
            .forums
            .create_post(NewPost {
                topic_id,
                forum_id: forum.id,
                user_id: user.id,
                body,
            })
            .await?;
        self.reads.mark_read(user.id, topic_id, post.id).await?;
        self.publish(ForumEvent::TopicReplied {
            topic_id,
            post_id: post.id,
            user_id: user.id,
        })
        .await;

        let position = self.forums.post_position(topic_id, post.id, false).await?;
        Ok(Reply {
            topic,
            post,
            position,
        })
    }

    /// Rename a topic.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic is missing
    /// - [`AgoraError::Forbidden`] when the actor may not edit it, guests
    ///   included
    /// - [`AgoraError::Validation`] for an invalid title
    pub async fn update_title(&self, actor: &Actor, topic_id: TopicId, title: String) -> Result<Topic, AgoraError> {
        let (topic, forum) = load_topic(&self.forums, topic_id, Trashed::Include).await?;
        let subject = Authorizable::Topic {
            topic: &topic,
            forum: &forum,
        };
        let user = match actor.user() {
            Some(user) if self.permissions.can(actor, Action::ForumTopicEdit, subject) => user,
            _ => {
                return Err(ForbiddenError {
                    action: Action::ForumTopicEdit,
                }
                .into());
            }
        };
        topic::validate_title(&title)?;
        let title = title.trim().to_string();

        let log = (user.id != topic.user_id)
            .then(|| ModerationLogEntry::edit_title(&topic, &title, user.id, now()));
        self.forums
            .apply_change(topic_id, TopicChange::Rename(title), log)
            .await
    }

    /// Cast (or replace) the actor's poll votes.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::NotFound`] when the topic is missing or deleted
    /// - [`AgoraError::Forbidden`] / [`AgoraError::Unauthenticated`]
    /// - [`AgoraError::Validation`] when the ballot does not fit the poll
    pub async fn vote(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        option_ids: Vec<PollOptionId>,
    ) -> Result<Topic, AgoraError> {
        let (topic, forum) = load_topic(&self.forums, topic_id, Trashed::Exclude).await?;
        self.permissions.ensure_can(
            actor,
            Action::ForumTopicVote,
            Authorizable::Topic {
                topic: &topic,
                forum: &forum,
            },
        )?;
        let user = actor.require_user()?;
        let poll = topic.poll.as_ref().ok_or(ValidationError::NoPoll)?;

        let votes = self.forums.poll_votes(topic_id).await?;
        let already_voted = votes.iter().any(|vote| vote.user_id == user.id);
        let ballot = poll.validate_ballot(&option_ids, already_voted, now())?;
        self.forums
            .replace_poll_votes(topic_id, user.id, ballot)
            .await?;
        Ok(topic)
    }

    /// Add the actor's feature vote to a feature-request topic.
    ///
    /// # Errors
    ///
    /// - [`AgoraError::Unauthenticated`] for guests
    /// - [`AgoraError::NotFound`] when the topic is missing or deleted
    /// - [`AgoraError::Validation`] when the topic takes no feature votes or
    ///   the actor already voted
    pub async fn vote_feature(&self, actor: &Actor, topic_id: TopicId) -> Result<FeatureVote, AgoraError> {
        let user = actor.require_user()?;
        let (_, forum) = load_topic(&self.forums, topic_id, Trashed::Exclude).await?;
        if !forum.is_feature {
            return Err(ValidationError::NotFeatureTopic.into());
        }
        let votes = self.forums.feature_votes(topic_id).await?;
        if votes.iter().any(|vote| vote.user_id == user.id) {
            return Err(ValidationError::AlreadyVoted.into());
        }
        let kind = if user.is_supporter {
            FeatureVoteKind::Supporter
        } else {
            FeatureVoteKind::Voice
        };
        self.forums.add_feature_vote(topic_id, user.id, kind).await
    }

    async fn publish(&self, event: ForumEvent) {
        if let Err(err) = self.events.publish(event).await {
            warn!(error = %err, "failed to publish forum event");
        }
    }
}
