//! In-memory port implementations shared by service tests.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex};

use agora_domain::error::{AgoraError, NotFoundError};
use agora_domain::event::ForumEvent;
use agora_domain::feature_vote::{FeatureVote, FeatureVoteKind};
use agora_domain::forum::Forum;
use agora_domain::id::{
    ForumId, GameId, MatchEventId, MatchId, PollOptionId, PostId, TopicId, UserId,
};
use agora_domain::matches::{Match, MatchEvent};
use agora_domain::moderation::ModerationLogEntry;
use agora_domain::pagination::{Window, WindowQuery};
use agora_domain::poll::PollVote;
use agora_domain::post::{NewPost, Post};
use agora_domain::time::now;
use agora_domain::topic::{NewTopic, Topic, TopicChange, TopicType};
use agora_domain::user::User;

use crate::ports::{
    EventPublisher, ForumRepository, MatchRepository, ReadMarkerRepository, UserRepository,
};

#[derive(Default)]
pub struct State {
    pub users: HashMap<UserId, User>,
    pub forums: HashMap<ForumId, Forum>,
    pub topics: BTreeMap<TopicId, Topic>,
    pub posts: BTreeMap<PostId, Post>,
    pub poll_votes: Vec<(TopicId, PollVote)>,
    pub feature_votes: Vec<FeatureVote>,
    pub log: Vec<ModerationLogEntry>,
    pub reads: HashMap<(UserId, TopicId), PostId>,
    pub matches: HashMap<MatchId, Match>,
    pub events: BTreeMap<MatchEventId, MatchEvent>,
    pub published: Vec<ForumEvent>,
    /// Make the next `apply_change` fail.
    pub fail_next_change: bool,
}

/// One shared in-memory store implementing every port.
#[derive(Clone, Default)]
pub struct InMemory {
    pub state: Arc<Mutex<State>>,
}

impl InMemory {
    pub fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn add_user(&self, user: User) {
        self.with(|s| s.users.insert(user.id, user));
    }

    pub fn add_forum(&self, forum: Forum) {
        self.with(|s| s.forums.insert(forum.id, forum));
    }

    /// Seed a topic with `posts` posts numbered `first_post..`.
    pub fn add_topic(&self, id: i64, forum: i64, owner: i64, first_post: i64, posts: i64) -> Topic {
        let topic = Topic {
            id: TopicId::new(id),
            forum_id: ForumId::new(forum),
            title: format!("Topic {id}"),
            user_id: UserId::new(owner),
            first_post_id: (posts > 0).then(|| PostId::new(first_post)),
            last_post_id: (posts > 0).then(|| PostId::new(first_post + posts - 1)),
            post_count: posts,
            topic_type: TopicType::Normal,
            is_locked: false,
            issue_tags: std::collections::BTreeSet::new(),
            poll: None,
            created_at: now(),
            updated_at: now(),
            deleted_at: None,
        };
        self.with(|s| {
            for key in first_post..first_post + posts {
                s.posts.insert(
                    PostId::new(key),
                    Post {
                        id: PostId::new(key),
                        topic_id: topic.id,
                        forum_id: topic.forum_id,
                        user_id: UserId::new(owner),
                        body: format!("post {key}"),
                        created_at: now(),
                        edited_at: None,
                        deleted_at: None,
                    },
                );
            }
            s.topics.insert(topic.id, topic.clone());
        });
        topic
    }

    pub fn update_topic(&self, id: i64, f: impl FnOnce(&mut Topic)) {
        self.with(|s| {
            if let Some(topic) = s.topics.get_mut(&TopicId::new(id)) {
                f(topic);
            }
        });
    }

    pub fn delete_post(&self, id: i64) {
        self.with(|s| {
            if let Some(post) = s.posts.get_mut(&PostId::new(id)) {
                post.deleted_at = Some(now());
            }
        });
    }

    pub fn log(&self) -> Vec<ModerationLogEntry> {
        self.with(|s| s.log.clone())
    }

    fn visible_posts(state: &State, topic_id: TopicId, include_deleted: bool) -> Vec<Post> {
        state
            .posts
            .values()
            .filter(|post| post.topic_id == topic_id)
            .filter(|post| include_deleted || !post.is_deleted())
            .cloned()
            .collect()
    }
}

fn ready<T: Send>(value: T) -> impl Future<Output = T> + Send {
    async move { value }
}

impl ForumRepository for InMemory {
    fn get_forum(&self, id: ForumId) -> impl Future<Output = Result<Option<Forum>, AgoraError>> + Send {
        ready(Ok(self.with(|s| s.forums.get(&id).cloned())))
    }

    fn get_topic(&self, id: TopicId) -> impl Future<Output = Result<Option<Topic>, AgoraError>> + Send {
        ready(Ok(self.with(|s| s.topics.get(&id).cloned())))
    }

    fn fetch_posts(
        &self,
        topic_id: TopicId,
        query: WindowQuery,
    ) -> impl Future<Output = Result<Vec<Post>, AgoraError>> + Send {
        let posts = self.with(|s| Self::visible_posts(s, topic_id, query.include_deleted));
        ready(Ok(Window::select(posts, &query).into_fetch_order()))
    }

    fn nth_post_id(
        &self,
        topic_id: TopicId,
        position: i64,
        include_deleted: bool,
    ) -> impl Future<Output = Result<Option<PostId>, AgoraError>> + Send {
        let posts = self.with(|s| Self::visible_posts(s, topic_id, include_deleted));
        let found = usize::try_from(position - 1)
            .ok()
            .and_then(|index| posts.get(index))
            .map(|post| post.id);
        ready(Ok(found))
    }

    fn post_position(
        &self,
        topic_id: TopicId,
        post_id: PostId,
        include_deleted: bool,
    ) -> impl Future<Output = Result<i64, AgoraError>> + Send {
        let posts = self.with(|s| Self::visible_posts(s, topic_id, include_deleted));
        let position = posts.iter().filter(|post| post.id <= post_id).count();
        ready(Ok(i64::try_from(position).unwrap()))
    }

    fn create_topic(&self, new: NewTopic) -> impl Future<Output = Result<(Topic, Post), AgoraError>> + Send {
        let result = self.with(|s| {
            let topic_id = TopicId::new(s.topics.keys().last().map_or(1, |id| id.get() + 1));
            let post_id = PostId::new(s.posts.keys().last().map_or(1, |id| id.get() + 1));
            let post = Post {
                id: post_id,
                topic_id,
                forum_id: new.forum_id,
                user_id: new.user_id,
                body: new.body,
                created_at: now(),
                edited_at: None,
                deleted_at: None,
            };
            let topic = Topic {
                id: topic_id,
                forum_id: new.forum_id,
                title: new.title,
                user_id: new.user_id,
                first_post_id: Some(post_id),
                last_post_id: Some(post_id),
                post_count: 1,
                topic_type: TopicType::Normal,
                is_locked: false,
                issue_tags: std::collections::BTreeSet::new(),
                poll: new.poll,
                created_at: now(),
                updated_at: now(),
                deleted_at: None,
            };
            s.posts.insert(post_id, post.clone());
            s.topics.insert(topic_id, topic.clone());
            (topic, post)
        });
        ready(Ok(result))
    }

    fn create_post(&self, new: NewPost) -> impl Future<Output = Result<Post, AgoraError>> + Send {
        let post = self.with(|s| {
            let post_id = PostId::new(s.posts.keys().last().map_or(1, |id| id.get() + 1));
            let post = Post {
                id: post_id,
                topic_id: new.topic_id,
                forum_id: new.forum_id,
                user_id: new.user_id,
                body: new.body,
                created_at: now(),
                edited_at: None,
                deleted_at: None,
            };
            s.posts.insert(post_id, post.clone());
            if let Some(topic) = s.topics.get_mut(&new.topic_id) {
                topic.last_post_id = Some(post_id);
                topic.post_count += 1;
            }
            post
        });
        ready(Ok(post))
    }

    fn apply_change(
        &self,
        topic_id: TopicId,
        change: TopicChange,
        log: Option<ModerationLogEntry>,
    ) -> impl Future<Output = Result<Topic, AgoraError>> + Send {
        let result = self.with(|s| {
            if std::mem::take(&mut s.fail_next_change) {
                return Err(AgoraError::Storage("injected failure".into()));
            }
            let topic = s.topics.get_mut(&topic_id).ok_or_else(|| NotFoundError {
                entity: "Topic",
                id: topic_id.to_string(),
            })?;
            let replaces_poll = matches!(change, TopicChange::ReplacePoll(_));
            topic.apply(change, now());
            let topic = topic.clone();
            if replaces_poll {
                s.poll_votes.retain(|(id, _)| *id != topic_id);
            }
            if let Some(entry) = log {
                s.log.push(entry);
            }
            Ok(topic)
        });
        ready(result)
    }

    fn poll_votes(&self, topic_id: TopicId) -> impl Future<Output = Result<Vec<PollVote>, AgoraError>> + Send {
        let votes = self.with(|s| {
            s.poll_votes
                .iter()
                .filter(|(id, _)| *id == topic_id)
                .map(|(_, vote)| *vote)
                .collect()
        });
        ready(Ok(votes))
    }

    fn replace_poll_votes(
        &self,
        topic_id: TopicId,
        user_id: UserId,
        option_ids: Vec<PollOptionId>,
    ) -> impl Future<Output = Result<(), AgoraError>> + Send {
        self.with(|s| {
            s.poll_votes
                .retain(|(id, vote)| !(*id == topic_id && vote.user_id == user_id));
            s.poll_votes.extend(
                option_ids
                    .into_iter()
                    .map(|option_id| (topic_id, PollVote { user_id, option_id })),
            );
        });
        ready(Ok(()))
    }

    fn feature_votes(&self, topic_id: TopicId) -> impl Future<Output = Result<Vec<FeatureVote>, AgoraError>> + Send {
        let votes = self.with(|s| {
            s.feature_votes
                .iter()
                .filter(|vote| vote.topic_id == topic_id)
                .cloned()
                .collect()
        });
        ready(Ok(votes))
    }

    fn add_feature_vote(
        &self,
        topic_id: TopicId,
        user_id: UserId,
        kind: FeatureVoteKind,
    ) -> impl Future<Output = Result<FeatureVote, AgoraError>> + Send {
        let vote = self.with(|s| {
            let vote = FeatureVote {
                topic_id,
                user_id,
                username: s.users.get(&user_id).map(|user| user.username.clone()),
                kind,
                created_at: now(),
            };
            s.feature_votes.push(vote.clone());
            vote
        });
        ready(Ok(vote))
    }

    fn moderation_log(
        &self,
        topic_id: TopicId,
    ) -> impl Future<Output = Result<Vec<ModerationLogEntry>, AgoraError>> + Send {
        let entries = self.with(|s| {
            s.log
                .iter()
                .filter(|entry| entry.topic_id == topic_id)
                .cloned()
                .collect()
        });
        ready(Ok(entries))
    }
}

impl UserRepository for InMemory {
    fn get_by_id(&self, id: UserId) -> impl Future<Output = Result<Option<User>, AgoraError>> + Send {
        ready(Ok(self.with(|s| s.users.get(&id).cloned())))
    }

    fn get_many(&self, ids: Vec<UserId>) -> impl Future<Output = Result<Vec<User>, AgoraError>> + Send {
        let users = self.with(|s| ids.iter().filter_map(|id| s.users.get(id).cloned()).collect());
        ready(Ok(users))
    }
}

impl MatchRepository for InMemory {
    fn get_match(&self, id: MatchId) -> impl Future<Output = Result<Option<Match>, AgoraError>> + Send {
        ready(Ok(self.with(|s| s.matches.get(&id).cloned())))
    }

    fn fetch_events(
        &self,
        match_id: MatchId,
        query: WindowQuery,
    ) -> impl Future<Output = Result<Vec<MatchEvent>, AgoraError>> + Send {
        let events: Vec<MatchEvent> = self.with(|s| {
            s.events
                .values()
                .filter(|event| event.match_id == match_id)
                .cloned()
                .collect()
        });
        ready(Ok(Window::select(events, &query).into_fetch_order()))
    }

    fn first_event_id(
        &self,
        match_id: MatchId,
    ) -> impl Future<Output = Result<Option<MatchEventId>, AgoraError>> + Send {
        let id = self.with(|s| {
            s.events
                .values()
                .find(|event| event.match_id == match_id)
                .map(|event| event.id)
        });
        ready(Ok(id))
    }

    fn latest_event_id(
        &self,
        match_id: MatchId,
    ) -> impl Future<Output = Result<Option<MatchEventId>, AgoraError>> + Send {
        let id = self.with(|s| {
            s.events
                .values()
                .filter(|event| event.match_id == match_id)
                .map(|event| event.id)
                .last()
        });
        ready(Ok(id))
    }

    fn current_game_id(
        &self,
        match_id: MatchId,
    ) -> impl Future<Output = Result<Option<GameId>, AgoraError>> + Send {
        let id = self.with(|s| {
            s.events
                .values()
                .filter(|event| event.match_id == match_id)
                .filter_map(|event| event.game.as_ref())
                .filter(|game| game.end_time.is_none())
                .map(|game| game.id)
                .last()
        });
        ready(Ok(id))
    }
}

impl ReadMarkerRepository for InMemory {
    fn last_read(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> impl Future<Output = Result<Option<PostId>, AgoraError>> + Send {
        ready(Ok(self.with(|s| s.reads.get(&(user_id, topic_id)).copied())))
    }

    fn mark_read(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        post_id: PostId,
    ) -> impl Future<Output = Result<(), AgoraError>> + Send {
        self.with(|s| {
            let marker = s.reads.entry((user_id, topic_id)).or_insert(post_id);
            *marker = (*marker).max(post_id);
        });
        ready(Ok(()))
    }
}

impl EventPublisher for InMemory {
    fn publish(&self, event: ForumEvent) -> impl Future<Output = Result<(), AgoraError>> + Send {
        self.with(|s| s.published.push(event));
        ready(Ok(()))
    }
}
