//! Storage port: repository traits for persistence.

use std::future::Future;

use agora_domain::error::AgoraError;
use agora_domain::feature_vote::{FeatureVote, FeatureVoteKind};
use agora_domain::forum::Forum;
use agora_domain::id::{ForumId, GameId, MatchEventId, MatchId, PollOptionId, PostId, TopicId, UserId};
use agora_domain::matches::{Match, MatchEvent};
use agora_domain::moderation::ModerationLogEntry;
use agora_domain::pagination::WindowQuery;
use agora_domain::poll::PollVote;
use agora_domain::post::{NewPost, Post};
use agora_domain::topic::{NewTopic, Topic, TopicChange};
use agora_domain::user::User;

/// Forums, topics, posts and everything hanging off a topic.
pub trait ForumRepository {
    fn get_forum(
        &self,
        id: ForumId,
    ) -> impl Future<Output = Result<Option<Forum>, AgoraError>> + Send;

    /// Look up a topic, soft-deleted or not.
    fn get_topic(
        &self,
        id: TopicId,
    ) -> impl Future<Output = Result<Option<Topic>, AgoraError>> + Send;

    /// One window of a topic's posts, in `query.sort` order.
    fn fetch_posts(
        &self,
        topic_id: TopicId,
        query: WindowQuery,
    ) -> impl Future<Output = Result<Vec<Post>, AgoraError>> + Send;

    /// Id of the post at 1-indexed `position` among the visible posts.
    fn nth_post_id(
        &self,
        topic_id: TopicId,
        position: i64,
        include_deleted: bool,
    ) -> impl Future<Output = Result<Option<PostId>, AgoraError>> + Send;

    /// 1-indexed position of `post_id` among the visible posts.
    fn post_position(
        &self,
        topic_id: TopicId,
        post_id: PostId,
        include_deleted: bool,
    ) -> impl Future<Output = Result<i64, AgoraError>> + Send;

    /// Create a topic and its first post.
    fn create_topic(
        &self,
        topic: NewTopic,
    ) -> impl Future<Output = Result<(Topic, Post), AgoraError>> + Send;

    /// Append a post and bump the topic's last post.
    fn create_post(&self, post: NewPost) -> impl Future<Output = Result<Post, AgoraError>> + Send;

    /// Apply `change` and write `log` atomically; neither is persisted when
    /// either fails.
    fn apply_change(
        &self,
        topic_id: TopicId,
        change: TopicChange,
        log: Option<ModerationLogEntry>,
    ) -> impl Future<Output = Result<Topic, AgoraError>> + Send;

    fn poll_votes(
        &self,
        topic_id: TopicId,
    ) -> impl Future<Output = Result<Vec<PollVote>, AgoraError>> + Send;

    /// Replace every vote `user_id` cast on the topic's poll.
    fn replace_poll_votes(
        &self,
        topic_id: TopicId,
        user_id: UserId,
        option_ids: Vec<PollOptionId>,
    ) -> impl Future<Output = Result<(), AgoraError>> + Send;

    /// Feature votes on a topic, oldest first, with voter names.
    fn feature_votes(
        &self,
        topic_id: TopicId,
    ) -> impl Future<Output = Result<Vec<FeatureVote>, AgoraError>> + Send;

    fn add_feature_vote(
        &self,
        topic_id: TopicId,
        user_id: UserId,
        kind: FeatureVoteKind,
    ) -> impl Future<Output = Result<FeatureVote, AgoraError>> + Send;

    /// Audit entries recorded against a topic, oldest first.
    fn moderation_log(
        &self,
        topic_id: TopicId,
    ) -> impl Future<Output = Result<Vec<ModerationLogEntry>, AgoraError>> + Send;
}

pub trait UserRepository {
    fn get_by_id(&self, id: UserId)
    -> impl Future<Output = Result<Option<User>, AgoraError>> + Send;

    /// Users matching `ids`; unknown ids are skipped.
    fn get_many(
        &self,
        ids: Vec<UserId>,
    ) -> impl Future<Output = Result<Vec<User>, AgoraError>> + Send;
}

pub trait MatchRepository {
    fn get_match(
        &self,
        id: MatchId,
    ) -> impl Future<Output = Result<Option<Match>, AgoraError>> + Send;

    /// One window of a match's events (with games and scores).
    fn fetch_events(
        &self,
        match_id: MatchId,
        query: WindowQuery,
    ) -> impl Future<Output = Result<Vec<MatchEvent>, AgoraError>> + Send;

    fn first_event_id(
        &self,
        match_id: MatchId,
    ) -> impl Future<Output = Result<Option<MatchEventId>, AgoraError>> + Send;

    fn latest_event_id(
        &self,
        match_id: MatchId,
    ) -> impl Future<Output = Result<Option<MatchEventId>, AgoraError>> + Send;

    /// Latest game of the match that has not ended.
    fn current_game_id(
        &self,
        match_id: MatchId,
    ) -> impl Future<Output = Result<Option<GameId>, AgoraError>> + Send;
}

/// Per-user reading progress in topics.
pub trait ReadMarkerRepository {
    fn last_read(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> impl Future<Output = Result<Option<PostId>, AgoraError>> + Send;

    /// Move the marker forward to `post_id`; never moves it back.
    fn mark_read(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        post_id: PostId,
    ) -> impl Future<Output = Result<(), AgoraError>> + Send;
}
