//! `SQLite` implementation of [`ForumRepository`].

use std::collections::BTreeSet;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use agora_app::ports::ForumRepository;
use agora_domain::error::{AgoraError, NotFoundError};
use agora_domain::feature_vote::{FeatureVote, FeatureVoteKind};
use agora_domain::forum::{Forum, ForumKind};
use agora_domain::id::{ForumId, PollOptionId, PostId, TopicId, UserId};
use agora_domain::moderation::{ModerationAction, ModerationLogEntry};
use agora_domain::pagination::WindowQuery;
use agora_domain::poll::{Poll, PollVote};
use agora_domain::post::{NewPost, Post};
use agora_domain::time::now;
use agora_domain::topic::{IssueTag, NewTopic, Topic, TopicChange, TopicType};

use crate::decode;
use crate::error::StorageError;
use crate::window;

struct ForumRow(Forum);

impl<'r> FromRow<'r, SqliteRow> for ForumRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;

        Ok(Self(Forum {
            id: ForumId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            kind: decode::parsed::<ForumKind>(&kind)?,
            enable_indexing: row.try_get("enable_indexing")?,
            is_help: row.try_get("is_help")?,
            is_feature: row.try_get("is_feature")?,
            is_issue: row.try_get("is_issue")?,
        }))
    }
}

struct TopicRow(Topic);

impl<'r> FromRow<'r, SqliteRow> for TopicRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let first_post_id: Option<i64> = row.try_get("first_post_id")?;
        let last_post_id: Option<i64> = row.try_get("last_post_id")?;
        let topic_type: i64 = row.try_get("topic_type")?;
        let issue_tags: String = row.try_get("issue_tags")?;
        let poll: Option<String> = row.try_get("poll")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(Self(Topic {
            id: TopicId::new(row.try_get("id")?),
            forum_id: ForumId::new(row.try_get("forum_id")?),
            title: row.try_get("title")?,
            user_id: UserId::new(row.try_get("user_id")?),
            first_post_id: first_post_id.map(PostId::new),
            last_post_id: last_post_id.map(PostId::new),
            post_count: row.try_get("post_count")?,
            topic_type: TopicType::try_from(topic_type).map_err(decode::error)?,
            is_locked: row.try_get("is_locked")?,
            issue_tags: decode::json::<BTreeSet<IssueTag>>(&issue_tags)?,
            poll: poll.as_deref().map(decode::json::<Poll>).transpose()?,
            created_at: decode::time(&created_at)?,
            updated_at: decode::time(&updated_at)?,
            deleted_at: decode::optional_time(row.try_get("deleted_at")?)?,
        }))
    }
}

struct PostRow(Post);

impl<'r> FromRow<'r, SqliteRow> for PostRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(Post {
            id: PostId::new(row.try_get("id")?),
            topic_id: TopicId::new(row.try_get("topic_id")?),
            forum_id: ForumId::new(row.try_get("forum_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            body: row.try_get("body")?,
            created_at: decode::time(&created_at)?,
            edited_at: decode::optional_time(row.try_get("edited_at")?)?,
            deleted_at: decode::optional_time(row.try_get("deleted_at")?)?,
        }))
    }
}

struct FeatureVoteRow(FeatureVote);

impl<'r> FromRow<'r, SqliteRow> for FeatureVoteRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(FeatureVote {
            topic_id: TopicId::new(row.try_get("topic_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            username: row.try_get("username")?,
            kind: decode::parsed::<FeatureVoteKind>(&kind)?,
            created_at: decode::time(&created_at)?,
        }))
    }
}

struct LogRow(ModerationLogEntry);

impl<'r> FromRow<'r, SqliteRow> for LogRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let action: String = row.try_get("action")?;
        let context: String = row.try_get("context")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(ModerationLogEntry {
            action: ModerationAction::from_code(&action)
                .ok_or_else(|| decode::error(format!("unknown moderation action `{action}`")))?,
            context: decode::json(&context)?,
            forum_id: ForumId::new(row.try_get("forum_id")?),
            topic_id: TopicId::new(row.try_get("topic_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            created_at: decode::time(&created_at)?,
        }))
    }
}

const SELECT_FORUM: &str = "SELECT * FROM forums WHERE id = ?";
const SELECT_TOPIC: &str = "SELECT * FROM topics WHERE id = ?";

const INSERT_TOPIC: &str = r"
    INSERT INTO topics (forum_id, title, user_id, post_count, poll, created_at, updated_at)
    VALUES (?, ?, ?, 1, ?, ?, ?)
";

const INSERT_POST: &str = r"
    INSERT INTO posts (topic_id, forum_id, user_id, body, created_at)
    VALUES (?, ?, ?, ?, ?)
";

const SET_FIRST_POST: &str =
    "UPDATE topics SET first_post_id = ?, last_post_id = ? WHERE id = ?";

const BUMP_TOPIC: &str = r"
    UPDATE topics
    SET last_post_id = ?, post_count = post_count + 1, updated_at = ?
    WHERE id = ?
";

const UPDATE_TOPIC: &str = r"
    UPDATE topics
    SET forum_id = ?, title = ?, topic_type = ?, is_locked = ?, issue_tags = ?, poll = ?,
        updated_at = ?, deleted_at = ?
    WHERE id = ?
";

const MOVE_POSTS: &str = "UPDATE posts SET forum_id = ? WHERE topic_id = ?";

const NTH_POST: &str = r"
    SELECT id FROM posts
    WHERE topic_id = ? AND (? OR deleted_at IS NULL)
    ORDER BY id LIMIT 1 OFFSET ?
";

const POST_POSITION: &str = r"
    SELECT COUNT(*) FROM posts
    WHERE topic_id = ? AND (? OR deleted_at IS NULL) AND id <= ?
";

const SELECT_POLL_VOTES: &str =
    "SELECT user_id, option_id FROM poll_votes WHERE topic_id = ? ORDER BY rowid";
const DELETE_POLL_VOTES: &str = "DELETE FROM poll_votes WHERE topic_id = ?";
const DELETE_USER_POLL_VOTES: &str = "DELETE FROM poll_votes WHERE topic_id = ? AND user_id = ?";
const INSERT_POLL_VOTE: &str =
    "INSERT INTO poll_votes (topic_id, user_id, option_id) VALUES (?, ?, ?)";

const SELECT_FEATURE_VOTES: &str = r"
    SELECT v.topic_id, v.user_id, v.kind, v.created_at, u.username
    FROM feature_votes v LEFT JOIN users u ON u.id = v.user_id
    WHERE v.topic_id = ?
    ORDER BY v.rowid
";

const SELECT_FEATURE_VOTE: &str = r"
    SELECT v.topic_id, v.user_id, v.kind, v.created_at, u.username
    FROM feature_votes v LEFT JOIN users u ON u.id = v.user_id
    WHERE v.topic_id = ? AND v.user_id = ?
";

const INSERT_FEATURE_VOTE: &str =
    "INSERT INTO feature_votes (topic_id, user_id, kind, created_at) VALUES (?, ?, ?, ?)";

const INSERT_LOG: &str = r"
    INSERT INTO moderation_log (action, context, forum_id, topic_id, user_id, created_at)
    VALUES (?, ?, ?, ?, ?, ?)
";

const SELECT_LOG: &str = "SELECT * FROM moderation_log WHERE topic_id = ? ORDER BY id";

/// `SQLite`-backed forum repository.
pub struct SqliteForumRepository {
    pool: SqlitePool,
}

impl SqliteForumRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn select_topic(conn: &mut SqliteConnection, id: TopicId) -> Result<Option<Topic>, StorageError> {
    let row: Option<TopicRow> = sqlx::query_as(SELECT_TOPIC)
        .bind(id.get())
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|w| w.0))
}

async fn write_topic(conn: &mut SqliteConnection, topic: &Topic) -> Result<(), StorageError> {
    let issue_tags = serde_json::to_string(&topic.issue_tags)?;
    let poll = topic.poll.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query(UPDATE_TOPIC)
        .bind(topic.forum_id.get())
        .bind(&topic.title)
        .bind(topic.topic_type.code())
        .bind(topic.is_locked)
        .bind(issue_tags)
        .bind(poll)
        .bind(topic.updated_at.to_rfc3339())
        .bind(topic.deleted_at.map(|at| at.to_rfc3339()))
        .bind(topic.id.get())
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_log(conn: &mut SqliteConnection, entry: &ModerationLogEntry) -> Result<(), StorageError> {
    sqlx::query(INSERT_LOG)
        .bind(entry.action.code())
        .bind(serde_json::to_string(&entry.context)?)
        .bind(entry.forum_id.get())
        .bind(entry.topic_id.get())
        .bind(entry.user_id.get())
        .bind(entry.created_at.to_rfc3339())
        .execute(conn)
        .await?;
    Ok(())
}

impl ForumRepository for SqliteForumRepository {
    async fn get_forum(&self, id: ForumId) -> Result<Option<Forum>, AgoraError> {
        let row: Option<ForumRow> = sqlx::query_as(SELECT_FORUM)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, AgoraError> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::from)?;
        Ok(select_topic(&mut conn, id).await?)
    }

    async fn fetch_posts(&self, topic_id: TopicId, query: WindowQuery) -> Result<Vec<Post>, AgoraError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM posts WHERE topic_id = ");
        builder.push_bind(topic_id.get());
        if !query.include_deleted {
            builder.push(" AND deleted_at IS NULL");
        }
        window::push(&mut builder, "id", &query);

        let rows: Vec<PostRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn nth_post_id(
        &self,
        topic_id: TopicId,
        position: i64,
        include_deleted: bool,
    ) -> Result<Option<PostId>, AgoraError> {
        if position < 1 {
            return Ok(None);
        }
        let id: Option<i64> = sqlx::query_scalar(NTH_POST)
            .bind(topic_id.get())
            .bind(include_deleted)
            .bind(position - 1)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(id.map(PostId::new))
    }

    async fn post_position(
        &self,
        topic_id: TopicId,
        post_id: PostId,
        include_deleted: bool,
    ) -> Result<i64, AgoraError> {
        let position: i64 = sqlx::query_scalar(POST_POSITION)
            .bind(topic_id.get())
            .bind(include_deleted)
            .bind(post_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(position)
    }

    async fn create_topic(&self, new: NewTopic) -> Result<(Topic, Post), AgoraError> {
        let at = now();
        let poll = new
            .poll
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StorageError::from)?;

        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let topic_id = sqlx::query(INSERT_TOPIC)
            .bind(new.forum_id.get())
            .bind(&new.title)
            .bind(new.user_id.get())
            .bind(poll)
            .bind(at.to_rfc3339())
            .bind(at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?
            .last_insert_rowid();
        let post_id = sqlx::query(INSERT_POST)
            .bind(topic_id)
            .bind(new.forum_id.get())
            .bind(new.user_id.get())
            .bind(&new.body)
            .bind(at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?
            .last_insert_rowid();
        sqlx::query(SET_FIRST_POST)
            .bind(post_id)
            .bind(post_id)
            .bind(topic_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        let topic = select_topic(&mut tx, TopicId::new(topic_id))
            .await?
            .ok_or(StorageError::MissingRow("topic"))?;
        tx.commit().await.map_err(StorageError::from)?;

        let post = Post {
            id: PostId::new(post_id),
            topic_id: topic.id,
            forum_id: new.forum_id,
            user_id: new.user_id,
            body: new.body,
            created_at: at,
            edited_at: None,
            deleted_at: None,
        };
        Ok((topic, post))
    }

    async fn create_post(&self, new: NewPost) -> Result<Post, AgoraError> {
        let at = now();

        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let post_id = sqlx::query(INSERT_POST)
            .bind(new.topic_id.get())
            .bind(new.forum_id.get())
            .bind(new.user_id.get())
            .bind(&new.body)
            .bind(at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?
            .last_insert_rowid();
        sqlx::query(BUMP_TOPIC)
            .bind(post_id)
            .bind(at.to_rfc3339())
            .bind(new.topic_id.get())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;

        Ok(Post {
            id: PostId::new(post_id),
            topic_id: new.topic_id,
            forum_id: new.forum_id,
            user_id: new.user_id,
            body: new.body,
            created_at: at,
            edited_at: None,
            deleted_at: None,
        })
    }

    async fn apply_change(
        &self,
        topic_id: TopicId,
        change: TopicChange,
        log: Option<ModerationLogEntry>,
    ) -> Result<Topic, AgoraError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let Some(mut topic) = select_topic(&mut tx, topic_id).await? else {
            return Err(NotFoundError {
                entity: "Topic",
                id: topic_id.to_string(),
            }
            .into());
        };

        let replaces_poll = matches!(change, TopicChange::ReplacePoll(_));
        let destination = match change {
            TopicChange::Move(forum_id) => Some(forum_id),
            _ => None,
        };
        topic.apply(change, now());
        write_topic(&mut tx, &topic).await?;

        if replaces_poll {
            sqlx::query(DELETE_POLL_VOTES)
                .bind(topic_id.get())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        if let Some(forum_id) = destination {
            sqlx::query(MOVE_POSTS)
                .bind(forum_id.get())
                .bind(topic_id.get())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        if let Some(entry) = &log {
            insert_log(&mut tx, entry).await?;
        }
        tx.commit().await.map_err(StorageError::from)?;

        Ok(topic)
    }

    async fn poll_votes(&self, topic_id: TopicId) -> Result<Vec<PollVote>, AgoraError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(SELECT_POLL_VOTES)
            .bind(topic_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows
            .into_iter()
            .map(|(user_id, option_id)| PollVote {
                user_id: UserId::new(user_id),
                option_id: PollOptionId::new(option_id),
            })
            .collect())
    }

    async fn replace_poll_votes(
        &self,
        topic_id: TopicId,
        user_id: UserId,
        option_ids: Vec<PollOptionId>,
    ) -> Result<(), AgoraError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        sqlx::query(DELETE_USER_POLL_VOTES)
            .bind(topic_id.get())
            .bind(user_id.get())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        for option_id in option_ids {
            sqlx::query(INSERT_POLL_VOTE)
                .bind(topic_id.get())
                .bind(user_id.get())
                .bind(option_id.get())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn feature_votes(&self, topic_id: TopicId) -> Result<Vec<FeatureVote>, AgoraError> {
        let rows: Vec<FeatureVoteRow> = sqlx::query_as(SELECT_FEATURE_VOTES)
            .bind(topic_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn add_feature_vote(
        &self,
        topic_id: TopicId,
        user_id: UserId,
        kind: FeatureVoteKind,
    ) -> Result<FeatureVote, AgoraError> {
        sqlx::query(INSERT_FEATURE_VOTE)
            .bind(topic_id.get())
            .bind(user_id.get())
            .bind(kind.as_str())
            .bind(now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let row: FeatureVoteRow = sqlx::query_as(SELECT_FEATURE_VOTE)
            .bind(topic_id.get())
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.0)
    }

    async fn moderation_log(&self, topic_id: TopicId) -> Result<Vec<ModerationLogEntry>, AgoraError> {
        let rows: Vec<LogRow> = sqlx::query_as(SELECT_LOG)
            .bind(topic_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use agora_domain::pagination::SortOrder;
    use agora_domain::poll::PollDraft;

    async fn setup() -> (SqliteForumRepository, SqlitePool) {
        let pool = fixtures::pool().await;
        fixtures::user(&pool, 1, "poster").await;
        fixtures::user(&pool, 2, "voter").await;
        fixtures::forum(&pool, 1, "Help").await;
        fixtures::forum(&pool, 2, "Off-topic").await;
        (SqliteForumRepository::new(pool.clone()), pool)
    }

    fn new_topic(title: &str) -> NewTopic {
        NewTopic {
            forum_id: ForumId::new(1),
            user_id: UserId::new(1),
            title: title.to_string(),
            body: "first".to_string(),
            poll: None,
        }
    }

    async fn topic_with_posts(repo: &SqliteForumRepository, replies: usize) -> Topic {
        let (topic, _) = repo.create_topic(new_topic("Thread")).await.unwrap();
        for index in 0..replies {
            repo.create_post(NewPost {
                topic_id: topic.id,
                forum_id: topic.forum_id,
                user_id: UserId::new(2),
                body: format!("reply {index}"),
            })
            .await
            .unwrap();
        }
        repo.get_topic(topic.id).await.unwrap().unwrap()
    }

    fn keys(posts: &[Post]) -> Vec<i64> {
        posts.iter().map(|p| p.id.get()).collect()
    }

    #[tokio::test]
    async fn should_create_topic_with_first_post() {
        let (repo, _) = setup().await;

        let (topic, post) = repo.create_topic(new_topic("Hello")).await.unwrap();

        assert_eq!(topic.first_post_id, Some(post.id));
        assert_eq!(topic.last_post_id, Some(post.id));
        assert_eq!(topic.post_count, 1);
        assert_eq!(post.topic_id, topic.id);
    }

    #[tokio::test]
    async fn should_bump_topic_on_reply() {
        let (repo, _) = setup().await;

        let topic = topic_with_posts(&repo, 2).await;

        assert_eq!(topic.post_count, 3);
        assert_eq!(topic.last_post_id, Some(PostId::new(3)));
    }

    #[tokio::test]
    async fn should_fetch_windows_in_both_directions() {
        let (repo, _) = setup().await;
        let topic = topic_with_posts(&repo, 9).await;

        let ascending = repo
            .fetch_posts(
                topic.id,
                WindowQuery {
                    sort: SortOrder::IdAsc,
                    cursor: Some(3),
                    limit: 4,
                    include_deleted: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(keys(&ascending), vec![4, 5, 6, 7]);

        let descending = repo
            .fetch_posts(
                topic.id,
                WindowQuery {
                    sort: SortOrder::IdDesc,
                    cursor: Some(3),
                    limit: 4,
                    include_deleted: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(keys(&descending), vec![2, 1]);
    }

    #[tokio::test]
    async fn should_skip_deleted_posts_unless_included() {
        let (repo, pool) = setup().await;
        let topic = topic_with_posts(&repo, 3).await;
        fixtures::delete_post(&pool, 2).await;

        let visible = repo
            .fetch_posts(topic.id, WindowQuery::new(SortOrder::IdAsc, 10))
            .await
            .unwrap();
        assert_eq!(keys(&visible), vec![1, 3, 4]);

        let all = repo
            .fetch_posts(
                topic.id,
                WindowQuery::new(SortOrder::IdAsc, 10).include_deleted(true),
            )
            .await
            .unwrap();
        assert_eq!(keys(&all), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn should_count_positions_among_visible_posts() {
        let (repo, pool) = setup().await;
        let topic = topic_with_posts(&repo, 4).await;
        fixtures::delete_post(&pool, 2).await;

        assert_eq!(
            repo.nth_post_id(topic.id, 2, false).await.unwrap(),
            Some(PostId::new(3))
        );
        assert_eq!(
            repo.nth_post_id(topic.id, 2, true).await.unwrap(),
            Some(PostId::new(2))
        );
        assert_eq!(repo.nth_post_id(topic.id, 0, true).await.unwrap(), None);
        assert_eq!(repo.nth_post_id(topic.id, 9, true).await.unwrap(), None);
        assert_eq!(
            repo.post_position(topic.id, PostId::new(4), false)
                .await
                .unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn should_write_change_and_log_together() {
        let (repo, _) = setup().await;
        let topic = topic_with_posts(&repo, 0).await;
        let entry = ModerationLogEntry::lock(&topic, true, UserId::new(2), now());

        let locked = repo
            .apply_change(topic.id, TopicChange::Lock(true), Some(entry))
            .await
            .unwrap();

        assert!(locked.is_locked);
        assert!(repo.get_topic(topic.id).await.unwrap().unwrap().is_locked);
        let log = repo.moderation_log(topic.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, ModerationAction::Lock);
        assert_eq!(log[0].context, serde_json::json!(["Thread"]));
    }

    #[tokio::test]
    async fn should_roll_back_change_when_log_write_fails() {
        let (repo, pool) = setup().await;
        let topic = topic_with_posts(&repo, 0).await;
        sqlx::query("DROP TABLE moderation_log")
            .execute(&pool)
            .await
            .unwrap();
        let entry = ModerationLogEntry::lock(&topic, true, UserId::new(2), now());

        let result = repo
            .apply_change(topic.id, TopicChange::Lock(true), Some(entry))
            .await;

        assert!(matches!(result, Err(AgoraError::Storage(_))));
        assert!(!repo.get_topic(topic.id).await.unwrap().unwrap().is_locked);
    }

    #[tokio::test]
    async fn should_move_topic_posts_along() {
        let (repo, _) = setup().await;
        let topic = topic_with_posts(&repo, 1).await;

        repo.apply_change(topic.id, TopicChange::Move(ForumId::new(2)), None)
            .await
            .unwrap();

        let posts = repo
            .fetch_posts(topic.id, WindowQuery::new(SortOrder::IdAsc, 10))
            .await
            .unwrap();
        assert!(posts.iter().all(|p| p.forum_id == ForumId::new(2)));
    }

    #[tokio::test]
    async fn should_store_issue_tags_and_poll() {
        let (repo, _) = setup().await;
        let topic = topic_with_posts(&repo, 0).await;
        let poll = PollDraft {
            title: "Which?".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            ..PollDraft::default()
        }
        .into_poll(now())
        .unwrap();

        repo.apply_change(
            topic.id,
            TopicChange::IssueTag {
                tag: IssueTag::Confirmed,
                enabled: true,
            },
            None,
        )
        .await
        .unwrap();
        repo.apply_change(topic.id, TopicChange::ReplacePoll(poll.clone()), None)
            .await
            .unwrap();

        let stored = repo.get_topic(topic.id).await.unwrap().unwrap();
        assert!(stored.has_tag(IssueTag::Confirmed));
        assert_eq!(stored.poll.map(|p| p.title), Some(poll.title));
    }

    #[tokio::test]
    async fn should_replace_only_the_voters_ballot() {
        let (repo, _) = setup().await;
        let topic = topic_with_posts(&repo, 0).await;
        let option = PollOptionId::new;

        repo.replace_poll_votes(topic.id, UserId::new(1), vec![option(1)])
            .await
            .unwrap();
        repo.replace_poll_votes(topic.id, UserId::new(2), vec![option(1)])
            .await
            .unwrap();
        repo.replace_poll_votes(topic.id, UserId::new(2), vec![option(2)])
            .await
            .unwrap();

        let votes = repo.poll_votes(topic.id).await.unwrap();
        assert_eq!(votes.len(), 2);
        assert!(votes.contains(&PollVote {
            user_id: UserId::new(2),
            option_id: option(2)
        }));
    }

    #[tokio::test]
    async fn should_drop_votes_when_poll_is_replaced() {
        let (repo, _) = setup().await;
        let topic = topic_with_posts(&repo, 0).await;
        repo.replace_poll_votes(topic.id, UserId::new(2), vec![PollOptionId::new(1)])
            .await
            .unwrap();
        let poll = PollDraft {
            title: "Again".to_string(),
            options: vec!["x".to_string(), "y".to_string()],
            ..PollDraft::default()
        }
        .into_poll(now())
        .unwrap();

        repo.apply_change(topic.id, TopicChange::ReplacePoll(poll), None)
            .await
            .unwrap();

        assert!(repo.poll_votes(topic.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_record_feature_votes_with_voter_names() {
        let (repo, _) = setup().await;
        let topic = topic_with_posts(&repo, 0).await;

        let vote = repo
            .add_feature_vote(topic.id, UserId::new(2), FeatureVoteKind::Supporter)
            .await
            .unwrap();

        assert_eq!(vote.username.as_deref(), Some("voter"));
        let votes = repo.feature_votes(topic.id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].kind, FeatureVoteKind::Supporter);
    }

    #[tokio::test]
    async fn should_return_none_for_unknown_topic() {
        let (repo, _) = setup().await;
        assert!(repo.get_topic(TopicId::new(404)).await.unwrap().is_none());
    }
}
