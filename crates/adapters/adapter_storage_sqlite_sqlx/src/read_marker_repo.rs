//! `SQLite` implementation of [`ReadMarkerRepository`].

use sqlx::SqlitePool;

use agora_app::ports::ReadMarkerRepository;
use agora_domain::error::AgoraError;
use agora_domain::id::{PostId, TopicId, UserId};

use crate::error::StorageError;

const SELECT: &str = "SELECT post_id FROM topic_reads WHERE user_id = ? AND topic_id = ?";

const UPSERT: &str = r"
    INSERT INTO topic_reads (user_id, topic_id, post_id) VALUES (?, ?, ?)
    ON CONFLICT (user_id, topic_id) DO UPDATE SET post_id = MAX(post_id, excluded.post_id)
";

/// `SQLite`-backed read markers.
pub struct SqliteReadMarkerRepository {
    pool: SqlitePool,
}

impl SqliteReadMarkerRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ReadMarkerRepository for SqliteReadMarkerRepository {
    async fn last_read(&self, user_id: UserId, topic_id: TopicId) -> Result<Option<PostId>, AgoraError> {
        let post_id: Option<i64> = sqlx::query_scalar(SELECT)
            .bind(user_id.get())
            .bind(topic_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(post_id.map(PostId::new))
    }

    async fn mark_read(&self, user_id: UserId, topic_id: TopicId, post_id: PostId) -> Result<(), AgoraError> {
        sqlx::query(UPSERT)
            .bind(user_id.get())
            .bind(topic_id.get())
            .bind(post_id.get())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    async fn setup() -> SqliteReadMarkerRepository {
        let pool = fixtures::pool().await;
        fixtures::forum(&pool, 1, "General").await;
        sqlx::query(
            "INSERT INTO topics (id, forum_id, title, user_id, created_at, updated_at) \
             VALUES (7, 1, 'Hi', 1, '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')",
        )
        .execute(&pool)
        .await
        .unwrap();
        SqliteReadMarkerRepository::new(pool)
    }

    #[tokio::test]
    async fn should_have_no_marker_before_reading() {
        let repo = setup().await;
        let marker = repo.last_read(UserId::new(1), TopicId::new(7)).await.unwrap();
        assert_eq!(marker, None);
    }

    #[tokio::test]
    async fn should_only_move_marker_forward() {
        let repo = setup().await;
        let (user, topic) = (UserId::new(1), TopicId::new(7));

        repo.mark_read(user, topic, PostId::new(30)).await.unwrap();
        repo.mark_read(user, topic, PostId::new(12)).await.unwrap();
        assert_eq!(repo.last_read(user, topic).await.unwrap(), Some(PostId::new(30)));

        repo.mark_read(user, topic, PostId::new(31)).await.unwrap();
        assert_eq!(repo.last_read(user, topic).await.unwrap(), Some(PostId::new(31)));
    }
}
