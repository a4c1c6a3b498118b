//! `SQLite` implementation of [`UserRepository`].

use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use agora_app::ports::UserRepository;
use agora_domain::error::AgoraError;
use agora_domain::id::{ForumId, UserId};
use agora_domain::user::{User, UserPreferences};

use crate::error::StorageError;

/// Users are decoded without their moderated forums, which live in their
/// own table.
struct Wrapper(User);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(User {
            id: UserId::new(row.try_get("id")?),
            username: row.try_get("username")?,
            country_code: row.try_get("country_code")?,
            is_admin: row.try_get("is_admin")?,
            is_supporter: row.try_get("is_supporter")?,
            is_restricted: row.try_get("is_restricted")?,
            moderated_forums: Vec::new(),
            preferences: UserPreferences {
                forum_posts_show_deleted: row.try_get("forum_posts_show_deleted")?,
            },
        }))
    }
}

/// `SQLite`-backed user repository.
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load(&self, ids: &[UserId]) -> Result<Vec<User>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.get());
        }
        separated.push_unseparated(")");
        let rows: Vec<Wrapper> = builder.build_query_as().fetch_all(&self.pool).await?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT user_id, forum_id FROM forum_moderators WHERE user_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.get());
        }
        separated.push_unseparated(") ORDER BY forum_id");
        let moderators: Vec<(i64, i64)> = builder.build_query_as().fetch_all(&self.pool).await?;

        let mut users: HashMap<UserId, User> = rows.into_iter().map(|w| (w.0.id, w.0)).collect();
        for (user_id, forum_id) in moderators {
            if let Some(user) = users.get_mut(&UserId::new(user_id)) {
                user.moderated_forums.push(ForumId::new(forum_id));
            }
        }
        Ok(ids.iter().filter_map(|id| users.remove(id)).collect())
    }
}

impl UserRepository for SqliteUserRepository {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, AgoraError> {
        Ok(self.load(&[id]).await?.pop())
    }

    async fn get_many(&self, ids: Vec<UserId>) -> Result<Vec<User>, AgoraError> {
        Ok(self.load(&ids).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    async fn setup() -> SqliteUserRepository {
        let pool = fixtures::pool().await;
        fixtures::user(&pool, 1, "peppy").await;
        fixtures::user(&pool, 2, "cookiezi").await;
        fixtures::forum(&pool, 5, "Help").await;
        fixtures::forum(&pool, 6, "Bugs").await;
        sqlx::query("INSERT INTO forum_moderators (forum_id, user_id) VALUES (6, 1), (5, 1)")
            .execute(&pool)
            .await
            .unwrap();
        SqliteUserRepository::new(pool)
    }

    #[tokio::test]
    async fn should_load_user_with_moderated_forums() {
        let repo = setup().await;

        let user = repo.get_by_id(UserId::new(1)).await.unwrap().unwrap();

        assert_eq!(user.username, "peppy");
        assert_eq!(user.country_code, "AU");
        assert_eq!(user.moderated_forums, vec![ForumId::new(5), ForumId::new(6)]);
        assert!(user.moderates(ForumId::new(6)));
    }

    #[tokio::test]
    async fn should_return_none_for_unknown_user() {
        let repo = setup().await;
        assert!(repo.get_by_id(UserId::new(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_keep_requested_order_and_skip_unknown_ids() {
        let repo = setup().await;

        let users = repo
            .get_many(vec![UserId::new(2), UserId::new(42), UserId::new(1)])
            .await
            .unwrap();

        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["cookiezi", "peppy"]);
    }
}
