//! Translation of a [`WindowQuery`] into SQL.

use agora_domain::pagination::{SortOrder, WindowQuery};
use sqlx::{QueryBuilder, Sqlite};

/// Append the cursor restriction, ordering and limit of `query` on
/// `column` to a statement whose `WHERE` clause is already open.
pub(crate) fn push(builder: &mut QueryBuilder<'_, Sqlite>, column: &'static str, query: &WindowQuery) {
    let (comparison, direction) = match query.sort {
        SortOrder::IdAsc => (" > ", " ASC"),
        SortOrder::IdDesc => (" < ", " DESC"),
    };
    if let Some(cursor) = query.cursor {
        builder
            .push(" AND ")
            .push(column)
            .push(comparison)
            .push_bind(cursor);
    }
    builder
        .push(" ORDER BY ")
        .push(column)
        .push(direction)
        .push(" LIMIT ")
        .push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_restrict_descending_window_below_cursor() {
        let mut builder = QueryBuilder::new("SELECT * FROM posts WHERE topic_id = 1");
        let query = WindowQuery {
            sort: SortOrder::IdDesc,
            cursor: Some(40),
            limit: 20,
            include_deleted: false,
        };

        push(&mut builder, "id", &query);

        assert_eq!(
            builder.sql(),
            "SELECT * FROM posts WHERE topic_id = 1 AND id < ? ORDER BY id DESC LIMIT ?"
        );
    }

    #[test]
    fn should_omit_cursor_clause_without_cursor() {
        let mut builder = QueryBuilder::new("SELECT * FROM match_events WHERE match_id = 1");

        push(&mut builder, "id", &WindowQuery::new(SortOrder::IdAsc, 5));

        assert_eq!(
            builder.sql(),
            "SELECT * FROM match_events WHERE match_id = 1 ORDER BY id ASC LIMIT ?"
        );
    }
}
