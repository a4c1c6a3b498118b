//! Windowed fetching against a repository, and the first-view assembly of
//! two windows around an anchor.

use std::future::Future;

use tracing::debug;

use agora_domain::error::AgoraError;
use agora_domain::pagination::{Cursor, Keyed, SortOrder, Window, WindowQuery};

/// Anything that can answer a [`WindowQuery`] for one collection.
pub trait WindowSource<T> {
    fn fetch(&self, query: WindowQuery) -> impl Future<Output = Result<Vec<T>, AgoraError>> + Send;
}

/// First and last keys of a collection, used to decide whether a window
/// already starts at the edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Boundaries {
    pub first: Option<i64>,
    pub last: Option<i64>,
}

impl Boundaries {
    /// Key a window walking in `sort` begins at when unrestricted.
    #[must_use]
    pub const fn start_for(self, sort: SortOrder) -> Option<i64> {
        match sort {
            SortOrder::IdAsc => self.first,
            SortOrder::IdDesc => self.last,
        }
    }
}

/// Run one windowed fetch.
///
/// # Errors
///
/// Propagates the source's error.
pub async fn fetch<T, S>(source: &S, query: WindowQuery) -> Result<Window<T>, AgoraError>
where
    T: Keyed,
    S: WindowSource<T>,
{
    debug!(
        sort = %query.sort,
        cursor = ?query.cursor,
        limit = query.limit,
        include_deleted = query.include_deleted,
        "fetching window"
    );
    let items = source.fetch(query).await?;
    Ok(Window::from_fetch(items, &query))
}

/// Result of assembling a first view.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled<T> {
    /// Context followed by the primary window, ascending.
    pub items: Vec<T>,
    /// First key of the primary window.
    pub jump_to: Option<i64>,
    /// Resumes after the primary window.
    pub next_cursor: Option<Cursor>,
}

/// Fetch the primary window for `query` and, unless it starts at the
/// collection boundary, the context window in the opposite direction.
///
/// # Errors
///
/// Propagates the source's error.
pub async fn assemble<T, S>(
    source: &S,
    query: WindowQuery,
    boundaries: Boundaries,
) -> Result<Assembled<T>, AgoraError>
where
    T: Keyed,
    S: WindowSource<T>,
{
    let primary = fetch(source, query).await?;
    let jump_to = primary.first_key();
    let next_cursor = primary.next_cursor();

    let context = match primary.context_query(&query, boundaries.start_for(query.sort)) {
        Some(context_query) => Some(fetch(source, context_query).await?),
        None => None,
    };

    Ok(Assembled {
        items: primary.stitch(context),
        jump_to,
        next_cursor,
    })
}
