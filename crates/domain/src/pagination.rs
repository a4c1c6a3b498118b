//! Cursor pagination over records keyed by a monotonically increasing id.
//!
//! A [`Window`] is one page of records fetched in a [`SortOrder`] strictly
//! beyond an optional [`Cursor`]. On a first view, an [`Anchor`] places the
//! page around a given key and a second window fetched in the opposite
//! direction supplies the preceding context; [`Window::stitch`] joins both
//! into a single ascending sequence.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A record that can be paginated by its identity key.
pub trait Keyed {
    /// Name of the key inside a structured cursor (`post_id`, `event_id`).
    const CURSOR_FIELD: &'static str;

    /// The identity key; grows with insertion order.
    fn key(&self) -> i64;
}

/// Direction in which a window walks the identity key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    IdAsc,
    IdDesc,
}

impl SortOrder {
    /// Every sort accepted from callers.
    pub const ALL: [Self; 2] = [Self::IdAsc, Self::IdDesc];

    /// Wire name of the sort.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IdAsc => "id_asc",
            Self::IdDesc => "id_desc",
        }
    }

    /// Look up a sort by its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sort| sort.as_str() == name)
    }

    /// Resolve a caller-supplied sort name; unknown or absent names fall
    /// back to `default`.
    #[must_use]
    pub fn resolve(name: Option<&str>, default: Self) -> Self {
        name.and_then(Self::from_name).unwrap_or(default)
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::IdAsc => Self::IdDesc,
            Self::IdDesc => Self::IdAsc,
        }
    }

    /// Whether `key` lies strictly past `cursor` when walking in this order.
    #[must_use]
    pub const fn is_beyond(self, key: i64, cursor: i64) -> bool {
        match self {
            Self::IdAsc => key > cursor,
            Self::IdDesc => key < cursor,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resumption point: the key of the last record already seen.
///
/// Serializes as `{"<field>": key}`; [`Cursor::to_token`] produces the
/// opaque URL-safe form of the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    field: &'static str,
    key: i64,
}

impl Cursor {
    #[must_use]
    pub const fn new(field: &'static str, key: i64) -> Self {
        Self { field, key }
    }

    /// Cursor pointing at `item`.
    #[must_use]
    pub fn encode<T: Keyed>(item: &T) -> Self {
        Self::new(T::CURSOR_FIELD, item.key())
    }

    #[must_use]
    pub const fn key(self) -> i64 {
        self.key
    }

    #[must_use]
    pub const fn field(self) -> &'static str {
        self.field
    }

    /// Decode a structured cursor. Anything but an object carrying an
    /// integer (or integer string) under `field` yields `None`.
    #[must_use]
    pub fn decode(field: &'static str, raw: &Value) -> Option<Self> {
        let key = match raw.as_object()?.get(field)? {
            Value::Number(number) => number.as_i64()?,
            Value::String(text) => text.trim().parse().ok()?,
            _ => return None,
        };
        Some(Self::new(field, key))
    }

    /// Decode the bare key of a `cursor[<field>]` request parameter.
    #[must_use]
    pub fn decode_param(field: &'static str, raw: &str) -> Option<Self> {
        raw.trim().parse().ok().map(|key| Self::new(field, key))
    }

    /// Decode an opaque token produced by [`Cursor::to_token`].
    #[must_use]
    pub fn decode_token(field: &'static str, token: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
        let value: Value = serde_json::from_slice(&bytes).ok()?;
        Self::decode(field, &value)
    }

    #[must_use]
    pub fn to_json(self) -> Value {
        let mut map = Map::new();
        map.insert(self.field.to_string(), Value::from(self.key));
        Value::Object(map)
    }

    #[must_use]
    pub fn to_token(self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_json().to_string())
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field, &self.key)?;
        map.end()
    }
}

/// Default and upper bound for a caller-requested page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitRule {
    pub default: usize,
    pub max: usize,
}

/// Forum posts: 20 by default, 50 at most.
pub const POST_LIMIT: LimitRule = LimitRule {
    default: 20,
    max: 50,
};

/// Match events: 100 by default, 101 at most.
pub const EVENT_LIMIT: LimitRule = LimitRule {
    default: 100,
    max: 101,
};

impl LimitRule {
    /// Clamp a requested size into `[1, max]`, using the default when absent.
    #[must_use]
    pub fn clamp(self, requested: Option<i64>) -> usize {
        let Some(requested) = requested else {
            return self.default;
        };
        let max = i64::try_from(self.max).unwrap_or(i64::MAX);
        usize::try_from(requested.clamp(1, max)).unwrap_or(self.default)
    }
}

/// Parameters of a single bounded, ordered range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowQuery {
    pub sort: SortOrder,
    /// Only keys strictly beyond this one (in `sort` direction) qualify.
    pub cursor: Option<i64>,
    pub limit: usize,
    pub include_deleted: bool,
}

impl WindowQuery {
    #[must_use]
    pub const fn new(sort: SortOrder, limit: usize) -> Self {
        Self {
            sort,
            cursor: None,
            limit,
            include_deleted: false,
        }
    }

    #[must_use]
    pub fn after(mut self, cursor: Option<Cursor>) -> Self {
        self.cursor = cursor.map(Cursor::key);
        self
    }

    #[must_use]
    pub const fn include_deleted(mut self, include_deleted: bool) -> Self {
        self.include_deleted = include_deleted;
        self
    }

    /// Whether a record with `key` falls inside the cursor restriction.
    #[must_use]
    pub fn admits(&self, key: i64) -> bool {
        self.cursor
            .is_none_or(|cursor| self.sort.is_beyond(key, cursor))
    }

    /// Same filter and limit, walking the other way from `key`.
    #[must_use]
    pub const fn opposite_from(&self, key: i64) -> Self {
        Self {
            sort: self.sort.reversed(),
            cursor: Some(key),
            limit: self.limit,
            include_deleted: self.include_deleted,
        }
    }
}

/// One page of records, kept in fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window<T> {
    items: Vec<T>,
    sort: SortOrder,
}

impl<T: Keyed> Window<T> {
    /// Wrap rows returned by a store for `query`, trimmed to its limit.
    #[must_use]
    pub fn from_fetch(mut items: Vec<T>, query: &WindowQuery) -> Self {
        items.truncate(query.limit);
        Self {
            items,
            sort: query.sort,
        }
    }

    /// Apply `query` to an unordered collection of already-visible records.
    #[must_use]
    pub fn select<I>(source: I, query: &WindowQuery) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut items: Vec<T> = source
            .into_iter()
            .filter(|item| query.admits(item.key()))
            .collect();
        match query.sort {
            SortOrder::IdAsc => items.sort_by_key(|item| item.key()),
            SortOrder::IdDesc => items.sort_by_key(|item| std::cmp::Reverse(item.key())),
        }
        Self::from_fetch(items, query)
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Key of the first record in fetch order.
    #[must_use]
    pub fn first_key(&self) -> Option<i64> {
        self.items.first().map(|item| item.key())
    }

    /// Cursor resuming strictly after the last record fetched; `None` once
    /// the window comes back empty.
    #[must_use]
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.items.last().map(Cursor::encode)
    }

    /// Query for the context preceding this window, unless the window
    /// already starts at `boundary` (the collection's first key in this
    /// window's direction) or is empty.
    #[must_use]
    pub fn context_query(&self, query: &WindowQuery, boundary: Option<i64>) -> Option<WindowQuery> {
        let first = self.first_key()?;
        if boundary == Some(first) {
            return None;
        }
        Some(query.opposite_from(first))
    }

    #[must_use]
    pub fn into_fetch_order(self) -> Vec<T> {
        self.items
    }

    /// Records ordered by ascending key.
    #[must_use]
    pub fn into_ascending(self) -> Vec<T> {
        let mut items = self.items;
        if self.sort == SortOrder::IdDesc {
            items.reverse();
        }
        items
    }

    /// Prepend `context` (fetched in the opposite direction from this
    /// window's first key) and return the whole run in ascending order.
    #[must_use]
    pub fn stitch(self, context: Option<Self>) -> Vec<T> {
        let mut items = context.map(|window| window.items).unwrap_or_default();
        items.reverse();
        items.extend(self.items);
        if self.sort == SortOrder::IdDesc {
            items.reverse();
        }
        items
    }
}

/// Key around which a first view is centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// No anchor: the default window from the beginning.
    Beginning,
    /// Show `key` and what follows it.
    Start(i64),
    /// Show `key` and what precedes it.
    End(i64),
}

impl Anchor {
    /// Cursor and sort of the primary window, or `None` for
    /// [`Anchor::Beginning`].
    #[must_use]
    pub const fn primary(self, field: &'static str) -> Option<(Cursor, SortOrder)> {
        match self {
            Self::Beginning => None,
            Self::Start(key) => Some((Cursor::new(field, key.saturating_sub(1)), SortOrder::IdAsc)),
            Self::End(key) => Some((Cursor::new(field, key.saturating_add(1)), SortOrder::IdDesc)),
        }
    }
}

/// The `start` parameter: a concrete key or the first unread record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAnchor {
    Unread,
    Key(i64),
}

impl StartAnchor {
    /// Parse `unread` or an integer; anything else is ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == "unread" {
            return Some(Self::Unread);
        }
        raw.parse().ok().map(Self::Key)
    }
}
