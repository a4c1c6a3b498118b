//! Typed request parameters, one struct per endpoint.
//!
//! Values that do not parse are treated as absent rather than rejected, so a
//! stray `limit=abc` falls back to the default page size.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use agora_app::services::match_service::HistoryParams;
use agora_app::services::topic_service::ShowParams;
use agora_domain::id::{ForumId, PollOptionId};
use agora_domain::pagination::{Cursor, Keyed, StartAnchor};
use agora_domain::poll::PollDraft;
use agora_domain::post::Post;

/// Parsed value, or `None` when absent or malformed.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_bool))
}

/// `true` only when present and truthy.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_bool(deserializer)?.unwrap_or(false))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Query of the post viewer, page and JSON alike.
#[derive(Debug, Default, Deserialize)]
pub struct ShowQuery {
    /// Structured cursor; wins over `cursor_string`.
    #[serde(rename = "cursor[post_id]")]
    pub cursor_post_id: Option<String>,
    pub cursor_string: Option<String>,
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub with_deleted: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub n: Option<i64>,
    /// Post id or `unread`.
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub end: Option<i64>,
    #[serde(default, deserialize_with = "flag")]
    pub skip_layout: bool,
}

impl From<ShowQuery> for ShowParams {
    fn from(query: ShowQuery) -> Self {
        let cursor = query
            .cursor_post_id
            .as_deref()
            .and_then(|raw| Cursor::decode_param(Post::CURSOR_FIELD, raw))
            .or_else(|| {
                query
                    .cursor_string
                    .as_deref()
                    .and_then(|token| Cursor::decode_token(Post::CURSOR_FIELD, token))
            });

        Self {
            cursor,
            sort: query.sort,
            limit: query.limit,
            with_deleted: query.with_deleted,
            n: query.n,
            start: query.start.as_deref().and_then(StartAnchor::parse),
            end: query.end,
            skip_layout: query.skip_layout,
        }
    }
}

/// Query of the match history endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default, deserialize_with = "lenient")]
    pub after: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub before: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub limit: Option<i64>,
}

impl From<HistoryQuery> for HistoryParams {
    fn from(query: HistoryQuery) -> Self {
        Self {
            after: query.after,
            before: query.before,
            limit: query.limit,
        }
    }
}

/// Query of the match page: an optional event to open at, else a history
/// window.
#[derive(Debug, Default, Deserialize)]
pub struct MatchShowQuery {
    #[serde(default, deserialize_with = "lenient")]
    pub event: Option<i64>,
    #[serde(flatten)]
    pub window: HistoryQuery,
}

/// Poll fields (`forum_topic_poll[...]`). Options arrive one per line of a
/// text area.
#[derive(Debug, Default, Deserialize)]
pub struct PollForm {
    #[serde(rename = "forum_topic_poll[title]", default)]
    pub title: String,
    #[serde(rename = "forum_topic_poll[options]", default)]
    pub options: String,
    #[serde(
        rename = "forum_topic_poll[max_options]",
        default,
        deserialize_with = "lenient"
    )]
    pub max_options: Option<u32>,
    #[serde(
        rename = "forum_topic_poll[length_days]",
        default,
        deserialize_with = "lenient"
    )]
    pub length_days: Option<u32>,
    #[serde(
        rename = "forum_topic_poll[hide_results]",
        default,
        deserialize_with = "flag"
    )]
    pub hide_results: bool,
    #[serde(
        rename = "forum_topic_poll[vote_change]",
        default,
        deserialize_with = "flag"
    )]
    pub vote_change: bool,
}

impl From<PollForm> for PollDraft {
    fn from(form: PollForm) -> Self {
        let defaults = Self::default();
        Self {
            title: form.title,
            options: form.options.lines().map(str::to_string).collect(),
            max_options: form.max_options.unwrap_or(defaults.max_options),
            length_days: form.length_days.unwrap_or(defaults.length_days),
            hide_results: form.hide_results,
            vote_change: form.vote_change,
        }
    }
}

/// New topic form; the poll block is read only with `with_poll`.
#[derive(Debug, Default, Deserialize)]
pub struct StoreForm {
    #[serde(default, deserialize_with = "lenient")]
    pub forum_id: Option<ForumId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, deserialize_with = "flag")]
    pub with_poll: bool,
    #[serde(flatten)]
    pub poll: PollForm,
}

impl StoreForm {
    #[must_use]
    pub fn poll(self) -> Option<PollDraft> {
        self.with_poll.then(|| self.poll.into())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplyForm {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateForm {
    #[serde(rename = "forum_topic[topic_title]", default)]
    pub title: String,
}

/// Lock form. A missing or unreadable `lock` unlocks.
#[derive(Debug, Default, Deserialize)]
pub struct LockForm {
    #[serde(default, deserialize_with = "flag")]
    pub lock: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct PinForm {
    #[serde(default, deserialize_with = "lenient")]
    pub pin: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MoveForm {
    #[serde(default, deserialize_with = "lenient")]
    pub destination_forum_id: Option<ForumId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueTagForm {
    pub issue_tag: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub state: bool,
}

/// Ballot form. Checkboxes repeat `forum_topic_vote[option_ids][]` once per
/// ticked option, which a derived struct cannot collect, so the pairs are
/// walked by hand.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VoteForm {
    pub option_ids: Vec<PollOptionId>,
}

const VOTE_OPTION_KEY: &str = "forum_topic_vote[option_ids]";

impl<'de> Deserialize<'de> for VoteForm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VoteVisitor;

        impl<'de> Visitor<'de> for VoteVisitor {
            type Value = VoteForm;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a ballot form")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut form = VoteForm::default();
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    if key.strip_suffix("[]").unwrap_or(&key) == VOTE_OPTION_KEY {
                        form.option_ids.extend(value.parse::<PollOptionId>().ok());
                    }
                }
                Ok(form)
            }
        }

        deserializer.deserialize_map(VoteVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    fn parse<T: serde::de::DeserializeOwned>(query: &str) -> T {
        let uri: Uri = format!("/?{query}").parse().unwrap();
        Query::<T>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn should_ignore_values_that_do_not_parse() {
        let show = ShowParams::from(parse::<ShowQuery>("limit=lots&n=3&with_deleted=maybe"));

        assert_eq!(show.limit, None);
        assert_eq!(show.n, Some(3));
        assert_eq!(show.with_deleted, None);
    }

    #[test]
    fn should_read_structured_cursor_before_token() {
        let token = Cursor::new("post_id", 9).to_token();
        let show = ShowParams::from(parse::<ShowQuery>(&format!(
            "cursor_string={token}&cursor%5Bpost_id%5D=4"
        )));

        assert_eq!(show.cursor.map(Cursor::key), Some(4));
    }

    #[test]
    fn should_fall_back_to_cursor_token() {
        let token = Cursor::new("post_id", 9).to_token();
        let show = ShowParams::from(parse::<ShowQuery>(&format!("cursor_string={token}")));

        assert_eq!(show.cursor.map(Cursor::key), Some(9));
    }

    #[test]
    fn should_parse_unread_start_and_layout_flag() {
        let show = ShowParams::from(parse::<ShowQuery>("start=unread&skip_layout=1"));

        assert_eq!(show.start, Some(StartAnchor::Unread));
        assert!(show.skip_layout);
    }

    #[test]
    fn should_split_poll_options_into_lines() {
        let form = parse::<StoreForm>(
            "with_poll=1\
             &forum_topic_poll%5Btitle%5D=Best+mode%3F\
             &forum_topic_poll%5Boptions%5D=osu!%0D%0Ataiko%0A%0Acatch\
             &forum_topic_poll%5Bmax_options%5D=2\
             &forum_topic_poll%5Bhide_results%5D=on",
        );
        let draft = form.poll().unwrap();

        assert_eq!(draft.title, "Best mode?");
        assert_eq!(draft.options, vec!["osu!", "taiko", "", "catch"]);
        assert_eq!(draft.max_options, 2);
        assert_eq!(draft.length_days, 0);
        assert!(draft.hide_results);
        assert!(!draft.vote_change);
    }

    #[test]
    fn should_skip_poll_without_flag() {
        let form = parse::<StoreForm>("forum_id=3&title=Hi&forum_topic_poll%5Btitle%5D=Ignored");

        assert_eq!(form.forum_id, Some(ForumId::new(3)));
        assert!(form.poll().is_none());
    }

    #[test]
    fn should_collect_repeated_ballot_values() {
        let form = parse::<VoteForm>(
            "forum_topic_vote%5Boption_ids%5D%5B%5D=1\
             &forum_topic_vote%5Boption_ids%5D%5B%5D=x\
             &forum_topic_vote%5Boption_ids%5D%5B%5D=3",
        );

        assert_eq!(form.option_ids, vec![PollOptionId::new(1), PollOptionId::new(3)]);
    }

    #[test]
    fn should_read_history_bounds() {
        let history = HistoryParams::from(parse::<HistoryQuery>("before=120&limit=0"));

        assert_eq!(history.after, None);
        assert_eq!(history.before, Some(120));
        assert_eq!(history.limit, Some(0));
    }

    #[test]
    fn should_read_match_window_next_to_event() {
        let query = parse::<MatchShowQuery>("after=4&limit=oops");

        assert_eq!(query.event, None);
        assert_eq!(query.window.after, Some(4));
        assert_eq!(query.window.limit, None);
    }

    #[test]
    fn should_unlock_when_lock_is_missing() {
        assert!(!parse::<LockForm>("").lock);
        assert!(!parse::<LockForm>("lock=0").lock);
        assert!(parse::<LockForm>("lock=1").lock);
    }

    #[test]
    fn should_leave_missing_moderation_values_absent() {
        assert_eq!(parse::<PinForm>("pin=two").pin, None);
        assert_eq!(parse::<MoveForm>("").destination_forum_id, None);
        assert_eq!(
            parse::<MoveForm>("destination_forum_id=2").destination_forum_id,
            Some(ForumId::new(2))
        );
    }
}
