//! Askama templates shared by the web handlers.

use std::collections::HashMap;

use askama::Template;
use axum::response::{Html, IntoResponse, Response};

use agora_app::services::topic_service::{PageContext, TopicView};
use agora_domain::feature_vote::FeatureVoteTally;
use agora_domain::id::UserId;
use agora_domain::pagination::Cursor;
use agora_domain::poll::PollSummary;
use agora_domain::post::Post;
use agora_domain::user::UserCompact;

/// Shown in place of an author that no longer exists.
const DELETED_USER: &str = "[deleted user]";

/// One rendered post.
pub struct PostRow {
    pub id: i64,
    pub position: i64,
    pub author: String,
    pub body: String,
    pub created_at: String,
    pub deleted: bool,
}

/// Number `posts` from `first_position`, resolving author names.
#[must_use]
pub fn post_rows(posts: Vec<Post>, users: &[UserCompact], first_position: i64) -> Vec<PostRow> {
    let names: HashMap<UserId, &str> = users
        .iter()
        .map(|user| (user.id, user.username.as_str()))
        .collect();

    posts
        .into_iter()
        .zip(first_position..)
        .map(|(post, position)| PostRow {
            id: post.id.get(),
            position,
            author: names
                .get(&post.user_id)
                .copied()
                .unwrap_or(DELETED_USER)
                .to_string(),
            deleted: post.is_deleted(),
            created_at: post.created_at.to_rfc3339(),
            body: post.body,
        })
        .collect()
}

/// Posts fragment appended by infinite scrolling and replies.
#[derive(Template)]
#[template(path = "topic_posts.html")]
pub struct PostsTemplate {
    pub posts: Vec<PostRow>,
    /// Opaque cursor of the next window; empty at the end.
    pub next_cursor: String,
}

impl IntoResponse for PostsTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

pub struct OptionRow {
    pub id: i64,
    pub text: String,
    pub votes: String,
    pub chosen: bool,
}

/// Poll block of a topic page; also answered by a poll edit.
#[derive(Template)]
#[template(path = "poll.html")]
pub struct PollTemplate {
    pub topic_id: i64,
    pub title: String,
    pub options: Vec<OptionRow>,
    pub total_votes: String,
    pub results_hidden: bool,
    pub max_options: u32,
    pub ends_at: String,
    pub is_open: bool,
    pub can_edit: bool,
}

impl PollTemplate {
    #[must_use]
    pub fn new(topic_id: i64, summary: PollSummary, can_edit: bool) -> Self {
        let count = |votes: Option<u64>| votes.map_or_else(|| "?".to_string(), |n| n.to_string());
        let options = summary
            .options
            .into_iter()
            .map(|option| OptionRow {
                chosen: summary.user_votes.contains(&option.id),
                id: option.id.get(),
                votes: count(option.votes),
                text: option.text,
            })
            .collect();

        Self {
            topic_id,
            title: summary.title,
            options,
            total_votes: count(summary.total_votes),
            results_hidden: summary.results_hidden,
            max_options: summary.max_options,
            ends_at: summary
                .ends_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
            is_open: summary.is_open,
            can_edit,
        }
    }
}

impl IntoResponse for PollTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// Full topic page.
#[derive(Template)]
#[template(path = "topic_show.html")]
pub struct TopicTemplate {
    pub topic_id: i64,
    pub title: String,
    pub forum_id: i64,
    pub forum_name: String,
    pub noindex: bool,
    pub locked: bool,
    pub deleted: bool,
    pub user_can_moderate: bool,
    pub show_deleted: bool,
    /// Post to scroll to; `0` for none.
    pub jump_to: i64,
    /// Rendered [`PollTemplate`]; empty without a poll.
    pub poll_html: String,
    pub feature_votes: Vec<FeatureVoteTally>,
    pub posts: PostsTemplate,
}

impl TopicTemplate {
    /// Render a page view. `page` is the context of [`TopicView::page`].
    #[must_use]
    pub fn new(view: TopicView, page: PageContext) -> Self {
        let topic_id = view.topic.id.get();
        let poll_html = page
            .poll
            .map(|summary| PollTemplate::new(topic_id, summary, page.can_edit_poll).to_string())
            .unwrap_or_default();

        Self {
            topic_id,
            deleted: view.topic.is_deleted(),
            locked: view.topic.is_locked,
            title: view.topic.title,
            forum_id: view.forum.id.get(),
            forum_name: view.forum.name,
            noindex: page.noindex,
            user_can_moderate: view.user_can_moderate,
            show_deleted: view.show_deleted,
            jump_to: page.jump_to.map_or(0, |id| id.get()),
            poll_html,
            feature_votes: page.feature_votes,
            posts: PostsTemplate {
                posts: post_rows(view.posts, &view.users, page.first_post_position),
                next_cursor: next_cursor(view.cursor),
            },
        }
    }
}

impl IntoResponse for TopicTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// Match page embedding the event history as JSON.
#[derive(Template)]
#[template(path = "match_show.html")]
pub struct MatchTemplate {
    pub name: String,
    /// Serialized history, safe to place inside a `<script>` element.
    pub json: String,
    /// Event to scroll to; `0` for none.
    pub jump_to: i64,
}

impl IntoResponse for MatchTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

#[must_use]
pub fn next_cursor(cursor: Option<Cursor>) -> String {
    cursor.map(Cursor::to_token).unwrap_or_default()
}

/// Escape JSON for a `<script>` element: no `</` may close it early.
#[must_use]
pub fn script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}
