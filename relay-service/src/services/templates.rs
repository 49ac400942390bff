//! HTML email bodies.
//!
//! Markup lives in `templates/`; this module only prepares the data. Values
//! are HTML-escaped by askama.

use crate::models::post::{truncate_chars, Post};
use askama::Template;
use chrono::Utc;

pub const SUMMARY_MAX_CHARS: usize = 200;
pub const REPORT_PREVIEW_LIMIT: usize = 5;

const UNTITLED: &str = "Untitled post";

/// One rendered post card.
#[derive(Debug, Clone)]
pub struct PostCard {
    pub title: String,
    pub url: String,
    pub date: String,
    pub summary: String,
}

impl From<&Post> for PostCard {
    fn from(post: &Post) -> Self {
        let non_empty = |field: &Option<String>| {
            field
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let title = non_empty(&post.title);
        Self {
            title: if title.is_empty() {
                UNTITLED.to_string()
            } else {
                title
            },
            url: non_empty(&post.url),
            date: non_empty(&post.date),
            summary: truncate_chars(&non_empty(&post.summary), SUMMARY_MAX_CHARS),
        }
    }
}

#[derive(Template)]
#[template(path = "digest_email.html")]
pub struct DigestEmail {
    pub count: usize,
    pub posts: Vec<PostCard>,
    pub generated_at: String,
}

#[derive(Template)]
#[template(path = "report_email.html")]
pub struct ReportEmail {
    pub total: usize,
    pub preview: Vec<PostCard>,
    pub remaining: usize,
    pub file_name: String,
    pub trigger: &'static str,
    pub generated_at: String,
}

#[derive(Template)]
#[template(path = "test_email.html")]
pub struct TestEmail {
    pub sender: String,
    pub server: String,
    pub sent_at: String,
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M UTC").to_string()
}

impl DigestEmail {
    /// `count` is the badge number; the dashboard may count more new posts
    /// than it sends.
    pub fn new(posts: &[Post], count: Option<usize>) -> Self {
        Self {
            count: count.unwrap_or(posts.len()),
            posts: posts.iter().map(PostCard::from).collect(),
            generated_at: timestamp(),
        }
    }
}

impl ReportEmail {
    pub fn new(posts: &[Post], total: Option<usize>, file_name: &str, is_manual: bool) -> Self {
        let total = total.unwrap_or(posts.len()).max(posts.len());
        let preview: Vec<PostCard> = posts
            .iter()
            .take(REPORT_PREVIEW_LIMIT)
            .map(PostCard::from)
            .collect();

        Self {
            remaining: total - preview.len(),
            total,
            preview,
            file_name: file_name.to_string(),
            trigger: if is_manual {
                "Manual export"
            } else {
                "Scheduled report"
            },
            generated_at: timestamp(),
        }
    }
}

impl TestEmail {
    pub fn new(sender: &str, server: &str) -> Self {
        Self {
            sender: sender.to_string(),
            server: server.to_string(),
            sent_at: timestamp(),
        }
    }
}
