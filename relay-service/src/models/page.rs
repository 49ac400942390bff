use serde::Serialize;

/// Outcome of relaying a page fetch.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FetchResult {
    pub html: String,
    pub url: String,
    pub status: u16,
    pub content_type: String,
}

impl FetchResult {
    /// Upstream answered 404: the page is missing, the relay itself worked.
    pub fn not_found(url: &str) -> Self {
        Self {
            html: String::new(),
            url: url.to_string(),
            status: 404,
            content_type: "text/html".to_string(),
        }
    }
}
