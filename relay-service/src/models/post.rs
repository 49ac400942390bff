use serde::{Deserialize, Serialize};

/// A previously scraped article, as supplied by the dashboard.
///
/// Every field is optional; the relay only renders what it is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Post {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

const ELLIPSIS: &str = "...";

/// Cut `text` to at most `max_chars` characters. A cut text ends with an
/// ellipsis, which counts towards the limit.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let end = text
        .char_indices()
        .nth(keep)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(text.len());
    format!("{}{}", text[..end].trim_end(), ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("Peppol update", 200), "Peppol update");
    }

    #[test]
    fn long_text_is_cut_at_character_boundary() {
        let text = "é".repeat(250);
        let cut = truncate_chars(&text, 200);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 200);
        assert_eq!(cut.trim_end_matches("...").chars().count(), 197);
    }

    #[test]
    fn exact_length_is_not_marked() {
        let text = "a".repeat(200);
        assert_eq!(truncate_chars(&text, 200), text);
    }

    #[test]
    fn one_char_over_limit_is_cut() {
        let text = "b".repeat(201);
        let cut = truncate_chars(&text, 200);
        assert_eq!(cut, format!("{}...", "b".repeat(197)));
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let post: Post = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        assert_eq!(post.title.as_deref(), Some("Only a title"));
        assert!(post.url.is_none());
        assert!(post.summary.is_none());
    }
}
