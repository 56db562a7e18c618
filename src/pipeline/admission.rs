//! Cheap local checks deciding whether a message is worth any LLM work.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::Config;
use crate::platform::{IncomingMessage, MessageKind};

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^\s]+|www\.[^\s]+").expect("URL pattern is valid")
});

/// Why a message was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    BotAuthor,
    Empty,
    LinksOnly,
    MentionOnly,
    SystemMessage,
}

impl std::fmt::Display for FilterReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FilterReason::BotAuthor => "bot author",
            FilterReason::Empty => "empty message",
            FilterReason::LinksOnly => "links only",
            FilterReason::MentionOnly => "mention only",
            FilterReason::SystemMessage => "system message",
        };
        write!(f, "{}", s)
    }
}

/// Applies the admission rules in order and returns the first that matches.
pub fn check(message: &IncomingMessage, config: &Config) -> Option<FilterReason> {
    let content = message.content.trim();

    if config.ignore_bots && message.author_is_bot {
        return Some(FilterReason::BotAuthor);
    }

    if content.is_empty() && message.embed_count == 0 && message.attachments.is_empty() {
        return Some(FilterReason::Empty);
    }

    if config.ignore_links_only && is_links_only(content, config.link_residue_min) {
        return Some(FilterReason::LinksOnly);
    }

    if config.mention_only_filter && is_mention_only(content) {
        return Some(FilterReason::MentionOnly);
    }

    if !matches!(message.kind, MessageKind::Default | MessageKind::Reply) {
        return Some(FilterReason::SystemMessage);
    }

    None
}

/// Heuristic: at least one URL and fewer than `residue_min` characters of
/// anything else.
fn is_links_only(content: &str, residue_min: usize) -> bool {
    if content.is_empty() || !URL_PATTERN.is_match(content) {
        return false;
    }
    let residue = URL_PATTERN.replace_all(content, "");
    residue.trim().chars().count() < residue_min
}

/// True for a lone mention such as `<@123>` or `<@&456>`: with the mention
/// syntax stripped, only digits (or nothing) remain.
fn is_mention_only(content: &str) -> bool {
    if content.is_empty() {
        return false;
    }
    let stripped = content
        .replace("<@", "")
        .replace(['>', '!', '#', '&'], "");
    stripped.chars().all(|c| c.is_ascii_digit())
}
