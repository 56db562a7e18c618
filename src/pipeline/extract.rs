//! Turns a free-form model reply into at most one reaction emoji.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::ExtractionMode;
use crate::platform::EmojiToken;

static CUSTOM_EMOJI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(a?):(\w+):(\d+)>").expect("custom emoji pattern is valid"));

static UNICODE_EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"[\x{1F600}-\x{1F64F}]|", // emoticons
        r"[\x{1F300}-\x{1F5FF}]|", // symbols & pictographs
        r"[\x{1F680}-\x{1F6FF}]|", // transport & map
        r"[\x{1F1E0}-\x{1F1FF}]|", // flags
        r"[\x{2700}-\x{27BF}]|",   // dingbats
        r"[\x{24C2}-\x{1F251}]|",  // enclosed characters
        r"[\x{1F900}-\x{1F9FF}]|", // supplemental symbols
        r"[\x{1FA70}-\x{1FAFF}]|", // extended-A
        r"[\x{2600}-\x{26FF}]|",   // misc symbols
        r"[\x{1F780}-\x{1F7FF}]|", // geometric shapes extended
        r"[\x{1F3FB}-\x{1F3FF}]",  // skin tones
    ))
    .expect("unicode emoji pattern is valid")
});

const ZWJ: char = '\u{200D}';

pub fn extract(reply: &str, mode: ExtractionMode) -> Option<EmojiToken> {
    match mode {
        ExtractionMode::Strict => extract_strict(reply),
        ExtractionMode::Permissive => extract_permissive(reply),
    }
}

/// Custom emoji reference first, then the first known emoji code point
/// (with its modifiers), then a non-ASCII leading character.
pub fn extract_strict(reply: &str) -> Option<EmojiToken> {
    let text = reply.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(token) = find_custom(text) {
        return Some(token);
    }

    if let Some(m) = UNICODE_EMOJI.find(text) {
        let start = base_start(text, m.start());
        return Some(EmojiToken::Unicode(grapheme_at(text, start).to_string()));
    }

    text.chars()
        .next()
        .filter(|c| !c.is_ascii())
        .map(|c| EmojiToken::Unicode(c.to_string()))
}

/// First character, unvalidated.
pub fn extract_permissive(reply: &str) -> Option<EmojiToken> {
    reply
        .trim()
        .chars()
        .next()
        .map(|c| EmojiToken::Unicode(c.to_string()))
}

fn find_custom(text: &str) -> Option<EmojiToken> {
    CUSTOM_EMOJI.captures_iter(text).find_map(|caps| {
        // Discord ids are non-zero snowflakes.
        let id = caps[3].parse::<u64>().ok().filter(|id| *id != 0)?;
        Some(EmojiToken::Custom {
            animated: &caps[1] == "a",
            name: caps[2].to_string(),
            id,
        })
    })
}

/// A match that begins on a combining mark (keycap `1️⃣` matches at U+FE0F)
/// starts one character earlier, at its base.
fn base_start(text: &str, start: usize) -> usize {
    let Some(first) = text[start..].chars().next() else {
        return start;
    };
    if !matches!(first, '\u{FE0E}' | '\u{FE0F}' | '\u{20E3}') {
        return start;
    }
    match text[..start].chars().next_back() {
        Some(base) if !base.is_whitespace() => start - base.len_utf8(),
        _ => start,
    }
}

/// The emoji starting at `start`, extended over skin tones, variation
/// selectors, keycap marks, ZWJ sequences and flag pairs.
fn grapheme_at(text: &str, start: usize) -> &str {
    let rest = &text[start..];
    let mut chars = rest.chars().peekable();
    let Some(first) = chars.next() else {
        return rest;
    };
    let mut end = first.len_utf8();

    if is_regional_indicator(first) {
        if let Some(&next) = chars.peek() {
            if is_regional_indicator(next) {
                end += next.len_utf8();
            }
        }
        return &rest[..end];
    }

    while let Some(&c) = chars.peek() {
        if is_modifier(c) {
            end += c.len_utf8();
            chars.next();
        } else if c == ZWJ {
            chars.next();
            match chars.next() {
                Some(joined) => end += ZWJ.len_utf8() + joined.len_utf8(),
                None => break,
            }
        } else {
            break;
        }
    }

    &rest[..end]
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_modifier(c: char) -> bool {
    matches!(c, '\u{FE0E}' | '\u{FE0F}' | '\u{20E3}' | '\u{1F3FB}'..='\u{1F3FF}')
}
