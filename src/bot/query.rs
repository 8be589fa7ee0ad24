//! Command recognition and argument parsing for `/search` and `/img`.

use crate::config::MAX_IMAGE_COUNT;

/// Commands the bot answers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `/search <term>`
    Search,
    /// `/img <term> [count]`
    Image,
}

impl CommandKind {
    /// Leading token selecting this command
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Search => "/search",
            Self::Image => "/img",
        }
    }

    /// Usage hint shown when the term is missing
    #[must_use]
    pub const fn usage(self) -> &'static str {
        match self {
            Self::Search => "/search <search term>",
            Self::Image => "/img <search term> [count]",
        }
    }

    /// Recognize a command in normalized (trimmed, lowercased) text.
    ///
    /// `/search` is checked before `/img`. Anything else is not a command.
    #[must_use]
    pub fn detect(normalized: &str) -> Option<Self> {
        [Self::Search, Self::Image]
            .into_iter()
            .find(|kind| normalized.starts_with(kind.prefix()))
    }
}

/// Arguments extracted from one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Search term, trimmed and never empty
    pub term: String,
    /// Number of results wanted, at least 1
    pub count: u32,
}

/// Trim and lowercase a raw message body.
#[must_use]
pub fn normalize(raw_text: &str) -> String {
    raw_text.trim().to_lowercase()
}

/// Extract the term (and for `/img` the count) from a message.
///
/// Returns `None` when nothing but the prefix was sent; that is the normal
/// "no argument" case, not an error. A `@botname` suffix on the command
/// token, as Telegram adds in groups, is dropped.
///
/// # Examples
///
/// ```
/// use oxide_search_bot::bot::query::{parse_command, CommandKind, ParsedQuery};
///
/// let parsed = parse_command("/img foo [5]", CommandKind::Image);
/// assert_eq!(parsed, Some(ParsedQuery { term: "foo".to_string(), count: 5 }));
/// assert_eq!(parse_command("/search   ", CommandKind::Search), None);
/// ```
#[must_use]
pub fn parse_command(raw_text: &str, kind: CommandKind) -> Option<ParsedQuery> {
    let normalized = normalize(raw_text);
    let remainder = normalized
        .strip_prefix(kind.prefix())
        .unwrap_or(normalized.as_str());
    let remainder = strip_bot_mention(remainder).trim();

    let (term, count) = match kind {
        CommandKind::Search => (remainder, 1),
        CommandKind::Image => split_count(remainder),
    };

    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    Some(ParsedQuery {
        term: term.to_string(),
        count,
    })
}

fn strip_bot_mention(remainder: &str) -> &str {
    if remainder.starts_with('@') {
        remainder
            .split_once(char::is_whitespace)
            .map_or("", |(_, rest)| rest)
    } else {
        remainder
    }
}

/// Split `term [n]` into the term and a count.
///
/// Text from the first `[` on is the modifier. A modifier that is not a
/// positive integer falls back to 1; large values are capped at
/// [`MAX_IMAGE_COUNT`].
fn split_count(remainder: &str) -> (&str, u32) {
    let Some((term, modifier)) = remainder.split_once('[') else {
        return (remainder, 1);
    };

    let digits = modifier.split(']').next().unwrap_or_default().trim();
    let count = digits
        .parse::<u32>()
        .ok()
        .filter(|n| *n >= 1)
        .map_or(1, |n| n.min(MAX_IMAGE_COUNT));

    (term, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(term: &str, count: u32) -> Option<ParsedQuery> {
        Some(ParsedQuery {
            term: term.to_string(),
            count,
        })
    }

    #[test]
    fn test_detect_commands() {
        assert_eq!(CommandKind::detect("/search cats"), Some(CommandKind::Search));
        assert_eq!(CommandKind::detect("/img dogs [2]"), Some(CommandKind::Image));
        assert_eq!(CommandKind::detect("hello /search cats"), None);
        assert_eq!(CommandKind::detect("/start"), None);
    }

    #[test]
    fn test_search_term_is_trimmed_and_lowercased() {
        assert_eq!(
            parse_command("  /SEARCH   Rust Lang  ", CommandKind::Search),
            parsed("rust lang", 1)
        );
    }

    #[test]
    fn test_search_keeps_brackets() {
        assert_eq!(
            parse_command("/search array [3]", CommandKind::Search),
            parsed("array [3]", 1)
        );
    }

    #[test]
    fn test_blank_remainder_is_empty_term() {
        assert_eq!(parse_command("/search", CommandKind::Search), None);
        assert_eq!(parse_command("/img   ", CommandKind::Image), None);
        assert_eq!(parse_command("/img [3]", CommandKind::Image), None);
    }

    #[test]
    fn test_image_count_modifier() {
        assert_eq!(parse_command("/img foo [5]", CommandKind::Image), parsed("foo", 5));
        assert_eq!(parse_command("/img foo", CommandKind::Image), parsed("foo", 1));
        assert_eq!(parse_command("/img foo[ 2 ]", CommandKind::Image), parsed("foo", 2));
    }

    #[test]
    fn test_malformed_count_falls_back_to_one() {
        assert_eq!(parse_command("/img foo [abc]", CommandKind::Image), parsed("foo", 1));
        assert_eq!(parse_command("/img foo [0]", CommandKind::Image), parsed("foo", 1));
        assert_eq!(parse_command("/img foo [-2]", CommandKind::Image), parsed("foo", 1));
        assert_eq!(parse_command("/img foo [", CommandKind::Image), parsed("foo", 1));
    }

    #[test]
    fn test_count_is_capped() {
        assert_eq!(
            parse_command("/img foo [50]", CommandKind::Image),
            parsed("foo", MAX_IMAGE_COUNT)
        );
    }

    #[test]
    fn test_bot_mention_is_dropped() {
        assert_eq!(
            parse_command("/search@SearchBot cats", CommandKind::Search),
            parsed("cats", 1)
        );
        assert_eq!(parse_command("/img@SearchBot", CommandKind::Image), None);
    }
}
