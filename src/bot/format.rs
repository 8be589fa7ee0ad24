//! Reply texts sent back to the chat.

use crate::bot::query::CommandKind;
use crate::search::SearchResult;
use std::fmt::Write;

/// Immediate acknowledgement sent before any external call
pub const PLACEHOLDER_REPLY: &str = "...";

/// Generic failure reply; details go to the log only
pub const FAILURE_REPLY: &str = "An error occurred while processing your request!";

/// Render web search results.
///
/// Results are numbered in the order given; an empty list yields the
/// "no results" message.
#[must_use]
pub fn format_search_reply(term: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("😔 I couldn't find accurate results for your search \"{term}\".");
    }

    let mut output = format!("🔍 Search results for \"{term}\":\n\n");
    for (i, result) in results.iter().enumerate() {
        let _ = write!(
            output,
            "{}. Title: {}\n📝 Description: {}\n🗓️ Publish Date: {}\n📂 Category: {}\n🔗 Link: {}\n\n",
            i + 1,
            result.title,
            result.description,
            result.published_date,
            result.category,
            result.link
        );
    }

    output.trim_end().to_string()
}

/// Reply for an image search that returned no URLs.
#[must_use]
pub fn format_no_images_reply(term: &str) -> String {
    format!("😔 I couldn't find images for your search \"{term}\".")
}

/// Reply for a command sent without a term.
#[must_use]
pub fn format_usage_reply(kind: CommandKind) -> String {
    let what = match kind {
        CommandKind::Search => "a search term",
        CommandKind::Image => "a term for image search",
    };
    format!("❌ You did not enter {what}. Use {}", kind.usage())
}
