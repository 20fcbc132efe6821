//! Session title generation
//!
//! A title is derived once per session from its first user message. The
//! model is trusted to follow [`TITLE_PROMPT`], but whatever it returns is
//! passed through [`finalize_title`] before being stored.

use crate::error::Result;
use crate::prompts::{TITLE_PROMPT, TITLE_PROMPT_VERSION};
use crate::providers::{Message, Provider};

/// Upper bound enforced on stored titles (the prompt asks for the same)
pub const MAX_TITLE_CHARS: usize = 100;

/// Emoji used for titles synthesized when the model returns nothing usable
const FALLBACK_EMOJI: &str = "\u{1f4ac}";

/// Number of message words used for a synthesized title
const FALLBACK_WORDS: usize = 8;

/// Ask the model for a title describing `first_user_message`.
///
/// Returns the raw model output; callers apply [`finalize_title`].
pub async fn generate_title(
    provider: &dyn Provider,
    first_user_message: &str,
    model: &str,
) -> Result<String> {
    let messages = [
        Message::system(TITLE_PROMPT),
        Message::user(first_user_message),
    ];

    let response = provider.complete(model, &messages).await?;
    tracing::debug!(
        prompt_version = TITLE_PROMPT_VERSION,
        "Title model {} returned {:?}",
        model,
        response.content
    );
    Ok(response.content)
}

/// Clean up a raw model title so it is safe to store.
///
/// Drops a leading `<think>` block, surrounding whitespace and quotes, and
/// keeps only the first line. Titles longer than [`MAX_TITLE_CHARS`] are cut
/// on a character boundary. An empty result is replaced by a title built
/// from the first words of `first_user_message`.
///
/// # Examples
///
/// ```
/// use bard::title::finalize_title;
///
/// assert_eq!(finalize_title("  \"🐍 Python Help\"\n", "hi"), "🐍 Python Help");
/// assert_eq!(finalize_title("", "Plan a trip to Lisbon"), "💬 Plan a trip to Lisbon");
/// ```
pub fn finalize_title(raw: &str, first_user_message: &str) -> String {
    let without_think = match (raw.find("<think>"), raw.find("</think>")) {
        (Some(start), Some(end)) if start < end => {
            format!("{}{}", &raw[..start], &raw[end + "</think>".len()..])
        }
        _ => raw.to_string(),
    };

    let first_line = without_think
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();

    let title = if first_line.is_empty() {
        tracing::warn!("Title model returned an empty title, synthesizing one");
        fallback_title(first_user_message)
    } else {
        first_line.to_string()
    };

    truncate_chars(&title, MAX_TITLE_CHARS)
}

fn fallback_title(first_user_message: &str) -> String {
    let words: Vec<&str> = first_user_message
        .split_whitespace()
        .take(FALLBACK_WORDS)
        .collect();

    if words.is_empty() {
        format!("{} New conversation", FALLBACK_EMOJI)
    } else {
        format!("{} {}", FALLBACK_EMOJI, words.join(" "))
    }
}

fn truncate_chars(title: &str, max: usize) -> String {
    match title.char_indices().nth(max) {
        Some((cut, _)) => {
            tracing::warn!(
                "Title exceeds {} characters ({}), truncating",
                max,
                title.chars().count()
            );
            title[..cut].trim_end().to_string()
        }
        None => title.to_string(),
    }
}
