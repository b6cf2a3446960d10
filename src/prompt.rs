//! Prompt composition
//!
//! Builds the final generation prompt from raw user text and the session's
//! style prefix, enforcing the service's hard prompt length cap.

use crate::models::Style;

/// Maximum prompt length accepted by the generation service.
pub const MAX_PROMPT_LENGTH: usize = 500;

/// A composed prompt plus whether the raw text had to be cut down. The
/// caller decides how to warn the user about truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub text: String,
    pub truncated: bool,
}

/// Truncate `raw_text` to [`MAX_PROMPT_LENGTH`] characters and prepend the
/// style's fixed prefix. Pure string work, no I/O.
pub fn compose(raw_text: &str, style: Style) -> ComposedPrompt {
    let char_count = raw_text.chars().count();
    let (body, truncated) = if char_count > MAX_PROMPT_LENGTH {
        tracing::warn!(
            "Prompt too long ({} chars), truncating to {}",
            char_count,
            MAX_PROMPT_LENGTH
        );
        let cut: String = raw_text.chars().take(MAX_PROMPT_LENGTH).collect();
        (cut, true)
    } else {
        (raw_text.to_string(), false)
    };

    ComposedPrompt {
        text: format!("{}{}", style.prompt_prefix(), body),
        truncated,
    }
}
