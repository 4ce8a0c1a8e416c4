//! Platform text limits and truncation helpers
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Component label and choice limits, character based truncation
//! - 1.0.0: Embed and message truncation

/// Embed description limit
pub const EMBED_LIMIT: usize = 4096;
/// Embed field value limit
pub const FIELD_LIMIT: usize = 1024;
/// Button, select option and autocomplete choice label limit
pub const LABEL_LIMIT: usize = 80;
/// Maximum options in a select menu and choices in an autocomplete response
pub const MAX_CHOICES: usize = 25;

const ELLIPSIS: &str = "...";

/// Truncate to at most `limit` characters, ending with an ellipsis when cut
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Truncate text to fit an embed description
pub fn truncate_for_embed(text: &str) -> String {
    truncate_chars(text, EMBED_LIMIT)
}

/// Truncate text to fit a component label
pub fn truncate_label(text: &str) -> String {
    truncate_chars(text, LABEL_LIMIT)
}

/// Format an amount with thousands separators, `1234567` becomes `1,234,567`
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
