//! Shared embed styles
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Accent, error and warning styles over the reply model
//! - 1.0.0: Initial embed builders

use crate::core::response::truncate_for_embed;
use crate::dispatch::reply::Embed;

pub const ACCENT_COLOR: u32 = 0x007FFF;
pub const ERROR_COLOR: u32 = 0xEE2C2C;
pub const WARN_COLOR: u32 = 0xFFCC00;

/// Regular content embed in the accent colour
pub fn accent_embed(title: impl Into<String>) -> Embed {
    Embed::new().title(title).color(ACCENT_COLOR)
}

/// Failure notice
pub fn error_embed(text: &str) -> Embed {
    Embed::new()
        .description(truncate_for_embed(text))
        .color(ERROR_COLOR)
}

pub fn warn_embed(text: &str) -> Embed {
    Embed::new()
        .description(truncate_for_embed(text))
        .color(WARN_COLOR)
}
