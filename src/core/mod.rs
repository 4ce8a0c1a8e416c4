//! # Core Module
//!
//! Configuration, shared embed styles and text helpers.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Embed styles, bigram search, select menu pagination, component text limits
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod embeds;
pub mod pagination;
pub mod response;
pub mod search;

// Re-export commonly used items
pub use config::{Config, Environment};
pub use embeds::{accent_embed, error_embed, warn_embed, ACCENT_COLOR, ERROR_COLOR, WARN_COLOR};
pub use response::{format_amount, truncate_chars, truncate_for_embed, truncate_label, MAX_CHOICES};
