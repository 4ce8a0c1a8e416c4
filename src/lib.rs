// Core layer - shared types and configuration
pub mod core;

// Custom id codec
pub mod token;

// Application layer
pub mod commands;
pub mod dispatch;
pub mod games;

// Infrastructure
pub mod platform;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core config for convenience
pub use core::Config;
pub use dispatch::Dispatcher;
