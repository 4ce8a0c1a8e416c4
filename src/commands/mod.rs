//! # Command System
//!
//! Two-level command registry, capability handler traits, per-node cooldowns
//! and the built-in commands.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Commands with subcommands, capability traits, explicit startup registration
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 2.0.0: Remove bang commands, slash-only command system
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod cooldown;
pub mod handler;
pub mod handlers;
pub mod overrides;
pub mod registry;

pub use context::{AppContext, InteractionContext};
pub use handler::{Capability, CommandNode, GroupNode};
pub use handlers::register_all;
pub use registry::{Command, CommandKind, CommandOptions, CommandRegistry, RegistryError, SubCommand};
