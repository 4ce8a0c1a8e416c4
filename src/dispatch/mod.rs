//! # Dispatch
//!
//! Event model, reply model, middleware and the dispatcher that connects
//! them to the command registry.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Platform-neutral events, typed replies, delivery table and middleware pipeline

pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod middleware;
pub mod reply;

pub use delivery::{choose_delivery, Delivery, Responder};
pub use dispatcher::Dispatcher;
pub use error::{Denial, DispatchError};
pub use event::{Actor, EventKind, InteractionEvent, TargetUser};
pub use reply::{
    ActionRow, Button, Choice, Component, Embed, MessageSnapshot, Modal, Reply, Response,
    SelectMenu, SelectOption, TextInput,
};
