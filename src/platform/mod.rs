//! # Platform Adapter
//!
//! Everything that touches serenity's interaction types: conversion into
//! dispatch events, the responder behind each interaction, and the startup
//! command upload.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Event conversion, interaction responder and upload diff

pub mod convert;
pub mod responder;
pub mod upload;

use serenity::http::Http;
use serenity::model::application::interaction::Interaction;
use std::sync::Arc;

use crate::dispatch::event::InteractionEvent;
pub use responder::{PendingInteraction, SerenityResponder};
pub use upload::{upload_commands, UploadDiff};

/// Convert a gateway interaction into an event and the responder that answers it.
/// Pings have neither.
pub fn accept(http: Arc<Http>, interaction: Interaction) -> Option<(InteractionEvent, SerenityResponder)> {
    let (event, pending) = match interaction {
        Interaction::ApplicationCommand(i) => (convert::command_event(&i), PendingInteraction::Command(i)),
        Interaction::MessageComponent(i) => (convert::component_event(&i), PendingInteraction::Component(i)),
        Interaction::ModalSubmit(i) => (convert::modal_event(&i), PendingInteraction::Modal(i)),
        Interaction::Autocomplete(i) => (convert::autocomplete_event(&i), PendingInteraction::Autocomplete(i)),
        _ => return None,
    };
    Some((event, SerenityResponder::new(http, pending)))
}
