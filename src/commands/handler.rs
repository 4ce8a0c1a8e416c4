//! Capability handler traits
//!
//! A command or subcommand node implements any subset of the capability
//! traits below and advertises them through the `as_*` accessors on
//! [`CommandNode`]. The dispatcher asks the node for the capability an event
//! needs; `None` is a routing failure, never a panic.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Split into per-capability traits (chat input, components, modals, autocomplete, context menus)
//! - 1.0.0: Initial slash command handler trait

use anyhow::Result;
use async_trait::async_trait;

use super::context::InteractionContext;
use crate::dispatch::event::EventKind;
use crate::dispatch::reply::{Choice, Response};
use crate::token::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ChatInput,
    Button,
    StringSelect,
    ModalSubmit,
    Autocomplete,
    UserContextMenu,
    MessageContextMenu,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::ChatInput,
        Capability::Button,
        Capability::StringSelect,
        Capability::ModalSubmit,
        Capability::Autocomplete,
        Capability::UserContextMenu,
        Capability::MessageContextMenu,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Capability::ChatInput => "chatInput",
            Capability::Button => "button",
            Capability::StringSelect => "stringSelect",
            Capability::ModalSubmit => "modalSubmit",
            Capability::Autocomplete => "autocomplete",
            Capability::UserContextMenu => "userContextMenu",
            Capability::MessageContextMenu => "messageContextMenu",
        }
    }
}

impl From<EventKind> for Capability {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::ChatInput => Capability::ChatInput,
            EventKind::UserContextMenu => Capability::UserContextMenu,
            EventKind::MessageContextMenu => Capability::MessageContextMenu,
            EventKind::Button => Capability::Button,
            EventKind::StringSelect => Capability::StringSelect,
            EventKind::ModalSubmit => Capability::ModalSubmit,
            EventKind::Autocomplete => Capability::Autocomplete,
        }
    }
}

#[async_trait]
pub trait ChatInputHandler: Send + Sync {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response>;
}

#[async_trait]
pub trait ButtonHandler: Send + Sync {
    /// `args` are the token fields after the command path
    async fn button(&self, ctx: &InteractionContext<'_>, args: &[Value]) -> Result<Response>;
}

#[async_trait]
pub trait StringSelectHandler: Send + Sync {
    async fn string_select(
        &self,
        ctx: &InteractionContext<'_>,
        args: &[Value],
        values: &[String],
    ) -> Result<Response>;
}

#[async_trait]
pub trait ModalSubmitHandler: Send + Sync {
    async fn modal_submit(&self, ctx: &InteractionContext<'_>, args: &[Value]) -> Result<Response>;
}

#[async_trait]
pub trait AutocompleteHandler: Send + Sync {
    async fn autocomplete(&self, ctx: &InteractionContext<'_>) -> Result<Vec<Choice>>;
}

#[async_trait]
pub trait UserContextMenuHandler: Send + Sync {
    async fn user_context_menu(&self, ctx: &InteractionContext<'_>) -> Result<Response>;
}

#[async_trait]
pub trait MessageContextMenuHandler: Send + Sync {
    async fn message_context_menu(&self, ctx: &InteractionContext<'_>) -> Result<Response>;
}

/// A registrable command or subcommand body
///
/// # Example
///
/// ```ignore
/// pub struct Ping;
///
/// #[async_trait]
/// impl ChatInputHandler for Ping {
///     async fn chat_input(&self, _ctx: &InteractionContext<'_>) -> Result<Response> {
///         Ok(Response::Message(Reply::new().content("pong")))
///     }
/// }
///
/// impl CommandNode for Ping {
///     fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
///         Some(self)
///     }
/// }
/// ```
pub trait CommandNode: Send + Sync {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        None
    }

    fn as_button(&self) -> Option<&dyn ButtonHandler> {
        None
    }

    fn as_string_select(&self) -> Option<&dyn StringSelectHandler> {
        None
    }

    fn as_modal_submit(&self) -> Option<&dyn ModalSubmitHandler> {
        None
    }

    fn as_autocomplete(&self) -> Option<&dyn AutocompleteHandler> {
        None
    }

    fn as_user_context_menu(&self) -> Option<&dyn UserContextMenuHandler> {
        None
    }

    fn as_message_context_menu(&self) -> Option<&dyn MessageContextMenuHandler> {
        None
    }

    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::ChatInput => self.as_chat_input().is_some(),
            Capability::Button => self.as_button().is_some(),
            Capability::StringSelect => self.as_string_select().is_some(),
            Capability::ModalSubmit => self.as_modal_submit().is_some(),
            Capability::Autocomplete => self.as_autocomplete().is_some(),
            Capability::UserContextMenu => self.as_user_context_menu().is_some(),
            Capability::MessageContextMenu => self.as_message_context_menu().is_some(),
        }
    }

    fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.supports(*c))
            .collect()
    }
}

/// Node with no capabilities, used for commands that only group subcommands
pub struct GroupNode;

impl CommandNode for GroupNode {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::reply::Reply;

    // Test that the traits are object-safe (can be used with dyn)
    fn _assert_object_safe(
        _: &dyn CommandNode,
        _: &dyn ChatInputHandler,
        _: &dyn ButtonHandler,
        _: &dyn StringSelectHandler,
        _: &dyn ModalSubmitHandler,
        _: &dyn AutocompleteHandler,
        _: &dyn UserContextMenuHandler,
        _: &dyn MessageContextMenuHandler,
    ) {
    }

    struct Clicky;

    #[async_trait]
    impl ButtonHandler for Clicky {
        async fn button(&self, _ctx: &InteractionContext<'_>, _args: &[Value]) -> Result<Response> {
            Ok(Response::Message(Reply::new()))
        }
    }

    impl CommandNode for Clicky {
        fn as_button(&self) -> Option<&dyn ButtonHandler> {
            Some(self)
        }
    }

    #[test]
    fn test_capabilities_follow_accessors() {
        assert_eq!(Clicky.capabilities(), vec![Capability::Button]);
        assert!(Clicky.supports(Capability::Button));
        assert!(!Clicky.supports(Capability::ChatInput));
        assert!(GroupNode.capabilities().is_empty());
    }

    #[test]
    fn test_event_kind_maps_to_capability() {
        assert_eq!(Capability::from(EventKind::StringSelect), Capability::StringSelect);
        assert_eq!(Capability::from(EventKind::Autocomplete).name(), "autocomplete");
    }
}
