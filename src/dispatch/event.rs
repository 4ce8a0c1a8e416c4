//! Platform-neutral interaction events
//!
//! The serenity adapter converts every gateway interaction into an
//! [`InteractionEvent`] so routing, middleware and handlers never touch the
//! gateway types directly.

use serde_json::Value as JsonValue;
use serenity::model::permissions::Permissions;
use std::collections::HashMap;

use super::reply::MessageSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ChatInput,
    UserContextMenu,
    MessageContextMenu,
    Button,
    StringSelect,
    ModalSubmit,
    Autocomplete,
}

impl EventKind {
    /// Slash commands and context menus, which start a flow and carry no token
    pub fn is_fresh_invocation(self) -> bool {
        matches!(
            self,
            EventKind::ChatInput | EventKind::UserContextMenu | EventKind::MessageContextMenu
        )
    }

    /// Events whose routing comes from a custom id
    pub fn carries_token(self) -> bool {
        matches!(
            self,
            EventKind::Button | EventKind::StringSelect | EventKind::ModalSubmit
        )
    }

    /// Label used in log tags
    pub fn label(self) -> &'static str {
        match self {
            EventKind::ChatInput => "Command",
            EventKind::UserContextMenu => "User Context Menu",
            EventKind::MessageContextMenu => "Message Context Menu",
            EventKind::Button => "Button",
            EventKind::StringSelect => "Select Menu",
            EventKind::ModalSubmit => "Modal",
            EventKind::Autocomplete => "Autocomplete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: u64,
    pub name: String,
    /// Guild permissions, `None` outside a guild
    pub permissions: Option<Permissions>,
}

impl Actor {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            permissions: None,
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

/// One leaf option of a slash command
#[derive(Debug, Clone, PartialEq)]
pub struct OptionValue {
    pub name: String,
    pub value: JsonValue,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetUser {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    pub kind: EventKind,
    pub actor: Actor,
    pub guild_id: Option<u64>,
    /// The bot's own permissions in the channel, when the platform reports them
    pub bot_permissions: Option<Permissions>,
    pub command_name: String,
    pub subcommand_group: Option<String>,
    pub subcommand: Option<String>,
    pub options: Vec<OptionValue>,
    pub custom_id: Option<String>,
    /// Selected values of a select menu
    pub values: Vec<String>,
    /// Modal text inputs by custom id
    pub fields: HashMap<String, String>,
    pub message: Option<MessageSnapshot>,
    pub target_user: Option<TargetUser>,
    pub target_message: Option<MessageSnapshot>,
}

impl InteractionEvent {
    pub fn new(kind: EventKind, actor: Actor) -> Self {
        Self {
            kind,
            actor,
            guild_id: None,
            bot_permissions: None,
            command_name: String::new(),
            subcommand_group: None,
            subcommand: None,
            options: Vec::new(),
            custom_id: None,
            values: Vec::new(),
            fields: HashMap::new(),
            message: None,
            target_user: None,
            target_message: None,
        }
    }

    /// Slash command invocation, `path` is `command [group] [sub]`
    pub fn chat_input(actor: Actor, path: &str) -> Self {
        let mut event = Self::new(EventKind::ChatInput, actor);
        event.set_structured_path(path);
        event
    }

    pub fn autocomplete(actor: Actor, path: &str, focused: &str, partial: &str) -> Self {
        let mut event = Self::new(EventKind::Autocomplete, actor);
        event.set_structured_path(path);
        event.options.push(OptionValue {
            name: focused.to_string(),
            value: JsonValue::String(partial.to_string()),
            focused: true,
        });
        event
    }

    pub fn user_context_menu(actor: Actor, name: &str, target: TargetUser) -> Self {
        let mut event = Self::new(EventKind::UserContextMenu, actor);
        event.command_name = name.to_string();
        event.target_user = Some(target);
        event
    }

    pub fn component(
        kind: EventKind,
        actor: Actor,
        custom_id: impl Into<String>,
        message: Option<MessageSnapshot>,
    ) -> Self {
        let mut event = Self::new(kind, actor);
        event.custom_id = Some(custom_id.into());
        event.message = message;
        event
    }

    pub fn button(actor: Actor, custom_id: impl Into<String>, message: MessageSnapshot) -> Self {
        Self::component(EventKind::Button, actor, custom_id, Some(message))
    }

    fn set_structured_path(&mut self, path: &str) {
        let mut parts = path.split_whitespace();
        self.command_name = parts.next().unwrap_or_default().to_string();
        let rest: Vec<&str> = parts.collect();
        match rest.as_slice() {
            [sub] => self.subcommand = Some(sub.to_string()),
            [group, sub] => {
                self.subcommand_group = Some(group.to_string());
                self.subcommand = Some(sub.to_string());
            }
            _ => {}
        }
    }

    pub fn with_option(mut self, name: &str, value: JsonValue) -> Self {
        self.options.push(OptionValue {
            name: name.to_string(),
            value,
            focused: false,
        });
        self
    }

    pub fn in_guild(mut self, guild_id: u64) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    pub fn option(&self, name: &str) -> Option<&JsonValue> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.value)
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(|v| v.as_str())
    }

    pub fn option_int(&self, name: &str) -> Option<i64> {
        self.option(name).and_then(|v| v.as_i64())
    }

    /// The option being typed into during autocomplete
    pub fn focused(&self) -> Option<&OptionValue> {
        self.options.iter().find(|o| o.focused)
    }

    pub fn field(&self, custom_id: &str) -> Option<&str> {
        self.fields.get(custom_id).map(String::as_str)
    }
}
