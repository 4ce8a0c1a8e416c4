//! Platform-neutral reply model
//!
//! Handlers build replies out of these types, and the same types describe the
//! message an interaction was attached to, so games can read their own
//! rendering back.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.0.0: Initial reply, component and modal model

use serenity::model::application::component::{ButtonStyle, InputTextStyle};

use crate::token::{decode, Token};

/// Outbound message content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    /// `None` leaves existing components untouched, `Some(vec![])` clears them
    pub components: Option<Vec<ActionRow>>,
    pub ephemeral: bool,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn row(mut self, row: ActionRow) -> Self {
        self.components.get_or_insert_with(Vec::new).push(row);
        self
    }

    pub fn rows(mut self, rows: Vec<ActionRow>) -> Self {
        self.components.get_or_insert_with(Vec::new).extend(rows);
        self
    }

    pub fn clear_components(mut self) -> Self {
        self.components = Some(Vec::new());
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub color: Option<u32>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionRow {
    pub components: Vec<Component>,
}

impl ActionRow {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn buttons(buttons: Vec<Button>) -> Self {
        Self {
            components: buttons.into_iter().map(Component::Button).collect(),
        }
    }

    pub fn select(menu: SelectMenu) -> Self {
        Self {
            components: vec![Component::Select(menu)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Button(Button),
    Select(SelectMenu),
    TextInput(TextInput),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub custom_id: String,
    pub label: Option<String>,
    pub emoji: Option<String>,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl Button {
    pub fn new(custom_id: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: None,
            emoji: None,
            style: ButtonStyle::Primary,
            disabled: false,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Decode this button's custom id
    pub fn token(&self) -> Token {
        decode(&self.custom_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectMenu {
    pub custom_id: String,
    pub placeholder: Option<String>,
    pub options: Vec<SelectOption>,
}

impl SelectMenu {
    pub fn new(custom_id: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self {
            custom_id: custom_id.into(),
            placeholder: None,
            options,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
    pub emoji: Option<String>,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
            emoji: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub style: InputTextStyle,
    pub placeholder: Option<String>,
    pub required: bool,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

impl TextInput {
    pub fn short(custom_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            style: InputTextStyle::Short,
            placeholder: None,
            required: true,
            min_length: None,
            max_length: None,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn length(mut self, min: u64, max: u64) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

/// One autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

impl Choice {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// What a handler hands back to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Delivered according to the event kind and acknowledgement state
    Message(Reply),
    /// Ephemeral reply to the actor, the original message is left alone
    Notice(Reply),
    /// Open a form, only valid before the interaction is acknowledged
    Modal(Modal),
}

/// The message an interaction was attached to, as the platform handed it over
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageSnapshot {
    pub id: u64,
    pub content: String,
    pub embeds: Vec<Embed>,
    pub components: Vec<ActionRow>,
}

impl MessageSnapshot {
    pub fn from_reply(reply: &Reply) -> Self {
        Self {
            id: 0,
            content: reply.content.clone().unwrap_or_default(),
            embeds: reply.embeds.clone(),
            components: reply.components.clone().unwrap_or_default(),
        }
    }

    pub fn first_embed(&self) -> Option<&Embed> {
        self.embeds.first()
    }

    /// All buttons in row order
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.components
            .iter()
            .flat_map(|row| row.components.iter())
            .filter_map(|c| match c {
                Component::Button(b) => Some(b),
                _ => None,
            })
    }
}
