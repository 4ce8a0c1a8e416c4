//! Conversion between serenity interaction types and the dispatch model
//!
//! Inbound: gateway interactions become [`InteractionEvent`]s, the message a
//! component sits on becomes a [`MessageSnapshot`]. Outbound: replies, embeds
//! and action rows become serenity builders.

use serde_json::Value as JsonValue;
use serenity::builder::{CreateComponents, CreateEmbed, CreateInputText};
use serenity::model::application::command::{CommandOptionType, CommandType};
use serenity::model::application::component::{
    ActionRow as PlatformRow, ActionRowComponent, ComponentType,
};
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandData, CommandDataOption, ResolvedTarget,
};
use serenity::model::application::interaction::autocomplete::AutocompleteInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::channel::{Embed as PlatformEmbed, Message, ReactionType};
use serenity::model::guild::Member;
use serenity::model::user::User;

use crate::dispatch::event::{Actor, EventKind, InteractionEvent, OptionValue, TargetUser};
use crate::dispatch::reply::{
    ActionRow, Button, Component, Embed, MessageSnapshot, SelectMenu, SelectOption, TextInput,
};

fn actor(user: &User, member: Option<&Member>) -> Actor {
    let actor = Actor::new(user.id.0, user.name.clone());
    match member.and_then(|m| m.permissions) {
        Some(permissions) => actor.with_permissions(permissions),
        None => actor,
    }
}

/// Split `[group] [sub] options…` into the structured path and the leaf options
fn flatten_options(event: &mut InteractionEvent, options: &[CommandDataOption]) {
    let mut leaves = options;
    if let Some(first) = options.first() {
        match first.kind {
            CommandOptionType::SubCommandGroup => {
                event.subcommand_group = Some(first.name.clone());
                if let Some(sub) = first.options.first() {
                    event.subcommand = Some(sub.name.clone());
                    leaves = &sub.options;
                } else {
                    leaves = &[];
                }
            }
            CommandOptionType::SubCommand => {
                event.subcommand = Some(first.name.clone());
                leaves = &first.options;
            }
            _ => {}
        }
    }
    event.options = leaves
        .iter()
        .map(|o| OptionValue {
            name: o.name.clone(),
            value: o.value.clone().unwrap_or(JsonValue::Null),
            focused: o.focused,
        })
        .collect();
}

fn apply_command_data(event: &mut InteractionEvent, data: &CommandData) {
    event.command_name = data.name.clone();
    flatten_options(event, &data.options);
    match data.target() {
        Some(ResolvedTarget::User(user, _)) => {
            event.target_user = Some(TargetUser {
                id: user.id.0,
                name: user.name,
            });
        }
        Some(ResolvedTarget::Message(message)) => {
            event.target_message = Some(snapshot(&message));
        }
        _ => {}
    }
}

pub fn command_event(interaction: &ApplicationCommandInteraction) -> InteractionEvent {
    let kind = match interaction.data.kind {
        CommandType::User => EventKind::UserContextMenu,
        CommandType::Message => EventKind::MessageContextMenu,
        _ => EventKind::ChatInput,
    };
    let mut event = InteractionEvent::new(kind, actor(&interaction.user, interaction.member.as_ref()));
    event.guild_id = interaction.guild_id.map(|g| g.0);
    event.bot_permissions = interaction.app_permissions;
    apply_command_data(&mut event, &interaction.data);
    event
}

pub fn autocomplete_event(interaction: &AutocompleteInteraction) -> InteractionEvent {
    let mut event = InteractionEvent::new(
        EventKind::Autocomplete,
        actor(&interaction.user, interaction.member.as_ref()),
    );
    event.guild_id = interaction.guild_id.map(|g| g.0);
    apply_command_data(&mut event, &interaction.data);
    event
}

pub fn component_event(interaction: &MessageComponentInteraction) -> InteractionEvent {
    let kind = match interaction.data.component_type {
        ComponentType::SelectMenu => EventKind::StringSelect,
        _ => EventKind::Button,
    };
    let mut event = InteractionEvent::component(
        kind,
        actor(&interaction.user, interaction.member.as_ref()),
        interaction.data.custom_id.clone(),
        Some(snapshot(&interaction.message)),
    );
    event.guild_id = interaction.guild_id.map(|g| g.0);
    event.bot_permissions = interaction.app_permissions;
    event.values = interaction.data.values.clone();
    event
}

pub fn modal_event(interaction: &ModalSubmitInteraction) -> InteractionEvent {
    let mut event = InteractionEvent::component(
        EventKind::ModalSubmit,
        actor(&interaction.user, interaction.member.as_ref()),
        interaction.data.custom_id.clone(),
        interaction.message.as_ref().map(snapshot),
    );
    event.guild_id = interaction.guild_id.map(|g| g.0);
    event.fields = interaction
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|c| match c {
            ActionRowComponent::InputText(input) => Some((input.custom_id.clone(), input.value.clone())),
            _ => None,
        })
        .collect();
    event
}

fn emoji_text(emoji: &ReactionType) -> String {
    match emoji {
        ReactionType::Unicode(text) => text.clone(),
        other => other.to_string(),
    }
}

fn embed_from_platform(embed: &PlatformEmbed) -> Embed {
    let mut converted = Embed::new();
    converted.title = embed.title.clone();
    converted.description = embed.description.clone();
    converted.footer = embed.footer.as_ref().map(|f| f.text.clone());
    converted.color = embed.colour.map(|c| c.0);
    for field in &embed.fields {
        converted = converted.field(field.name.clone(), field.value.clone(), field.inline);
    }
    converted
}

fn row_from_platform(row: &PlatformRow) -> ActionRow {
    let components = row
        .components
        .iter()
        .filter_map(|component| match component {
            ActionRowComponent::Button(button) => Some(Component::Button(Button {
                custom_id: button.custom_id.clone().unwrap_or_default(),
                label: button.label.clone(),
                emoji: button.emoji.as_ref().map(emoji_text),
                style: button.style,
                disabled: button.disabled,
            })),
            ActionRowComponent::SelectMenu(menu) => Some(Component::Select(SelectMenu {
                custom_id: menu.custom_id.clone().unwrap_or_default(),
                placeholder: menu.placeholder.clone(),
                options: menu
                    .options
                    .iter()
                    .map(|o| SelectOption {
                        label: o.label.clone(),
                        value: o.value.clone(),
                        description: o.description.clone(),
                        emoji: o.emoji.as_ref().map(emoji_text),
                    })
                    .collect(),
            })),
            _ => None,
        })
        .collect();
    ActionRow::new(components)
}

/// Read a platform message back into the reply model
pub fn snapshot(message: &Message) -> MessageSnapshot {
    MessageSnapshot {
        id: message.id.0,
        content: message.content.clone(),
        embeds: message.embeds.iter().map(embed_from_platform).collect(),
        components: message.components.iter().map(row_from_platform).collect(),
    }
}

pub fn create_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::default();
    if let Some(title) = &embed.title {
        builder.title(title);
    }
    if let Some(description) = &embed.description {
        builder.description(description);
    }
    for field in &embed.fields {
        builder.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        builder.footer(|f| f.text(footer));
    }
    if let Some(color) = embed.color {
        builder.color(color);
    }
    builder
}

pub fn create_embeds(embeds: &[Embed]) -> Vec<CreateEmbed> {
    embeds.iter().map(create_embed).collect()
}

fn create_input_text(input: &TextInput) -> CreateInputText {
    let mut builder = CreateInputText::default();
    builder
        .custom_id(&input.custom_id)
        .label(&input.label)
        .style(input.style)
        .required(input.required);
    if let Some(placeholder) = &input.placeholder {
        builder.placeholder(placeholder);
    }
    if let Some(min) = input.min_length {
        builder.min_length(min);
    }
    if let Some(max) = input.max_length {
        builder.max_length(max);
    }
    builder
}

pub fn create_components(rows: &[ActionRow]) -> CreateComponents {
    let mut components = CreateComponents::default();
    for row in rows {
        components.create_action_row(|r| {
            for component in &row.components {
                match component {
                    Component::Button(button) => {
                        r.create_button(|b| {
                            b.custom_id(&button.custom_id)
                                .style(button.style)
                                .disabled(button.disabled);
                            if let Some(label) = &button.label {
                                b.label(label);
                            }
                            if let Some(emoji) = &button.emoji {
                                b.emoji(ReactionType::Unicode(emoji.clone()));
                            }
                            b
                        });
                    }
                    Component::Select(menu) => {
                        r.create_select_menu(|m| {
                            m.custom_id(&menu.custom_id);
                            if let Some(placeholder) = &menu.placeholder {
                                m.placeholder(placeholder);
                            }
                            m.options(|opts| {
                                for option in &menu.options {
                                    opts.create_option(|o| {
                                        o.label(&option.label).value(&option.value);
                                        if let Some(description) = &option.description {
                                            o.description(description);
                                        }
                                        if let Some(emoji) = &option.emoji {
                                            o.emoji(ReactionType::Unicode(emoji.clone()));
                                        }
                                        o
                                    });
                                }
                                opts
                            })
                        });
                    }
                    Component::TextInput(input) => {
                        r.add_input_text(create_input_text(input));
                    }
                }
            }
            r
        });
    }
    components
}

/// One action row per text input, as modals require
pub fn create_modal_components(inputs: &[TextInput]) -> CreateComponents {
    let mut components = CreateComponents::default();
    for input in inputs {
        components.create_action_row(|r| r.add_input_text(create_input_text(input)));
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::model::application::component::ButtonStyle;

    #[test]
    fn test_embed_builder_carries_every_part() {
        let embed = Embed::new()
            .title("Blackjack")
            .description("**Win**")
            .field("Bet", "1,000", true)
            .footer("Turn 2")
            .color(0x5865F2);
        let built = create_embed(&embed);

        assert_eq!(built.0.get("title").and_then(|v| v.as_str()), Some("Blackjack"));
        assert_eq!(built.0.get("description").and_then(|v| v.as_str()), Some("**Win**"));
        let fields = built.0.get("fields").and_then(|v| v.as_array()).unwrap();
        assert_eq!(fields[0]["name"], "Bet");
        assert_eq!(fields[0]["inline"], true);
        assert_eq!(built.0.get("footer").unwrap()["text"], "Turn 2");
    }

    #[test]
    fn test_components_keep_row_layout() {
        let rows = vec![
            ActionRow::buttons(vec![
                Button::new("a").label("A").emoji("⭕"),
                Button::new("b").style(ButtonStyle::Danger).disabled(true),
            ]),
            ActionRow::select(
                SelectMenu::new("menu", vec![SelectOption::new("One", "1").description("first")])
                    .placeholder("Commands (1/1)"),
            ),
        ];
        let built = create_components(&rows);

        assert_eq!(built.0.len(), 2);
        let buttons = built.0[0]["components"].as_array().unwrap();
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0]["custom_id"], "a");
        assert_eq!(buttons[0]["emoji"]["name"], "⭕");
        assert_eq!(buttons[1]["style"], 4);
        assert_eq!(buttons[1]["disabled"], true);

        let menu = &built.0[1]["components"][0];
        assert_eq!(menu["custom_id"], "menu");
        assert_eq!(menu["placeholder"], "Commands (1/1)");
        assert_eq!(menu["options"][0]["value"], "1");
    }

    #[test]
    fn test_modal_inputs_get_a_row_each() {
        let inputs = vec![
            TextInput::short("confirmation", "Type DELETE").length(6, 6),
            TextInput::short("reason", "Reason"),
        ];
        let built = create_modal_components(&inputs);
        assert_eq!(built.0.len(), 2);
        assert_eq!(built.0[0]["components"][0]["custom_id"], "confirmation");
        assert_eq!(built.0[0]["components"][0]["min_length"], 6);
    }
}
