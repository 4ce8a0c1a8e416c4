//! Help command
//!
//! Handles: help
//!
//! Lists every invocable command path in a paginated select menu. Picking
//! an entry shows the command's mention, description and the interactions
//! it answers. The `command` option jumps straight to one entry and offers
//! autocomplete suggestions ranked by bigram similarity.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.0.0: Paginated command list with autocomplete lookup

use anyhow::Result;
use async_trait::async_trait;
use serenity::builder::CreateApplicationCommandOption;
use serenity::model::application::command::CommandOptionType;
use std::cmp::Ordering;

use crate::commands::context::InteractionContext;
use crate::commands::handler::{
    AutocompleteHandler, Capability, ChatInputHandler, CommandNode, StringSelectHandler,
};
use crate::commands::registry::{Command, CommandRegistry, RegistryError};
use crate::core::pagination::{menu_page, page_count, parse_page};
use crate::core::search::similarity;
use crate::core::{accent_embed, truncate_label};
use crate::dispatch::reply::{ActionRow, Choice, Embed, Reply, Response, SelectMenu, SelectOption};
use crate::games::rejection;
use crate::token::{CommandPath, Value};

const COMMAND_OPTION: &str = "command";

pub fn register(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    let mut option = CreateApplicationCommandOption::default();
    option
        .kind(CommandOptionType::String)
        .name(COMMAND_OPTION)
        .description("Command to look up.")
        .set_autocomplete(true)
        .required(false);
    registry.register_command(Command::new("help", "Shows the list of commands.", Help).argument(option))
}

/// `/name`, `/name sub` or `/name group sub`
fn display(path: &CommandPath) -> String {
    format!("/{path}")
}

fn describe(registry: &CommandRegistry, path: &CommandPath) -> Option<(String, Vec<Capability>)> {
    let resolved = registry.resolve(path)?;
    Some(match resolved.sub {
        Some(sub) => (sub.description.clone(), sub.node.capabilities()),
        None => (resolved.command.description.clone(), resolved.command.node.capabilities()),
    })
}

pub struct Help;

impl Help {
    fn menu(&self, ctx: &InteractionContext<'_>, page: usize) -> Result<ActionRow> {
        let items: Vec<SelectOption> = ctx
            .app
            .registry
            .paths()
            .iter()
            .map(|path| {
                let option = SelectOption::new(truncate_label(&display(path)), path.to_string());
                match describe(&ctx.app.registry, path) {
                    Some((description, _)) if !description.is_empty() => {
                        option.description(truncate_label(&description))
                    }
                    _ => option,
                }
            })
            .collect();
        let pages = page_count(items.len());
        let page = page.clamp(1, pages);
        let menu = SelectMenu::new(ctx.own_custom_id([page as u64])?, menu_page(&items, page))
            .placeholder(format!("Commands ({page}/{pages})"));
        Ok(ActionRow::select(menu))
    }

    fn overview(&self, ctx: &InteractionContext<'_>) -> Embed {
        accent_embed("Help").description(format!(
            "{} commands are available.\nPick one below to see what it does.",
            ctx.app.registry.paths().len()
        ))
    }

    fn detail(&self, ctx: &InteractionContext<'_>, path: &CommandPath) -> Option<Embed> {
        let (description, capabilities) = describe(&ctx.app.registry, path)?;
        let mention = ctx.mention(&path.command, path.group(), path.sub_name());
        let capabilities = capabilities
            .iter()
            .map(|c| format!("`{}`", c.name()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut embed = accent_embed(display(path)).field("Command", mention, true);
        if !description.is_empty() {
            embed = embed.description(description);
        }
        Some(embed.field("Handles", capabilities, true))
    }
}

#[async_trait]
impl ChatInputHandler for Help {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let embed = match ctx.event.option_str(COMMAND_OPTION) {
            Some(raw) => {
                let path = CommandPath::parse(raw.trim_start_matches('/'));
                match self.detail(ctx, &path) {
                    Some(embed) => embed,
                    None => return Ok(rejection(&format!("There is no command `{raw}`."))),
                }
            }
            None => self.overview(ctx),
        };
        Ok(Response::Message(Reply::new().embed(embed).row(self.menu(ctx, 1)?)))
    }
}

#[async_trait]
impl StringSelectHandler for Help {
    async fn string_select(
        &self,
        ctx: &InteractionContext<'_>,
        args: &[Value],
        values: &[String],
    ) -> Result<Response> {
        let current = args.first().and_then(Value::as_int).unwrap_or(1) as usize;
        let page = values.first().map_or(Some(current), |v| parse_page(v));
        if let Some(page) = page {
            let reply = Reply::new().embed(self.overview(ctx)).row(self.menu(ctx, page)?);
            return Ok(Response::Message(reply));
        }
        let Some(value) = values.first() else {
            return Ok(rejection("Nothing was selected."));
        };
        let embed = match self.detail(ctx, &CommandPath::parse(value)) {
            Some(embed) => embed,
            None => return Ok(rejection("That command is no longer available.")),
        };
        Ok(Response::Message(Reply::new().embed(embed).row(self.menu(ctx, current)?)))
    }
}

#[async_trait]
impl AutocompleteHandler for Help {
    async fn autocomplete(&self, ctx: &InteractionContext<'_>) -> Result<Vec<Choice>> {
        let typed = ctx
            .event
            .focused()
            .and_then(|o| o.value.as_str())
            .unwrap_or_default()
            .trim()
            .trim_start_matches('/');

        let mut ranked: Vec<(f64, CommandPath)> = ctx
            .app
            .registry
            .paths()
            .into_iter()
            .map(|path| (similarity(&path.to_string(), typed), path))
            .filter(|(score, _)| typed.is_empty() || *score > 0.0)
            .collect();
        if !typed.is_empty() {
            ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        }

        Ok(ranked
            .into_iter()
            .map(|(_, path)| Choice::new(display(&path), path.to_string()))
            .collect())
    }
}

impl CommandNode for Help {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }

    fn as_string_select(&self) -> Option<&dyn StringSelectHandler> {
        Some(self)
    }

    fn as_autocomplete(&self) -> Option<&dyn AutocompleteHandler> {
        Some(self)
    }
}
