//! Account commands
//!
//! Handles: account create, account delete
//!
//! Creation asks the user to accept the terms through buttons owned by the
//! invoker. Deletion asks for a button confirmation, then a modal where the
//! user types `DELETE`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.0.0: Terms agreement on create, typed confirmation on delete

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serenity::model::application::component::ButtonStyle;
use std::time::Duration;

use crate::commands::context::InteractionContext;
use crate::commands::handler::{ButtonHandler, ChatInputHandler, CommandNode, GroupNode, ModalSubmitHandler};
use crate::commands::registry::{Command, CommandOptions, CommandRegistry, RegistryError, SubCommand};
use crate::core::{accent_embed, error_embed};
use crate::dispatch::reply::{ActionRow, Button, Modal, Reply, Response, TextInput};
use crate::token::Value;

const AGREE: &str = "agree";
const DECLINE: &str = "decline";
const CONFIRM: &str = "confirm";
const CONFIRM_INPUT: &str = "confirmation";
const CONFIRM_WORD: &str = "DELETE";

pub fn register(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.register_command(
        Command::new("account", "Account management command.", GroupNode).options(CommandOptions {
            cooldown: Some(Duration::from_secs(5)),
            subcommand_required: true,
            ..Default::default()
        }),
    )?;
    registry.register_subcommand("account", SubCommand::new("create", "Create an account.", CreateAccount))?;
    registry.register_subcommand("account", SubCommand::new("delete", "Delete the account.", DeleteAccount))
}

/// ⭕ / ❌ pair owned by the invoker
fn agree_decline(ctx: &InteractionContext<'_>) -> Result<ActionRow> {
    Ok(ActionRow::buttons(vec![
        Button::new(ctx.own_custom_id([AGREE])?)
            .emoji("⭕")
            .style(ButtonStyle::Primary),
        Button::new(ctx.own_custom_id([DECLINE])?)
            .emoji("❌")
            .style(ButtonStyle::Primary),
    ]))
}

fn first_arg(args: &[Value]) -> Option<&str> {
    args.first().and_then(Value::as_str)
}

pub struct CreateAccount;

#[async_trait]
impl ChatInputHandler for CreateAccount {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        if ctx.app.accounts.user_exists(ctx.actor_id()).await? {
            let delete = ctx.mention("account", None, Some("delete"));
            let embed = error_embed(&format!("You can delete the account with {delete}."))
                .title("You can only create one account.");
            return Ok(Response::Message(Reply::new().embed(embed)));
        }

        let embed = accent_embed("Terms & Conditions Agreement")
            .description("Creating an account stores your user id and a wallet for the game commands.")
            .footer("You can agree by pressing the ⭕ button below.");
        Ok(Response::Message(Reply::new().embed(embed).row(agree_decline(ctx)?)))
    }
}

#[async_trait]
impl ButtonHandler for CreateAccount {
    async fn button(&self, ctx: &InteractionContext<'_>, args: &[Value]) -> Result<Response> {
        let embed = if first_arg(args) == Some(AGREE) {
            let user = ctx.actor_id();
            if ctx.app.accounts.create_user(user).await? {
                ctx.app.wallets.adjust_wallet(user, 0, true).await?;
                info!("[{}] Created account for {}", ctx.request_id, user);
            }
            accent_embed("You have agreed to the Terms & Conditions Agreement.")
                .description("You have completed your registration.")
        } else {
            error_embed("You have canceled the registration.")
                .title("You have declined the Terms & Conditions Agreement.")
        };
        Ok(Response::Message(Reply::new().embed(embed).clear_components()))
    }
}

impl CommandNode for CreateAccount {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }

    fn as_button(&self) -> Option<&dyn ButtonHandler> {
        Some(self)
    }
}

pub struct DeleteAccount;

#[async_trait]
impl ChatInputHandler for DeleteAccount {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        if !ctx.app.accounts.user_exists(ctx.actor_id()).await? {
            let create = ctx.mention("account", None, Some("create"));
            let embed = error_embed(&format!("You can create an account with {create}."))
                .title("The account does not exist.");
            return Ok(Response::Message(Reply::new().embed(embed)));
        }

        let embed = accent_embed("Are you sure you want to delete the account?")
            .description("It may interfere with the use of some commands.");
        Ok(Response::Message(Reply::new().embed(embed).row(agree_decline(ctx)?)))
    }
}

#[async_trait]
impl ButtonHandler for DeleteAccount {
    async fn button(&self, ctx: &InteractionContext<'_>, args: &[Value]) -> Result<Response> {
        if first_arg(args) != Some(AGREE) {
            let embed = error_embed("Your account is untouched.")
                .title("You have declined the deletion of the account.");
            return Ok(Response::Message(Reply::new().embed(embed).clear_components()));
        }

        Ok(Response::Modal(Modal {
            custom_id: ctx.own_custom_id([CONFIRM])?,
            title: "Delete account".to_string(),
            inputs: vec![TextInput::short(CONFIRM_INPUT, format!("Type {CONFIRM_WORD} to confirm"))
                .placeholder(CONFIRM_WORD)
                .length(CONFIRM_WORD.len() as u64, CONFIRM_WORD.len() as u64)],
        }))
    }
}

#[async_trait]
impl ModalSubmitHandler for DeleteAccount {
    async fn modal_submit(&self, ctx: &InteractionContext<'_>, _args: &[Value]) -> Result<Response> {
        if ctx.event.field(CONFIRM_INPUT).map(str::trim) != Some(CONFIRM_WORD) {
            let embed = error_embed(&format!("Type `{CONFIRM_WORD}` exactly to delete the account."))
                .title("The confirmation did not match.");
            return Ok(Response::Notice(Reply::new().embed(embed).ephemeral()));
        }

        let user = ctx.actor_id();
        ctx.app.accounts.delete_user(user).await?;
        info!("[{}] Deleted account of {}", ctx.request_id, user);
        let embed = accent_embed("You have agreed to the deletion of the account.")
            .description("Your account has been deleted.");
        Ok(Response::Message(Reply::new().embed(embed).ephemeral()))
    }
}

impl CommandNode for DeleteAccount {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }

    fn as_button(&self) -> Option<&dyn ButtonHandler> {
        Some(self)
    }

    fn as_modal_submit(&self) -> Option<&dyn ModalSubmitHandler> {
        Some(self)
    }
}
