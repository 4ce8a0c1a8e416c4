//! Economy and gambling commands
//!
//! Handles: game wallet, game beg, game gamble evenodd, game gamble blackjack,
//! game gamble slots, and the `Wallet` user context menu
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Begging, slots, farm and shop groups
//! - 1.0.0: Wallet, even/odd and blackjack over the wallet store

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use serenity::builder::CreateApplicationCommandOption;
use serenity::model::application::command::CommandOptionType;
use std::time::Duration;

use crate::commands::context::InteractionContext;
use crate::commands::handler::{
    ButtonHandler, ChatInputHandler, CommandNode, GroupNode, UserContextMenuHandler,
};
use crate::commands::registry::{
    Command, CommandKind, CommandOptions, CommandRegistry, RegistryError, SubCommand,
};
use crate::core::{accent_embed, format_amount};
use crate::dispatch::reply::{Reply, Response};
use crate::games::blackjack::Blackjack;
use crate::games::evenodd::{EvenOdd, Parity};
use crate::games::slots::Slots;
use crate::games::{beg_amount, clamp_bet, payout, rejection, MAX_BET, MIN_BET};
use crate::services::balance_of;
use crate::token::Value;

const BET_OPTION: &str = "bet";
const GUESS_OPTION: &str = "guess";

pub fn register(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    let registered = CommandOptions {
        registration_required: true,
        ..Default::default()
    };

    registry.register_command(
        Command::new("game", "Game command.", GroupNode)
            .options(CommandOptions {
                subcommand_required: true,
                ..registered.clone()
            })
            .group("gamble", "Bet your money.")
            .group("farm", "Grow crops on your own land.")
            .group("shop", "Buy seeds and sell crops."),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("wallet", "Shows your current wallet.", ShowWallet),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("beg", "Beg for some money.", Beg).options(CommandOptions {
            cooldown: Some(Duration::from_secs(5 * 60)),
            ..Default::default()
        }),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("evenodd", "Guess whether the number is odd or even.", EvenOddGame)
            .group("gamble")
            .options(CommandOptions {
                cooldown: Some(Duration::from_secs(3)),
                ..Default::default()
            })
            .argument(bet_option())
            .argument(guess_option()),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("blackjack", "Play blackjack against the computer.", BlackjackGame)
            .group("gamble")
            .options(CommandOptions {
                cooldown: Some(Duration::from_secs(5)),
                ..Default::default()
            })
            .argument(bet_option()),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("slots", "Spin the slot machine.", SlotsGame)
            .group("gamble")
            .options(CommandOptions {
                cooldown: Some(Duration::from_secs(5)),
                ..Default::default()
            })
            .argument(bet_option()),
    )?;

    registry.register_command(
        Command::new("Wallet", "", WalletMenu)
            .kind(CommandKind::User)
            .options(registered),
    )
}

fn bet_option() -> CreateApplicationCommandOption {
    let mut option = CreateApplicationCommandOption::default();
    option
        .kind(CommandOptionType::Integer)
        .name(BET_OPTION)
        .description("Amount of money to bet.")
        .min_int_value(MIN_BET)
        .max_int_value(MAX_BET)
        .required(true);
    option
}

fn guess_option() -> CreateApplicationCommandOption {
    let mut option = CreateApplicationCommandOption::default();
    option
        .kind(CommandOptionType::Integer)
        .name(GUESS_OPTION)
        .description("Odd or even.")
        .add_int_choice("Odd", 1)
        .add_int_choice("Even", 0)
        .required(true);
    option
}

fn wallet_reply(name: &str, balance: i64) -> Response {
    let embed = accent_embed(format!("{name}'s Wallet")).field("Balance", format_amount(balance), false);
    Response::Message(Reply::new().embed(embed))
}

fn not_enough_money() -> Response {
    rejection(&format!(
        "You don't have enough money to bet the minimum amount of **{}**.",
        format_amount(MIN_BET)
    ))
}

/// Bet requested by the slash option, clamped to the actor's wallet
async fn place_bet(ctx: &InteractionContext<'_>) -> Result<Option<i64>> {
    let requested = ctx.event.option_int(BET_OPTION).unwrap_or(MIN_BET);
    let balance = balance_of(ctx.app.wallets.as_ref(), ctx.actor_id()).await?;
    Ok(clamp_bet(requested, balance))
}

pub struct ShowWallet;

#[async_trait]
impl ChatInputHandler for ShowWallet {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let balance = balance_of(ctx.app.wallets.as_ref(), ctx.actor_id()).await?;
        Ok(wallet_reply(&ctx.event.actor.name, balance))
    }
}

impl CommandNode for ShowWallet {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }
}

/// Another user's balance from their profile menu
pub struct WalletMenu;

#[async_trait]
impl UserContextMenuHandler for WalletMenu {
    async fn user_context_menu(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let target = ctx
            .event
            .target_user
            .as_ref()
            .ok_or_else(|| anyhow!("user context menu without a target"))?;
        let balance = balance_of(ctx.app.wallets.as_ref(), target.id).await?;
        Ok(wallet_reply(&target.name, balance))
    }
}

impl CommandNode for WalletMenu {
    fn as_user_context_menu(&self) -> Option<&dyn UserContextMenuHandler> {
        Some(self)
    }
}

pub struct Beg;

#[async_trait]
impl ChatInputHandler for Beg {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let amount = beg_amount(rand::random::<f64>());
        let user = ctx.actor_id();
        ctx.app.wallets.adjust_wallet(user, amount, true).await?;
        debug!("[{}] {} begged {}", ctx.request_id, user, amount);

        let balance = balance_of(ctx.app.wallets.as_ref(), user).await?;
        let embed = accent_embed(format!("{}'s Begging", ctx.event.actor.name))
            .description(format!("Someone spared you **{}**.", format_amount(amount)))
            .field(
                "Balance",
                format!("{} (+{})", format_amount(balance), format_amount(amount)),
                false,
            );
        Ok(Response::Message(Reply::new().embed(embed)))
    }
}

impl CommandNode for Beg {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }
}

pub struct SlotsGame;

#[async_trait]
impl ChatInputHandler for SlotsGame {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let Some(bet) = place_bet(ctx).await? else {
            return Ok(not_enough_money());
        };

        let spin = Slots::spin(bet, &mut rand::rng());
        let user = ctx.actor_id();
        ctx.app.wallets.adjust_wallet(user, spin.net(), true).await?;
        debug!("[{}] Slots for {}: net {}", ctx.request_id, user, spin.net());

        let balance = balance_of(ctx.app.wallets.as_ref(), user).await?;
        Ok(Response::Message(spin.render(&ctx.event.actor.name, balance)))
    }
}

impl CommandNode for SlotsGame {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }
}

pub struct EvenOddGame;

#[async_trait]
impl ChatInputHandler for EvenOddGame {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let Some(guess) = ctx.event.option_int(GUESS_OPTION).and_then(Parity::from_option) else {
            return Ok(rejection("Pick either odd or even."));
        };
        let Some(bet) = place_bet(ctx).await? else {
            return Ok(not_enough_money());
        };

        let round = EvenOdd::play(bet, guess, &mut rand::rng());
        let user = ctx.actor_id();
        ctx.app.wallets.adjust_wallet(user, round.net(), true).await?;
        debug!("[{}] Even/odd for {}: net {}", ctx.request_id, user, round.net());

        let balance = balance_of(ctx.app.wallets.as_ref(), user).await?;
        Ok(Response::Message(round.render(&ctx.event.actor.name, balance)))
    }
}

impl CommandNode for EvenOddGame {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }
}

pub struct BlackjackGame;

#[async_trait]
impl ChatInputHandler for BlackjackGame {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let Some(bet) = place_bet(ctx).await? else {
            return Ok(not_enough_money());
        };

        let user = ctx.actor_id();
        ctx.app.wallets.adjust_wallet(user, -bet, true).await?;
        let hand = Blackjack::deal(bet, &mut rand::rng());
        Ok(Response::Message(hand.render(&ctx.path, user, &ctx.event.actor.name, None)?))
    }
}

#[async_trait]
impl ButtonHandler for BlackjackGame {
    async fn button(&self, ctx: &InteractionContext<'_>, args: &[Value]) -> Result<Response> {
        let (action, mut hand) = Blackjack::from_args(args)?;
        let settlement = hand.apply(action, &mut rand::rng());

        let user = ctx.actor_id();
        let Some(settlement) = settlement else {
            return Ok(Response::Message(hand.render(&ctx.path, user, &ctx.event.actor.name, None)?));
        };

        let won = payout(hand.bet, settlement.ratio_tenths());
        if won > 0 {
            ctx.app.wallets.adjust_wallet(user, won, true).await?;
        }
        debug!("[{}] Blackjack for {} settled {:?}", ctx.request_id, user, settlement);
        let balance = balance_of(ctx.app.wallets.as_ref(), user).await?;
        Ok(Response::Message(hand.render(
            &ctx.path,
            user,
            &ctx.event.actor.name,
            Some((settlement, balance)),
        )?))
    }
}

impl CommandNode for BlackjackGame {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }

    fn as_button(&self) -> Option<&dyn ButtonHandler> {
        Some(self)
    }
}
