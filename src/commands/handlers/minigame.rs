//! Multiplayer minigames
//!
//! Handles: minigame tictactoe, minigame pirate-roulette
//!
//! Both games keep no server-side session. Every press rebuilds the game
//! from the message it was made on and renders the next state over it.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.0.0: Tic-tac-toe and pirate roulette

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use crate::commands::context::InteractionContext;
use crate::commands::handler::{ButtonHandler, ChatInputHandler, CommandNode, GroupNode};
use crate::commands::registry::{Command, CommandOptions, CommandRegistry, RegistryError, SubCommand};
use crate::dispatch::reply::{MessageSnapshot, Response};
use crate::games::rejection;
use crate::games::roulette::{Action, Lobby, Round, Stab};
use crate::games::tictactoe::TicTacToe;
use crate::token::Value;

pub fn register(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.register_command(
        Command::new("minigame", "Play a minigame with others.", GroupNode).options(CommandOptions {
            cooldown: Some(Duration::from_secs(10)),
            subcommand_required: true,
            ..Default::default()
        }),
    )?;
    registry.register_subcommand(
        "minigame",
        SubCommand::new("tictactoe", "Play tic-tac-toe against another member.", TicTacToeGame),
    )?;
    registry.register_subcommand(
        "minigame",
        SubCommand::new("pirate-roulette", "Stab the barrel and hope the pirate stays in.", PirateRoulette),
    )
}

fn pressed_message<'a>(ctx: &'a InteractionContext<'_>) -> Result<&'a MessageSnapshot> {
    ctx.event
        .message
        .as_ref()
        .ok_or_else(|| anyhow!("button press without its message"))
}

pub struct TicTacToeGame;

#[async_trait]
impl ChatInputHandler for TicTacToeGame {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let game = TicTacToe::new(ctx.actor_id());
        Ok(Response::Message(game.render(&ctx.path)?))
    }
}

#[async_trait]
impl ButtonHandler for TicTacToeGame {
    async fn button(&self, ctx: &InteractionContext<'_>, args: &[Value]) -> Result<Response> {
        let cell = args
            .first()
            .and_then(Value::as_int)
            .ok_or_else(|| anyhow!("tic-tac-toe press without a cell"))?;
        let mut game = TicTacToe::rehydrate(pressed_message(ctx)?)?;

        match game.play(ctx.actor_id(), cell as usize) {
            Ok(outcome) => {
                debug!("[{}] Tic-tac-toe cell {} -> {:?}", ctx.request_id, cell, outcome);
                Ok(Response::Message(game.render(&ctx.path)?))
            }
            Err(rejected) => Ok(rejection(&rejected.to_string())),
        }
    }
}

impl CommandNode for TicTacToeGame {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }

    fn as_button(&self) -> Option<&dyn ButtonHandler> {
        Some(self)
    }
}

pub struct PirateRoulette;

#[async_trait]
impl ChatInputHandler for PirateRoulette {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let lobby = Lobby::new(ctx.actor_id());
        Ok(Response::Message(lobby.render(&ctx.path)?))
    }
}

#[async_trait]
impl ButtonHandler for PirateRoulette {
    async fn button(&self, ctx: &InteractionContext<'_>, args: &[Value]) -> Result<Response> {
        let action = Action::parse(args).ok_or_else(|| anyhow!("unknown roulette action {args:?}"))?;
        let message = pressed_message(ctx)?;
        let actor = ctx.actor_id();

        let reply = match action {
            Action::Join => {
                let mut lobby = Lobby::rehydrate(message)?;
                if let Err(rejected) = lobby.join(actor) {
                    return Ok(rejection(&rejected.to_string()));
                }
                lobby.render(&ctx.path)?
            }
            Action::Start => {
                let round = Lobby::rehydrate(message)?.start(&mut rand::rng());
                round.render(&ctx.path)?
            }
            Action::Stab(slot) => {
                let mut round = Round::rehydrate(message)?;
                match round.stab(actor, slot, &mut rand::rng()) {
                    Ok(Stab::Jumped) => debug!("[{}] Pirate jumped on {}", ctx.request_id, actor),
                    Ok(Stab::Safe) => {}
                    Err(rejected) => return Ok(rejection(&rejected.to_string())),
                }
                round.render(&ctx.path)?
            }
            Action::Rotate => {
                let mut round = Round::rehydrate(message)?;
                if let Err(rejected) = round.rotate(actor) {
                    return Ok(rejection(&rejected.to_string()));
                }
                round.render(&ctx.path)?
            }
        };
        Ok(Response::Message(reply))
    }
}

impl CommandNode for PirateRoulette {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }

    fn as_button(&self) -> Option<&dyn ButtonHandler> {
        Some(self)
    }
}
