//! Farm commands
//!
//! Handles: game farm plant, game farm harvest, game farm status,
//! game farm expand
//!
//! Seeds move from the inventory into fallow plots in one store step, and a
//! harvest clears ripe plots before paying out their produce, so a plot is
//! never harvested twice.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//!
//! ## Changelog
//! - 1.0.0: Planting, harvesting, status summary and land purchases

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serenity::builder::CreateApplicationCommandOption;
use serenity::model::application::command::CommandOptionType;
use std::cmp::Ordering;
use std::time::Duration;

use super::shop::{amount_option, done};
use crate::commands::context::InteractionContext;
use crate::commands::handler::{AutocompleteHandler, ChatInputHandler, CommandNode};
use crate::commands::registry::{CommandOptions, CommandRegistry, RegistryError, SubCommand};
use crate::core::{accent_embed, error_embed, format_amount};
use crate::dispatch::reply::{Choice, Reply, Response};
use crate::games::farm::{
    describe_patches, expansion_price, expansion_size, growth_ms, patches, roll_yield, MAX_PLOTS,
};
use crate::games::items::{self, Category};
use crate::games::rejection;
use crate::services::balance_of;

const CROP_OPTION: &str = "crop";
const AMOUNT_OPTION: &str = "amount";

pub fn register(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    let mut crop = CreateApplicationCommandOption::default();
    crop.kind(CommandOptionType::String)
        .name(CROP_OPTION)
        .description("The crop to plant.")
        .set_autocomplete(true)
        .required(true);

    registry.register_subcommand(
        "game",
        SubCommand::new("plant", "Plant seeds in the farm.", Plant)
            .group("farm")
            .argument(crop)
            .argument(amount_option("The amount of seeds to plant.", true)),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("harvest", "Harvest the fully grown crops in your farm.", Harvest).group("farm"),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("status", "Shows the current status of your farm.", Status)
            .group("farm")
            .options(CommandOptions {
                cooldown: Some(Duration::from_secs(5)),
                ..Default::default()
            }),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("expand", "Expand your farm.", Expand)
            .group("farm")
            .options(CommandOptions {
                cooldown: Some(Duration::from_secs(5)),
                ..Default::default()
            })
            .argument(amount_option("The amount of land to buy.", false)),
    )
}

fn no_land(ctx: &InteractionContext<'_>) -> String {
    format!(
        "You don't have any land.\nYou can expand your farm with {}.",
        ctx.mention("game", Some("farm"), Some("expand"))
    )
}

pub struct Plant;

#[async_trait]
impl ChatInputHandler for Plant {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let crop = ctx.event.option_str(CROP_OPTION).unwrap_or_default();
        let Some(seed) = items::item(crop).filter(|i| i.growth.is_some()) else {
            return Ok(rejection("That is not a seed."));
        };
        let amount = ctx.event.option_int(AMOUNT_OPTION).unwrap_or(1).max(1);

        let user = ctx.actor_id();
        let plots = ctx.app.farms.get_plots(user).await?;
        if plots.is_empty() {
            return Ok(rejection(&no_land(ctx)));
        }
        if plots.iter().all(|p| p.crop.is_some()) {
            return Ok(rejection("Every plot is already in use."));
        }

        let now = ctx.app.clock.now_ms();
        let planted = ctx.app.farms.plant(user, seed.id, amount, now).await?;
        if planted == 0 {
            return Ok(rejection(&format!("You don't have **{}**.", seed.name)));
        }
        debug!("[{}] {} planted {} {}", ctx.request_id, user, planted, seed.id);
        Ok(done(format!("Planted **{planted}** **{}**.", seed.name)))
    }
}

#[async_trait]
impl AutocompleteHandler for Plant {
    async fn autocomplete(&self, ctx: &InteractionContext<'_>) -> Result<Vec<Choice>> {
        let typed = ctx
            .event
            .focused()
            .and_then(|o| o.value.as_str())
            .unwrap_or_default()
            .trim();

        let mut seeds: Vec<(f64, Choice)> = ctx
            .app
            .inventories
            .get_inventory(ctx.actor_id())
            .await?
            .into_iter()
            .filter_map(|(id, count)| {
                let item = items::item(&id).filter(|i| i.is(Category::Seeds))?;
                let score = item.matches(typed);
                (typed.is_empty() || score > 0.0)
                    .then(|| (score, Choice::new(format!("{} ({count})", item.name), item.id)))
            })
            .collect();
        seeds.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        Ok(seeds.into_iter().map(|(_, choice)| choice).collect())
    }
}

impl CommandNode for Plant {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }

    fn as_autocomplete(&self) -> Option<&dyn AutocompleteHandler> {
        Some(self)
    }
}

pub struct Harvest;

#[async_trait]
impl ChatInputHandler for Harvest {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let user = ctx.actor_id();
        let farms = ctx.app.farms.as_ref();
        if farms.get_plots(user).await?.is_empty() {
            return Ok(rejection(&no_land(ctx)));
        }

        let now = ctx.app.clock.now_ms();
        let mut harvested: Vec<(&str, i64)> = Vec::new();
        for seed in items::ITEMS.iter() {
            let Some(growth) = seed.growth else {
                continue;
            };
            let cleared = farms.clear_ripe(user, seed.id, now - growth_ms(&growth)).await?;
            if cleared == 0 {
                continue;
            }
            let amount = roll_yield(&growth, cleared, &mut rand::rng());
            ctx.app.inventories.adjust_inventory(user, growth.yields, amount).await?;
            match harvested.iter_mut().find(|(id, _)| *id == growth.yields) {
                Some((_, total)) => *total += amount,
                None => harvested.push((growth.yields, amount)),
            }
        }

        let growing = describe_patches(&patches(&farms.get_plots(user).await?));
        if harvested.is_empty() {
            let mut embed = error_embed("There's no crop to harvest.");
            if !growing.is_empty() {
                embed = embed.field("Growing", growing, false);
            }
            return Ok(Response::Notice(Reply::new().embed(embed).ephemeral()));
        }

        debug!("[{}] {} harvested {:?}", ctx.request_id, user, harvested);
        let mut text = harvested
            .iter()
            .map(|(id, amount)| format!("**{}**: **{}**", items::name_of(id), format_amount(*amount)))
            .collect::<Vec<_>>()
            .join("\n");
        if !growing.is_empty() {
            text = format!("{text}\n{growing}");
        }
        Ok(done(text))
    }
}

impl CommandNode for Harvest {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }
}

pub struct Status;

#[async_trait]
impl ChatInputHandler for Status {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let plots = ctx.app.farms.get_plots(ctx.actor_id()).await?;
        let mut embed = accent_embed(format!("{}'s Farm", ctx.event.actor.name));
        if plots.is_empty() {
            embed = embed.description(no_land(ctx));
        } else {
            let growing = describe_patches(&patches(&plots));
            let planted = plots.iter().filter(|p| p.crop.is_some()).count();
            embed = embed
                .description(if growing.is_empty() {
                    "Nothing is growing.".to_string()
                } else {
                    growing
                })
                .field("Plots", format!("{planted}/{} planted", plots.len()), true);
        }
        Ok(Response::Message(Reply::new().embed(embed)))
    }
}

impl CommandNode for Status {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }
}

pub struct Expand;

#[async_trait]
impl ChatInputHandler for Expand {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let user = ctx.actor_id();
        let requested = ctx.event.option_int(AMOUNT_OPTION).unwrap_or(1).clamp(1, MAX_PLOTS as i64);
        let owned = ctx.app.farms.get_plots(user).await?.len();
        let size = expansion_size(owned, requested as usize);
        if size == 0 {
            return Ok(rejection("You can't expand the farm anymore."));
        }

        let price = expansion_price(owned, size);
        if !ctx.app.wallets.spend_wallet(user, price).await? {
            let balance = balance_of(ctx.app.wallets.as_ref(), user).await?;
            return Ok(rejection(&format!(
                "You don't have enough money. (Short of {}, Wallet: {})",
                format_amount(price - balance),
                format_amount(balance)
            )));
        }
        let total = ctx.app.farms.add_plots(user, size).await?;
        debug!("[{}] {} bought {} plots for {}", ctx.request_id, user, size, price);
        Ok(done(format!(
            "Expanded the farm by **{size}** plots for **{}**. You now own **{total}**.",
            format_amount(price)
        )))
    }
}

impl CommandNode for Expand {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }
}
