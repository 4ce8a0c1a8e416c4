//! Shop and inventory commands
//!
//! Handles: game shop buy, game shop sell, game shop items, game inventory
//!
//! A purchase only lands in the inventory after the wallet was charged, and a
//! sale only pays for the items actually taken out of it.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//!
//! ## Changelog
//! - 1.0.0: Buying, selling, the price list and the inventory view

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serenity::builder::CreateApplicationCommandOption;
use serenity::model::application::command::CommandOptionType;
use std::cmp::Ordering;

use crate::commands::context::InteractionContext;
use crate::commands::handler::{
    AutocompleteHandler, ChatInputHandler, CommandNode, StringSelectHandler,
};
use crate::commands::registry::{CommandRegistry, RegistryError, SubCommand};
use crate::core::{accent_embed, format_amount, ACCENT_COLOR};
use crate::dispatch::reply::{
    ActionRow, Choice, Embed, Reply, Response, SelectMenu, SelectOption,
};
use crate::games::items::{self, Category, Item, ITEMS};
use crate::games::rejection;
use crate::services::balance_of;
use crate::token::Value;

const ITEM_OPTION: &str = "item";
const AMOUNT_OPTION: &str = "amount";
const MAX_AMOUNT: i64 = 10_000;

pub fn register(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.register_subcommand(
        "game",
        SubCommand::new("buy", "Buy an item from the shop.", Buy)
            .group("shop")
            .argument(item_option("The item to buy."))
            .argument(amount_option("The amount of items to buy.", true)),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("sell", "Sell an item from your inventory.", Sell)
            .group("shop")
            .argument(item_option("The item to sell."))
            .argument(amount_option("The amount of items to sell.", true)),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("items", "Shows the price list.", PriceList).group("shop"),
    )?;
    registry.register_subcommand(
        "game",
        SubCommand::new("inventory", "Shows your inventory.", ShowInventory),
    )
}

fn item_option(description: &str) -> CreateApplicationCommandOption {
    let mut option = CreateApplicationCommandOption::default();
    option
        .kind(CommandOptionType::String)
        .name(ITEM_OPTION)
        .description(description)
        .set_autocomplete(true)
        .required(true);
    option
}

pub(super) fn amount_option(description: &str, required: bool) -> CreateApplicationCommandOption {
    let mut option = CreateApplicationCommandOption::default();
    option
        .kind(CommandOptionType::Integer)
        .name(AMOUNT_OPTION)
        .description(description)
        .min_int_value(1)
        .max_int_value(MAX_AMOUNT)
        .required(required);
    option
}

/// Ephemeral confirmation in the accent colour
pub(super) fn done(text: String) -> Response {
    Response::Message(
        Reply::new()
            .embed(Embed::new().description(text).color(ACCENT_COLOR))
            .ephemeral(),
    )
}

fn partial<'a>(ctx: &'a InteractionContext<'_>) -> &'a str {
    ctx.event
        .focused()
        .and_then(|o| o.value.as_str())
        .unwrap_or_default()
        .trim()
}

/// Keep items matching `typed`, best first; everything in catalogue order
/// when nothing is typed
fn rank(mut scored: Vec<(f64, Choice)>, typed: &str) -> Vec<Choice> {
    if !typed.is_empty() {
        scored.retain(|(score, _)| *score > 0.0);
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    }
    scored.into_iter().map(|(_, choice)| choice).collect()
}

/// The item and amount named by the slash options
fn requested(ctx: &InteractionContext<'_>) -> Option<(&'static Item, i64)> {
    let id = ctx.event.option_str(ITEM_OPTION).unwrap_or_default();
    let amount = ctx.event.option_int(AMOUNT_OPTION).unwrap_or(1).clamp(1, MAX_AMOUNT);
    items::item(id).map(|item| (item, amount))
}

pub struct Buy;

#[async_trait]
impl ChatInputHandler for Buy {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let Some((item, amount)) = requested(ctx) else {
            return Ok(rejection("The item does not exist."));
        };
        let Some(each) = item.buy else {
            return Ok(rejection("You can't purchase this item."));
        };

        let user = ctx.actor_id();
        let price = each * amount;
        if !ctx.app.wallets.spend_wallet(user, price).await? {
            let balance = balance_of(ctx.app.wallets.as_ref(), user).await?;
            return Ok(rejection(&format!(
                "You don't have enough money. (Short of {}, Wallet: {})",
                format_amount(price - balance),
                format_amount(balance)
            )));
        }
        ctx.app.inventories.adjust_inventory(user, item.id, amount).await?;
        debug!("[{}] {} bought {} {} for {}", ctx.request_id, user, amount, item.id, price);
        Ok(done(format!(
            "Purchased **{amount}** **{}** for **{}**.",
            item.name,
            format_amount(price)
        )))
    }
}

#[async_trait]
impl AutocompleteHandler for Buy {
    async fn autocomplete(&self, ctx: &InteractionContext<'_>) -> Result<Vec<Choice>> {
        let typed = partial(ctx);
        let scored = ITEMS
            .iter()
            .filter_map(|item| {
                let each = item.buy?;
                let name = format!("{} ({} each)", item.name, format_amount(each));
                Some((item.matches(typed), Choice::new(name, item.id)))
            })
            .collect();
        Ok(rank(scored, typed))
    }
}

impl CommandNode for Buy {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }

    fn as_autocomplete(&self) -> Option<&dyn AutocompleteHandler> {
        Some(self)
    }
}

pub struct Sell;

#[async_trait]
impl ChatInputHandler for Sell {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let Some((item, amount)) = requested(ctx) else {
            return Ok(rejection("The item does not exist."));
        };
        let Some(each) = item.sell else {
            return Ok(rejection("You can't sell this item."));
        };

        let user = ctx.actor_id();
        let taken = ctx.app.inventories.take_inventory(user, item.id, amount).await?;
        if taken == 0 {
            return Ok(rejection(&format!("You don't have any **{}**.", item.name)));
        }
        let earned = each * taken;
        ctx.app.wallets.adjust_wallet(user, earned, true).await?;
        debug!("[{}] {} sold {} {} for {}", ctx.request_id, user, taken, item.id, earned);
        Ok(done(format!(
            "Sold **{taken}** **{}** for **{}**.",
            item.name,
            format_amount(earned)
        )))
    }
}

#[async_trait]
impl AutocompleteHandler for Sell {
    async fn autocomplete(&self, ctx: &InteractionContext<'_>) -> Result<Vec<Choice>> {
        let typed = partial(ctx);
        let scored = ctx
            .app
            .inventories
            .get_inventory(ctx.actor_id())
            .await?
            .into_iter()
            .filter_map(|(id, count)| {
                let item = items::item(&id)?;
                let each = item.sell?;
                let name = format!("{} (x{count}, {} each)", item.name, format_amount(each));
                Some((item.matches(typed), Choice::new(name, item.id)))
            })
            .collect();
        Ok(rank(scored, typed))
    }
}

impl CommandNode for Sell {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }

    fn as_autocomplete(&self) -> Option<&dyn AutocompleteHandler> {
        Some(self)
    }
}

/// Shop prices by category, switched with a select menu
pub struct PriceList;

impl PriceList {
    fn menu(&self, ctx: &InteractionContext<'_>, current: Option<Category>) -> Result<ActionRow> {
        let options = Category::ALL
            .into_iter()
            .map(|c| SelectOption::new(c.label(), c.id()).emoji(c.emoji()))
            .collect();
        let placeholder = current.map_or("Categories", Category::label);
        let menu = SelectMenu::new(ctx.own_custom_id(Vec::<Value>::new())?, options).placeholder(placeholder);
        Ok(ActionRow::select(menu))
    }

    fn prices(&self, category: Category) -> Embed {
        let price = |p: Option<i64>| p.map_or_else(|| "-".to_string(), format_amount);
        ITEMS
            .iter()
            .filter(|item| item.is(category))
            .fold(
                accent_embed(format!("{} {}", category.emoji(), category.label())),
                |embed, item| {
                    embed.field(
                        item.name,
                        format!("Buy: {}\nSell: {}", price(item.buy), price(item.sell)),
                        true,
                    )
                },
            )
    }
}

#[async_trait]
impl ChatInputHandler for PriceList {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let embed = accent_embed("Shop").description("Pick a category below to see its prices.");
        Ok(Response::Message(Reply::new().embed(embed).row(self.menu(ctx, None)?)))
    }
}

#[async_trait]
impl StringSelectHandler for PriceList {
    async fn string_select(
        &self,
        ctx: &InteractionContext<'_>,
        _: &[Value],
        values: &[String],
    ) -> Result<Response> {
        let Some(category) = values.first().and_then(|v| Category::from_id(v)) else {
            return Ok(rejection("That category does not exist."));
        };
        let reply = Reply::new()
            .embed(self.prices(category))
            .row(self.menu(ctx, Some(category))?);
        Ok(Response::Message(reply))
    }
}

impl CommandNode for PriceList {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }

    fn as_string_select(&self) -> Option<&dyn StringSelectHandler> {
        Some(self)
    }
}

pub struct ShowInventory;

#[async_trait]
impl ChatInputHandler for ShowInventory {
    async fn chat_input(&self, ctx: &InteractionContext<'_>) -> Result<Response> {
        let inventory = ctx.app.inventories.get_inventory(ctx.actor_id()).await?;
        let title = format!("{}'s Inventory", ctx.event.actor.name);
        let embed = if inventory.is_empty() {
            accent_embed(title).description("Your inventory is empty.")
        } else {
            inventory.iter().fold(accent_embed(title), |embed, (id, count)| {
                embed.field(items::name_of(id), format!("x{}", format_amount(*count)), true)
            })
        };
        Ok(Response::Message(Reply::new().embed(embed)))
    }
}

impl CommandNode for ShowInventory {
    fn as_chat_input(&self) -> Option<&dyn ChatInputHandler> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_dispatcher;
    use crate::dispatch::delivery::Delivery;
    use crate::dispatch::event::{Actor, EventKind, InteractionEvent};
    use crate::dispatch::reply::{Component, Response};
    use crate::services::{balance_of, AccountStore, InventoryStore, WalletStore};
    use crate::testing::RecordingResponder;
    use serde_json::json;

    const USER: u64 = 5_151;

    fn actor() -> Actor {
        Actor::new(USER, "kim")
    }

    fn description(responder: &RecordingResponder) -> String {
        let (_, response) = responder.last().unwrap();
        let reply = match response {
            Response::Message(reply) | Response::Notice(reply) => reply,
            other => panic!("unexpected {other:?}"),
        };
        reply.embeds[0].description.clone().unwrap_or_default()
    }

    fn trade(sub: &str, item: &str, amount: i64) -> InteractionEvent {
        InteractionEvent::chat_input(actor(), &format!("game shop {sub}"))
            .with_option("item", json!(item))
            .with_option("amount", json!(amount))
    }

    #[tokio::test]
    async fn test_buy_charges_before_stocking() {
        let (dispatcher, handles) = test_dispatcher();
        handles.store.create_user(USER).await.unwrap();
        handles.store.adjust_wallet(USER, 5_000, true).await.unwrap();
        let responder = RecordingResponder::new();

        dispatcher.dispatch(&trade("buy", "wheat_seeds", 20), &responder).await.unwrap();
        assert_eq!(description(&responder), "Purchased **20** **Wheat Seeds** for **2,000**.");
        assert_eq!(balance_of(handles.store.as_ref(), USER).await.unwrap(), 3_000);

        dispatcher.dispatch(&trade("buy", "potato", 10), &responder).await.unwrap();
        assert!(matches!(responder.last(), Some((_, Response::Notice(_)))));
        assert_eq!(
            description(&responder),
            "You don't have enough money. (Short of 7,000, Wallet: 3,000)"
        );
        assert_eq!(
            handles.store.get_inventory(USER).await.unwrap(),
            vec![("wheat_seeds".to_string(), 20)]
        );
        assert_eq!(balance_of(handles.store.as_ref(), USER).await.unwrap(), 3_000);

        dispatcher.dispatch(&trade("buy", "wheat", 1), &responder).await.unwrap();
        assert_eq!(description(&responder), "You can't purchase this item.");
        dispatcher.dispatch(&trade("buy", "diamond", 1), &responder).await.unwrap();
        assert_eq!(description(&responder), "The item does not exist.");
    }

    #[tokio::test]
    async fn test_sell_pays_only_for_held_items() {
        let (dispatcher, handles) = test_dispatcher();
        handles.store.create_user(USER).await.unwrap();
        handles.store.adjust_inventory(USER, "wheat", 3).await.unwrap();
        let responder = RecordingResponder::new();

        dispatcher.dispatch(&trade("sell", "wheat", 5), &responder).await.unwrap();
        assert_eq!(description(&responder), "Sold **3** **Wheat** for **6,150**.");
        assert_eq!(balance_of(handles.store.as_ref(), USER).await.unwrap(), 6_150);
        assert!(handles.store.get_inventory(USER).await.unwrap().is_empty());

        dispatcher.dispatch(&trade("sell", "wheat", 1), &responder).await.unwrap();
        assert_eq!(description(&responder), "You don't have any **Wheat**.");
        dispatcher.dispatch(&trade("sell", "wheat_seeds", 1), &responder).await.unwrap();
        assert_eq!(description(&responder), "You can't sell this item.");
        assert_eq!(balance_of(handles.store.as_ref(), USER).await.unwrap(), 6_150);
    }

    #[tokio::test]
    async fn test_autocomplete_lists_buyable_and_held_items() {
        let (dispatcher, handles) = test_dispatcher();
        handles.store.create_user(USER).await.unwrap();
        handles.store.adjust_inventory(USER, "melon", 2).await.unwrap();
        handles.store.adjust_inventory(USER, "melon_seeds", 4).await.unwrap();
        let responder = RecordingResponder::new();

        let event = InteractionEvent::autocomplete(actor(), "game shop buy", "item", "");
        dispatcher.dispatch(&event, &responder).await.unwrap();
        assert_eq!(responder.suggestions().pop().unwrap().len(), 6);

        let event = InteractionEvent::autocomplete(actor(), "game shop buy", "item", "wheat");
        dispatcher.dispatch(&event, &responder).await.unwrap();
        let choices = responder.suggestions().pop().unwrap();
        assert_eq!(choices[0].value, "wheat_seeds");
        assert_eq!(choices[0].name, "Wheat Seeds (100 each)");

        let event = InteractionEvent::autocomplete(actor(), "game shop sell", "item", "");
        dispatcher.dispatch(&event, &responder).await.unwrap();
        let choices = responder.suggestions().pop().unwrap();
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].name, "Melon (x2, 4,700 each)");
    }

    #[tokio::test]
    async fn test_price_list_switches_category() {
        let (dispatcher, handles) = test_dispatcher();
        handles.store.create_user(USER).await.unwrap();
        let responder = RecordingResponder::new();

        dispatcher
            .dispatch(&InteractionEvent::chat_input(actor(), "game shop items"), &responder)
            .await
            .unwrap();
        let reply = responder.last_message().unwrap();
        let Component::Select(menu) = &reply.components.as_ref().unwrap()[0].components[0] else {
            panic!("expected a select menu");
        };
        assert_eq!(menu.options.len(), 2);

        let mut select = InteractionEvent::component(EventKind::StringSelect, actor(), menu.custom_id.clone(), None);
        select.values = vec!["seeds".to_string()];
        let delivery = dispatcher.dispatch(&select, &responder).await.unwrap();
        assert_eq!(delivery, Delivery::UpdateInPlace);

        let reply = responder.last_message().unwrap();
        let embed = &reply.embeds[0];
        assert_eq!(embed.title.as_deref(), Some("🌱 Seeds"));
        assert_eq!(embed.field_value("Wheat Seeds"), Some("Buy: 100\nSell: -"));
        assert_eq!(embed.field_value("Potato"), Some("Buy: 1,000\nSell: 970"));
        assert_eq!(embed.field_value("Wheat"), None);
    }

    #[tokio::test]
    async fn test_inventory_lists_counts() {
        let (dispatcher, handles) = test_dispatcher();
        handles.store.create_user(USER).await.unwrap();
        let responder = RecordingResponder::new();
        let event = InteractionEvent::chat_input(actor(), "game inventory");

        dispatcher.dispatch(&event, &responder).await.unwrap();
        let reply = responder.last_message().unwrap();
        assert_eq!(reply.embeds[0].description.as_deref(), Some("Your inventory is empty."));

        handles.store.adjust_inventory(USER, "carrot", 1_200).await.unwrap();
        dispatcher.dispatch(&event, &responder).await.unwrap();
        let reply = responder.last_message().unwrap();
        assert_eq!(reply.embeds[0].title.as_deref(), Some("kim's Inventory"));
        assert_eq!(reply.embeds[0].field_value("Carrot"), Some("x1,200"));
    }
}
