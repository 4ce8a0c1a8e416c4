use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use plaza::commands::overrides::CommandOverrides;
use plaza::commands::{register_all, AppContext, CommandRegistry};
use plaza::core::Config;
use plaza::dispatch::Dispatcher;
use plaza::platform::{accept, upload_commands};
use plaza::services::{LogRelay, MentionDirectory, SqliteStore};

struct Handler {
    dispatcher: Arc<Dispatcher>,
    relay: Arc<LogRelay>,
    mentions: Arc<MentionDirectory>,
    dev_guild: Option<u64>,
    uploaded: AtomicBool,
}

impl Handler {
    fn new(
        dispatcher: Dispatcher,
        relay: Arc<LogRelay>,
        mentions: Arc<MentionDirectory>,
        dev_guild: Option<u64>,
    ) -> Self {
        Handler {
            dispatcher: Arc::new(dispatcher),
            relay,
            mentions,
            dev_guild,
            uploaded: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        // Log shard information
        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        self.relay.attach(ctx.http.clone()).await;

        // Every shard fires ready, the upload only happens once
        if self.uploaded.swap(true, Ordering::SeqCst) {
            return;
        }
        let definitions = self.dispatcher.app().registry.definitions();
        if let Err(e) = upload_commands(
            &ctx.http,
            definitions,
            self.dev_guild,
            &self.mentions,
            self.relay.as_ref(),
        )
        .await
        {
            error!("❌ Failed to upload application commands: {e}");
            self.uploaded.store(false, Ordering::SeqCst);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Some((event, responder)) = accept(ctx.http.clone(), interaction) else {
            debug!("Ping interaction received");
            return;
        };

        if let Err(e) = self.dispatcher.dispatch(&event, &responder).await {
            if e.is_middleware() {
                debug!("Interaction from {} rejected: {e}", event.actor.id);
            } else {
                warn!("Interaction from {} failed: {e}", event.actor.id);
            }
        }
    }
}

fn build_registry(config: &Config) -> Result<CommandRegistry> {
    let mut registry = register_all()?;
    let overrides = CommandOverrides::load(&config.commands_config_path)?;
    if !overrides.is_empty() {
        info!(
            "📄 Loaded {} command overrides from {}",
            overrides.commands.len(),
            config.commands_config_path
        );
        for key in registry.apply_overrides(&overrides) {
            warn!("Command override `{key}` does not match any registered command");
        }
    }
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Plaza ({:?})...", config.environment);

    let store = Arc::new(SqliteStore::open(&config.database_path)?);
    let relay = Arc::new(LogRelay::new(config.environment, config.log_channel_id));
    let mentions = Arc::new(MentionDirectory::new());

    let registry = build_registry(&config)?;
    info!("📋 Registered {} command paths", registry.paths().len());

    let app = AppContext::new(
        registry,
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        relay.clone(),
        mentions.clone(),
    )
    .with_autocomplete_budget(config.autocomplete_budget);

    let handler = Handler::new(
        Dispatcher::new(Arc::new(app)),
        relay,
        mentions,
        config.discord_guild_id,
    );

    let intents = GatewayIntents::GUILDS;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    let started = match config.shard_count {
        Some(shards) => {
            info!("Starting {shards} shards");
            client.start_shards(shards).await
        }
        None => client.start_autosharded().await,
    };

    if let Err(why) = started {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
