//! Shared context for command handlers
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.1.0: Inventory and farm stores
//! - 2.0.0: Application context bundling registry, collaborators and clock; per-interaction context with early acknowledgement
//! - 1.0.0: Initial implementation with core shared state

use anyhow::Result;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::cooldown::{Clock, SystemClock};
use super::registry::CommandRegistry;
use crate::dispatch::delivery::Responder;
use crate::dispatch::event::InteractionEvent;
use crate::services::{AccountStore, CommandMentions, FarmStore, InventoryStore, LogSink, WalletStore};
use crate::token::{CommandPath, Owner, Token, Value};

const DEFAULT_AUTOCOMPLETE_BUDGET: Duration = Duration::from_millis(2500);

/// Process-wide state, built once at startup and shared by every interaction
pub struct AppContext {
    pub registry: CommandRegistry,
    pub accounts: Arc<dyn AccountStore>,
    pub wallets: Arc<dyn WalletStore>,
    pub inventories: Arc<dyn InventoryStore>,
    pub farms: Arc<dyn FarmStore>,
    pub logs: Arc<dyn LogSink>,
    pub mentions: Arc<dyn CommandMentions>,
    pub clock: Arc<dyn Clock>,
    pub autocomplete_budget: Duration,
}

impl AppContext {
    pub fn new(
        registry: CommandRegistry,
        accounts: Arc<dyn AccountStore>,
        wallets: Arc<dyn WalletStore>,
        inventories: Arc<dyn InventoryStore>,
        farms: Arc<dyn FarmStore>,
        logs: Arc<dyn LogSink>,
        mentions: Arc<dyn CommandMentions>,
    ) -> Self {
        Self {
            registry,
            accounts,
            wallets,
            inventories,
            farms,
            logs,
            mentions,
            clock: Arc::new(SystemClock),
            autocomplete_budget: DEFAULT_AUTOCOMPLETE_BUDGET,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_autocomplete_budget(mut self, budget: Duration) -> Self {
        self.autocomplete_budget = budget;
        self
    }
}

/// Everything a handler sees for one interaction
pub struct InteractionContext<'a> {
    pub app: &'a AppContext,
    pub event: &'a InteractionEvent,
    /// Resolved command path, the base for tokens this handler issues
    pub path: CommandPath,
    pub request_id: Uuid,
    responder: &'a dyn Responder,
    acknowledged: AtomicBool,
}

impl<'a> InteractionContext<'a> {
    pub fn new(
        app: &'a AppContext,
        event: &'a InteractionEvent,
        path: CommandPath,
        request_id: Uuid,
        responder: &'a dyn Responder,
    ) -> Self {
        Self {
            app,
            event,
            path,
            request_id,
            responder,
            acknowledged: AtomicBool::new(false),
        }
    }

    pub fn actor_id(&self) -> u64 {
        self.event.actor.id
    }

    /// Token rooted at this handler's path
    pub fn token(&self, owner: Owner) -> Token {
        Token::new(owner, self.path.clone())
    }

    /// Encode a custom id for a component this handler renders
    pub fn custom_id<I, V>(&self, owner: Owner, args: I) -> Result<String>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Ok(self.token(owner).with_args(args).encode()?)
    }

    /// Custom id owned by the acting user
    pub fn own_custom_id<I, V>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.custom_id(Owner::User(self.actor_id()), args)
    }

    /// Acknowledge now and deliver the real content later through the edit path
    pub async fn defer(&self, ephemeral: bool) -> Result<()> {
        if self.acknowledged.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("[{}] Deferring {} for {}", self.request_id, self.event.kind.label(), self.path);
        if let Err(e) = self.responder.acknowledge(self.event.kind, ephemeral).await {
            self.acknowledged.store(false, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::SeqCst)
    }

    pub fn mention(&self, name: &str, group: Option<&str>, sub: Option<&str>) -> String {
        self.app.mentions.mention(name, group, sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::event::{Actor, EventKind};
    use crate::testing::{test_app, RecordingResponder};
    use crate::token::decode;

    #[test]
    fn test_app_context_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppContext>();
        assert_send_sync::<InteractionContext<'_>>();
    }

    #[tokio::test]
    async fn test_custom_id_uses_resolved_path() {
        let (app, _) = test_app();
        let event = InteractionEvent::chat_input(Actor::new(77, "a"), "minigame tictactoe");
        let responder = RecordingResponder::new();
        let ctx = InteractionContext::new(
            &app,
            &event,
            CommandPath::with_sub("minigame", "tictactoe"),
            Uuid::new_v4(),
            &responder,
        );

        let id = ctx.own_custom_id([4u64]).unwrap();
        let token = decode(&id);
        assert_eq!(token.owner, Owner::User(77));
        assert_eq!(token.path.to_string(), "minigame tictactoe");
        assert_eq!(token.args, vec![Value::Int(4)]);
    }

    #[tokio::test]
    async fn test_defer_acknowledges_once() {
        let (app, _) = test_app();
        let event = InteractionEvent::chat_input(Actor::new(1, "a"), "help");
        let responder = RecordingResponder::new();
        let ctx = InteractionContext::new(&app, &event, CommandPath::new("help"), Uuid::new_v4(), &responder);

        assert!(!ctx.is_acknowledged());
        ctx.defer(true).await.unwrap();
        ctx.defer(true).await.unwrap();
        assert!(ctx.is_acknowledged());
        assert_eq!(responder.acks(), vec![(EventKind::ChatInput, true)]);
    }
}
