//! # Log Relay
//!
//! Forwards failure reports and command upload diffs to a Discord log channel.
//! Payloads sent before the gateway is ready are queued and flushed once an
//! HTTP client is attached. In development the relay only writes to the local
//! log.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Client and queue behind one lock, bounded queue
//! - 1.0.0: Pending queue, development drop, channel embeds

use async_trait::async_trait;
use log::{info, warn};
use serenity::builder::CreateEmbed;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{LogPayload, LogSink};
use crate::core::config::Environment;
use crate::core::{truncate_for_embed, ERROR_COLOR};

/// Payloads kept while waiting for the gateway, oldest dropped first
pub const MAX_PENDING: usize = 100;

/// The client slot and the queue, always changed together under one lock
struct Outbox<C> {
    client: Option<C>,
    pending: VecDeque<LogPayload>,
    capacity: usize,
}

impl<C: Clone> Outbox<C> {
    fn new(capacity: usize) -> Self {
        Self {
            client: None,
            pending: VecDeque::new(),
            capacity,
        }
    }

    /// The client to deliver with, or `None` once the payload is queued
    fn route(&mut self, payload: LogPayload) -> Option<(C, LogPayload)> {
        if let Some(client) = &self.client {
            return Some((client.clone(), payload));
        }
        if self.pending.len() >= self.capacity {
            if let Some(dropped) = self.pending.pop_front() {
                warn!("Log queue full, dropping '{}'", dropped.title);
            }
        }
        self.pending.push_back(payload);
        None
    }

    /// Install the client and hand back everything queued before it
    fn install(&mut self, client: C) -> Vec<LogPayload> {
        self.client = Some(client);
        self.pending.drain(..).collect()
    }
}

pub struct LogRelay {
    environment: Environment,
    channel_id: Option<u64>,
    outbox: Mutex<Outbox<Arc<Http>>>,
}

impl LogRelay {
    pub fn new(environment: Environment, channel_id: Option<u64>) -> Self {
        Self {
            environment,
            channel_id,
            outbox: Mutex::new(Outbox::new(MAX_PENDING)),
        }
    }

    /// Number of payloads waiting for the gateway
    pub fn pending_len(&self) -> usize {
        self.outbox.lock().map(|o| o.pending.len()).unwrap_or(0)
    }

    /// Attach the HTTP client and flush everything queued so far
    pub async fn attach(&self, http: Arc<Http>) {
        let queued = match self.outbox.lock() {
            Ok(mut outbox) => outbox.install(http.clone()),
            Err(_) => {
                warn!("Log relay lock poisoned, queued payloads lost");
                Vec::new()
            }
        };
        if !queued.is_empty() {
            info!("Flushing {} queued log payloads", queued.len());
        }
        for payload in queued {
            self.deliver(&http, payload).await;
        }
    }

    fn build_embed(payload: &LogPayload) -> CreateEmbed {
        let mut embed = CreateEmbed::default();
        embed.title(&payload.title);
        embed.description(truncate_for_embed(&format!("```\n{}\n```", payload.description)));
        embed.color(ERROR_COLOR);
        if let Some(request_id) = payload.request_id {
            embed.footer(|f| f.text(format!("request {request_id}")));
        }
        embed
    }

    async fn deliver(&self, http: &Http, payload: LogPayload) {
        let Some(channel_id) = self.channel_id else {
            return;
        };
        let embed = Self::build_embed(&payload);
        if let Err(e) = ChannelId(channel_id)
            .send_message(http, |m| m.set_embed(embed))
            .await
        {
            warn!("Failed to relay log payload '{}': {e}", payload.title);
        }
    }
}

#[async_trait]
impl LogSink for LogRelay {
    async fn send_log(&self, payload: LogPayload) {
        info!("[log] {}: {}", payload.title, payload.description);

        if self.environment.is_development() || self.channel_id.is_none() {
            return;
        }

        let routed = match self.outbox.lock() {
            Ok(mut outbox) => outbox.route(payload),
            Err(_) => None,
        };
        if let Some((http, payload)) = routed {
            self.deliver(&http, payload).await;
        }
    }
}
