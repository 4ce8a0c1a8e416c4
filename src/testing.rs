//! Test doubles for the dispatcher and its collaborators

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::commands::context::AppContext;
use crate::commands::cooldown::ManualClock;
use crate::commands::registry::CommandRegistry;
use crate::dispatch::delivery::{Delivery, Responder};
use crate::dispatch::event::EventKind;
use crate::dispatch::reply::{Choice, MessageSnapshot, Reply, Response};
use crate::services::{LogPayload, LogSink, MemoryStore, MentionDirectory};

/// Start of every test clock, 2023-11-14T22:13:20Z
pub const TEST_EPOCH_MS: i64 = 1_700_000_000_000;

/// Records everything the dispatcher sends
#[derive(Default)]
pub struct RecordingResponder {
    acks: Mutex<Vec<(EventKind, bool)>>,
    responses: Mutex<Vec<(Delivery, Response)>>,
    suggestions: Mutex<Vec<Vec<Choice>>>,
    fail_respond: AtomicBool,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `respond` call fails from now on
    pub fn failing() -> Self {
        let responder = Self::default();
        responder.fail_respond.store(true, Ordering::SeqCst);
        responder
    }

    pub fn acks(&self) -> Vec<(EventKind, bool)> {
        self.acks.lock().unwrap().clone()
    }

    pub fn responses(&self) -> Vec<(Delivery, Response)> {
        self.responses.lock().unwrap().clone()
    }

    pub fn suggestions(&self) -> Vec<Vec<Choice>> {
        self.suggestions.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<(Delivery, Response)> {
        self.responses.lock().unwrap().last().cloned()
    }

    /// Body of the last delivered message, skipping notices
    pub fn last_message(&self) -> Option<Reply> {
        self.responses
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|(_, r)| match r {
                Response::Message(reply) => Some(reply.clone()),
                _ => None,
            })
    }

    /// The last delivered message as the platform would hand it back
    pub fn snapshot(&self) -> MessageSnapshot {
        MessageSnapshot::from_reply(&self.last_message().unwrap_or_default())
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn acknowledge(&self, kind: EventKind, ephemeral: bool) -> Result<()> {
        self.acks.lock().unwrap().push((kind, ephemeral));
        Ok(())
    }

    async fn respond(&self, delivery: Delivery, response: &Response) -> Result<()> {
        if self.fail_respond.load(Ordering::SeqCst) {
            bail!("Invalid Form Body");
        }
        self.responses
            .lock()
            .unwrap()
            .push((delivery, response.clone()));
        Ok(())
    }

    async fn suggest(&self, choices: &[Choice]) -> Result<()> {
        self.suggestions.lock().unwrap().push(choices.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLogSink {
    payloads: Mutex<Vec<LogPayload>>,
}

impl MemoryLogSink {
    pub fn payloads(&self) -> Vec<LogPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn send_log(&self, payload: LogPayload) {
        self.payloads.lock().unwrap().push(payload);
    }
}

/// Handles on the collaborators behind a test [`AppContext`]
pub struct TestHandles {
    pub store: Arc<MemoryStore>,
    pub logs: Arc<MemoryLogSink>,
    pub clock: Arc<ManualClock>,
    pub mentions: Arc<MentionDirectory>,
}

pub fn test_app() -> (AppContext, TestHandles) {
    test_app_with(CommandRegistry::new())
}

pub fn test_app_with(registry: CommandRegistry) -> (AppContext, TestHandles) {
    let handles = TestHandles {
        store: Arc::new(MemoryStore::new()),
        logs: Arc::new(MemoryLogSink::default()),
        clock: Arc::new(ManualClock::new(TEST_EPOCH_MS)),
        mentions: Arc::new(MentionDirectory::new()),
    };
    let app = AppContext::new(
        registry,
        handles.store.clone(),
        handles.store.clone(),
        handles.store.clone(),
        handles.store.clone(),
        handles.logs.clone(),
        handles.mentions.clone(),
    )
    .with_clock(handles.clock.clone());
    (app, handles)
}
