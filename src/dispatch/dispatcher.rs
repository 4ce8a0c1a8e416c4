//! # Interaction Dispatcher
//!
//! Turns one [`InteractionEvent`] into a handler invocation and the handler's
//! [`Response`] into a delivery. Every event is tagged with a request id that
//! prefixes its log lines.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Token routing, middleware pipeline, delivery table, autocomplete budget
//! - 1.0.0: Slash command routing by name

use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::time::timeout;
use uuid::Uuid;

use super::delivery::{choose_delivery, Delivery, Responder};
use super::error::DispatchError;
use super::event::{EventKind, InteractionEvent};
use super::middleware;
use super::reply::{Choice, Response};
use crate::commands::context::{AppContext, InteractionContext};
use crate::commands::handler::{Capability, CommandNode};
use crate::commands::registry::{CommandRegistry, Resolved};
use crate::core::{truncate_chars, MAX_CHOICES};
use crate::services::LogPayload;
use crate::token::{decode, CommandPath, Owner, Value};

/// Platform limit on an autocomplete choice name
const CHOICE_NAME_LIMIT: usize = 100;

/// Where an event is headed, before middleware
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: CommandPath,
    /// `None` for fresh invocations, which carry no token
    pub owner: Option<Owner>,
    pub args: Vec<Value>,
}

/// Path named by the structured fields of a slash command or autocomplete event
fn structured_path(event: &InteractionEvent) -> CommandPath {
    match (&event.subcommand_group, &event.subcommand) {
        (Some(group), Some(sub)) => CommandPath::with_sub(&event.command_name, format!("{group} {sub}")),
        (None, Some(sub)) => CommandPath::with_sub(&event.command_name, sub),
        _ => CommandPath::new(&event.command_name),
    }
}

/// Work out the target path and arguments of an event
pub fn route(registry: &CommandRegistry, event: &InteractionEvent) -> Result<Route, DispatchError> {
    if !event.kind.carries_token() {
        return Ok(Route {
            path: structured_path(event),
            owner: None,
            args: Vec::new(),
        });
    }

    let raw = event.custom_id.as_deref().unwrap_or_default();
    if raw.is_empty() {
        return Err(DispatchError::RoutingNotFound {
            path: String::new(),
        });
    }
    let mut token = decode(raw);

    // pipe-separated form, `owner|command|sub|…` or `owner|command|group|sub|…`
    if let Some(command) = registry.get(&token.path.command) {
        if command.has_subcommands() && token.promote_subcommand() {
            let key = token.path.sub.clone().unwrap_or_default();
            if command.subcommand(&key).is_none() {
                if let Some(next) = token.args.first() {
                    let grouped = format!("{key} {next}");
                    if command.subcommand(&grouped).is_some() {
                        token.args.remove(0);
                        token.path.sub = Some(grouped);
                    }
                }
            }
        }
    }

    Ok(Route {
        path: token.path,
        owner: Some(token.owner),
        args: token.args,
    })
}

pub struct Dispatcher {
    app: Arc<AppContext>,
}

impl Dispatcher {
    pub fn new(app: Arc<AppContext>) -> Self {
        Self { app }
    }

    pub fn app(&self) -> &AppContext {
        &self.app
    }

    /// Handle one interaction end to end
    pub async fn dispatch(
        &self,
        event: &InteractionEvent,
        responder: &dyn Responder,
    ) -> Result<Delivery, DispatchError> {
        let request_id = Uuid::new_v4();
        debug!(
            "[{request_id}] {} from {} ({})",
            event.kind.label(),
            event.actor.name,
            event.actor.id
        );

        let result = if event.kind == EventKind::Autocomplete {
            self.autocomplete(event, responder, request_id).await
        } else {
            self.interaction(event, responder, request_id).await
        };

        match &result {
            Ok(delivery) => debug!("[{request_id}] Replied via {delivery:?}"),
            Err(e) => debug!("[{request_id}] Failed: {e}"),
        }
        result
    }

    fn resolve<'a>(
        &'a self,
        event: &InteractionEvent,
        path: &CommandPath,
    ) -> Result<(Resolved<'a>, &'a Arc<dyn CommandNode>), DispatchError> {
        let not_found = || DispatchError::RoutingNotFound {
            path: path.to_string(),
        };
        let resolved = self
            .app
            .registry
            .resolve(path)
            .filter(|r| r.allowed_in(event.guild_id))
            .ok_or_else(not_found)?;
        let node = resolved
            .node_for(Capability::from(event.kind), !event.kind.is_fresh_invocation())
            .ok_or_else(not_found)?;
        Ok((resolved, node))
    }

    async fn interaction(
        &self,
        event: &InteractionEvent,
        responder: &dyn Responder,
        request_id: Uuid,
    ) -> Result<Delivery, DispatchError> {
        let app = self.app.as_ref();
        let tag = event.kind.label();

        let (resolved, node, route) = match self.admit(event).await {
            Ok(checked) => checked,
            Err(e) => {
                self.reject(event, responder, request_id, &e).await;
                return Err(e);
            }
        };

        let path = resolved.path();
        info!("[{request_id}] {tag} {path} by {}", event.actor.id);

        let ctx = InteractionContext::new(app, event, path.clone(), request_id, responder);
        let response = match invoke(node.as_ref(), &ctx, event, &route.args).await {
            Some(Ok(response)) => response,
            Some(Err(source)) => {
                let e = DispatchError::HandlerExecution {
                    tag,
                    path: path.to_string(),
                    source,
                };
                self.report(request_id, &e).await;
                return Err(e);
            }
            None => {
                return Err(DispatchError::RoutingNotFound {
                    path: path.to_string(),
                })
            }
        };

        let acknowledged = ctx.is_acknowledged();
        let delivered = match choose_delivery(event.kind, acknowledged, &response) {
            Some(delivery) => responder
                .respond(delivery, &response)
                .await
                .map(|()| delivery),
            None => Err(anyhow::anyhow!(
                "a modal cannot follow an acknowledged or submitted interaction"
            )),
        };

        match delivered {
            Ok(delivery) => Ok(delivery),
            Err(source) => {
                let e = DispatchError::ReplyDelivery {
                    tag,
                    path: path.to_string(),
                    source,
                };
                self.report(request_id, &e).await;
                Err(e)
            }
        }
    }

    /// Route, resolve and run middleware
    async fn admit(
        &self,
        event: &InteractionEvent,
    ) -> Result<(Resolved<'_>, &Arc<dyn CommandNode>, Route), DispatchError> {
        let route = route(&self.app.registry, event)?;
        let (resolved, node) = self.resolve(event, &route.path)?;
        middleware::run(&self.app, event, &resolved, route.owner.as_ref()).await?;
        Ok((resolved, node, route))
    }

    /// Middleware and routing failures: notice the user, log only the unexpected
    async fn reject(
        &self,
        event: &InteractionEvent,
        responder: &dyn Responder,
        request_id: Uuid,
        e: &DispatchError,
    ) {
        let Some(notice) = e.notice(self.app.mentions.as_ref()) else {
            self.report(request_id, e).await;
            return;
        };
        debug!("[{request_id}] Rejected: {e}");
        let response = Response::Notice(notice);
        if let Some(delivery) = choose_delivery(event.kind, false, &response) {
            if let Err(err) = responder.respond(delivery, &response).await {
                warn!("[{request_id}] Failed to send notice: {err:#}");
            }
        }
    }

    /// Forward a handler or delivery failure to the log sink
    async fn report(&self, request_id: Uuid, e: &DispatchError) {
        error!("[{request_id}] {e}: {:#}", SourceDisplay(e));
        self.app.logs.send_log(payload_for(request_id, e)).await;
    }

    async fn autocomplete(
        &self,
        event: &InteractionEvent,
        responder: &dyn Responder,
        request_id: Uuid,
    ) -> Result<Delivery, DispatchError> {
        let app = self.app.as_ref();
        let path = structured_path(event);
        let (resolved, node) = self.resolve(event, &path).map_err(|e| {
            warn!("[{request_id}] Autocomplete for unknown path: {e}");
            e
        })?;
        let Some(handler) = node.as_autocomplete() else {
            return Err(DispatchError::RoutingNotFound {
                path: path.to_string(),
            });
        };

        let path = resolved.path();
        let ctx = InteractionContext::new(app, event, path.clone(), request_id, responder);
        let choices = match timeout(app.autocomplete_budget, handler.autocomplete(&ctx)).await {
            Ok(Ok(choices)) => choices,
            Ok(Err(source)) => {
                warn!("[{request_id}] Autocomplete for {path} failed: {source:#}");
                return Err(DispatchError::HandlerExecution {
                    tag: event.kind.label(),
                    path: path.to_string(),
                    source,
                });
            }
            Err(_) => {
                warn!(
                    "[{request_id}] Autocomplete for {path} exceeded {}ms",
                    app.autocomplete_budget.as_millis()
                );
                return Err(DispatchError::HandlerExecution {
                    tag: event.kind.label(),
                    path: path.to_string(),
                    source: anyhow::anyhow!("autocomplete timed out"),
                });
            }
        };

        let choices: Vec<Choice> = choices
            .into_iter()
            .take(MAX_CHOICES)
            .map(|c| Choice::new(truncate_chars(&c.name, CHOICE_NAME_LIMIT), c.value))
            .collect();

        if let Err(source) = responder.suggest(&choices).await {
            warn!("[{request_id}] Autocomplete reply for {path} failed: {source:#}");
            return Err(DispatchError::ReplyDelivery {
                tag: event.kind.label(),
                path: path.to_string(),
                source,
            });
        }
        Ok(Delivery::Suggestions)
    }
}

/// Call the handler matching the event kind, `None` if the node lacks it
async fn invoke(
    node: &dyn CommandNode,
    ctx: &InteractionContext<'_>,
    event: &InteractionEvent,
    args: &[Value],
) -> Option<anyhow::Result<Response>> {
    Some(match event.kind {
        EventKind::ChatInput => node.as_chat_input()?.chat_input(ctx).await,
        EventKind::Button => node.as_button()?.button(ctx, args).await,
        EventKind::StringSelect => {
            node.as_string_select()?
                .string_select(ctx, args, &event.values)
                .await
        }
        EventKind::ModalSubmit => node.as_modal_submit()?.modal_submit(ctx, args).await,
        EventKind::UserContextMenu => node.as_user_context_menu()?.user_context_menu(ctx).await,
        EventKind::MessageContextMenu => {
            node.as_message_context_menu()?
                .message_context_menu(ctx)
                .await
        }
        EventKind::Autocomplete => return None,
    })
}

fn payload_for(request_id: Uuid, e: &DispatchError) -> LogPayload {
    LogPayload::new(e.to_string(), format!("{:#}", SourceDisplay(e))).with_request_id(request_id)
}

/// Displays the wrapped `anyhow` chain of a handler or delivery failure
struct SourceDisplay<'a>(&'a DispatchError);

impl std::fmt::Display for SourceDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            DispatchError::HandlerExecution { source, .. }
            | DispatchError::ReplyDelivery { source, .. } => {
                if f.alternate() {
                    write!(f, "{source:#}")
                } else {
                    write!(f, "{source}")
                }
            }
            other => write!(f, "{other}"),
        }
    }
}
