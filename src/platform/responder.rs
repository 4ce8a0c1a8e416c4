//! Serenity side of the [`Responder`] seam
//!
//! Maps each delivery path onto the matching interaction endpoint: initial
//! response, deferred acknowledgement, original-response edit, followup and
//! autocomplete result.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serenity::builder::CreateInteractionResponse;
use serenity::http::Http;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::autocomplete::AutocompleteInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use std::sync::Arc;

use super::convert::{create_components, create_embeds, create_modal_components};
use crate::dispatch::delivery::{Delivery, Responder};
use crate::dispatch::event::EventKind;
use crate::dispatch::reply::{Choice, Modal, Reply, Response};

/// The interaction a responder answers
pub enum PendingInteraction {
    Command(ApplicationCommandInteraction),
    Component(MessageComponentInteraction),
    Modal(ModalSubmitInteraction),
    Autocomplete(AutocompleteInteraction),
}

/// Run the same call against whichever interaction is pending.
/// Autocomplete interactions only accept suggestions.
macro_rules! on_interaction {
    ($pending:expr, $i:ident => $call:expr) => {
        match $pending {
            PendingInteraction::Command($i) => $call,
            PendingInteraction::Component($i) => $call,
            PendingInteraction::Modal($i) => $call,
            PendingInteraction::Autocomplete(_) => {
                bail!("autocomplete interactions can only receive suggestions")
            }
        }
    };
}

fn message_response<'a, 'b>(
    r: &'b mut CreateInteractionResponse<'a>,
    kind: InteractionResponseType,
    reply: &Reply,
    ephemeral: bool,
) -> &'b mut CreateInteractionResponse<'a> {
    r.kind(kind).interaction_response_data(|d| {
        if let Some(content) = &reply.content {
            d.content(content);
        }
        if !reply.embeds.is_empty() {
            d.set_embeds(create_embeds(&reply.embeds));
        }
        if let Some(rows) = &reply.components {
            d.set_components(create_components(rows));
        }
        if ephemeral {
            d.ephemeral(true);
        }
        d
    })
}

fn modal_response<'a, 'b>(
    r: &'b mut CreateInteractionResponse<'a>,
    modal: &Modal,
) -> &'b mut CreateInteractionResponse<'a> {
    r.kind(InteractionResponseType::Modal).interaction_response_data(|d| {
        d.custom_id(&modal.custom_id)
            .title(&modal.title)
            .set_components(create_modal_components(&modal.inputs))
    })
}

fn defer_response<'a, 'b>(
    r: &'b mut CreateInteractionResponse<'a>,
    kind: EventKind,
    ephemeral: bool,
) -> &'b mut CreateInteractionResponse<'a> {
    match kind {
        EventKind::Button | EventKind::StringSelect => r.kind(InteractionResponseType::DeferredUpdateMessage),
        _ => r
            .kind(InteractionResponseType::DeferredChannelMessageWithSource)
            .interaction_response_data(|d| d.ephemeral(ephemeral)),
    }
}

pub struct SerenityResponder {
    http: Arc<Http>,
    interaction: PendingInteraction,
}

impl SerenityResponder {
    pub fn new(http: Arc<Http>, interaction: PendingInteraction) -> Self {
        Self { http, interaction }
    }

    async fn initial_message(&self, kind: InteractionResponseType, reply: &Reply, ephemeral: bool) -> Result<()> {
        let http = &self.http;
        on_interaction!(&self.interaction, i => i
            .create_interaction_response(http, |r| message_response(r, kind, reply, ephemeral))
            .await?);
        Ok(())
    }

    async fn edit_original(&self, reply: &Reply) -> Result<()> {
        let http = &self.http;
        on_interaction!(&self.interaction, i => i
            .edit_original_interaction_response(http, |e| {
                if let Some(content) = &reply.content {
                    e.content(content);
                }
                if !reply.embeds.is_empty() {
                    e.set_embeds(create_embeds(&reply.embeds));
                }
                if let Some(rows) = &reply.components {
                    e.components(|c| {
                        *c = create_components(rows);
                        c
                    });
                }
                e
            })
            .await?);
        Ok(())
    }

    async fn followup(&self, reply: &Reply, ephemeral: bool) -> Result<()> {
        let http = &self.http;
        on_interaction!(&self.interaction, i => i
            .create_followup_message(http, |f| {
                if let Some(content) = &reply.content {
                    f.content(content);
                }
                if !reply.embeds.is_empty() {
                    f.set_embeds(create_embeds(&reply.embeds));
                }
                if let Some(rows) = &reply.components {
                    f.set_components(create_components(rows));
                }
                f.ephemeral(ephemeral)
            })
            .await?);
        Ok(())
    }

    async fn show_modal(&self, modal: &Modal) -> Result<()> {
        let http = &self.http;
        on_interaction!(&self.interaction, i => i
            .create_interaction_response(http, |r| modal_response(r, modal))
            .await?);
        Ok(())
    }
}

#[async_trait]
impl Responder for SerenityResponder {
    async fn acknowledge(&self, kind: EventKind, ephemeral: bool) -> Result<()> {
        let http = &self.http;
        on_interaction!(&self.interaction, i => i
            .create_interaction_response(http, |r| defer_response(r, kind, ephemeral))
            .await?);
        Ok(())
    }

    async fn respond(&self, delivery: Delivery, response: &Response) -> Result<()> {
        match (delivery, response) {
            (Delivery::FreshReply, Response::Message(reply)) => {
                self.initial_message(InteractionResponseType::ChannelMessageWithSource, reply, reply.ephemeral)
                    .await
            }
            (Delivery::FreshReply, Response::Notice(reply)) => {
                self.initial_message(InteractionResponseType::ChannelMessageWithSource, reply, true)
                    .await
            }
            (Delivery::UpdateInPlace, Response::Message(reply)) => {
                self.initial_message(InteractionResponseType::UpdateMessage, reply, false)
                    .await
            }
            (Delivery::EditReply, Response::Message(reply)) => self.edit_original(reply).await,
            (Delivery::Followup, Response::Message(reply)) => self.followup(reply, reply.ephemeral).await,
            (Delivery::Followup, Response::Notice(reply)) => self.followup(reply, true).await,
            (Delivery::ShowModal, Response::Modal(modal)) => self.show_modal(modal).await,
            (delivery, _) => Err(anyhow!("response cannot be delivered as {delivery:?}")),
        }
    }

    async fn suggest(&self, choices: &[Choice]) -> Result<()> {
        let PendingInteraction::Autocomplete(interaction) = &self.interaction else {
            bail!("suggestions need an autocomplete interaction");
        };
        interaction
            .create_autocomplete_response(&self.http, |r| {
                for choice in choices {
                    r.add_string_choice(&choice.name, &choice.value);
                }
                r
            })
            .await?;
        Ok(())
    }
}
