//! Outbound delivery decision
//!
//! | Event kind      | Acknowledged | Delivery        |
//! |-----------------|--------------|-----------------|
//! | slash / context | no           | fresh reply     |
//! | slash / context | yes          | edit reply      |
//! | button / select | no           | update in place |
//! | button / select | yes          | edit reply      |
//! | modal submit    | no           | fresh reply     |
//! | autocomplete    | n/a          | suggestions     |
//!
//! Notices are always a fresh ephemeral reply, or a followup once the
//! interaction has been acknowledged. Modals can only be shown as the first
//! response.

use anyhow::Result;
use async_trait::async_trait;

use super::event::EventKind;
use super::reply::{Choice, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    FreshReply,
    EditReply,
    UpdateInPlace,
    Followup,
    ShowModal,
    Suggestions,
}

/// Pick the delivery path, `None` when the response cannot be delivered at all
pub fn choose_delivery(kind: EventKind, acknowledged: bool, response: &Response) -> Option<Delivery> {
    if kind == EventKind::Autocomplete {
        return Some(Delivery::Suggestions);
    }
    match response {
        Response::Modal(_) if acknowledged => None,
        Response::Modal(_) if kind == EventKind::ModalSubmit => None,
        Response::Modal(_) => Some(Delivery::ShowModal),
        Response::Notice(_) if acknowledged => Some(Delivery::Followup),
        Response::Notice(_) => Some(Delivery::FreshReply),
        Response::Message(_) if acknowledged => Some(Delivery::EditReply),
        Response::Message(_) => Some(match kind {
            EventKind::Button | EventKind::StringSelect => Delivery::UpdateInPlace,
            _ => Delivery::FreshReply,
        }),
    }
}

/// Platform side of an interaction
#[async_trait]
pub trait Responder: Send + Sync {
    /// Deferred acknowledgement
    async fn acknowledge(&self, kind: EventKind, ephemeral: bool) -> Result<()>;

    async fn respond(&self, delivery: Delivery, response: &Response) -> Result<()>;

    async fn suggest(&self, choices: &[Choice]) -> Result<()>;
}
