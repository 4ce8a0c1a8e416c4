//! Dispatch error taxonomy
//!
//! Middleware failures are handled locally with an ephemeral notice.
//! Handler and delivery failures carry the command path and go to the log
//! relay.

use serenity::model::permissions::Permissions;
use thiserror::Error;

use crate::core::{error_embed, warn_embed};
use crate::dispatch::reply::Reply;
use crate::services::CommandMentions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    NotWhitelisted,
    ActorMissing(Permissions),
    BotMissing(Permissions),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route for `{path}`")]
    RoutingNotFound { path: String },

    #[error("interaction belongs to another user")]
    OwnershipViolation,

    #[error("permission denied: {0:?}")]
    PermissionDenied(Denial),

    #[error("cooldown active for another {remaining_ms}ms")]
    CooldownActive { remaining_ms: i64, until_ms: i64 },

    #[error("`{path}` requires a registered account")]
    RegistrationRequired { path: String },

    #[error("{tag} Execution Error - {path}")]
    HandlerExecution {
        tag: &'static str,
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{tag} Reply Error - {path}")]
    ReplyDelivery {
        tag: &'static str,
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

fn permission_list(permissions: Permissions) -> String {
    permissions
        .get_permission_names()
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl DispatchError {
    /// Rejected by middleware before any handler ran
    pub fn is_middleware(&self) -> bool {
        !matches!(
            self,
            DispatchError::HandlerExecution { .. } | DispatchError::ReplyDelivery { .. }
        )
    }

    /// Ephemeral notice for the actor, `None` for failures the user never sees
    pub fn notice(&self, mentions: &dyn CommandMentions) -> Option<Reply> {
        let embed = match self {
            DispatchError::RoutingNotFound { .. } => {
                error_embed("This command could not be found.")
            }
            DispatchError::OwnershipViolation => {
                error_embed("This interaction belongs to someone else.")
            }
            DispatchError::PermissionDenied(Denial::NotWhitelisted) => {
                error_embed("You are not allowed to use this command.")
            }
            DispatchError::PermissionDenied(Denial::ActorMissing(p)) => error_embed(&format!(
                "You need the following permissions: {}",
                permission_list(*p)
            )),
            DispatchError::PermissionDenied(Denial::BotMissing(p)) => error_embed(&format!(
                "I need the following permissions: {}",
                permission_list(*p)
            )),
            DispatchError::CooldownActive { until_ms, .. } => warn_embed(&format!(
                "You can use this command again <t:{}:R>.",
                (*until_ms as f64 / 1000.0).ceil() as i64
            )),
            DispatchError::RegistrationRequired { .. } => error_embed(&format!(
                "You need an account first. Create one with {}.",
                mentions.mention("account", None, Some("create"))
            )),
            DispatchError::HandlerExecution { .. } | DispatchError::ReplyDelivery { .. } => {
                return None
            }
        };
        Some(Reply::new().embed(embed).ephemeral())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MentionDirectory;

    fn text(reply: &Reply) -> String {
        reply.embeds[0].description.clone().unwrap_or_default()
    }

    #[test]
    fn test_cooldown_notice_uses_relative_timestamp() {
        let err = DispatchError::CooldownActive {
            remaining_ms: 1500,
            until_ms: 1_700_000_000_500,
        };
        let reply = err.notice(&MentionDirectory::new()).unwrap();
        assert!(reply.ephemeral);
        assert!(text(&reply).contains("<t:1700000001:R>"));
        assert_eq!(reply.embeds[0].color, Some(crate::core::WARN_COLOR));
    }

    #[test]
    fn test_permission_notices_are_distinct() {
        let mentions = MentionDirectory::new();
        let actor = DispatchError::PermissionDenied(Denial::ActorMissing(Permissions::MANAGE_GUILD))
            .notice(&mentions)
            .unwrap();
        let bot = DispatchError::PermissionDenied(Denial::BotMissing(Permissions::MANAGE_GUILD))
            .notice(&mentions)
            .unwrap();
        assert!(text(&actor).starts_with("You need"));
        assert!(text(&bot).starts_with("I need"));
        assert_ne!(text(&actor), text(&bot));
    }

    #[test]
    fn test_registration_notice_points_at_account_create() {
        let mentions = MentionDirectory::new();
        mentions.record("account", 9);
        let reply = DispatchError::RegistrationRequired {
            path: "game wallet".to_string(),
        }
        .notice(&mentions)
        .unwrap();
        assert!(text(&reply).contains("</account create:9>"));
    }

    #[test]
    fn test_handler_failures_have_no_notice() {
        let err = DispatchError::HandlerExecution {
            tag: "Button",
            path: "minigame tictactoe".to_string(),
            source: anyhow::anyhow!("boom"),
        };
        assert!(err.notice(&MentionDirectory::new()).is_none());
        assert!(!err.is_middleware());
        assert_eq!(err.to_string(), "Button Execution Error - minigame tictactoe");
        assert!(DispatchError::OwnershipViolation.is_middleware());
    }
}
