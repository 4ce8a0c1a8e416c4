//! Pre-handler checks
//!
//! Run in order, the first failure short-circuits:
//! ownership, whitelist, permissions (actor then bot), cooldown, registration.

use log::debug;
use serenity::model::permissions::Permissions;

use super::error::{Denial, DispatchError};
use super::event::InteractionEvent;
use crate::commands::context::AppContext;
use crate::commands::registry::Resolved;
use crate::token::Owner;

/// Permissions from `required` that `held` lacks; an unreported set holds nothing
fn missing(required: Permissions, held: Option<Permissions>) -> Permissions {
    match held {
        Some(held) => required & !held,
        None => required,
    }
}

pub fn check_ownership(owner: Option<&Owner>, actor: u64) -> Result<(), DispatchError> {
    match owner {
        Some(owner) if !owner.permits(actor) => Err(DispatchError::OwnershipViolation),
        _ => Ok(()),
    }
}

pub fn check_whitelist(resolved: &Resolved<'_>, actor: u64) -> Result<(), DispatchError> {
    if resolved.whitelists().iter().all(|list| list.contains(&actor)) {
        Ok(())
    } else {
        Err(DispatchError::PermissionDenied(Denial::NotWhitelisted))
    }
}

pub fn check_permissions(
    resolved: &Resolved<'_>,
    event: &InteractionEvent,
) -> Result<(), DispatchError> {
    let Some(required) = resolved.permissions() else {
        return Ok(());
    };

    let actor_missing = missing(required, event.actor.permissions);
    if !actor_missing.is_empty() {
        return Err(DispatchError::PermissionDenied(Denial::ActorMissing(actor_missing)));
    }

    // platforms that do not report the bot's permissions are trusted
    if let Some(bot) = event.bot_permissions {
        let bot_missing = missing(required, Some(bot));
        if !bot_missing.is_empty() {
            return Err(DispatchError::PermissionDenied(Denial::BotMissing(bot_missing)));
        }
    }
    Ok(())
}

/// Check and arm the cooldown in one step, before the handler runs
pub fn check_cooldown(
    resolved: &Resolved<'_>,
    actor: u64,
    now_ms: i64,
) -> Result<(), DispatchError> {
    let Some((cooldowns, window)) = resolved.cooldown() else {
        return Ok(());
    };
    cooldowns
        .try_arm(actor, now_ms, window)
        .map_err(|until_ms| DispatchError::CooldownActive {
            remaining_ms: until_ms - now_ms,
            until_ms,
        })
}

pub async fn check_registration(
    app: &AppContext,
    resolved: &Resolved<'_>,
    actor: u64,
    tag: &'static str,
) -> Result<(), DispatchError> {
    if !resolved.registration_required() {
        return Ok(());
    }
    let path = resolved.path().to_string();
    match app.accounts.user_exists(actor).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(DispatchError::RegistrationRequired { path }),
        Err(source) => Err(DispatchError::HandlerExecution { tag, path, source }),
    }
}

/// Run every check for one event against its resolved node
pub async fn run(
    app: &AppContext,
    event: &InteractionEvent,
    resolved: &Resolved<'_>,
    owner: Option<&Owner>,
) -> Result<(), DispatchError> {
    let actor = event.actor.id;

    check_ownership(owner, actor)?;
    check_whitelist(resolved, actor)?;
    check_permissions(resolved, event)?;
    if event.kind.is_fresh_invocation() {
        check_cooldown(resolved, actor, app.clock.now_ms())?;
    }
    check_registration(app, resolved, actor, event.kind.label()).await?;

    debug!("Middleware passed for {} on {}", actor, resolved.path());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handler::GroupNode;
    use crate::commands::registry::{Command, CommandOptions, CommandRegistry};
    use crate::dispatch::event::Actor;
    use crate::token::CommandPath;
    use std::time::Duration;

    fn registry(options: CommandOptions) -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry
            .register_command(Command::new("shop", "Shop", GroupNode).options(options))
            .unwrap();
        registry
    }

    #[test]
    fn test_ownership() {
        assert!(check_ownership(None, 5).is_ok());
        assert!(check_ownership(Some(&Owner::All), 5).is_ok());
        assert!(check_ownership(Some(&Owner::Anyone), 5).is_ok());
        assert!(check_ownership(Some(&Owner::User(5)), 5).is_ok());
        assert!(matches!(
            check_ownership(Some(&Owner::User(4)), 5),
            Err(DispatchError::OwnershipViolation)
        ));
    }

    #[test]
    fn test_whitelist() {
        let registry = registry(CommandOptions {
            whitelist: Some(vec![1, 2]),
            ..Default::default()
        });
        let resolved = registry.resolve(&CommandPath::new("shop")).unwrap();
        assert!(check_whitelist(&resolved, 2).is_ok());
        assert!(matches!(
            check_whitelist(&resolved, 3),
            Err(DispatchError::PermissionDenied(Denial::NotWhitelisted))
        ));
    }

    #[test]
    fn test_actor_and_bot_permissions_reported_distinctly() {
        let required = Permissions::MANAGE_MESSAGES | Permissions::EMBED_LINKS;
        let registry = registry(CommandOptions {
            permissions: Some(required),
            ..Default::default()
        });
        let resolved = registry.resolve(&CommandPath::new("shop")).unwrap();

        let mut event = InteractionEvent::chat_input(Actor::new(1, "a"), "shop");
        match check_permissions(&resolved, &event) {
            Err(DispatchError::PermissionDenied(Denial::ActorMissing(p))) => assert_eq!(p, required),
            other => panic!("unexpected {other:?}"),
        }

        event.actor = Actor::new(1, "a").with_permissions(Permissions::MANAGE_MESSAGES);
        match check_permissions(&resolved, &event) {
            Err(DispatchError::PermissionDenied(Denial::ActorMissing(p))) => {
                assert_eq!(p, Permissions::EMBED_LINKS)
            }
            other => panic!("unexpected {other:?}"),
        }

        event.actor = Actor::new(1, "a").with_permissions(required);
        assert!(check_permissions(&resolved, &event).is_ok());

        event.bot_permissions = Some(Permissions::EMBED_LINKS);
        match check_permissions(&resolved, &event) {
            Err(DispatchError::PermissionDenied(Denial::BotMissing(p))) => {
                assert_eq!(p, Permissions::MANAGE_MESSAGES)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cooldown_monotonic() {
        let registry = registry(CommandOptions {
            cooldown: Some(Duration::from_millis(3000)),
            ..Default::default()
        });
        let resolved = registry.resolve(&CommandPath::new("shop")).unwrap();

        assert!(check_cooldown(&resolved, 9, 10_000).is_ok());
        match check_cooldown(&resolved, 9, 12_999) {
            Err(DispatchError::CooldownActive { remaining_ms, until_ms }) => {
                assert_eq!(remaining_ms, 1);
                assert_eq!(until_ms, 13_000);
            }
            other => panic!("unexpected {other:?}"),
        }
        // another user is unaffected
        assert!(check_cooldown(&resolved, 10, 12_999).is_ok());
        // elapsed: passes and resets
        assert!(check_cooldown(&resolved, 9, 13_000).is_ok());
        assert!(check_cooldown(&resolved, 9, 15_000).is_err());
    }
}
