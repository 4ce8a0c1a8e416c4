//! Built-in commands
//!
//! Every command is registered here explicitly at startup, in one pass,
//! before the registry is shared.
//!
//! - **Version**: 3.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 3.1.0: Farm and shop commands
//! - 3.0.0: Account, game, minigame and help commands over the capability traits
//! - 2.0.0: Consolidated handler list
//! - 1.0.0: Initial extraction of per-command handlers

pub mod account;
pub mod farm;
pub mod game;
pub mod help;
pub mod minigame;
pub mod shop;

use super::registry::{CommandRegistry, RegistryError};

/// Build the registry holding every built-in command
pub fn register_all() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new();
    account::register(&mut registry)?;
    game::register(&mut registry)?;
    farm::register(&mut registry)?;
    shop::register(&mut registry)?;
    minigame::register(&mut registry)?;
    help::register(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
pub(crate) fn test_dispatcher() -> (crate::dispatch::Dispatcher, crate::testing::TestHandles) {
    let registry = register_all().expect("built-in commands register");
    let (app, handles) = crate::testing::test_app_with(registry);
    (crate::dispatch::Dispatcher::new(std::sync::Arc::new(app)), handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::CommandPath;

    #[test]
    fn test_register_all() {
        let registry = register_all().unwrap();
        let paths: Vec<String> = registry.paths().iter().map(CommandPath::to_string).collect();
        assert_eq!(
            paths,
            vec![
                "Wallet",
                "account create",
                "account delete",
                "game beg",
                "game farm expand",
                "game farm harvest",
                "game farm plant",
                "game farm status",
                "game gamble blackjack",
                "game gamble evenodd",
                "game gamble slots",
                "game inventory",
                "game shop buy",
                "game shop items",
                "game shop sell",
                "game wallet",
                "help",
                "minigame pirate-roulette",
                "minigame tictactoe",
            ]
        );
    }

    #[test]
    fn test_definitions_nest_the_groups() {
        let registry = register_all().unwrap();
        let definitions = registry.definitions();
        assert!(definitions.guilds.is_empty());
        assert_eq!(definitions.global.len(), 5);

        let game = definitions
            .global
            .iter()
            .find(|d| d.0.get("name").and_then(|n| n.as_str()) == Some("game"))
            .unwrap();
        let options = game.0.get("options").and_then(|o| o.as_array()).unwrap();
        assert_eq!(options.len(), 6);
        for (name, size) in [("gamble", 3), ("farm", 4), ("shop", 3)] {
            let group = options
                .iter()
                .find(|o| o.get("name").and_then(|n| n.as_str()) == Some(name))
                .unwrap();
            assert_eq!(group.get("type").and_then(|t| t.as_u64()), Some(2));
            assert_eq!(
                group.get("options").and_then(|o| o.as_array()).map(Vec::len),
                Some(size),
                "{name}"
            );
        }
    }
}
