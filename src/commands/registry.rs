//! Two-level command registry
//!
//! Top-level commands optionally own subcommands, flat or tagged with a
//! subcommand group. Subcommands are keyed by `"group name"` or plain `name`.
//! Registration happens once at startup; afterwards the registry is only read,
//! so it is shared behind an `Arc` without locking.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Commands with subcommands, per-node options and cooldowns, definitions for upload
//! - 1.0.0: Initial implementation for handler dispatch

use log::warn;
use serenity::builder::{CreateApplicationCommand, CreateApplicationCommandOption};
use serenity::model::application::command::{CommandOptionType, CommandType};
use serenity::model::permissions::Permissions;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::cooldown::Cooldowns;
use super::handler::{Capability, CommandNode};
use super::overrides::{CommandOverrides, NodeOverride};
use crate::token::CommandPath;

/// Static requirements declared on a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOptions {
    /// Guilds the command is limited to, empty for global
    pub guilds: Vec<u64>,
    pub whitelist: Option<Vec<u64>>,
    /// Required platform permissions, for both the actor and the bot
    pub permissions: Option<Permissions>,
    pub cooldown: Option<Duration>,
    pub registration_required: bool,
    pub subcommand_required: bool,
}

impl CommandOptions {
    fn apply(&mut self, ov: &NodeOverride) {
        if let Some(ms) = ov.cooldown_ms {
            self.cooldown = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(whitelist) = &ov.whitelist {
            self.whitelist = Some(whitelist.clone());
        }
        if let Some(guilds) = &ov.guilds {
            self.guilds = guilds.clone();
        }
        if let Some(required) = ov.registration_required {
            self.registration_required = required;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ChatInput,
    User,
    Message,
}

impl From<CommandKind> for CommandType {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::ChatInput => CommandType::ChatInput,
            CommandKind::User => CommandType::User,
            CommandKind::Message => CommandType::Message,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command `{0}` is already registered")]
    DuplicateCommand(String),

    #[error("subcommand `{key}` is already registered under `{parent}`")]
    DuplicateSubCommand { parent: String, key: String },

    #[error("no command `{0}` to attach a subcommand to")]
    UnknownParent(String),

    #[error("`{0}` is not a slash command and cannot own subcommands")]
    NotChatInput(String),
}

pub struct Command {
    pub name: String,
    pub description: String,
    pub kind: CommandKind,
    pub options: CommandOptions,
    pub arguments: Vec<CreateApplicationCommandOption>,
    pub node: Arc<dyn CommandNode>,
    pub cooldowns: Cooldowns,
    groups: BTreeMap<String, String>,
    subcommands: HashMap<String, SubCommand>,
}

impl Command {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        node: impl CommandNode + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: CommandKind::ChatInput,
            options: CommandOptions::default(),
            arguments: Vec::new(),
            node: Arc::new(node),
            cooldowns: Cooldowns::new(),
            groups: BTreeMap::new(),
            subcommands: HashMap::new(),
        }
    }

    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn argument(mut self, argument: CreateApplicationCommandOption) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Describe a subcommand group for the uploaded definition
    pub fn group(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.groups.insert(name.into(), description.into());
        self
    }

    pub fn subcommand(&self, key: &str) -> Option<&SubCommand> {
        self.subcommands.get(key)
    }

    pub fn has_subcommands(&self) -> bool {
        !self.subcommands.is_empty()
    }

    /// Subcommands sorted by key
    pub fn subcommands(&self) -> Vec<&SubCommand> {
        let mut subs: Vec<&SubCommand> = self.subcommands.values().collect();
        subs.sort_by_key(|s| s.key());
        subs
    }

    /// Upload definition with subcommands and groups nested as options
    pub fn definition(&self) -> CreateApplicationCommand {
        let mut def = CreateApplicationCommand::default();
        def.name(&self.name).kind(self.kind.into());
        if self.kind == CommandKind::ChatInput {
            def.description(&self.description);
        }
        if let Some(permissions) = self.options.permissions {
            def.default_member_permissions(permissions);
        }
        for argument in &self.arguments {
            def.add_option(argument.clone());
        }

        let subs = self.subcommands();
        for sub in subs.iter().filter(|s| s.group.is_none()) {
            def.add_option(sub.definition());
        }

        let group_names: BTreeSet<&str> = subs.iter().filter_map(|s| s.group.as_deref()).collect();
        for group in group_names {
            let mut option = CreateApplicationCommandOption::default();
            option
                .kind(CommandOptionType::SubCommandGroup)
                .name(group)
                .description(self.groups.get(group).map(String::as_str).unwrap_or(group));
            for sub in subs.iter().filter(|s| s.group.as_deref() == Some(group)) {
                option.add_sub_option(sub.definition());
            }
            def.add_option(option);
        }
        def
    }
}

pub struct SubCommand {
    pub name: String,
    pub description: String,
    pub group: Option<String>,
    /// Name of the owning command, filled in on registration
    pub parent: String,
    /// `guilds` is ignored at this level
    pub options: CommandOptions,
    pub arguments: Vec<CreateApplicationCommandOption>,
    pub node: Arc<dyn CommandNode>,
    pub cooldowns: Cooldowns,
}

impl SubCommand {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        node: impl CommandNode + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            group: None,
            parent: String::new(),
            options: CommandOptions::default(),
            arguments: Vec::new(),
            node: Arc::new(node),
            cooldowns: Cooldowns::new(),
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn argument(mut self, argument: CreateApplicationCommandOption) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Registry key, `"group name"` or `name`
    pub fn key(&self) -> String {
        match &self.group {
            Some(group) => format!("{group} {}", self.name),
            None => self.name.clone(),
        }
    }

    fn definition(&self) -> CreateApplicationCommandOption {
        let mut option = CreateApplicationCommandOption::default();
        option
            .kind(CommandOptionType::SubCommand)
            .name(&self.name)
            .description(&self.description);
        for argument in &self.arguments {
            option.add_sub_option(argument.clone());
        }
        option
    }
}

/// A routed command, with its subcommand when the path named one
#[derive(Clone, Copy)]
pub struct Resolved<'a> {
    pub command: &'a Command,
    pub sub: Option<&'a SubCommand>,
}

impl<'a> Resolved<'a> {
    pub fn path(&self) -> CommandPath {
        match self.sub {
            Some(sub) => CommandPath::with_sub(&self.command.name, sub.key()),
            None => CommandPath::new(&self.command.name),
        }
    }

    /// Node implementing `capability`.
    ///
    /// With `fallback`, a subcommand lacking the capability defers to its
    /// parent command.
    pub fn node_for(&self, capability: Capability, fallback: bool) -> Option<&'a Arc<dyn CommandNode>> {
        match self.sub {
            Some(sub) if sub.node.supports(capability) => Some(&sub.node),
            Some(_) if !fallback => None,
            _ => Some(&self.command.node).filter(|node| node.supports(capability)),
        }
    }

    /// The cooldown store and window that apply, the subcommand's taking precedence
    pub fn cooldown(&self) -> Option<(&'a Cooldowns, Duration)> {
        if let Some(sub) = self.sub {
            if let Some(window) = sub.options.cooldown {
                return Some((&sub.cooldowns, window));
            }
        }
        self.command
            .options
            .cooldown
            .map(|window| (&self.command.cooldowns, window))
    }

    /// Required permissions, a subcommand's declaration overrides the command's
    pub fn permissions(&self) -> Option<Permissions> {
        self.sub
            .and_then(|s| s.options.permissions)
            .or(self.command.options.permissions)
    }

    /// Every whitelist on the path, all must admit the actor
    pub fn whitelists(&self) -> Vec<&'a [u64]> {
        let mut lists = Vec::new();
        if let Some(list) = &self.command.options.whitelist {
            lists.push(list.as_slice());
        }
        if let Some(list) = self.sub.and_then(|s| s.options.whitelist.as_ref()) {
            lists.push(list.as_slice());
        }
        lists
    }

    pub fn registration_required(&self) -> bool {
        self.command.options.registration_required
            || self.sub.is_some_and(|s| s.options.registration_required)
    }

    pub fn allowed_in(&self, guild_id: Option<u64>) -> bool {
        let guilds = &self.command.options.guilds;
        guilds.is_empty() || guild_id.is_some_and(|g| guilds.contains(&g))
    }
}

/// Upload definitions split by scope
#[derive(Default)]
pub struct CommandDefinitions {
    pub global: Vec<CreateApplicationCommand>,
    pub guilds: BTreeMap<u64, Vec<CreateApplicationCommand>>,
}

/// Registry of commands keyed by name
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// registry.register_command(Command::new("farm", "Farming", GroupNode))?;
/// registry.register_subcommand("farm", SubCommand::new("plant", "Plant a seed", Plant))?;
///
/// let resolved = registry.resolve(&CommandPath::with_sub("farm", "plant"));
/// ```
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_command(&mut self, command: Command) -> Result<(), RegistryError> {
        if self.commands.contains_key(&command.name) {
            return Err(RegistryError::DuplicateCommand(command.name));
        }
        self.commands.insert(command.name.clone(), command);
        Ok(())
    }

    pub fn register_subcommand(
        &mut self,
        parent: &str,
        mut sub: SubCommand,
    ) -> Result<(), RegistryError> {
        let command = self
            .commands
            .get_mut(parent)
            .ok_or_else(|| RegistryError::UnknownParent(parent.to_string()))?;
        if command.kind != CommandKind::ChatInput {
            return Err(RegistryError::NotChatInput(parent.to_string()));
        }
        let key = sub.key();
        if command.subcommands.contains_key(&key) {
            return Err(RegistryError::DuplicateSubCommand {
                parent: parent.to_string(),
                key,
            });
        }
        sub.parent = parent.to_string();
        command.subcommands.insert(key, sub);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn has_subcommands(&self, name: &str) -> bool {
        self.commands.get(name).is_some_and(Command::has_subcommands)
    }

    /// Look up a path, `None` if the command or subcommand is unknown
    pub fn resolve(&self, path: &CommandPath) -> Option<Resolved<'_>> {
        let command = self.commands.get(&path.command)?;
        match &path.sub {
            Some(key) => Some(Resolved {
                command,
                sub: Some(command.subcommands.get(key)?),
            }),
            None if command.has_subcommands() && command.options.subcommand_required => None,
            None => Some(Resolved { command, sub: None }),
        }
    }

    /// Every invocable path, sorted
    pub fn paths(&self) -> Vec<CommandPath> {
        let mut paths = Vec::new();
        for command in self.commands.values() {
            if !command.has_subcommands() || !command.options.subcommand_required {
                paths.push(CommandPath::new(&command.name));
            }
            for sub in command.subcommands.values() {
                paths.push(CommandPath::with_sub(&command.name, sub.key()));
            }
        }
        paths.sort_by_key(|p| p.to_string());
        paths
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Apply operator overrides, returning keys that matched nothing
    pub fn apply_overrides(&mut self, overrides: &CommandOverrides) -> Vec<String> {
        let mut unknown = Vec::new();
        for (key, ov) in &overrides.commands {
            let path = CommandPath::parse(key);
            let Some(command) = self.commands.get_mut(&path.command) else {
                unknown.push(key.clone());
                continue;
            };
            match &path.sub {
                None => command.options.apply(ov),
                Some(sub_key) => match command.subcommands.get_mut(sub_key) {
                    Some(sub) => {
                        if ov.guilds.is_some() {
                            warn!("Ignoring guild override on subcommand `{key}`");
                        }
                        let guilds = std::mem::take(&mut sub.options.guilds);
                        sub.options.apply(ov);
                        sub.options.guilds = guilds;
                    }
                    None => unknown.push(key.clone()),
                },
            }
        }
        unknown
    }

    pub fn definitions(&self) -> CommandDefinitions {
        let mut commands: Vec<&Command> = self.commands.values().collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));

        let mut definitions = CommandDefinitions::default();
        for command in commands {
            if command.options.guilds.is_empty() {
                definitions.global.push(command.definition());
            } else {
                for guild in &command.options.guilds {
                    definitions
                        .guilds
                        .entry(*guild)
                        .or_default()
                        .push(command.definition());
                }
            }
        }
        definitions
    }
}
