//! Startup command upload
//!
//! Replaces the application commands in each scope with the registry's
//! definitions, reports which names appeared or vanished, and records the
//! returned ids for command mentions.

use anyhow::Result;
use log::{info, warn};
use serenity::builder::CreateApplicationCommand;
use serenity::http::Http;
use serenity::model::application::command::Command as PlatformCommand;
use serenity::model::id::GuildId;
use std::collections::BTreeSet;

use crate::commands::registry::CommandDefinitions;
use crate::services::{LogPayload, LogSink, MentionDirectory};

/// Names added and removed by one upload, both sorted
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UploadDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl UploadDiff {
    pub fn between<'a>(
        before: impl IntoIterator<Item = &'a str>,
        after: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let before: BTreeSet<&str> = before.into_iter().collect();
        let after: BTreeSet<&str> = after.into_iter().collect();
        Self {
            added: after.difference(&before).map(|s| s.to_string()).collect(),
            removed: before.difference(&after).map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// `+ name` and `- name` lines for the log channel
    pub fn payload(&self, scope: &str) -> LogPayload {
        let lines: Vec<String> = self
            .added
            .iter()
            .map(|name| format!("+ {name}"))
            .chain(self.removed.iter().map(|name| format!("- {name}")))
            .collect();
        LogPayload::new(format!("Commands uploaded ({scope})"), lines.join("\n"))
    }
}

fn definition_name(definition: &CreateApplicationCommand) -> Option<&str> {
    definition.0.get("name").and_then(|v| v.as_str())
}

async fn upload_scope(
    http: &Http,
    guild: Option<GuildId>,
    definitions: Vec<CreateApplicationCommand>,
    mentions: &MentionDirectory,
    logs: &dyn LogSink,
) -> Result<()> {
    let scope = match guild {
        Some(guild) => format!("guild {}", guild.0),
        None => "global".to_string(),
    };

    let before = match guild {
        Some(guild) => guild.get_application_commands(http).await,
        None => PlatformCommand::get_global_application_commands(http).await,
    }
    .unwrap_or_else(|e| {
        warn!("Could not list existing {scope} commands: {e}");
        Vec::new()
    });

    let diff = UploadDiff::between(
        before.iter().map(|c| c.name.as_str()),
        definitions.iter().filter_map(definition_name),
    );

    let uploaded = match guild {
        Some(guild) => {
            guild
                .set_application_commands(http, |c| c.set_application_commands(definitions))
                .await?
        }
        None => {
            PlatformCommand::set_global_application_commands(http, |c| {
                c.set_application_commands(definitions)
            })
            .await?
        }
    };

    for command in &uploaded {
        mentions.record(command.name.clone(), command.id.0);
    }
    info!("📝 Uploaded {} {scope} commands", uploaded.len());

    if !diff.is_empty() {
        logs.send_log(diff.payload(&scope)).await;
    }
    Ok(())
}

/// Upload every definition set.
///
/// With a development guild, global definitions go to that guild instead so
/// changes show up without the global propagation delay.
pub async fn upload_commands(
    http: &Http,
    definitions: CommandDefinitions,
    dev_guild: Option<u64>,
    mentions: &MentionDirectory,
    logs: &dyn LogSink,
) -> Result<()> {
    let CommandDefinitions { global, mut guilds } = definitions;
    match dev_guild {
        Some(dev) => guilds.entry(dev).or_default().extend(global),
        None => upload_scope(http, None, global, mentions, logs).await?,
    }
    for (guild, commands) in guilds {
        upload_scope(http, Some(GuildId(guild)), commands, mentions, logs).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_lists_added_and_removed() {
        let diff = UploadDiff::between(["help", "daily", "game"], ["help", "game", "minigame", "account"]);
        assert_eq!(diff.added, vec!["account", "minigame"]);
        assert_eq!(diff.removed, vec!["daily"]);
        assert!(!diff.is_empty());

        let payload = diff.payload("global");
        assert_eq!(payload.title, "Commands uploaded (global)");
        assert_eq!(payload.description, "+ account\n+ minigame\n- daily");
    }

    #[test]
    fn test_unchanged_upload_has_no_diff() {
        let diff = UploadDiff::between(["help"], ["help"]);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_definition_names_come_from_the_registry() {
        let registry = crate::commands::register_all().unwrap();
        let definitions = registry.definitions();
        let mut names: Vec<&str> = definitions.global.iter().filter_map(definition_name).collect();
        names.sort();
        assert_eq!(names, vec!["Wallet", "account", "game", "help", "minigame"]);
    }
}
