//! Command mention directory
//!
//! Filled with application command ids after the startup upload. Until an id
//! is known, mentions fall back to a code-formatted command path.

use dashmap::DashMap;

use super::CommandMentions;

#[derive(Default)]
pub struct MentionDirectory {
    ids: DashMap<String, u64>,
}

impl MentionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: impl Into<String>, id: u64) {
        self.ids.insert(name.into(), id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl CommandMentions for MentionDirectory {
    fn mention(&self, name: &str, group: Option<&str>, sub: Option<&str>) -> String {
        let path = [Some(name), group, sub]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        match self.ids.get(name) {
            Some(id) => format!("</{path}:{}>", *id),
            None => format!("`/{path}`"),
        }
    }
}
