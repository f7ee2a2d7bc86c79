use crate::types::{Data, Error};
use std::collections::BTreeMap;

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub category: String,
    pub description: String,
}

/// Command metadata grouped by category, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    categories: BTreeMap<String, Vec<CommandInfo>>,
}

fn command_description(command: &poise::Command<Data, Error>) -> String {
    command
        .description
        .as_deref()
        .or_else(|| {
            command
                .description_localizations
                .get("en-US")
                .map(|s| s.as_str())
        })
        .unwrap_or("No description provided.")
        .to_string()
}

impl CommandRegistry {
    pub fn from_entries(entries: impl IntoIterator<Item = CommandInfo>) -> Self {
        let mut categories: BTreeMap<String, Vec<CommandInfo>> = BTreeMap::new();
        for entry in entries {
            categories
                .entry(entry.category.clone())
                .or_default()
                .push(entry);
        }
        for commands in categories.values_mut() {
            commands.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Self { categories }
    }

    pub fn from_commands(commands: &[poise::Command<Data, Error>]) -> Self {
        Self::from_entries(
            commands
                .iter()
                .filter(|command| !command.hide_in_help)
                .map(|command| CommandInfo {
                    name: command.name.clone(),
                    category: command
                        .category
                        .as_deref()
                        .filter(|category| !category.trim().is_empty())
                        .unwrap_or(UNCATEGORIZED)
                        .to_string(),
                    description: command_description(command),
                }),
        )
    }

    /// Category names in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Looks a category up ignoring case.
    pub fn find_category(&self, query: &str) -> Option<(&str, &[CommandInfo])> {
        let wanted = query.trim().to_lowercase();
        self.categories
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(name, commands)| (name.as_str(), commands.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
