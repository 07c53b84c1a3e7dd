/// Integration credentials persisted in the synced store
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::note::NoteOptions;
use crate::storage::KeyValueStore;

pub const SETTINGS_KEYS: [&str; 5] = [
    "notionToken",
    "notionPageId",
    "githubToken",
    "githubRepo",
    "obsidianVaultName",
];

/// Export targets that read credentials from settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    Notion,
    GitHub,
    Obsidian,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obsidian_vault_name: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl IntegrationSettings {
    pub fn notion_token(&self) -> Option<&str> {
        present(&self.notion_token)
    }

    pub fn notion_page_id(&self) -> Option<&str> {
        present(&self.notion_page_id)
    }

    pub fn github_token(&self) -> Option<&str> {
        present(&self.github_token)
    }

    pub fn github_repo(&self) -> Option<&str> {
        present(&self.github_repo)
    }

    pub fn obsidian_vault_name(&self) -> Option<&str> {
        present(&self.obsidian_vault_name)
    }

    pub fn is_configured(&self, integration: Integration) -> bool {
        match integration {
            Integration::Notion => self.notion_token().is_some() && self.notion_page_id().is_some(),
            Integration::GitHub => self.github_token().is_some() && self.github_repo().is_some(),
            Integration::Obsidian => self.obsidian_vault_name().is_some(),
        }
    }

    /// Notion credentials forwarded at note-creation time
    pub fn note_options(&self) -> NoteOptions {
        NoteOptions {
            notion_token: self.notion_token().map(str::to_string),
            notion_page_id: self.notion_page_id().map(str::to_string),
        }
    }

    /// Blank inputs become absent values
    pub fn normalized(&self) -> IntegrationSettings {
        let own = |value: Option<&str>| value.map(str::to_string);
        IntegrationSettings {
            notion_token: own(self.notion_token()),
            notion_page_id: own(self.notion_page_id()),
            github_token: own(self.github_token()),
            github_repo: own(self.github_repo()),
            obsidian_vault_name: own(self.obsidian_vault_name()),
        }
    }
}

/// Reads and writes [`IntegrationSettings`] through a key-value store
#[derive(Debug, Clone)]
pub struct SettingsStore<S> {
    store: S,
}

impl<S: KeyValueStore> SettingsStore<S> {
    pub fn new(store: S) -> Self {
        SettingsStore { store }
    }

    pub async fn load(&self) -> Result<IntegrationSettings> {
        let items = self.store.get_many(&SETTINGS_KEYS).await?;
        let settings: IntegrationSettings = serde_json::from_value(Value::Object(items))?;
        Ok(settings)
    }

    /// Cleared fields are removed so a blanked token does not linger in sync storage.
    /// Removal only happens once the new values are stored.
    pub async fn save(&self, settings: &IntegrationSettings) -> Result<()> {
        let normalized = settings.normalized();
        let items = match serde_json::to_value(&normalized)? {
            Value::Object(items) => items,
            _ => Map::new(),
        };
        let cleared: Vec<&str> = SETTINGS_KEYS
            .iter()
            .copied()
            .filter(|key| !items.contains_key(*key))
            .collect();

        self.store.set_many(items).await?;
        for key in cleared {
            self.store.remove(key).await?;
        }
        log::info!("Integration settings saved");
        Ok(())
    }

    pub async fn is_configured(&self, integration: Integration) -> Result<bool> {
        Ok(self.load().await?.is_configured(integration))
    }
}
