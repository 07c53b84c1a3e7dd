/// Export adapters: turn a completed note into something outside the extension
///
/// Clipboard and download stay in the page; Notion and GitHub go through the
/// proxy bridge; Obsidian and the Notion paste hand-off open another app or tab.
pub mod clipboard;
pub mod download;
pub mod github;
pub mod markdown;
pub mod notion;
pub mod obsidian;

use serde_json::Value;

use crate::browser;
use crate::error::{Error, Result};
use crate::note::Note;
use crate::paste::PendingPaste;
use crate::proxy::ProxyTransport;
use crate::settings::{Integration, IntegrationSettings};
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Clipboard,
    Download,
    Notion,
    NotionPaste,
    GitHub,
    Obsidian,
}

impl ExportTarget {
    pub const ALL: [ExportTarget; 6] = [
        ExportTarget::Clipboard,
        ExportTarget::Download,
        ExportTarget::Notion,
        ExportTarget::NotionPaste,
        ExportTarget::GitHub,
        ExportTarget::Obsidian,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExportTarget::Clipboard => "Copy to Clipboard",
            ExportTarget::Download => "Download as Markdown",
            ExportTarget::Notion => "Export to Notion",
            ExportTarget::NotionPaste => "Paste into Notion",
            ExportTarget::GitHub => "Export to GitHub",
            ExportTarget::Obsidian => "Export to Obsidian",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ExportTarget::Clipboard => "📋",
            ExportTarget::Download => "💾",
            ExportTarget::Notion => "📝",
            ExportTarget::NotionPaste => "📥",
            ExportTarget::GitHub => "🐙",
            ExportTarget::Obsidian => "📓",
        }
    }

    /// Integrations that must be configured before the export is attempted
    pub fn required_integration(self) -> Option<Integration> {
        match self {
            ExportTarget::Notion => Some(Integration::Notion),
            ExportTarget::GitHub => Some(Integration::GitHub),
            _ => None,
        }
    }

    /// Warning to show instead of exporting, if settings are incomplete
    pub fn missing_config(self, settings: &IntegrationSettings) -> Option<String> {
        let integration = self.required_integration()?;
        if settings.is_configured(integration) {
            return None;
        }
        let name = match integration {
            Integration::Notion => "Notion",
            Integration::GitHub => "GitHub",
            Integration::Obsidian => "Obsidian",
        };
        Some(format!("⚠️ Please configure {} in extension settings", name))
    }

    /// Shown while a network export is in flight
    pub fn progress_message(self) -> Option<&'static str> {
        match self {
            ExportTarget::Notion => Some("⏳ Exporting to Notion..."),
            ExportTarget::GitHub => Some("⏳ Exporting to GitHub..."),
            _ => None,
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            ExportTarget::Clipboard => "✅ Copied to clipboard!",
            ExportTarget::Download => "✅ Downloaded!",
            ExportTarget::Notion => "✅ Exported to Notion!",
            ExportTarget::NotionPaste => "✅ Opening Notion...",
            ExportTarget::GitHub => "✅ Exported to GitHub!",
            ExportTarget::Obsidian => "✅ Opened in Obsidian!",
        }
    }
}

/// Everything an export may need besides the note itself
pub struct ExportContext<'a, P, S> {
    pub settings: &'a IntegrationSettings,
    pub proxy: &'a P,
    pub pending: &'a PendingPaste<S>,
}

/// Run one export and return the message to show on success
pub async fn export_note<P, S>(
    target: ExportTarget,
    note: &Note,
    ctx: &ExportContext<'_, P, S>,
) -> Result<&'static str>
where
    P: ProxyTransport,
    S: KeyValueStore,
{
    log::info!("Exporting note {} via {:?}", note.id, target);
    match target {
        ExportTarget::Clipboard => clipboard::copy_to_clipboard(note).await?,
        ExportTarget::Download => download::download_markdown(note)?,
        ExportTarget::Notion => {
            let url = notion::export_to_notion(note, ctx.settings, ctx.proxy).await?;
            browser::open_window(&url, "_blank")?;
        }
        ExportTarget::NotionPaste => {
            ctx.pending.stage(&markdown::note_markdown(note)).await?;
            browser::open_window(&crate::paste::notion_paste_url(ctx.settings), "_blank")?;
        }
        ExportTarget::GitHub => {
            let date = browser::today_iso_date();
            let url = github::export_to_github(note, ctx.settings, &date, ctx.proxy).await?;
            browser::open_window(&url, "_blank")?;
        }
        ExportTarget::Obsidian => {
            let uri = obsidian::obsidian_uri(note, ctx.settings.obsidian_vault_name());
            browser::open_window(&uri, "_self")?;
        }
    }
    Ok(target.success_message())
}

/// Prefix third-party API failures with the service name
pub(crate) fn api_error(service: &str, err: Error) -> Error {
    match err {
        Error::Http { status, message } => Error::Http {
            status,
            message: format!("{} API Error: {}", service, message),
        },
        other => other,
    }
}

/// Nested string lookup in a JSON reply
pub(crate) fn string_field(data: &Value, path: &[&str]) -> Result<String> {
    path.iter()
        .try_fold(data, |value, key| value.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Decode(format!("missing `{}` in response", path.join("."))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_targets_are_distinct() {
        let labels: std::collections::BTreeSet<_> =
            ExportTarget::ALL.iter().map(|t| t.label()).collect();
        assert_eq!(labels.len(), ExportTarget::ALL.len());
    }

    #[test]
    fn test_missing_config_warning() {
        let empty = IntegrationSettings::default();

        assert_eq!(
            ExportTarget::Notion.missing_config(&empty).as_deref(),
            Some("⚠️ Please configure Notion in extension settings")
        );
        assert_eq!(
            ExportTarget::GitHub.missing_config(&empty).as_deref(),
            Some("⚠️ Please configure GitHub in extension settings")
        );
        for target in [
            ExportTarget::Clipboard,
            ExportTarget::Download,
            ExportTarget::NotionPaste,
            ExportTarget::Obsidian,
        ] {
            assert_eq!(target.missing_config(&empty), None);
        }

        let github = IntegrationSettings {
            github_token: Some("t".to_string()),
            github_repo: Some("o/r".to_string()),
            ..Default::default()
        };
        assert_eq!(ExportTarget::GitHub.missing_config(&github), None);
    }

    #[test]
    fn test_api_error_only_touches_http_errors() {
        assert_eq!(
            api_error("Notion", Error::Transport("offline".to_string())),
            Error::Transport("offline".to_string())
        );
        assert_eq!(
            api_error(
                "GitHub",
                Error::Http {
                    status: 401,
                    message: "Bad credentials".to_string()
                }
            )
            .to_string(),
            "GitHub API Error: Bad credentials"
        );
    }

    #[test]
    fn test_string_field() {
        let data = json!({"content": {"html_url": "https://github.com/x"}, "n": 1});

        assert_eq!(
            string_field(&data, &["content", "html_url"]).unwrap(),
            "https://github.com/x"
        );
        assert!(matches!(string_field(&data, &["n"]), Err(Error::Decode(_))));
        assert!(matches!(string_field(&data, &["url"]), Err(Error::Decode(_))));
    }
}
