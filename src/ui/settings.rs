/// Integration settings form
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use super::Services;
use super::hooks::use_notification;
use crate::settings::IntegrationSettings;

#[derive(Clone, Copy, PartialEq)]
enum Field {
    NotionToken,
    NotionPageId,
    GithubToken,
    GithubRepo,
    ObsidianVaultName,
}

impl Field {
    fn slot(self, settings: &mut IntegrationSettings) -> &mut Option<String> {
        match self {
            Field::NotionToken => &mut settings.notion_token,
            Field::NotionPageId => &mut settings.notion_page_id,
            Field::GithubToken => &mut settings.github_token,
            Field::GithubRepo => &mut settings.github_repo,
            Field::ObsidianVaultName => &mut settings.obsidian_vault_name,
        }
    }
}

#[function_component(SettingsPanel)]
pub fn settings_panel() -> Html {
    let services = use_context::<Services>();
    let settings = use_state(IntegrationSettings::default);
    let saving = use_state(|| false);
    let error = use_state(|| None::<String>);
    let saved = use_notification();

    // Load stored settings on mount
    {
        let settings = settings.clone();
        let error = error.clone();
        let store = services.as_ref().map(|s| s.settings.clone());
        use_effect_with((), move |_| {
            if let Some(store) = store {
                spawn_local(async move {
                    match store.load().await {
                        Ok(loaded) => settings.set(loaded),
                        Err(e) => error.set(Some(format!("Failed to load settings: {}", e))),
                    }
                });
            }
            || ()
        });
    }

    let on_input = {
        let settings = settings.clone();
        move |field: Field| {
            let settings = settings.clone();
            Callback::from(move |e: InputEvent| {
                if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                    let mut next = (*settings).clone();
                    *field.slot(&mut next) = Some(input.value());
                    settings.set(next);
                }
            })
        }
    };

    let on_save = {
        let settings = settings.clone();
        let saving = saving.clone();
        let error = error.clone();
        let saved = saved.clone();
        let store = services.as_ref().map(|s| s.settings.clone());

        Callback::from(move |_| {
            let Some(store) = store.clone() else {
                return;
            };
            let current = (*settings).clone();
            let saving = saving.clone();
            let error = error.clone();
            let saved = saved.clone();

            saving.set(true);
            error.set(None);
            spawn_local(async move {
                match store.save(&current).await {
                    Ok(()) => saved.show("Settings saved!"),
                    Err(e) => error.set(Some(format!("Failed to save settings: {}", e))),
                }
                saving.set(false);
            });
        })
    };

    let text_input = |label: &str, field: Field, kind: &str, placeholder: &str| {
        let mut current = (*settings).clone();
        let value = field.slot(&mut current).clone().unwrap_or_default();
        html! {
            <label class="settings-field">
                <span class="settings-label">{label.to_string()}</span>
                <input
                    type={kind.to_string()}
                    class="pf-v5-c-form-control"
                    placeholder={placeholder.to_string()}
                    value={value}
                    oninput={on_input(field)}
                />
            </label>
        }
    };

    html! {
        <div class="flex-column-gap">
            if let Some(err) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                    {err}
                </Alert>
            }

            <h3 class="settings-section">{"Notion"}</h3>
            {text_input("Integration Token", Field::NotionToken, "password", "secret_...")}
            {text_input("Parent Page ID", Field::NotionPageId, "text", "Page ID")}

            <h3 class="settings-section">{"GitHub"}</h3>
            {text_input("Personal Access Token", Field::GithubToken, "password", "ghp_...")}
            {text_input("Repository", Field::GithubRepo, "text", "owner/repo")}

            <h3 class="settings-section">{"Obsidian"}</h3>
            {text_input("Vault Name", Field::ObsidianVaultName, "text", "My Vault")}

            <Button onclick={on_save} disabled={*saving} variant={ButtonVariant::Primary} block={true}>
                {if *saving { "Saving..." } else { "Save Settings" }}
            </Button>

            if let Some(message) = saved.message() {
                <Alert r#type={AlertType::Success} title={message.to_string()} inline={true}>
                </Alert>
            }
        </div>
    }
}
