/// Email/password sign-in form
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use super::Services;

#[derive(Properties, PartialEq)]
pub struct LoginProps {
    pub onlogin: Callback<()>,
}

#[function_component(Login)]
pub fn login(props: &LoginProps) -> Html {
    let services = use_context::<Services>();
    let email = use_state(String::new);
    let password = use_state(String::new);
    let loading = use_state(|| false);
    let error = use_state(|| None::<String>);

    let on_email_input = {
        let email = email.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                email.set(input.value());
            }
        })
    };

    let on_password_input = {
        let password = password.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                password.set(input.value());
            }
        })
    };

    let on_submit = {
        let email = email.clone();
        let password = password.clone();
        let loading = loading.clone();
        let error = error.clone();
        let onlogin = props.onlogin.clone();
        let auth = services.as_ref().and_then(|s| s.auth.clone());

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(auth) = auth.clone() else {
                error.set(Some("Sign-in is not available in this context".to_string()));
                return;
            };

            let email = (*email).trim().to_string();
            let password = (*password).clone();
            let loading = loading.clone();
            let error = error.clone();
            let onlogin = onlogin.clone();

            loading.set(true);
            error.set(None);

            spawn_local(async move {
                match auth.sign_in_with_password(&email, &password).await {
                    Ok(_) => onlogin.emit(()),
                    Err(e) => error.set(Some(e.to_string())),
                }
                loading.set(false);
            });
        })
    };

    html! {
        <div class="padding-20">
            <h2 class="popup-title">{"Sign in to TubeWiki"}</h2>

            if let Some(err) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={"Sign-in failed"} inline={true}>
                    {err}
                </Alert>
            }

            <form class="flex-column-gap" onsubmit={on_submit}>
                <input
                    type="email"
                    class="pf-v5-c-form-control"
                    placeholder="Email"
                    value={(*email).clone()}
                    oninput={on_email_input}
                    required={true}
                />
                <input
                    type="password"
                    class="pf-v5-c-form-control"
                    placeholder="Password"
                    value={(*password).clone()}
                    oninput={on_password_input}
                    required={true}
                />
                <button type="submit" class="pf-v5-c-button pf-m-primary pf-m-block" disabled={*loading}>
                    {if *loading { "Signing in..." } else { "Sign In" }}
                </button>
            </form>
        </div>
    }
}
