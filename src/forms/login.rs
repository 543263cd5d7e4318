//! Authentication against the portal.

use anyhow::{bail, Result};
use chromiumoxide::{Element, Page};
use tracing::{info, warn};

use crate::browser::{page as browser, Settler};
use crate::config::Settings;

/// Username field fallbacks, most specific first. The portal qualifies
/// its field names with an auto-generated JSF container, so only the
/// `:usuario` suffix is stable.
const USER_SELECTORS: &[&str] = &[
    "input[name$=\":usuario\"]",
    "input[id*=\"usuario\"]",
    "input[type=\"text\"]",
    "input[name*=\"user\"]",
    "input[id*=\"user\"]",
];

const PASSWORD_SELECTORS: &[&str] = &[
    "input[name$=\":senha\"]",
    "input[id*=\"senha\"]",
    "input[type=\"password\"]",
    "input[name*=\"pass\"]",
    "input[id*=\"pass\"]",
];

const SUBMIT_SELECTORS: &[&str] = &[
    "button[type=\"submit\"]",
    "input[type=\"submit\"]",
    ".btn-login",
    "#btnLogin",
];

/// A candidate is only clicked when its label reads like a login
/// action; anything else falls back to Enter on the password field.
const SUBMIT_WORDS: &[&str] = &["entrar", "login", "acessar", "submit"];

/// Log into the portal, leaving the page on the post-login screen.
///
/// Still sitting on the login page afterwards is reported but not
/// fatal; the navigation that follows fails soon enough if the
/// credentials were wrong.
pub async fn login(page: &Page, settler: &Settler, settings: &Settings) -> Result<()> {
    let (Some(username), Some(password)) =
        (settings.username.as_deref(), settings.password.as_deref())
    else {
        bail!("Credenciais não configuradas. Defina USUARIO e SENHA no arquivo .env");
    };

    info!("Logging in at {}", settings.login_url);
    browser::navigate(page, &settings.login_url).await?;
    settler.login_page().await;

    let Some(user_field) = browser::find_first(page, USER_SELECTORS).await else {
        report_missing_field(page).await;
        bail!("Campo de usuário não encontrado");
    };
    browser::fill_element(&user_field, username).await?;
    settler.field().await;

    let Some(password_field) = browser::find_first(page, PASSWORD_SELECTORS).await else {
        report_missing_field(page).await;
        bail!("Campo de senha não encontrado");
    };
    browser::fill_element(&password_field, password).await?;
    settler.field().await;

    match find_submit_button(page).await {
        Some(button) => {
            button.click().await?;
        }
        None => {
            password_field.press_key("Enter").await?;
        }
    }
    settler.login_submit().await;
    settler.login_page().await;

    let url = browser::current_url(page).await.unwrap_or_default();
    if url.contains("login") {
        warn!("Still on the login page, check the credentials");
        browser::save_debug_screenshot(page, "debug_pos_login.png").await;
    } else {
        info!("Login completed");
    }
    Ok(())
}

async fn find_submit_button(page: &Page) -> Option<Element> {
    for css in SUBMIT_SELECTORS {
        if let Ok(el) = page.find_element(*css).await {
            if matches_submit_word(&el).await {
                return Some(el);
            }
        }
    }
    // Unlabelled selectors exhausted; scan every button for a login
    // label.
    if let Ok(buttons) = page.find_elements("button").await {
        for el in buttons {
            if matches_submit_word(&el).await {
                return Some(el);
            }
        }
    }
    None
}

async fn matches_submit_word(el: &Element) -> bool {
    let text = browser::element_text(el).await.to_lowercase();
    SUBMIT_WORDS.iter().any(|w| text.contains(w))
}

/// Dump the page's inputs and a screenshot when a login field cannot
/// be found.
async fn report_missing_field(page: &Page) {
    match browser::describe_inputs(page).await {
        Ok(inputs) => warn!("Inputs present on the login page: {inputs}"),
        Err(e) => warn!("Could not list login page inputs: {e}"),
    }
    browser::save_debug_screenshot(page, "debug_login.png").await;
}
