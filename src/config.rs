//! Runtime settings and the small JSON document the web shell persists.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default login page of the legacy portal.
pub const DEFAULT_LOGIN_URL: &str = "https://pep.celesc.com.br/PEP/externo/login.xhtml";

/// Default pole-sharing form URL. The legacy view of a protocol is the
/// same page addressed with an `idSO` query parameter; the new form is
/// the bare URL.
pub const DEFAULT_FORM_URL: &str =
    "https://pep.celesc.com.br/PEP/externo/compartilhamentoPoste.xhtml";

/// Default delay between ordinary field fills, in milliseconds.
pub const DEFAULT_FILL_DELAY_MS: u64 = 500;

/// Persisted config filename under the config directory.
const CONFIG_FILENAME: &str = "config.json";

/// Runtime settings, environment-driven (a `.env` file is loaded at
/// startup). Every value has a hardcoded default.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Login page URL.
    pub login_url: String,
    /// Form URL; the legacy view takes `?idSO=<protocol>`.
    pub form_url: String,
    /// Portal username.
    pub username: Option<String>,
    /// Portal password.
    pub password: Option<String>,
    /// Delay between ordinary field fills in milliseconds.
    pub fill_delay_ms: u64,
    /// Run the browser without a visible window.
    pub headless: bool,
    /// Connect to an already-running Chrome (`http://host:port`) instead
    /// of launching one.
    pub remote_browser: Option<String>,
    /// Explicit Chrome binary path, overriding discovery.
    pub chrome_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            form_url: DEFAULT_FORM_URL.to_string(),
            username: None,
            password: None,
            fill_delay_ms: DEFAULT_FILL_DELAY_MS,
            headless: false,
            remote_browser: None,
            chrome_path: None,
        }
    }
}

impl Settings {
    /// Build settings from the environment, keeping defaults for
    /// anything unset or empty.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Some(url) = env_nonempty("URL_LOGIN") {
            tracing::debug!("Using URL_LOGIN from environment: {}", url);
            settings.login_url = url;
        }
        if let Some(url) = env_nonempty("URL_BASE_FORMULARIO") {
            tracing::debug!("Using URL_BASE_FORMULARIO from environment: {}", url);
            settings.form_url = url;
        }
        settings.username = env_nonempty("USUARIO");
        settings.password = env_nonempty("SENHA");
        if let Some(delay) = env_nonempty("DELAY_PREENCHIMENTO") {
            match delay.parse::<u64>() {
                Ok(ms) => settings.fill_delay_ms = ms,
                Err(_) => tracing::warn!("Ignoring non-numeric DELAY_PREENCHIMENTO: {}", delay),
            }
        }
        if let Some(headless) = env_nonempty("HEADLESS") {
            settings.headless =
                headless.eq_ignore_ascii_case("true") || headless == "1";
        }
        if let Some(remote) = env_nonempty("PEP_REMOTE_BROWSER") {
            tracing::debug!("Using PEP_REMOTE_BROWSER from environment: {}", remote);
            settings.remote_browser = Some(remote);
        }
        settings.chrome_path = env_nonempty("PEP_CHROME_PATH").map(PathBuf::from);

        settings
    }

    /// Whether both credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// URL of the legacy form for one protocol.
    pub fn legacy_form_url(&self, protocol: &str) -> String {
        match url::Url::parse(&self.form_url) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("idSO", protocol);
                url.to_string()
            }
            Err(_) => format!("{}?idSO={}", self.form_url, protocol),
        }
    }

    /// URL of the new (empty) form.
    pub fn new_form_url(&self) -> &str {
        &self.form_url
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// The one document the web shell persists: where migration folders
/// live. A missing or unreadable file falls back to the default without
/// complaint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuiConfig {
    #[serde(rename = "diretorio_base")]
    pub base_dir: String,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

impl GuiConfig {
    /// Default on-disk location of the persisted config.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pepmigrate")
            .join(CONFIG_FILENAME)
    }

    /// Load from `path`, silently falling back to defaults when the file
    /// is missing or unparseable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::debug!("Ignoring unparseable config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Default folder the web shell looks for migration subfolders in.
pub fn default_base_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("git")
        .display()
        .to_string()
}
