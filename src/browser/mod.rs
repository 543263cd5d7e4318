//! Chromium session management.
//!
//! Launches a stealth-configured Chrome (or connects to a remote one
//! over the devtools protocol) and prepares pages that present a pt-BR
//! desktop identity to the portal's automation checks.

pub mod page;
mod settle;
mod stealth;

pub use page::SelectOutcome;
pub use settle::{Delays, FixedSettle, SettlePolicy, Settler};
pub use stealth::STEALTH_SCRIPTS;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tracing::{debug, info};

use crate::config::Settings;

/// User agent presented to the portal.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en;q=0.8";
const BROWSER_LOCALE: &str = "pt-BR";
const BROWSER_TIMEZONE: &str = "America/Sao_Paulo";

/// Request timeout for the remote devtools connection.
const REMOTE_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Chrome flags that keep the portal's bot checks quiet.
const BROWSER_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process",
];

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

/// Find a Chrome executable, honouring an explicit override first.
pub fn find_chrome(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow::anyhow!(
            "Configured Chrome path does not exist: {}",
            path.display()
        ));
    }

    for path in CHROME_PATHS {
        let p = Path::new(path);
        if p.exists() {
            info!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(cmd) {
            info!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(anyhow::anyhow!(
        "Chrome/Chromium not found. Please install it:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or download from: https://www.google.com/chrome/"
    ))
}

/// A running browser whose event handler is pumped in the background.
pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    /// Launch a local browser, or connect to a remote one when the
    /// settings carry a devtools URL.
    pub async fn start(settings: &Settings) -> Result<Self> {
        if let Some(remote) = settings.remote_browser.as_deref() {
            Self::connect_remote(remote).await
        } else {
            Self::launch(settings).await
        }
    }

    async fn launch(settings: &Settings) -> Result<Self> {
        info!("Launching browser (headless={})", settings.headless);

        let chrome_path = find_chrome(settings.chrome_path.as_deref())?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1920, 1080);

        // with_head means NOT headless, confusingly
        if !settings.headless {
            builder = builder.with_head();
        }

        for arg in BROWSER_ARGS {
            builder = builder.arg(*arg);
        }
        builder = builder.arg(format!("--user-agent={}", BROWSER_USER_AGENT));

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Self { browser })
    }

    /// Connect to an already-running Chrome.
    async fn connect_remote(url: &str) -> Result<Self> {
        info!("Connecting to remote browser at {}", url);

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let client = reqwest::Client::new();
        let resp: serde_json::Value = client
            .get(&version_url)
            .send()
            .await
            .context("Failed to connect to remote browser")?
            .json()
            .await
            .context("Failed to parse browser version info")?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("No webSocketDebuggerUrl in response"))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = HandlerConfig {
            request_timeout: Duration::from_secs(REMOTE_REQUEST_TIMEOUT_SECS),
            ..Default::default()
        };

        let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .context("Failed to connect to remote browser")?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Self { browser })
    }

    /// Open a page with the pt-BR identity and the stealth scripts
    /// installed before any site code runs.
    pub async fn new_page(&self) -> Result<chromiumoxide::Page> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;

        let ua = SetUserAgentOverrideParams::builder()
            .user_agent(BROWSER_USER_AGENT)
            .accept_language(ACCEPT_LANGUAGE)
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid user agent params: {}", e))?;
        page.execute(ua).await?;

        let mut locale = SetLocaleOverrideParams::default();
        locale.locale = Some(BROWSER_LOCALE.to_string());
        page.execute(locale).await?;

        page.execute(SetTimezoneOverrideParams::new(BROWSER_TIMEZONE))
            .await?;

        for script in STEALTH_SCRIPTS {
            page.execute(AddScriptToEvaluateOnNewDocumentParams::new(*script))
                .await?;
        }

        Ok(page)
    }

    /// Close the browser, swallowing errors from an already-gone
    /// process.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close: {}", e);
        }
        let _ = self.browser.wait().await;
    }
}
