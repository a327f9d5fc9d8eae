use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use tracing::{debug, warn};

use crate::error::{ImportError, Result};
use crate::scrape::fetch::BROWSER_USER_AGENT;

/// Port for headless rendering of client-side rendered pages. Tests
/// substitute a canned implementation; production uses [`ChromeRenderer`].
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String>;
}

/// Executable locations tried when no browser is auto-detected on the
/// default lookup path.
const FALLBACK_BROWSER_PATHS: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
];

/// Headless-Chrome renderer.
///
/// The browser process is a scoped resource: it is acquired per render call
/// and killed when the `Browser` handle drops, on every exit path including
/// errors, so repeated failed imports cannot leak OS processes.
pub struct ChromeRenderer {
    timeout: Duration,
}

impl ChromeRenderer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        let url = url.to_string();
        let timeout = self.timeout;
        // headless_chrome is a blocking API; keep it off the async workers
        tokio::task::spawn_blocking(move || render_blocking(&url, timeout))
            .await
            .map_err(|e| ImportError::Render(format!("render task panicked: {e}")))?
    }
}

fn render_blocking(url: &str, timeout: Duration) -> Result<String> {
    let browser = launch_browser(timeout)?;

    let tab = browser.new_tab().map_err(render_err)?;
    tab.set_default_timeout(timeout);
    tab.set_user_agent(BROWSER_USER_AGENT, None, None)
        .map_err(render_err)?;

    debug!(url = %url, "navigating in headless browser");
    tab.navigate_to(url).map_err(render_err)?;
    tab.wait_until_navigated().map_err(render_err)?;

    tab.get_content().map_err(render_err)
    // `browser` drops here on every path, killing the chrome process
}

/// Launches the auto-detected engine first, then falls back to well-known
/// chromium executable locations when the default is unavailable in the
/// runtime environment.
fn launch_browser(timeout: Duration) -> Result<Browser> {
    match Browser::new(launch_options(None, timeout)?) {
        Ok(browser) => return Ok(browser),
        Err(e) => warn!("default browser engine unavailable: {e}"),
    }

    for path in FALLBACK_BROWSER_PATHS {
        if !Path::new(path).exists() {
            continue;
        }
        match Browser::new(launch_options(Some(PathBuf::from(path)), timeout)?) {
            Ok(browser) => {
                debug!("launched fallback browser engine at {path}");
                return Ok(browser);
            }
            Err(e) => warn!("fallback browser engine {path} failed to launch: {e}"),
        }
    }

    Err(ImportError::Render(
        "no usable headless browser engine found".to_string(),
    ))
}

fn launch_options(path: Option<PathBuf>, timeout: Duration) -> Result<LaunchOptions<'static>> {
    LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .path(path)
        .idle_browser_timeout(timeout)
        .build()
        .map_err(|e| ImportError::Render(e.to_string()))
}

fn render_err(e: anyhow::Error) -> ImportError {
    ImportError::Render(e.to_string())
}
