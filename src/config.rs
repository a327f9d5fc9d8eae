use std::env;
use std::time::Duration;

/// Runtime configuration sourced from the environment.
///
/// Every upstream credential is optional: a missing key switches the
/// corresponding capability off rather than failing at startup. `.env` files
/// are honoured via dotenv before the first read.
#[derive(Debug, Clone)]
pub struct Config {
    pub luma_api_key: Option<String>,
    pub eventbrite_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Applied to every outbound HTTP request.
    pub http_timeout: Duration,
    /// Time limit for headless render navigation.
    pub render_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            luma_api_key: non_empty_var("LUMA_API_KEY"),
            eventbrite_api_key: non_empty_var("EVENTBRITE_API_KEY"),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            http_timeout: duration_var("HTTP_TIMEOUT_SECS", 20),
            render_timeout: duration_var("RENDER_TIMEOUT_SECS", 30),
        }
    }

    /// True when the Luma API strategy is available.
    pub fn luma_api_enabled(&self) -> bool {
        self.luma_api_key.is_some()
    }

    /// True when the Eventbrite API strategy is available.
    pub fn eventbrite_api_enabled(&self) -> bool {
        self.eventbrite_api_key.is_some()
    }

    /// True when AI city inference and enrichment are available.
    pub fn ai_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            luma_api_key: None,
            eventbrite_api_key: None,
            openai_api_key: None,
            http_timeout: Duration::from_secs(20),
            render_timeout: Duration::from_secs(30),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn duration_var(name: &str, default_secs: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}
