use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("unsupported platform for URL: {url}")]
    UnsupportedPlatform { url: String },

    #[error("invalid {platform} URL format: {url}")]
    InvalidUrlFormat { platform: String, url: String },

    #[error("event \"{title}\" has already been imported")]
    AlreadyImported { title: String },

    #[error("all import strategies failed for {platform} event at {url}: {detail}")]
    FetchExhausted {
        platform: String,
        url: String,
        detail: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("browser render failed: {0}")]
    Render(String),

    #[error("storage error: {0}")]
    Store(String),

    #[error("environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl ImportError {
    /// User-safe message for the wire envelope. Internal errors are collapsed
    /// into generic phrasing so stack traces and upstream bodies never leak.
    pub fn user_message(&self) -> String {
        match self {
            ImportError::UnsupportedPlatform { .. } => {
                "Unsupported URL. Please provide a valid Luma, Eventbrite, Humanitix, or Partiful event URL."
                    .to_string()
            }
            ImportError::InvalidUrlFormat { platform, .. } => {
                format!("Invalid {platform} URL format. Please check the URL and try again.")
            }
            ImportError::AlreadyImported { title } => {
                format!("Event \"{title}\" has already been imported.")
            }
            ImportError::FetchExhausted { .. } => {
                "Unable to import event. Both API and scraper methods failed. This may be because: \
                 1) The event is private or restricted, 2) The event URL is incorrect, or \
                 3) The event page structure has changed. Please verify the URL and try again."
                    .to_string()
            }
            ImportError::Api { message } => message.clone(),
            _ => "Failed to import event. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
