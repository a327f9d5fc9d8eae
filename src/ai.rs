//! AI capability behind a trait so the pipeline can run with a real client,
//! a test fake, or nothing at all.
//!
//! Implementations wrap a specific LLM provider and handle prompting and
//! response parsing. The pipeline never talks to a provider directly: the
//! location resolver calls `infer_city`, the enrichment stages call
//! `classify` and `summarize`, and each degrades gracefully when the call
//! fails or no client is configured.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::{EVENT_TYPES, INTEREST_AREAS};
use crate::error::{ImportError, Result};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Result of event classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub event_type: String,
    pub interest_areas: Vec<String>,
}

/// Result of summary generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub summary: String,
    pub technical_keywords: Vec<String>,
    pub excitement_hook: String,
}

/// Result of city inference. Whitelist validation and confidence gating are
/// the location resolver's job, not the client's.
#[derive(Debug, Clone, PartialEq)]
pub struct CityInference {
    pub city: String,
    pub confidence: f32,
}

#[async_trait]
pub trait AiCapability: Send + Sync {
    async fn classify(&self, title: &str, description: &str) -> Result<Classification>;
    async fn summarize(&self, title: &str, description: &str) -> Result<Summary>;
    async fn infer_city(&self, title: &str, description: &str) -> Result<CityInference>;
}

/// OpenAI-backed implementation of [`AiCapability`].
pub struct OpenAiCapability {
    client: reqwest::Client,
    api_key: String,
}

impl OpenAiCapability {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, api_key }
    }

    async fn chat(&self, prompt: String, max_tokens: u32, json_mode: bool) -> Result<String> {
        let mut body = serde_json::json!({
            "model": OPENAI_MODEL,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.1,
            "max_tokens": max_tokens,
        });
        if json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::Api {
                message: format!("OpenAI API error: {status}"),
            });
        }

        let value: Value = response.json().await?;
        let content = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ImportError::Api {
                message: "empty completion from OpenAI".to_string(),
            })?;
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl AiCapability for OpenAiCapability {
    async fn classify(&self, title: &str, description: &str) -> Result<Classification> {
        let areas = INTEREST_AREAS
            .iter()
            .map(|a| format!("- \"{a}\""))
            .collect::<Vec<_>>()
            .join("\n");
        let types = EVENT_TYPES
            .iter()
            .map(|t| format!("  - `{t}`"))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "You are an expert AI Event Categorization Engine. Analyze the provided event text \
             and generate a JSON object with two keys: `event_type` and `event_interest_areas`.\n\n\
             `event_type` MUST be exactly one of:\n{types}\n\
             If an event has multiple components, classify by the dominant activity, giving strong \
             weight to keywords in the title.\n\n\
             `event_interest_areas` MUST contain only the 1-2 most central areas from this list \
             (up to 4 when equally strong; `[]` if the event is clearly outside science, \
             technology, or research):\n{areas}\n\n\
             Respond ONLY with the JSON object.\n\n\
             **Title:** {title}\n\n**Description:** {description}"
        );

        let raw = self.chat(prompt, 300, true).await?;
        let parsed: Value = serde_json::from_str(&raw)?;

        let mut event_type = parsed["event_type"].as_str().unwrap_or("Other").to_string();
        if !EVENT_TYPES.contains(&event_type.as_str()) {
            warn!("Invalid event_type returned: {event_type}, defaulting to \"Other\"");
            event_type = "Other".to_string();
        }

        let interest_areas = parsed["event_interest_areas"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .filter(|a| INTEREST_AREAS.contains(a))
                    .map(|a| a.to_string())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Classification {
            event_type,
            interest_areas,
        })
    }

    async fn summarize(&self, title: &str, description: &str) -> Result<Summary> {
        let prompt = format!(
            "Summarize this event for a public listing. Respond ONLY with a JSON object with \
             keys `summary` (2-3 sentences, plain prose), `technical_keywords` (array of up to 6 \
             short technical terms drawn from the text) and `excitement_hook` (one short sentence \
             telling a reader why to attend).\n\n\
             **Title:** {title}\n\n**Description:** {description}"
        );

        let raw = self.chat(prompt, 400, true).await?;
        let parsed: Value = serde_json::from_str(&raw)?;

        let summary = parsed["summary"].as_str().unwrap_or_default().to_string();
        if summary.is_empty() {
            return Err(ImportError::Api {
                message: "summary generation returned no summary".to_string(),
            });
        }

        let technical_keywords = parsed["technical_keywords"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();
        let excitement_hook = parsed["excitement_hook"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(Summary {
            summary,
            technical_keywords,
            excitement_hook,
        })
    }

    async fn infer_city(&self, title: &str, description: &str) -> Result<CityInference> {
        let prompt = format!(
            "You are extracting a UK city for an event. Analyze title and description together.\n\
             Return STRICT JSON with keys city (string) and confidence (number 0..1). City must be \
             a UK city name only (no country/region), or \"TBD\" if unknown. If the event is \
             clearly online/virtual, set city to \"Online\" and confidence 1.\n\n\
             Title: {title}\nDescription: {description}\n\n\
             Rules:\n\
             - Prefer an explicit city mention.\n\
             - If not explicit, infer only when at least 0.90 sure based on strong cues.\n\
             - Output example: {{\"city\":\"Manchester\",\"confidence\":0.95}}"
        );

        let raw = self.chat(prompt, 60, true).await?;
        let parsed: Value = serde_json::from_str(&raw)?;

        let city = parsed["city"].as_str().unwrap_or("TBD").trim().to_string();
        let confidence = parsed["confidence"].as_f64().unwrap_or(0.0) as f32;

        debug!("AI city inference: \"{title}\" -> {city} ({confidence})");
        Ok(CityInference { city, confidence })
    }
}

/// Bounded-retry wrapper around any [`AiCapability`]: 3 attempts with
/// exponential backoff (1s, 2s, 4s). The enrichment orchestrator sequences
/// stages and degrades; retry mechanics live here.
pub struct RetryingAi<A> {
    inner: A,
    max_attempts: u32,
}

impl<A> RetryingAi<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            max_attempts: 3,
        }
    }

    async fn backoff(&self, attempt: u32) {
        // 1s, 2s, 4s
        let delay = Duration::from_secs(1u64 << (attempt - 1));
        tokio::time::sleep(delay).await;
    }
}

macro_rules! retry_call {
    ($self:ident, $label:literal, $call:expr) => {{
        let mut last_err = None;
        for attempt in 1..=$self.max_attempts {
            match $call.await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("{} attempt {attempt} failed: {e}", $label);
                    last_err = Some(e);
                    if attempt < $self.max_attempts {
                        $self.backoff(attempt).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ImportError::Api {
            message: concat!($label, " failed").to_string(),
        }))
    }};
}

#[async_trait]
impl<A: AiCapability> AiCapability for RetryingAi<A> {
    async fn classify(&self, title: &str, description: &str) -> Result<Classification> {
        retry_call!(self, "categorization", self.inner.classify(title, description))
    }

    async fn summarize(&self, title: &str, description: &str) -> Result<Summary> {
        retry_call!(self, "summary generation", self.inner.summarize(title, description))
    }

    async fn infer_city(&self, title: &str, description: &str) -> Result<CityInference> {
        retry_call!(self, "city inference", self.inner.infer_city(title, description))
    }
}
