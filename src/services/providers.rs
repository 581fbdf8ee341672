// AI Provider Service
// OpenAI-compatible chat completions (Groq by default) for the external
// classifier and the policy summariser

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

const GROQ_DEFAULT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";
const REQUEST_TIMEOUT_SECS: u64 = 60;

static JSON_ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[\s\S]*\]").expect("valid regex"));
static JSON_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub latency_ms: i64,
}

/// One chat completion call.
#[derive(Debug, Clone)]
pub struct ChatParams<'a> {
    pub model: &'a str,
    pub api_key: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f64,
    pub max_tokens: i32,
}

/// Default endpoint for a provider name.
pub fn provider_url(provider: &str) -> Result<&'static str, ProviderError> {
    match provider {
        "groq" => Ok(GROQ_DEFAULT_URL),
        "openai" => Ok(OPENAI_DEFAULT_URL),
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}

pub struct ProviderClient {
    client: Client,
    groq_url: String,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            groq_url: env::var("GROQ_API_URL").unwrap_or_else(|_| GROQ_DEFAULT_URL.to_string()),
        }
    }

    pub fn with_proxy(proxy_url: &str) -> Result<Self, ProviderError> {
        let proxy = reqwest::Proxy::all(proxy_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .proxy(proxy)
            .build()?;

        Ok(Self {
            client,
            groq_url: env::var("GROQ_API_URL").unwrap_or_else(|_| GROQ_DEFAULT_URL.to_string()),
        })
    }

    /// Resolve the endpoint for a provider, honouring a configured override.
    pub fn endpoint_for(&self, provider: &str, base_url: Option<&str>) -> Result<String, ProviderError> {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            return Ok(url.trim().to_string());
        }
        match provider {
            "groq" => Ok(self.groq_url.clone()),
            other => provider_url(other).map(str::to_string),
        }
    }

    pub async fn call_chat_api(
        &self,
        url: &str,
        params: &ChatParams<'_>,
    ) -> Result<ChatResult, ProviderError> {
        let request = ChatRequest {
            model: params.model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: params.system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: params.user.to_string(),
                },
            ],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", params.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult { content, latency_ms })
    }
}

/// Outermost JSON array embedded in model output.
pub fn extract_json_array(content: &str) -> Option<&str> {
    JSON_ARRAY_RE.find(content).map(|m| m.as_str())
}

/// Outermost JSON object embedded in model output.
pub fn extract_json_object(content: &str) -> Option<&str> {
    JSON_OBJECT_RE.find(content).map(|m| m.as_str())
}

/// Get API key from environment or config file
pub fn get_api_key(provider: &str) -> Option<String> {
    // Try environment variables first
    let env_keys: &[&str] = match provider {
        "groq" => &["GROQ_API_KEY", "WATCHDOGS_GROQ_API_KEY"],
        "openai" => &["OPENAI_API_KEY", "WATCHDOGS_OPENAI_API_KEY"],
        _ => &[],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    // Try config file
    if let Some(config_dir) = super::ConfigStore::default_config_dir() {
        let store = super::ConfigStore::new(config_dir);
        if let Ok(Some(key)) = store.get_api_key(provider) {
            return Some(key);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_client_creation() {
        let client = ProviderClient::new();
        assert!(client.groq_url.starts_with("http"));
    }

    #[test]
    fn test_endpoint_override() {
        let client = ProviderClient::new();
        let url = client.endpoint_for("openai", Some("http://localhost:9000/v1/chat")).unwrap();
        assert_eq!(url, "http://localhost:9000/v1/chat");
        assert_eq!(client.endpoint_for("openai", None).unwrap(), OPENAI_DEFAULT_URL);
        assert!(matches!(
            client.endpoint_for("mystery", None),
            Err(ProviderError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_extract_json_from_prose() {
        let content = "Here you go:\n```json\n[{\"id\": 0}]\n```";
        assert_eq!(extract_json_array(content), Some("[{\"id\": 0}]"));
        assert_eq!(extract_json_object("noise {\"a\": 1} tail"), Some("{\"a\": 1}"));
        assert!(extract_json_array("no json here").is_none());
    }
}
