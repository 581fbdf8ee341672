// Policy Summariser
// Asks the chat provider for a structured summary of a privacy policy

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::services::config_store::ClassifierConfig;
use crate::services::providers::{extract_json_object, ChatParams, ProviderClient, ProviderError};
use crate::services::text_processor::truncate_chars;

pub const SUMMARY_INPUT_MAX_CHARS: usize = 8000;
const SUMMARY_TEMPERATURE: f64 = 0.2;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a privacy policy expert that analyzes privacy policies and identifies both positive and concerning practices. Always respond with valid JSON. Be thorough and detailed in your analysis.";

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("policy text is empty")]
    EmptyDocument,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("summary response not parseable: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySummary {
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub data_collection: String,
    #[serde(default)]
    pub user_rights: String,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub third_party_sharing: String,
    #[serde(default)]
    pub data_retention: String,
}

/// First 8000 characters of the policy, marked when cut.
pub fn summary_input(policy_text: &str) -> String {
    if policy_text.chars().count() > SUMMARY_INPUT_MAX_CHARS {
        format!("{}...", truncate_chars(policy_text, SUMMARY_INPUT_MAX_CHARS))
    } else {
        policy_text.to_string()
    }
}

pub fn build_summary_prompt(text: &str) -> String {
    format!(
        "Analyze this privacy policy in detail and provide a comprehensive summary with the following sections:

1. Key Points: List 7-10 most important points users should know about this policy
2. Data Collection: Detailed explanation of what data is collected and how
3. User Rights: What specific rights users have regarding their data
4. Red Flags: Any concerning or potentially problematic clauses (if present)
5. Third Party Sharing: How data is shared with third parties
6. Data Retention: How long data is kept

Privacy Policy:
{text}

Format your response as JSON with keys: keyPoints (array of strings), dataCollection (string), userRights (string), redFlags (array of strings, can be empty), thirdPartySharing (string), dataRetention (string)

Be thorough and highlight any concerning practices."
    )
}

pub fn parse_summary(content: &str) -> Result<PolicySummary, SummaryError> {
    let json = extract_json_object(content)
        .ok_or_else(|| SummaryError::Parse("no JSON object in response".to_string()))?;
    serde_json::from_str(json).map_err(|e| SummaryError::Parse(e.to_string()))
}

pub async fn summarize_policy(
    client: &ProviderClient,
    config: &ClassifierConfig,
    api_key: &str,
    policy_text: &str,
) -> Result<PolicySummary, SummaryError> {
    if policy_text.trim().is_empty() {
        return Err(SummaryError::EmptyDocument);
    }

    let endpoint = client.endpoint_for(&config.provider, config.base_url.as_deref())?;
    let prompt = build_summary_prompt(&summary_input(policy_text));
    let params = ChatParams {
        model: &config.model,
        api_key,
        system: SUMMARY_SYSTEM_PROMPT,
        user: &prompt,
        temperature: SUMMARY_TEMPERATURE,
        max_tokens: config.max_tokens,
    };

    let result = client.call_chat_api(&endpoint, &params).await?;
    info!("[summary] Policy summarised in {}ms", result.latency_ms);
    parse_summary(&result.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_input_truncates() {
        let long = "a".repeat(9000);
        let input = summary_input(&long);
        assert_eq!(input.chars().count(), SUMMARY_INPUT_MAX_CHARS + 3);
        assert!(input.ends_with("..."));
        assert_eq!(summary_input("short"), "short");
    }

    #[test]
    fn test_parse_summary_fills_missing_keys() {
        let content = "```json\n{\"keyPoints\": [\"Sells data\"], \"redFlags\": []}\n```";
        let summary = parse_summary(content).unwrap();
        assert_eq!(summary.key_points, vec!["Sells data"]);
        assert!(summary.data_retention.is_empty());
        assert!(matches!(parse_summary("nope"), Err(SummaryError::Parse(_))));
    }

    #[tokio::test]
    async fn test_empty_policy_is_rejected() {
        let client = ProviderClient::new();
        let err = summarize_policy(&client, &ClassifierConfig::default(), "key", "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::EmptyDocument));
    }
}
