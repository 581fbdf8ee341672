// External Classifier Adapter
// Phase 3: batches candidate fragments to an LLM chat endpoint and turns its
// verdicts into candidates. A failed batch contributes nothing and the run
// continues.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Candidate, DetectionMethod, FragmentKind, PatternType, TextFragment};
use crate::services::cancel::CancelSignal;
use crate::services::config_store::{AppConfig, ClassifierConfig};
use crate::services::knowledge::KnowledgeBase;
use crate::services::providers::{extract_json_array, get_api_key, ChatParams, ProviderClient, ProviderError};
use crate::services::text_processor::{excerpt, truncate_chars};

pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_MIN_CHARS: usize = 5;
pub const DEFAULT_MAX_CHARS: usize = 300;
const CONTEXT_MAX_CHARS: usize = 100;

const CLASSIFIER_SYSTEM_PROMPT: &str =
    "You are a UX expert specializing in detecting dark patterns. Respond only with valid JSON.";

const CATEGORY_GUIDE: &str = "- urgency: False time pressure
- confirmshaming: Guilt in decline options
- forcedContinuity: Hard to cancel
- hiddenCosts: Surprise fees
- misdirection: Visual tricks
- trickQuestions: Confusing wording
- sneaking: Pre-checked boxes
- socialProof: Fake popularity
- baitAndSwitch: Fake prices
- obstruction: Hard to complete
- nagging: Repeated requests";

static NORMAL_TEXT_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^(home|about|contact|login|sign up|search|menu|close|ok|yes|no)$",
        r"(?i)^(submit|send|next|previous|back|cancel)$",
        r"^\d+$",
        r"^[A-Z]{1,5}$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("classifier transport failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("classifier response not parseable: {0}")]
    Parse(String),
    #[error("no API key configured for provider {0}")]
    MissingApiKey(String),
}

/// One fragment as submitted to the classifier. `id` indexes the fragment list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierInput {
    pub id: usize,
    pub text: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatternGuess {
    #[serde(rename = "type")]
    pub pattern_type: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierVerdict {
    pub id: usize,
    #[serde(default)]
    pub is_dark_pattern: bool,
    /// Ordered by the classifier, most confident first.
    #[serde(default)]
    pub patterns: Vec<PatternGuess>,
}

#[async_trait]
pub trait DarkPatternClassifier: Send + Sync {
    async fn classify_batch(
        &self,
        batch: &[ClassifierInput],
    ) -> Result<Vec<ClassifierVerdict>, ClassifierError>;
}

// ============ LLM-backed classifier ============

pub struct LlmClassifier {
    client: ProviderClient,
    config: ClassifierConfig,
    endpoint: String,
    api_key: String,
}

impl LlmClassifier {
    pub fn new(
        client: ProviderClient,
        config: ClassifierConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, ClassifierError> {
        let endpoint = client.endpoint_for(&config.provider, config.base_url.as_deref())?;
        Ok(Self {
            client,
            config,
            endpoint,
            api_key: api_key.into(),
        })
    }

    /// Build from application config; key from env or config file.
    pub fn from_config(app: &AppConfig) -> Result<Self, ClassifierError> {
        let provider = app.classifier.provider.as_str();
        let api_key = get_api_key(provider)
            .or_else(|| app.api_keys.get(provider).cloned())
            .ok_or_else(|| ClassifierError::MissingApiKey(provider.to_string()))?;

        let client = match app.active_proxy() {
            Some(proxy) => ProviderClient::with_proxy(proxy)?,
            None => ProviderClient::new(),
        };
        Self::new(client, app.classifier.clone(), api_key)
    }
}

#[async_trait]
impl DarkPatternClassifier for LlmClassifier {
    async fn classify_batch(
        &self,
        batch: &[ClassifierInput],
    ) -> Result<Vec<ClassifierVerdict>, ClassifierError> {
        let prompt = build_batch_prompt(batch);
        let params = ChatParams {
            model: &self.config.model,
            api_key: &self.api_key,
            system: CLASSIFIER_SYSTEM_PROMPT,
            user: &prompt,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        let result = self.client.call_chat_api(&self.endpoint, &params).await?;
        debug!(
            "[classifier] Batch of {} answered in {}ms",
            batch.len(),
            result.latency_ms
        );
        parse_batch_response(&result.content)
    }
}

pub fn build_batch_prompt(batch: &[ClassifierInput]) -> String {
    let listing = batch
        .iter()
        .map(|b| format!("[{}] \"{}\" (Context: {})", b.id, b.text, b.context))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze these UI texts for dark patterns. Dark patterns are manipulative design techniques.

Texts to analyze:
{listing}

For each text, determine if it contains dark patterns from these categories:
{CATEGORY_GUIDE}

Respond with JSON array:
[
  {{
    \"id\": number,
    \"isDarkPattern\": boolean,
    \"patterns\": [{{\"type\": \"type\", \"confidence\": 0.0-1.0, \"reasoning\": \"brief\"}}]
  }}
]"
    )
}

/// Pull the verdict array out of free-form model output.
pub fn parse_batch_response(content: &str) -> Result<Vec<ClassifierVerdict>, ClassifierError> {
    let json = extract_json_array(content)
        .ok_or_else(|| ClassifierError::Parse("no JSON array in response".to_string()))?;
    serde_json::from_str(json).map_err(|e| ClassifierError::Parse(e.to_string()))
}

// ============ Selection ============

/// Boilerplate UI copy that is never worth a classifier call.
pub fn is_obviously_normal(text: &str) -> bool {
    let trimmed = text.trim();
    NORMAL_TEXT_RES.iter().any(|re| re.is_match(trimmed))
}

fn fragment_context(fragment: &TextFragment) -> String {
    match fragment.context_text.as_deref().map(str::trim) {
        Some(ctx) if !ctx.is_empty() => truncate_chars(ctx, CONTEXT_MAX_CHARS),
        _ => "none".to_string(),
    }
}

/// Content and control fragments inside the length window, minus boilerplate.
pub fn select_inputs(fragments: &[TextFragment], min_chars: usize, max_chars: usize) -> Vec<ClassifierInput> {
    fragments
        .iter()
        .enumerate()
        .filter(|(_, f)| matches!(f.kind, FragmentKind::Content | FragmentKind::Control))
        .filter_map(|(idx, f)| {
            let text = f.text.trim();
            let len = text.chars().count();
            if len < min_chars || len > max_chars || is_obviously_normal(text) {
                return None;
            }
            Some(ClassifierInput {
                id: idx,
                text: text.to_string(),
                context: fragment_context(f),
            })
        })
        .collect()
}

// ============ Verdict merge ============

/// Candidates from one batch's verdicts. Only the first guess of a positive
/// verdict is used; ids outside the submitted batch are ignored.
pub fn verdicts_to_candidates(
    verdicts: &[ClassifierVerdict],
    batch: &[ClassifierInput],
    fragments: &[TextFragment],
    knowledge: &KnowledgeBase,
) -> Vec<Candidate> {
    verdicts
        .iter()
        .filter(|v| v.is_dark_pattern)
        .filter(|v| batch.iter().any(|b| b.id == v.id))
        .filter_map(|v| {
            let fragment = fragments.get(v.id)?;
            let guess = v.patterns.first()?;
            let pattern_type = PatternType::parse(&guess.pattern_type);
            let rule = knowledge.get(&pattern_type);

            let confidence = if guess.confidence.is_finite() {
                guess.confidence.clamp(0.0, 1.0)
            } else {
                0.0
            };
            let rationale = guess
                .reasoning
                .clone()
                .filter(|r| !r.trim().is_empty())
                .or_else(|| rule.map(|r| r.description.clone()))
                .unwrap_or_else(|| "Flagged by external classifier".to_string());

            Some(Candidate {
                fragment_id: fragment.id.clone(),
                pattern_type,
                confidence,
                method: DetectionMethod::External,
                rationale,
                matched_text: excerpt(&fragment.text),
                display_name: rule.map(|r| r.display_name.clone()),
                severity: rule.map(|r| r.severity),
                corroborated_by: vec![],
            })
        })
        .collect()
}

/// Result of one classifier batch.
#[derive(Debug)]
pub enum BatchOutcome {
    Classified { batch_index: usize, candidates: Vec<Candidate> },
    Failed { batch_index: usize, error: ClassifierError },
}

pub async fn classify_one_batch(
    classifier: &dyn DarkPatternClassifier,
    batch_index: usize,
    batch: &[ClassifierInput],
    fragments: &[TextFragment],
    knowledge: &KnowledgeBase,
) -> BatchOutcome {
    match classifier.classify_batch(batch).await {
        Ok(verdicts) => BatchOutcome::Classified {
            batch_index,
            candidates: verdicts_to_candidates(&verdicts, batch, fragments, knowledge),
        },
        Err(error) => BatchOutcome::Failed { batch_index, error },
    }
}

#[derive(Debug, Default)]
pub struct ExternalPhaseResult {
    pub candidates: Vec<Candidate>,
    /// Batches that ran to completion, failed or not.
    pub batches: usize,
    pub failed_batches: usize,
    pub cancelled: bool,
}

/// Run every batch sequentially. Cancellation abandons the in-flight batch
/// and keeps what earlier batches produced.
pub async fn run_external_phase(
    classifier: &dyn DarkPatternClassifier,
    inputs: &[ClassifierInput],
    fragments: &[TextFragment],
    knowledge: &KnowledgeBase,
    batch_size: usize,
    cancel: &CancelSignal,
) -> ExternalPhaseResult {
    let mut result = ExternalPhaseResult::default();
    let batch_size = batch_size.max(1);

    for (batch_index, batch) in inputs.chunks(batch_size).enumerate() {
        if cancel.is_cancelled() {
            result.cancelled = true;
            break;
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                result.cancelled = true;
                break;
            }
            outcome = classify_one_batch(classifier, batch_index, batch, fragments, knowledge) => outcome,
        };

        result.batches += 1;
        match outcome {
            BatchOutcome::Classified { batch_index, candidates } => {
                debug!(
                    "[classifier] Batch {} produced {} candidates",
                    batch_index,
                    candidates.len()
                );
                result.candidates.extend(candidates);
            }
            BatchOutcome::Failed { batch_index, error } => {
                warn!("[classifier] Batch {} failed: {}", batch_index, error);
                result.failed_batches += 1;
            }
        }
    }

    if result.cancelled {
        info!(
            "[classifier] Cancelled after {} batches ({} candidates kept)",
            result.batches,
            result.candidates.len()
        );
    }
    result
}
