// WatchDogs Data Models
// Plain serializable records shared by the detection and compliance engines

use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Pattern Taxonomy ============

/// Dark pattern category.
///
/// Known categories are strongly typed; anything else (for example a newer
/// category returned by the external classifier) is carried through as
/// `Other` without validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PatternType {
    Urgency,
    Confirmshaming,
    ForcedContinuity,
    HiddenCosts,
    Misdirection,
    TrickQuestions,
    Sneaking,
    SocialProof,
    BaitAndSwitch,
    Obstruction,
    Nagging,
    Other(String),
}

impl PatternType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Urgency => "urgency",
            Self::Confirmshaming => "confirmshaming",
            Self::ForcedContinuity => "forcedContinuity",
            Self::HiddenCosts => "hiddenCosts",
            Self::Misdirection => "misdirection",
            Self::TrickQuestions => "trickQuestions",
            Self::Sneaking => "sneaking",
            Self::SocialProof => "socialProof",
            Self::BaitAndSwitch => "baitAndSwitch",
            Self::Obstruction => "obstruction",
            Self::Nagging => "nagging",
            Self::Other(name) => name.as_str(),
        }
    }

    pub fn parse(val: &str) -> Self {
        match val.trim() {
            "urgency" => Self::Urgency,
            "confirmshaming" => Self::Confirmshaming,
            "forcedContinuity" => Self::ForcedContinuity,
            "hiddenCosts" => Self::HiddenCosts,
            "misdirection" => Self::Misdirection,
            "trickQuestions" => Self::TrickQuestions,
            "sneaking" => Self::Sneaking,
            "socialProof" => Self::SocialProof,
            "baitAndSwitch" => Self::BaitAndSwitch,
            "obstruction" => Self::Obstruction,
            "nagging" => Self::Nagging,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for PatternType {
    fn from(val: String) -> Self {
        Self::parse(&val)
    }
}

impl From<PatternType> for String {
    fn from(val: PatternType) -> Self {
        val.as_str().to_string()
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSeverity {
    Low,
    Medium,
    High,
}

/// Which detector produced a candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Keyword,
    Semantic,
    External,
}

impl DetectionMethod {
    /// Lower is more trusted; used to break confidence ties.
    pub fn priority(self) -> u8 {
        match self {
            Self::Keyword => 0,
            Self::Semantic => 1,
            Self::External => 2,
        }
    }
}

// ============ Fragments ============

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// Paragraphs, headings, list items.
    #[default]
    Content,
    /// Buttons, links, labels and other interactive copy.
    Control,
    /// A checkbox; `text` holds its label.
    Checkbox,
}

/// Unit of analysis supplied by the extractor. Never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFragment {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_text: Option<String>,
    #[serde(default)]
    pub kind: FragmentKind,
    /// Checked state, only meaningful for checkbox fragments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl TextFragment {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            context_text: None,
            kind: FragmentKind::Content,
            checked: None,
        }
    }

    pub fn control(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: FragmentKind::Control,
            ..Self::new(id, text)
        }
    }

    pub fn checkbox(id: impl Into<String>, label: impl Into<String>, checked: bool) -> Self {
        Self {
            kind: FragmentKind::Checkbox,
            checked: Some(checked),
            ..Self::new(id, label)
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_text = Some(context.into());
        self
    }

    pub fn is_checked_checkbox(&self) -> bool {
        self.kind == FragmentKind::Checkbox && self.checked == Some(true)
    }
}

// ============ Candidates & Detection Report ============

/// One detector's claim that a fragment exhibits a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub fragment_id: String,
    pub pattern_type: PatternType,
    pub confidence: f64,
    pub method: DetectionMethod,
    pub rationale: String,
    /// Excerpt of the fragment, at most 100 characters.
    pub matched_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<PatternSeverity>,
    /// Other detectors that reported the same fragment/pattern pair.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corroborated_by: Vec<DetectionMethod>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCounts {
    pub keyword: usize,
    pub semantic: usize,
    pub external: usize,
}

impl MethodCounts {
    pub fn record(&mut self, method: DetectionMethod) {
        match method {
            DetectionMethod::Keyword => self.keyword += 1,
            DetectionMethod::Semantic => self.semantic += 1,
            DetectionMethod::External => self.external += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.keyword + self.semantic + self.external
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub run_id: String,
    pub candidates: Vec<Candidate>,
    /// Winners per method after deduplication.
    pub methods: MethodCounts,
    /// Candidates per method before deduplication.
    pub raw_methods: MethodCounts,
    pub fragments_analyzed: usize,
    pub external_batches: usize,
    pub failed_batches: usize,
    /// True when the run was aborted before every classifier batch finished.
    pub cancelled: bool,
    pub elapsed_ms: u128,
}

impl DetectionReport {
    pub fn count(&self) -> usize {
        self.candidates.len()
    }
}

// ============ Compliance ============

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    FullyCompliant,
    PartiallyCompliant,
    Contradicted,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementResult {
    pub requirement: String,
    pub status: RequirementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Critical,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub check_id: String,
    pub severity: ViolationSeverity,
    pub issue: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceBreakdown {
    pub fully_compliant: usize,
    pub partially_compliant: usize,
    pub total: usize,
    pub critical: usize,
    pub moderate: usize,
    pub minor: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub report_id: String,
    pub regulation: String,
    pub generated_at: String,
    /// 0..=100
    pub score: u8,
    pub summary: String,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub positive_findings: Vec<String>,
    pub breakdown: ComplianceBreakdown,
    pub requirement_results: Vec<RequirementResult>,
    pub violations: Vec<Violation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_type_round_trips_known_and_unknown() {
        let json = serde_json::to_string(&PatternType::ForcedContinuity).unwrap();
        assert_eq!(json, "\"forcedContinuity\"");

        let parsed: PatternType = serde_json::from_str("\"dripPricing\"").unwrap();
        assert_eq!(parsed, PatternType::Other("dripPricing".to_string()));
        assert_eq!(parsed.as_str(), "dripPricing");
    }

    #[test]
    fn test_fragment_defaults_to_content() {
        let fragment: TextFragment =
            serde_json::from_str(r#"{"id": "f1", "text": "Hurry up"}"#).unwrap();
        assert_eq!(fragment.kind, FragmentKind::Content);
        assert!(fragment.checked.is_none());
        assert!(!fragment.is_checked_checkbox());

        let checkbox = TextFragment::checkbox("c1", "Send me marketing emails", true);
        assert!(checkbox.is_checked_checkbox());
    }

    #[test]
    fn test_method_priority_order() {
        assert!(DetectionMethod::Keyword.priority() < DetectionMethod::Semantic.priority());
        assert!(DetectionMethod::Semantic.priority() < DetectionMethod::External.priority());
    }
}
