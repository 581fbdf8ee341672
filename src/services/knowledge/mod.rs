// Rule Knowledge Base
// Ordered, validated table of dark-pattern rules plus the regulation tables
// used by the compliance engine.
//
// Rule order is significant: the keyword matcher returns the first rule that
// matches, so the table is an explicit Vec and never a map.

pub mod patterns;
pub mod regulations;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::models::{PatternSeverity, PatternType};

pub const BUILTIN_VERSION: &str = "patterns-v2.0";

#[derive(Error, Debug)]
pub enum KnowledgeBaseError {
    #[error("duplicate pattern type: {0}")]
    DuplicateType(String),
    #[error("pattern type {0} has no keyword patterns and no example texts")]
    EmptyRule(String),
    #[error("invalid keyword pattern for {pattern_type}: {pattern}: {source}")]
    InvalidPattern {
        pattern_type: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to read rule file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse rule file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A single keyword matcher. Evaluated against lower-cased fragment text.
#[derive(Debug, Clone)]
pub enum KeywordPattern {
    Literal(String),
    Regex(Regex),
}

impl KeywordPattern {
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Self::Regex)
    }

    pub fn literal(text: &str) -> Self {
        Self::Literal(text.to_lowercase())
    }

    pub fn is_match(&self, text_lower: &str) -> bool {
        match self {
            Self::Literal(needle) => text_lower.contains(needle.as_str()),
            Self::Regex(re) => re.is_match(text_lower),
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Self::Literal(needle) => needle,
            Self::Regex(re) => re.as_str(),
        }
    }
}

/// One dark-pattern category.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub pattern_type: PatternType,
    pub display_name: String,
    pub description: String,
    pub severity: PatternSeverity,
    pub keyword_patterns: Vec<KeywordPattern>,
    pub semantic_indicators: Vec<String>,
    pub example_texts: Vec<String>,
}

impl PatternRule {
    /// First keyword pattern (in declared order) that matches.
    pub fn first_matching_keyword(&self, text_lower: &str) -> Option<&KeywordPattern> {
        self.keyword_patterns.iter().find(|p| p.is_match(text_lower))
    }
}

/// Serializable rule record, the on-disk form of a [`PatternRule`].
///
/// `keywords` are regular expressions unless `literal` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    #[serde(rename = "type")]
    pub pattern_type: String,
    pub display_name: String,
    pub description: String,
    pub severity: PatternSeverity,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub literal: bool,
    #[serde(default)]
    pub semantic_indicators: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl RuleDefinition {
    pub fn compile(&self) -> Result<PatternRule, KnowledgeBaseError> {
        let keyword_patterns = self
            .keywords
            .iter()
            .map(|k| {
                if self.literal {
                    Ok(KeywordPattern::literal(k))
                } else {
                    KeywordPattern::regex(k).map_err(|source| KnowledgeBaseError::InvalidPattern {
                        pattern_type: self.pattern_type.clone(),
                        pattern: k.clone(),
                        source,
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PatternRule {
            pattern_type: PatternType::parse(&self.pattern_type),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            severity: self.severity,
            keyword_patterns,
            semantic_indicators: self.semantic_indicators.clone(),
            example_texts: self.examples.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    version: Option<String>,
    rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    version: String,
    rules: Vec<PatternRule>,
}

impl KnowledgeBase {
    /// Validate and wrap an ordered rule list.
    ///
    /// Fails on duplicate types and on rules that carry neither keyword
    /// patterns nor examples.
    pub fn new(version: impl Into<String>, rules: Vec<PatternRule>) -> Result<Self, KnowledgeBaseError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.pattern_type.clone()) {
                return Err(KnowledgeBaseError::DuplicateType(rule.pattern_type.to_string()));
            }
            if rule.keyword_patterns.is_empty() && rule.example_texts.is_empty() {
                return Err(KnowledgeBaseError::EmptyRule(rule.pattern_type.to_string()));
            }
        }

        Ok(Self {
            version: version.into(),
            rules,
        })
    }

    pub fn from_definitions(
        version: impl Into<String>,
        definitions: &[RuleDefinition],
    ) -> Result<Self, KnowledgeBaseError> {
        let rules = definitions
            .iter()
            .map(RuleDefinition::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(version, rules)
    }

    /// The built-in table shipped with the engine.
    pub fn builtin() -> Result<Self, KnowledgeBaseError> {
        Self::from_definitions(BUILTIN_VERSION, &patterns::builtin_definitions())
    }

    /// Parse `{"version": "...", "rules": [...]}`.
    pub fn from_json_str(content: &str) -> Result<Self, KnowledgeBaseError> {
        let file: RuleFile = serde_json::from_str(content)?;
        let version = file.version.unwrap_or_else(|| "custom".to_string());
        Self::from_definitions(version, &file.rules)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, KnowledgeBaseError> {
        let content = fs::read_to_string(path)?;
        let kb = Self::from_json_str(&content)?;
        info!(
            "[knowledge] Loaded {} rules (version {}) from {}",
            kb.rules.len(),
            kb.version,
            path.display()
        );
        Ok(kb)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn get(&self, pattern_type: &PatternType) -> Option<&PatternRule> {
        self.rules.iter().find(|r| &r.pattern_type == pattern_type)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
