// Semantic Similarity Matcher
// Phase 2: word-overlap similarity against rule examples and intent indicators

use crate::models::{Candidate, DetectionMethod, FragmentKind, TextFragment};
use crate::services::knowledge::{KnowledgeBase, PatternRule};
use crate::services::text_processor::{excerpt, word_tokens};

pub const DEFAULT_SEMANTIC_MAX_CHARS: usize = 200;
const EXAMPLE_THRESHOLD: f64 = 0.5;
const INDICATOR_THRESHOLD: f64 = 0.6;

/// Which anchor produced a semantic score.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticAnchor {
    Example(String),
    Indicator(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticScore {
    pub score: f64,
    pub anchor: SemanticAnchor,
}

/// `|example ∩ fragment| / max(|example|, |fragment|, 1)`, best over all examples.
pub fn example_similarity(text_tokens: &[String], examples: &[String]) -> Option<SemanticScore> {
    let mut best: Option<SemanticScore> = None;
    for example in examples {
        let example_tokens = word_tokens(example);
        let common = example_tokens
            .iter()
            .filter(|w| text_tokens.contains(w))
            .count();
        let denom = example_tokens.len().max(text_tokens.len()).max(1);
        let score = common as f64 / denom as f64;

        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(SemanticScore {
                score,
                anchor: SemanticAnchor::Example(example.clone()),
            });
        }
    }
    best
}

/// Best indicator whose words mostly occur in the text.
///
/// An indicator matches when at least `ceil(0.6 * n)` of its `n` words
/// appear in the lower-cased text; its score is the matched fraction.
pub fn indicator_similarity(text_lower: &str, indicators: &[String]) -> Option<SemanticScore> {
    let mut best: Option<SemanticScore> = None;
    for indicator in indicators {
        let words = word_tokens(indicator);
        if words.is_empty() {
            continue;
        }
        let matched = words.iter().filter(|w| text_lower.contains(w.as_str())).count();
        let required = (3 * words.len() + 4) / 5;
        if matched < required {
            continue;
        }

        let score = matched as f64 / words.len() as f64;
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(SemanticScore {
                score,
                anchor: SemanticAnchor::Indicator(indicator.clone()),
            });
        }
    }
    best
}

/// Highest qualifying score for one rule; examples win ties.
pub fn score_rule(text_lower: &str, text_tokens: &[String], rule: &PatternRule) -> Option<SemanticScore> {
    let example = example_similarity(text_tokens, &rule.example_texts)
        .filter(|s| s.score > EXAMPLE_THRESHOLD);
    let indicator = indicator_similarity(text_lower, &rule.semantic_indicators)
        .filter(|s| s.score > INDICATOR_THRESHOLD);

    match (example, indicator) {
        (Some(e), Some(i)) if i.score > e.score => Some(i),
        (Some(e), _) => Some(e),
        (None, i) => i,
    }
}

pub struct SemanticMatcher<'a> {
    knowledge: &'a KnowledgeBase,
    max_chars: usize,
}

impl<'a> SemanticMatcher<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        Self {
            knowledge,
            max_chars: DEFAULT_SEMANTIC_MAX_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Interactive copy only: controls and checkbox labels.
    pub fn accepts(&self, fragment: &TextFragment) -> bool {
        let len = fragment.text.chars().count();
        matches!(fragment.kind, FragmentKind::Control | FragmentKind::Checkbox)
            && len > 0
            && len <= self.max_chars
    }

    pub fn run(&self, fragments: &[TextFragment]) -> Vec<Candidate> {
        fragments
            .iter()
            .filter(|f| self.accepts(f))
            .filter_map(|f| self.match_fragment(f))
            .collect()
    }

    /// At most one candidate: the rule with the highest qualifying score,
    /// earlier rules winning ties.
    pub fn match_fragment(&self, fragment: &TextFragment) -> Option<Candidate> {
        let text_lower = fragment.text.to_lowercase();
        let tokens = word_tokens(&text_lower);

        let mut best: Option<(&PatternRule, SemanticScore)> = None;
        for rule in self.knowledge.rules() {
            if let Some(score) = score_rule(&text_lower, &tokens, rule) {
                if best.as_ref().map_or(true, |(_, b)| score.score > b.score) {
                    best = Some((rule, score));
                }
            }
        }

        best.map(|(rule, score)| {
            let rationale = match &score.anchor {
                SemanticAnchor::Example(example) => {
                    format!("{} (similar to \"{}\")", rule.description, example)
                }
                SemanticAnchor::Indicator(indicator) => {
                    format!("{} (indicator \"{}\")", rule.description, indicator)
                }
            };
            Candidate {
                fragment_id: fragment.id.clone(),
                pattern_type: rule.pattern_type.clone(),
                confidence: score.score.clamp(0.0, 1.0),
                method: DetectionMethod::Semantic,
                rationale,
                matched_text: excerpt(&fragment.text),
                display_name: Some(rule.display_name.clone()),
                severity: Some(rule.severity),
                corroborated_by: vec![],
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatternSeverity, PatternType};
    use crate::services::knowledge::RuleDefinition;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builtin().unwrap()
    }

    fn semantic_rule(pattern_type: &str, indicators: &[&str], examples: &[&str]) -> RuleDefinition {
        RuleDefinition {
            pattern_type: pattern_type.to_string(),
            display_name: pattern_type.to_string(),
            description: "test rule".to_string(),
            severity: PatternSeverity::Low,
            keywords: vec![],
            literal: false,
            semantic_indicators: indicators.iter().map(|s| s.to_string()).collect(),
            examples: examples.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_example_similarity_score() {
        let tokens = word_tokens("no thanks, i hate saving");
        let examples = vec!["No thanks, I hate discounts".to_string()];
        let s = example_similarity(&tokens, &examples).unwrap();
        // common {thanks, hate} over max(3, 3)
        assert!((s.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_indicator_requires_sixty_percent() {
        let indicators = vec!["Hidden shipping costs".to_string()];
        assert!(indicator_similarity("hidden costs", &indicators).is_some());
        assert!(indicator_similarity("hidden fees", &indicators).is_none());
    }

    #[test]
    fn test_confirmshaming_example() {
        let kb = kb();
        let matcher = SemanticMatcher::new(&kb);
        let c = matcher
            .match_fragment(&TextFragment::control("b1", "No thanks, I don't want to save money"))
            .unwrap();
        assert_eq!(c.pattern_type, PatternType::Confirmshaming);
        assert_eq!(c.confidence, 1.0);
        assert_eq!(c.method, DetectionMethod::Semantic);
    }

    #[test]
    fn test_indicator_match() {
        let kb = kb();
        let matcher = SemanticMatcher::new(&kb);
        let c = matcher
            .match_fragment(&TextFragment::control("l1", "Hidden cancellation process ahead"))
            .unwrap();
        assert_eq!(c.pattern_type, PatternType::ForcedContinuity);
        assert_eq!(c.confidence, 1.0);
        assert!(c.rationale.contains("indicator"));
    }

    #[test]
    fn test_content_fragments_are_not_considered() {
        let kb = kb();
        let matcher = SemanticMatcher::new(&kb);
        let fragments = vec![
            TextFragment::new("p", "No thanks, I don't want to save money"),
            TextFragment::control("c", "x".repeat(201)),
        ];
        assert!(matcher.run(&fragments).is_empty());
    }

    #[test]
    fn test_no_result_below_thresholds() {
        let kb = kb();
        let matcher = SemanticMatcher::new(&kb);
        assert!(matcher.match_fragment(&TextFragment::control("b", "Continue")).is_none());
    }

    #[test]
    fn test_example_wins_tie_with_indicator() {
        let kb = KnowledgeBase::from_definitions(
            "t",
            &[semantic_rule("nagging", &["remind later"], &["Remind later"])],
        )
        .unwrap();
        let text = "remind later";
        let score = score_rule(text, &word_tokens(text), &kb.rules()[0]).unwrap();
        assert_eq!(score.score, 1.0);
        assert_eq!(score.anchor, SemanticAnchor::Example("Remind later".to_string()));
    }

    #[test]
    fn test_earlier_rule_wins_tie() {
        let nagging = semantic_rule("nagging", &[], &["Remind later"]);
        let obstruction = semantic_rule("obstruction", &[], &["Remind later"]);
        let fragment = TextFragment::control("b1", "Remind later");

        let kb = KnowledgeBase::from_definitions("t", &[nagging.clone(), obstruction.clone()]).unwrap();
        let c = SemanticMatcher::new(&kb).match_fragment(&fragment).unwrap();
        assert_eq!(c.pattern_type, PatternType::Nagging);

        let kb = KnowledgeBase::from_definitions("t", &[obstruction, nagging]).unwrap();
        let c = SemanticMatcher::new(&kb).match_fragment(&fragment).unwrap();
        assert_eq!(c.pattern_type, PatternType::Obstruction);
    }
}
