// Pattern Matcher
// Phase 1: first matching keyword rule per fragment, plus the pre-checked
// consent checkbox rule

use crate::models::{Candidate, DetectionMethod, PatternType, TextFragment};
use crate::services::knowledge::{KnowledgeBase, PatternRule};
use crate::services::text_processor::excerpt;

use super::cache::DetectionCache;

pub const DEFAULT_MAX_FRAGMENT_CHARS: usize = 500;

/// Label terms that make a checked checkbox a consent grab.
const CONSENT_BAIT_TERMS: [&str; 3] = ["newsletter", "marketing", "promotional"];
const PRECHECKED_RATIONALE: &str = "Pre-checked consent checkbox";

pub struct PatternMatcher<'a> {
    knowledge: &'a KnowledgeBase,
    cache: Option<&'a DetectionCache>,
    max_chars: usize,
}

impl<'a> PatternMatcher<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        Self {
            knowledge,
            cache: None,
            max_chars: DEFAULT_MAX_FRAGMENT_CHARS,
        }
    }

    pub fn with_cache(mut self, cache: &'a DetectionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Zero or one candidate per fragment, in input order.
    pub fn run(&self, fragments: &[TextFragment]) -> Vec<Candidate> {
        fragments.iter().filter_map(|f| self.match_fragment(f)).collect()
    }

    pub fn match_fragment(&self, fragment: &TextFragment) -> Option<Candidate> {
        let len = fragment.text.chars().count();
        if len == 0 || len > self.max_chars {
            return None;
        }

        if let Some(cache) = self.cache {
            if let Some(cached) = cache.lookup(fragment) {
                return cached;
            }
        }

        let verdict = self.evaluate(fragment);
        if let Some(cache) = self.cache {
            cache.insert(fragment, verdict.as_ref());
        }
        verdict
    }

    fn evaluate(&self, fragment: &TextFragment) -> Option<Candidate> {
        let text_lower = fragment.text.to_lowercase();

        if fragment.is_checked_checkbox()
            && CONSENT_BAIT_TERMS.iter().any(|t| text_lower.contains(t))
        {
            let rule = self.knowledge.get(&PatternType::Sneaking);
            return Some(Candidate {
                fragment_id: fragment.id.clone(),
                pattern_type: PatternType::Sneaking,
                confidence: 1.0,
                method: DetectionMethod::Keyword,
                rationale: PRECHECKED_RATIONALE.to_string(),
                matched_text: excerpt(&fragment.text),
                display_name: rule.map(|r| r.display_name.clone()),
                severity: rule.map(|r| r.severity),
                corroborated_by: vec![],
            });
        }

        self.knowledge.rules().iter().find_map(|rule| {
            rule.first_matching_keyword(&text_lower)
                .map(|pattern| keyword_candidate(fragment, rule, pattern.source()))
        })
    }
}

fn keyword_candidate(fragment: &TextFragment, rule: &PatternRule, pattern: &str) -> Candidate {
    Candidate {
        fragment_id: fragment.id.clone(),
        pattern_type: rule.pattern_type.clone(),
        confidence: 1.0,
        method: DetectionMethod::Keyword,
        rationale: format!("{} (matched /{}/)", rule.description, pattern),
        matched_text: excerpt(&fragment.text),
        display_name: Some(rule.display_name.clone()),
        severity: Some(rule.severity),
        corroborated_by: vec![],
    }
}
