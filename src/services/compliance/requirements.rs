// Requirement Evaluator
// Judges one checklist item against the lower-cased policy text using
// synonym keyword sets and denial/affirmation context windows

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{RequirementResult, RequirementStatus};
use crate::services::knowledge::regulations::{
    keyword_sets_for, AFFIRMATION_WINDOW_CHARS, CRITICAL_NEGATIONS, NEGATION_WINDOW_CHARS,
    POSITIVE_INDICATORS,
};
use crate::services::text_processor::context_window;

static NEGATION_RES: Lazy<Vec<Regex>> = Lazy::new(|| compile_all(CRITICAL_NEGATIONS));
static POSITIVE_RES: Lazy<Vec<Regex>> = Lazy::new(|| compile_all(POSITIVE_INDICATORS));

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).expect("valid regex"))
        .collect()
}

/// Does any window around the first occurrence of a keyword match a pattern?
fn context_matches(keywords: &[String], document: &str, radius: usize, patterns: &[Regex]) -> bool {
    keywords.iter().any(|keyword| {
        document.find(keyword.as_str()).is_some_and(|idx| {
            let window = context_window(document, idx, idx, radius);
            patterns.iter().any(|re| re.is_match(window))
        })
    })
}

/// Evaluate one requirement.
///
/// The first keyword set with any hit is selected; later sets are never
/// consulted. Denial language near a hit contradicts the requirement;
/// otherwise an affirmative statement, or hits on at least half the set,
/// makes it fully compliant.
pub fn evaluate_requirement(requirement: &str, document_lower: &str) -> RequirementResult {
    let requirement_lower = requirement.to_lowercase();

    let selected = keyword_sets_for(&requirement_lower).into_iter().find_map(|set| {
        let matched: Vec<String> = set
            .iter()
            .filter(|k| document_lower.contains(k.as_str()))
            .cloned()
            .collect();
        (!matched.is_empty()).then_some((set.len(), matched))
    });

    let Some((set_len, matched)) = selected else {
        return RequirementResult {
            requirement: requirement.to_string(),
            status: RequirementStatus::NotFound,
            reason: Some("Not addressed in the policy".to_string()),
            recommendation: Some(format!("Consider adding: {}", requirement)),
            matched_keywords: vec![],
        };
    };

    if context_matches(&matched, document_lower, NEGATION_WINDOW_CHARS, &NEGATION_RES) {
        return RequirementResult {
            requirement: requirement.to_string(),
            status: RequirementStatus::Contradicted,
            reason: Some("Mentioned but contradicted by explicit denial language".to_string()),
            recommendation: Some(format!(
                "Provide clear, affirmative statement about {}",
                requirement
            )),
            matched_keywords: matched,
        };
    }

    let affirmed = context_matches(&matched, document_lower, AFFIRMATION_WINDOW_CHARS, &POSITIVE_RES);
    if affirmed || matched.len() * 2 >= set_len {
        return RequirementResult {
            requirement: requirement.to_string(),
            status: RequirementStatus::FullyCompliant,
            reason: None,
            recommendation: None,
            matched_keywords: matched,
        };
    }

    RequirementResult {
        requirement: requirement.to_string(),
        status: RequirementStatus::PartiallyCompliant,
        reason: Some("Mentioned but not fully addressed".to_string()),
        recommendation: Some(format!("Provide more detail about {}", requirement)),
        matched_keywords: matched,
    }
}

pub fn evaluate_requirements(requirements: &[String], document_lower: &str) -> Vec<RequirementResult> {
    requirements
        .iter()
        .map(|r| evaluate_requirement(r, document_lower))
        .collect()
}
