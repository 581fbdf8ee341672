// Violation Scanner
// Document-wide critical/moderate checks, independent of the checklist

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::models::Violation;
use crate::services::knowledge::regulations::{ViolationCheck, VIOLATION_CHECKS};

struct CompiledCheck {
    check: &'static ViolationCheck,
    pattern: Regex,
    skip_if: Option<Regex>,
}

fn build(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("valid regex")
}

static COMPILED_CHECKS: Lazy<Vec<CompiledCheck>> = Lazy::new(|| {
    VIOLATION_CHECKS
        .iter()
        .map(|check| CompiledCheck {
            check,
            pattern: build(check.pattern),
            skip_if: check.skip_if.map(build),
        })
        .collect()
});

/// Triggered checks for a regulation, critical first. Each check fires at
/// most once; a matching `skip_if` suppresses it entirely.
pub fn scan_violations(document: &str, regulation: &str) -> Vec<Violation> {
    COMPILED_CHECKS
        .iter()
        .filter(|c| c.check.applies_to(regulation))
        .filter(|c| c.pattern.is_match(document))
        .filter(|c| !c.skip_if.as_ref().is_some_and(|skip| skip.is_match(document)))
        .map(|c| Violation {
            check_id: c.check.id.to_string(),
            severity: c.check.severity,
            issue: c.check.issue.to_string(),
            recommendation: c.check.recommendation.to_string(),
        })
        .collect()
}
