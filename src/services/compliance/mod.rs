// Compliance Module
// Privacy policy scoring against a regulation checklist:
// - requirements: per-requirement verdicts from synonym keyword sets
// - violations: document-wide critical/moderate checks
// - scorer: score formula, findings and summary
// - insights: sections, concerns, readability, vague language
// - summary: LLM policy summariser

pub mod insights;
pub mod requirements;
pub mod scorer;
pub mod summary;
pub mod violations;

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::ComplianceReport;
use crate::services::knowledge::regulations::default_requirements;
use crate::services::text_processor::normalize_whitespace;

pub use insights::{analyze_policy, PolicyInsights};
pub use requirements::{evaluate_requirement, evaluate_requirements};
pub use scorer::{build_report, ScoringWeights, NO_REQUIREMENTS_FINDING};
pub use summary::{summarize_policy, PolicySummary, SummaryError};
pub use violations::scan_violations;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ComplianceError {
    #[error("no policy text could be extracted")]
    EmptyDocument,
}

#[derive(Debug, Deserialize)]
struct RequirementFile {
    requirements: Vec<String>,
}

/// Checklist for a regulation: `<dir>/<regulation>.json` when present and
/// readable, otherwise the built-in table (empty for unknown keys).
pub fn load_requirements(regulation: &str, dir: Option<&Path>) -> Vec<String> {
    let key = regulation.trim().to_lowercase();

    if let Some(dir) = dir {
        let path = dir.join(format!("{}.json", key));
        if path.exists() {
            match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<RequirementFile>(&s).map_err(|e| e.to_string()))
            {
                Ok(file) => {
                    debug!("[compliance] Loaded {} requirements from {}", file.requirements.len(), path.display());
                    return file.requirements;
                }
                Err(e) => warn!(
                    "[compliance] Failed to load {}: {}, using built-in requirements",
                    path.display(),
                    e
                ),
            }
        }
    }

    default_requirements(&key)
}

/// Score a policy against an explicit checklist.
pub fn analyze_with_requirements(
    document_text: &str,
    regulation: &str,
    requirements: &[String],
    weights: &ScoringWeights,
) -> Result<ComplianceReport, ComplianceError> {
    let normalized = normalize_whitespace(document_text);
    if normalized.is_empty() {
        return Err(ComplianceError::EmptyDocument);
    }
    let document_lower = normalized.to_lowercase();
    let regulation = regulation.trim().to_lowercase();

    let results = evaluate_requirements(requirements, &document_lower);
    let violations = scan_violations(&document_lower, &regulation);
    let report = build_report(&regulation, results, violations, weights);

    info!(
        "[compliance] {}: score {} ({} critical, {} moderate, {} requirements)",
        report.regulation,
        report.score,
        report.breakdown.critical,
        report.breakdown.moderate,
        report.breakdown.total
    );
    Ok(report)
}

/// Resolve the checklist for `regulation` and score the policy.
///
/// Blank text is the only error. Unknown regulations score 0 with the
/// finding "no requirements defined for this regulation".
pub fn analyze_compliance(
    document_text: &str,
    regulation: &str,
    requirements_dir: Option<&Path>,
) -> Result<ComplianceReport, ComplianceError> {
    let requirements = load_requirements(regulation, requirements_dir);
    analyze_with_requirements(document_text, regulation, &requirements, &ScoringWeights::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequirementStatus;

    #[test]
    fn test_empty_document_is_an_error() {
        assert_eq!(
            analyze_compliance(" \n\t ", "gdpr", None).unwrap_err(),
            ComplianceError::EmptyDocument
        );
    }

    #[test]
    fn test_requirements_file_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("acme.json"),
            r#"{"requirements": ["right to access", "data portability"]}"#,
        )
        .unwrap();

        let reqs = load_requirements("ACME", Some(dir.path()));
        assert_eq!(reqs.len(), 2);

        let report = analyze_compliance("You have the right to access your data.", "acme", Some(dir.path())).unwrap();
        assert_eq!(report.breakdown.total, 2);
        assert_eq!(report.requirement_results[0].status, RequirementStatus::FullyCompliant);
        assert_eq!(report.requirement_results[1].status, RequirementStatus::NotFound);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gdpr.json"), "not json").unwrap();
        assert_eq!(load_requirements("gdpr", Some(dir.path())).len(), 9);
    }
}
