// Compliance Scorer
// Combines requirement verdicts and violations into a 0-100 score, findings
// and a one-line summary

use crate::models::{
    ComplianceBreakdown, ComplianceReport, RequirementResult, RequirementStatus, Violation,
    ViolationSeverity,
};

pub const NO_REQUIREMENTS_FINDING: &str = "no requirements defined for this regulation";

/// Penalty points per issue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub critical: f64,
    pub moderate: f64,
    pub minor: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            critical: 20.0,
            moderate: 5.0,
            minor: 1.0,
        }
    }
}

/// Tally requirement statuses and violations. Contradicted requirements
/// count as moderate issues and missing ones as minor.
pub fn tally(results: &[RequirementResult], violations: &[Violation]) -> ComplianceBreakdown {
    let mut breakdown = ComplianceBreakdown {
        total: results.len(),
        ..Default::default()
    };

    for result in results {
        match result.status {
            RequirementStatus::FullyCompliant => breakdown.fully_compliant += 1,
            RequirementStatus::PartiallyCompliant => breakdown.partially_compliant += 1,
            RequirementStatus::Contradicted => breakdown.moderate += 1,
            RequirementStatus::NotFound => breakdown.minor += 1,
        }
    }
    for violation in violations {
        match violation.severity {
            ViolationSeverity::Critical => breakdown.critical += 1,
            ViolationSeverity::Moderate => breakdown.moderate += 1,
        }
    }
    breakdown
}

/// `clamp(round(base - penalties), 0, 100)`; zero requirements score 0.
pub fn compute_score(breakdown: &ComplianceBreakdown, weights: &ScoringWeights) -> u8 {
    if breakdown.total == 0 {
        return 0;
    }

    let base = (breakdown.fully_compliant as f64 + 0.5 * breakdown.partially_compliant as f64)
        / breakdown.total as f64
        * 100.0;
    let penalty = weights.critical * breakdown.critical as f64
        + weights.moderate * breakdown.moderate as f64
        + weights.minor * breakdown.minor as f64;

    (base - penalty).round().clamp(0.0, 100.0) as u8
}

pub fn summarize(breakdown: &ComplianceBreakdown) -> String {
    let mut summary = format!(
        "Found {} fully compliant, {} partially compliant out of {} requirements.",
        breakdown.fully_compliant, breakdown.partially_compliant, breakdown.total
    );

    if breakdown.critical > 0 {
        summary.push_str(&format!(
            " {} critical violation{} detected.",
            breakdown.critical,
            if breakdown.critical == 1 { "" } else { "s" }
        ));
    }
    if breakdown.moderate > 0 {
        summary.push_str(&format!(
            " {} moderate concern{} found.",
            breakdown.moderate,
            if breakdown.moderate == 1 { "" } else { "s" }
        ));
    }
    let addressed = breakdown.fully_compliant + breakdown.partially_compliant;
    if breakdown.critical == 0
        && breakdown.moderate == 0
        && breakdown.total > 0
        && addressed as f64 >= 0.7 * breakdown.total as f64
    {
        summary.push_str(" Generally compliant.");
    }
    summary
}

/// Findings, recommendations and positive findings in reporting order:
/// critical, moderate, contradicted, partial, not found.
fn assemble_findings(
    results: &[RequirementResult],
    violations: &[Violation],
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut findings = Vec::new();
    let mut recommendations = Vec::new();

    for severity in [ViolationSeverity::Critical, ViolationSeverity::Moderate] {
        for v in violations.iter().filter(|v| v.severity == severity) {
            let label = match severity {
                ViolationSeverity::Critical => "CRITICAL VIOLATION",
                ViolationSeverity::Moderate => "CONCERN",
            };
            findings.push(format!("{}: {}", label, v.issue));
            recommendations.push(v.recommendation.clone());
        }
    }

    for status in [
        RequirementStatus::Contradicted,
        RequirementStatus::PartiallyCompliant,
        RequirementStatus::NotFound,
    ] {
        for r in results.iter().filter(|r| r.status == status) {
            let finding = match status {
                RequirementStatus::Contradicted => format!(
                    "CONTRADICTED: {} - {}",
                    r.requirement,
                    r.reason.as_deref().unwrap_or_default()
                ),
                RequirementStatus::PartiallyCompliant => format!(
                    "PARTIAL: {} - {}",
                    r.requirement,
                    r.reason.as_deref().unwrap_or_default()
                ),
                _ => format!("NOT ADDRESSED: {}", r.requirement),
            };
            findings.push(finding);
            if let Some(rec) = &r.recommendation {
                recommendations.push(rec.clone());
            }
        }
    }

    let positive = results
        .iter()
        .filter(|r| r.status == RequirementStatus::FullyCompliant)
        .map(|r| format!("Addresses {}", r.requirement))
        .collect();

    (findings, recommendations, positive)
}

pub fn build_report(
    regulation: &str,
    results: Vec<RequirementResult>,
    violations: Vec<Violation>,
    weights: &ScoringWeights,
) -> ComplianceReport {
    let breakdown = tally(&results, &violations);
    let score = compute_score(&breakdown, weights);
    let (mut findings, recommendations, positive_findings) = assemble_findings(&results, &violations);

    if breakdown.total == 0 {
        findings.push(NO_REQUIREMENTS_FINDING.to_string());
    }

    ComplianceReport {
        report_id: uuid::Uuid::new_v4().to_string(),
        regulation: regulation.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        score,
        summary: summarize(&breakdown),
        findings,
        recommendations,
        positive_findings,
        breakdown,
        requirement_results: results,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, status: RequirementStatus) -> RequirementResult {
        RequirementResult {
            requirement: name.to_string(),
            status,
            reason: Some("why".to_string()),
            recommendation: Some(format!("fix {}", name)),
            matched_keywords: vec![],
        }
    }

    fn critical() -> Violation {
        Violation {
            check_id: "forcedRightsWaiver".to_string(),
            severity: ViolationSeverity::Critical,
            issue: "Forces users to waive legal rights".to_string(),
            recommendation: "Remove clauses".to_string(),
        }
    }

    fn nine() -> Vec<RequirementResult> {
        let mut results: Vec<_> = (0..6)
            .map(|i| result(&format!("full {}", i), RequirementStatus::FullyCompliant))
            .collect();
        results.push(result("partial a", RequirementStatus::PartiallyCompliant));
        results.push(result("partial b", RequirementStatus::PartiallyCompliant));
        results.push(result("missing", RequirementStatus::NotFound));
        results
    }

    #[test]
    fn test_score_formula() {
        // base 77.78, one minor gap
        let breakdown = tally(&nine(), &[]);
        assert_eq!(compute_score(&breakdown, &ScoringWeights::default()), 77);

        let no_minor = ScoringWeights {
            minor: 0.0,
            ..Default::default()
        };
        assert_eq!(compute_score(&breakdown, &no_minor), 78);
    }

    #[test]
    fn test_zero_requirements() {
        let report = build_report("xyz", vec![], vec![], &ScoringWeights::default());
        assert_eq!(report.score, 0);
        assert_eq!(report.findings, vec![NO_REQUIREMENTS_FINDING.to_string()]);
    }

    #[test]
    fn test_clamped_at_zero() {
        let results = vec![result("a", RequirementStatus::PartiallyCompliant)];
        let violations = vec![critical(), critical(), critical()];
        let breakdown = tally(&results, &violations);
        assert_eq!(compute_score(&breakdown, &ScoringWeights::default()), 0);
    }

    #[test]
    fn test_findings_order() {
        let results = vec![
            result("missing", RequirementStatus::NotFound),
            result("thin", RequirementStatus::PartiallyCompliant),
            result("denied", RequirementStatus::Contradicted),
            result("good", RequirementStatus::FullyCompliant),
        ];
        let report = build_report("gdpr", results, vec![critical()], &ScoringWeights::default());
        assert_eq!(
            report.findings,
            vec![
                "CRITICAL VIOLATION: Forces users to waive legal rights",
                "CONTRADICTED: denied - why",
                "PARTIAL: thin - why",
                "NOT ADDRESSED: missing",
            ]
        );
        assert_eq!(report.recommendations[0], "Remove clauses");
        assert_eq!(report.positive_findings, vec!["Addresses good"]);
        assert_eq!(report.breakdown.moderate, 1);
        assert_eq!(report.breakdown.minor, 1);
    }

    #[test]
    fn test_summary_text() {
        let breakdown = tally(&nine(), &[critical()]);
        assert_eq!(
            summarize(&breakdown),
            "Found 6 fully compliant, 2 partially compliant out of 9 requirements. 1 critical violation detected."
        );
        let clean = tally(&nine(), &[]);
        assert!(summarize(&clean).ends_with("Generally compliant."));
    }
}
