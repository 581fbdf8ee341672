use watchdogs_lib::models::{RequirementResult, RequirementStatus, ViolationSeverity};
use watchdogs_lib::services::compliance::{
    analyze_compliance, analyze_with_requirements, build_report, evaluate_requirement, scan_violations,
    ScoringWeights, NO_REQUIREMENTS_FINDING,
};

fn result(name: &str, status: RequirementStatus) -> RequirementResult {
    RequirementResult {
        requirement: name.to_string(),
        status,
        reason: None,
        recommendation: None,
        matched_keywords: vec![],
    }
}

#[test]
fn test_affirmed_right_of_access_is_fully_compliant() {
    let doc = "you have the right to access your data.";
    assert_eq!(
        evaluate_requirement("right to access", doc).status,
        RequirementStatus::FullyCompliant
    );
}

#[test]
fn test_refusing_deletion_is_critical() {
    let violations = scan_violations("We will not delete your data under any circumstances.", "gdpr");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity, ViolationSeverity::Critical);
    assert_eq!(violations[0].issue, "Explicitly refuses data deletion");
}

#[test]
fn test_legal_exception_suppresses_deletion_check() {
    let doc = "We will not delete your data under any circumstances, except where required by law.";
    assert!(scan_violations(doc, "gdpr").is_empty());
}

#[test]
fn test_mixed_checklist_score() {
    let mut results = Vec::new();
    for i in 0..6 {
        results.push(result(&format!("full {}", i), RequirementStatus::FullyCompliant));
    }
    results.push(result("partial a", RequirementStatus::PartiallyCompliant));
    results.push(result("partial b", RequirementStatus::PartiallyCompliant));
    results.push(result("missing", RequirementStatus::NotFound));

    // base 77.8 less one point for the missing requirement
    let report = build_report("gdpr", results.clone(), vec![], &ScoringWeights::default());
    assert_eq!(report.score, 77);
    assert_eq!(report.breakdown.minor, 1);
    assert_eq!(report.findings.last().map(String::as_str), Some("NOT ADDRESSED: missing"));
    assert_eq!(report.positive_findings.len(), 6);

    let no_minor = ScoringWeights {
        minor: 0.0,
        ..ScoringWeights::default()
    };
    assert_eq!(build_report("gdpr", results, vec![], &no_minor).score, 78);
}

#[test]
fn test_unknown_regulation_scores_zero() {
    let report = analyze_compliance("We collect your email address.", "xyz", None).unwrap();
    assert_eq!(report.score, 0);
    assert_eq!(report.breakdown.total, 0);
    assert!(report.findings.contains(&NO_REQUIREMENTS_FINDING.to_string()));
}

#[test]
fn test_adding_a_critical_violation_lowers_the_score() {
    let requirements = vec!["right to access".to_string()];
    let weights = ScoringWeights::default();
    let clean = "You have the right to access your data.";
    let hostile = format!(
        "{} By using the service you waive all rights to any claim.",
        clean
    );

    let before = analyze_with_requirements(clean, "gdpr", &requirements, &weights).unwrap();
    let after = analyze_with_requirements(&hostile, "gdpr", &requirements, &weights).unwrap();

    assert_eq!(before.score, 100);
    assert_eq!(after.breakdown.critical, 1);
    assert!(after.score < before.score);
    assert!(after.findings[0].starts_with("CRITICAL VIOLATION: "));
}

#[test]
fn test_scores_stay_in_range() {
    let docs = [
        "We sell your information. We will not delete your data. You waive all rights. \
         We may ignore any request. We retain data indefinitely for any purpose.",
        "You have the right to access, rectify and erase your data. Contact our data protection officer.",
        "x",
    ];
    for doc in docs {
        for regulation in ["gdpr", "ccpa", "pipeda", "lgpd", "xyz"] {
            let report = analyze_compliance(doc, regulation, None).unwrap();
            assert!(report.score <= 100);
            assert_eq!(
                report.breakdown.total,
                report.requirement_results.len()
            );
        }
    }
}

#[test]
fn test_analysis_is_deterministic() {
    let doc = "We collect your email. You may request deletion of your personal data at any time.";
    let a = analyze_compliance(doc, "gdpr", None).unwrap();
    let b = analyze_compliance(doc, "gdpr", None).unwrap();
    assert_eq!(a.score, b.score);
    assert_eq!(a.findings, b.findings);
    assert_eq!(a.requirement_results, b.requirement_results);
    assert_ne!(a.report_id, b.report_id);
}
