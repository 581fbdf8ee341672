// Regulation Tables
// Default requirement checklists, synonym keyword sets, denial/affirmation
// context patterns and the document-wide violation checks.

use crate::models::ViolationSeverity;

/// Regulations with a built-in checklist.
pub const KNOWN_REGULATIONS: [&str; 4] = ["gdpr", "ccpa", "pipeda", "lgpd"];

/// Built-in checklist for a regulation key. Unknown keys yield an empty list.
pub fn default_requirements(regulation: &str) -> Vec<String> {
    let items: &[&str] = match regulation.trim().to_lowercase().as_str() {
        "gdpr" => &[
            "right to access",
            "right to erasure",
            "right to rectification",
            "data portability",
            "consent mechanism",
            "data protection officer",
            "breach notification",
            "legitimate interest",
            "third party sharing",
        ],
        "ccpa" => &[
            "right to know",
            "right to delete",
            "right to opt-out",
            "non-discrimination",
            "sale of personal information",
            "categories of information",
            "business purpose",
        ],
        "pipeda" => &[
            "consent",
            "limiting collection",
            "limiting use",
            "accuracy",
            "safeguards",
            "openness",
            "individual access",
            "challenging compliance",
        ],
        "lgpd" => &[
            "consent",
            "data purpose",
            "data security",
            "data subject rights",
            "international transfer",
            "data protection officer",
        ],
        _ => &[],
    };
    items.iter().map(|s| s.to_string()).collect()
}

// ============ Synonym Keyword Sets ============

/// Requirement-phrase triggers and the keyword sets they contribute, in
/// evaluation order. A requirement collects the sets of every entry whose
/// trigger it contains.
pub struct SynonymEntry {
    pub triggers: &'static [&'static str],
    pub sets: &'static [&'static [&'static str]],
}

pub static SYNONYM_TABLE: &[SynonymEntry] = &[
    SynonymEntry {
        triggers: &["access"],
        sets: &[
            &["access", "view", "obtain", "retrieve", "copy"],
            &["access your data", "view your information", "see your data"],
        ],
    },
    SynonymEntry {
        triggers: &["delete", "erasure"],
        sets: &[
            &["delete", "erase", "remove", "deletion"],
            &["delete your data", "remove your information", "erase your data"],
        ],
    },
    SynonymEntry {
        triggers: &["opt-out", "opt out"],
        sets: &[
            &["opt-out", "opt out", "unsubscribe", "do not sell"],
            &["opt-out of sale", "do not sell my"],
        ],
    },
    SynonymEntry {
        triggers: &["consent"],
        sets: &[
            &["consent", "permission", "agree", "authorization"],
            &["your consent", "with your permission", "you agree"],
        ],
    },
    SynonymEntry {
        triggers: &["rectification", "correct"],
        sets: &[
            &["rectify", "correct", "update", "amend", "modify"],
            &["correct your data", "update your information"],
        ],
    },
    SynonymEntry {
        triggers: &["portability"],
        sets: &[
            &["portability", "export", "download", "transfer"],
            &["data portability", "export your data", "download your data"],
        ],
    },
    SynonymEntry {
        triggers: &["categories"],
        sets: &[
            &["categories", "types", "kinds"],
            &["categories of information", "types of data"],
        ],
    },
    SynonymEntry {
        triggers: &["purpose"],
        sets: &[
            &["purpose", "reason", "use", "why"],
            &["purpose of", "why we collect", "how we use"],
        ],
    },
    SynonymEntry {
        triggers: &["third party", "shar"],
        sets: &[
            &["third party", "third-party", "share", "sharing"],
            &["share with", "third parties", "share your"],
        ],
    },
    SynonymEntry {
        triggers: &["security"],
        sets: &[
            &["security", "protect", "safeguard", "secure"],
            &["security measures", "protect your data", "keep your data safe"],
        ],
    },
    SynonymEntry {
        triggers: &["breach"],
        sets: &[
            &["breach", "notification", "notify", "inform"],
            &["data breach", "security breach", "notify you"],
        ],
    },
    SynonymEntry {
        triggers: &["retention"],
        sets: &[
            &["retention", "keep", "store", "retain"],
            &["how long", "retention period", "keep your data"],
        ],
    },
    SynonymEntry {
        triggers: &["discrimination"],
        sets: &[
            &["discrimination", "discriminate", "equal treatment"],
            &["will not discriminate", "non-discrimination"],
        ],
    },
    SynonymEntry {
        triggers: &["data protection officer", "dpo"],
        sets: &[&["data protection officer", "dpo", "privacy officer"]],
    },
];

/// Ordered keyword sets for a lower-cased requirement phrase.
///
/// Falls back to a single set made of the requirement's own words longer
/// than three characters when no trigger applies.
pub fn keyword_sets_for(requirement_lower: &str) -> Vec<Vec<String>> {
    let mut sets: Vec<Vec<String>> = SYNONYM_TABLE
        .iter()
        .filter(|entry| entry.triggers.iter().any(|t| requirement_lower.contains(t)))
        .flat_map(|entry| entry.sets.iter())
        .map(|set| set.iter().map(|k| k.to_string()).collect())
        .collect();

    if sets.is_empty() {
        let words: Vec<String> = requirement_lower
            .split(' ')
            .filter(|w| w.chars().count() > 3)
            .map(|w| w.to_string())
            .collect();
        if !words.is_empty() {
            sets.push(words);
        }
    }

    sets
}

// ============ Context Patterns ============

/// Characters inspected either side of a keyword for denial language.
pub const NEGATION_WINDOW_CHARS: usize = 150;
/// Characters inspected either side of a keyword for affirmative language.
pub const AFFIRMATION_WINDOW_CHARS: usize = 200;

/// Explicit denial of a right near a requirement keyword.
pub const CRITICAL_NEGATIONS: &[&str] = &[
    r"will not (provide|honor|allow|grant|respect)",
    r"cannot (provide|honor|allow|grant|give)",
    r"do not (provide|offer|allow|grant|give).*(right|ability)",
    r"refuse to (provide|honor|allow|grant)",
    r"you waive.*right",
];

/// Affirmative statement of a right near a requirement keyword.
pub const POSITIVE_INDICATORS: &[&str] = &[
    r"you (have|can|may).*right",
    r"users? (can|may|have.*right)",
    r"we (will|shall|must|provide|offer|allow)",
    r"available",
    r"entitled to",
    r"you are able to",
];

// ============ Violation Checks ============

/// One document-wide regex check.
#[derive(Debug, Clone, Copy)]
pub struct ViolationCheck {
    pub id: &'static str,
    pub severity: ViolationSeverity,
    pub pattern: &'static str,
    /// Lawful-exception pattern; when it matches the document the check is suppressed.
    pub skip_if: Option<&'static str>,
    pub issue: &'static str,
    pub recommendation: &'static str,
    /// Restricts the check to one regulation key.
    pub regulation: Option<&'static str>,
}

/// Critical checks first, then moderate. Order is the reporting order.
pub static VIOLATION_CHECKS: &[ViolationCheck] = &[
    ViolationCheck {
        id: "forcedRightsWaiver",
        severity: ViolationSeverity::Critical,
        pattern: r"you (waive|relinquish|give up|forfeit).*rights?|waive.*claim|no right to sue",
        skip_if: None,
        issue: "Forces users to waive legal rights",
        recommendation: "Remove clauses forcing users to waive their legal rights",
        regulation: None,
    },
    ViolationCheck {
        id: "refuseDataDeletion",
        severity: ViolationSeverity::Critical,
        pattern: r"will not delete|cannot delete|refuse.*delete|may not.*honor.*deletion|(will not|cannot|refuse to) (delete|remove|erase).*data|no (way|method|means|option) to delete",
        skip_if: Some(r"except (where|when)|unless (required|necessary)|as required by law"),
        issue: "Explicitly refuses data deletion",
        recommendation: "Must provide data deletion capability (required by GDPR/CCPA)",
        regulation: None,
    },
    ViolationCheck {
        id: "ignoreUserRights",
        severity: ViolationSeverity::Critical,
        pattern: r"may ignore.*request|will ignore|discretion.*deny.*request|refuse.*requests? at|arbitrarily (deny|refuse)",
        skip_if: None,
        issue: "Reserves right to arbitrarily ignore user rights requests",
        recommendation: "Cannot arbitrarily deny legitimate rights requests",
        regulation: None,
    },
    ViolationCheck {
        id: "noOptOutSale",
        severity: ViolationSeverity::Critical,
        pattern: r"sell.*information.*(without.*opt|mandatory|required|must accept)",
        skip_if: None,
        issue: "Requires selling data without opt-out option",
        recommendation: "CCPA requires \"Do Not Sell\" opt-out mechanism",
        regulation: Some("ccpa"),
    },
    ViolationCheck {
        id: "noLegalBasis",
        severity: ViolationSeverity::Critical,
        pattern: r"no legal basis|without.*legal.*basis|regardless.*law",
        skip_if: None,
        issue: "Processes data without legal basis",
        recommendation: "GDPR requires lawful basis for all data processing",
        regulation: Some("gdpr"),
    },
    ViolationCheck {
        id: "indefiniteRetention",
        severity: ViolationSeverity::Moderate,
        pattern: r"retain.*(indefinitely|forever|permanently)|keep.*data.*(indefinitely|unlimited)",
        skip_if: None,
        issue: "Retains data indefinitely without justification",
        recommendation: "Specify reasonable data retention periods",
        regulation: None,
    },
    ViolationCheck {
        id: "vaguePurposes",
        severity: ViolationSeverity::Moderate,
        pattern: r"any purpose|whatever purpose|purposes? we (choose|determine|deem)",
        skip_if: None,
        issue: "Data use purposes are overly vague",
        recommendation: "Specify clear, limited purposes for data use",
        regulation: None,
    },
    ViolationCheck {
        id: "unlimitedSharing",
        severity: ViolationSeverity::Moderate,
        pattern: r"share with (anyone|any (company|entity|party))|unlimited.*shar",
        skip_if: None,
        issue: "Shares data with unlimited third parties",
        recommendation: "Limit and specify third-party data sharing",
        regulation: None,
    },
    ViolationCheck {
        id: "noSecurityCommitment",
        severity: ViolationSeverity::Moderate,
        pattern: r"no guarantee.*(security|safe)|cannot guarantee.*secur",
        skip_if: None,
        issue: "Disclaims all responsibility for security",
        recommendation: "Commit to reasonable security measures",
        regulation: None,
    },
    ViolationCheck {
        id: "trackDespiteOptOut",
        severity: ViolationSeverity::Moderate,
        pattern: r"(track|collect|monitor).*(anyway|regardless|despite.*opt)",
        skip_if: None,
        issue: "May ignore user privacy preferences",
        recommendation: "Respect user opt-out choices",
        regulation: None,
    },
];

impl ViolationCheck {
    /// Whether this check runs for the given regulation key.
    pub fn applies_to(&self, regulation: &str) -> bool {
        self.regulation
            .map_or(true, |r| r.eq_ignore_ascii_case(regulation.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requirements() {
        assert_eq!(default_requirements("gdpr").len(), 9);
        assert_eq!(default_requirements("CCPA").len(), 7);
        assert_eq!(default_requirements("pipeda").len(), 8);
        assert_eq!(default_requirements("lgpd").len(), 6);
        assert!(default_requirements("xyz").is_empty());
    }

    #[test]
    fn test_keyword_sets_in_declared_order() {
        let sets = keyword_sets_for("right to erasure");
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0][0], "delete");
        assert_eq!(sets[1][0], "delete your data");

        // "data portability" hits only the portability entry
        let sets = keyword_sets_for("data portability");
        assert_eq!(sets[0][0], "portability");
    }

    #[test]
    fn test_keyword_sets_fallback_to_own_words() {
        let sets = keyword_sets_for("legitimate interest");
        assert_eq!(sets, vec![vec!["legitimate".to_string(), "interest".to_string()]]);
        assert!(keyword_sets_for("a b").is_empty());
    }

    #[test]
    fn test_regulation_scoped_checks() {
        let no_opt_out = VIOLATION_CHECKS.iter().find(|c| c.id == "noOptOutSale").unwrap();
        assert!(no_opt_out.applies_to("ccpa"));
        assert!(!no_opt_out.applies_to("gdpr"));
        let waiver = VIOLATION_CHECKS.iter().find(|c| c.id == "forcedRightsWaiver").unwrap();
        assert!(waiver.applies_to("xyz"));
    }

    #[test]
    fn test_criticals_listed_before_moderates() {
        let first_moderate = VIOLATION_CHECKS
            .iter()
            .position(|c| c.severity == ViolationSeverity::Moderate)
            .unwrap();
        assert!(VIOLATION_CHECKS[first_moderate..]
            .iter()
            .all(|c| c.severity == ViolationSeverity::Moderate));
    }
}
