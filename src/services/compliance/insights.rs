// Policy Insights
// Section extraction, privacy concern flags, readability and vague-language
// metrics for a privacy policy

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::services::text_processor::{count_words, excerpt, split_sentences};

const SECTION_KEYWORDS: [(PolicySection, &[&str]); 8] = [
    (
        PolicySection::DataCollection,
        &["collect", "information we collect", "data we gather", "personal information"],
    ),
    (PolicySection::DataUsage, &["use of", "how we use", "purpose", "processing"]),
    (PolicySection::DataSharing, &["share", "disclose", "third party", "third-party"]),
    (
        PolicySection::UserRights,
        &["your rights", "user rights", "access", "delete", "opt-out", "opt out"],
    ),
    (PolicySection::Security, &["security", "protect", "safeguard"]),
    (PolicySection::Cookies, &["cookie", "tracking", "analytics"]),
    (PolicySection::Children, &["children", "minors", "under"]),
    (PolicySection::Contact, &["contact", "reach us", "questions"]),
];

const CONCERN_PATTERNS: [(&str, &str); 8] = [
    (
        r"sell.*personal.*information|personal.*information.*sold",
        "May sell personal information",
    ),
    (r"share.*third.*party|third.*party.*share", "Shares data with third parties"),
    (r"track.*across.*websites|cross.*site.*tracking", "Tracks across websites"),
    (r"automatic.*renewal|auto.*renew", "Automatic renewal/subscription"),
    (r"may.*change.*policy|reserve.*right.*modify", "Policy may change without notice"),
    (r"indefinitely|unlimited.*time|permanent", "May retain data indefinitely"),
    (r"government.*request|law.*enforcement", "May share with law enforcement"),
    (r"marketing.*purposes|advertising", "Uses data for marketing"),
];

const VAGUE_TERMS: [&str; 14] = [
    "may", "might", "could", "possibly", "sometimes", "generally", "usually", "typically",
    "often", "various", "certain", "some", "many", "etc",
];

/// Elements every policy is expected to mention.
pub const MANDATORY_ELEMENTS: [&str; 6] = [
    "contact information",
    "effective date",
    "data retention",
    "user rights",
    "cookies",
    "security",
];

static CONCERN_RES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    CONCERN_PATTERNS
        .iter()
        .map(|(p, concern)| (Regex::new(&format!("(?i){}", p)).expect("valid regex"), *concern))
        .collect()
});

static VAGUE_RES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    VAGUE_TERMS
        .iter()
        .map(|t| (Regex::new(&format!(r"(?i)\b{}\b", t)).expect("valid regex"), *t))
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicySection {
    DataCollection,
    DataUsage,
    DataSharing,
    UserRights,
    Security,
    Cookies,
    Children,
    Contact,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySections {
    pub data_collection: Vec<String>,
    pub data_usage: Vec<String>,
    pub data_sharing: Vec<String>,
    pub user_rights: Vec<String>,
    pub security: Vec<String>,
    pub cookies: Vec<String>,
    pub children: Vec<String>,
    pub contact: Vec<String>,
}

impl PolicySections {
    fn bucket(&mut self, section: PolicySection) -> &mut Vec<String> {
        match section {
            PolicySection::DataCollection => &mut self.data_collection,
            PolicySection::DataUsage => &mut self.data_usage,
            PolicySection::DataSharing => &mut self.data_sharing,
            PolicySection::UserRights => &mut self.user_rights,
            PolicySection::Security => &mut self.security,
            PolicySection::Cookies => &mut self.cookies,
            PolicySection::Children => &mut self.children,
            PolicySection::Contact => &mut self.contact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadabilityGrade {
    Easy,
    Moderate,
    Difficult,
    #[serde(rename = "Very Difficult")]
    VeryDifficult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readability {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_words_per_sentence: usize,
    pub readability_grade: ReadabilityGrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VagueInstance {
    pub sentence: String,
    pub vague_terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyInsights {
    pub sections: PolicySections,
    pub concerns: Vec<String>,
    pub readability: Readability,
    pub vague_language: Vec<VagueInstance>,
    pub missing_elements: Vec<String>,
}

/// Assign each non-blank line to the most recent section whose keyword it
/// contains. Lines before the first header are dropped.
pub fn extract_sections(policy_text: &str) -> PolicySections {
    let mut sections = PolicySections::default();
    let mut current: Option<PolicySection> = None;

    for line in policy_text.lines() {
        let lower = line.to_lowercase();
        if let Some((section, _)) = SECTION_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        {
            current = Some(*section);
        }

        let trimmed = line.trim();
        if let (Some(section), false) = (current, trimmed.is_empty()) {
            sections.bucket(section).push(trimmed.to_string());
        }
    }
    sections
}

pub fn extract_concerns(policy_text: &str) -> Vec<String> {
    CONCERN_RES
        .iter()
        .filter(|(re, _)| re.is_match(policy_text))
        .map(|(_, concern)| concern.to_string())
        .collect()
}

pub fn assess_readability(policy_text: &str) -> Readability {
    let word_count = count_words(policy_text);
    let sentence_count = split_sentences(policy_text).len().max(1);
    let avg = word_count as f64 / sentence_count as f64;

    let readability_grade = if avg < 15.0 {
        ReadabilityGrade::Easy
    } else if avg < 20.0 {
        ReadabilityGrade::Moderate
    } else if avg < 25.0 {
        ReadabilityGrade::Difficult
    } else {
        ReadabilityGrade::VeryDifficult
    };

    Readability {
        word_count,
        sentence_count,
        avg_words_per_sentence: avg.round() as usize,
        readability_grade,
    }
}

/// Sentences with two or more hedging terms.
pub fn detect_vague_language(policy_text: &str) -> Vec<VagueInstance> {
    split_sentences(policy_text)
        .into_iter()
        .filter_map(|sentence| {
            let terms: Vec<String> = VAGUE_RES
                .iter()
                .filter(|(re, _)| re.is_match(&sentence))
                .map(|(_, t)| t.to_string())
                .collect();
            (terms.len() >= 2).then(|| VagueInstance {
                sentence: excerpt(&sentence),
                vague_terms: terms,
            })
        })
        .collect()
}

/// Elements none of whose words occur in the policy.
pub fn find_missing_elements(policy_text: &str, elements: &[&str]) -> Vec<String> {
    let lower = policy_text.to_lowercase();
    elements
        .iter()
        .filter(|element| {
            !element
                .to_lowercase()
                .split_whitespace()
                .any(|word| lower.contains(word))
        })
        .map(|e| e.to_string())
        .collect()
}

/// All insights for a raw (un-normalized) policy text.
pub fn analyze_policy(policy_text: &str) -> PolicyInsights {
    PolicyInsights {
        sections: extract_sections(policy_text),
        concerns: extract_concerns(policy_text),
        readability: assess_readability(policy_text),
        vague_language: detect_vague_language(policy_text),
        missing_elements: find_missing_elements(policy_text, &MANDATORY_ELEMENTS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_follow_headers() {
        let text = "Welcome\nInformation We Collect\nEmail and name.\n\nSecurity\nWe encrypt data.";
        let sections = extract_sections(text);
        assert_eq!(sections.data_collection, vec!["Information We Collect", "Email and name."]);
        assert_eq!(sections.security, vec!["Security", "We encrypt data."]);
        assert!(sections.contact.is_empty());
    }

    #[test]
    fn test_concerns() {
        let concerns = extract_concerns("We may sell your personal information for advertising.");
        assert_eq!(concerns, vec!["May sell personal information", "Uses data for marketing"]);
    }

    #[test]
    fn test_readability_grades() {
        let easy = assess_readability("We keep data safe. You can ask us.");
        assert_eq!(easy.readability_grade, ReadabilityGrade::Easy);
        assert_eq!(easy.sentence_count, 2);

        let long = format!("{}.", "word ".repeat(30));
        assert_eq!(assess_readability(&long).readability_grade, ReadabilityGrade::VeryDifficult);
    }

    #[test]
    fn test_vague_language_needs_two_terms() {
        let found = detect_vague_language("We may share some data. We share data.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vague_terms, vec!["may", "some"]);
        assert!(found[0].sentence.chars().count() <= 100);
    }

    #[test]
    fn test_missing_elements() {
        let missing = find_missing_elements("Contact us about cookies.", &MANDATORY_ELEMENTS);
        assert!(!missing.contains(&"contact information".to_string()));
        assert!(missing.contains(&"effective date".to_string()));
    }
}
