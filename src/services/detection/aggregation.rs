// Aggregation Logic
// Merges keyword, semantic and external candidates into one deduplicated list

use std::collections::HashMap;

use crate::models::{Candidate, DetectionMethod, MethodCounts, PatternType, TextFragment};

#[derive(Debug, Clone, Default)]
pub struct AggregatedCandidates {
    pub candidates: Vec<Candidate>,
    /// Winners per method.
    pub methods: MethodCounts,
    /// Inputs per method, before deduplication.
    pub raw_methods: MethodCounts,
}

struct Group {
    winner: Candidate,
    seen: Vec<DetectionMethod>,
}

/// Does `challenger` beat `current`? Higher confidence wins; ties go to the
/// more trusted method (keyword, then semantic, then external).
fn outranks(challenger: &Candidate, current: &Candidate) -> bool {
    if challenger.confidence != current.confidence {
        return challenger.confidence > current.confidence;
    }
    challenger.method.priority() < current.method.priority()
}

/// Deduplicate on `(fragment_id, pattern_type)`.
///
/// Keyword and semantic candidates are ordered by fragment position;
/// pairs reported only by the external classifier follow in the order it
/// returned them.
pub fn aggregate_candidates(
    fragments: &[TextFragment],
    keyword: Vec<Candidate>,
    semantic: Vec<Candidate>,
    external: Vec<Candidate>,
) -> AggregatedCandidates {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(fragments.len());
    for (idx, fragment) in fragments.iter().enumerate() {
        position.entry(fragment.id.as_str()).or_insert(idx);
    }

    let mut raw_methods = MethodCounts::default();
    for c in keyword.iter().chain(semantic.iter()).chain(external.iter()) {
        raw_methods.record(c.method);
    }

    let mut local: Vec<Candidate> = keyword.into_iter().chain(semantic).collect();
    local.sort_by_key(|c| {
        (
            position.get(c.fragment_id.as_str()).copied().unwrap_or(usize::MAX),
            c.method.priority(),
        )
    });

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<(String, PatternType), usize> = HashMap::new();

    for candidate in local.into_iter().chain(external) {
        let key = (candidate.fragment_id.clone(), candidate.pattern_type.clone());
        match index.get(&key) {
            Some(&slot) => {
                let group = &mut groups[slot];
                group.seen.push(candidate.method);
                if outranks(&candidate, &group.winner) {
                    group.winner = candidate;
                }
            }
            None => {
                index.insert(key, groups.len());
                groups.push(Group {
                    seen: vec![candidate.method],
                    winner: candidate,
                });
            }
        }
    }

    let mut methods = MethodCounts::default();
    let candidates = groups
        .into_iter()
        .map(|group| {
            let mut winner = group.winner;
            let mut others: Vec<DetectionMethod> = group
                .seen
                .into_iter()
                .filter(|m| *m != winner.method)
                .collect();
            others.sort_by_key(|m| m.priority());
            others.dedup();
            winner.corroborated_by = others;
            methods.record(winner.method);
            winner
        })
        .collect();

    AggregatedCandidates {
        candidates,
        methods,
        raw_methods,
    }
}
