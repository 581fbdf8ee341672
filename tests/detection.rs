use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use watchdogs_lib::models::{DetectionMethod, PatternType, TextFragment};
use watchdogs_lib::services::config_store::DetectionConfig;
use watchdogs_lib::services::detection::{
    ClassifierError, ClassifierInput, ClassifierVerdict, DarkPatternClassifier, DetectionCache, DetectionEngine,
    PatternMatcher,
};
use watchdogs_lib::services::knowledge::KnowledgeBase;
use watchdogs_lib::services::{cancel_signal, CancelSignal};

fn engine() -> DetectionEngine {
    let kb = Arc::new(KnowledgeBase::builtin().unwrap());
    DetectionEngine::from_config(kb, &DetectionConfig::default())
}

struct HangingClassifier;

#[async_trait]
impl DarkPatternClassifier for HangingClassifier {
    async fn classify_batch(&self, _batch: &[ClassifierInput]) -> Result<Vec<ClassifierVerdict>, ClassifierError> {
        std::future::pending().await
    }
}

struct FailingClassifier;

#[async_trait]
impl DarkPatternClassifier for FailingClassifier {
    async fn classify_batch(&self, _batch: &[ClassifierInput]) -> Result<Vec<ClassifierVerdict>, ClassifierError> {
        Err(ClassifierError::Parse("garbage".to_string()))
    }
}

#[test]
fn test_low_stock_copy_is_urgency() {
    let kb = KnowledgeBase::builtin().unwrap();
    let candidate = PatternMatcher::new(&kb)
        .match_fragment(&TextFragment::new("p1", "Only 2 left in stock!"))
        .unwrap();

    assert_eq!(candidate.pattern_type, PatternType::Urgency);
    assert_eq!(candidate.method, DetectionMethod::Keyword);
    assert_eq!(candidate.confidence, 1.0);
    assert_eq!(candidate.fragment_id, "p1");
}

#[test]
fn test_first_rule_in_table_order_wins() {
    let kb = KnowledgeBase::builtin().unwrap();
    let fragment = TextFragment::new("p1", "Hurry! Accept all offers before the flash sale ends");
    let matcher = PatternMatcher::new(&kb);

    for _ in 0..3 {
        let candidate = matcher.match_fragment(&fragment).unwrap();
        assert_eq!(candidate.pattern_type, PatternType::Urgency);
    }
}

#[test]
fn test_prechecked_marketing_checkbox_is_sneaking() {
    let kb = KnowledgeBase::builtin().unwrap();
    let candidate = PatternMatcher::new(&kb)
        .match_fragment(&TextFragment::checkbox("c1", "Send me marketing emails", true))
        .unwrap();
    assert_eq!(candidate.pattern_type, PatternType::Sneaking);
    assert_eq!(candidate.rationale, "Pre-checked consent checkbox");
}

#[test]
fn test_cache_reuses_verdicts_without_changing_results() {
    let kb = KnowledgeBase::builtin().unwrap();
    let cache = DetectionCache::new(16);
    let matcher = PatternMatcher::new(&kb).with_cache(&cache);

    let first = matcher.match_fragment(&TextFragment::new("a", "Only 5 left!"));
    let second = matcher.match_fragment(&TextFragment::new("b", "Only 5 left!"));

    assert_eq!(first.unwrap().fragment_id, "a");
    assert_eq!(second.unwrap().fragment_id, "b");
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn test_report_has_one_candidate_per_fragment_and_type() {
    let engine = engine();
    let fragments = vec![
        TextFragment::new("p1", "Hurry, limited time only! Only 3 left"),
        TextFragment::control("b1", "Hurry"),
        TextFragment::control("b2", "No thanks, I don't want to save money"),
        TextFragment::new("p2", "About our company"),
    ];
    let report = engine.detect_local(&fragments);

    let mut seen = HashSet::new();
    for candidate in &report.candidates {
        assert!(seen.insert((candidate.fragment_id.clone(), candidate.pattern_type.clone())));
        assert!((0.0..=1.0).contains(&candidate.confidence));
    }
    assert!(report.candidates.iter().all(|c| c.fragment_id != "p2"));
    assert_eq!(report.fragments_analyzed, 4);
}

#[test]
fn test_detection_is_idempotent() {
    let engine = engine();
    let fragments = vec![
        TextFragment::new("p1", "Only 2 left in stock!"),
        TextFragment::new("p2", "Free shipping, plus tax and a handling fee"),
    ];
    let a = engine.detect_local(&fragments);
    let b = engine.detect_local(&fragments);
    assert_eq!(a.candidates, b.candidates);
    assert_eq!(a.methods, b.methods);
}

#[tokio::test]
async fn test_failed_batches_do_not_lose_local_results() {
    let engine = engine();
    let fragments = vec![TextFragment::new("p1", "Only 2 left in stock!")];
    let report = engine
        .detect(&fragments, Some(&FailingClassifier), &CancelSignal::never())
        .await;

    assert_eq!(report.count(), 1);
    assert_eq!(report.failed_batches, 1);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_cancellation_returns_partial_report() {
    let engine = engine();
    let fragments = vec![
        TextFragment::new("p1", "Only 2 left in stock!"),
        TextFragment::new("p2", "Prices shown per night for two guests"),
    ];
    let (handle, signal) = cancel_signal();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        engine.detect(&fragments, Some(&HangingClassifier), &signal),
    )
    .await
    .expect("cancellation should end the run");

    assert!(report.cancelled);
    assert_eq!(report.external_batches, 0);
    assert_eq!(report.candidates[0].fragment_id, "p1");
}
