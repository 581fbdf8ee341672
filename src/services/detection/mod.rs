// Detection Module
// Dark pattern detection organized into specialized submodules:
// - pattern_matcher: keyword/regex rules and the pre-checked checkbox rule
// - semantic: word-overlap similarity against examples and indicators
// - llm_classifier: batched external classifier adapter
// - aggregation: deduplication and method priority
// - cache: bounded LRU of pattern-matcher verdicts
// - pipeline: phase orchestration and cancellation

pub mod aggregation;
pub mod cache;
pub mod llm_classifier;
pub mod pattern_matcher;
pub mod pipeline;
pub mod semantic;

pub use aggregation::{aggregate_candidates, AggregatedCandidates};
pub use cache::{CacheStats, DetectionCache};
pub use llm_classifier::{
    BatchOutcome,
    ClassifierError,
    ClassifierInput,
    ClassifierVerdict,
    DarkPatternClassifier,
    LlmClassifier,
    PatternGuess,
};
pub use pattern_matcher::PatternMatcher;
pub use pipeline::{DetectionEngine, DetectionOptions};
pub use semantic::SemanticMatcher;
