// WatchDogs Core Services

pub mod cancel;
pub mod compliance;
pub mod config_store;
pub mod detection;
pub mod knowledge;
pub mod providers;
pub mod text_processor;

pub use cancel::{cancel_signal, CancelHandle, CancelSignal};
pub use config_store::*;
pub use providers::*;
pub use text_processor::*;

pub use compliance::{
    analyze_compliance,
    analyze_policy,
    analyze_with_requirements,
    load_requirements,
    summarize_policy,
    ComplianceError,
    PolicyInsights,
    PolicySummary,
    ScoringWeights,
};
pub use detection::{
    DarkPatternClassifier,
    DetectionCache,
    DetectionEngine,
    DetectionOptions,
    LlmClassifier,
};
pub use knowledge::{KnowledgeBase, KnowledgeBaseError};
