// Detection Pipeline
// Runs the keyword, semantic and external phases and aggregates them into a
// DetectionReport

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::models::{DetectionReport, TextFragment};
use crate::services::cancel::CancelSignal;
use crate::services::config_store::DetectionConfig;
use crate::services::knowledge::KnowledgeBase;

use super::aggregation::aggregate_candidates;
use super::cache::DetectionCache;
use super::llm_classifier::{run_external_phase, select_inputs, DarkPatternClassifier, ExternalPhaseResult};
use super::pattern_matcher::PatternMatcher;
use super::semantic::SemanticMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionOptions {
    pub max_fragment_chars: usize,
    pub semantic_max_chars: usize,
    pub external_min_chars: usize,
    pub external_max_chars: usize,
    pub batch_size: usize,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self::from(&DetectionConfig::default())
    }
}

impl From<&DetectionConfig> for DetectionOptions {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            max_fragment_chars: config.max_fragment_chars,
            semantic_max_chars: config.semantic_max_chars,
            external_min_chars: config.external_min_chars,
            external_max_chars: config.external_max_chars,
            batch_size: config.batch_size.max(1),
        }
    }
}

/// Long-lived detector. The cache is shared by every run on this engine.
#[derive(Clone)]
pub struct DetectionEngine {
    knowledge: Arc<KnowledgeBase>,
    cache: Arc<DetectionCache>,
    options: DetectionOptions,
}

impl DetectionEngine {
    pub fn new(knowledge: Arc<KnowledgeBase>, cache: Arc<DetectionCache>, options: DetectionOptions) -> Self {
        Self {
            knowledge,
            cache,
            options,
        }
    }

    pub fn from_config(knowledge: Arc<KnowledgeBase>, config: &DetectionConfig) -> Self {
        Self::new(
            knowledge,
            Arc::new(DetectionCache::new(config.cache_capacity)),
            DetectionOptions::from(config),
        )
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn cache(&self) -> &DetectionCache {
        &self.cache
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Keyword and semantic phases only. Never suspends.
    pub fn detect_local(&self, fragments: &[TextFragment]) -> DetectionReport {
        self.assemble(fragments, ExternalPhaseResult::default(), Instant::now())
    }

    /// Full run. The external phase is skipped when no classifier is given;
    /// cancellation yields a partial report flagged `cancelled`.
    pub async fn detect(
        &self,
        fragments: &[TextFragment],
        classifier: Option<&dyn DarkPatternClassifier>,
        cancel: &CancelSignal,
    ) -> DetectionReport {
        let start = Instant::now();

        let external = match classifier {
            Some(classifier) => {
                let inputs = select_inputs(
                    fragments,
                    self.options.external_min_chars,
                    self.options.external_max_chars,
                );
                info!(
                    "[detection] Sending {} of {} fragments to classifier in batches of {}",
                    inputs.len(),
                    fragments.len(),
                    self.options.batch_size
                );
                run_external_phase(
                    classifier,
                    &inputs,
                    fragments,
                    &self.knowledge,
                    self.options.batch_size,
                    cancel,
                )
                .await
            }
            None => ExternalPhaseResult::default(),
        };

        self.assemble(fragments, external, start)
    }

    fn assemble(&self, fragments: &[TextFragment], external: ExternalPhaseResult, start: Instant) -> DetectionReport {
        let keyword = PatternMatcher::new(&self.knowledge)
            .with_cache(&self.cache)
            .with_max_chars(self.options.max_fragment_chars)
            .run(fragments);
        let semantic = SemanticMatcher::new(&self.knowledge)
            .with_max_chars(self.options.semantic_max_chars)
            .run(fragments);

        let aggregated = aggregate_candidates(fragments, keyword, semantic, external.candidates);
        let report = DetectionReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            candidates: aggregated.candidates,
            methods: aggregated.methods,
            raw_methods: aggregated.raw_methods,
            fragments_analyzed: fragments.len(),
            external_batches: external.batches,
            failed_batches: external.failed_batches,
            cancelled: external.cancelled,
            elapsed_ms: start.elapsed().as_millis(),
        };

        info!(
            "[detection] Run {}: {} candidates (keyword={}, semantic={}, external={}), {} failed batches, {}ms",
            report.run_id,
            report.count(),
            report.methods.keyword,
            report.methods.semantic,
            report.methods.external,
            report.failed_batches,
            report.elapsed_ms
        );
        report
    }
}
