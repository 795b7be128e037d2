use crate::metrics::{MetricType, MetricsCollector};
use casemodel_core::{ReactionHook, ReactionOutput, StepTrigger};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info_span, warn};

/// Counter of executed reactions, labeled by step and outcome
pub const REACTIONS_TOTAL: &str = "casemodel_reactions_total";

/// Histogram of reaction durations in milliseconds, labeled by step
pub const REACTION_DURATION_MS: &str = "casemodel_reaction_duration_ms";

/// Reaction hook that runs every reaction inside a span, logs its outcome
/// and optionally records metrics.
///
/// Install it with `ModelRunner::set_reaction_hook` or the runner builder.
pub struct TracedReaction {
    service_name: String,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

impl TracedReaction {
    /// Trace reactions of `service_name`
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            metrics: None,
        }
    }

    /// Also record metrics into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn record(&self, step: &str, outcome: &str, elapsed_ms: f64) {
        let metrics = match &self.metrics {
            Some(metrics) => metrics,
            None => return,
        };
        let mut labels = HashMap::new();
        labels.insert("service".to_string(), self.service_name.clone());
        labels.insert("step".to_string(), step.to_string());

        metrics.record_metric(REACTION_DURATION_MS, elapsed_ms, MetricType::Histogram, labels.clone());
        labels.insert("outcome".to_string(), outcome.to_string());
        metrics.record_metric(REACTIONS_TOTAL, 1.0, MetricType::Counter, labels);
    }
}

impl ReactionHook for TracedReaction {
    fn around(&self, trigger: StepTrigger<'_>) -> ReactionOutput {
        let step = trigger.step().name().to_string();
        let message_type = trigger.message().message_type();
        let span = info_span!(
            "reaction",
            service = %self.service_name,
            step = %step,
            message_type = %message_type
        );
        let _entered = span.enter();

        let started = Instant::now();
        let output = trigger.trigger();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let outcome = match &output {
            Ok(Some(published)) => {
                debug!(elapsed_ms, published = %published.message_type(), "Reaction published");
                "published"
            }
            Ok(None) => {
                debug!(elapsed_ms, "Reaction completed");
                "completed"
            }
            Err(failure) => {
                warn!(elapsed_ms, %failure, "Reaction failed");
                "failed"
            }
        };
        self.record(&step, outcome, elapsed_ms);
        output
    }
}

impl std::fmt::Debug for TracedReaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracedReaction")
            .field("service_name", &self.service_name)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
