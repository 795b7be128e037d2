//! Metrics collection interface and an in-memory collector.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Type of metric for collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// Counter metrics accumulate values
    Counter,
    /// Gauge metrics record current values
    Gauge,
    /// Histogram metrics observe distributions
    Histogram,
}

/// Interface for collecting metrics
pub trait MetricsCollector: Send + Sync {
    /// Record a metric with the given name, value, type, and labels
    fn record_metric(
        &self,
        name: &str,
        value: f64,
        metric_type: MetricType,
        labels: HashMap<String, String>,
    );
}

/// One recorded observation
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Metric name
    pub name: String,
    /// Observed value
    pub value: f64,
    /// Metric type
    pub metric_type: MetricType,
    /// Labels
    pub labels: HashMap<String, String>,
}

/// Collector that keeps every sample in memory
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    samples: Mutex<Vec<MetricSample>>,
}

impl InMemoryMetrics {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// All samples so far
    pub fn samples(&self) -> Vec<MetricSample> {
        self.samples.lock().clone()
    }

    /// Sum of all counter samples named `name` whose labels include `label`
    pub fn counter_total(&self, name: &str, label: (&str, &str)) -> f64 {
        self.samples
            .lock()
            .iter()
            .filter(|s| s.metric_type == MetricType::Counter && s.name == name)
            .filter(|s| s.labels.get(label.0).map(String::as_str) == Some(label.1))
            .map(|s| s.value)
            .sum()
    }
}

impl MetricsCollector for InMemoryMetrics {
    fn record_metric(
        &self,
        name: &str,
        value: f64,
        metric_type: MetricType,
        labels: HashMap<String, String>,
    ) {
        self.samples.lock().push(MetricSample {
            name: name.to_string(),
            value,
            metric_type,
            labels,
        });
    }
}
