//! Composition of the analyses into one dashboard report.
//!
//! Classification runs first and fails fast. Statistics, clustering and
//! anomaly detection then read the classified batch; they are independent
//! and may run on scoped threads.

use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use medstock_core::{AbcConfiguration, AnalyticsError, AnalyticsResult, InventoryRecord};

use crate::abc::{self, AbcSummary};
use crate::analysis::Analysis;
use crate::anomaly::{AnomalyDetector, AnomalyResult};
use crate::clustering::{ClusteringOutcome, KMeans};
use crate::statistics::{DescriptiveStats, StatisticsEngine};

/// An optional analysis that did not run because the batch was too small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAnalysis {
    pub analysis: String,
    pub reason: String,
}

/// Composite output of one orchestrated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    /// Classified records, value-descending.
    pub records: Vec<InventoryRecord>,
    pub abc_summary: AbcSummary,
    /// All-zero when the batch is empty.
    pub stats: DescriptiveStats,
    pub clusters: Option<ClusteringOutcome>,
    pub anomalies: Option<Vec<AnomalyResult>>,
    pub skipped: Vec<SkippedAnalysis>,
}

impl AnalyticsReport {
    pub fn anomaly_count(&self) -> usize {
        self.anomalies
            .as_ref()
            .map_or(0, |a| a.iter().filter(|r| r.is_anomaly).count())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsOrchestrator {
    abc: AbcConfiguration,
    statistics: StatisticsEngine,
    clustering: Option<KMeans>,
    anomaly: Option<AnomalyDetector>,
    parallel: bool,
}

impl AnalyticsOrchestrator {
    pub const DEFAULT_CLUSTERS: usize = 3;

    pub fn new(abc: AbcConfiguration) -> Self {
        Self {
            abc,
            statistics: StatisticsEngine::default(),
            clustering: Some(KMeans::new(Self::DEFAULT_CLUSTERS)),
            anomaly: Some(AnomalyDetector::default()),
            parallel: true,
        }
    }

    pub fn with_statistics(mut self, statistics: StatisticsEngine) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_clustering(mut self, clustering: Option<KMeans>) -> Self {
        self.clustering = clustering;
        self
    }

    pub fn with_anomaly_detection(mut self, detector: Option<AnomalyDetector>) -> Self {
        self.anomaly = detector;
        self
    }

    /// Run the post-classification analyses concurrently (default `true`).
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn abc_configuration(&self) -> &AbcConfiguration {
        &self.abc
    }

    pub fn run(&self, records: &[InventoryRecord]) -> AnalyticsResult<AnalyticsReport> {
        let classified = abc::classify(records, &self.abc)?;
        let abc_summary = abc::summarize(&classified);

        let (stats, clusters, anomalies) = if self.parallel {
            thread::scope(|s| {
                let stats = s.spawn(|| run_analysis(&self.statistics, &classified));
                let clusters = s.spawn(|| self.cluster(&classified));
                let anomalies = s.spawn(|| self.anomaly.as_ref().map(|d| run_analysis(d, &classified)));
                (join(stats), join(clusters), join(anomalies))
            })
        } else {
            (
                run_analysis(&self.statistics, &classified),
                self.cluster(&classified),
                self.anomaly.as_ref().map(|d| run_analysis(d, &classified)),
            )
        };

        let mut skipped = Vec::new();
        let stats = settle(self.statistics.name(), Some(stats), &mut skipped)?
            .unwrap_or_else(DescriptiveStats::zeroed);
        let clusters = settle("clustering", clusters, &mut skipped)?;
        let anomalies = settle("anomaly detection", anomalies, &mut skipped)?;

        let report = AnalyticsReport {
            records: classified,
            abc_summary,
            stats,
            clusters,
            anomalies,
            skipped,
        };

        info!(
            records = report.records.len(),
            anomalies = report.anomaly_count(),
            skipped = report.skipped.len(),
            parallel = self.parallel,
            "analytics run complete"
        );

        Ok(report)
    }
}

impl AnalyticsOrchestrator {
    /// Clustering pass; a batch below `max(3, k + 1)` is reported as too small
    /// so the run can skip clustering instead of failing. An out-of-range `k`
    /// still reaches `fit` and fails the run.
    fn cluster(&self, records: &[InventoryRecord]) -> Option<AnalyticsResult<ClusteringOutcome>> {
        let kmeans = self.clustering.as_ref()?;
        if kmeans.has_valid_k() && records.len() < kmeans.min_records() {
            return Some(Err(AnalyticsError::insufficient_data(
                "clustering",
                kmeans.min_records(),
                records.len(),
            )));
        }
        Some(run_analysis(kmeans, records))
    }
}

impl Default for AnalyticsOrchestrator {
    fn default() -> Self {
        Self::new(AbcConfiguration::default())
    }
}

fn run_analysis<A: Analysis>(analysis: &A, records: &[InventoryRecord]) -> AnalyticsResult<A::Output> {
    let span = info_span!("analysis", analysis = analysis.name(), records = records.len());
    let _enter = span.enter();
    analysis.run(records)
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

/// Turn a recoverable failure into a skip; anything else aborts the run.
fn settle<T>(
    analysis: &str,
    outcome: Option<AnalyticsResult<T>>,
    skipped: &mut Vec<SkippedAnalysis>,
) -> AnalyticsResult<Option<T>> {
    match outcome {
        None => Ok(None),
        Some(Ok(value)) => Ok(Some(value)),
        Some(Err(err)) if err.is_recoverable() => {
            warn!(analysis, error = %err, "analysis skipped");
            skipped.push(SkippedAnalysis {
                analysis: analysis.to_string(),
                reason: err.to_string(),
            });
            Ok(None)
        }
        Some(Err(err)) => Err(err),
    }
}
