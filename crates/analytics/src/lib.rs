//! `medstock-analytics`
//!
//! **Responsibility:** the inventory analytics engine.
//!
//! - ABC classification by cumulative value share ([`abc`]);
//! - descriptive statistics ([`statistics`]);
//! - K-Means clustering ([`clustering`]) and z-score anomaly detection
//!   ([`anomaly`]) over a shared standardized feature matrix ([`features`]);
//! - the [`orchestrator`] composing them into one report.
//!
//! Everything here is synchronous and pure: no IO, no shared mutable state,
//! no caching. Callers own persistence and memoization.

pub mod abc;
pub mod analysis;
pub mod anomaly;
pub mod clustering;
pub mod features;
pub mod orchestrator;
pub mod settings;
pub mod statistics;

pub use abc::{AbcSummary, ClassSummary, classify, summarize};
pub use analysis::Analysis;
pub use anomaly::{AnomalyDetector, AnomalyResult, rank_anomalies};
pub use clustering::{ClusterResult, ClusteringOutcome, ClusteringSummary, KMeans};
pub use features::{Feature, FeatureMatrix, extract_features};
pub use orchestrator::{AnalyticsOrchestrator, AnalyticsReport, SkippedAnalysis};
pub use settings::AnalyticsSettings;
pub use statistics::{
    DescriptiveStats, Outliers, Percentiles, Quartiles, RecordMetric, Sample, StatisticsEngine, describe,
    describe_records,
};
