//! Environment-driven engine settings.
//!
//! | variable | default |
//! |----------|---------|
//! | `MEDSTOCK_ABC_CLASS_A` | 80 |
//! | `MEDSTOCK_ABC_CLASS_B` | 95 |
//! | `MEDSTOCK_CLUSTERS` | 3 (`0` disables clustering) |
//! | `MEDSTOCK_KMEANS_SEED` | 42 |
//! | `MEDSTOCK_KMEANS_MAX_ITERATIONS` | 100 |
//! | `MEDSTOCK_ANOMALY_SENSITIVITY` | 3 (`0`/`off` disables detection) |
//! | `MEDSTOCK_PARALLEL` | true |

use core::str::FromStr;

use medstock_core::{AbcConfiguration, AnalyticsError, AnalyticsResult};

use crate::anomaly::AnomalyDetector;
use crate::clustering::KMeans;
use crate::orchestrator::AnalyticsOrchestrator;

pub const ENV_CLASS_A: &str = "MEDSTOCK_ABC_CLASS_A";
pub const ENV_CLASS_B: &str = "MEDSTOCK_ABC_CLASS_B";
pub const ENV_CLUSTERS: &str = "MEDSTOCK_CLUSTERS";
pub const ENV_KMEANS_SEED: &str = "MEDSTOCK_KMEANS_SEED";
pub const ENV_KMEANS_MAX_ITERATIONS: &str = "MEDSTOCK_KMEANS_MAX_ITERATIONS";
pub const ENV_ANOMALY_SENSITIVITY: &str = "MEDSTOCK_ANOMALY_SENSITIVITY";
pub const ENV_PARALLEL: &str = "MEDSTOCK_PARALLEL";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSettings {
    pub abc: AbcConfiguration,
    /// `None` disables clustering.
    pub clusters: Option<usize>,
    pub kmeans_seed: u64,
    pub kmeans_max_iterations: usize,
    /// `None` disables anomaly detection.
    pub anomaly_sensitivity: Option<f64>,
    pub parallel: bool,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            abc: AbcConfiguration::default(),
            clusters: Some(AnalyticsOrchestrator::DEFAULT_CLUSTERS),
            kmeans_seed: KMeans::DEFAULT_SEED,
            kmeans_max_iterations: KMeans::DEFAULT_MAX_ITERATIONS,
            anomaly_sensitivity: Some(AnomalyDetector::DEFAULT_SENSITIVITY),
            parallel: true,
        }
    }
}

impl AnalyticsSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> AnalyticsResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> AnalyticsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let abc = AbcConfiguration {
            class_a_threshold: parse_or(&lookup, ENV_CLASS_A, defaults.abc.class_a_threshold)?,
            class_b_threshold: parse_or(&lookup, ENV_CLASS_B, defaults.abc.class_b_threshold)?,
        };
        abc.validate()?;

        let clusters = match parse_or(&lookup, ENV_CLUSTERS, AnalyticsOrchestrator::DEFAULT_CLUSTERS)? {
            0 => None,
            k => Some(k),
        };

        let anomaly_sensitivity = match lookup(ENV_ANOMALY_SENSITIVITY) {
            Some(raw) if raw.trim().eq_ignore_ascii_case("off") => None,
            Some(raw) => match parse::<f64>(ENV_ANOMALY_SENSITIVITY, &raw)? {
                s if s == 0.0 => None,
                s => Some(s),
            },
            None => defaults.anomaly_sensitivity,
        };

        let parallel = match lookup(ENV_PARALLEL) {
            Some(raw) => parse_bool(ENV_PARALLEL, &raw)?,
            None => defaults.parallel,
        };

        Ok(Self {
            abc,
            clusters,
            kmeans_seed: parse_or(&lookup, ENV_KMEANS_SEED, defaults.kmeans_seed)?,
            kmeans_max_iterations: parse_or(&lookup, ENV_KMEANS_MAX_ITERATIONS, defaults.kmeans_max_iterations)?,
            anomaly_sensitivity,
            parallel,
        })
    }

    /// Build the orchestrator these settings describe.
    pub fn orchestrator(&self) -> AnalyticsResult<AnalyticsOrchestrator> {
        let clustering = self.clusters.map(|k| {
            KMeans::new(k)
                .with_seed(self.kmeans_seed)
                .with_max_iterations(self.kmeans_max_iterations)
        });
        let anomaly = self.anomaly_sensitivity.map(AnomalyDetector::new).transpose()?;

        Ok(AnalyticsOrchestrator::new(self.abc)
            .with_clustering(clustering)
            .with_anomaly_detection(anomaly)
            .with_parallelism(self.parallel))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> AnalyticsResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> AnalyticsResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AnalyticsError::configuration(format!("{key}: cannot parse {raw:?}")))
}

fn parse_bool(key: &str, raw: &str) -> AnalyticsResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AnalyticsError::configuration(format!(
            "{key}: expected a boolean, got {raw:?}"
        ))),
    }
}
