//! K-Means clustering in the standardized feature space.
//!
//! Model:
//! - k-means++ seeding from a fixed-seed RNG (reproducible runs);
//! - Lloyd iterations (assign to nearest centroid, recompute means) until no
//!   record changes cluster or `max_iterations` is reached;
//! - silhouette score over all records as the quality measure.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use medstock_core::{AnalyticsError, AnalyticsResult, Entity, InventoryRecord, ItemId};

use crate::analysis::Analysis;
use crate::features::{FEATURE_COUNT, FeatureRow, euclidean, extract_features, squared_euclidean};

/// Cluster assignment for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResult {
    pub item_id: ItemId,
    pub item_name: String,
    /// 0-based cluster index, always `< k`.
    pub cluster: usize,
    /// Euclidean distance to the assigned centroid (standardized space).
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringSummary {
    pub k: usize,
    /// Mean silhouette coefficient in \[-1, 1\].
    pub silhouette_score: f64,
    pub iterations: usize,
    /// `false` when the iteration cap stopped the run.
    pub converged: bool,
    /// Members per cluster; empty clusters report 0.
    pub cluster_sizes: Vec<usize>,
    /// Sum of squared distances to assigned centroids.
    pub inertia: f64,
    /// Final centroids in standardized space.
    pub centroids: Vec<FeatureRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringOutcome {
    pub results: Vec<ClusterResult>,
    pub summary: ClusteringSummary,
}

/// K-Means configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    seed: u64,
}

impl KMeans {
    pub const MIN_K: usize = 2;
    pub const MAX_K: usize = 10;
    pub const MIN_RECORDS: usize = 3;
    pub const DEFAULT_MAX_ITERATIONS: usize = 100;
    pub const DEFAULT_SEED: u64 = 42;

    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            seed: Self::DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn validate(&self, n: usize) -> AnalyticsResult<()> {
        if !self.has_valid_k() {
            return Err(AnalyticsError::invalid_parameter(format!(
                "k must be between {} and {} (got {})",
                Self::MIN_K,
                Self::MAX_K,
                self.k
            )));
        }
        if self.max_iterations == 0 {
            return Err(AnalyticsError::invalid_parameter(
                "max_iterations must be >= 1",
            ));
        }
        if n < Self::MIN_RECORDS {
            return Err(AnalyticsError::invalid_parameter(format!(
                "clustering needs at least {} records (got {n})",
                Self::MIN_RECORDS
            )));
        }
        if self.k > n - 1 {
            return Err(AnalyticsError::invalid_parameter(format!(
                "k must be at most n - 1 = {} for a batch of {n} (got {})",
                n - 1,
                self.k
            )));
        }
        Ok(())
    }

    /// Whether `k` itself is within 2..=10, independent of any batch.
    pub fn has_valid_k(&self) -> bool {
        (Self::MIN_K..=Self::MAX_K).contains(&self.k)
    }

    /// Smallest batch this configuration can cluster: `max(3, k + 1)`.
    pub fn min_records(&self) -> usize {
        Self::MIN_RECORDS.max(self.k + 1)
    }

    /// Partition `records` into `k` clusters.
    pub fn fit(&self, records: &[InventoryRecord]) -> AnalyticsResult<ClusteringOutcome> {
        self.validate(records.len())?;

        let matrix = extract_features(records);
        let points = matrix.rows();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = seed_centroids(points, self.k, &mut rng);

        let mut assignments = vec![usize::MAX; points.len()];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;

            let mut changed = false;
            for (i, p) in points.iter().enumerate() {
                let (nearest, _) = nearest_centroid(p, &centroids);
                if assignments[i] != nearest {
                    assignments[i] = nearest;
                    changed = true;
                }
            }

            if !changed {
                converged = true;
                break;
            }

            recompute_centroids(points, &assignments, &mut centroids);
        }

        if !converged {
            warn!(
                k = self.k,
                iterations, "k-means stopped at the iteration cap before converging"
            );
        }

        let mut cluster_sizes = vec![0usize; self.k];
        let mut inertia = 0.0;
        let results: Vec<ClusterResult> = records
            .iter()
            .zip(points.iter())
            .zip(assignments.iter())
            .map(|((record, p), &cluster)| {
                cluster_sizes[cluster] += 1;
                let d2 = squared_euclidean(p, &centroids[cluster]);
                inertia += d2;
                ClusterResult {
                    item_id: record.id().clone(),
                    item_name: record.name().to_string(),
                    cluster,
                    distance: d2.sqrt(),
                }
            })
            .collect();

        let silhouette_score = silhouette(points, &assignments, self.k);

        debug!(
            records = records.len(),
            k = self.k,
            iterations,
            converged,
            silhouette_score,
            "k-means fit complete"
        );

        Ok(ClusteringOutcome {
            results,
            summary: ClusteringSummary {
                k: self.k,
                silhouette_score,
                iterations,
                converged,
                cluster_sizes,
                inertia,
                centroids,
            },
        })
    }
}

/// Fit `k` clusters with the default seed and iteration cap.
pub fn fit(records: &[InventoryRecord], k: usize) -> AnalyticsResult<ClusteringOutcome> {
    KMeans::new(k).fit(records)
}

impl Analysis for KMeans {
    type Output = ClusteringOutcome;

    fn name(&self) -> &'static str {
        "clustering"
    }

    fn run(&self, records: &[InventoryRecord]) -> AnalyticsResult<ClusteringOutcome> {
        self.fit(records)
    }
}

/// k-means++: first centroid uniform, the rest with probability proportional
/// to the squared distance from the nearest chosen centroid.
fn seed_centroids(points: &[FeatureRow], k: usize, rng: &mut StdRng) -> Vec<FeatureRow> {
    let mut centroids: Vec<FeatureRow> = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| {
                let (_, d) = nearest_centroid(p, &centroids);
                d * d
            })
            .collect();

        // All weights are zero when every point already sits on a centroid
        // (duplicated records); fall back to a uniform pick.
        let next = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..points.len()),
        };
        centroids.push(points[next]);
    }

    centroids
}

/// Index of and distance to the nearest centroid; ties go to the lowest index.
fn nearest_centroid(point: &FeatureRow, centroids: &[FeatureRow]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (j, c) in centroids.iter().enumerate() {
        let d = euclidean(point, c);
        if d < best.1 {
            best = (j, d);
        }
    }
    best
}

/// Move each centroid to the mean of its members; empty clusters stay put.
fn recompute_centroids(points: &[FeatureRow], assignments: &[usize], centroids: &mut [FeatureRow]) {
    let mut sums = vec![[0.0; FEATURE_COUNT]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (p, &c) in points.iter().zip(assignments.iter()) {
        counts[c] += 1;
        for (s, x) in sums[c].iter_mut().zip(p.iter()) {
            *s += x;
        }
    }

    for (j, centroid) in centroids.iter_mut().enumerate() {
        if counts[j] == 0 {
            continue;
        }
        let n = counts[j] as f64;
        *centroid = sums[j].map(|s| s / n);
    }
}

/// Mean silhouette over all records.
///
/// Members of singleton clusters score 0, as does every record when only one
/// cluster is non-empty.
fn silhouette(points: &[FeatureRow], assignments: &[usize], k: usize) -> f64 {
    let n = points.len();
    if n == 0 {
        return 0.0;
    }

    let mut sizes = vec![0usize; k];
    for &c in assignments {
        sizes[c] += 1;
    }

    let mut total = 0.0;
    for i in 0..n {
        let own = assignments[i];
        if sizes[own] <= 1 {
            continue;
        }

        let mut dist_sums = vec![0.0; k];
        for j in 0..n {
            if i != j {
                dist_sums[assignments[j]] += euclidean(&points[i], &points[j]);
            }
        }

        let a = dist_sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| dist_sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        if !b.is_finite() {
            continue;
        }
        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    total / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Two well-separated groups: cheap high-volume consumables and
    /// expensive low-volume items.
    fn two_groups() -> Vec<InventoryRecord> {
        let mut records = Vec::new();
        for i in 0..6 {
            records.push(InventoryRecord::new(
                format!("cons-{i}"),
                format!("Luva {i}"),
                1000.0 + 10.0 * i as f64,
                0.5 + 0.01 * i as f64,
            ));
        }
        for i in 0..6 {
            records.push(InventoryRecord::new(
                format!("imp-{i}"),
                format!("Stent {i}"),
                2.0 + i as f64 * 0.1,
                9000.0 + 50.0 * i as f64,
            ));
        }
        records
    }

    fn labels(outcome: &ClusteringOutcome) -> Vec<usize> {
        outcome.results.iter().map(|r| r.cluster).collect()
    }

    fn same_partition(a: &[usize], b: &[usize]) -> bool {
        (0..a.len()).all(|i| (0..a.len()).all(|j| (a[i] == a[j]) == (b[i] == b[j])))
    }

    #[test]
    fn separates_obvious_groups() {
        let outcome = KMeans::new(2).fit(&two_groups()).unwrap();
        let l = labels(&outcome);

        assert!(l[..6].iter().all(|&c| c == l[0]));
        assert!(l[6..].iter().all(|&c| c == l[6]));
        assert_ne!(l[0], l[6]);
        assert!(outcome.summary.converged);
        assert_eq!(outcome.summary.cluster_sizes.iter().sum::<usize>(), 12);
        assert!(outcome.summary.silhouette_score > 0.8);
    }

    #[test]
    fn results_follow_input_order() {
        let records = two_groups();
        let outcome = KMeans::new(3).fit(&records).unwrap();
        for (r, c) in records.iter().zip(outcome.results.iter()) {
            assert_eq!(r.id(), &c.item_id);
            assert_eq!(r.name(), c.item_name);
            assert!(c.distance >= 0.0);
        }
    }

    #[test]
    fn same_seed_same_result() {
        let records = two_groups();
        assert_eq!(fit(&records, 4).unwrap(), KMeans::new(4).fit(&records).unwrap());
        let a = KMeans::new(4).with_seed(7).fit(&records).unwrap();
        let b = KMeans::new(4).with_seed(7).fit(&records).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn uniform_price_rescale_keeps_partition() {
        let records = two_groups();
        let exact: Vec<InventoryRecord> = records.iter().map(|r| r.repriced(r.unit_price() * 8.0)).collect();
        let loose: Vec<InventoryRecord> = records.iter().map(|r| r.repriced(r.unit_price() * 3.7)).collect();

        let base = KMeans::new(2).fit(&records).unwrap();
        assert_eq!(labels(&base), labels(&KMeans::new(2).fit(&exact).unwrap()));
        assert!(same_partition(&labels(&base), &labels(&KMeans::new(2).fit(&loose).unwrap())));
    }

    #[test]
    fn iteration_cap_reports_state_instead_of_failing() {
        let outcome = KMeans::new(3).with_max_iterations(1).fit(&two_groups()).unwrap();
        assert_eq!(outcome.summary.iterations, 1);
        assert!(!outcome.summary.converged);
        assert_eq!(outcome.results.len(), 12);
    }

    #[test]
    fn identical_records_do_not_break_seeding() {
        let records: Vec<InventoryRecord> = (0..5)
            .map(|i| InventoryRecord::new(format!("dup-{i}"), "Soro", 10.0, 3.0))
            .collect();
        let outcome = KMeans::new(2).fit(&records).unwrap();
        assert!(outcome.results.iter().all(|r| r.distance == 0.0));
        assert_eq!(outcome.summary.silhouette_score, 0.0);
    }

    #[test]
    fn rejects_bad_k_and_small_batches() {
        let records = two_groups();
        for k in [0, 1, 11] {
            let err = KMeans::new(k).fit(&records).unwrap_err();
            assert!(matches!(err, AnalyticsError::InvalidParameter(_)), "k={k}");
        }

        let err = KMeans::new(2).fit(&records[..2]).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidParameter(_)));
        assert_eq!(KMeans::new(2).min_records(), 3);

        // k = n is not allowed: a batch of 3 supports at most k = 2.
        let err = fit(&records[..3], 3).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidParameter(_)));
        assert_eq!(KMeans::new(3).min_records(), 4);
        assert!(fit(&records[..3], 2).is_ok());

        let err = KMeans::new(2).with_max_iterations(0).fit(&records).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidParameter(_)));
    }

    #[test]
    fn silhouette_singletons_score_zero() {
        let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [10.0, 0.0, 0.0]];
        // Cluster 0 = {0, 1}, cluster 1 = {2} (singleton), cluster 2 empty.
        let s = silhouette(&points, &[0, 0, 1], 3);
        // Point 0: a = 1, b = 10; point 1: a = 1, b = 9; point 2 contributes 0.
        let expected = ((10.0 - 1.0) / 10.0 + (9.0 - 1.0) / 9.0) / 3.0;
        assert!((s - expected).abs() < 1e-12);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Cluster indices stay below k and the silhouette stays in range.
        #[test]
        fn cluster_indices_stay_below_k(
            items in prop::collection::vec((0.0f64..5_000.0, 0.0f64..500.0), 3..40),
            k in 2usize..=10,
            seed in any::<u64>(),
        ) {
            prop_assume!(k < items.len());
            let records: Vec<InventoryRecord> = items
                .iter()
                .enumerate()
                .map(|(i, (q, p))| InventoryRecord::new(format!("R{i}"), "item", *q, *p))
                .collect();

            let outcome = KMeans::new(k).with_seed(seed).fit(&records).unwrap();
            prop_assert_eq!(outcome.results.len(), records.len());
            prop_assert!(outcome.results.iter().all(|r| r.cluster < k));
            prop_assert!((-1.0..=1.0).contains(&outcome.summary.silhouette_score));
            prop_assert!(outcome.summary.iterations <= KMeans::DEFAULT_MAX_ITERATIONS);
        }
    }
}
