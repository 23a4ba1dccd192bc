//! Descriptive statistics over a labeled numeric series.
//!
//! Conventions:
//! - variance/std-dev are **population** estimators (divide by `n`);
//! - quantiles use linear interpolation between order statistics (R-7,
//!   `PERCENTILE.INC`);
//! - skewness is `m3/σ³`, kurtosis is excess kurtosis `m4/σ⁴ − 3`; both are 0
//!   for a constant series;
//! - coefficient of variation is `σ/mean × 100`, 0 when the mean is 0.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use medstock_core::{AnalyticsError, AnalyticsResult, Entity, InventoryRecord, ItemId};

use crate::analysis::Analysis;

/// One observation: the value plus the record it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub id: ItemId,
    pub value: f64,
}

impl Sample {
    pub fn new(id: impl Into<ItemId>, value: f64) -> Self {
        Self { id: id.into(), value }
    }
}

/// Which record field a statistics run describes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordMetric {
    Quantity,
    UnitPrice,
    TotalValue,
}

impl RecordMetric {
    pub fn of(&self, record: &InventoryRecord) -> f64 {
        match self {
            RecordMetric::Quantity => record.quantity(),
            RecordMetric::UnitPrice => record.unit_price(),
            RecordMetric::TotalValue => record.total_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub iqr: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Percentiles {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

/// Records outside the 1.5×IQR fences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Outliers {
    pub lower: Vec<ItemId>,
    pub upper: Vec<ItemId>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Single most frequent value; `None` when nothing repeats or modes tie.
    pub mode: Option<f64>,
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub quartiles: Quartiles,
    pub percentiles: Percentiles,
    pub skewness: f64,
    pub kurtosis: f64,
    pub coefficient_of_variation: f64,
    pub outliers: Outliers,
}

impl DescriptiveStats {
    /// All-zero placeholder for dashboards showing an empty batch.
    pub fn zeroed() -> Self {
        Self::default()
    }
}

/// Describe a labeled series. Fails with `InsufficientData` when empty.
pub fn describe(samples: &[Sample]) -> AnalyticsResult<DescriptiveStats> {
    if samples.is_empty() {
        return Err(AnalyticsError::insufficient_data("descriptive statistics", 1, 0));
    }

    let n = samples.len() as f64;
    let mut sorted: Vec<f64> = samples.iter().map(|s| s.value).collect();
    sorted.sort_by(f64::total_cmp);

    let mean = sorted.iter().sum::<f64>() / n;
    let (m2, m3, m4) = sorted.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), x| {
        let d = x - mean;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    });
    let variance = m2 / n;
    let std_dev = variance.sqrt();

    let (skewness, kurtosis) = if std_dev > 0.0 {
        ((m3 / n) / std_dev.powi(3), (m4 / n) / variance.powi(2) - 3.0)
    } else {
        (0.0, 0.0)
    };

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    let q1 = percentile(&sorted, 25.0);
    let q2 = percentile(&sorted, 50.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;
    let lower: Vec<ItemId> = samples
        .iter()
        .filter(|s| s.value < lower_fence)
        .map(|s| s.id.clone())
        .collect();
    let upper: Vec<ItemId> = samples
        .iter()
        .filter(|s| s.value > upper_fence)
        .map(|s| s.id.clone())
        .collect();
    let outlier_count = lower.len() + upper.len();

    Ok(DescriptiveStats {
        count: samples.len(),
        mean,
        median: q2,
        mode: mode(&sorted),
        std_dev,
        variance,
        min,
        max,
        range: max - min,
        quartiles: Quartiles { q1, q2, q3, iqr },
        percentiles: Percentiles {
            p10: percentile(&sorted, 10.0),
            p25: q1,
            p50: q2,
            p75: q3,
            p90: percentile(&sorted, 90.0),
        },
        skewness,
        kurtosis,
        coefficient_of_variation: if mean != 0.0 { std_dev / mean * 100.0 } else { 0.0 },
        outliers: Outliers {
            lower,
            upper,
            count: outlier_count,
        },
    })
}

/// Describe one metric of a record batch, labeling samples by record id.
pub fn describe_records(
    records: &[InventoryRecord],
    metric: RecordMetric,
) -> AnalyticsResult<DescriptiveStats> {
    let samples: Vec<Sample> = records
        .iter()
        .map(|r| Sample::new(r.id().clone(), metric.of(r)))
        .collect();
    describe(&samples)
}

/// R-7 percentile (`p` in 0–100) of an ascending, non-empty slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let last = sorted.len() - 1;
    let h = last as f64 * (p / 100.0).clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(last);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn mode(sorted: &[f64]) -> Option<f64> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for v in sorted {
        // -0.0 and 0.0 are the same value.
        let key = if *v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
        *counts.entry(key).or_default() += 1;
    }

    let best = counts.values().copied().max()?;
    if best < 2 {
        return None;
    }
    let mut winners = counts.iter().filter(|(_, c)| **c == best);
    let (bits, _) = winners.next()?;
    if winners.next().is_some() {
        return None;
    }
    Some(f64::from_bits(*bits))
}

/// Statistics over one record metric, as an orchestrated analysis.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatisticsEngine {
    metric: RecordMetric,
}

impl StatisticsEngine {
    pub fn new(metric: RecordMetric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> RecordMetric {
        self.metric
    }
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new(RecordMetric::TotalValue)
    }
}

impl Analysis for StatisticsEngine {
    type Output = DescriptiveStats;

    fn name(&self) -> &'static str {
        "descriptive statistics"
    }

    fn run(&self, records: &[InventoryRecord]) -> AnalyticsResult<DescriptiveStats> {
        describe_records(records, self.metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(format!("S{i}"), *v))
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_series_is_insufficient_data() {
        let err = describe(&[]).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData { required: 1, actual: 0, .. }));
    }

    #[test]
    fn identical_values_have_no_spread() {
        let stats = describe(&samples(&[7.5; 6])).unwrap();
        assert_eq!(stats.mean, 7.5);
        assert_eq!(stats.median, 7.5);
        assert_eq!(stats.mode, Some(7.5));
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.skewness, 0.0);
        assert_eq!(stats.kurtosis, 0.0);
        assert_eq!(stats.outliers.count, 0);
    }

    #[test]
    fn single_value_is_described() {
        let stats = describe(&samples(&[42.0])).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.range, 0.0);
        assert_eq!(stats.mode, None);
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let stats = describe(&samples(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        assert!(close(stats.median, 2.5));
        assert!(close(stats.quartiles.q1, 1.75));
        assert!(close(stats.quartiles.q3, 3.25));
        assert!(close(stats.quartiles.iqr, 1.5));
        assert!(close(stats.percentiles.p10, 1.3));
        assert!(close(stats.percentiles.p90, 3.7));
    }

    #[test]
    fn population_moments() {
        // mean 5, population variance 4.
        let stats = describe(&samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])).unwrap();
        assert!(close(stats.mean, 5.0));
        assert!(close(stats.variance, 4.0));
        assert!(close(stats.std_dev, 2.0));
        assert!(close(stats.coefficient_of_variation, 40.0));
        assert_eq!(stats.mode, Some(4.0));
        // m3 = 42/8, m4 = 356/8
        assert!(close(stats.skewness, (42.0 / 8.0) / 8.0));
        assert!(close(stats.kurtosis, (356.0 / 8.0) / 16.0 - 3.0));
    }

    #[test]
    fn symmetric_series_has_zero_skew() {
        let stats = describe(&samples(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        assert!(close(stats.skewness, 0.0));
        assert!(stats.kurtosis < 0.0);
    }

    #[test]
    fn tied_modes_are_not_guessed() {
        let stats = describe(&samples(&[1.0, 1.0, 2.0, 2.0, 3.0])).unwrap();
        assert_eq!(stats.mode, None);
        let stats = describe(&samples(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(stats.mode, None);
    }

    #[test]
    fn outliers_are_reported_by_identity() {
        let mut s = samples(&[10.0, 11.0, 12.0, 13.0, 12.0, 11.0, 10.0, 12.0]);
        s.push(Sample::new("spike", 500.0));
        s.push(Sample::new("dip", -400.0));

        let stats = describe(&s).unwrap();
        assert_eq!(stats.outliers.upper, vec![ItemId::from("spike")]);
        assert_eq!(stats.outliers.lower, vec![ItemId::from("dip")]);
        assert_eq!(stats.outliers.count, 2);
    }

    #[test]
    fn describe_records_uses_selected_metric() {
        let records = vec![
            InventoryRecord::new("a", "A", 2.0, 10.0),
            InventoryRecord::new("b", "B", 4.0, 10.0),
        ];
        let qty = describe_records(&records, RecordMetric::Quantity).unwrap();
        let value = StatisticsEngine::default().run(&records).unwrap();
        assert!(close(qty.mean, 3.0));
        assert!(close(value.mean, 30.0));
    }

    #[test]
    fn percentile_extremes_are_min_and_max() {
        let sorted = [3.0, 8.0, 21.0];
        assert_eq!(percentile(&sorted, 0.0), 3.0);
        assert_eq!(percentile(&sorted, 100.0), 21.0);
    }

    #[test]
    fn quantiles_of_a_single_sample_collapse_to_it() {
        let stats = describe(&samples(&[4.0])).unwrap();
        assert_eq!(stats.quartiles.q1, 4.0);
        assert_eq!(stats.quartiles.q3, 4.0);
        assert_eq!(stats.percentiles.p90, 4.0);
        assert!(matches!(
            describe_records(&[], RecordMetric::UnitPrice),
            Err(AnalyticsError::InsufficientData { .. })
        ));
    }
}
