//! Standardized feature matrix shared by clustering and anomaly detection.
//!
//! Each record becomes `[quantity, unit_price, total_value]`, then every
//! column is z-scored with its population mean/std-dev. Without this,
//! `total_value` (orders of magnitude larger) would dominate every distance.
//! Zero-variance columns become all-zero.

use serde::{Deserialize, Serialize};

use medstock_core::InventoryRecord;

pub const FEATURE_COUNT: usize = 3;

/// Feature columns, in matrix order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    Quantity,
    UnitPrice,
    TotalValue,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [Feature::Quantity, Feature::UnitPrice, Feature::TotalValue];

    pub fn index(&self) -> usize {
        match self {
            Feature::Quantity => 0,
            Feature::UnitPrice => 1,
            Feature::TotalValue => 2,
        }
    }

    pub fn raw(&self, record: &InventoryRecord) -> f64 {
        match self {
            Feature::Quantity => record.quantity(),
            Feature::UnitPrice => record.unit_price(),
            Feature::TotalValue => record.total_value(),
        }
    }

    /// Dashboard label (pt-BR), used in anomaly reasons.
    pub fn label(&self) -> &'static str {
        match self {
            Feature::Quantity => "quantidade",
            Feature::UnitPrice => "preço unitário",
            Feature::TotalValue => "valor total",
        }
    }
}

pub type FeatureRow = [f64; FEATURE_COUNT];

/// Column-standardized features, one row per record in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<FeatureRow>,
    means: FeatureRow,
    std_devs: FeatureRow,
}

impl FeatureMatrix {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &FeatureRow {
        &self.rows[i]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw-unit column means.
    pub fn means(&self) -> &FeatureRow {
        &self.means
    }

    /// Raw-unit column population std-devs (0 for constant columns).
    pub fn std_devs(&self) -> &FeatureRow {
        &self.std_devs
    }

    /// z-score of `feature` for row `i`.
    pub fn z(&self, i: usize, feature: Feature) -> f64 {
        self.rows[i][feature.index()]
    }
}

/// Extract and standardize features for a batch.
pub fn extract_features(records: &[InventoryRecord]) -> FeatureMatrix {
    let raw: Vec<FeatureRow> = records
        .iter()
        .map(|r| Feature::ALL.map(|f| f.raw(r)))
        .collect();

    let n = raw.len() as f64;
    let mut means = [0.0; FEATURE_COUNT];
    let mut std_devs = [0.0; FEATURE_COUNT];

    if !raw.is_empty() {
        for col in 0..FEATURE_COUNT {
            let mean = raw.iter().map(|row| row[col]).sum::<f64>() / n;
            let variance = raw
                .iter()
                .map(|row| {
                    let d = row[col] - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            means[col] = mean;
            std_devs[col] = variance.sqrt();
        }
    }

    let rows = raw
        .iter()
        .map(|row| {
            let mut z = [0.0; FEATURE_COUNT];
            for col in 0..FEATURE_COUNT {
                if std_devs[col] > 0.0 {
                    z[col] = (row[col] - means[col]) / std_devs[col];
                }
            }
            z
        })
        .collect();

    FeatureMatrix {
        rows,
        means,
        std_devs,
    }
}

/// Euclidean distance between two standardized rows.
pub fn euclidean(a: &FeatureRow, b: &FeatureRow) -> f64 {
    squared_euclidean(a, b).sqrt()
}

pub fn squared_euclidean(a: &FeatureRow, b: &FeatureRow) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
