use serde::{Deserialize, Serialize};
use tracing::debug;

use medstock_core::{
    AbcClass, AnalyticsError, AnalyticsResult, ClinicalCriticality, Entity, InventoryRecord, ItemId,
};

use crate::analysis::Analysis;
use crate::features::{Feature, extract_features};

/// Reason attached when the clinical/financial priority rule fires.
pub const CRITICAL_LOW_PRIORITY_REASON: &str =
    "criticidade clínica alta com classificação C (baixa prioridade financeira)";

/// Anomaly verdict for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyResult {
    pub item_id: ItemId,
    pub item_name: String,
    pub is_anomaly: bool,
    /// Max |z| across features; at least the sensitivity when the domain rule fires.
    pub anomaly_score: f64,
    /// Triggers in fixed order: quantity, unit price, total value, domain rule.
    pub reasons: Vec<String>,
}

/// Z-score anomaly detector over the standardized feature matrix.
///
/// Model:
/// - a feature triggers when its |z| exceeds `sensitivity`;
/// - independently, a record with clinical criticality `alta` and class `C`
///   is a business-risk anomaly (vital item, low financial attention).
///
/// The domain rule reads `classification`, so run ABC classification first.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnomalyDetector {
    sensitivity: f64,
}

impl AnomalyDetector {
    pub const DEFAULT_SENSITIVITY: f64 = 3.0;
    pub const MIN_RECORDS: usize = 3;

    pub fn new(sensitivity: f64) -> AnalyticsResult<Self> {
        if !(sensitivity.is_finite() && sensitivity > 0.0) {
            return Err(AnalyticsError::invalid_parameter(format!(
                "sensitivity must be a finite positive number (got {sensitivity})"
            )));
        }
        Ok(Self { sensitivity })
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Score every record; output is in input order.
    pub fn detect(&self, records: &[InventoryRecord]) -> AnalyticsResult<Vec<AnomalyResult>> {
        if records.len() < Self::MIN_RECORDS {
            return Err(AnalyticsError::insufficient_data(
                "anomaly detection",
                Self::MIN_RECORDS,
                records.len(),
            ));
        }

        let matrix = extract_features(records);

        let results: Vec<AnomalyResult> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let mut reasons = Vec::new();
                let mut score: f64 = 0.0;

                for feature in Feature::ALL {
                    let z = matrix.z(i, feature);
                    score = score.max(z.abs());
                    if z.abs() > self.sensitivity {
                        let direction = if z > 0.0 { "acima" } else { "abaixo" };
                        reasons.push(format!("{} muito {direction} da média", feature.label()));
                    }
                }

                if is_critical_low_priority(record) {
                    reasons.push(CRITICAL_LOW_PRIORITY_REASON.to_string());
                    score = score.max(self.sensitivity);
                }

                AnomalyResult {
                    item_id: record.id().clone(),
                    item_name: record.name().to_string(),
                    is_anomaly: !reasons.is_empty(),
                    anomaly_score: score,
                    reasons,
                }
            })
            .collect();

        debug!(
            records = records.len(),
            anomalies = results.iter().filter(|r| r.is_anomaly).count(),
            sensitivity = self.sensitivity,
            "anomaly detection complete"
        );

        Ok(results)
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            sensitivity: Self::DEFAULT_SENSITIVITY,
        }
    }
}

impl Analysis for AnomalyDetector {
    type Output = Vec<AnomalyResult>;

    fn name(&self) -> &'static str {
        "anomaly detection"
    }

    fn run(&self, records: &[InventoryRecord]) -> AnalyticsResult<Vec<AnomalyResult>> {
        self.detect(records)
    }
}

fn is_critical_low_priority(record: &InventoryRecord) -> bool {
    record.clinical_criticality() == Some(ClinicalCriticality::High)
        && record.classification() == Some(AbcClass::C)
}

/// Anomalous records only, highest score first (stable on ties).
pub fn rank_anomalies(results: &[AnomalyResult]) -> Vec<AnomalyResult> {
    let mut flagged: Vec<AnomalyResult> = results.iter().filter(|r| r.is_anomaly).cloned().collect();
    flagged.sort_by(|a, b| b.anomaly_score.total_cmp(&a.anomaly_score));
    flagged
}
