//! ABC (Pareto) classification by cumulative value share.

use serde::{Deserialize, Serialize};
use tracing::debug;

use medstock_core::{AbcClass, AbcConfiguration, AnalyticsResult, InventoryRecord};

/// Classify a batch into A/B/C tiers.
///
/// Output holds the same records, annotated, in value-descending order (ties
/// keep input order). Thresholds are compared against the cumulative share
/// *after* adding the current record, so the record that crosses a threshold
/// lands in the next class.
///
/// A batch whose total value is zero (including an empty batch) is a defined
/// degenerate case: every record gets 0% / 0% and class `C`.
pub fn classify(
    records: &[InventoryRecord],
    config: &AbcConfiguration,
) -> AnalyticsResult<Vec<InventoryRecord>> {
    config.validate()?;

    let mut sorted: Vec<InventoryRecord> = records.to_vec();
    // `sort_by` is stable: equal values keep their input order.
    sorted.sort_by(|a, b| b.total_value().total_cmp(&a.total_value()));

    let total: f64 = sorted.iter().map(InventoryRecord::total_value).sum();

    if total <= 0.0 {
        debug!(records = sorted.len(), "zero-value batch; every record classified C");
        for record in &mut sorted {
            record.assign_abc(0.0, 0.0, AbcClass::C);
        }
        return Ok(sorted);
    }

    let mut accumulated = 0.0;
    for record in &mut sorted {
        let percentage = record.total_value() / total * 100.0;
        accumulated += percentage;
        let class = class_for(accumulated, config);
        record.assign_abc(percentage, accumulated, class);
    }

    debug!(
        records = sorted.len(),
        total_value = total,
        closing_percentage = accumulated,
        "abc classification complete"
    );

    Ok(sorted)
}

fn class_for(accumulated: f64, config: &AbcConfiguration) -> AbcClass {
    if accumulated <= config.class_a_threshold {
        AbcClass::A
    } else if accumulated <= config.class_b_threshold {
        AbcClass::B
    } else {
        AbcClass::C
    }
}

/// Per-class KPI line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub class: AbcClass,
    pub item_count: usize,
    pub total_value: f64,
    /// Share of the batch value held by this class (0–100).
    pub value_share: f64,
    /// Share of the batch items in this class (0–100).
    pub item_share: f64,
}

/// KPI summary of a classified batch, one line per class in A, B, C order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbcSummary {
    pub total_value: f64,
    pub item_count: usize,
    pub classes: Vec<ClassSummary>,
}

impl AbcSummary {
    pub fn class(&self, class: AbcClass) -> Option<&ClassSummary> {
        self.classes.iter().find(|c| c.class == class)
    }
}

/// Summarize classified records. Unclassified records are not counted in any class.
pub fn summarize(records: &[InventoryRecord]) -> AbcSummary {
    let total_value: f64 = records.iter().map(InventoryRecord::total_value).sum();
    let item_count = records.len();

    let classes = AbcClass::ALL
        .iter()
        .map(|&class| {
            let members = records.iter().filter(|r| r.classification() == Some(class));
            let (count, value) = members.fold((0usize, 0.0f64), |(n, v), r| (n + 1, v + r.total_value()));
            ClassSummary {
                class,
                item_count: count,
                total_value: value,
                value_share: share(value, total_value),
                item_share: share(count as f64, item_count as f64),
            }
        })
        .collect();

    AbcSummary {
        total_value,
        item_count,
        classes,
    }
}

fn share(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}
