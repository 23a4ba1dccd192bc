use medstock_core::{AnalyticsResult, InventoryRecord};

/// A post-classification analysis over a record batch.
///
/// Analyses only read their input: they may run concurrently over the same
/// classified batch, and running one twice on the same batch yields the same
/// output.
pub trait Analysis: Send + Sync {
    type Output: Send;

    /// Human-readable name, used in logs and skip reports.
    fn name(&self) -> &'static str;

    /// Execute the analysis.
    fn run(&self, records: &[InventoryRecord]) -> AnalyticsResult<Self::Output>;
}
