//! `medstock` — run the analytics engine over a JSON record batch.
//!
//! Usage: `medstock [records.json]` (reads stdin when no path is given).
//! Engine settings come from `MEDSTOCK_*` environment variables; the JSON
//! report is written to stdout, logs to stderr.

use std::fs;
use std::io::{self, Read, Write};

use anyhow::{Context, Result};

use medstock_analytics::AnalyticsSettings;
use medstock_core::InventoryRecord;

fn main() -> Result<()> {
    medstock_observability::init();

    let settings = AnalyticsSettings::from_env().context("loading analytics settings")?;
    let orchestrator = settings.orchestrator().context("building analytics pipeline")?;

    let raw = match std::env::args().nth(1) {
        Some(path) => fs::read_to_string(&path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };

    let records: Vec<InventoryRecord> =
        serde_json::from_str(&raw).context("parsing inventory records (expected a JSON array)")?;
    tracing::info!(records = records.len(), "loaded inventory batch");

    let report = orchestrator.run(&records).context("running analytics")?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report).context("writing report")?;
    writeln!(stdout)?;
    Ok(())
}
