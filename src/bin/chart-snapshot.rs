use anyhow::{bail, Context, Result};
use serde::Serialize;

use autotrade_chart::chart::{Diagnostic, Reconciler};
use autotrade_chart::config::{self, Config};
use autotrade_chart::model::point::ChartPoint;

#[derive(Serialize)]
struct SnapshotOutput<'a> {
    points: &'a [ChartPoint],
    diagnostics: &'a [Diagnostic],
    unclassified: usize,
    synthesized_averages: usize,
}

fn reconciler_from_config() -> Result<Reconciler> {
    let config_path = config::config_path();
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config file, using default display settings");
        return Ok(Reconciler::default());
    }
    let config = Config::load_from_path(&config_path)?;
    Ok(Reconciler::new(config.chart.normalizer()?))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(path) = args.first() else {
        bail!("usage: chart-snapshot <minute-data.json>");
    };

    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    let payload: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path))?;

    let reconciler = reconciler_from_config()?;
    let result = reconciler
        .reconcile_json(&payload)
        .with_context(|| format!("{} is not a minute-data payload", path))?;

    let output = SnapshotOutput {
        points: &result.points,
        diagnostics: &result.diagnostics,
        unclassified: result.unclassified,
        synthesized_averages: result.synthesized_averages,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
