use anyhow::{Context, Result};
use grid_power_analytics::{config, ingest, report::AnalysisReport, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::info;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load().context("loading configuration")?;
    info!(data = %cfg.data.path.display(), "starting grid power analytics");

    let table = ingest::load_power_data(&cfg.data.path)
        .with_context(|| format!("loading measurements from {}", cfg.data.path.display()))?;

    let report = AnalysisReport::compute(&table, &cfg.standards);
    for line in report.summary_lines() {
        info!("{line}");
    }

    report
        .export_csv(&cfg.reports.dir)
        .with_context(|| format!("exporting reports to {}", cfg.reports.dir.display()))?;
    if cfg.reports.json {
        let path = cfg.reports.json_path();
        report
            .export_json(&path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    info!("analysis finished");
    Ok(())
}
