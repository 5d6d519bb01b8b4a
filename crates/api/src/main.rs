//! Charge Predictor - Main Entry Point

use api::settings::Settings;
use api::{init_logging, run_server};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_logging(&settings.logging)?;

    info!("=== Charge Predictor v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Settings: {:?}", settings);

    let metrics = if settings.metrics.enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    run_server(settings, metrics).await
}
