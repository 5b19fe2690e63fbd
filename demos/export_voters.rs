//! Voter export example
//!
//! Exports the voter list of one state as spreadsheet parts and prints each step:
//! - Pointing the orchestrator at a backend
//! - Subscribing to events
//! - Running one export to completion
//!
//! ```text
//! EXPORT_BASE_URL=http://localhost:8000 cargo run --example export_voters -- 05
//! ```

use export_dl::config::{BackendConfig, ExportConfig};
use export_dl::types::filter_keys;
use export_dl::{Config, Event, ExportFormat, ExportKind, ExportOrchestrator, ExportRequest};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("export_dl=info")),
        )
        .init();

    let base_url =
        std::env::var("EXPORT_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let estado = std::env::args().nth(1).unwrap_or_else(|| "05".to_string());

    let config = Config {
        backend: BackendConfig {
            base_url,
            request_timeout: Duration::from_secs(120),
            ..Default::default()
        },
        export: ExportConfig {
            download_dir: "exports".into(),
            inter_part_delay: Duration::from_millis(1200),
            ..Default::default()
        },
        ..Default::default()
    };

    let orchestrator = ExportOrchestrator::new(config).await?;

    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::InfoResolved { total_parts, .. } => {
                    println!("Export split into {} part(s)", total_parts);
                }
                Event::PartStarted {
                    index, total_parts, ..
                } => {
                    println!("Fetching part {}/{}", index, total_parts);
                }
                Event::PartSaved { part, percent, .. } => {
                    println!(
                        "Saved {} ({} bytes) - {:.2}%",
                        part.path.display(),
                        part.bytes,
                        percent
                    );
                }
                Event::RunCompleted { .. } | Event::RunFailed { .. } | Event::RunCancelled { .. } => {
                    break;
                }
                _ => {}
            }
        }
    });

    let request = ExportRequest::new(ExportKind::Voters, ExportFormat::Spreadsheet)
        .with_filter(filter_keys::CODIGO_ESTADO, estado);

    let status = orchestrator.run(request).await?;
    println!("{}", status);

    orchestrator.shutdown().await?;
    Ok(())
}
