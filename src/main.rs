// src/main.rs
//
// Composition root: builds the resolver once, initiates it, and lets several
// independent readers ask for the answer at the same time.
//
// Usage: install-attribution [config.json]

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use install_attribution::app::{init_attribution_subsystem, AttributionConfig};
use install_attribution::events::{create_event_bus, AttributionResolved};

const READERS: usize = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 1. CONFIGURATION
    let config = match std::env::args().nth(1) {
        Some(path) => AttributionConfig::load(Path::new(&path))?,
        None => AttributionConfig::default(),
    };

    // 2. INFRASTRUCTURE
    let event_bus = Arc::new(create_event_bus());
    event_bus.subscribe::<AttributionResolved, _>(|event| {
        log::info!(
            "[MAIN] Attribution resolved after {}ms: {}",
            event.elapsed_ms, event.outcome
        );
    });

    // 3. RESOLVER
    let resolver = init_attribution_subsystem(&config, event_bus)?;
    resolver.initiate();

    // 4. READERS
    let readers: Vec<_> = (0..READERS)
        .map(|id| {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move {
                let outcome = resolver.resolve().await;
                log::debug!("[MAIN] Reader {} observed {}", id, outcome);
                outcome
            })
        })
        .collect();

    let outcome = match config.resolver.wait_timeout() {
        Some(limit) => resolver.resolve_within(limit).await?,
        None => resolver.resolve().await,
    };

    for reader in readers {
        let observed = reader.await?;
        anyhow::ensure!(observed == outcome, "reader saw {} but resolver answered {}", observed, outcome);
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
