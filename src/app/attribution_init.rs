// src/app/attribution_init.rs
//
// Attribution Initialization
//
// Composition root for the attribution subsystem. Builds exactly one resolver;
// everything that needs the attribution gets a clone of the returned Arc.
//
// CRITICAL RULES:
// - No global state: the resolver is owned by whoever calls this
// - initiate() is left to the caller, so it can pick the moment

use std::sync::Arc;

use crate::app::config::AttributionConfig;
use crate::db::{
    create_connection_pool, get_connection, get_database_path, initialize_database,
    verify_database_integrity,
};
use crate::error::AppResult;
use crate::events::EventBus;
use crate::integrations::referrer::{HttpReferrerClient, ServiceClient};
use crate::repositories::{AttributionStore, SqliteAttributionStore};
use crate::services::{AttributionParser, AttributionResolver, QueryParamParser};

/// Initializes the attribution subsystem.
///
/// This function:
/// 1. Opens the SQLite pool, applies the schema and checks the file's integrity
/// 2. Creates the store, parser and referrer client
/// 3. Creates the resolver
///
/// # Returns
/// The resolver, not yet initiated
pub fn init_attribution_subsystem(
    config: &AttributionConfig,
    event_bus: Arc<EventBus>,
) -> AppResult<Arc<AttributionResolver>> {
    log::info!("[ATTRIBUTION] Initializing subsystem...");
    config.validate()?;

    let db_path = get_database_path(&config.store)?;
    let pool = create_connection_pool(&db_path, config.store.pool_size)?;
    {
        let conn = get_connection(&pool)?;
        initialize_database(&conn)?;
        verify_database_integrity(&conn)?;
    }
    log::info!("[ATTRIBUTION] Using store at {}", db_path.display());

    let store: Arc<dyn AttributionStore> = Arc::new(SqliteAttributionStore::new(Arc::new(pool)));
    let parser: Arc<dyn AttributionParser> = Arc::new(QueryParamParser::new(&config.parser)?);
    let client: Arc<dyn ServiceClient> = Arc::new(HttpReferrerClient::new(&config.service)?);

    let resolver = Arc::new(AttributionResolver::new(
        store,
        parser,
        client,
        event_bus,
        config.resolver.clone(),
    ));

    log::info!("[ATTRIBUTION] Subsystem initialized");
    Ok(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::{ServiceConfig, StoreConfig};
    use crate::domain::{FailureReason, ResolutionOutcome};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config_in(dir: &TempDir, endpoint: Option<String>) -> AttributionConfig {
        AttributionConfig {
            store: StoreConfig {
                database_path: Some(dir.path().join("attribution.db")),
                pool_size: 2,
            },
            service: ServiceConfig {
                endpoint,
                request_timeout_ms: 2000,
            },
            ..AttributionConfig::default()
        }
    }

    async fn referrer_endpoint(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/install-referrer", addr)
    }

    #[tokio::test]
    async fn test_without_endpoint_service_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let resolver =
            init_attribution_subsystem(&config_in(&dir, None), Arc::new(EventBus::new())).unwrap();

        resolver.initiate();

        assert_eq!(
            resolver.resolve().await,
            ResolutionOutcome::failed(FailureReason::ServiceUnavailable)
        );
    }

    #[tokio::test]
    async fn test_second_run_replays_first_answer_from_disk() {
        let dir = TempDir::new().unwrap();
        let endpoint = referrer_endpoint(r#"{"install_referrer":"utm_source=play&utm_campaign=xyz"}"#).await;

        let first_run =
            init_attribution_subsystem(&config_in(&dir, Some(endpoint)), Arc::new(EventBus::new()))
                .unwrap();
        first_run.initiate();
        let first = first_run.resolve_within(Duration::from_secs(5)).await.unwrap();
        assert_eq!(first, ResolutionOutcome::found("xyz", false));

        // No endpoint this time: a cache miss would come back as ServiceUnavailable
        let second_run =
            init_attribution_subsystem(&config_in(&dir, None), Arc::new(EventBus::new())).unwrap();
        second_run.initiate();

        assert_eq!(
            second_run.resolve().await,
            ResolutionOutcome::found("xyz", true)
        );
    }
}
