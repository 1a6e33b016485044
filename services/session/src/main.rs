//! Session Service - Main Entry Point

use std::sync::Arc;

use anyhow::Context;
use rust_common::{init_tracing, run_with_graceful_shutdown, TracingConfig};
use session_service::config::{BackendKind, Config};
use session_service::grpc::AuthServiceImpl;
use session_service::proto::auth::v1::auth_service_server::AuthServiceServer;
use session_service::{
    AuthDecisionService, MemoryBackend, RedisBackend, SessionBackend, TokenStore, WhitelistMatcher,
};
use tonic::transport::Server;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    init_tracing(
        &TracingConfig::default()
            .with_service_name("session-service")
            .with_json_output(config.log_json),
    )?;

    info!("Starting Session Service");

    let addr = config.listen_addr()?;

    let backend: Arc<dyn SessionBackend> = match config.backend {
        BackendKind::Redis => Arc::new(
            RedisBackend::connect(&config.redis)
                .await
                .context("session store unreachable")?,
        ),
        BackendKind::Memory => {
            warn!("Using in-process session storage; sessions are not shared between replicas");
            Arc::new(MemoryBackend::new())
        }
    };

    let store = Arc::new(TokenStore::new(backend, config.redis.command_timeout));
    let whitelist = Arc::new(WhitelistMatcher::new(config.api_whitelist.iter().cloned()));
    info!(
        backend = store.backend_name(),
        whitelist_entries = whitelist.len(),
        "Session store ready"
    );

    let service = AuthServiceImpl::new(AuthDecisionService::new(store, whitelist));

    info!("Session Service listening on {}", addr);

    run_with_graceful_shutdown(
        |signal| {
            Server::builder()
                .add_service(AuthServiceServer::new(service))
                .serve_with_shutdown(addr, signal.recv())
        },
        config.shutdown_timeout(),
    )
    .await?;

    info!("Session Service stopped");

    Ok(())
}
