//! Auth Edge Service - Main Entry Point

use std::sync::Arc;

use anyhow::Context;
use auth_edge::grpc::AuthorizationServiceImpl;
use auth_edge::observability::EdgeMetrics;
use auth_edge::proto::envoy::service::auth::v3::authorization_server::AuthorizationServer;
use auth_edge::{Config, EdgeAuthorizer, RemoteSessionAuthority};
use rust_common::{init_tracing, run_with_graceful_shutdown, CircuitBreaker, TracingConfig};
use session_service::WhitelistMatcher;
use tonic::transport::Server;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    init_tracing(
        &TracingConfig::default()
            .with_service_name("auth-edge-service")
            .with_json_output(config.log_json),
    )?;

    info!("Starting Auth Edge Service");

    let addr = config.listen_addr()?;

    let metrics = EdgeMetrics::new(prometheus::default_registry())
        .context("failed to register metrics")?;

    let breaker = Arc::new(CircuitBreaker::new("session", config.circuit_breaker_config()));
    let authority = RemoteSessionAuthority::connect_lazy(
        &config.session_service_url,
        config.session_connect_timeout,
        config.session_request_timeout,
        breaker,
    )?
    .with_metrics(metrics.clone());

    let whitelist = Arc::new(WhitelistMatcher::new(config.api_whitelist.iter().cloned()));

    info!(
        session_service = %config.session_service_url,
        whitelist_entries = whitelist.len(),
        auth_duration_seconds = config.auth_duration_seconds,
        "Edge authorizer ready"
    );

    let authorizer = EdgeAuthorizer::new(
        whitelist,
        Arc::new(authority),
        config.auth_duration_seconds,
    )
    .with_metrics(metrics);
    let service = AuthorizationServiceImpl::new(authorizer);

    info!("Auth Edge Service listening on {}", addr);

    run_with_graceful_shutdown(
        |signal| {
            Server::builder()
                .add_service(AuthorizationServer::new(service))
                .serve_with_shutdown(addr, signal.recv())
        },
        config.shutdown_timeout(),
    )
    .await?;

    info!("Auth Edge Service stopped");

    Ok(())
}
