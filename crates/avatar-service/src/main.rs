// SPDX-License-Identifier: Apache-2.0
//! Bootstrap: configuration, dependency wiring, and the HTTP listener
//! (`spec.md` §6), grounded in the teacher's `echo-session-ws-gateway::main`.

mod config;
mod default_asset;
mod error;
mod handler;
mod http;
mod item_store;
mod render_pipeline;
mod user_store;

use std::sync::Arc;

use anyhow::Context;
use avatar_cache::{ResultCache, ResultCacheConfig};
use avatar_coordinator::{CoordinatorConfig, RenderCoordinator};
use avatar_part_loader::PartLoader;
use avatar_store::{HttpCdnClient, SpacesConfig, SpacesObjectStore};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::item_store::InMemoryItemStore;
use crate::render_pipeline::CompositingRenderer;
use crate::user_store::InMemoryUserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::load().context("load configuration")?;
    let http_client = reqwest::Client::new();

    let object_store = Arc::new(SpacesObjectStore::new(
        SpacesConfig {
            endpoint: config.do_endpoint.clone(),
            bucket: config.do_space_name.clone(),
            access_key: config.do_space_id.clone(),
            secret_key: config.do_space_key.clone(),
            region: config.do_region.clone(),
        },
        http_client.clone(),
    ));
    let cdn_client = Arc::new(HttpCdnClient::new(config.do_space_endpoint.clone(), http_client));

    let part_loader = Arc::new(PartLoader::new(
        cdn_client,
        config.part_cache_root.clone(),
        config.part_memory_max_entries,
        config.part_memory_max_bytes,
        config.part_fetch_concurrency,
        config.breaker_threshold,
        config.breaker_open_timeout,
    ));

    let cache = Arc::new(ResultCache::new(
        ResultCacheConfig {
            memory_max_entries: config.result_memory_max_entries,
            memory_max_bytes: config.result_memory_max_bytes,
            memory_ttl: config.result_memory_ttl,
            disk_root: config.disk_cache_root.clone(),
        },
        object_store,
    ));
    avatar_cache::spawn_sweeper(config.disk_cache_root.clone(), config.disk_sweep_max_age, config.disk_sweep_interval);

    // Ambient, in-memory projections of the external user/item database
    // (`spec.md` §1: out of scope, only its read-only contract matters).
    let users: Arc<dyn user_store::UserStore> = Arc::new(InMemoryUserStore::new());
    let items: Arc<dyn item_store::ItemStore> = Arc::new(InMemoryItemStore::new());

    let renderer = Arc::new(CompositingRenderer::new(users.clone(), items, part_loader, "_bases"));
    let coordinator = RenderCoordinator::new(
        CoordinatorConfig {
            queue_capacity: config.queue_capacity,
            worker_count: config.worker_count,
            store_breaker_threshold: config.breaker_threshold,
            store_breaker_open_timeout: config.breaker_open_timeout,
            ..CoordinatorConfig::default()
        },
        renderer,
        cache.clone(),
    );

    let default_asset = default_asset::generate_or_log();
    let state = http::AppState::new(users, cache, coordinator, default_asset);
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await.context("bind listener")?;
    tracing::info!(port = config.port, "avatar-service listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    Ok(())
}

/// Waits for Ctrl+C, then lets `axum::serve`'s graceful shutdown hold the
/// listener open until in-flight requests finish. A request awaiting a
/// render can't outlive the coordinator's own per-job timeout (30s,
/// `spec.md` §4.5), so this already satisfies §5's "waits up to 30s for
/// in-flight renders" without a second, redundant deadline here.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install ctrl-c handler");
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}
