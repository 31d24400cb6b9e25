// SPDX-License-Identifier: Apache-2.0
//! The thin HTTP surface (`spec.md` §6), grounded in the teacher's
//! `echo-session-ws-gateway` binary: a plain `axum::Router` over a cloned
//! `Arc<AppState>`, no middleware beyond what `tracing`'s request-level
//! logging already gives for free.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use avatar_cache::ResultCache;
use avatar_coordinator::{JobEvent, RenderCoordinator};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::handler::{get_avatar, AvatarDeps, AvatarResponse};
use crate::user_store::UserStore;

/// Running counters for `/queue/stats`, fed by subscribing to the
/// coordinator's event bus (`spec.md` §4.5 "observable events" is the only
/// mandated telemetry surface; this just tallies it).
#[derive(Default)]
struct QueueCounters {
    added: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub cache: Arc<ResultCache>,
    pub coordinator: Arc<RenderCoordinator>,
    pub default_asset: Option<Bytes>,
    counters: QueueCounters,
}

impl AppState {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        cache: Arc<ResultCache>,
        coordinator: Arc<RenderCoordinator>,
        default_asset: Option<Bytes>,
    ) -> Arc<Self> {
        let state = Arc::new(Self { users, cache, coordinator, default_asset, counters: QueueCounters::default() });
        spawn_counter_listener(state.clone());
        state
    }

    fn deps(&self) -> AvatarDeps {
        AvatarDeps {
            users: self.users.clone(),
            cache: self.cache.clone(),
            coordinator: self.coordinator.clone(),
            default_asset: self.default_asset.clone(),
        }
    }
}

fn spawn_counter_listener(state: Arc<AppState>) {
    let mut events = state.coordinator.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(JobEvent::Added(_)) => {
                    state.counters.added.fetch_add(1, Ordering::Relaxed);
                }
                Ok(JobEvent::Completed(_)) => {
                    state.counters.completed.fetch_add(1, Ordering::Relaxed);
                }
                Ok(JobEvent::Failed { .. }) => {
                    state.counters.failed.fetch_add(1, Ordering::Relaxed);
                }
                Ok(JobEvent::Retried { .. }) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "queue stats listener lagged behind event bus");
                }
            }
        }
    });
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health))
        .route("/avatar/:kind/:username", get(avatar))
        .route("/clear-cache", get(clear_cache))
        .route("/queue/stats", get(queue_stats))
        .route("/queue/pause", post(queue_pause))
        .route("/queue/resume", post(queue_resume))
        .with_state(state)
}

async fn liveness() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    queue_len: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthBody { status: "ok", queue_len: state.coordinator.queue_len() })
}

async fn avatar(State(state): State<Arc<AppState>>, Path((kind, username_webp)): Path<(String, String)>) -> Result<Response, ApiError> {
    let username = username_webp.strip_suffix(".webp").unwrap_or(&username_webp);
    let deps = state.deps();
    match get_avatar(&deps, username, &kind).await? {
        AvatarResponse::Bytes(bytes) => Ok(([(axum::http::header::CONTENT_TYPE, "image/webp")], bytes).into_response()),
        AvatarResponse::Default(bytes) => Ok(([(axum::http::header::CONTENT_TYPE, "image/webp")], bytes).into_response()),
        AvatarResponse::Redirect(url) => Ok(Redirect::temporary(&url).into_response()),
    }
}

#[derive(Serialize)]
struct ClearCacheBody {
    cleared: bool,
}

async fn clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.cache.clear().await;
    state.coordinator.cancel_all();
    info!("result cache cleared, in-flight renders cancelled");
    Json(ClearCacheBody { cleared: true })
}

#[derive(Serialize)]
struct QueueStatsBody {
    waiting: usize,
    active: u64,
    completed: u64,
    failed: u64,
}

async fn queue_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let added = state.counters.added.load(Ordering::Relaxed);
    let completed = state.counters.completed.load(Ordering::Relaxed);
    let failed = state.counters.failed.load(Ordering::Relaxed);
    Json(QueueStatsBody {
        waiting: state.coordinator.queue_len(),
        active: added.saturating_sub(completed + failed),
        completed,
        failed,
    })
}

#[derive(Serialize)]
struct QueueControlBody {
    paused: bool,
}

async fn queue_pause(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.coordinator.pause();
    Json(QueueControlBody { paused: true })
}

async fn queue_resume(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.coordinator.resume();
    Json(QueueControlBody { paused: false })
}
