// SPDX-License-Identifier: Apache-2.0
//! Layered configuration: CLI flags override environment variables, which
//! override defaults (`spec.md` §6), modeled on the teacher's
//! `ServerOptions::load()`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WORKER_COUNT: usize = 3;
const DEFAULT_QUEUE_CAPACITY: usize = 1000;
const DEFAULT_MEMORY_MAX_ENTRIES: usize = 50;
const DEFAULT_MEMORY_MAX_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_MEMORY_TTL_SECS: u64 = 3600;
const DEFAULT_PART_FETCH_CONCURRENCY: usize = 10;
const DEFAULT_PART_MEMORY_MAX_ENTRIES: usize = 512;
const DEFAULT_PART_MEMORY_MAX_BYTES: usize = 128 * 1024 * 1024;
const DEFAULT_BREAKER_THRESHOLD: u32 = 5;
const DEFAULT_BREAKER_OPEN_TIMEOUT_SECS: u64 = 60;
const DEFAULT_DISK_SWEEP_MAX_AGE_SECS: u64 = 7 * 24 * 3600;
const DEFAULT_DISK_SWEEP_INTERVAL_SECS: u64 = 24 * 3600;

#[derive(Debug, Parser)]
#[command(name = "avatar-service", about = "Layered avatar rendering service")]
struct CliOptions {
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    do_space_endpoint: Option<String>,
    #[arg(long)]
    do_endpoint: Option<String>,
    #[arg(long)]
    do_space_id: Option<String>,
    #[arg(long)]
    do_space_key: Option<String>,
    #[arg(long)]
    do_space_name: Option<String>,
    #[arg(long)]
    do_region: Option<String>,
    #[arg(long)]
    tls_cert_path: Option<PathBuf>,
    #[arg(long)]
    tls_key_path: Option<PathBuf>,
    #[arg(long)]
    worker_count: Option<usize>,
    #[arg(long)]
    queue_capacity: Option<usize>,
    #[arg(long)]
    result_memory_max_entries: Option<usize>,
    #[arg(long)]
    result_memory_max_bytes: Option<usize>,
    #[arg(long)]
    result_memory_ttl_secs: Option<u64>,
    #[arg(long)]
    part_fetch_concurrency: Option<usize>,
    #[arg(long)]
    part_memory_max_entries: Option<usize>,
    #[arg(long)]
    part_memory_max_bytes: Option<usize>,
    #[arg(long)]
    breaker_threshold: Option<u32>,
    #[arg(long)]
    breaker_open_timeout_secs: Option<u64>,
    #[arg(long)]
    disk_sweep_max_age_secs: Option<u64>,
    #[arg(long)]
    disk_sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EnvOptions {
    #[serde(rename = "PORT")]
    port: Option<u16>,
    #[serde(rename = "DO_SPACE_ENDPOINT")]
    do_space_endpoint: Option<String>,
    #[serde(rename = "DO_ENDPOINT")]
    do_endpoint: Option<String>,
    #[serde(rename = "DO_SPACE_ID")]
    do_space_id: Option<String>,
    #[serde(rename = "DO_SPACE_KEY")]
    do_space_key: Option<String>,
    #[serde(rename = "DO_SPACE_NAME")]
    do_space_name: Option<String>,
    #[serde(rename = "DO_REGION")]
    do_region: Option<String>,
    #[serde(rename = "TLS_CERT_PATH")]
    tls_cert_path: Option<PathBuf>,
    #[serde(rename = "TLS_KEY_PATH")]
    tls_key_path: Option<PathBuf>,
    #[serde(rename = "WORKER_COUNT")]
    worker_count: Option<usize>,
    #[serde(rename = "QUEUE_CAPACITY")]
    queue_capacity: Option<usize>,
    #[serde(rename = "RESULT_MEMORY_MAX_ENTRIES")]
    result_memory_max_entries: Option<usize>,
    #[serde(rename = "RESULT_MEMORY_MAX_BYTES")]
    result_memory_max_bytes: Option<usize>,
    #[serde(rename = "RESULT_MEMORY_TTL_SECS")]
    result_memory_ttl_secs: Option<u64>,
    #[serde(rename = "PART_FETCH_CONCURRENCY")]
    part_fetch_concurrency: Option<usize>,
    #[serde(rename = "PART_MEMORY_MAX_ENTRIES")]
    part_memory_max_entries: Option<usize>,
    #[serde(rename = "PART_MEMORY_MAX_BYTES")]
    part_memory_max_bytes: Option<usize>,
    #[serde(rename = "BREAKER_THRESHOLD")]
    breaker_threshold: Option<u32>,
    #[serde(rename = "BREAKER_OPEN_TIMEOUT_SECS")]
    breaker_open_timeout_secs: Option<u64>,
    #[serde(rename = "DISK_SWEEP_MAX_AGE_SECS")]
    disk_sweep_max_age_secs: Option<u64>,
    #[serde(rename = "DISK_SWEEP_INTERVAL_SECS")]
    disk_sweep_interval_secs: Option<u64>,
}

/// Fully-resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub do_space_endpoint: String,
    pub do_endpoint: String,
    pub do_space_id: String,
    pub do_space_key: String,
    pub do_space_name: String,
    pub do_region: String,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,

    pub worker_count: usize,
    pub queue_capacity: usize,
    pub result_memory_max_entries: usize,
    pub result_memory_max_bytes: usize,
    pub result_memory_ttl: Duration,
    pub part_fetch_concurrency: usize,
    pub part_memory_max_entries: usize,
    pub part_memory_max_bytes: usize,
    pub breaker_threshold: u32,
    pub breaker_open_timeout: Duration,
    pub disk_sweep_max_age: Duration,
    pub disk_sweep_interval: Duration,

    pub disk_cache_root: PathBuf,
    pub part_cache_root: PathBuf,
}

impl AppConfig {
    /// `CLI > environment > defaults`.
    pub fn load() -> anyhow::Result<Self> {
        let cli = CliOptions::parse();
        let env = envy::from_env::<EnvOptions>().unwrap_or_default();

        Ok(Self {
            port: cli.port.or(env.port).unwrap_or(DEFAULT_PORT),
            do_space_endpoint: cli.do_space_endpoint.or(env.do_space_endpoint).unwrap_or_default(),
            do_endpoint: cli.do_endpoint.or(env.do_endpoint).unwrap_or_default(),
            do_space_id: cli.do_space_id.or(env.do_space_id).unwrap_or_default(),
            do_space_key: cli.do_space_key.or(env.do_space_key).unwrap_or_default(),
            do_space_name: cli.do_space_name.or(env.do_space_name).unwrap_or_default(),
            do_region: cli.do_region.or(env.do_region).unwrap_or_else(|| "us-east-1".to_string()),
            tls_cert_path: cli.tls_cert_path.or(env.tls_cert_path),
            tls_key_path: cli.tls_key_path.or(env.tls_key_path),

            worker_count: cli.worker_count.or(env.worker_count).unwrap_or(DEFAULT_WORKER_COUNT),
            queue_capacity: cli.queue_capacity.or(env.queue_capacity).unwrap_or(DEFAULT_QUEUE_CAPACITY),
            result_memory_max_entries: cli
                .result_memory_max_entries
                .or(env.result_memory_max_entries)
                .unwrap_or(DEFAULT_MEMORY_MAX_ENTRIES),
            result_memory_max_bytes: cli
                .result_memory_max_bytes
                .or(env.result_memory_max_bytes)
                .unwrap_or(DEFAULT_MEMORY_MAX_BYTES),
            result_memory_ttl: Duration::from_secs(
                cli.result_memory_ttl_secs.or(env.result_memory_ttl_secs).unwrap_or(DEFAULT_MEMORY_TTL_SECS),
            ),
            part_fetch_concurrency: cli
                .part_fetch_concurrency
                .or(env.part_fetch_concurrency)
                .unwrap_or(DEFAULT_PART_FETCH_CONCURRENCY),
            part_memory_max_entries: cli
                .part_memory_max_entries
                .or(env.part_memory_max_entries)
                .unwrap_or(DEFAULT_PART_MEMORY_MAX_ENTRIES),
            part_memory_max_bytes: cli
                .part_memory_max_bytes
                .or(env.part_memory_max_bytes)
                .unwrap_or(DEFAULT_PART_MEMORY_MAX_BYTES),
            breaker_threshold: cli.breaker_threshold.or(env.breaker_threshold).unwrap_or(DEFAULT_BREAKER_THRESHOLD),
            breaker_open_timeout: Duration::from_secs(
                cli.breaker_open_timeout_secs.or(env.breaker_open_timeout_secs).unwrap_or(DEFAULT_BREAKER_OPEN_TIMEOUT_SECS),
            ),
            disk_sweep_max_age: Duration::from_secs(
                cli.disk_sweep_max_age_secs.or(env.disk_sweep_max_age_secs).unwrap_or(DEFAULT_DISK_SWEEP_MAX_AGE_SECS),
            ),
            disk_sweep_interval: Duration::from_secs(
                cli.disk_sweep_interval_secs.or(env.disk_sweep_interval_secs).unwrap_or(DEFAULT_DISK_SWEEP_INTERVAL_SECS),
            ),

            disk_cache_root: PathBuf::from("avatars"),
            part_cache_root: PathBuf::from("cache"),
        })
    }
}
