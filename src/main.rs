// WAF Monitor - Main Entry Point
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! WAF Monitor - keeps a dashboard snapshot in sync with a WAF cluster.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use waf_monitor::api::ApiClient;
use waf_monitor::channel::{NotificationChannel, WsTransport};
use waf_monitor::config::Settings;
use waf_monitor::storage::{self, JsonFileStore};
use waf_monitor::SyncStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new();
    let config = settings.get().clone();
    info!("Loaded settings from {}", settings.path().display());

    let backend = ApiClient::new(&config.api_base_url, config.request_timeout())
        .context("Failed to build HTTP client")?;

    let store = match &config.snapshot_dir {
        Some(dir) => JsonFileStore::in_dir(dir),
        None => JsonFileStore::new(),
    };
    let initial = storage::restore(&store, config.resume_from_persisted_state);

    let handle = SyncStore::spawn(
        Arc::new(backend),
        Box::new(store),
        initial,
        config.queue_capacity,
    );

    let mut channel = NotificationChannel::new();
    handle.attach(&mut channel);
    let transport = WsTransport::new(&config.push_url, config.reconnect_delay());
    tokio::spawn(channel.run(transport));

    handle
        .refresh_all()
        .await
        .context("Store stopped before the initial refresh")?;

    let mut snapshots = handle.watch();
    let stale_after = config.stale_after();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("Store stopped");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let status = handle.status();
                info!(
                    "[{}] total={} allowed={} blocked={} top_sources={:?} stale={}",
                    snapshot.last_update_display(),
                    snapshot.total_count(),
                    snapshot.allowed_count(),
                    snapshot.blocked_count(),
                    snapshot.attack_sources().sources(),
                    status.is_stale(Utc::now(), stale_after),
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
