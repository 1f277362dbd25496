// WAF Monitor - Store Handle
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Read-only query interface and dispatch entry point for the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use super::status::SyncStatus;
use super::store::Command;
use crate::api::Resource;
use crate::channel::{Notification, NotificationChannel, Topic};
use crate::error::SyncError;
use crate::models::Snapshot;

/// Handle to a running store. Cheap to clone; pass one to every consumer.
#[derive(Clone)]
pub struct StoreHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<Arc<Snapshot>>,
    status: watch::Receiver<SyncStatus>,
    dropped: Arc<AtomicU64>,
}

impl StoreHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        snapshot: watch::Receiver<Arc<Snapshot>>,
        status: watch::Receiver<SyncStatus>,
        dropped: Arc<AtomicU64>,
    ) -> Self {
        Self {
            commands,
            snapshot,
            status,
            dropped,
        }
    }

    /// The latest committed snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    /// Receiver that wakes on every commit.
    pub fn watch(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.clone()
    }

    /// Current status, including notifications a full queue rejected that
    /// the store has not counted yet.
    pub fn status(&self) -> SyncStatus {
        let mut status = self.status.borrow().clone();
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > 0 {
            status.skipped_updates += dropped;
            status.last_failure = Some(Utc::now());
            status.last_error = Some(SyncError::Queue("full").to_string());
        }
        status
    }

    /// Receiver for status changes. Queue-full drops show up here once the
    /// store picks up its next command.
    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// Queue a push notification without waiting.
    ///
    /// Fails when the queue is full or the store has stopped; the
    /// notification is then lost, like one sent while disconnected. Losses
    /// to a full queue are counted as skipped updates.
    pub fn notify(&self, notification: Notification) -> Result<(), SyncError> {
        self.enqueue(Command::Notify(notification))
    }

    /// Record an update that was lost before reaching the store.
    pub fn report_skipped(&self, error: &SyncError) -> Result<(), SyncError> {
        self.enqueue(Command::Skipped(error.to_string()))
    }

    fn enqueue(&self, command: Command) -> Result<(), SyncError> {
        self.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                SyncError::Queue("full")
            }
            TrySendError::Closed(_) => SyncError::Queue("closed"),
        })
    }

    /// Ask the store to pull `resource`.
    pub async fn refresh(&self, resource: Resource) -> Result<(), SyncError> {
        self.commands
            .send(Command::Refresh(resource))
            .await
            .map_err(|_| SyncError::Queue("closed"))
    }

    /// Pull every resource.
    pub async fn refresh_all(&self) -> Result<(), SyncError> {
        for resource in Resource::ALL {
            self.refresh(resource).await?;
        }
        Ok(())
    }

    /// Forward every topic of `channel` into this store, along with its
    /// decode failures.
    pub fn attach(&self, channel: &mut NotificationChannel) {
        for topic in Topic::ALL {
            let handle = self.clone();
            channel.subscribe(topic, move |notification| {
                if let Err(e) = handle.notify(notification) {
                    warn!("Dropping {} notification: {}", topic, e);
                }
            });
        }

        let handle = self.clone();
        channel.on_error(move |error| {
            if let Err(e) = handle.report_skipped(error) {
                warn!("Could not record skipped update: {}", e);
            }
        });
    }
}
