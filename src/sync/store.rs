// WAF Monitor - Synchronization Store
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Single-writer owner of the dashboard snapshot.
//!
//! Push notifications and pull completions are queued on one bounded channel
//! and applied by one task, so commits never interleave. Every commit carries
//! a version stamped when its data was requested (pulls) or received
//! (pushes); a result older than what a field already holds is discarded
//! instead of overwriting it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use super::handle::StoreHandle;
use super::status::{StoreState, SyncStatus};
use crate::api::{Backend, Payload, Resource};
use crate::channel::Notification;
use crate::error::SyncError;
use crate::models::{Field, Snapshot, UpdateIntent};
use crate::storage::SnapshotStore;

/// Resources pulled when the cluster tunnel (re)connects.
const RESYNC_RESOURCES: [Resource; 3] = [
    Resource::AuthorizedEvents,
    Resource::SecurityEvents,
    Resource::Health,
];

/// Work items for the commit task.
#[derive(Debug)]
pub(crate) enum Command {
    Notify(Notification),
    Refresh(Resource),
    /// An update lost before it reached the store.
    Skipped(String),
    Pulled {
        resource: Resource,
        version: u64,
        result: Result<Payload, SyncError>,
    },
}

/// The commit task's state.
pub struct SyncStore {
    snapshot: Snapshot,
    status: SyncStatus,
    backend: Arc<dyn Backend>,
    storage: Box<dyn SnapshotStore>,
    next_version: u64,
    applied: HashMap<Field, u64>,
    commands: mpsc::Receiver<Command>,
    loopback: mpsc::WeakSender<Command>,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    status_tx: watch::Sender<SyncStatus>,
    /// Notifications rejected by a full queue, not yet counted in `status`.
    dropped: Arc<AtomicU64>,
}

impl SyncStore {
    /// Start the commit task and return a handle to it.
    ///
    /// The task stops once every handle is dropped and no pull is in flight.
    pub fn spawn(
        backend: Arc<dyn Backend>,
        storage: Box<dyn SnapshotStore>,
        initial: Snapshot,
        capacity: usize,
    ) -> StoreHandle {
        let (command_tx, commands) = mpsc::channel(capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(initial.clone()));
        let (status_tx, status_rx) = watch::channel(SyncStatus::default());
        let dropped = Arc::new(AtomicU64::new(0));

        let store = SyncStore {
            snapshot: initial,
            status: SyncStatus::default(),
            backend,
            storage,
            next_version: 0,
            applied: HashMap::new(),
            commands,
            loopback: command_tx.downgrade(),
            snapshot_tx,
            status_tx,
            dropped: Arc::clone(&dropped),
        };
        tokio::spawn(store.run());

        StoreHandle::new(command_tx, snapshot_rx, status_rx, dropped)
    }

    async fn run(mut self) {
        info!("Synchronization store started");
        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }
        info!("Synchronization store stopped");
    }

    fn handle(&mut self, command: Command) {
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            self.mark_skipped(dropped, SyncError::Queue("full").to_string());
        }

        match command {
            Command::Notify(notification) => self.on_notification(notification),
            Command::Refresh(resource) => self.spawn_pull(resource),
            Command::Skipped(reason) => self.mark_skipped(1, reason),
            Command::Pulled {
                resource,
                version,
                result,
            } => match result {
                Ok(payload) => self.commit(payload.into(), version),
                Err(e) => self.record_failure(resource, e),
            },
        }
    }

    fn on_notification(&mut self, notification: Notification) {
        trace!("Notification on {}", notification.topic());
        match notification {
            Notification::TunnelConnected { deployed_at } => {
                info!("Cluster tunnel connected");
                self.status.cluster_connected = true;
                if deployed_at.is_some() {
                    self.status.deployed_at = deployed_at;
                }
                self.publish_status();
                for resource in RESYNC_RESOURCES {
                    self.spawn_pull(resource);
                }
            }
            Notification::TunnelDisconnected => {
                info!("Cluster tunnel disconnected");
                self.status.cluster_connected = false;
                self.publish_status();
            }
            Notification::AccessLogUpdated => self.spawn_pull(Resource::AuthorizedEvents),
            Notification::SecurityLogUpdated(Some(events)) => {
                let version = self.stamp();
                self.commit(UpdateIntent::SecurityEventsReady(events), version);
            }
            Notification::SecurityLogUpdated(None) => self.spawn_pull(Resource::SecurityEvents),
            Notification::HealthUpdated(Some(records)) => {
                let version = self.stamp();
                self.commit(UpdateIntent::HealthReady(records), version);
            }
            Notification::HealthUpdated(None) => self.spawn_pull(Resource::Health),
            Notification::ServicesUpdated(Some(services)) => {
                let version = self.stamp();
                self.commit(UpdateIntent::ServicesReady(services), version);
            }
            Notification::ServicesUpdated(None) => {
                debug!("Empty services update, nothing to pull");
            }
            Notification::AttackDistributionUpdated(Some(scores)) => {
                let version = self.stamp();
                self.commit(UpdateIntent::AttackDistributionReady(scores), version);
            }
            Notification::AttackDistributionUpdated(None) => {
                self.spawn_pull(Resource::AttackDistribution)
            }
        }
    }

    fn stamp(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }

    /// Issue a pull; its result comes back through the command queue.
    fn spawn_pull(&mut self, resource: Resource) {
        let Some(tx) = self.loopback.upgrade() else {
            debug!("Store shutting down, not pulling {}", resource);
            return;
        };
        let version = self.stamp();
        let backend = Arc::clone(&self.backend);

        debug!("Pulling {} (version {})", resource, version);
        tokio::spawn(async move {
            let result = backend.fetch(resource).await;
            let pulled = Command::Pulled {
                resource,
                version,
                result,
            };
            if tx.send(pulled).await.is_err() {
                debug!("Store stopped, dropping pull of {}", resource);
            }
        });
    }

    fn commit(&mut self, intent: UpdateIntent, version: u64) {
        let field = intent.field();
        let applied = self.applied.get(&field).copied().unwrap_or(0);
        if version <= applied {
            debug!(
                "Discarding stale {:?} (version {} <= {})",
                field, version, applied
            );
            self.status.stale_discarded += 1;
            self.publish_status();
            return;
        }

        self.set_state(StoreState::Committing);

        let cascade = field == Field::SecurityEvents;
        intent.apply_to(&mut self.snapshot);
        self.applied.insert(field, version);

        let now = Utc::now();
        self.snapshot.last_update = Some(now);
        self.status.commits += 1;
        self.status.last_success = Some(now);

        if let Err(e) = self.storage.save(&self.snapshot) {
            warn!("Failed to persist snapshot: {}", e);
            self.status.last_error = Some(e.to_string());
        }

        self.snapshot_tx.send_replace(Arc::new(self.snapshot.clone()));
        self.set_state(StoreState::Idle);

        if cascade {
            self.spawn_pull(Resource::AttackDistribution);
        }
    }

    fn record_failure(&mut self, resource: Resource, error: SyncError) {
        match &error {
            SyncError::SoftApiFailure { .. } => {
                warn!("Backend could not produce {}: {}", resource, error)
            }
            _ => warn!("Skipping update of {}: {}", resource, error),
        }
        self.mark_skipped(1, error.to_string());
    }

    fn mark_skipped(&mut self, count: u64, reason: String) {
        self.status.skipped_updates += count;
        self.status.last_failure = Some(Utc::now());
        self.status.last_error = Some(reason);
        self.publish_status();
    }

    fn set_state(&mut self, state: StoreState) {
        trace!("Store {:?} -> {:?}", self.status.state, state);
        self.status.state = state;
        self.publish_status();
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.status.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccessEvent, HealthRecord, Operation, SecurityEvent};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[derive(Clone)]
    enum Scripted {
        Ok(Payload),
        Soft(Operation),
        Down,
    }

    #[derive(Default)]
    struct FakeBackend {
        script: Mutex<HashMap<Resource, Scripted>>,
        gates: Mutex<HashMap<Resource, oneshot::Receiver<()>>>,
        calls: Mutex<Vec<Resource>>,
    }

    impl FakeBackend {
        fn respond(&self, resource: Resource, response: Scripted) {
            self.script.lock().unwrap().insert(resource, response);
        }

        fn gate(&self, resource: Resource) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(resource, rx);
            tx
        }

        fn calls(&self) -> Vec<Resource> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn fetch(&self, resource: Resource) -> Result<Payload, SyncError> {
            self.calls.lock().unwrap().push(resource);
            let gate = self.gates.lock().unwrap().remove(&resource);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            let scripted = self.script.lock().unwrap().get(&resource).cloned();
            match scripted {
                Some(Scripted::Ok(payload)) => Ok(payload),
                Some(Scripted::Soft(status)) => Err(SyncError::SoftApiFailure { resource, status }),
                Some(Scripted::Down) | None => Err(SyncError::Network {
                    resource,
                    reason: "connection refused".to_string(),
                }),
            }
        }
    }

    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn save(&self, _: &Snapshot) -> Result<(), SyncError> {
            Err(SyncError::Persistence("disk full".to_string()))
        }
        fn load(&self) -> Result<Option<Snapshot>, SyncError> {
            Ok(None)
        }
        fn clear(&self) -> Result<(), SyncError> {
            Ok(())
        }
    }

    fn start(backend: &Arc<FakeBackend>, initial: Snapshot) -> (StoreHandle, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let handle = SyncStore::spawn(
            backend.clone(),
            Box::new(storage.clone()),
            initial,
            16,
        );
        (handle, storage)
    }

    async fn wait_until<T: Clone>(rx: &mut watch::Receiver<T>, pred: impl FnMut(&T) -> bool) -> T {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
            .await
            .expect("timed out waiting for store")
            .expect("store stopped")
            .clone()
    }

    fn access_events(n: usize) -> Vec<AccessEvent> {
        (0..n)
            .map(|i| AccessEvent {
                id: format!("tx-{}", i),
                ..Default::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_security_push_ranks_and_pulls_distribution() {
        let backend = Arc::new(FakeBackend::default());
        backend.respond(
            Resource::AttackDistribution,
            Scripted::Ok(Payload::AttackDistribution(
                [("sqli".to_string(), 0.9)].into_iter().collect(),
            )),
        );
        let (handle, _) = start(&backend, Snapshot::default());
        let mut snapshots = handle.watch();

        handle
            .notify(Notification::SecurityLogUpdated(Some(vec![SecurityEvent::from_ip(
                "1.2.3.4",
            )])))
            .unwrap();

        let snapshot = wait_until(&mut snapshots, |s| s.blocked_count() == 1).await;
        assert_eq!(snapshot.security_events().len(), 1);
        assert_eq!(
            snapshot.attack_sources().entries(),
            &[("1.2.3.4".to_string(), 1)]
        );
        assert_eq!(snapshot.total_count(), 1);

        let snapshot = wait_until(&mut snapshots, |s| !s.attack_distribution().is_empty()).await;
        assert_eq!(snapshot.attack_distribution().get("sqli"), Some(&0.9));
        assert_eq!(backend.calls(), vec![Resource::AttackDistribution]);
    }

    #[tokio::test]
    async fn test_access_push_pulls_authoritative_list() {
        let backend = Arc::new(FakeBackend::default());
        backend.respond(
            Resource::AuthorizedEvents,
            Scripted::Ok(Payload::AuthorizedEvents(access_events(2))),
        );
        let (handle, storage) = start(&backend, Snapshot::default());
        let mut snapshots = handle.watch();

        handle
            .notify(Notification::AccessLogUpdated)
            .unwrap();

        let snapshot = wait_until(&mut snapshots, |s| s.last_update.is_some()).await;
        assert_eq!(snapshot.allowed_count(), 2);
        assert_eq!(
            snapshot.total_count(),
            snapshot.allowed_count() + snapshot.blocked_count()
        );
        assert_eq!(backend.calls(), vec![Resource::AuthorizedEvents]);
        assert_eq!(storage.load().unwrap().as_ref(), Some(&*snapshot));
    }

    #[tokio::test]
    async fn test_repeated_access_pull_is_idempotent() {
        let backend = Arc::new(FakeBackend::default());
        backend.respond(
            Resource::AuthorizedEvents,
            Scripted::Ok(Payload::AuthorizedEvents(access_events(3))),
        );
        let (handle, _) = start(&backend, Snapshot::default());
        let mut status = handle.watch_status();

        handle.refresh(Resource::AuthorizedEvents).await.unwrap();
        wait_until(&mut status, |s| s.commits == 1).await;
        let mut first = (*handle.snapshot()).clone();

        handle.refresh(Resource::AuthorizedEvents).await.unwrap();
        wait_until(&mut status, |s| s.commits == 2).await;
        let mut second = (*handle.snapshot()).clone();

        first.last_update = None;
        second.last_update = None;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_soft_failure_leaves_snapshot_untouched() {
        let backend = Arc::new(FakeBackend::default());
        backend.respond(
            Resource::AuthorizedEvents,
            Scripted::Soft(Operation::EventFetchingFailure),
        );

        let mut initial = Snapshot::default();
        initial.replace_access_events(access_events(4));
        initial.last_update = Some(Utc::now() - chrono::Duration::minutes(1));

        let (handle, storage) = start(&backend, initial.clone());
        let mut status = handle.watch_status();

        handle.refresh(Resource::AuthorizedEvents).await.unwrap();
        let status = wait_until(&mut status, |s| s.skipped_updates == 1).await;

        assert_eq!(*handle.snapshot(), initial);
        assert_eq!(status.commits, 0);
        assert!(status.last_error.unwrap().contains("EventFetchingFailure"));
        assert_eq!(storage.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_network_failure_marks_stale() {
        let backend = Arc::new(FakeBackend::default());
        backend.respond(Resource::Health, Scripted::Down);
        let (handle, _) = start(&backend, Snapshot::default());
        let mut status = handle.watch_status();

        handle
            .notify(Notification::HealthUpdated(None))
            .unwrap();
        let status = wait_until(&mut status, |s| s.skipped_updates == 1).await;

        assert!(handle.snapshot().health().is_empty());
        assert!(status.is_stale(Utc::now(), chrono::Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_slow_pull_does_not_overwrite_newer_push() {
        let backend = Arc::new(FakeBackend::default());
        backend.respond(
            Resource::Health,
            Scripted::Ok(Payload::Health(vec![HealthRecord(json!(1.0))])),
        );
        let release = backend.gate(Resource::Health);
        let (handle, _) = start(&backend, Snapshot::default());
        let mut status = handle.watch_status();

        handle.refresh(Resource::Health).await.unwrap();
        handle
            .notify(Notification::HealthUpdated(Some(vec![HealthRecord(json!(2.0))])))
            .unwrap();
        wait_until(&mut status, |s| s.commits == 1).await;

        release.send(()).unwrap();
        wait_until(&mut status, |s| s.stale_discarded == 1).await;

        assert_eq!(handle.snapshot().health(), &[HealthRecord(json!(2.0))]);
    }

    #[tokio::test]
    async fn test_tunnel_connection_triggers_resync() {
        let backend = Arc::new(FakeBackend::default());
        let (handle, _) = start(&backend, Snapshot::default());
        let mut status = handle.watch_status();

        handle
            .notify(Notification::TunnelConnected { deployed_at: None })
            .unwrap();
        wait_until(&mut status, |s| s.skipped_updates == 3).await;
        assert!(handle.status().cluster_connected);

        let mut calls = backend.calls();
        calls.sort_by_key(|r| r.path());
        assert_eq!(
            calls,
            vec![Resource::AuthorizedEvents, Resource::Health, Resource::SecurityEvents]
        );

        handle.notify(Notification::TunnelDisconnected).unwrap();
        wait_until(&mut status, |s| !s.cluster_connected).await;
    }

    #[tokio::test]
    async fn test_empty_services_push_clears_registry() {
        let backend = Arc::new(FakeBackend::default());
        let mut initial = Snapshot::default();
        initial.replace_services(
            [("redis".to_string(), crate::models::ServiceRecord(json!("up")))]
                .into_iter()
                .collect(),
        );
        let (handle, _) = start(&backend, initial);
        let mut status = handle.watch_status();

        handle
            .notify(Notification::ServicesUpdated(Some(Default::default())))
            .unwrap();
        wait_until(&mut status, |s| s.commits == 1).await;

        assert!(handle.snapshot().services().is_empty());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_memory_commit() {
        let backend = Arc::new(FakeBackend::default());
        let handle = SyncStore::spawn(backend, Box::new(BrokenStore), Snapshot::default(), 4);
        let mut status = handle.watch_status();

        handle
            .notify(Notification::ServicesUpdated(Some(
                [("redis".to_string(), crate::models::ServiceRecord(json!("up")))]
                    .into_iter()
                    .collect(),
            )))
            .unwrap();

        let status = wait_until(&mut status, |s| s.commits == 1 && s.state == StoreState::Idle).await;
        assert!(status.last_error.unwrap().contains("disk full"));
        assert!(handle.snapshot().services().contains_key("redis"));
    }
}
