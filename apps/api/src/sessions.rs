use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::gateway::ReportGateway;
use crate::orchestrator::Orchestrator;
use crate::storage::{snapshot_key, SnapshotStore};

/// How often the background sweep looks for idle sessions.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct SessionEntry {
    orchestrator: Arc<Orchestrator>,
    last_access: Instant,
}

/// Live orchestrators keyed by session id. Nothing is shared between sessions
/// except the gateway and the snapshot store. Sessions untouched for longer
/// than the idle timeout are dropped; their saved snapshots stay in the store.
pub struct SessionRegistry {
    gateway: Arc<dyn ReportGateway>,
    store: Arc<dyn SnapshotStore>,
    include_skip_analysis: bool,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(
        gateway: Arc<dyn ReportGateway>,
        store: Arc<dyn SnapshotStore>,
        include_skip_analysis: bool,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            store,
            include_skip_analysis,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn gateway(&self) -> &dyn ReportGateway {
        self.gateway.as_ref()
    }

    /// Starts a fresh session.
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.get_or_create(id).await;
        info!(session = %id, "Session created");
        id
    }

    /// The orchestrator for a live session, refreshing its idle timer.
    pub async fn get(&self, id: Uuid) -> Option<Arc<Orchestrator>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_access = Instant::now();
        Some(entry.orchestrator.clone())
    }

    /// The orchestrator for `id`. Unknown ids get a new idle session, so a
    /// client that kept its id across a restart can still load its snapshot.
    pub async fn get_or_create(&self, id: Uuid) -> Arc<Orchestrator> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(id).or_insert_with(|| SessionEntry {
            orchestrator: Arc::new(Orchestrator::new(
                self.gateway.clone(),
                self.store.clone(),
                snapshot_key(&id),
                self.include_skip_analysis,
            )),
            last_access: Instant::now(),
        });
        entry.last_access = Instant::now();
        entry.orchestrator.clone()
    }

    /// Drops sessions idle for longer than the timeout. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_access) <= self.idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Runs `evict_idle` every `period` until the runtime shuts down.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = self.evict_idle().await;
                debug!(evicted, "Session sweep finished");
            }
        })
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
