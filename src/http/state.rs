use crate::pipeline::Pipeline;
use crate::session::ScanHandle;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Scan sessions started through the API (session_id → handle)
    pub sessions: Arc<RwLock<HashMap<String, Arc<ScanHandle>>>>,

    /// Session factory and shared collaborators
    pub pipeline: Pipeline,

    /// How long a finished session stays readable through the status endpoint
    pub retention: Duration,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            pipeline,
            retention: Duration::from_secs(300),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Forget sessions that finished more than `retention` ago
    ///
    /// Returns how many were removed.
    pub async fn prune_finished(&self) -> usize {
        let handles: Vec<(String, Arc<ScanHandle>)> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
                .collect()
        };

        let now = Utc::now();
        let mut expired = Vec::new();
        for (id, handle) in handles {
            let Some(finished_at) = handle.finished_at().await else {
                continue;
            };
            let age = now.signed_duration_since(finished_at).to_std();
            if age.map_or(false, |age| age >= self.retention) {
                expired.push(id);
            }
        }

        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        for id in &expired {
            sessions.remove(id);
        }
        debug!("Pruned {} finished scan sessions", expired.len());
        expired.len()
    }
}
