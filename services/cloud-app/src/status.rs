//! Shared update-status snapshot exposed by the status API.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tokio::sync::RwLock;

/// Point-in-time view of the update pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateStatus {
    pub status: Phase,
    pub message: String,
    pub last_update: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Success,
    Error,
}

/// Cloneable handle to the shared status.
#[derive(Clone)]
pub struct StatusHandle {
    inner: Arc<RwLock<UpdateStatus>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(UpdateStatus {
                status: Phase::Idle,
                message: "Application started".to_string(),
                last_update: None,
                error: None,
            })),
        }
    }

    pub async fn snapshot(&self) -> UpdateStatus {
        self.inner.read().await.clone()
    }

    pub async fn set_running(&self, message: &str) {
        let mut status = self.inner.write().await;
        status.status = Phase::Running;
        status.message = message.to_string();
        status.error = None;
    }

    /// Mark the pipeline finished and stamp `last_update` with local time.
    pub async fn set_success(&self) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let mut status = self.inner.write().await;
        status.status = Phase::Success;
        status.message = format!("Update completed at {stamp}");
        status.last_update = Some(stamp);
        status.error = None;
    }

    pub async fn set_error(&self, message: &str) {
        let mut status = self.inner.write().await;
        status.status = Phase::Error;
        status.message = message.to_string();
        status.error = Some(message.to_string());
    }
}

impl Default for StatusHandle {
    fn default() -> Self {
        Self::new()
    }
}
