use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::watch::Domain;
use crate::watch::ReloadCallback;
use crate::Result;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Reload hook that records every invocation, for asserting exactly-once
/// semantics.
#[derive(Debug, Default)]
pub struct RecordingCallback {
    calls: Mutex<Vec<(Domain, String)>>,
    /// When set, every reload returns this error message
    pub fail_with: Option<String>,
}

impl RecordingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        })
    }

    pub async fn calls(&self) -> Vec<(Domain, String)> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn count_for(
        &self,
        domain: Domain,
        key_name: &str,
    ) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(d, k)| *d == domain && k == key_name)
            .count()
    }
}

#[async_trait]
impl ReloadCallback for RecordingCallback {
    async fn reload(
        &self,
        domain: Domain,
        key_name: &str,
    ) -> Result<()> {
        self.calls
            .lock()
            .await
            .push((domain, key_name.to_string()));
        if let Some(message) = &self.fail_with {
            return Err(crate::Error::Fatal(message.clone()));
        }
        Ok(())
    }
}
