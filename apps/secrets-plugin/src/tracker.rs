//! Table of secrets the plugin has delivered and may need to rotate

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use secrets::{Fingerprint, SecretInfo};
use tokio::sync::RwLock;

/// Concurrency-safe map from logical secret name to [`SecretInfo`].
///
/// Cloning is cheap and clones share the same table. No I/O happens while
/// the lock is held, and entries are only handed out as copies.
#[derive(Debug, Clone, Default)]
pub struct SecretTracker {
    inner: Arc<RwLock<BTreeMap<String, SecretInfo>>>,
}

/// What `track` records about a delivered value
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    pub name: &'a str,
    pub path: &'a str,
    pub field: &'a str,
    pub service: &'a str,
    pub provider: &'a str,
    pub value: &'a [u8],
}

impl SecretTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh an entry. Returns true when the name was not
    /// tracked before.
    ///
    /// Consumers are only ever added; path, field and fingerprint always
    /// follow the latest delivery.
    pub async fn track(&self, delivery: Delivery<'_>) -> bool {
        let fingerprint = Fingerprint::of(delivery.value);
        let mut table = self.inner.write().await;

        match table.get_mut(delivery.name) {
            Some(info) => {
                info.add_service(delivery.service);
                info.path = delivery.path.to_string();
                info.field = delivery.field.to_string();
                info.provider = delivery.provider.to_string();
                info.fingerprint = fingerprint;
                info.last_updated = Utc::now();
                false
            }
            None => {
                let mut info = SecretInfo::new(
                    delivery.name,
                    delivery.path,
                    delivery.field,
                    delivery.provider,
                    fingerprint,
                );
                info.add_service(delivery.service);
                table.insert(delivery.name.to_string(), info);
                true
            }
        }
    }

    /// Copy of every entry, ordered by name
    pub async fn snapshot(&self) -> Vec<SecretInfo> {
        self.inner.read().await.values().cloned().collect()
    }

    pub async fn get(&self, name: &str) -> Option<SecretInfo> {
        self.inner.read().await.get(name).cloned()
    }

    /// Record a completed rotation. Returns false if the name is unknown.
    pub async fn update_after_rotation(
        &self,
        name: &str,
        object_name: &str,
        fingerprint: Fingerprint,
    ) -> bool {
        let mut table = self.inner.write().await;
        match table.get_mut(name) {
            Some(info) => {
                info.object_name = object_name.to_string();
                info.fingerprint = fingerprint;
                info.last_updated = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
