//! Page clients known to the gateway.

use portico_core::cache::CacheName;
use portico_core::ids::ClientId;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Result of registering a page client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRegistration {
    pub id: ClientId,
    /// Version controlling the client, `None` while uncontrolled.
    pub controller: Option<CacheName>,
}

/// Bounds on the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientLimits {
    pub max_clients: usize,
    /// Clients not seen for this long are dropped.
    pub idle_timeout: Duration,
}

impl Default for ClientLimits {
    fn default() -> Self {
        Self {
            max_clients: 1024,
            idle_timeout: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
struct ClientEntry {
    controller: Option<CacheName>,
    last_seen: Instant,
}

/// Registered page clients and the version controlling each.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientId, ClientEntry>>,
    limits: ClientLimits,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ClientLimits) -> Self {
        Self {
            clients: RwLock::default(),
            limits,
        }
    }

    /// Add a client, controlled by `controller` if a version is active.
    ///
    /// Idle clients are dropped first; at capacity the least recently seen
    /// client makes room.
    pub async fn register(&self, controller: Option<CacheName>) -> ClientRegistration {
        let id = ClientId::new();
        let now = Instant::now();
        let mut clients = self.clients.write().await;

        let idle_timeout = self.limits.idle_timeout;
        clients.retain(|_, entry| now.duration_since(entry.last_seen) < idle_timeout);

        while clients.len() >= self.limits.max_clients.max(1) {
            let oldest = clients
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    debug!(client = %oldest, "Evicting least recently seen client");
                    clients.remove(&oldest);
                }
                None => break,
            }
        }

        clients.insert(
            id,
            ClientEntry {
                controller: controller.clone(),
                last_seen: now,
            },
        );
        ClientRegistration { id, controller }
    }

    /// Mark a client as still alive. Returns its registration, `None` if it
    /// is unknown or has expired.
    pub async fn touch(&self, id: &ClientId) -> Option<ClientRegistration> {
        let mut clients = self.clients.write().await;
        let entry = clients.get_mut(id)?;
        if entry.last_seen.elapsed() >= self.limits.idle_timeout {
            clients.remove(id);
            return None;
        }
        entry.last_seen = Instant::now();
        Some(ClientRegistration {
            id: *id,
            controller: entry.controller.clone(),
        })
    }

    /// Forget a client. Returns whether it was registered.
    pub async fn unregister(&self, id: &ClientId) -> bool {
        self.clients.write().await.remove(id).is_some()
    }

    /// `None` for unknown clients; `Some(None)` for uncontrolled ones.
    pub async fn controller_of(&self, id: &ClientId) -> Option<Option<CacheName>> {
        self.clients
            .read()
            .await
            .get(id)
            .map(|entry| entry.controller.clone())
    }

    /// Put every registered client under `version`. Returns how many
    /// changed controller.
    pub async fn claim(&self, version: &CacheName) -> usize {
        let mut clients = self.clients.write().await;
        let mut changed = 0;
        for entry in clients.values_mut() {
            if entry.controller.as_ref() != Some(version) {
                entry.controller = Some(version.clone());
                changed += 1;
            }
        }
        changed
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_claim_takes_over_uncontrolled_and_old_clients() {
        let registry = ClientRegistry::new();
        let v1 = CacheName::from("portal-v1");
        let v2 = CacheName::from("portal-v2");

        let fresh = registry.register(None).await;
        let old = registry.register(Some(v1.clone())).await;
        let current = registry.register(Some(v2.clone())).await;

        assert_eq!(registry.claim(&v2).await, 2);
        for client in [fresh, old, current] {
            assert_eq!(registry.controller_of(&client.id).await, Some(Some(v2.clone())));
        }

        assert_eq!(registry.claim(&v2).await, 0);
        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn test_unknown_client() {
        let registry = ClientRegistry::new();
        assert_eq!(registry.controller_of(&ClientId::new()).await, None);
        assert!(!registry.unregister(&ClientId::new()).await);
        assert_eq!(registry.touch(&ClientId::new()).await, None);
    }

    #[tokio::test]
    async fn test_unregister_removes_client() {
        let registry = ClientRegistry::new();
        let client = registry.register(None).await;

        assert!(registry.unregister(&client.id).await);
        assert!(!registry.unregister(&client.id).await);
        assert_eq!(registry.controller_of(&client.id).await, None);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_registry_is_capped() {
        let registry = ClientRegistry::with_limits(ClientLimits {
            max_clients: 3,
            ..Default::default()
        });

        let first = registry.register(None).await;
        let second = registry.register(None).await;
        let third = registry.register(None).await;
        assert!(registry.touch(&first.id).await.is_some());

        for _ in 0..10 {
            registry.register(None).await;
        }
        assert_eq!(registry.len().await, 3);
        assert_eq!(registry.controller_of(&second.id).await, None);
        assert_eq!(registry.controller_of(&third.id).await, None);
    }

    #[tokio::test]
    async fn test_idle_clients_expire() {
        let registry = ClientRegistry::with_limits(ClientLimits {
            idle_timeout: Duration::from_millis(20),
            ..Default::default()
        });
        let stale = registry.register(None).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(registry.touch(&stale.id).await, None);

        let other = registry.register(None).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        let fresh = registry.register(None).await;
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.controller_of(&other.id).await, None);
        assert_eq!(registry.controller_of(&fresh.id).await, Some(None));
    }
}
