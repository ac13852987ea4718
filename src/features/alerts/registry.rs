//! # Feature: Alarm Registry
//!
//! Process-wide one-shot wake-up facility backing the reminder scheduler.
//! Registrations are keyed by trigger key in a concurrent map; each one
//! spawns a sleep task that delivers a [`FiredAlert`] over an mpsc channel
//! when its instant arrives. A deadline in the past fires immediately.
//!
//! The map is the only registered-trigger state in the process: a probe
//! answers from the map, and a fired or cancelled registration leaves no
//! residue.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use dashmap::DashMap;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::channel::AlertChannel;

/// What a wake-up carries: enough to render the notification without any
/// further store lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmPayload {
    pub channel: AlertChannel,
    pub notification_id: i64,
    pub message: String,
}

/// A wake-up that reached its instant.
#[derive(Debug, Clone)]
pub struct FiredAlert {
    pub payload: AlarmPayload,
    pub fired_at: DateTime<Local>,
}

/// Errors from the registry itself.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("alarm delivery channel is closed")]
    DeliveryClosed,
}

struct AlarmEntry {
    generation: u64,
    fire_at: DateTime<Local>,
    handle: Option<JoinHandle<()>>,
}

/// Concurrent registry of pending one-shot alarms. Clones share state.
#[derive(Clone)]
pub struct AlarmRegistry {
    entries: Arc<DashMap<i64, AlarmEntry>>,
    generations: Arc<AtomicU64>,
    delivery: mpsc::UnboundedSender<FiredAlert>,
}

impl AlarmRegistry {
    /// Create a registry and the receiving end of its delivery channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FiredAlert>) {
        let (delivery, receiver) = mpsc::unbounded_channel();
        let registry = AlarmRegistry {
            entries: Arc::new(DashMap::new()),
            generations: Arc::new(AtomicU64::new(0)),
            delivery,
        };
        (registry, receiver)
    }

    /// Register a one-shot wake-up for `key`, replacing any pending one.
    ///
    /// A `fire_at` that already passed fires on the next scheduler tick.
    pub fn register(
        &self,
        key: i64,
        fire_at: DateTime<Local>,
        payload: AlarmPayload,
    ) -> Result<(), RegistryError> {
        if self.delivery.is_closed() {
            return Err(RegistryError::DeliveryClosed);
        }

        // Replace semantics: drop any pending registration first.
        self.cancel(key);

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let delay = fire_at
            .signed_duration_since(Local::now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        // The entry must exist before the task runs, or an immediate fire
        // would find nothing to remove and get dropped.
        self.entries.insert(
            key,
            AlarmEntry {
                generation,
                fire_at,
                handle: None,
            },
        );

        let entries = Arc::clone(&self.entries);
        let delivery = self.delivery.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // A fired task only removes its own generation; a concurrent
            // replace or cancel means this wake-up no longer owns the key.
            let owned = entries
                .remove_if(&key, |_, entry| entry.generation == generation)
                .is_some();
            if owned {
                let _ = delivery.send(FiredAlert {
                    payload,
                    fired_at: Local::now(),
                });
            }
        });

        // The task may already have fired and removed the entry; only a
        // still-pending registration of this generation keeps the handle.
        if let Some(mut entry) = self.entries.get_mut(&key) {
            if entry.generation == generation {
                entry.handle = Some(handle);
            }
        }

        debug!("Registered alarm {key} for {fire_at}");
        Ok(())
    }

    /// Read-only probe: is a wake-up pending for `key`? Never registers.
    pub fn lookup(&self, key: i64) -> bool {
        self.entries.contains_key(&key)
    }

    /// The pending instant for `key`, if any.
    pub fn fire_time(&self, key: i64) -> Option<DateTime<Local>> {
        self.entries.get(&key).map(|entry| entry.fire_at)
    }

    /// Cancel any pending wake-up for `key`. A missing key is a no-op.
    pub fn cancel(&self, key: i64) {
        if let Some((_, entry)) = self.entries.remove(&key) {
            if let Some(handle) = entry.handle {
                handle.abort();
            }
            debug!("Cancelled alarm {key}");
        }
    }

    /// Number of pending registrations.
    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    fn payload(id: i64) -> AlarmPayload {
        AlarmPayload {
            channel: AlertChannel::Course,
            notification_id: id,
            message: format!("alarm {id}"),
        }
    }

    fn far_future() -> DateTime<Local> {
        Local::now() + chrono::Duration::days(30)
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let (registry, _rx) = AlarmRegistry::new();

        assert!(!registry.lookup(1));
        registry.register(1, far_future(), payload(1)).unwrap();
        assert!(registry.lookup(1));
        assert_eq!(registry.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let (registry, _rx) = AlarmRegistry::new();

        registry.register(1, far_future(), payload(1)).unwrap();
        registry.cancel(1);
        assert!(!registry.lookup(1));

        // Cancelling again, or a never-registered key, must not panic.
        registry.cancel(1);
        registry.cancel(999);
    }

    #[tokio::test]
    async fn test_past_deadline_fires_immediately() {
        let (registry, mut rx) = AlarmRegistry::new();

        let yesterday = Local::now() - chrono::Duration::days(1);
        registry.register(7, yesterday, payload(7)).unwrap();

        let fired = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("alarm should fire promptly")
            .expect("delivery channel open");
        assert_eq!(fired.payload.notification_id, 7);
        assert!(!registry.lookup(7));
    }

    #[tokio::test]
    async fn test_replace_keeps_one_registration() {
        let (registry, _rx) = AlarmRegistry::new();

        registry.register(1, far_future(), payload(1)).unwrap();
        registry
            .register(1, far_future() + chrono::Duration::days(1), payload(1))
            .unwrap();

        assert!(registry.lookup(1));
        assert_eq!(registry.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_alarm_never_delivers() {
        let (registry, mut rx) = AlarmRegistry::new();

        registry.register(1, far_future(), payload(1)).unwrap();
        registry.cancel(1);

        // Nothing pending, so nothing may arrive.
        let outcome = timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(outcome.is_err(), "cancelled alarm must not fire");
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (registry, mut rx) = AlarmRegistry::new();

        registry.register(1, far_future(), payload(1)).unwrap();
        registry
            .register(2, Local::now() - chrono::Duration::hours(1), payload(2))
            .unwrap();

        let fired = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("past alarm should fire")
            .expect("delivery channel open");
        assert_eq!(fired.payload.notification_id, 2);

        // Key 1 is untouched by key 2 firing.
        assert!(registry.lookup(1));
    }

    #[tokio::test]
    async fn test_closed_delivery_rejects_registration() {
        let (registry, rx) = AlarmRegistry::new();
        drop(rx);

        let result = registry.register(1, far_future(), payload(1));
        assert!(matches!(result, Err(RegistryError::DeliveryClosed)));
        assert!(!registry.lookup(1));
    }
}
