//! Registry Implementation
//!
//! The registry is the "source of truth" for shared attributes. It owns the
//! canonical value for each attribute name and the ordered list of peers
//! currently sharing it.
//!
//! # How the Registry Works
//!
//! 1. An attribute is established with `set_default` before first use.
//!
//! 2. Peers register a reaction callback for an attribute. Registration
//!    order is preserved and determines fan-out order.
//!
//! 3. When an attribute is written, the stored value is updated first and
//!    then every registered reaction is invoked with the new value. The
//!    writer is notified like any other peer.
//!
//! # Thread Safety
//!
//! A single lock guards both the value map and the listener lists. The lock
//! is released before reactions run: the write takes a snapshot of the
//! listener list and invokes the callbacks lock-free. This lets a reaction
//! read the attribute it was notified about (it sees the new value) and
//! even write shared attributes, which triggers nested fan-out.
//!
//! # Memory Layout
//!
//! Each registry consists of:
//! - An insertion-ordered map from attribute name to its entry
//! - Per entry: the current value and a small inline listener list

use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::error::{Result, SharingError};
use super::peer::PeerId;

/// The value type for shared attributes.
///
/// Attributes are dynamically typed: a single registry can hold numbers,
/// strings, booleans, or structured data side by side.
pub type Value = serde_json::Value;

/// A reaction callback, invoked with the new value on every write to the
/// attribute it is registered for.
///
/// The peer instance itself is captured by the closure; the registry only
/// sees the callback and the peer's ID.
pub type Reaction = Arc<dyn Fn(&Value) + Send + Sync>;

/// One registered peer for one attribute.
struct Listener {
    peer: PeerId,
    reaction: Reaction,
}

/// A shared attribute's canonical state: its value and its listeners.
struct Entry {
    value: Value,
    /// Listeners in registration order. Most attributes have a handful of
    /// peers, so the list is kept inline.
    listeners: SmallVec<[Listener; 4]>,
}

/// The central store for shared attributes.
///
/// Cloning a `Registry` is cheap and produces a handle to the same shared
/// state, so a registry can be handed to any number of peers.
///
/// # Example
///
/// ```rust,ignore
/// let registry = Registry::new();
/// registry.set_default("num_eggs", 3)?;
///
/// assert_eq!(registry.get("num_eggs")?, 3);
///
/// registry.set("num_eggs", 5, None)?;
/// assert_eq!(registry.get("num_eggs")?, 5);
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RwLock<IndexMap<String, Entry>>>,
}

impl Registry {
    /// Create a new registry with no attributes.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Establish `name` as a known shared attribute with an initial value.
    ///
    /// Establishing is rejecting, not idempotent: if `name` already has a
    /// value this fails with [`SharingError::DuplicateDefault`] and the
    /// existing value is left untouched.
    pub fn set_default(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.contains_key(name) {
            return Err(SharingError::DuplicateDefault(name.to_string()));
        }

        let value = value.into();
        debug!(attribute = name, %value, "default established");
        inner.insert(
            name.to_string(),
            Entry {
                value,
                listeners: SmallVec::new(),
            },
        );
        Ok(())
    }

    /// Get the current value for `name`.
    ///
    /// Fails with [`SharingError::UnknownAttribute`] if `name` was never
    /// established.
    pub fn get(&self, name: &str) -> Result<Value> {
        let inner = self.inner.read();
        inner
            .get(name)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| SharingError::UnknownAttribute(name.to_string()))
    }

    /// Update the stored value for `name`, then invoke the reaction of every
    /// registered peer with the new value, in registration order.
    ///
    /// The `writer` (the peer performing the write, if any) is included in
    /// the fan-out: its reaction fires like everyone else's. The value is
    /// stored before any reaction runs, so by the time a reaction fires,
    /// [`get`](Registry::get) already returns the new value.
    ///
    /// Reactions run synchronously on the caller's stack. A reaction that
    /// panics aborts the fan-out to not-yet-notified listeners. Listener
    /// changes made during the fan-out take effect from the next write.
    pub fn set(&self, name: &str, value: impl Into<Value>, writer: Option<PeerId>) -> Result<()> {
        let value = value.into();

        // Store the new value and snapshot the listeners, then release the
        // lock before any user code runs.
        let reactions: Vec<Reaction> = {
            let mut inner = self.inner.write();
            let entry = inner
                .get_mut(name)
                .ok_or_else(|| SharingError::UnknownAttribute(name.to_string()))?;
            entry.value = value.clone();
            entry
                .listeners
                .iter()
                .map(|listener| Arc::clone(&listener.reaction))
                .collect()
        };

        debug!(
            attribute = name,
            %value,
            writer = ?writer,
            listeners = reactions.len(),
            "attribute updated"
        );

        for reaction in reactions {
            trace!(attribute = name, "invoking reaction");
            reaction(&value);
        }

        Ok(())
    }

    /// Add `peer` with its `reaction` to the listener list for `name`.
    ///
    /// Registration order is preserved for fan-out order. Registering the
    /// same peer twice for one attribute is a no-op: the original reaction
    /// is kept and the peer is never notified more than once per write.
    ///
    /// Fails with [`SharingError::UnknownAttribute`] if `name` was never
    /// established.
    pub fn register_peer<F>(&self, name: &str, peer: PeerId, reaction: F) -> Result<()>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.register_reaction(name, peer, Arc::new(reaction))
            .map(|_| ())
    }

    /// `register_peer` for an already-shared reaction. Used by bindings,
    /// which keep their own handle to the callback.
    ///
    /// Returns whether the peer was newly added; `false` means the peer was
    /// already registered and the existing reaction was kept.
    pub(crate) fn register_reaction(
        &self,
        name: &str,
        peer: PeerId,
        reaction: Reaction,
    ) -> Result<bool> {
        let mut inner = self.inner.write();
        let entry = inner
            .get_mut(name)
            .ok_or_else(|| SharingError::UnknownAttribute(name.to_string()))?;

        if entry.listeners.iter().any(|listener| listener.peer == peer) {
            return Ok(false);
        }

        trace!(attribute = name, peer = ?peer, "peer registered");
        entry.listeners.push(Listener { peer, reaction });
        Ok(true)
    }

    /// Remove `peer` from the listener list for `name`.
    ///
    /// A no-op when the attribute does not exist or the peer was never
    /// registered for it.
    pub fn unregister_peer(&self, name: &str, peer: PeerId) {
        let mut inner = self.inner.write();
        if let Some(entry) = inner.get_mut(name) {
            let before = entry.listeners.len();
            entry.listeners.retain(|listener| listener.peer != peer);
            if entry.listeners.len() != before {
                trace!(attribute = name, peer = ?peer, "peer unregistered");
            }
        }
    }

    /// Check whether `name` has been established.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    /// Get the established attribute names, in establishment order.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    /// Get the number of peers registered for `name`.
    ///
    /// Returns 0 for attributes that were never established.
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner
            .read()
            .get(name)
            .map(|entry| entry.listeners.len())
            .unwrap_or(0)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        let mut map = f.debug_map();
        for (name, entry) in inner.iter() {
            map.entry(&name, &entry.value);
        }
        map.finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn set_default_then_get() {
        let registry = Registry::new();
        registry.set_default("num_eggs", 3).unwrap();

        assert_eq!(registry.get("num_eggs").unwrap(), 3);
        assert!(registry.contains("num_eggs"));
    }

    #[test]
    fn set_default_rejects_duplicates() {
        let registry = Registry::new();
        registry.set_default("num_eggs", 3).unwrap();

        let err = registry.set_default("num_eggs", 7).unwrap_err();
        assert_eq!(err, SharingError::DuplicateDefault("num_eggs".to_string()));

        // The first default wins.
        assert_eq!(registry.get("num_eggs").unwrap(), 3);
    }

    #[test]
    fn get_unknown_attribute_fails() {
        let registry = Registry::new();

        let err = registry.get("num_eggs").unwrap_err();
        assert_eq!(err, SharingError::UnknownAttribute("num_eggs".to_string()));
    }

    #[test]
    fn set_unknown_attribute_fails() {
        let registry = Registry::new();

        let err = registry.set("num_eggs", 5, None).unwrap_err();
        assert_eq!(err, SharingError::UnknownAttribute("num_eggs".to_string()));
    }

    #[test]
    fn set_updates_value_and_notifies() {
        let registry = Registry::new();
        registry.set_default("num_eggs", 3).unwrap();

        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        registry
            .register_peer("num_eggs", PeerId::new(), move |new_value| {
                assert_eq!(*new_value, 5);
                call_count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        registry.set("num_eggs", 5, None).unwrap();

        assert_eq!(registry.get("num_eggs").unwrap(), 5);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn value_is_stored_before_fanout() {
        let registry = Registry::new();
        registry.set_default("num_eggs", 3).unwrap();

        let registry_clone = registry.clone();
        registry
            .register_peer("num_eggs", PeerId::new(), move |new_value| {
                // A reaction that reads the attribute sees the value that
                // triggered it, never the previous one.
                assert_eq!(registry_clone.get("num_eggs").unwrap(), *new_value);
            })
            .unwrap();

        registry.set("num_eggs", 5, None).unwrap();
        registry.set("num_eggs", 7, None).unwrap();
    }

    #[test]
    fn register_peer_unknown_attribute_fails() {
        let registry = Registry::new();

        let err = registry
            .register_peer("num_eggs", PeerId::new(), |_| {})
            .unwrap_err();
        assert_eq!(err, SharingError::UnknownAttribute("num_eggs".to_string()));
    }

    #[test]
    fn register_peer_deduplicates_by_id() {
        let registry = Registry::new();
        registry.set_default("num_eggs", 3).unwrap();

        let peer = PeerId::new();
        let call_count = Arc::new(AtomicI32::new(0));

        for _ in 0..3 {
            let call_count_clone = call_count.clone();
            registry
                .register_peer("num_eggs", peer, move |_| {
                    call_count_clone.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        assert_eq!(registry.listener_count("num_eggs"), 1);

        registry.set("num_eggs", 5, None).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fanout_runs_in_registration_order() {
        let registry = Registry::new();
        registry.set_default("num_eggs", 3).unwrap();

        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for tag in 0..3 {
            let order_clone = order.clone();
            registry
                .register_peer("num_eggs", PeerId::new(), move |_| {
                    order_clone.lock().push(tag);
                })
                .unwrap();
        }

        registry.set("num_eggs", 5, None).unwrap();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn unregister_peer_stops_notifications() {
        let registry = Registry::new();
        registry.set_default("num_eggs", 3).unwrap();

        let peer = PeerId::new();
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        registry
            .register_peer("num_eggs", peer, move |_| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        registry.set("num_eggs", 5, None).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        registry.unregister_peer("num_eggs", peer);
        registry.set("num_eggs", 7, None).unwrap();

        // Should not have been called again
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.listener_count("num_eggs"), 0);
    }

    #[test]
    fn unregister_unknown_peer_is_a_noop() {
        let registry = Registry::new();
        registry.set_default("num_eggs", 3).unwrap();

        registry.unregister_peer("num_eggs", PeerId::new());
        registry.unregister_peer("never_established", PeerId::new());
    }

    #[test]
    fn registry_clone_shares_state() {
        let registry1 = Registry::new();
        let registry2 = registry1.clone();

        registry1.set_default("num_eggs", 3).unwrap();
        assert_eq!(registry2.get("num_eggs").unwrap(), 3);

        registry2.set("num_eggs", 42, None).unwrap();
        assert_eq!(registry1.get("num_eggs").unwrap(), 42);
    }

    #[test]
    fn names_preserve_establishment_order() {
        let registry = Registry::new();
        registry.set_default("num_eggs", 3).unwrap();
        registry.set_default("ham", true).unwrap();
        registry.set_default("num_sausages", 5).unwrap();

        assert_eq!(registry.names(), vec!["num_eggs", "ham", "num_sausages"]);
    }

    #[test]
    fn attributes_hold_heterogeneous_values() {
        let registry = Registry::new();
        registry.set_default("num_eggs", 3).unwrap();
        registry.set_default("ham", true).unwrap();
        registry.set_default("label", "spam").unwrap();

        assert_eq!(registry.get("num_eggs").unwrap(), 3);
        assert_eq!(registry.get("ham").unwrap(), true);
        assert_eq!(registry.get("label").unwrap(), "spam");
    }
}
