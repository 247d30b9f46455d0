//! Shared-Attribute Binding
//!
//! A binding is the accessor a participant uses in place of an ordinary
//! field. It wires one attribute name on one registry to one peer and its
//! reaction callback.
//!
//! # How Bindings Work
//!
//! 1. When created, the binding registers its peer and reaction with the
//!    registry, so the reaction fires on every subsequent write.
//!
//! 2. Reads delegate to the registry and always return the canonical value,
//!    never a stale per-instance copy.
//!
//! 3. Writes update the registry, which then fans out to every registered
//!    peer, including the one performing the write.
//!
//! 4. When dropped, the binding removes its peer from the attribute's
//!    listener list, so a dead peer is never notified.

use std::fmt::Debug;
use std::sync::Arc;

use super::error::{Result, SharingError};
use super::peer::PeerId;
use super::registry::{Reaction, Registry, Value};

/// An accessor for one shared attribute, bound to one peer.
///
/// Created through [`Peer::bind`](super::Peer::bind) or
/// [`Peer::bind_with_init`](super::Peer::bind_with_init).
///
/// # Example
///
/// ```rust,ignore
/// let num_eggs = peer.bind(&registry, "num_eggs", |new_value| {
///     println!("num_eggs is now {new_value}");
/// })?;
///
/// num_eggs.set(5)?;                    // notifies every peer, us included
/// assert_eq!(num_eggs.get()?, 5);      // always the registry's value
/// ```
pub struct SharedAttribute {
    registry: Registry,
    name: String,
    peer: PeerId,
    reaction: Reaction,
}

impl SharedAttribute {
    /// Create a binding and register its peer with the registry.
    ///
    /// Fails with `UnknownAttribute` if the attribute was never established,
    /// and with `AlreadyBound` if the peer already holds a binding for this
    /// attribute. In either case nothing is registered: the binding owns its
    /// listener entry exclusively, so its `Drop` can never tear down another
    /// binding's registration.
    pub(crate) fn new<F>(registry: &Registry, name: &str, peer: PeerId, reaction: F) -> Result<Self>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let reaction: Reaction = Arc::new(reaction);
        if !registry.register_reaction(name, peer, Arc::clone(&reaction))? {
            return Err(SharingError::AlreadyBound(name.to_string()));
        }

        Ok(Self {
            registry: registry.clone(),
            name: name.to_string(),
            peer,
            reaction,
        })
    }

    /// Get the attribute's current value from the registry.
    pub fn get(&self) -> Result<Value> {
        self.registry.get(&self.name)
    }

    /// Set the attribute's value.
    ///
    /// Updates the registry's canonical value and fans out to every
    /// registered peer's reaction, including this binding's own.
    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        self.registry.set(&self.name, value, Some(self.peer))
    }

    /// Update the value using a function of the current value.
    ///
    /// This is useful for writes that depend on the current value, like
    /// incrementing a counter.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        let new_value = f(&self.get()?);
        self.set(new_value)
    }

    /// Invoke this binding's own reaction with the attribute's current
    /// value. Backs `bind_with_init`.
    pub(crate) fn call_with_current(&self) -> Result<()> {
        let value = self.get()?;
        (self.reaction)(&value);
        Ok(())
    }

    /// Get the attribute name this binding is for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the ID of the peer this binding belongs to.
    pub fn peer(&self) -> PeerId {
        self.peer
    }
}

impl Drop for SharedAttribute {
    fn drop(&mut self) {
        self.registry.unregister_peer(&self.name, self.peer);
    }
}

impl Debug for SharedAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedAttribute")
            .field("name", &self.name)
            .field("peer", &self.peer)
            .field("value", &self.get().ok())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
