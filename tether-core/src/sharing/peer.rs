//! Peer types for the sharing system.
//!
//! A peer is any instance that shares one or more attributes with a registry.
//! Peers hold no attribute storage; they only hold membership, anchored by a
//! unique ID.

use std::sync::atomic::{AtomicU64, Ordering};

use super::binding::SharedAttribute;
use super::error::Result;
use super::registry::{Registry, Value};

/// Unique identifier for a peer.
///
/// Each peer gets a unique ID when created. The ID is what the registry
/// stores in its listener lists, and it is how duplicate registrations for
/// the same peer-attribute pair are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(u64);

impl PeerId {
    /// Generate a new unique peer ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-instance bookkeeping anchor for a type that shares attributes.
///
/// Types that want to share attributes embed a `Peer` and create their
/// bindings explicitly in their constructor:
///
/// ```rust,ignore
/// struct Spam {
///     peer: Peer,
///     num_eggs: SharedAttribute,
/// }
///
/// impl Spam {
///     fn new(registry: &Registry) -> Result<Self> {
///         let peer = Peer::new();
///         let num_eggs = peer.bind(registry, "num_eggs", |new_value| {
///             println!("num_eggs is now {new_value}");
///         })?;
///         Ok(Self { peer, num_eggs })
///     }
/// }
/// ```
///
/// All bindings created from one `Peer` share its ID, so the registry treats
/// them as a single listener per attribute.
#[derive(Debug)]
pub struct Peer {
    id: PeerId,
}

impl Peer {
    /// Create a new peer with a fresh ID.
    pub fn new() -> Self {
        Self { id: PeerId::new() }
    }

    /// Get the peer's unique ID.
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Bind this peer to a shared attribute on `registry`.
    ///
    /// The peer joins the attribute's listener list immediately, so its
    /// `reaction` fires on every subsequent write to the attribute by any
    /// peer, this one included.
    ///
    /// Fails with [`SharingError::UnknownAttribute`](super::SharingError) if
    /// the attribute was never established, and with
    /// [`SharingError::AlreadyBound`](super::SharingError) if this peer
    /// already holds a binding for the attribute.
    pub fn bind<F>(&self, registry: &Registry, name: &str, reaction: F) -> Result<SharedAttribute>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        SharedAttribute::new(registry, name, self.id, reaction)
    }

    /// Like [`bind`](Peer::bind), but also invokes `reaction` once with the
    /// attribute's current value before returning.
    ///
    /// Mirrors the common pattern of reacting to the initial state the same
    /// way as to later changes.
    pub fn bind_with_init<F>(
        &self,
        registry: &Registry,
        name: &str,
        reaction: F,
    ) -> Result<SharedAttribute>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let binding = self.bind(registry, name, reaction)?;
        binding.call_with_current()?;
        Ok(binding)
    }
}

impl Default for Peer {
    fn default() -> Self {
        Self::new()
    }
}

/// Marker trait for types whose instances share attributes.
///
/// Implementing `Participant` is what makes a type a recognized target for
/// shared-attribute bindings: it guarantees the per-instance bookkeeping (the
/// embedded [`Peer`]) that bindings need.
pub trait Participant {
    /// Get the peer anchor for this instance.
    fn peer(&self) -> &Peer;
}
