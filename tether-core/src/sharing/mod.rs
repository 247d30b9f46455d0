//! Attribute Sharing Primitives
//!
//! This module implements the core sharing system: the registry, peers, and
//! shared-attribute bindings.
//!
//! # Concepts
//!
//! ## Registry
//!
//! A [`Registry`] owns the canonical value for each named attribute and the
//! list of peers currently sharing it. Attributes must be established with a
//! default value before first use. Writing an attribute updates the stored
//! value first and then notifies every registered peer, so a reaction that
//! reads the attribute always observes the value that triggered it.
//!
//! ## Peers
//!
//! A [`Peer`] is the per-instance bookkeeping anchor for a type that shares
//! attributes. Peers hold no attribute storage of their own; the value and
//! its identity live in the registry. Types embed a `Peer` and expose it
//! through the [`Participant`] trait.
//!
//! ## Bindings
//!
//! A [`SharedAttribute`] wires one attribute name on one registry to one
//! peer and its reaction callback. Reads delegate to the registry; writes
//! update the registry and fan out to every bound peer, including the
//! writer. Bindings are created explicitly in a participant's constructor
//! rather than through any global lookup.
//!
//! ## Fan-out
//!
//! Notification is synchronous: all reactions run to completion on the
//! writer's own call stack, in registration order, before the write returns.
//! Reactions may themselves read or write shared attributes; re-entrant
//! fan-out is permitted and unbounded.

mod binding;
mod error;
mod peer;
mod registry;

pub use binding::SharedAttribute;
pub use error::{Result, SharingError};
pub use peer::{Participant, Peer, PeerId};
pub use registry::{Reaction, Registry, Value};
