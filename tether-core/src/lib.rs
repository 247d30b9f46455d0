//! Tether Core
//!
//! This crate provides the core runtime for the Tether attribute-sharing
//! library. It implements:
//!
//! - A central registry that owns canonical values for named attributes
//! - Peer identities and the participant marker for types that share them
//! - Shared-attribute bindings with synchronous change fan-out
//!
//! # Architecture
//!
//! The crate is organized around a single module:
//!
//! - `sharing`: the registry, peer, and binding primitives
//!
//! # Example
//!
//! ```rust,ignore
//! use tether_core::sharing::{Peer, Registry};
//!
//! // Create a registry and establish an attribute
//! let registry = Registry::new();
//! registry.set_default("num_eggs", 3)?;
//!
//! // Bind a peer to the attribute with a reaction callback
//! let peer = Peer::new();
//! let num_eggs = peer.bind(&registry, "num_eggs", |new_value| {
//!     println!("num_eggs is now {new_value}");
//! })?;
//!
//! // Writing through the binding updates the registry and notifies
//! // every bound peer, including this one.
//! num_eggs.set(5)?;
//! ```

pub mod sharing;
