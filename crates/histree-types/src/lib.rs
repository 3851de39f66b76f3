//! Foundation types for histree.
//!
//! This crate provides the identity, temporal, and structural types used
//! throughout the versioned object graph. Every other histree crate depends
//! on `histree-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`] -- content address of one serialized object state (BLAKE3)
//! - [`ScopeId`] / [`EntityId`] / [`TypeTag`] -- names for graph instances,
//!   tracked objects, and registered domain types
//! - [`NodeId`] -- UUID v7 commit node identifier
//! - [`Stamp`] -- commit timestamp with a logical tiebreaker
//! - [`ContentRef`] -- a (type, entity, hash) triple identifying one object's
//!   state at one point in history

pub mod error;
pub mod hash;
pub mod ident;
pub mod node;
pub mod refs;
pub mod stamp;

pub use error::TypeError;
pub use hash::ContentHash;
pub use ident::{EntityId, ScopeId, TypeTag};
pub use node::NodeId;
pub use refs::ContentRef;
pub use stamp::Stamp;
