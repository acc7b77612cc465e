//! Change-detection hashing for the stash key-value store.
//!
//! Provides a domain-separated XXH3-128 content hasher and the [`Digest`]
//! it produces. The digest is used only to decide whether persisted state
//! and in-memory state differ; it carries no security property and
//! collisions are tolerated.

pub mod digest;
pub mod hasher;

pub use digest::Digest;
pub use hasher::{ContentHasher, HasherError};
