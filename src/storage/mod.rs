//! Persistence Module
//!
//! Implements one uniform CRUD interface over interchangeable backends.
//!
//! ## Core Concepts
//! - **Contract**: the [`backend::Storage`] trait covers every entity the
//!   platform persists; absent records are `Ok(None)`, never errors.
//! - **Backends**: [`memory::MemoryStore`] (process-local maps) and
//!   [`remote::RedisStore`] (JSON documents in Redis) implement the same
//!   trait.
//! - **Failover**: [`fallback::FallbackStorage`] wraps both and switches
//!   between them at runtime based on connection-state events, so every
//!   operation transparently degrades to local memory when the remote is
//!   unreachable.

pub mod backend;
pub mod fallback;
pub mod memory;
pub mod remote;
pub mod types;

#[cfg(test)]
mod tests;
