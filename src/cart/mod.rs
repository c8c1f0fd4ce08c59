//! Shopping Cart Module
//!
//! Cart operations and the free-product eligibility engine.
//!
//! ## Core Concepts
//! - **Eligibility window**: a free-flagged item may be added or changed
//!   only while the cart's non-free subtotal lies inside the configured
//!   inclusive `[min, max]` range (`engine::CartService`).
//! - **Re-validation**: the window is checked on the initial add and on
//!   every later quantity update, never retroactively on other cart
//!   changes.
//! - **Serialization**: per-cart advisory locks close the read-then-write
//!   race between concurrent mutations of the same cart.

pub mod engine;
pub mod handlers;
pub mod protocol;

#[cfg(test)]
mod tests;
