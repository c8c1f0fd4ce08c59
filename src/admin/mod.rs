//! Administration Module
//!
//! Mutating endpoints for the back office: free-product configuration CRUD
//! and catalog management (products, categories, collections, banners,
//! testimonials, order status). Authentication sits in front of these
//! routes at the deployment boundary, not in this crate.

pub mod handlers;
pub mod protocol;
