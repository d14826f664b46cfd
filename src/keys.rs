//! Signing key material, its durable store boundary, and timed rotation.

pub mod material;
pub mod rotation;
pub mod store;
