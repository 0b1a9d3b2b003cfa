//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization. Input validation lives
//! in the shorten service so that every entry point applies the same rules.

pub mod health;
pub mod shorten;
pub mod stats;
