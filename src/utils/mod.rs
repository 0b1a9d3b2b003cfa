//! Utility functions used across the application:
//!
//! - [`validators`] - URL, alias and expiry checks
//! - [`code_generator`] - Random short code generation with uniqueness retry
//! - [`client_ip`] - Client identity extraction from requests

pub mod client_ip;
pub mod code_generator;
pub mod validators;
