//! Core domain entities.
//!
//! - [`Mapping`] - A stored short code → URL association
//! - [`NewMapping`] - Input for creating a mapping
//! - [`StoreSummary`] - Store-wide totals used by the admin tooling

pub mod mapping;

pub use mapping::{Mapping, NewMapping, StoreSummary};
