//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated via
//! `mockall` for unit tests.
//!
//! See integration tests in `tests/repository_mapping.rs` for usage examples.

pub mod mapping_repository;

pub use mapping_repository::{MappingRepository, ORIGINAL_URL_CONSTRAINT, SHORT_CODE_CONSTRAINT};

#[cfg(test)]
pub use mapping_repository::MockMappingRepository;
