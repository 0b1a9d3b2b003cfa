//! Short code generation.
//!
//! Codes are drawn uniformly from the 62-character alphanumeric alphabet and checked
//! for uniqueness against storage with a bounded number of attempts.

use crate::domain::repositories::MappingRepository;
use crate::error::AppError;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::json;

/// Default length of generated codes.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default number of draws before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// Draws a random code of `length` characters from `[A-Za-z0-9]`.
///
/// # Examples
///
/// ```
/// use quicklink::utils::code_generator::generate_code;
///
/// let code = generate_code(6);
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Draws codes until one is not held by any stored mapping.
///
/// A code held by an expired mapping still counts as taken.
///
/// # Errors
///
/// Returns [`AppError::GenerationExhausted`] after `max_attempts` collisions.
/// Propagates storage errors.
pub async fn generate_unique_code<R>(
    repository: &R,
    length: usize,
    max_attempts: usize,
) -> Result<String, AppError>
where
    R: MappingRepository + ?Sized,
{
    for _ in 0..max_attempts {
        let code = generate_code(length);

        if !repository.code_exists(&code).await? {
            return Ok(code);
        }

        tracing::debug!(code = %code, "Generated code collided, retrying");
    }

    Err(AppError::generation_exhausted(
        "Failed to generate unique code",
        json!({ "reason": "Too many collisions", "attempts": max_attempts }),
    ))
}
