//! Identifier generation
//!
//! Session and todo handles are random strings over the 64-symbol URL-safe
//! alphabet `A-Z a-z 0-9 _ -`, drawn from the thread-local CSPRNG.

use rand::RngCore;

/// Default session handle length
pub const DEFAULT_SESSION_ID_LENGTH: usize = 21;

/// Default todo handle length
pub const DEFAULT_TODO_ID_LENGTH: usize = 12;

const URL_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Source of random handles
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    /// Produce a random URL-safe string of exactly `length` characters
    fn generate(&self, length: usize) -> String;
}

/// CSPRNG-backed generator used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn generate(&self, length: usize) -> String {
        generate_id(length)
    }
}

/// Generate a random URL-safe id of `length` characters.
///
/// The alphabet has exactly 64 symbols, so masking a random byte to its low
/// six bits selects each symbol with equal probability.
#[must_use]
pub fn generate_id(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
        .into_iter()
        .map(|b| URL_ALPHABET[(b & 63) as usize] as char)
        .collect()
}
