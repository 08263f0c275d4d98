//! Internal implementation of the canonical UUID service.

use std::fmt;
use uuid::Uuid;

/// Canonical UUID representation (32 lowercase hex characters, no hyphens).
///
/// Its textual form is always the canonical one. Identity tokens generated by the editor core
/// are produced through [`UuidService::new`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UuidService(Uuid);

impl Default for UuidService {
    fn default() -> Self {
        Self::new()
    }
}

impl UuidService {
    /// Generates a new UUID in canonical form.
    ///
    /// The generated UUID follows RFC 4122 version 4, which makes collisions between tokens
    /// generated in the same process (or across processes) vanishingly unlikely.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UuidService {
    /// Formats the UUID in canonical form (32 lowercase hex characters, no hyphens).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}
