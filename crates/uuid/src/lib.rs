//! Canonical UUID utilities for qedit.
//!
//! qedit hands out generated identity tokens for questionnaire extension entries that arrive
//! without an `id`. Tokens are UUID v4 values in a *canonical* textual form:
//! **32 lowercase hexadecimal characters** (no hyphens).
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! This is the same value you would get from `Uuid::new_v4().simple().to_string()`.

mod service;

pub use service::UuidService;
