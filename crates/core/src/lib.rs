//! # qedit Core
//!
//! Core editing logic for questionnaire item extensions.
//!
//! This crate holds the questionnaire state and the protocol that changes it:
//! - the tree item store (`linkId -> item`) built from a parsed FHIR questionnaire
//! - add / update / delete actions on an item's custom extensions, applied by a pure reducer
//! - stable identity tokens for extension entries, assigned on first observation
//! - a read-only index over externally produced validation errors
//!
//! **No I/O**: reading and writing questionnaire files, and reading the environment, belong to
//! the binaries. Parsing and rendering text lives in the `fhir` crate; the store only wraps it.

pub mod action;
pub mod config;
pub mod constants;
pub mod editor;
pub mod extension;
pub mod identity;
pub mod tree;
pub mod validation;

mod error;

pub use action::{
    parse_action_log_json, parse_action_log_yaml, reduce, render_action_log_yaml, try_reduce,
    Action, AppliedChange, ChangeKind,
};
pub use config::EditorConfig;
pub use editor::{Editor, ExtensionRow};
pub use error::{EditorError, EditorResult};
pub use extension::{
    select_options, CustomExtensionKind, ExtensionEntry, ExtensionOption, ExtensionProperty,
};
pub use identity::{assign_identities, IdentityProjection, TokenSource, UuidTokenSource};
pub use tree::{TreeItem, TreeItemStore};
pub use validation::{ValidationError, ValidationErrors};
