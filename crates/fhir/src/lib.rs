//! FHIR wire/boundary support for the questionnaire editor.
//!
//! This crate provides **wire models** and **format/translation helpers** for FHIR
//! `Questionnaire` resources:
//! - YAML and JSON text (FHIR property names, e.g. `linkId`, `valueString`)
//!
//! This crate focuses on:
//! - FHIR semantic alignment for the parts of `Questionnaire` the editor understands
//! - serialisation/deserialisation with path-aware schema errors
//! - carrying every other element through a load/save cycle unchanged
//! - translation between domain-level carriers and wire structs
//!
//! It knows nothing about editing. The `qedit-core` crate builds its tree store from
//! [`QuestionnaireData`] and hands one back for rendering.

pub mod extension;
pub mod questionnaire;

// Re-export facades
pub use questionnaire::Questionnaire;

// Re-export public domain-level types
pub use extension::{Extension, ExtensionValue};
pub use questionnaire::{
    ItemData, ItemType, QuestionnaireData, QuestionnaireMetadata, QuestionnaireStatus,
};

/// Elements of a FHIR object that the wire model does not name, keyed by element name.
pub type OtherElements = serde_json::Map<String, serde_json::Value>;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
