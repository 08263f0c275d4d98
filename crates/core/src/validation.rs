//! Read-only index over externally produced validation errors.
//!
//! The questionnaire validator runs elsewhere and reports errors as `(linkId, errorProperty,
//! index)` locations. The editor only consults them to decide whether an extension row should
//! be rendered in an error state; it never adds or clears entries.

use crate::constants::CODE_ERROR_PROPERTY_PREFIX;
use crate::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};

/// One error location reported by the validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub link_id: String,
    pub index: usize,
    pub error_property: String,
    #[serde(default)]
    pub error_readable_text: String,
}

impl ValidationError {
    /// Whether this error flags an extension row at `index`.
    pub fn is_code_error(&self) -> bool {
        self.error_property.starts_with(CODE_ERROR_PROPERTY_PREFIX)
    }
}

/// The validator's current error list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    /// Parse a YAML sequence of error locations.
    pub fn from_yaml(yaml_text: &str) -> EditorResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        serde_path_to_error::deserialize::<_, Vec<ValidationError>>(deserializer)
            .map(Self::new)
            .map_err(|e| {
                EditorError::InvalidDocument(format!(
                    "validation errors mismatch at {}: {}",
                    e.path(),
                    e.inner()
                ))
            })
    }

    /// Parse a JSON array of error locations.
    pub fn from_json(json_text: &str) -> EditorResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        serde_path_to_error::deserialize::<_, Vec<ValidationError>>(&mut deserializer)
            .map(Self::new)
            .map_err(|e| {
                EditorError::InvalidDocument(format!(
                    "validation errors mismatch at {}: {}",
                    e.path(),
                    e.inner()
                ))
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors reported against one item.
    pub fn for_item<'a>(&'a self, link_id: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.link_id == link_id)
    }

    /// Whether the extension row at `index` of `link_id` should render in an error state.
    pub fn has_code_error(&self, link_id: &str, index: usize) -> bool {
        self.for_item(link_id)
            .any(|e| e.is_code_error() && e.index == index)
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::new(errors)
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
