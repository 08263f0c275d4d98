//! FHIR `Extension` domain and wire models.
//!
//! The `value[x]` variants that questionnaire extensions use in practice are modelled:
//! `valueString`, `valueCode`, `valueBoolean` and `valueInteger`. Any other `value[x]`
//! (`valueCodeableConcept`, `valueDecimal`, ...) is carried opaquely as
//! [`ExtensionValue::Other`]. An extension may also carry no value at all (for example a
//! freshly added custom extension loaded back from disk).

use crate::{FhirError, OtherElements};
use serde::{Deserialize, Serialize};

/// Prefix shared by every `value[x]` element name.
const VALUE_PREFIX: &str = "value";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for a single FHIR extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extension {
    /// Element id. FHIR allows it on every element; most documents leave it out.
    pub id: Option<String>,

    /// Canonical URL identifying what the extension means.
    pub url: String,

    /// The `value[x]` payload, if any.
    pub value: ExtensionValue,

    /// Elements not modelled here (nested `extension`, primitive `_` siblings), kept verbatim.
    pub other: OtherElements,
}

impl Extension {
    /// Builds an extension carrying a `valueString`.
    pub fn string(url: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            url: url.into(),
            value: ExtensionValue::String(value.into()),
            other: OtherElements::new(),
        }
    }

    /// Returns the non-empty element id, if present.
    pub fn element_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// The `value[x]` choice of an [`Extension`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExtensionValue {
    /// No `value[x]` present.
    #[default]
    None,
    String(String),
    Code(String),
    Boolean(bool),
    Integer(i64),
    /// Any other `value[x]`, kept as written under its element name.
    Other {
        element: String,
        value: serde_json::Value,
    },
}

impl ExtensionValue {
    /// Returns the value as display text; an absent value reads as the empty string.
    pub fn as_text(&self) -> String {
        match self {
            ExtensionValue::None => String::new(),
            ExtensionValue::String(s) | ExtensionValue::Code(s) => s.clone(),
            ExtensionValue::Boolean(b) => b.to_string(),
            ExtensionValue::Integer(i) => i.to_string(),
            ExtensionValue::Other { value, .. } => match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of an extension.
///
/// Keys outside the modelled fields land in `other` and are written back as they came.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct ExtensionWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub url: String,

    #[serde(rename = "valueString", default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(rename = "valueCode", default, skip_serializing_if = "Option::is_none")]
    pub value_code: Option<String>,

    #[serde(rename = "valueBoolean", default, skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,

    #[serde(rename = "valueInteger", default, skip_serializing_if = "Option::is_none")]
    pub value_integer: Option<i64>,

    #[serde(flatten)]
    pub other: OtherElements,
}

// ============================================================================
// Helper functions (crate-internal)
// ============================================================================

/// Convert a wire extension to the domain carrier.
///
/// FHIR `value[x]` is a choice: more than one populated variant is a schema error.
pub(crate) fn wire_to_domain(wire: ExtensionWire) -> Result<Extension, FhirError> {
    let mut values = Vec::with_capacity(1);
    if let Some(s) = wire.value_string {
        values.push(ExtensionValue::String(s));
    }
    if let Some(c) = wire.value_code {
        values.push(ExtensionValue::Code(c));
    }
    if let Some(b) = wire.value_boolean {
        values.push(ExtensionValue::Boolean(b));
    }
    if let Some(i) = wire.value_integer {
        values.push(ExtensionValue::Integer(i));
    }

    let mut other = wire.other;
    let choice_keys: Vec<String> = other
        .keys()
        .filter(|key| key.starts_with(VALUE_PREFIX))
        .cloned()
        .collect();
    for element in choice_keys {
        if let Some(value) = other.remove(&element) {
            values.push(ExtensionValue::Other { element, value });
        }
    }

    if values.len() > 1 {
        return Err(FhirError::Translation(format!(
            "extension '{}' carries more than one value[x]",
            wire.url
        )));
    }

    Ok(Extension {
        id: wire.id,
        url: wire.url,
        value: values.pop().unwrap_or_default(),
        other,
    })
}

/// Convert a domain extension to its wire representation.
pub(crate) fn domain_to_wire(ext: &Extension) -> ExtensionWire {
    let mut wire = ExtensionWire {
        id: ext.id.clone(),
        url: ext.url.clone(),
        value_string: None,
        value_code: None,
        value_boolean: None,
        value_integer: None,
        other: ext.other.clone(),
    };

    match &ext.value {
        ExtensionValue::None => {}
        ExtensionValue::String(s) => wire.value_string = Some(s.clone()),
        ExtensionValue::Code(c) => wire.value_code = Some(c.clone()),
        ExtensionValue::Boolean(b) => wire.value_boolean = Some(*b),
        ExtensionValue::Integer(i) => wire.value_integer = Some(*i),
        ExtensionValue::Other { element, value } => {
            wire.other.insert(element.clone(), value.clone());
        }
    }

    wire
}
