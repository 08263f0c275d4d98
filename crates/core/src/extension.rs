//! Custom extension entries and the recognised extension kinds.
//!
//! A *custom extension* is any FHIR extension on an item whose url starts with the configured
//! vendor namespace. The custom extensions of an item form an ordered sub-sequence of its full
//! extension array; indices into that sub-sequence are how actions address entries.

use fhir::Extension;
use serde::{Deserialize, Serialize};

// ============================================================================
// Recognised kinds
// ============================================================================

/// The recognised custom extension kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CustomExtensionKind {
    ExternalThreshold,
    EncounterThreshold,
    ExternalAggregatedThreshold,
    EncounterAggregatedThreshold,
}

impl CustomExtensionKind {
    /// All kinds in presentation order. The first one is the default for new entries.
    pub const ALL: [CustomExtensionKind; 4] = [
        CustomExtensionKind::ExternalThreshold,
        CustomExtensionKind::EncounterThreshold,
        CustomExtensionKind::ExternalAggregatedThreshold,
        CustomExtensionKind::EncounterAggregatedThreshold,
    ];

    /// Kind given to entries created by an add action.
    pub fn default_kind() -> Self {
        Self::ALL[0]
    }

    /// URL suffix under the vendor namespace.
    pub fn slug(self) -> &'static str {
        match self {
            CustomExtensionKind::ExternalThreshold => "external-threshold",
            CustomExtensionKind::EncounterThreshold => "encounter-threshold",
            CustomExtensionKind::ExternalAggregatedThreshold => "external-aggregated-threshold",
            CustomExtensionKind::EncounterAggregatedThreshold => "encounter-aggregated-threshold",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            CustomExtensionKind::ExternalThreshold => "External Threshold",
            CustomExtensionKind::EncounterThreshold => "Encounter Threshold",
            CustomExtensionKind::ExternalAggregatedThreshold => "External Aggregated Threshold",
            CustomExtensionKind::EncounterAggregatedThreshold => "Encounter Aggregated Threshold",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    /// Full extension URL under `namespace`.
    pub fn url(self, namespace: &str) -> String {
        format!("{namespace}{}", self.slug())
    }

    /// Recognise a full extension URL under `namespace`.
    pub fn from_url(namespace: &str, url: &str) -> Option<Self> {
        url.strip_prefix(namespace).and_then(Self::from_slug)
    }
}

/// Resolve a requested url to the canonical full URL of a recognised kind.
///
/// Accepts either the full URL (`<namespace><slug>`) or the bare slug. Anything else is not a
/// recognised kind and yields `None`.
pub fn resolve_extension_url(namespace: &str, requested: &str) -> Option<String> {
    let requested = requested.trim();
    CustomExtensionKind::from_url(namespace, requested)
        .or_else(|| CustomExtensionKind::from_slug(requested))
        .map(|kind| kind.url(namespace))
}

/// One selectable kind, as offered to a presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtensionOption {
    /// Full extension URL.
    pub code: String,
    pub display: &'static str,
}

/// The recognised kinds under `namespace`, in presentation order.
pub fn select_options(namespace: &str) -> Vec<ExtensionOption> {
    CustomExtensionKind::ALL
        .into_iter()
        .map(|kind| ExtensionOption {
            code: kind.url(namespace),
            display: kind.label(),
        })
        .collect()
}

// ============================================================================
// Entries
// ============================================================================

/// Which field of an entry an update action replaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtensionProperty {
    Url,
    #[serde(alias = "valueString")]
    Value,
}

/// One custom extension as seen by the editing layer.
///
/// `id` is `None` in the raw projection when the document carries no element id. Entries
/// returned by the editor always have it set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtensionEntry {
    pub id: Option<String>,
    pub url: String,
    pub value: String,
}

impl ExtensionEntry {
    /// The identity token, or `""` before identities were assigned.
    pub fn token(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn has_identity(&self) -> bool {
        !self.token().is_empty()
    }

    pub fn kind(&self, namespace: &str) -> Option<CustomExtensionKind> {
        CustomExtensionKind::from_url(namespace, &self.url)
    }

    fn from_extension(ext: &Extension) -> Self {
        Self {
            id: ext.element_id().map(str::to_string),
            url: ext.url.clone(),
            value: ext.value.as_text(),
        }
    }
}

pub(crate) fn is_custom(namespace: &str, url: &str) -> bool {
    url.starts_with(namespace)
}

/// Positions in the full extension array of the custom extensions, in order.
pub(crate) fn custom_positions(namespace: &str, extensions: &[Extension]) -> Vec<usize> {
    extensions
        .iter()
        .enumerate()
        .filter(|(_, ext)| is_custom(namespace, &ext.url))
        .map(|(pos, _)| pos)
        .collect()
}

/// The raw custom-extension sequence of an extension array, ids as found in the document.
pub fn custom_entries(namespace: &str, extensions: &[Extension]) -> Vec<ExtensionEntry> {
    extensions
        .iter()
        .filter(|ext| is_custom(namespace, &ext.url))
        .map(ExtensionEntry::from_extension)
        .collect()
}
