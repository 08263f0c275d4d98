//! FHIR-aligned Questionnaire wire models and translation helpers.
//!
//! This module provides both domain-level types and wire models for `Questionnaire`
//! resources: a metadata header plus a tree of items, each identified by a `linkId`.
//!
//! Responsibilities:
//! - Define public domain-level types for the editor core
//! - Define a wire model for serialisation/deserialisation (YAML and JSON)
//! - Provide translation helpers between domain carriers and the wire model
//!
//! Notes:
//! - Only the parts of `Questionnaire` the editor works with are typed; every other element
//!   (item `code`, `answerOption`, `enableWhen`, `initial`, ...) is kept as [`OtherElements`]
//!   and written back unchanged
//! - Typed fields are still checked, and a mismatch names the failing path
//! - Item-level validation (unique `linkId`s and so on) belongs to the editor core

use crate::extension::{self, ExtensionWire};
use crate::{Extension, FhirError, OtherElements};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const RESOURCE_TYPE: &str = "Questionnaire";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Publication status of a questionnaire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionnaireStatus {
    /// Still being authored.
    Draft,
    /// Ready for use.
    Active,
    /// Withdrawn.
    Retired,
    /// Status not known.
    Unknown,
}

/// Kind of a questionnaire item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
    Group,
    Display,
    Boolean,
    Decimal,
    Integer,
    Date,
    DateTime,
    Time,
    String,
    Text,
    Url,
    Choice,
    #[serde(rename = "open-choice")]
    OpenChoice,
    Attachment,
    Reference,
    Quantity,
}

/// Questionnaire header fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionnaireMetadata {
    pub id: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub status: Option<QuestionnaireStatus>,
    pub publisher: Option<String>,
    pub language: Option<String>,

    /// `meta.lastUpdated`.
    pub last_updated: Option<DateTime<Utc>>,

    /// `meta.profile`.
    pub profiles: Vec<String>,

    /// Other `meta` elements (`versionId`, `source`, `tag`, ...).
    pub meta_other: OtherElements,

    /// `subjectType`: resource types that can be subjects of a response.
    pub subject_types: Vec<String>,

    /// `useContext` entries, kept as written.
    pub use_context: Vec<serde_json::Value>,

    /// `contact` entries, kept as written.
    pub contacts: Vec<serde_json::Value>,

    /// Questionnaire-level extensions.
    pub extensions: Vec<Extension>,

    /// Remaining resource elements, kept as written.
    pub other: OtherElements,
}

/// Domain-level carrier for one questionnaire item and its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemData {
    /// Stable key of the item, unique within the questionnaire.
    pub link_id: String,
    pub text: Option<String>,
    pub item_type: ItemType,
    pub required: Option<bool>,
    pub repeats: Option<bool>,

    /// Extensions in document order.
    pub extensions: Vec<Extension>,

    /// Nested child items in document order.
    pub items: Vec<ItemData>,

    /// Item elements the editor does not model (`code`, `answerOption`, `enableWhen`, ...).
    pub other: OtherElements,
}

impl ItemData {
    /// Creates an item with no text, flags, extensions or children.
    pub fn new(link_id: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            link_id: link_id.into(),
            text: None,
            item_type,
            required: None,
            repeats: None,
            extensions: Vec::new(),
            items: Vec::new(),
            other: OtherElements::new(),
        }
    }
}

/// Domain-level carrier for a whole questionnaire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionnaireData {
    pub metadata: QuestionnaireMetadata,

    /// Top-level items in document order.
    pub items: Vec<ItemData>,
}

// ============================================================================
// Public Questionnaire operations
// ============================================================================

/// Questionnaire resource operations.
///
/// This is a zero-sized type used for namespacing questionnaire-related operations.
/// All methods are associated functions.
pub struct Questionnaire;

impl Questionnaire {
    /// Parse a questionnaire from YAML text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g.
    /// `item[0].extension[1].url`) to the failing field when the YAML does not match the wire
    /// schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - a typed field does not match the wire schema (wrong type, unknown item type),
    /// - `resourceType` is not `"Questionnaire"`,
    /// - an extension carries more than one `value[x]`,
    /// - `meta.lastUpdated` is not an RFC 3339 timestamp.
    pub fn parse_yaml(yaml_text: &str) -> Result<QuestionnaireData, FhirError> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = serde_path_to_error::deserialize::<_, QuestionnaireWire>(deserializer)
            .map_err(schema_mismatch)?;

        wire_to_domain(wire)
    }

    /// Parse a questionnaire from JSON text.
    ///
    /// Same checks as [`Questionnaire::parse_yaml`].
    pub fn parse_json(json_text: &str) -> Result<QuestionnaireData, FhirError> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let wire = serde_path_to_error::deserialize::<_, QuestionnaireWire>(&mut deserializer)
            .map_err(schema_mismatch)?;
        deserializer.end()?;

        wire_to_domain(wire)
    }

    /// Render a questionnaire as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if serialisation fails.
    pub fn render_yaml(data: &QuestionnaireData) -> Result<String, FhirError> {
        let wire = domain_to_wire(data);
        serde_yaml::to_string(&wire)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise questionnaire: {e}")))
    }

    /// Render a questionnaire as pretty-printed JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if serialisation fails.
    pub fn render_json(data: &QuestionnaireData) -> Result<String, FhirError> {
        let wire = domain_to_wire(data);
        serde_json::to_string_pretty(&wire)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise questionnaire: {e}")))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of a questionnaire.
///
/// This is the exact structure serialised to/from text. Each struct collects the keys it does
/// not name in a flattened `other` map so they survive the round trip.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct QuestionnaireWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<ExtensionWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QuestionnaireStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "subjectType", default, skip_serializing_if = "Vec::is_empty")]
    pub subject_type: Vec<String>,

    #[serde(rename = "useContext", default, skip_serializing_if = "Vec::is_empty")]
    pub use_context: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<ItemWire>,

    #[serde(flatten)]
    pub other: OtherElements,
}

/// Wire representation of resource metadata.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct MetaWire {
    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,

    #[serde(flatten)]
    pub other: OtherElements,
}

/// Wire representation of a questionnaire item.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct ItemWire {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<ExtensionWire>,

    #[serde(rename = "linkId")]
    pub link_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(rename = "type")]
    pub item_type: ItemType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeats: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<ItemWire>,

    #[serde(flatten)]
    pub other: OtherElements,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn schema_mismatch<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> FhirError {
    let path = err.path().to_string();
    let source = err.into_inner();
    let path = if path.is_empty() || path == "." {
        "<root>"
    } else {
        path.as_str()
    };
    FhirError::Translation(format!(
        "Questionnaire schema mismatch at {path}: {source}"
    ))
}

/// Convert wire format questionnaire to domain types.
fn wire_to_domain(wire: QuestionnaireWire) -> Result<QuestionnaireData, FhirError> {
    if wire.resource_type != RESOURCE_TYPE {
        return Err(FhirError::InvalidInput(format!(
            "Expected resourceType '{RESOURCE_TYPE}', got '{}'",
            wire.resource_type
        )));
    }

    let (last_updated, profiles, meta_other) = match wire.meta {
        Some(meta) => {
            let last_updated = meta
                .last_updated
                .map(|s| {
                    s.parse::<DateTime<Utc>>().map_err(|e| {
                        FhirError::Translation(format!("Invalid meta.lastUpdated '{s}': {e}"))
                    })
                })
                .transpose()?;
            (last_updated, meta.profile, meta.other)
        }
        None => (None, Vec::new(), OtherElements::new()),
    };

    let extensions = wire
        .extension
        .into_iter()
        .map(extension::wire_to_domain)
        .collect::<Result<Vec<_>, FhirError>>()?;

    let items = wire
        .item
        .into_iter()
        .map(item_wire_to_domain)
        .collect::<Result<Vec<_>, FhirError>>()?;

    Ok(QuestionnaireData {
        metadata: QuestionnaireMetadata {
            id: wire.id,
            url: wire.url,
            name: wire.name,
            title: wire.title,
            description: wire.description,
            version: wire.version,
            status: wire.status,
            publisher: wire.publisher,
            language: wire.language,
            last_updated,
            profiles,
            meta_other,
            subject_types: wire.subject_type,
            use_context: wire.use_context,
            contacts: wire.contact,
            extensions,
            other: wire.other,
        },
        items,
    })
}

fn item_wire_to_domain(wire: ItemWire) -> Result<ItemData, FhirError> {
    let extensions = wire
        .extension
        .into_iter()
        .map(extension::wire_to_domain)
        .collect::<Result<Vec<_>, FhirError>>()?;

    let items = wire
        .item
        .into_iter()
        .map(item_wire_to_domain)
        .collect::<Result<Vec<_>, FhirError>>()?;

    Ok(ItemData {
        link_id: wire.link_id,
        text: wire.text,
        item_type: wire.item_type,
        required: wire.required,
        repeats: wire.repeats,
        extensions,
        items,
        other: wire.other,
    })
}

/// Convert domain types to wire format questionnaire.
fn domain_to_wire(data: &QuestionnaireData) -> QuestionnaireWire {
    let metadata = &data.metadata;
    let has_meta = metadata.last_updated.is_some()
        || !metadata.profiles.is_empty()
        || !metadata.meta_other.is_empty();
    let meta = if has_meta {
        Some(MetaWire {
            last_updated: metadata
                .last_updated
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            profile: metadata.profiles.clone(),
            other: metadata.meta_other.clone(),
        })
    } else {
        None
    };

    QuestionnaireWire {
        resource_type: RESOURCE_TYPE.to_string(),
        id: metadata.id.clone(),
        meta,
        language: metadata.language.clone(),
        extension: metadata
            .extensions
            .iter()
            .map(extension::domain_to_wire)
            .collect(),
        url: metadata.url.clone(),
        version: metadata.version.clone(),
        name: metadata.name.clone(),
        title: metadata.title.clone(),
        status: metadata.status,
        publisher: metadata.publisher.clone(),
        description: metadata.description.clone(),
        subject_type: metadata.subject_types.clone(),
        use_context: metadata.use_context.clone(),
        contact: metadata.contacts.clone(),
        item: data.items.iter().map(item_domain_to_wire).collect(),
        other: metadata.other.clone(),
    }
}

fn item_domain_to_wire(item: &ItemData) -> ItemWire {
    ItemWire {
        extension: item
            .extensions
            .iter()
            .map(extension::domain_to_wire)
            .collect(),
        link_id: item.link_id.clone(),
        text: item.text.clone(),
        item_type: item.item_type,
        required: item.required,
        repeats: item.repeats,
        item: item.items.iter().map(item_domain_to_wire).collect(),
        other: item.other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtensionValue;

    const SAMPLE: &str = r#"resourceType: Questionnaire
id: hba1c-followup
meta:
  lastUpdated: "2026-01-11T14:35:22Z"
language: nb-no
url: "https://example.org/Questionnaire/hba1c-followup"
title: HbA1c follow-up
status: draft
publisher: Example clinic
item:
  - linkId: g1
    type: group
    text: Blood sugar
    item:
      - linkId: q1
        type: decimal
        text: Latest HbA1c
        required: true
        extension:
          - url: "https://api.diffia.com/fhir/StructureDefinition/external-threshold"
            valueString: "5"
          - id: keep-me
            url: "http://hl7.org/fhir/StructureDefinition/minValue"
            valueInteger: 0
  - linkId: q2
    type: boolean
"#;

    #[test]
    fn parses_nested_items_and_extensions() {
        let data = Questionnaire::parse_yaml(SAMPLE).expect("parse yaml");

        assert_eq!(data.metadata.id.as_deref(), Some("hba1c-followup"));
        assert_eq!(data.metadata.status, Some(QuestionnaireStatus::Draft));
        assert_eq!(data.metadata.language.as_deref(), Some("nb-no"));
        assert!(data.metadata.last_updated.is_some());

        assert_eq!(data.items.len(), 2);
        let group = &data.items[0];
        assert_eq!(group.item_type, ItemType::Group);
        assert_eq!(group.items.len(), 1);

        let q1 = &group.items[0];
        assert_eq!(q1.link_id, "q1");
        assert_eq!(q1.required, Some(true));
        assert_eq!(q1.extensions.len(), 2);
        assert_eq!(q1.extensions[0].value, ExtensionValue::String("5".into()));
        assert_eq!(q1.extensions[0].id, None);
        assert_eq!(q1.extensions[1].id.as_deref(), Some("keep-me"));
        assert_eq!(q1.extensions[1].value, ExtensionValue::Integer(0));
    }

    #[test]
    fn yaml_render_round_trips() {
        let data = Questionnaire::parse_yaml(SAMPLE).expect("parse yaml");
        let output = Questionnaire::render_yaml(&data).expect("render yaml");
        let reparsed = Questionnaire::parse_yaml(&output).expect("reparse yaml");
        assert_eq!(data, reparsed);
    }

    #[test]
    fn json_uses_fhir_property_names() {
        let data = Questionnaire::parse_yaml(SAMPLE).expect("parse yaml");
        let json = Questionnaire::render_json(&data).expect("render json");

        assert!(json.contains("\"resourceType\": \"Questionnaire\""));
        assert!(json.contains("\"linkId\": \"q1\""));
        assert!(json.contains("\"valueString\": \"5\""));

        let reparsed = Questionnaire::parse_json(&json).expect("parse json");
        assert_eq!(data, reparsed);
    }

    const WITH_UNMODELLED: &str = r#"resourceType: Questionnaire
meta:
  versionId: "3"
  lastUpdated: "2026-01-11T14:35:22Z"
status: active
subjectType:
  - Patient
useContext:
  - code:
      system: http://terminology.hl7.org/CodeSystem/usage-context-type
      code: focus
contact:
  - name: Example clinic
experimental: false
item:
  - linkId: q1
    type: choice
    code:
      - system: http://loinc.org
        code: 4548-4
    answerOption:
      - valueCoding:
          code: "yes"
    enableWhen:
      - question: q0
        operator: exists
        answerBoolean: true
    initial:
      - valueCoding:
          code: "yes"
    extension:
      - url: http://hl7.org/fhir/StructureDefinition/questionnaire-itemControl
        valueCodeableConcept:
          coding:
            - system: http://hl7.org/fhir/questionnaire-item-control
              code: drop-down
      - url: http://hl7.org/fhir/StructureDefinition/minValue
        valueDecimal: 1.5
"#;

    #[test]
    fn keeps_unmodelled_elements() {
        let data = Questionnaire::parse_yaml(WITH_UNMODELLED).expect("parse yaml");

        assert_eq!(data.metadata.subject_types, vec!["Patient".to_string()]);
        assert_eq!(data.metadata.use_context.len(), 1);
        assert_eq!(data.metadata.contacts.len(), 1);
        assert_eq!(
            data.metadata.meta_other.get("versionId"),
            Some(&serde_json::json!("3"))
        );
        assert_eq!(
            data.metadata.other.get("experimental"),
            Some(&serde_json::json!(false))
        );

        let q1 = &data.items[0];
        let code = q1.other.get("code").expect("item code kept");
        assert_eq!(code[0]["code"], serde_json::json!("4548-4"));
        assert!(q1.other.contains_key("answerOption"));
        assert!(q1.other.contains_key("enableWhen"));
        assert!(q1.other.contains_key("initial"));
        assert!(matches!(
            &q1.extensions[0].value,
            ExtensionValue::Other { element, .. } if element == "valueCodeableConcept"
        ));
        assert_eq!(q1.extensions[1].value.as_text(), "1.5");
    }

    #[test]
    fn unmodelled_elements_survive_both_formats() {
        let data = Questionnaire::parse_yaml(WITH_UNMODELLED).expect("parse yaml");

        let yaml = Questionnaire::render_yaml(&data).expect("render yaml");
        assert_eq!(Questionnaire::parse_yaml(&yaml).expect("reparse yaml"), data);

        let json = Questionnaire::render_json(&data).expect("render json");
        assert!(json.contains("\"answerOption\""));
        assert!(json.contains("\"valueCodeableConcept\""));
        assert!(json.contains("\"subjectType\""));
        assert_eq!(Questionnaire::parse_json(&json).expect("reparse json"), data);
    }

    #[test]
    fn last_updated_keeps_utc_suffix() {
        let data = Questionnaire::parse_yaml(SAMPLE).expect("parse yaml");
        let output = Questionnaire::render_yaml(&data).expect("render yaml");
        assert!(output.contains("2026-01-11T14:35:22Z"));
        assert!(!output.contains("+00:00"));
    }

    #[test]
    fn typed_field_mismatch_reports_path() {
        let input = r#"resourceType: Questionnaire
item:
  - linkId: q1
    type: string
    required: maybe
"#;

        let err = Questionnaire::parse_yaml(input).expect_err("should reject non-boolean");
        match err {
            FhirError::Translation(msg) => {
                assert!(msg.contains("item[0].required"));
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_resource_type() {
        let err = Questionnaire::parse_yaml("resourceType: Patient\n")
            .expect_err("should reject non-questionnaire");
        assert!(matches!(err, FhirError::InvalidInput(msg) if msg.contains("Patient")));
    }

    #[test]
    fn rejects_unknown_item_type() {
        let input = r#"resourceType: Questionnaire
item:
  - linkId: q1
    type: hologram
"#;
        let err = Questionnaire::parse_yaml(input).expect_err("should reject item type");
        assert!(matches!(err, FhirError::Translation(msg) if msg.contains("hologram")));
    }

    #[test]
    fn rejects_invalid_last_updated() {
        let input = r#"resourceType: Questionnaire
meta:
  lastUpdated: yesterday
"#;
        let err = Questionnaire::parse_yaml(input).expect_err("should reject timestamp");
        assert!(matches!(err, FhirError::Translation(msg) if msg.contains("lastUpdated")));
    }

    #[test]
    fn parses_open_choice_item_type() {
        let input = r#"{"resourceType": "Questionnaire", "item": [{"linkId": "c", "type": "open-choice"}]}"#;
        let data = Questionnaire::parse_json(input).expect("parse json");
        assert_eq!(data.items[0].item_type, ItemType::OpenChoice);
    }

    #[test]
    fn json_rejects_trailing_content() {
        let input = r#"{"resourceType": "Questionnaire"} {}"#;
        assert!(Questionnaire::parse_json(input).is_err());
    }
}
