//! Tree item store.
//!
//! The questionnaire's item tree flattened into a `linkId -> TreeItem` map, plus the ordering
//! needed to rebuild the nested document. The store is a plain value: the action protocol
//! transforms one store into the next and nothing outside this crate can change an item in
//! place.
//!
//! Loading and exporting never rewrite a `linkId`: keys are held exactly as the document spells
//! them, so a store exported without any applied action equals the document it came from.

use crate::extension::{self, ExtensionEntry};
use crate::{EditorError, EditorResult};
use fhir::{
    Extension, ItemData, ItemType, OtherElements, Questionnaire, QuestionnaireData,
    QuestionnaireMetadata,
};
use qedit_types::NonEmptyText;
use std::collections::BTreeMap;

/// One questionnaire item as held by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeItem {
    link_id: NonEmptyText,
    text: Option<String>,
    item_type: ItemType,
    required: Option<bool>,
    repeats: Option<bool>,
    other: OtherElements,
    pub(crate) extensions: Vec<Extension>,
    pub(crate) revision: u64,
}

impl TreeItem {
    pub fn link_id(&self) -> &str {
        self.link_id.as_str()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// The full extension array, custom and foreign alike, in document order.
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// Number of extension mutations applied to this item since it was loaded.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The raw custom-extension sequence (document ids only, none generated).
    pub fn custom_extensions(&self, namespace: &str) -> Vec<ExtensionEntry> {
        extension::custom_entries(namespace, &self.extensions)
    }

    /// Map a custom-extension index to a position in the full extension array.
    pub(crate) fn custom_position(&self, namespace: &str, index: usize) -> EditorResult<usize> {
        let positions = extension::custom_positions(namespace, &self.extensions);
        positions
            .get(index)
            .copied()
            .ok_or_else(|| EditorError::IndexOutOfRange {
                link_id: self.link_id().to_string(),
                index,
                len: positions.len(),
            })
    }

    fn from_data(data: ItemData) -> EditorResult<(Self, Vec<ItemData>)> {
        let link_id = NonEmptyText::new(data.link_id).map_err(|_| EditorError::EmptyLinkId)?;
        let item = Self {
            link_id,
            text: data.text,
            item_type: data.item_type,
            required: data.required,
            repeats: data.repeats,
            other: data.other,
            extensions: data.extensions,
            revision: 0,
        };
        Ok((item, data.items))
    }

    fn to_data(&self, items: Vec<ItemData>) -> ItemData {
        ItemData {
            link_id: self.link_id().to_string(),
            text: self.text.clone(),
            item_type: self.item_type,
            required: self.required,
            repeats: self.repeats,
            extensions: self.extensions.clone(),
            items,
            other: self.other.clone(),
        }
    }
}

/// Position of an item in the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
struct OrderNode {
    link_id: String,
    children: Vec<OrderNode>,
}

/// Keyed collection of questionnaire items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeItemStore {
    metadata: QuestionnaireMetadata,
    items: BTreeMap<String, TreeItem>,
    order: Vec<OrderNode>,
}

impl TreeItemStore {
    /// Build a store from a parsed questionnaire.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::EmptyLinkId`] or [`EditorError::DuplicateLinkId`] when the item
    /// keys are not usable.
    pub fn from_questionnaire(data: QuestionnaireData) -> EditorResult<Self> {
        let mut items = BTreeMap::new();
        let order = flatten(data.items, &mut items)?;

        Ok(Self {
            metadata: data.metadata,
            items,
            order,
        })
    }

    /// Parse a YAML questionnaire and build a store from it.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Fhir`] if the text is not a questionnaire, or the errors of
    /// [`TreeItemStore::from_questionnaire`].
    pub fn from_yaml(yaml_text: &str) -> EditorResult<Self> {
        Self::from_questionnaire(Questionnaire::parse_yaml(yaml_text)?)
    }

    /// Parse a JSON questionnaire and build a store from it.
    ///
    /// Same checks as [`TreeItemStore::from_yaml`].
    pub fn from_json(json_text: &str) -> EditorResult<Self> {
        Self::from_questionnaire(Questionnaire::parse_json(json_text)?)
    }

    pub fn to_yaml(&self) -> EditorResult<String> {
        Ok(Questionnaire::render_yaml(&self.to_questionnaire())?)
    }

    pub fn to_json(&self) -> EditorResult<String> {
        Ok(Questionnaire::render_json(&self.to_questionnaire())?)
    }

    /// Rebuild the nested questionnaire. Generated identity tokens are not part of the store,
    /// so only ids that came with the document are written out.
    pub fn to_questionnaire(&self) -> QuestionnaireData {
        QuestionnaireData {
            metadata: self.metadata.clone(),
            items: self.rebuild(&self.order),
        }
    }

    pub fn metadata(&self) -> &QuestionnaireMetadata {
        &self.metadata
    }

    pub fn get(&self, link_id: &str) -> Option<&TreeItem> {
        self.items.get(link_id)
    }

    pub(crate) fn get_mut(&mut self, link_id: &str) -> Option<&mut TreeItem> {
        self.items.get_mut(link_id)
    }

    /// All linkIds in document order (depth first).
    pub fn link_ids(&self) -> Vec<&str> {
        fn walk<'a>(nodes: &'a [OrderNode], out: &mut Vec<&'a str>) {
            for node in nodes {
                out.push(&node.link_id);
                walk(&node.children, out);
            }
        }

        let mut out = Vec::with_capacity(self.items.len());
        walk(&self.order, &mut out);
        out
    }

    fn rebuild(&self, nodes: &[OrderNode]) -> Vec<ItemData> {
        nodes
            .iter()
            .filter_map(|node| {
                let children = self.rebuild(&node.children);
                self.items
                    .get(&node.link_id)
                    .map(|item| item.to_data(children))
            })
            .collect()
    }
}

fn flatten(
    data: Vec<ItemData>,
    items: &mut BTreeMap<String, TreeItem>,
) -> EditorResult<Vec<OrderNode>> {
    let mut order = Vec::with_capacity(data.len());

    for item_data in data {
        let (item, children) = TreeItem::from_data(item_data)?;
        let link_id = item.link_id().to_string();
        if items.contains_key(&link_id) {
            return Err(EditorError::DuplicateLinkId(link_id));
        }
        items.insert(link_id.clone(), item);

        let children = flatten(children, items)?;
        order.push(OrderNode { link_id, children });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_EXTENSION_NAMESPACE as NS;

    fn sample() -> QuestionnaireData {
        let mut q1 = ItemData::new("q1", ItemType::Decimal);
        q1.extensions = vec![
            Extension::string("http://hl7.org/fhir/StructureDefinition/minValue", "0"),
            Extension::string(format!("{NS}external-threshold"), "5"),
        ];
        let mut group = ItemData::new("g1", ItemType::Group);
        group.items = vec![q1, ItemData::new("q2", ItemType::Boolean)];

        QuestionnaireData {
            metadata: QuestionnaireMetadata {
                title: Some("Sample".into()),
                ..QuestionnaireMetadata::default()
            },
            items: vec![group, ItemData::new("q3", ItemType::String)],
        }
    }

    #[test]
    fn flattens_nested_items() {
        let store = TreeItemStore::from_questionnaire(sample()).expect("valid");
        assert_eq!(store.link_ids(), vec!["g1", "q1", "q2", "q3"]);
        assert_eq!(store.get("q1").map(TreeItem::item_type), Some(ItemType::Decimal));
        assert_eq!(store.metadata().title.as_deref(), Some("Sample"));
    }

    #[test]
    fn to_questionnaire_restores_structure() {
        let data = sample();
        let store = TreeItemStore::from_questionnaire(data.clone()).expect("valid");
        assert_eq!(store.to_questionnaire(), data);
    }

    #[test]
    fn rejects_duplicate_link_ids() {
        let mut data = sample();
        data.items.push(ItemData::new("q2", ItemType::String));

        let err = TreeItemStore::from_questionnaire(data).expect_err("duplicate");
        assert!(matches!(err, EditorError::DuplicateLinkId(id) if id == "q2"));
    }

    #[test]
    fn rejects_blank_link_ids() {
        let data = QuestionnaireData {
            metadata: QuestionnaireMetadata::default(),
            items: vec![ItemData::new("  ", ItemType::String)],
        };
        let err = TreeItemStore::from_questionnaire(data).expect_err("blank");
        assert!(matches!(err, EditorError::EmptyLinkId));
    }

    #[test]
    fn link_ids_are_kept_as_written() {
        let data = QuestionnaireData {
            metadata: QuestionnaireMetadata::default(),
            items: vec![
                ItemData::new(" q1", ItemType::String),
                ItemData::new("q1", ItemType::String),
                ItemData::new("q1 ", ItemType::String),
            ],
        };

        let store = TreeItemStore::from_questionnaire(data.clone()).expect("distinct keys");
        assert_eq!(store.link_ids(), vec![" q1", "q1", "q1 "]);
        assert!(store.get(" q1").is_some());
        assert_eq!(store.to_questionnaire(), data);
    }

    #[test]
    fn parses_and_renders_through_fhir() {
        let yaml = format!(
            r#"resourceType: Questionnaire
item:
  - linkId: q1
    type: decimal
    code:
      - system: http://loinc.org
        code: 4548-4
    extension:
      - url: "{NS}external-threshold"
        valueString: "5"
"#
        );
        let store = TreeItemStore::from_yaml(&yaml).expect("valid");
        assert_eq!(store.get("q1").expect("q1").custom_extensions(NS).len(), 1);

        let json = store.to_json().expect("render json");
        assert!(json.contains("4548-4"));
        let reparsed = TreeItemStore::from_json(&json).expect("reparse");
        assert_eq!(reparsed, store);
        assert!(store.to_yaml().expect("render yaml").contains("4548-4"));
    }

    #[test]
    fn parse_errors_surface_as_fhir_errors() {
        let err = TreeItemStore::from_yaml("resourceType: Patient\n")
            .expect_err("not a questionnaire");
        assert!(matches!(err, EditorError::Fhir(_)));

        let blank = r#"{"resourceType": "Questionnaire", "item": [{"linkId": "", "type": "string"}]}"#;
        let err = TreeItemStore::from_json(blank).expect_err("blank linkId");
        assert!(matches!(err, EditorError::EmptyLinkId));
    }

    #[test]
    fn custom_position_skips_foreign_extensions() {
        let store = TreeItemStore::from_questionnaire(sample()).expect("valid");
        let q1 = store.get("q1").expect("q1");

        assert_eq!(q1.custom_position(NS, 0).expect("in range"), 1);
        let err = q1.custom_position(NS, 1).expect_err("out of range");
        assert!(matches!(
            err,
            EditorError::IndexOutOfRange { index: 1, len: 1, .. }
        ));
        assert_eq!(q1.custom_extensions(NS).len(), 1);
    }
}
