//! Extension actions and the reducer that applies them.
//!
//! Every action names an item by `linkId`; update and delete also carry an index into that
//! item's custom-extension sequence. Applying an action never touches the input store: the
//! reducer returns a new store, so a journal of actions replayed against the same starting
//! store always lands on the same document.
//!
//! Index semantics:
//! - add appends, so every existing index stays valid
//! - delete shifts later entries down by one; callers deleting several entries must
//!   re-derive indices between actions

use crate::config::EditorConfig;
use crate::extension::{resolve_extension_url, CustomExtensionKind, ExtensionProperty};
use crate::tree::TreeItemStore;
use crate::{EditorError, EditorResult};
use fhir::{Extension, ExtensionValue};
use serde::{Deserialize, Serialize};

/// A mutation of one item's custom extensions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    AddExtension {
        #[serde(rename = "linkId")]
        link_id: String,
    },
    DeleteExtension {
        #[serde(rename = "linkId")]
        link_id: String,
        index: usize,
    },
    UpdateExtensionProperty {
        #[serde(rename = "linkId")]
        link_id: String,
        index: usize,
        property: ExtensionProperty,
        value: String,
    },
}

impl Action {
    pub fn add_extension(link_id: impl Into<String>) -> Self {
        Action::AddExtension {
            link_id: link_id.into(),
        }
    }

    pub fn delete_extension(link_id: impl Into<String>, index: usize) -> Self {
        Action::DeleteExtension {
            link_id: link_id.into(),
            index,
        }
    }

    pub fn update_extension_property(
        link_id: impl Into<String>,
        index: usize,
        property: ExtensionProperty,
        value: impl Into<String>,
    ) -> Self {
        Action::UpdateExtensionProperty {
            link_id: link_id.into(),
            index,
            property,
            value: value.into(),
        }
    }

    pub fn link_id(&self) -> &str {
        match self {
            Action::AddExtension { link_id }
            | Action::DeleteExtension { link_id, .. }
            | Action::UpdateExtensionProperty { link_id, .. } => link_id,
        }
    }
}

/// What an applied action did to the custom-extension sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Appended,
    Updated { index: usize },
    Removed { index: usize },
}

/// Record of one applied action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedChange {
    pub link_id: String,
    pub kind: ChangeKind,
    /// Item revision the action was applied to.
    pub previous_revision: u64,
    /// Item revision after the action.
    pub revision: u64,
}

/// Apply `action` to `store`, reporting addressing failures.
///
/// # Errors
///
/// - [`EditorError::UnknownItem`] if no item has the action's `linkId`
/// - [`EditorError::IndexOutOfRange`] if the index is past the custom-extension sequence
/// - [`EditorError::UnrecognisedExtensionUrl`] if an update sets a url that is not a
///   recognised kind
pub fn try_reduce(
    store: &TreeItemStore,
    action: &Action,
    config: &EditorConfig,
) -> EditorResult<(TreeItemStore, AppliedChange)> {
    let namespace = config.extension_namespace();
    let mut next = store.clone();
    let item = next
        .get_mut(action.link_id())
        .ok_or_else(|| EditorError::UnknownItem(action.link_id().to_string()))?;

    let kind = match action {
        Action::AddExtension { .. } => {
            let url = CustomExtensionKind::default_kind().url(namespace);
            item.extensions.push(Extension::string(url, ""));
            ChangeKind::Appended
        }
        Action::DeleteExtension { index, .. } => {
            let position = item.custom_position(namespace, *index)?;
            item.extensions.remove(position);
            ChangeKind::Removed { index: *index }
        }
        Action::UpdateExtensionProperty {
            index,
            property,
            value,
            ..
        } => {
            let position = item.custom_position(namespace, *index)?;
            let ext = &mut item.extensions[position];
            match property {
                ExtensionProperty::Url => {
                    ext.url = resolve_extension_url(namespace, value)
                        .ok_or_else(|| EditorError::UnrecognisedExtensionUrl(value.clone()))?;
                }
                ExtensionProperty::Value => {
                    ext.value = ExtensionValue::String(value.clone());
                }
            }
            ChangeKind::Updated { index: *index }
        }
    };

    let previous_revision = item.revision;
    item.revision += 1;

    let change = AppliedChange {
        link_id: action.link_id().to_string(),
        kind,
        previous_revision,
        revision: item.revision,
    };

    Ok((next, change))
}

/// Apply `action` to `store`, ignoring addressing failures.
///
/// An action that cannot be applied leaves the store unchanged and is logged at `warn`.
pub fn reduce(store: TreeItemStore, action: &Action, config: &EditorConfig) -> TreeItemStore {
    match try_reduce(&store, action, config) {
        Ok((next, _)) => next,
        Err(e) => {
            tracing::warn!(link_id = action.link_id(), "ignoring extension action: {e}");
            store
        }
    }
}

/// Parse a YAML sequence of actions.
///
/// # Errors
///
/// Returns [`EditorError::InvalidDocument`] naming the failing path.
pub fn parse_action_log_yaml(yaml_text: &str) -> EditorResult<Vec<Action>> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
    serde_path_to_error::deserialize::<_, Vec<Action>>(deserializer).map_err(log_mismatch)
}

/// Parse a JSON array of actions.
///
/// # Errors
///
/// Returns [`EditorError::InvalidDocument`] naming the failing path.
pub fn parse_action_log_json(json_text: &str) -> EditorResult<Vec<Action>> {
    let mut deserializer = serde_json::Deserializer::from_str(json_text);
    let actions = serde_path_to_error::deserialize::<_, Vec<Action>>(&mut deserializer)
        .map_err(log_mismatch)?;
    deserializer
        .end()
        .map_err(|e| EditorError::InvalidDocument(format!("trailing content in action log: {e}")))?;
    Ok(actions)
}

/// Render actions as a YAML sequence.
pub fn render_action_log_yaml(actions: &[Action]) -> EditorResult<String> {
    serde_yaml::to_string(actions)
        .map_err(|e| EditorError::InvalidDocument(format!("failed to serialise action log: {e}")))
}

fn log_mismatch<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> EditorError {
    let path = err.path().to_string();
    let source = err.into_inner();
    EditorError::InvalidDocument(format!("action log mismatch at {path}: {source}"))
}
