//! Editor session: the single owner of the current questionnaire state.
//!
//! The session threads the store through the reducer one action at a time, keeps the identity
//! projection in step with each applied change, and records applied actions in a journal that
//! can be replayed against the starting store.

use crate::action::{self, Action};
use crate::config::EditorConfig;
use crate::extension::{self, ExtensionEntry, ExtensionOption};
use crate::identity::{IdentityProjection, TokenSource, UuidTokenSource};
use crate::tree::TreeItemStore;
use crate::validation::ValidationErrors;
use crate::EditorResult;
use fhir::QuestionnaireData;
use serde::Serialize;

/// One extension entry with its presentation hint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtensionRow {
    pub index: usize,
    pub entry: ExtensionEntry,
    pub has_validation_error: bool,
}

/// Editing session over one questionnaire.
pub struct Editor<T: TokenSource = UuidTokenSource> {
    config: EditorConfig,
    store: TreeItemStore,
    identities: IdentityProjection,
    tokens: T,
    journal: Vec<Action>,
}

impl Editor<UuidTokenSource> {
    pub fn new(config: EditorConfig, store: TreeItemStore) -> Self {
        Self::with_token_source(config, store, UuidTokenSource)
    }

    /// Build the store from a parsed questionnaire and open a session on it.
    pub fn from_questionnaire(config: EditorConfig, data: QuestionnaireData) -> EditorResult<Self> {
        Ok(Self::new(config, TreeItemStore::from_questionnaire(data)?))
    }

    /// Apply `actions` in order to `store`, honouring the configured strictness.
    ///
    /// Replaying the journal of a session against that session's starting store reproduces
    /// its document.
    pub fn replay(
        config: EditorConfig,
        store: TreeItemStore,
        actions: impl IntoIterator<Item = Action>,
    ) -> EditorResult<Self> {
        let mut editor = Self::new(config, store);
        for action in actions {
            editor.dispatch(action)?;
        }
        Ok(editor)
    }
}

impl<T: TokenSource> Editor<T> {
    pub fn with_token_source(config: EditorConfig, store: TreeItemStore, tokens: T) -> Self {
        Self {
            config,
            store,
            identities: IdentityProjection::new(),
            tokens,
            journal: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &TreeItemStore {
        &self.store
    }

    /// Actions applied so far, in order.
    pub fn journal(&self) -> &[Action] {
        &self.journal
    }

    /// Dispatch an action using the configured strictness.
    ///
    /// In permissive mode an action that cannot be applied is logged and ignored and this
    /// returns `Ok(false)`. In strict mode the addressing error is returned.
    pub fn dispatch(&mut self, action: Action) -> EditorResult<bool> {
        match self.try_dispatch(action) {
            Ok(()) => Ok(true),
            Err(e) if !self.config.strict_actions() => {
                tracing::warn!("ignoring extension action: {e}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Dispatch an action, returning any addressing error regardless of configuration.
    ///
    /// On error the session is unchanged.
    pub fn try_dispatch(&mut self, action: Action) -> EditorResult<()> {
        let (next, change) = action::try_reduce(&self.store, &action, &self.config)?;

        tracing::debug!(
            link_id = %change.link_id,
            kind = ?change.kind,
            revision = change.revision,
            "applied extension action"
        );

        self.identities.follow(&change);
        self.store = next;
        self.journal.push(action);
        Ok(())
    }

    /// The custom extensions of `link_id`, each with an identity token.
    ///
    /// Returns `None` if no item has that `linkId`.
    pub fn extensions(&mut self, link_id: &str) -> Option<Vec<ExtensionEntry>> {
        let item = self.store.get(link_id)?;
        let raw = item.custom_extensions(self.config.extension_namespace());
        Some(
            self.identities
                .observe(link_id, item.revision(), raw, &mut self.tokens),
        )
    }

    /// The custom extensions of `link_id` with their validation-error hints.
    pub fn extension_rows(
        &mut self,
        link_id: &str,
        errors: &ValidationErrors,
    ) -> Option<Vec<ExtensionRow>> {
        let entries = self.extensions(link_id)?;
        Some(
            entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| ExtensionRow {
                    index,
                    has_validation_error: errors.has_code_error(link_id, index),
                    entry,
                })
                .collect(),
        )
    }

    /// Current index of the entry carrying `token`, for addressing an action at dispatch time.
    pub fn index_of(&mut self, link_id: &str, token: &str) -> Option<usize> {
        self.extensions(link_id)?
            .iter()
            .position(|entry| entry.token() == token)
    }

    /// The recognised extension kinds under the configured namespace.
    pub fn select_options(&self) -> Vec<ExtensionOption> {
        extension::select_options(self.config.extension_namespace())
    }

    /// The current document.
    pub fn questionnaire(&self) -> QuestionnaireData {
        self.store.to_questionnaire()
    }

    pub fn into_store(self) -> TreeItemStore {
        self.store
    }
}
