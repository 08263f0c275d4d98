//! Identity tokens for custom extension entries.
//!
//! The editing layer keys rows by a stable per-entry identity. Documents rarely carry element
//! ids on extensions, so identities are assigned on first observation:
//! - a non-empty id already present in the document is used verbatim,
//! - anything else gets a freshly generated token from a [`TokenSource`].
//!
//! Generated tokens are never written into the document. [`IdentityProjection`] memoises them
//! per item, keyed by the item's revision, and follows applied changes so a token stays with
//! its entry across appends, updates and deletes.

use crate::action::{AppliedChange, ChangeKind};
use crate::extension::ExtensionEntry;
use qedit_uuid::UuidService;
use std::collections::HashMap;

/// Source of fresh identity tokens.
pub trait TokenSource {
    /// Returns a non-empty token not handed out before.
    fn next_token(&mut self) -> String;
}

/// Random UUID v4 tokens in canonical 32-hex form.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidTokenSource;

impl TokenSource for UuidTokenSource {
    fn next_token(&mut self) -> String {
        UuidService::new().to_string()
    }
}

/// Give every entry a non-empty id, preserving ids that are already set.
///
/// Total over any sequence, including the empty one. Running it again on its own output
/// changes nothing.
pub fn assign_identities(
    entries: Vec<ExtensionEntry>,
    tokens: &mut dyn TokenSource,
) -> Vec<ExtensionEntry> {
    entries
        .into_iter()
        .map(|mut entry| {
            if !entry.has_identity() {
                entry.id = Some(tokens.next_token());
            }
            entry
        })
        .collect()
}

#[derive(Clone, Debug)]
struct Slots {
    revision: u64,
    tokens: Vec<String>,
}

/// Memoised identity tokens per item.
///
/// Slots for an item cover a prefix of its custom-extension sequence: entries appended since
/// the last observation get their tokens on the next one.
#[derive(Clone, Debug, Default)]
pub struct IdentityProjection {
    items: HashMap<String, Slots>,
}

impl IdentityProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach identities to the raw custom-extension sequence of `link_id` at `revision`.
    ///
    /// Reading the same revision twice yields the same tokens.
    pub fn observe(
        &mut self,
        link_id: &str,
        revision: u64,
        entries: Vec<ExtensionEntry>,
        tokens: &mut dyn TokenSource,
    ) -> Vec<ExtensionEntry> {
        let slots = self
            .items
            .entry(link_id.to_string())
            .or_insert_with(|| Slots {
                revision,
                tokens: Vec::new(),
            });

        // Out of step with the document: derive from scratch.
        if slots.revision != revision || slots.tokens.len() > entries.len() {
            slots.revision = revision;
            slots.tokens.clear();
        }

        entries
            .into_iter()
            .enumerate()
            .map(|(index, mut entry)| {
                if index == slots.tokens.len() {
                    let token = match entry.id.take().filter(|id| !id.is_empty()) {
                        Some(id) => id,
                        None => tokens.next_token(),
                    };
                    slots.tokens.push(token);
                } else if entry.has_identity() && entry.token() != slots.tokens[index] {
                    slots.tokens[index] = entry.token().to_string();
                }
                entry.id = Some(slots.tokens[index].clone());
                entry
            })
            .collect()
    }

    /// Carry the memoised tokens of an item across an applied change.
    pub fn follow(&mut self, change: &AppliedChange) {
        let Some(slots) = self.items.get_mut(&change.link_id) else {
            return;
        };

        if slots.revision != change.previous_revision {
            self.items.remove(&change.link_id);
            return;
        }

        if let ChangeKind::Removed { index } = change.kind {
            if index < slots.tokens.len() {
                slots.tokens.remove(index);
            }
        }
        slots.revision = change.revision;
    }
}
