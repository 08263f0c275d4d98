//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the editor. The core never reads environment variables itself; binaries read
//! them and hand the raw values to the `*_from_env_value` helpers below.

use crate::constants::{DEFAULT_EXTENSION_NAMESPACE, MAX_EXTENSION_NAMESPACE_LEN};
use crate::{EditorError, EditorResult};

/// Editor configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    extension_namespace: String,
    strict_actions: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            extension_namespace: DEFAULT_EXTENSION_NAMESPACE.to_string(),
            strict_actions: false,
        }
    }
}

impl EditorConfig {
    /// Create a new `EditorConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidInput`] if `extension_namespace` fails
    /// [`validate_extension_namespace`].
    pub fn new(extension_namespace: impl Into<String>, strict_actions: bool) -> EditorResult<Self> {
        let extension_namespace = extension_namespace.into();
        validate_extension_namespace(&extension_namespace)?;

        Ok(Self {
            extension_namespace,
            strict_actions,
        })
    }

    /// URL prefix shared by every recognised custom extension.
    pub fn extension_namespace(&self) -> &str {
        &self.extension_namespace
    }

    /// When true, the editor surfaces addressing failures instead of ignoring them.
    pub fn strict_actions(&self) -> bool {
        self.strict_actions
    }

    /// Returns a copy of this configuration with strict action handling switched on or off.
    pub fn with_strict_actions(mut self, strict_actions: bool) -> Self {
        self.strict_actions = strict_actions;
        self
    }
}

/// Validates that a namespace string can prefix extension URLs.
///
/// - Rejects empty or whitespace-only strings
/// - Bounds the length
/// - Requires ASCII without whitespace
/// - Requires an `http://` or `https://` scheme and a trailing `/`, so that
///   `namespace + slug` is a well-formed URL
///
/// # Errors
///
/// Returns [`EditorError::InvalidInput`] if the namespace is invalid.
pub fn validate_extension_namespace(namespace: &str) -> EditorResult<()> {
    if namespace.trim().is_empty() {
        return Err(EditorError::InvalidInput(
            "extension namespace cannot be empty".into(),
        ));
    }

    if namespace.len() > MAX_EXTENSION_NAMESPACE_LEN {
        return Err(EditorError::InvalidInput(format!(
            "extension namespace exceeds maximum length of {} characters",
            MAX_EXTENSION_NAMESPACE_LEN
        )));
    }

    if !namespace.is_ascii() || namespace.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(EditorError::InvalidInput(
            "extension namespace must be ASCII without whitespace".into(),
        ));
    }

    if !(namespace.starts_with("https://") || namespace.starts_with("http://")) {
        return Err(EditorError::InvalidInput(
            "extension namespace must start with http:// or https://".into(),
        ));
    }

    if !namespace.ends_with('/') {
        return Err(EditorError::InvalidInput(
            "extension namespace must end with '/'".into(),
        ));
    }

    Ok(())
}

/// Parse the extension namespace from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default namespace.
pub fn extension_namespace_from_env_value(value: Option<String>) -> EditorResult<String> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(namespace) => {
            validate_extension_namespace(&namespace)?;
            Ok(namespace)
        }
        None => Ok(DEFAULT_EXTENSION_NAMESPACE.to_string()),
    }
}

/// Parse the strict-actions flag from an optional string value.
///
/// Accepts `1/true/yes/on` and `0/false/no/off` (case-insensitive). `None` or blank means
/// permissive.
pub fn strict_actions_from_env_value(value: Option<String>) -> EditorResult<bool> {
    let Some(value) = value.map(|v| v.trim().to_ascii_lowercase()) else {
        return Ok(false);
    };

    match value.as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => Err(EditorError::InvalidInput(format!(
            "invalid strict actions flag '{other}' (expected true/false)"
        ))),
    }
}

/// Build an [`EditorConfig`] from raw environment values.
pub fn config_from_env_values(
    namespace: Option<String>,
    strict_actions: Option<String>,
) -> EditorResult<EditorConfig> {
    let namespace = extension_namespace_from_env_value(namespace)?;
    let strict_actions = strict_actions_from_env_value(strict_actions)?;
    EditorConfig::new(namespace, strict_actions)
}
