//! Constants used throughout the qedit core crate.

/// Vendor namespace under which the recognised custom extensions live, unless configured
/// otherwise.
pub const DEFAULT_EXTENSION_NAMESPACE: &str = "https://api.diffia.com/fhir/StructureDefinition/";

/// Upper bound on the configured namespace length.
pub const MAX_EXTENSION_NAMESPACE_LEN: usize = 2048;

/// Validation errors whose `errorProperty` starts with this prefix flag an extension row.
pub const CODE_ERROR_PROPERTY_PREFIX: &str = "code";

/// Environment variable holding the extension namespace override.
pub const EXTENSION_NAMESPACE_ENV: &str = "QEDIT_EXTENSION_NAMESPACE";

/// Environment variable selecting strict action handling.
pub const STRICT_ACTIONS_ENV: &str = "QEDIT_STRICT_ACTIONS";
