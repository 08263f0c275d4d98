/// Errors produced by the editor core.
///
/// `UnknownItem`, `IndexOutOfRange` and `UnrecognisedExtensionUrl` are the addressing failures
/// of the extension action protocol. The permissive reducer swallows them; the strict one
/// hands them back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown item: no item with linkId '{0}'")]
    UnknownItem(String),

    #[error(
        "extension index {index} out of range for item '{link_id}' ({len} custom extensions)"
    )]
    IndexOutOfRange {
        link_id: String,
        index: usize,
        len: usize,
    },

    #[error("unrecognised custom extension url '{0}'")]
    UnrecognisedExtensionUrl(String),

    #[error("linkId cannot be empty")]
    EmptyLinkId,

    #[error("duplicate linkId '{0}'")]
    DuplicateLinkId(String),

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

pub type EditorResult<T> = std::result::Result<T, EditorError>;
