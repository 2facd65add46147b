/// Errors surfaced at the parsing and registry seams.
///
/// The rebuild and listener paths never return these to the host; they are
/// turned into [`crate::Diagnostic`] entries instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// The embedded option payload is not valid JSON of the expected shape.
    MalformedPayload { reason: String, text: String },
    /// No block definition is registered under this block type.
    UnknownBlockType(String),
    /// The host-supplied initial state could not be read.
    InvalidHostState(String),
    /// A configuration override could not be parsed.
    InvalidConfig(String),
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::MalformedPayload { reason, .. } => {
                write!(f, "error parsing subcategory data JSON: {}", reason)
            }
            FormError::UnknownBlockType(block_type) => {
                write!(f, "no block definition registered for '{}'", block_type)
            }
            FormError::InvalidHostState(reason) => write!(f, "invalid initial state: {}", reason),
            FormError::InvalidConfig(reason) => write!(f, "invalid form config: {}", reason),
        }
    }
}

impl std::error::Error for FormError {}
