//! Domain-level errors

use thiserror::Error;

/// Domain errors are local validation failures.
/// Every one is raised before any state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("no domain named '{0}'")]
    UnknownName(String),

    #[error("{count} domains named '{name}'")]
    AmbiguousName { name: String, count: usize },

    #[error("no '{domain}' domain in '{construct}'")]
    NotAMember { domain: String, construct: String },

    #[error("position {index} of domain '{domain}' is not an attachment site")]
    IllegalAttachmentSite { domain: String, index: usize },

    #[error("attachment must not end before it starts: '{start}'[{start_index}] .. '{end}'[{end_index}]")]
    AttachmentOrder {
        start: String,
        start_index: usize,
        end: String,
        end_index: usize,
    },

    #[error("domain '{0}' already anchors an attachment")]
    AlreadyAttached(String),

    #[error("attaching '{nested}' into '{construct}' would create a cycle")]
    CycleDetected { construct: String, nested: String },

    #[error("domain '{0}' is not mutable")]
    ImmutableDomain(String),

    #[error("{field} doesn't match sequence: expected length {expected}, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("position {index} of domain '{domain}' is not part of the flattened sequence")]
    NotInLayout { domain: String, index: usize },

    #[error("unknown polymer type: '{0}'")]
    UnrecognizedPolymer(String),

    #[error("invalid style: '{0}'")]
    InvalidStyle(String),

    #[error("domain handle is not in this arena")]
    UnknownDomain,

    #[error("construct handle is not in this arena")]
    UnknownConstruct,

    #[error("construct '{0}' is still attached elsewhere")]
    InUse(String),
}

/// Result type for domain layer operations.
pub type DomainResult<T> = Result<T, DomainError>;
