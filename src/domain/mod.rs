//! Domain layer: sequence entities, construct composition, flattening
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod construct;
pub mod entities;
pub mod error;
pub mod format;
pub mod layout;
pub mod sequence;
pub mod tree;
pub mod view;

pub use arena::DesignArena;
pub use construct::{AttachIndex, Attachment, Construct, ConstructId, DomainId, DomainRef, Part};
pub use entities::{AttachmentSites, Domain, UNCONSTRAINED};
pub use error::{DomainError, DomainResult};
pub use format::{ColorMode, FormatOptions, Style, View, Weight};
pub use layout::{Layout, Span};
pub use sequence::{mass, to_dna, to_rna, Polymer, Sequence};
pub use tree::TreeNodeConvert;
pub use view::ConstructView;
