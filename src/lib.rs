//! Composable nucleic-acid constructs.
//!
//! A design is built from [`Domain`]s owned by a [`DesignArena`] and composed
//! into constructs that may nest other constructs at validated attachment
//! sites. Every sequence view is derived by flattening that tree.
//!
//! ```
//! use sensorseq::{AttachmentSites, DesignArena, Domain, Sequence};
//!
//! let mut arena = DesignArena::new();
//! let insert = arena.construct_from("insert", [Domain::new("A", "AAAAAA")]);
//! let host = arena.construct_from(
//!     "host",
//!     [
//!         Domain::new("G", "GGGGGG")
//!             .with_attachment_sites(AttachmentSites::at([0, 3, 6]))
//!             .unwrap(),
//!         Domain::new("T", "TTTTTT"),
//!     ],
//! );
//!
//! arena.attach(host, insert, "G", 3, "G", 6).unwrap();
//! assert_eq!(arena.view(host).seq(), "GGGAAAAAATTTTTT");
//! ```

pub mod config;
pub mod domain;
pub mod util;

pub use config::{Settings, SettingsError};
pub use domain::{
    mass, AttachIndex, Attachment, AttachmentSites, ColorMode, Construct, ConstructId,
    ConstructView, DesignArena, Domain, DomainError, DomainId, DomainRef, DomainResult,
    FormatOptions, Layout, Part, Polymer, Sequence, Span, Style, TreeNodeConvert, View, Weight,
};
