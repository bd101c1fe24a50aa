//! Construct: an ordered composition of domain handles plus attachments

use std::fmt;
use std::sync::OnceLock;

use generational_arena::Index;
use itertools::Itertools;
use regex::Regex;

/// Stable handle to a domain stored in a `DesignArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainId(pub(crate) Index);

/// Stable handle to a construct stored in a `DesignArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstructId(pub(crate) Index);

/// Something that can be appended, prepended, or swapped in by `replace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Domain(DomainId),
    Construct(ConstructId),
}

impl From<DomainId> for Part {
    fn from(id: DomainId) -> Self {
        Part::Domain(id)
    }
}

impl From<ConstructId> for Part {
    fn from(id: ConstructId) -> Self {
        Part::Construct(id)
    }
}

/// A domain named either by handle or, as a convenience, by name.
///
/// Names must resolve to exactly one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainRef<'a> {
    Id(DomainId),
    Name(&'a str),
}

impl From<DomainId> for DomainRef<'_> {
    fn from(id: DomainId) -> Self {
        DomainRef::Id(id)
    }
}

impl<'a> From<&'a str> for DomainRef<'a> {
    fn from(name: &'a str) -> Self {
        DomainRef::Name(name)
    }
}

impl fmt::Display for DomainRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainRef::Id(id) => write!(f, "{:?}", id.0),
            DomainRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Splice position inside a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachIndex {
    At(usize),
    /// Position 0
    Start,
    /// Position `len(domain)`
    End,
}

impl AttachIndex {
    pub fn resolve(self, len: usize) -> usize {
        match self {
            AttachIndex::At(i) => i,
            AttachIndex::Start => 0,
            AttachIndex::End => len,
        }
    }
}

impl From<usize> for AttachIndex {
    fn from(i: usize) -> Self {
        AttachIndex::At(i)
    }
}

/// One construct spliced into `[start_domain[start_index], end_domain[end_index])`.
///
/// Every domain strictly between the two anchors is occluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub start_domain: DomainId,
    pub start_index: usize,
    pub end_domain: DomainId,
    pub end_index: usize,
    pub construct: ConstructId,
}

impl Attachment {
    pub fn touches(&self, domain: DomainId) -> bool {
        self.start_domain == domain || self.end_domain == domain
    }

    /// Whether every occurrence of the start anchor in `domains` is followed
    /// by the end anchor, so flattening can always find where the span ends.
    pub fn anchors_in_order(&self, domains: &[DomainId]) -> bool {
        let last = |d: DomainId| domains.iter().rposition(|&x| x == d);
        match (last(self.start_domain), last(self.end_domain)) {
            (Some(_), Some(_)) if self.start_domain == self.end_domain => {
                self.start_index <= self.end_index
            }
            (Some(s), Some(e)) => s < e,
            _ => false,
        }
    }
}

/// Ordered list of domain handles with at most one attachment per start domain.
///
/// Sequence views are never stored here; `DesignArena` derives them by
/// flattening.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Construct {
    pub name: String,
    pub doc: String,
    pub(crate) domains: Vec<DomainId>,
    pub(crate) attachments: Vec<Attachment>,
}

impl Construct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn domains(&self) -> &[DomainId] {
        &self.domains
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn contains(&self, domain: DomainId) -> bool {
        self.domains.contains(&domain)
    }

    pub fn position(&self, domain: DomainId) -> Option<usize> {
        self.domains.iter().position(|&d| d == domain)
    }

    /// Attachment anchored on `domain`, if any.
    pub fn attachment_on(&self, domain: DomainId) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.start_domain == domain)
    }

    /// Record `attachment`, replacing any other anchored on the same domain.
    pub(crate) fn upsert_attachment(&mut self, attachment: Attachment) {
        self.attachments
            .retain(|a| a.start_domain != attachment.start_domain);
        self.attachments.push(attachment);
    }

    /// `"sgRNA:on/2"` → `"sgRNA(on,2)"`. `None` for a name without tokens.
    pub fn function_name(&self) -> Option<String> {
        let mut tokens = name_tokens(&self.name);
        let head = tokens.next()?;
        Some(format!("{}({})", head, tokens.join(",")))
    }

    /// `"sgRNA:on/2"` → `"sgRNA_on_2"`
    pub fn underscore_name(&self) -> String {
        name_tokens(&self.name).join("_")
    }

    /// `"sgRNA:on/2"` → `"sgRNA/on/2"`
    pub fn slash_name(&self) -> String {
        name_tokens(&self.name).join("/")
    }
}

fn name_tokens(name: &str) -> impl Iterator<Item = &str> {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN
        .get_or_init(|| Regex::new(r"[a-zA-Z0-9]+").unwrap())
        .find_iter(name)
        .map(|m| m.as_str())
}
