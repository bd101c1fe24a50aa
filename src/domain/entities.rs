//! Domain entities: the mutable leaf fragment of every design

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::format::{paint, ColorMode, Style, View};
use crate::domain::sequence::Sequence;

/// Character used for "no constraint" in dot-bracket strings.
pub const UNCONSTRAINED: char = '.';

/// Legal splice positions of a domain.
///
/// Indices refer to the gaps between nucleotides, so a domain of length `n`
/// has `n + 1` candidate positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttachmentSites {
    /// No position is legal
    #[default]
    Nowhere,
    /// Every position in `[0, len]`, following the current length
    Anywhere,
    At(BTreeSet<usize>),
}

impl AttachmentSites {
    pub fn at(sites: impl IntoIterator<Item = usize>) -> Self {
        AttachmentSites::At(sites.into_iter().collect())
    }

    pub fn contains(&self, index: usize, len: usize) -> bool {
        match self {
            AttachmentSites::Nowhere => false,
            AttachmentSites::Anywhere => index <= len,
            AttachmentSites::At(sites) => sites.contains(&index),
        }
    }

    pub fn to_vec(&self, len: usize) -> Vec<usize> {
        match self {
            AttachmentSites::Nowhere => Vec::new(),
            AttachmentSites::Anywhere => (0..=len).collect(),
            AttachmentSites::At(sites) => sites.iter().copied().collect(),
        }
    }
}

/// A named, independently mutable nucleotide fragment.
///
/// `constraints` and `expected_fold` are parallel dot-bracket strings. When
/// present they always have the same length as the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub name: String,
    pub doc: String,
    pub style: Style,
    /// Gates `set_seq` and every indexed write
    pub mutable: bool,
    sequence: String,
    constraints: Option<String>,
    expected_fold: Option<String>,
    attachment_sites: AttachmentSites,
}

impl Domain {
    /// New immutable domain with no annotations and no attachment sites.
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            style: Style::default(),
            mutable: false,
            sequence: sequence.into(),
            constraints: None,
            expected_fold: None,
            attachment_sites: AttachmentSites::Nowhere,
        }
    }

    pub fn with_mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_constraints(mut self, constraints: &str) -> DomainResult<Self> {
        self.set_constraints(Some(constraints))?;
        Ok(self)
    }

    pub fn with_expected_fold(mut self, expected_fold: &str) -> DomainResult<Self> {
        self.set_expected_fold(Some(expected_fold))?;
        Ok(self)
    }

    pub fn with_attachment_sites(mut self, sites: AttachmentSites) -> DomainResult<Self> {
        self.set_attachment_sites(sites)?;
        Ok(self)
    }

    /// Independent deep clone.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn as_str(&self) -> &str {
        &self.sequence
    }

    /// Reassign the whole sequence.
    #[instrument(level = "debug", skip(self), fields(domain = %self.name))]
    pub fn set_seq(&mut self, sequence: &str) -> DomainResult<()> {
        self.ensure_mutable()?;
        for (field, annotation) in [
            ("constraints", &self.constraints),
            ("expected_fold", &self.expected_fold),
        ] {
            if let Some(a) = annotation {
                if a.len() != sequence.len() {
                    return Err(DomainError::LengthMismatch {
                        field,
                        expected: a.len(),
                        actual: sequence.len(),
                    });
                }
            }
        }
        self.sequence = sequence.to_string();
        self.retain_sites();
        Ok(())
    }

    /// Stored constraints, or all `.` when unconstrained.
    pub fn constraints(&self) -> String {
        self.constraints
            .clone()
            .unwrap_or_else(|| unconstrained(self.sequence.len()))
    }

    pub fn has_constraints(&self) -> bool {
        self.constraints.is_some()
    }

    /// `None` (or an empty string) clears the constraints.
    pub fn set_constraints(&mut self, constraints: Option<&str>) -> DomainResult<()> {
        self.constraints = self.checked_annotation("constraints", constraints)?;
        Ok(())
    }

    /// Stored expected fold, or all `.` when none was given.
    pub fn expected_fold(&self) -> String {
        self.expected_fold
            .clone()
            .unwrap_or_else(|| unconstrained(self.sequence.len()))
    }

    pub fn has_expected_fold(&self) -> bool {
        self.expected_fold.is_some()
    }

    pub fn set_expected_fold(&mut self, expected_fold: Option<&str>) -> DomainResult<()> {
        self.expected_fold = self.checked_annotation("expected_fold", expected_fold)?;
        Ok(())
    }

    fn checked_annotation(
        &self,
        field: &'static str,
        value: Option<&str>,
    ) -> DomainResult<Option<String>> {
        match value {
            None | Some("") => Ok(None),
            Some(v) if v.len() != self.sequence.len() => Err(DomainError::LengthMismatch {
                field,
                expected: self.sequence.len(),
                actual: v.len(),
            }),
            Some(v) => Ok(Some(v.to_string())),
        }
    }

    /// Sorted legal splice positions.
    pub fn attachment_sites(&self) -> Vec<usize> {
        self.attachment_sites.to_vec(self.sequence.len())
    }

    pub fn is_attachment_site(&self, index: usize) -> bool {
        self.attachment_sites.contains(index, self.sequence.len())
    }

    pub fn set_attachment_sites(&mut self, sites: AttachmentSites) -> DomainResult<()> {
        let len = self.sequence.len();
        if let AttachmentSites::At(explicit) = &sites {
            if let Some(&bad) = explicit.iter().find(|&&i| i > len) {
                return Err(DomainError::IndexOutOfRange {
                    index: bad as isize,
                    len,
                });
            }
        }
        self.attachment_sites = sites;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.sequence.get(index..index.checked_add(1)?)?.chars().next()
    }

    pub fn subseq(&self, start: usize, end: usize) -> Option<&str> {
        self.sequence.get(start..end)
    }

    /// Replace `[start, end)` with `insert`.
    ///
    /// The edited span of the constraints and expected fold resets to `.`
    /// for the length of `insert`.
    #[instrument(level = "debug", skip(self), fields(domain = %self.name))]
    pub fn splice(&mut self, start: usize, end: usize, insert: &str) -> DomainResult<()> {
        self.ensure_mutable()?;
        let len = self.sequence.len();
        if start > end || end > len {
            return Err(DomainError::IndexOutOfRange {
                index: isize::try_from(end.max(start)).unwrap_or(isize::MAX),
                len,
            });
        }
        if !self.sequence.is_char_boundary(start) || !self.sequence.is_char_boundary(end) {
            return Err(DomainError::IndexOutOfRange {
                index: isize::try_from(start).unwrap_or(isize::MAX),
                len,
            });
        }

        let filler = unconstrained(insert.len());
        self.sequence.replace_range(start..end, insert);
        for annotation in [&mut self.constraints, &mut self.expected_fold]
            .into_iter()
            .flatten()
        {
            annotation.replace_range(start..end, &filler);
        }
        self.retain_sites();
        debug!(start, end, new_len = self.sequence.len(), "spliced");
        Ok(())
    }

    /// `d[i] = s`
    pub fn set(&mut self, index: usize, sequence: &str) -> DomainResult<()> {
        let end = self.one_past(index)?;
        self.splice(index, end, sequence)
    }

    pub fn mutate(&mut self, index: usize, mutation: &str) -> DomainResult<()> {
        self.set(index, mutation)
    }

    pub fn insert(&mut self, index: usize, insert: &str) -> DomainResult<()> {
        self.splice(index, index, insert)
    }

    pub fn replace(&mut self, start: usize, end: usize, insert: &str) -> DomainResult<()> {
        self.splice(start, end, insert)
    }

    pub fn delete(&mut self, start: usize, end: usize) -> DomainResult<()> {
        self.splice(start, end, "")
    }

    /// `del d[i]`
    pub fn remove(&mut self, index: usize) -> DomainResult<()> {
        let end = self.one_past(index)?;
        self.splice(index, end, "")
    }

    pub fn append(&mut self, sequence: &str) -> DomainResult<()> {
        let n = self.sequence.len();
        self.splice(n, n, sequence)
    }

    pub fn prepend(&mut self, sequence: &str) -> DomainResult<()> {
        self.splice(0, 0, sequence)
    }

    /// Render `[start, end)` of the chosen view with this domain's style.
    pub fn format(&self, start: usize, end: usize, view: View, color: ColorMode) -> String {
        let end = end.min(self.sequence.len());
        let start = start.min(end);
        let text = view.apply(self.subseq(start, end).unwrap_or_default());
        paint(&text, &self.style, color)
    }

    fn ensure_mutable(&self) -> DomainResult<()> {
        if self.mutable {
            Ok(())
        } else {
            debug!(domain = %self.name, "rejected write to immutable domain");
            Err(DomainError::ImmutableDomain(self.name.clone()))
        }
    }

    fn one_past(&self, index: usize) -> DomainResult<usize> {
        index
            .checked_add(1)
            .ok_or_else(|| DomainError::IndexOutOfRange {
                index: isize::try_from(index).unwrap_or(isize::MAX),
                len: self.sequence.len(),
            })
    }

    fn retain_sites(&mut self) {
        let len = self.sequence.len();
        if let AttachmentSites::At(sites) = &mut self.attachment_sites {
            sites.retain(|&i| i <= len);
        }
    }
}

impl Sequence for Domain {
    fn seq(&self) -> String {
        self.sequence.clone()
    }

    fn len(&self) -> usize {
        self.sequence.len()
    }
}

fn unconstrained(len: usize) -> String {
    std::iter::repeat(UNCONSTRAINED).take(len).collect()
}
