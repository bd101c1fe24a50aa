//! Flattening: resolve a construct's domain/attachment tree into one
//! linear coordinate space.
//!
//! Every derived view reads the same span list and only differs in which
//! per-character field of the domain it copies.

use std::rc::Rc;

use tracing::{instrument, trace};

use crate::domain::arena::DesignArena;
use crate::domain::construct::{ConstructId, DomainId};
use crate::domain::error::{DomainError, DomainResult};

/// A visible slice of one domain placed at a global offset.
///
/// Indices refer to the gaps between nucleotides, as with slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub domain: DomainId,
    /// Global start coordinate
    pub start: usize,
    pub rel_start: usize,
    pub rel_end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.rel_end - self.rel_start
    }

    pub fn is_empty(&self) -> bool {
        self.rel_end == self.rel_start
    }

    pub fn end(&self) -> usize {
        self.start + self.len()
    }

    pub fn covers(&self, index: usize) -> bool {
        self.start <= index && index < self.end()
    }

    /// Global coordinate → domain-local coordinate.
    pub fn rel_index(&self, index: usize) -> usize {
        index - self.start + self.rel_start
    }

    /// Domain-local coordinate → global coordinate.
    pub fn abs_index(&self, rel_index: usize) -> usize {
        self.start + rel_index - self.rel_start
    }

    /// Local range of this span inside the global window `[start, end)`.
    pub fn clip(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let lo = start.max(self.start);
        let hi = end.min(self.end());
        (lo < hi).then(|| (self.rel_index(lo), self.rel_index(hi)))
    }

    fn shifted(mut self, offset: usize) -> Self {
        self.start += offset;
        self
    }
}

/// Flattened form of one construct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub spans: Vec<Span>,
    pub len: usize,
}

impl Layout {
    fn push(&mut self, domain: DomainId, rel_start: usize, rel_end: usize) {
        self.spans.push(Span {
            domain,
            start: self.len,
            rel_start,
            rel_end,
        });
        self.len += rel_end - rel_start;
    }

    /// `(domain, local index)` at global coordinate `index`.
    pub fn locate(&self, index: usize) -> Option<(DomainId, usize)> {
        self.spans
            .iter()
            .find(|s| s.covers(index))
            .map(|s| (s.domain, s.rel_index(index)))
    }

    /// Global coordinate of `domain[rel_index]`, if that position is visible.
    pub fn position_of(&self, domain: DomainId, rel_index: usize) -> Option<usize> {
        self.spans
            .iter()
            .find(|s| s.domain == domain && s.rel_start <= rel_index && rel_index < s.rel_end)
            .map(|s| s.abs_index(rel_index))
    }

    /// Domains in flattened order, repeated where a domain is split.
    pub fn domains(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.spans.iter().map(|s| s.domain)
    }
}

impl DesignArena {
    /// Memoized flattened layout of `id`.
    ///
    /// The cache is dropped on every mutation of the arena.
    #[instrument(level = "trace", skip(self))]
    pub fn layout(&self, id: ConstructId) -> DomainResult<Rc<Layout>> {
        if let Some(hit) = self.layouts.borrow().get(&id) {
            return Ok(Rc::clone(hit));
        }
        let layout = Rc::new(self.flatten(id)?);
        self.layouts.borrow_mut().insert(id, Rc::clone(&layout));
        Ok(layout)
    }

    /// Walk the domain list, substituting attached constructs in place.
    fn flatten(&self, id: ConstructId) -> DomainResult<Layout> {
        let construct = self.construct(id)?;
        let domains = construct.domains();
        let mut layout = Layout::default();
        let mut cursor = 0;

        while cursor < domains.len() {
            let domain_id = domains[cursor];
            let len = self.domain(domain_id)?.as_str().len();

            match construct.attachment_on(domain_id) {
                None => layout.push(domain_id, 0, len),
                Some(attachment) => {
                    // Sites are clamped so later edits to the anchors can't
                    // push a span past the end of its domain.
                    let start_index = attachment.start_index.min(len);
                    layout.push(domain_id, 0, start_index);

                    let nested = self.layout(attachment.construct)?;
                    let offset = layout.len;
                    layout
                        .spans
                        .extend(nested.spans.iter().map(|s| s.shifted(offset)));
                    layout.len += nested.len;

                    let skip = domains[cursor..]
                        .iter()
                        .position(|&d| d == attachment.end_domain)
                        .ok_or(DomainError::UnknownDomain)?;
                    cursor += skip;

                    let end_len = self.domain(attachment.end_domain)?.as_str().len();
                    let end_index = attachment.end_index.min(end_len);
                    layout.push(attachment.end_domain, end_index, end_len);
                }
            }
            cursor += 1;
        }

        trace!(construct = %construct.name, spans = layout.spans.len(), len = layout.len, "flattened");
        Ok(layout)
    }

    pub(crate) fn invalidate(&self) {
        self.layouts.borrow_mut().clear();
    }
}
