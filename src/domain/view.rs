//! Derived views of a construct and index translation

use std::fmt;

use tracing::{debug, instrument};

use crate::domain::arena::DesignArena;
use crate::domain::construct::{Construct, ConstructId, DomainId, DomainRef, Part};
use crate::domain::entities::Domain;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::format::FormatOptions;
use crate::domain::sequence::{to_dna, to_rna, Sequence};

/// Read-only handle pairing a construct with the arena that owns it.
///
/// Handles that no longer resolve render as an empty sequence; use the
/// `DesignArena` methods directly to see the error.
#[derive(Clone, Copy)]
pub struct ConstructView<'a> {
    arena: &'a DesignArena,
    id: ConstructId,
}

impl<'a> ConstructView<'a> {
    pub fn id(&self) -> ConstructId {
        self.id
    }

    pub fn construct(&self) -> DomainResult<&'a Construct> {
        self.arena.construct(self.id)
    }

    pub fn constraints(&self) -> String {
        logged(self.arena.constraints(self.id), "constraints")
    }

    pub fn expected_fold(&self) -> String {
        logged(self.arena.expected_fold(self.id), "expected_fold")
    }

    pub fn format(&self, options: &FormatOptions) -> String {
        logged(self.arena.format(self.id, options), "format")
    }

    /// The domain named `name`, searching attached constructs too.
    pub fn domain(&self, name: &str) -> DomainResult<&'a Domain> {
        let found = self.arena.find_domain(self.id, name)?;
        self.arena.domain(found)
    }
}

impl Sequence for ConstructView<'_> {
    fn seq(&self) -> String {
        logged(self.arena.seq(self.id), "seq")
    }

    fn len(&self) -> usize {
        logged(self.arena.len(self.id), "len")
    }
}

impl fmt::Display for ConstructView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(&FormatOptions::default()))
    }
}

impl fmt::Debug for ConstructView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.construct().map(|c| c.name.as_str()).unwrap_or("?");
        write!(f, "Construct(\"{}\")", name)
    }
}

impl DesignArena {
    pub fn view(&self, id: ConstructId) -> ConstructView<'_> {
        ConstructView { arena: self, id }
    }

    /// New construct made of `parts`, in order. `a + b` in design code.
    pub fn concat(&mut self, name: impl Into<String>, parts: &[Part]) -> DomainResult<ConstructId> {
        let id = self.new_construct(name);
        for &part in parts {
            if let Err(e) = self.append(id, part) {
                self.remove_construct(id)?;
                return Err(e);
            }
        }
        Ok(id)
    }

    /// Concatenate `field` of every flattened span.
    fn collect_field(
        &self,
        id: ConstructId,
        field: impl Fn(&Domain, usize, usize) -> String,
    ) -> DomainResult<String> {
        let layout = self.layout(id)?;
        let mut out = String::with_capacity(layout.len);
        for span in &layout.spans {
            out.push_str(&field(self.domain(span.domain)?, span.rel_start, span.rel_end));
        }
        Ok(out)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn seq(&self, id: ConstructId) -> DomainResult<String> {
        self.collect_field(id, |d, s, e| slice(d.as_str(), s, e).to_string())
    }

    pub fn dna(&self, id: ConstructId) -> DomainResult<String> {
        self.collect_field(id, |d, s, e| to_dna(slice(d.as_str(), s, e)))
    }

    pub fn rna(&self, id: ConstructId) -> DomainResult<String> {
        self.collect_field(id, |d, s, e| to_rna(slice(d.as_str(), s, e)))
    }

    pub fn constraints(&self, id: ConstructId) -> DomainResult<String> {
        self.collect_field(id, |d, s, e| slice(&d.constraints(), s, e).to_string())
    }

    pub fn expected_fold(&self, id: ConstructId) -> DomainResult<String> {
        self.collect_field(id, |d, s, e| slice(&d.expected_fold(), s, e).to_string())
    }

    pub fn len(&self, id: ConstructId) -> DomainResult<usize> {
        Ok(self.layout(id)?.len)
    }

    pub fn is_empty(&self, id: ConstructId) -> DomainResult<bool> {
        Ok(self.len(id)? == 0)
    }

    /// Styled text of the window `[start, end)`, each domain in its own style.
    #[instrument(level = "trace", skip(self))]
    pub fn format(&self, id: ConstructId, options: &FormatOptions) -> DomainResult<String> {
        let layout = self.layout(id)?;
        let start = options.start.unwrap_or(0);
        let end = options.end.unwrap_or(layout.len);

        let mut text = String::new();
        for span in &layout.spans {
            if let Some((rel_start, rel_end)) = span.clip(start, end) {
                let domain = self.domain(span.domain)?;
                text.push_str(&domain.format(rel_start, rel_end, options.view, options.color));
            }
        }

        if options.labels {
            text = format!("5'-{}-3'", text);
        }
        if options.pad {
            text = format!("{}{}", " ".repeat(start), text);
        }
        Ok(text)
    }

    /// `(domain, local index)` at global coordinate `index`.
    ///
    /// Negative indices count from the end.
    pub fn domain_from_index(&self, id: ConstructId, index: isize) -> DomainResult<(DomainId, usize)> {
        let layout = self.layout(id)?;
        let len = layout.len;
        let out_of_range = DomainError::IndexOutOfRange { index, len };

        let absolute = if index < 0 {
            len.checked_sub(index.unsigned_abs()).ok_or(out_of_range.clone())?
        } else {
            index as usize
        };
        layout.locate(absolute).ok_or(out_of_range)
    }

    /// Global coordinate of local position `rel_index` of `domain`.
    ///
    /// A name picks the first visible domain with that name.
    pub fn index_from_domain<'a>(
        &self,
        id: ConstructId,
        domain: impl Into<DomainRef<'a>>,
        rel_index: usize,
    ) -> DomainResult<usize> {
        let layout = self.layout(id)?;
        let domain = domain.into();
        let not_found = |name: String| DomainError::NotInLayout {
            domain: name,
            index: rel_index,
        };

        match domain {
            DomainRef::Id(d) => match layout.position_of(d, rel_index) {
                Some(position) => Ok(position),
                None => Err(not_found(self.domain(d)?.name.clone())),
            },
            DomainRef::Name(name) => {
                let mut candidates = Vec::new();
                for d in layout.domains() {
                    if self.domain(d)?.name == name && !candidates.contains(&d) {
                        candidates.push(d);
                    }
                }
                if candidates.is_empty() {
                    return Err(DomainError::UnknownName(name.to_string()));
                }
                candidates
                    .into_iter()
                    .find_map(|d| layout.position_of(d, rel_index))
                    .ok_or_else(|| not_found(name.to_string()))
            }
        }
    }
}

fn logged<T: Default>(result: DomainResult<T>, field: &str) -> T {
    result.unwrap_or_else(|e| {
        debug!(field, error = %e, "view defaulted");
        T::default()
    })
}

fn slice(text: &str, start: usize, end: usize) -> &str {
    text.get(start..end).unwrap_or_default()
}
