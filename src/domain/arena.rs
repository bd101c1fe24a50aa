use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use generational_arena::Arena;
use tracing::{debug, instrument};

use crate::domain::construct::{
    AttachIndex, Attachment, Construct, ConstructId, DomainId, DomainRef, Part,
};
use crate::domain::entities::Domain;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::layout::Layout;

/// Owner of every domain and construct in a design session.
///
/// Constructs refer to domains by `DomainId`, so a domain used by several
/// constructs is shared on purpose and `owners` reports who holds it.
/// `copy_construct` is the way to get an independent tree.
#[derive(Debug, Default)]
pub struct DesignArena {
    domains: Arena<Domain>,
    constructs: Arena<Construct>,
    pub(crate) layouts: RefCell<HashMap<ConstructId, Rc<Layout>>>,
}

impl DesignArena {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // storage
    // ------------------------------------------------------------------

    #[instrument(level = "trace", skip(self, domain), fields(domain = %domain.name))]
    pub fn add_domain(&mut self, domain: Domain) -> DomainId {
        DomainId(self.domains.insert(domain))
    }

    pub fn domain(&self, id: DomainId) -> DomainResult<&Domain> {
        self.domains.get(id.0).ok_or(DomainError::UnknownDomain)
    }

    /// Mutable access to a domain. Every construct holding `id` sees the edit.
    pub fn domain_mut(&mut self, id: DomainId) -> DomainResult<&mut Domain> {
        self.invalidate();
        self.domains.get_mut(id.0).ok_or(DomainError::UnknownDomain)
    }

    pub fn new_construct(&mut self, name: impl Into<String>) -> ConstructId {
        ConstructId(self.constructs.insert(Construct::new(name)))
    }

    /// Construct holding freshly added `domains`, in order.
    pub fn construct_from(
        &mut self,
        name: impl Into<String>,
        domains: impl IntoIterator<Item = Domain>,
    ) -> ConstructId {
        let mut construct = Construct::new(name);
        construct.domains = domains.into_iter().map(|d| self.add_domain(d)).collect();
        ConstructId(self.constructs.insert(construct))
    }

    pub fn construct(&self, id: ConstructId) -> DomainResult<&Construct> {
        self.constructs.get(id.0).ok_or(DomainError::UnknownConstruct)
    }

    fn construct_mut(&mut self, id: ConstructId) -> DomainResult<&mut Construct> {
        self.invalidate();
        self.constructs
            .get_mut(id.0)
            .ok_or(DomainError::UnknownConstruct)
    }

    pub fn rename(&mut self, id: ConstructId, name: impl Into<String>) -> DomainResult<()> {
        self.construct_mut(id)?.name = name.into();
        Ok(())
    }

    /// Drop a construct from the arena. Its domains stay.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_construct(&mut self, id: ConstructId) -> DomainResult<Construct> {
        let name = self.construct(id)?.name.clone();
        let in_use = self
            .constructs
            .iter()
            .any(|(_, c)| c.attachments.iter().any(|a| a.construct == id));
        if in_use {
            return Err(DomainError::InUse(name));
        }
        self.invalidate();
        self.constructs
            .remove(id.0)
            .ok_or(DomainError::UnknownConstruct)
    }

    /// Constructs whose domain list holds `domain`.
    pub fn owners(&self, domain: DomainId) -> Vec<ConstructId> {
        self.constructs
            .iter()
            .filter(|(_, c)| c.contains(domain))
            .map(|(idx, _)| ConstructId(idx))
            .collect()
    }

    pub fn is_shared(&self, domain: DomainId) -> bool {
        self.owners(domain).len() > 1
    }

    pub fn construct_ids(&self) -> impl Iterator<Item = ConstructId> + '_ {
        self.constructs.iter().map(|(idx, _)| ConstructId(idx))
    }

    // ------------------------------------------------------------------
    // lookup
    // ------------------------------------------------------------------

    /// Domains named any of `names`, in the list and, recursively, in
    /// attached constructs.
    pub fn domains_from_name(&self, id: ConstructId, names: &[&str]) -> DomainResult<Vec<DomainId>> {
        let construct = self.construct(id)?;
        let mut found = Vec::new();
        for &d in &construct.domains {
            if names.contains(&self.domain(d)?.name.as_str()) {
                found.push(d);
            }
        }
        for attachment in &construct.attachments {
            found.extend(self.domains_from_name(attachment.construct, names)?);
        }
        Ok(found)
    }

    /// The one domain called `name`.
    pub fn find_domain(&self, id: ConstructId, name: &str) -> DomainResult<DomainId> {
        let mut found = self.domains_from_name(id, &[name])?;
        found.dedup();
        match found.len() {
            1 => Ok(found[0]),
            0 => Err(DomainError::UnknownName(name.to_string())),
            count => Err(DomainError::AmbiguousName {
                name: name.to_string(),
                count,
            }),
        }
    }

    pub fn resolve(&self, id: ConstructId, domain: DomainRef<'_>) -> DomainResult<DomainId> {
        match domain {
            DomainRef::Id(d) => self.domain(d).map(|_| d),
            DomainRef::Name(name) => self.find_domain(id, name),
        }
    }

    /// Resolve and require membership in the top-level domain list.
    fn resolve_member(&self, id: ConstructId, domain: DomainRef<'_>) -> DomainResult<DomainId> {
        let resolved = self.resolve(id, domain)?;
        let construct = self.construct(id)?;
        if construct.contains(resolved) {
            Ok(resolved)
        } else {
            Err(DomainError::NotAMember {
                domain: self.domain(resolved)?.name.clone(),
                construct: construct.name.clone(),
            })
        }
    }

    /// Whether `needle` is `haystack` or is attached anywhere below it.
    fn reaches(&self, haystack: ConstructId, needle: ConstructId) -> DomainResult<bool> {
        let mut stack = vec![haystack];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == needle {
                return Ok(true);
            }
            if visited.insert(current) {
                stack.extend(self.construct(current)?.attachments.iter().map(|a| a.construct));
            }
        }
        Ok(false)
    }

    // ------------------------------------------------------------------
    // domain list
    // ------------------------------------------------------------------

    pub fn append(&mut self, id: ConstructId, part: impl Into<Part>) -> DomainResult<()> {
        let end = self.construct(id)?.domains.len();
        self.insert_at(id, end, part)
    }

    pub fn prepend(&mut self, id: ConstructId, part: impl Into<Part>) -> DomainResult<()> {
        self.insert_at(id, 0, part)
    }

    /// Insert a domain, or splice in another construct's domains and
    /// attachments by handle, before list position `position`.
    #[instrument(level = "debug", skip(self, part))]
    pub fn insert_at(
        &mut self,
        id: ConstructId,
        position: usize,
        part: impl Into<Part>,
    ) -> DomainResult<()> {
        let part = part.into();
        let len = self.construct(id)?.domains.len();
        if position > len {
            return Err(DomainError::IndexOutOfRange {
                index: position as isize,
                len,
            });
        }

        let (domains, attachments) = match part {
            Part::Domain(d) => {
                self.domain(d)?;
                (vec![d], Vec::new())
            }
            Part::Construct(other) => {
                let source = self.construct(other)?;
                for a in &source.attachments {
                    if self.reaches(a.construct, id)? {
                        return Err(DomainError::CycleDetected {
                            construct: self.construct(id)?.name.clone(),
                            nested: self.construct(a.construct)?.name.clone(),
                        });
                    }
                }
                (source.domains.clone(), source.attachments.clone())
            }
        };

        // Build the result on scratch copies: an insert that leaves any
        // attachment without an end anchor after its start is rejected.
        let mut scratch = self.construct(id)?.clone();
        scratch.domains.splice(position..position, domains);
        for attachment in attachments {
            scratch.upsert_attachment(attachment);
        }
        if let Some(bad) = scratch
            .attachments
            .iter()
            .find(|a| !a.anchors_in_order(&scratch.domains))
        {
            debug!(construct = %scratch.name, "rejected insert breaking attachment order");
            return Err(self.order_error(bad)?);
        }

        let construct = self.construct_mut(id)?;
        *construct = scratch;
        debug!(construct = %construct.name, domains = construct.domains.len(), "inserted");
        Ok(())
    }

    /// Remove domains and every attachment that starts or ends on them.
    ///
    /// All targets are resolved first, so an unknown name removes nothing.
    #[instrument(level = "debug", skip(self, domains))]
    pub fn remove(&mut self, id: ConstructId, domains: &[DomainRef<'_>]) -> DomainResult<()> {
        let targets = domains
            .iter()
            .map(|&d| self.resolve_member(id, d))
            .collect::<DomainResult<Vec<_>>>()?;

        let construct = self.construct_mut(id)?;
        for target in targets {
            remove_domain(construct, target);
        }
        Ok(())
    }

    /// Remove `domain` and insert `part` where it was.
    #[instrument(level = "debug", skip(self, domain, part))]
    pub fn replace<'a>(
        &mut self,
        id: ConstructId,
        domain: impl Into<DomainRef<'a>>,
        part: impl Into<Part>,
    ) -> DomainResult<()> {
        let target = self.resolve_member(id, domain.into())?;
        let part = part.into();

        // Validate the insert against a scratch copy so a rejected part
        // leaves the construct untouched.
        let before = self.construct(id)?.clone();
        let position = {
            let construct = self.construct_mut(id)?;
            remove_domain(construct, target)
        };
        if let Err(e) = self.insert_at(id, position, part) {
            *self.construct_mut(id)? = before;
            return Err(e);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // attachments
    // ------------------------------------------------------------------

    /// Splice `nested` into `[start[start_index], end[end_index])`.
    #[instrument(level = "debug", skip(self, start, end))]
    pub fn attach<'a>(
        &mut self,
        id: ConstructId,
        nested: ConstructId,
        start: impl Into<DomainRef<'a>>,
        start_index: impl Into<AttachIndex> + std::fmt::Debug,
        end: impl Into<DomainRef<'a>>,
        end_index: impl Into<AttachIndex> + std::fmt::Debug,
    ) -> DomainResult<()> {
        let attachment = self.validate_attachment(
            id,
            nested,
            start.into(),
            start_index.into(),
            end.into(),
            end_index.into(),
            None,
        )?;
        self.construct_mut(id)?.upsert_attachment(attachment);
        Ok(())
    }

    /// Remove every attachment of `nested`. Returns how many were removed.
    #[instrument(level = "debug", skip(self))]
    pub fn unattach(&mut self, id: ConstructId, nested: ConstructId) -> DomainResult<usize> {
        let construct = self.construct_mut(id)?;
        let before = construct.attachments.len();
        construct.attachments.retain(|a| a.construct != nested);
        Ok(before - construct.attachments.len())
    }

    /// Move `nested` to a new span.
    ///
    /// The new position is validated as if `nested` were already gone; on
    /// failure the old attachment stays in place.
    #[instrument(level = "debug", skip(self, start, end))]
    pub fn reattach<'a>(
        &mut self,
        id: ConstructId,
        nested: ConstructId,
        start: impl Into<DomainRef<'a>>,
        start_index: impl Into<AttachIndex> + std::fmt::Debug,
        end: impl Into<DomainRef<'a>>,
        end_index: impl Into<AttachIndex> + std::fmt::Debug,
    ) -> DomainResult<()> {
        let attachment = self.validate_attachment(
            id,
            nested,
            start.into(),
            start_index.into(),
            end.into(),
            end_index.into(),
            Some(nested),
        )?;
        let construct = self.construct_mut(id)?;
        construct.attachments.retain(|a| a.construct != nested);
        construct.upsert_attachment(attachment);
        Ok(())
    }

    /// Check every attachment invariant without touching state.
    ///
    /// Attachments of `replacing` are treated as already removed.
    #[allow(clippy::too_many_arguments)]
    fn validate_attachment(
        &self,
        id: ConstructId,
        nested: ConstructId,
        start: DomainRef<'_>,
        start_index: AttachIndex,
        end: DomainRef<'_>,
        end_index: AttachIndex,
        replacing: Option<ConstructId>,
    ) -> DomainResult<Attachment> {
        let construct = self.construct(id)?;
        self.construct(nested)?;

        let start_domain = self.resolve_member(id, start)?;
        let end_domain = self.resolve_member(id, end)?;
        let start_dom = self.domain(start_domain)?;
        let end_dom = self.domain(end_domain)?;
        let start_index = start_index.resolve(start_dom.as_str().len());
        let end_index = end_index.resolve(end_dom.as_str().len());

        for (dom, index) in [(start_dom, start_index), (end_dom, end_index)] {
            if !dom.is_attachment_site(index) {
                debug!(domain = %dom.name, index, "rejected attachment site");
                return Err(DomainError::IllegalAttachmentSite {
                    domain: dom.name.clone(),
                    index,
                });
            }
        }

        let attachment = Attachment {
            start_domain,
            start_index,
            end_domain,
            end_index,
            construct: nested,
        };
        if !attachment.anchors_in_order(&construct.domains) {
            return Err(self.order_error(&attachment)?);
        }

        if let Some(existing) = construct.attachment_on(start_domain) {
            if Some(existing.construct) != replacing {
                return Err(DomainError::AlreadyAttached(start_dom.name.clone()));
            }
        }

        if self.reaches(nested, id)? {
            return Err(DomainError::CycleDetected {
                construct: construct.name.clone(),
                nested: self.construct(nested)?.name.clone(),
            });
        }

        Ok(attachment)
    }

    fn order_error(&self, attachment: &Attachment) -> DomainResult<DomainError> {
        Ok(DomainError::AttachmentOrder {
            start: self.domain(attachment.start_domain)?.name.clone(),
            start_index: attachment.start_index,
            end: self.domain(attachment.end_domain)?.name.clone(),
            end_index: attachment.end_index,
        })
    }

    // ------------------------------------------------------------------
    // copies
    // ------------------------------------------------------------------

    pub fn copy_domain(&mut self, id: DomainId) -> DomainResult<DomainId> {
        let copy = self.domain(id)?.copy();
        Ok(self.add_domain(copy))
    }

    /// Deep clone of `id`, its domains and every attached construct.
    ///
    /// Sharing inside the tree is kept inside the copy: a domain or construct
    /// reached twice is cloned once.
    #[instrument(level = "debug", skip(self))]
    pub fn copy_construct(&mut self, id: ConstructId) -> DomainResult<ConstructId> {
        let mut domain_map = HashMap::new();
        let mut construct_map = HashMap::new();
        self.copy_tree(id, &mut domain_map, &mut construct_map)
    }

    fn copy_tree(
        &mut self,
        id: ConstructId,
        domain_map: &mut HashMap<DomainId, DomainId>,
        construct_map: &mut HashMap<ConstructId, ConstructId>,
    ) -> DomainResult<ConstructId> {
        if let Some(&done) = construct_map.get(&id) {
            return Ok(done);
        }
        let original = self.construct(id)?.clone();

        let mut copy = Construct::new(original.name.clone());
        copy.doc = original.doc.clone();
        for &d in &original.domains {
            copy.domains.push(self.copy_mapped(d, domain_map)?);
        }
        for a in &original.attachments {
            let nested = self.copy_tree(a.construct, domain_map, construct_map)?;
            copy.attachments.push(Attachment {
                start_domain: self.copy_mapped(a.start_domain, domain_map)?,
                start_index: a.start_index,
                end_domain: self.copy_mapped(a.end_domain, domain_map)?,
                end_index: a.end_index,
                construct: nested,
            });
        }

        let new_id = ConstructId(self.constructs.insert(copy));
        construct_map.insert(id, new_id);
        Ok(new_id)
    }

    fn copy_mapped(
        &mut self,
        id: DomainId,
        domain_map: &mut HashMap<DomainId, DomainId>,
    ) -> DomainResult<DomainId> {
        if let Some(&done) = domain_map.get(&id) {
            return Ok(done);
        }
        let new_id = self.copy_domain(id)?;
        domain_map.insert(id, new_id);
        Ok(new_id)
    }
}

/// Drop the first occurrence of `domain` and cascade to its attachments.
/// Returns the vacated list position.
fn remove_domain(construct: &mut Construct, domain: DomainId) -> usize {
    let Some(position) = construct.position(domain) else {
        return construct.domains.len();
    };
    construct.domains.remove(position);
    construct.attachments.retain(|a| !a.touches(domain));
    position
}
