/*
Structure display of a construct: domains in list order, with each attachment
rendered as a subtree under its start domain. Occluded domains are marked.
 */
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::DesignArena;
use crate::domain::construct::ConstructId;
use crate::domain::error::DomainResult;

pub trait TreeNodeConvert {
    fn to_tree_string(&self, id: ConstructId) -> DomainResult<Tree<String>>;
}

impl TreeNodeConvert for DesignArena {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, id: ConstructId) -> DomainResult<Tree<String>> {
        let construct = self.construct(id)?;
        let mut root = Tree::new(format!("{} ({} nt)", construct.name, self.len(id)?));

        let mut occluding: Option<usize> = None;
        for (position, &domain_id) in construct.domains().iter().enumerate() {
            let domain = self.domain(domain_id)?;
            let mut label = format!("{}: {}", domain.name, domain.as_str());
            if let Some(color) = domain.style.color {
                label.push_str(&format!(" [{:?} {}]", color, domain.style.weight));
            }
            if self.is_shared(domain_id) {
                label.push_str(" (shared)");
            }

            // Domains strictly inside an attachment span contribute nothing.
            if let Some(end) = occluding {
                if position < end {
                    label.push_str(" (occluded)");
                } else {
                    occluding = None;
                }
            }

            let mut node = Tree::new(label);
            if let Some(attachment) = construct.attachment_on(domain_id) {
                let end_domain = self.domain(attachment.end_domain)?;
                let mut branch = self.to_tree_string(attachment.construct)?;
                branch.root = format!(
                    "[{}..{}:{}] {}",
                    attachment.start_index, end_domain.name, attachment.end_index, branch.root
                );
                node.push(branch);
                occluding = construct.position(attachment.end_domain);
            }
            root.push(node);
        }

        Ok(root)
    }
}
