use crate::builder::CatalogIndex;
use crate::catalog::{Branch, Catalog, CrossRefs, NodeId, RelationKind};
use crate::error::CatalogError;

/// Counts of what a linking pass changed. A second pass over the same
/// catalog reports zero for both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkSummary {
    pub relations: usize,
    pub attachments: usize,
}

/// Adds relation edges and multi-parent containment to a built catalog.
///
/// Every lookup is expected to succeed: references are checked by
/// [`crate::validate::validate`] beforehand, so a miss here is returned as
/// [`CatalogError::UnresolvedLink`] and aborts the build.
pub struct CrossLinker<'a> {
    index: &'a CatalogIndex,
}

impl<'a> CrossLinker<'a> {
    pub fn new(index: &'a CatalogIndex) -> Self {
        Self { index }
    }

    pub fn link(&self, catalog: &mut Catalog) -> Result<LinkSummary, CatalogError> {
        let mut summary = LinkSummary::default();

        for node in self.index.variables.values() {
            let refs = catalog.node(*node).refs().clone();
            for theme in &refs.themes {
                let target = self.resolve(catalog, *node, RelationKind::Theme, theme)?;
                summary.relations +=
                    usize::from(catalog.add_relation(*node, RelationKind::Theme, target));
            }
        }

        for node in self.index.projects.values() {
            let refs = catalog.node(*node).refs().clone();
            for theme in &refs.themes {
                let target = self.resolve(catalog, *node, RelationKind::Theme, theme)?;
                summary.relations +=
                    usize::from(catalog.add_relation(*node, RelationKind::Theme, target));
            }
        }

        for node in self.index.processes.values() {
            let refs = catalog.node(*node).refs().clone();
            if let Some(project) = &refs.project {
                let target = self.resolve(catalog, *node, RelationKind::Project, project)?;
                summary.relations +=
                    usize::from(catalog.add_relation(*node, RelationKind::Project, target));
            }
        }

        let products = catalog.branch(Branch::Products)?;
        for node in catalog.children(products).to_vec() {
            let refs = catalog.node(node).refs().clone();
            self.link_product(catalog, node, &refs, &mut summary)?;
        }

        tracing::info!(
            relations = summary.relations,
            attachments = summary.attachments,
            "cross-links added"
        );
        Ok(summary)
    }

    fn link_product(
        &self,
        catalog: &mut Catalog,
        node: NodeId,
        refs: &CrossRefs,
        summary: &mut LinkSummary,
    ) -> Result<(), CatalogError> {
        let targets = refs
            .project
            .iter()
            .map(|name| (RelationKind::Project, name))
            .chain(refs.themes.iter().map(|name| (RelationKind::Theme, name)))
            .chain(refs.variables.iter().map(|name| (RelationKind::Variable, name)))
            .chain(refs.eo_missions.iter().map(|name| (RelationKind::EoMission, name)));

        for (kind, name) in targets {
            let target = self.resolve(catalog, node, kind, name)?;
            summary.relations += usize::from(catalog.add_relation(node, kind, target));
            summary.attachments += usize::from(catalog.attach_sorted(target, node)?);
        }
        Ok(())
    }

    fn resolve(
        &self,
        catalog: &Catalog,
        source: NodeId,
        kind: RelationKind,
        name: &str,
    ) -> Result<NodeId, CatalogError> {
        let found = match kind {
            RelationKind::Project => self.index.project(name),
            RelationKind::Theme => self.index.theme(name),
            RelationKind::Variable => self.index.variable(name),
            RelationKind::EoMission => self.index.eo_mission(name),
        };
        found.ok_or_else(|| {
            let container = catalog.node(source);
            CatalogError::UnresolvedLink {
                source_kind: container.entry().kind_label(),
                source_id: container.id().to_string(),
                target_kind: kind.label(),
                target: name.to_string(),
            }
        })
    }
}
