use std::collections::{BTreeMap, HashSet};

use crate::catalog::{Branch, Catalog, Entry, NodeId};
use crate::error::CatalogError;
use crate::records::{EoMission, Process, Product, Project, Theme, Variable};
use crate::segmentation::{SegmentationPolicy, group_segmentations};
use crate::slug::slugify;

/// Where each table was read from; stamped on containers as their source.
#[derive(Debug, Clone, Default)]
pub struct TableSources {
    pub themes: Option<String>,
    pub variables: Option<String>,
    pub eo_missions: Option<String>,
    pub projects: Option<String>,
    pub products: Option<String>,
    pub benchmarks: Option<String>,
    pub processes: Option<String>,
}

/// Already parsed records, one ordered list per entity kind.
#[derive(Debug, Clone, Default)]
pub struct CatalogInputs {
    pub themes: Vec<Theme>,
    pub variables: Vec<Variable>,
    pub eo_missions: Vec<EoMission>,
    pub projects: Vec<Project>,
    pub products: Vec<Product>,
    pub benchmarks: Vec<Product>,
    pub processes: Vec<Process>,
    pub sources: TableSources,
}

impl CatalogInputs {
    /// Products followed by benchmarks.
    pub fn all_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().chain(self.benchmarks.iter())
    }
}

const DEFAULT_DESCRIPTION: &str = "A catalog of publicly available geoscience products, \
    datasets and resources developed in the frame of scientific research Projects funded by ESA EO";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub id: String,
    pub title: String,
    pub description: String,
    pub segmentation: SegmentationPolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            id: "OSC-Catalog".to_string(),
            title: "Open Science Catalog".to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            segmentation: SegmentationPolicy::default(),
        }
    }
}

/// Read-only lookup maps from entity key to container, built once.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    pub themes: BTreeMap<String, NodeId>,
    pub variables: BTreeMap<String, NodeId>,
    pub eo_missions: BTreeMap<String, NodeId>,
    pub projects: BTreeMap<String, NodeId>,
    pub processes: BTreeMap<String, NodeId>,
    pub segmentations: BTreeMap<String, NodeId>,
    pub products: BTreeMap<String, NodeId>,
}

impl CatalogIndex {
    pub fn theme(&self, name: &str) -> Option<NodeId> {
        self.themes.get(&slugify(name)).copied()
    }

    pub fn variable(&self, name: &str) -> Option<NodeId> {
        self.variables.get(&slugify(name)).copied()
    }

    pub fn eo_mission(&self, name: &str) -> Option<NodeId> {
        self.eo_missions.get(&slugify(name)).copied()
    }

    pub fn project(&self, name: &str) -> Option<NodeId> {
        self.projects.get(&slugify(name)).copied()
    }

    pub fn product(&self, id: &str) -> Option<NodeId> {
        self.products.get(id).copied()
    }

    pub fn segmentation(&self, title: &str) -> Option<NodeId> {
        self.segmentations.get(title).copied()
    }
}

pub struct CatalogBuilder {
    options: BuildOptions,
}

impl CatalogBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Creates the root, its six branches, and the first level of
    /// containment. Relation edges are added afterwards by the linker.
    pub fn build(&self, inputs: &CatalogInputs) -> Result<(Catalog, CatalogIndex), CatalogError> {
        let mut catalog = Catalog::new(
            &self.options.id,
            &self.options.title,
            &self.options.description,
        );
        let root = catalog.root();
        let mut branches = BTreeMap::new();
        for branch in Branch::ALL {
            let id = catalog.insert(Entry::Branch { branch });
            catalog.push_child(root, id)?;
            branches.insert(branch.id(), id);
        }
        let branch = |kind: Branch| catalog_branch(&branches, kind);

        let sources = &inputs.sources;
        let mut index = CatalogIndex {
            themes: populate(
                &mut catalog,
                branch(Branch::Themes)?,
                inputs.themes.iter().map(|theme| Entry::Theme(theme.clone())),
                sources.themes.as_deref(),
            )?,
            variables: populate(
                &mut catalog,
                branch(Branch::Variables)?,
                inputs
                    .variables
                    .iter()
                    .map(|variable| Entry::Variable(variable.clone())),
                sources.variables.as_deref(),
            )?,
            eo_missions: populate(
                &mut catalog,
                branch(Branch::EoMissions)?,
                inputs
                    .eo_missions
                    .iter()
                    .map(|mission| Entry::EoMission(mission.clone())),
                sources.eo_missions.as_deref(),
            )?,
            projects: populate(
                &mut catalog,
                branch(Branch::Projects)?,
                inputs
                    .projects
                    .iter()
                    .map(|project| Entry::Project(project.clone())),
                sources.projects.as_deref(),
            )?,
            processes: populate(
                &mut catalog,
                branch(Branch::Processes)?,
                inputs
                    .processes
                    .iter()
                    .map(|process| Entry::Process(process.clone())),
                sources.processes.as_deref(),
            )?,
            ..CatalogIndex::default()
        };

        // first occurrence of a short name wins, as in attach_products
        let mut seen = HashSet::new();
        let all_products: Vec<Product> = inputs
            .all_products()
            .filter(|product| seen.insert(product.id.as_str()))
            .cloned()
            .collect();
        let segmentations = group_segmentations(&all_products, self.options.segmentation);
        let products_branch = branch(Branch::Products)?;
        index.segmentations = populate(
            &mut catalog,
            products_branch,
            segmentations.into_iter().map(Entry::Segmentation),
            None,
        )?;
        self.attach_products(&mut catalog, &mut index, products_branch, inputs)?;

        tracing::info!(
            themes = index.themes.len(),
            variables = index.variables.len(),
            eo_missions = index.eo_missions.len(),
            projects = index.projects.len(),
            processes = index.processes.len(),
            segmentations = index.segmentations.len(),
            products = index.products.len(),
            "catalog skeleton built"
        );
        Ok((catalog, index))
    }

    fn attach_products(
        &self,
        catalog: &mut Catalog,
        index: &mut CatalogIndex,
        products_branch: NodeId,
        inputs: &CatalogInputs,
    ) -> Result<(), CatalogError> {
        let mut products: Vec<(&Product, Option<&str>)> = inputs
            .products
            .iter()
            .map(|product| (product, inputs.sources.products.as_deref()))
            .chain(
                inputs
                    .benchmarks
                    .iter()
                    .map(|product| (product, inputs.sources.benchmarks.as_deref())),
            )
            .collect();
        products.sort_by(|(a, _), (b, _)| a.id.cmp(&b.id));

        for (product, source) in products {
            if index.products.contains_key(&product.id) {
                tracing::warn!(product = %product.id, "duplicate product id, keeping the first");
                continue;
            }
            let id = catalog.insert(Entry::Product(product.clone()));
            if let Some(source) = source {
                catalog.set_source(id, source);
            }
            let parent = match product.collection_key() {
                Some(collection) => index.segmentation(collection).unwrap_or_else(|| {
                    tracing::debug!(
                        product = %product.id,
                        collection,
                        "no segmentation parent, attaching under products"
                    );
                    products_branch
                }),
                None => products_branch,
            };
            catalog.push_child(parent, id)?;
            index.products.insert(product.id.clone(), id);
        }
        Ok(())
    }
}

fn catalog_branch(
    branches: &BTreeMap<&'static str, NodeId>,
    branch: Branch,
) -> Result<NodeId, CatalogError> {
    branches
        .get(branch.id())
        .copied()
        .ok_or_else(|| CatalogError::MissingBranch(branch.id().to_string()))
}

/// One child per distinct entity key, appended in key order. Later records
/// that repeat a key are dropped.
fn populate(
    catalog: &mut Catalog,
    parent: NodeId,
    entries: impl Iterator<Item = Entry>,
    source: Option<&str>,
) -> Result<BTreeMap<String, NodeId>, CatalogError> {
    let mut keyed: BTreeMap<String, NodeId> = BTreeMap::new();
    for entry in entries {
        let (key, _) = entry.identity();
        if keyed.contains_key(&key) {
            tracing::warn!(
                kind = entry.kind_label(),
                key = %key,
                "duplicate entity key, keeping the first"
            );
            continue;
        }
        let id = catalog.insert(entry);
        if let Some(source) = source {
            catalog.set_source(id, source);
        }
        keyed.insert(key, id);
    }
    // BTreeMap iteration is the case-sensitive identifier order
    for child in keyed.values() {
        catalog.push_child(parent, *child)?;
    }
    Ok(keyed)
}
