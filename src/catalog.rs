use std::collections::{HashMap, HashSet};
use std::fmt;

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CatalogError;
use crate::records::{
    EoMission, Process, Product, ProductKind, ProductSegmentation, Project, Theme, Variable,
};

/// Stable handle of a container inside a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Fixed sub-containers of the root, in attachment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Branch {
    Projects,
    Themes,
    Variables,
    EoMissions,
    Products,
    Processes,
}

impl Branch {
    pub const ALL: [Branch; 6] = [
        Branch::Projects,
        Branch::Themes,
        Branch::Variables,
        Branch::EoMissions,
        Branch::Products,
        Branch::Processes,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Branch::Projects => "projects",
            Branch::Themes => "themes",
            Branch::Variables => "variables",
            Branch::EoMissions => "eo-missions",
            Branch::Products => "products",
            Branch::Processes => "processes",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Branch::Projects => "Projects",
            Branch::Themes => "Themes",
            Branch::Variables => "Variables",
            Branch::EoMissions => "EO Missions",
            Branch::Products => "Products",
            Branch::Processes => "Processes",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// What a container stands for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entity", rename_all = "kebab-case")]
pub enum Entry {
    Root { description: String },
    Branch { branch: Branch },
    Theme(Theme),
    Variable(Variable),
    EoMission(EoMission),
    Project(Project),
    Product(Product),
    Segmentation(ProductSegmentation),
    Process(Process),
}

impl Entry {
    /// `(container id, display title)`
    pub(crate) fn identity(&self) -> (String, String) {
        match self {
            Entry::Root { .. } => (String::new(), String::new()),
            Entry::Branch { branch } => (branch.id().to_string(), branch.title().to_string()),
            Entry::Theme(theme) => (theme.key(), theme.name.clone()),
            Entry::Variable(variable) => (variable.key(), variable.name.clone()),
            Entry::EoMission(mission) => (mission.key(), mission.name.clone()),
            Entry::Project(project) => (project.key(), project.name.clone()),
            Entry::Product(product) => (product.key(), product.title.clone()),
            Entry::Segmentation(segmentation) => {
                (segmentation.key(), segmentation.title.clone())
            }
            Entry::Process(process) => (process.key(), process.name.clone()),
        }
    }

    /// Label used in log lines and error messages.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Entry::Root { .. } => "catalog",
            Entry::Branch { .. } => "branch",
            Entry::Theme(_) => "theme",
            Entry::Variable(_) => "variable",
            Entry::EoMission(_) => "eo-mission",
            Entry::Project(_) => "project",
            Entry::Product(product) => match product.kind {
                ProductKind::Product => "product",
                ProductKind::Benchmark => "benchmark",
            },
            Entry::Segmentation(_) => "product segmentation",
            Entry::Process(_) => "process",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Entry::Root { description } => description,
            Entry::Branch { .. } => "",
            Entry::Theme(theme) => &theme.description,
            Entry::Variable(variable) => &variable.description,
            Entry::EoMission(mission) => &mission.description,
            Entry::Project(project) => &project.description,
            Entry::Product(product) => &product.description,
            Entry::Segmentation(_) => "",
            Entry::Process(process) => &process.description,
        }
    }

    /// `(start, end)` of the entity, when it has a temporal extent.
    pub fn interval(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self {
            Entry::Project(project) => (project.start, project.end),
            Entry::Product(product) => (product.start, product.end),
            Entry::Segmentation(segmentation) => (segmentation.start, segmentation.end),
            _ => (None, None),
        }
    }
}

/// Cross-reference names a container carries, captured when it is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossRefs {
    pub project: Option<String>,
    pub themes: Vec<String>,
    pub variables: Vec<String>,
    pub eo_missions: Vec<String>,
}

impl CrossRefs {
    fn of(entry: &Entry) -> Self {
        match entry {
            Entry::Variable(variable) => Self {
                themes: variable.themes.clone(),
                ..Self::default()
            },
            Entry::Project(project) => Self {
                themes: project.themes.clone(),
                ..Self::default()
            },
            Entry::Product(product) => Self {
                project: Some(product.project.clone()),
                themes: product.themes.clone(),
                variables: product.variables.clone(),
                eo_missions: product.eo_missions.clone(),
            },
            Entry::Segmentation(segmentation) => Self {
                project: Some(segmentation.project.clone()),
                themes: segmentation.themes.clone(),
                variables: segmentation.variables.clone(),
                eo_missions: segmentation.eo_missions.clone(),
            },
            Entry::Process(process) => Self {
                project: Some(process.project.clone()),
                ..Self::default()
            },
            Entry::Root { .. } | Entry::Branch { .. } | Entry::Theme(_) | Entry::EoMission(_) => {
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    Project,
    Theme,
    Variable,
    EoMission,
}

impl RelationKind {
    pub fn label(self) -> &'static str {
        match self {
            RelationKind::Project => "Project",
            RelationKind::Theme => "Theme",
            RelationKind::Variable => "Variable",
            RelationKind::EoMission => "EO Mission",
        }
    }
}

/// Non-hierarchical edge from one container to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: NodeId,
}

#[derive(Debug, Clone)]
pub struct Container {
    id: String,
    title: String,
    entry: Entry,
    refs: CrossRefs,
    children: Vec<NodeId>,
    parents: Vec<NodeId>,
    relations: Vec<Relation>,
    source: Option<String>,
}

impl Container {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn refs(&self) -> &CrossRefs {
        &self.refs
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Every container this one is attached under, in attachment order.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Backing-store location the entity was read from, if known.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Source of "last modified" timestamps for local backing files.
pub trait ModificationTimes {
    fn modified(&self, path: &Utf8Path) -> Option<DateTime<Utc>>;
}

/// Reads modification times from the local filesystem.
pub struct FileModificationTimes;

impl ModificationTimes for FileModificationTimes {
    fn modified(&self, path: &Utf8Path) -> Option<DateTime<Utc>> {
        let modified = std::fs::metadata(path.as_std_path())
            .and_then(|meta| meta.modified())
            .ok()?;
        Some(DateTime::<Utc>::from(modified))
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Arena of containers. Branches reference containers by [`NodeId`], so a
/// container attached under several parents is one object seen from each.
#[derive(Debug, Clone)]
pub struct Catalog {
    nodes: Vec<Container>,
    root: NodeId,
}

impl Catalog {
    pub fn new(id: &str, title: &str, description: &str) -> Self {
        let root = Container {
            id: id.to_string(),
            title: title.to_string(),
            entry: Entry::Root {
                description: description.to_string(),
            },
            refs: CrossRefs::default(),
            children: Vec::new(),
            parents: Vec::new(),
            relations: Vec::new(),
            source: None,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a detached container and returns its handle.
    pub fn insert(&mut self, entry: Entry) -> NodeId {
        let (id, title) = entry.identity();
        let refs = CrossRefs::of(&entry);
        self.nodes.push(Container {
            id,
            title,
            entry,
            refs,
            children: Vec::new(),
            parents: Vec::new(),
            relations: Vec::new(),
            source: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Container {
        &self.nodes[id.0]
    }

    pub fn set_source(&mut self, id: NodeId, source: impl Into<String>) {
        self.nodes[id.0].source = Some(source.into());
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child_by_id(&self, parent: NodeId, child_id: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].id == child_id)
    }

    pub fn branch(&self, branch: Branch) -> Result<NodeId, CatalogError> {
        self.child_by_id(self.root, branch.id())
            .ok_or_else(|| CatalogError::MissingBranch(branch.id().to_string()))
    }

    /// Targets of the relation edges of `kind` leaving `id`.
    pub fn relations(&self, id: NodeId, kind: RelationKind) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .relations
            .iter()
            .filter(move |relation| relation.kind == kind)
            .map(|relation| relation.target)
    }

    /// Appends `child` to `parent`. Returns `false` when it is already there.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, CatalogError> {
        if self.is_attached(parent, child)? {
            return Ok(false);
        }
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parents.push(parent);
        Ok(true)
    }

    /// Inserts `child` among the children of `parent` in case-insensitive
    /// title order. Returns `false` when it is already there.
    pub fn attach_sorted(&mut self, parent: NodeId, child: NodeId) -> Result<bool, CatalogError> {
        if self.is_attached(parent, child)? {
            return Ok(false);
        }
        let title = self.nodes[child.0].title.to_lowercase();
        let position = self.nodes[parent.0]
            .children
            .partition_point(|sibling| self.nodes[sibling.0].title.to_lowercase() <= title);
        self.nodes[parent.0].children.insert(position, child);
        self.nodes[child.0].parents.push(parent);
        Ok(true)
    }

    fn is_attached(&self, parent: NodeId, child: NodeId) -> Result<bool, CatalogError> {
        let child_id = &self.nodes[child.0].id;
        match self.child_by_id(parent, child_id) {
            Some(existing) if existing == child => Ok(true),
            Some(_) => Err(CatalogError::DuplicateChild {
                parent: self.nodes[parent.0].id.clone(),
                child: child_id.clone(),
            }),
            None => Ok(false),
        }
    }

    /// Adds a relation edge unless an identical one exists.
    pub fn add_relation(&mut self, source: NodeId, kind: RelationKind, target: NodeId) -> bool {
        let relation = Relation { kind, target };
        let relations = &mut self.nodes[source.0].relations;
        if relations.contains(&relation) {
            return false;
        }
        relations.push(relation);
        true
    }

    /// Pre-order walk from the root visiting each container once, following
    /// children in order. A shared container is reached through the first
    /// parent the walk meets.
    pub fn walk(&self) -> Vec<(NodeId, Option<NodeId>)> {
        let mut seen = HashSet::new();
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, None)];
        while let Some((id, parent)) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push((id, parent));
            for child in self.nodes[id.0].children.iter().rev() {
                if !seen.contains(child) {
                    stack.push((*child, Some(id)));
                }
            }
        }
        order
    }

    /// Latest modification time of a container: its own backing source, and
    /// every descendant container's resolved time. Remote sources are never
    /// passed to `times`.
    pub fn resolve_updated(
        &self,
        id: NodeId,
        times: &dyn ModificationTimes,
    ) -> Option<DateTime<Utc>> {
        let mut memo = HashMap::new();
        self.resolve_updated_memo(id, times, &mut memo)
    }

    fn resolve_updated_memo(
        &self,
        id: NodeId,
        times: &dyn ModificationTimes,
        memo: &mut HashMap<NodeId, Option<DateTime<Utc>>>,
    ) -> Option<DateTime<Utc>> {
        if let Some(cached) = memo.get(&id) {
            return *cached;
        }
        let node = &self.nodes[id.0];
        let own = node
            .source
            .as_deref()
            .filter(|source| !is_remote(source))
            .and_then(|source| times.modified(Utf8Path::new(source)));
        let resolved = node
            .children
            .iter()
            .map(|child| self.resolve_updated_memo(*child, times, memo))
            .fold(own, std::cmp::max);
        memo.insert(id, resolved);
        resolved
    }
}
