use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::catalog::{Branch, Catalog, Entry, NodeId};
use crate::error::CatalogError;
use crate::slug::slugify;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogMetrics {
    pub id: String,
    pub summary: GlobalSummary,
    pub themes: Vec<ThemeMetrics>,
    pub variables: Vec<VariableMetrics>,
    #[serde(rename = "eo-missions")]
    pub eo_missions: Vec<MissionMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSummary {
    pub years: Vec<i32>,
    pub number_of_products: usize,
    pub number_of_projects: usize,
    pub number_of_variables: usize,
    pub number_of_themes: usize,
    pub number_of_missions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeMetrics {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub website: Option<String>,
    pub summary: ThemeSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSummary {
    pub years: Vec<i32>,
    pub number_of_products: usize,
    pub number_of_projects: usize,
    pub number_of_variables: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableMetrics {
    pub name: String,
    pub description: String,
    pub summary: VariableSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableSummary {
    pub years: Vec<i32>,
    pub number_of_products: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissionMetrics {
    pub name: String,
    pub summary: MissionSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSummary {
    pub years: Vec<i32>,
    pub number_of_products: usize,
    pub number_of_projects: usize,
}

/// Calendar years covered inclusively by `start..=end`. Empty unless both
/// endpoints are known.
pub fn years_spanned(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> BTreeSet<i32> {
    match (start, end) {
        (Some(start), Some(end)) => (start.year()..=end.year()).collect(),
        _ => BTreeSet::new(),
    }
}

#[derive(Debug, Default)]
struct ThemeAcc {
    name: String,
    description: String,
    image: Option<String>,
    website: Option<String>,
    products: usize,
    projects: usize,
    variables: usize,
    years: BTreeSet<i32>,
}

#[derive(Debug, Default)]
struct VariableAcc {
    name: String,
    description: String,
    themes: Vec<String>,
    products: usize,
    years: BTreeSet<i32>,
}

#[derive(Debug, Default)]
struct MissionAcc {
    name: String,
    products: usize,
    projects: Vec<String>,
    years: BTreeSet<i32>,
}

/// Accumulators in branch order with a key lookup.
struct Accumulators<T> {
    items: Vec<T>,
    by_key: HashMap<String, usize>,
}

impl<T> Accumulators<T> {
    fn seed(catalog: &Catalog, branch: NodeId, make: impl Fn(&Entry) -> Option<T>) -> Self {
        let mut items = Vec::new();
        let mut by_key = HashMap::new();
        for child in catalog.children(branch) {
            let container = catalog.node(*child);
            if let Some(item) = make(container.entry()) {
                by_key.insert(container.id().to_string(), items.len());
                items.push(item);
            }
        }
        Self { items, by_key }
    }

    fn get_mut(
        &mut self,
        name: &str,
        source: &Entry,
        source_id: &str,
        target_kind: &'static str,
    ) -> Result<&mut T, CatalogError> {
        match self.by_key.get(&slugify(name)) {
            Some(position) => Ok(&mut self.items[*position]),
            None => Err(CatalogError::UnresolvedLink {
                source_kind: source.kind_label(),
                source_id: source_id.to_string(),
                target_kind,
                target: name.to_string(),
            }),
        }
    }
}

/// Walks a linked catalog and produces the summary document.
pub fn build_metrics(catalog: &Catalog) -> Result<CatalogMetrics, CatalogError> {
    let mut themes = Accumulators::seed(catalog, catalog.branch(Branch::Themes)?, |entry| {
        let Entry::Theme(theme) = entry else {
            return None;
        };
        Some(ThemeAcc {
            name: theme.name.clone(),
            description: theme.description.clone(),
            image: theme.image.clone(),
            website: theme.link.clone(),
            ..ThemeAcc::default()
        })
    });
    let mut variables = Accumulators::seed(catalog, catalog.branch(Branch::Variables)?, |entry| {
        let Entry::Variable(variable) = entry else {
            return None;
        };
        Some(VariableAcc {
            name: variable.name.clone(),
            description: variable.description.clone(),
            themes: variable.themes.clone(),
            ..VariableAcc::default()
        })
    });
    let mut missions = Accumulators::seed(catalog, catalog.branch(Branch::EoMissions)?, |entry| {
        let Entry::EoMission(mission) = entry else {
            return None;
        };
        Some(MissionAcc {
            name: mission.name.clone(),
            ..MissionAcc::default()
        })
    });

    let projects = catalog.children(catalog.branch(Branch::Projects)?);
    for project in projects {
        let container = catalog.node(*project);
        for theme in &container.refs().themes {
            themes
                .get_mut(theme, container.entry(), container.id(), "Theme")?
                .projects += 1;
        }
    }

    let products = catalog.children(catalog.branch(Branch::Products)?);
    let mut all_years = BTreeSet::new();
    for product in products {
        let container = catalog.node(*product);
        let (start, end) = container.entry().interval();
        let years = years_spanned(start, end);
        all_years.extend(years.iter().copied());
        let refs = container.refs();

        for theme in &refs.themes {
            let acc = themes.get_mut(theme, container.entry(), container.id(), "Theme")?;
            acc.products += 1;
            acc.years.extend(years.iter().copied());
        }
        for variable in &refs.variables {
            let acc = variables.get_mut(variable, container.entry(), container.id(), "Variable")?;
            acc.products += 1;
            acc.years.extend(years.iter().copied());
        }
        for mission in &refs.eo_missions {
            let acc = missions.get_mut(mission, container.entry(), container.id(), "EO Mission")?;
            acc.products += 1;
            acc.years.extend(years.iter().copied());
            if let Some(project) = &refs.project {
                let project = slugify(project);
                if !acc.projects.contains(&project) {
                    acc.projects.push(project);
                }
            }
        }
    }

    for variable in &variables.items {
        for theme in &variable.themes {
            let position = themes.by_key.get(&slugify(theme)).copied().ok_or_else(|| {
                CatalogError::UnresolvedLink {
                    source_kind: "variable",
                    source_id: variable.name.clone(),
                    target_kind: "Theme",
                    target: theme.clone(),
                }
            })?;
            themes.items[position].variables += 1;
        }
    }

    let summary = GlobalSummary {
        years: all_years.into_iter().collect(),
        number_of_products: products.len(),
        number_of_projects: projects.len(),
        number_of_variables: variables.items.len(),
        number_of_themes: themes.items.len(),
        number_of_missions: missions.items.len(),
    };
    tracing::info!(
        products = summary.number_of_products,
        years = summary.years.len(),
        "metrics computed"
    );

    Ok(CatalogMetrics {
        id: catalog.node(catalog.root()).id().to_string(),
        summary,
        themes: themes
            .items
            .into_iter()
            .map(|acc| ThemeMetrics {
                name: acc.name,
                description: acc.description,
                image: acc.image,
                website: acc.website,
                summary: ThemeSummary {
                    years: acc.years.into_iter().collect(),
                    number_of_products: acc.products,
                    number_of_projects: acc.projects,
                    number_of_variables: acc.variables,
                },
            })
            .collect(),
        variables: variables
            .items
            .into_iter()
            .map(|acc| VariableMetrics {
                name: acc.name,
                description: acc.description,
                summary: VariableSummary {
                    years: acc.years.into_iter().collect(),
                    number_of_products: acc.products,
                },
            })
            .collect(),
        eo_missions: missions
            .items
            .into_iter()
            .map(|acc| MissionMetrics {
                name: acc.name,
                summary: MissionSummary {
                    years: acc.years.into_iter().collect(),
                    number_of_products: acc.products,
                    number_of_projects: acc.projects.len(),
                },
            })
            .collect(),
    })
}
