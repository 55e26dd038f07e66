use std::collections::HashSet;

use serde::Serialize;

use crate::builder::CatalogInputs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityIssues {
    pub entity: String,
    pub issues: Vec<String>,
}

/// Data-quality findings grouped by entity, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub entries: Vec<EntityIssues>,
}

impl ValidationReport {
    pub fn push(&mut self, entity: impl Into<String>, issue: impl Into<String>) {
        let entity = entity.into();
        let issue = issue.into();
        match self.entries.iter_mut().find(|entry| entry.entity == entity) {
            Some(entry) => entry.issues.push(issue),
            None => self.entries.push(EntityIssues {
                entity,
                issues: vec![issue],
            }),
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        for entry in other.entries {
            for issue in entry.issues {
                self.push(entry.entity.clone(), issue);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.issues.len()).sum()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|entry| entry.issues.iter().map(String::as_str))
    }
}

/// Checks that every cross-reference in the inputs resolves. Never fails;
/// the caller decides whether a non-empty report aborts the build.
pub fn validate(inputs: &CatalogInputs) -> ValidationReport {
    let themes: HashSet<&str> = inputs.themes.iter().map(|theme| theme.name.trim()).collect();
    let variables: HashSet<&str> = inputs
        .variables
        .iter()
        .map(|variable| variable.name.trim())
        .collect();
    let missions: HashSet<&str> = inputs
        .eo_missions
        .iter()
        .map(|mission| mission.name.trim())
        .collect();
    let projects: HashSet<&str> = inputs
        .projects
        .iter()
        .map(|project| project.title.trim())
        .collect();

    let mut report = ValidationReport::default();

    for variable in &inputs.variables {
        let entity = format!("Variable '{}'", variable.name);
        for theme in &variable.themes {
            if !themes.contains(theme.trim()) {
                report.push(
                    entity.clone(),
                    format!("Variable '{}' references non-existing theme '{theme}'", variable.name),
                );
            }
        }
    }

    for project in &inputs.projects {
        let entity = format!("Project '{}'", project.title);
        for theme in &project.themes {
            if !themes.contains(theme.trim()) {
                report.push(
                    entity.clone(),
                    format!("Project '{}' references non-existing theme '{theme}'", project.title),
                );
            }
        }
    }

    let mut seen_ids = HashSet::new();
    for product in inputs.all_products() {
        let kind = product.kind;
        let name = &product.title;
        let entity = format!("{kind} '{name}'");
        if !seen_ids.insert(product.id.as_str()) {
            report.push(
                entity.clone(),
                format!("{kind} '{name}' reuses the short name '{}'", product.id),
            );
        }
        if !projects.contains(product.project.trim()) {
            report.push(
                entity.clone(),
                format!(
                    "{kind} '{name}' references non-existing project '{}'",
                    product.project
                ),
            );
        }
        if product.collection_key().is_none() {
            report.push(
                entity.clone(),
                format!("{kind} '{name}' has no collection linked, please add a collection"),
            );
        }
        for theme in &product.themes {
            if !themes.contains(theme.trim()) {
                report.push(
                    entity.clone(),
                    format!("{kind} '{name}' references non-existing theme '{theme}'"),
                );
            }
        }
        for variable in &product.variables {
            if !variables.contains(variable.trim()) {
                report.push(
                    entity.clone(),
                    format!("{kind} '{name}' references non-existing variable '{variable}'"),
                );
            }
        }
        for mission in &product.eo_missions {
            if !missions.contains(mission.trim()) {
                report.push(
                    entity.clone(),
                    format!("{kind} '{name}' references non-existing mission '{mission}'"),
                );
            }
        }
    }

    for process in &inputs.processes {
        if !projects.contains(process.project.trim()) {
            report.push(
                format!("Process '{}'", process.name),
                format!(
                    "Process '{}' references non-existing project '{}'",
                    process.name, process.project
                ),
            );
        }
    }

    if !report.is_empty() {
        tracing::warn!(issues = report.issue_count(), "validation found issues");
    }
    report
}
