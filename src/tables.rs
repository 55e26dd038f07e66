use std::fs::File;
use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use csv::{ReaderBuilder, StringRecord};

use crate::builder::{CatalogInputs, TableSources};
use crate::error::CatalogError;
use crate::records::{
    Contact, EoMission, Geometry, Process, Product, ProductKind, Project, Released, Status, Theme,
    Variable, parse_date, parse_doi, parse_list,
};
use crate::slug::slugify;
use crate::validate::ValidationReport;

const THEME_COLUMNS: [&str; 3] = ["Theme1", "Theme2", "Theme3"];

/// The input tables of a data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Themes,
    Variables,
    EoMissions,
    Projects,
    Products,
    Benchmarks,
    Processes,
}

impl TableKind {
    pub fn file_name(self) -> &'static str {
        match self {
            TableKind::Themes => "themes.csv",
            TableKind::Variables => "variables.csv",
            TableKind::EoMissions => "eo-missions.csv",
            TableKind::Projects => "projects.csv",
            TableKind::Products => "products.csv",
            TableKind::Benchmarks => "benchmarks.csv",
            TableKind::Processes => "processes.csv",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TableKind::Themes => "Themes",
            TableKind::Variables => "Variables",
            TableKind::EoMissions => "EO Missions",
            TableKind::Projects => "Projects",
            TableKind::Products => "Products",
            TableKind::Benchmarks => "Benchmarks",
            TableKind::Processes => "Processes",
        }
    }

    /// Column count a well-formed table has. Theme columns are not counted
    /// for projects, where they are optional.
    pub fn expected_columns(self) -> Option<usize> {
        match self {
            TableKind::Themes | TableKind::Variables => Some(4),
            TableKind::EoMissions => Some(3),
            TableKind::Projects => Some(10),
            TableKind::Products | TableKind::Benchmarks => Some(26),
            TableKind::Processes => None,
        }
    }

    fn required(self) -> bool {
        !matches!(self, TableKind::Benchmarks | TableKind::Processes)
    }
}

/// A parsed CSV table: header plus rows, kept as raw strings.
#[derive(Debug, Clone)]
pub struct Table {
    kind: TableKind,
    source: String,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    pub fn open(kind: TableKind, path: &Utf8Path) -> Result<Self, CatalogError> {
        let file = File::open(path.as_std_path()).map_err(|err| CatalogError::TableRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_reader(kind, path.as_str(), file)
    }

    pub fn from_reader(
        kind: TableKind,
        source: &str,
        reader: impl Read,
    ) -> Result<Self, CatalogError> {
        let read_error = |err: csv::Error| CatalogError::TableRead {
            path: Utf8PathBuf::from(source),
            message: err.to_string(),
        };
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers().map_err(read_error)?.clone();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_error)?;
        tracing::debug!(table = kind.label(), rows = rows.len(), "table read");
        Ok(Self {
            kind,
            source: source.to_string(),
            headers,
            rows,
        })
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|header| header.trim() == column)
    }

    /// Reports a header whose width differs from the expected schema.
    pub fn check_columns(&self, report: &mut ValidationReport) {
        let Some(expected) = self.kind.expected_columns() else {
            return;
        };
        let found = match self.kind {
            TableKind::Projects => self
                .headers
                .iter()
                .filter(|header| {
                    let header = header.trim();
                    !THEME_COLUMNS.contains(&header) && !header.eq_ignore_ascii_case("themes")
                })
                .count(),
            _ => self.headers.len(),
        };
        if found != expected {
            let label = self.kind.label();
            report.push(
                format!("{label} table"),
                format!(
                    "{label} csv file is corrupted, it must have {expected} columns but has {found}"
                ),
            );
        }
    }

    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().enumerate().map(|(index, record)| Row {
            table: self,
            record,
            // header is line 1
            line: index + 2,
        })
    }

    pub fn themes(&self) -> Result<Vec<Theme>, CatalogError> {
        self.rows()
            .map(|row| {
                Ok(Theme {
                    name: row.text("theme")?,
                    description: row.optional("description").unwrap_or_default(),
                    link: row.optional("link"),
                    image: row.optional("image"),
                })
            })
            .collect()
    }

    pub fn variables(&self) -> Result<Vec<Variable>, CatalogError> {
        let themes_column = if self.has_column("themes") { "themes" } else { "theme" };
        self.rows()
            .map(|row| {
                Ok(Variable {
                    name: row.text("variable")?,
                    description: row.optional("variable description").unwrap_or_default(),
                    link: row.optional("link"),
                    themes: row.list(themes_column, ';')?,
                })
            })
            .collect()
    }

    pub fn eo_missions(&self) -> Result<Vec<EoMission>, CatalogError> {
        self.rows()
            .map(|row| {
                Ok(EoMission {
                    name: row.text("EO_Missions")?,
                    description: row.optional("Description").unwrap_or_default(),
                    link: row.optional("Link"),
                })
            })
            .collect()
    }

    pub fn projects(&self) -> Result<Vec<Project>, CatalogError> {
        self.rows()
            .map(|row| {
                let title = row.text("Short_Name")?;
                let status = row.text("Status")?.parse::<Status>().map_err(|message| {
                    CatalogError::TableRead {
                        path: Utf8PathBuf::from(&self.source),
                        message: format!("line {}: {message}", row.line),
                    }
                })?;
                let themes = if self.has_column("themes") {
                    row.list("themes", ';')?
                } else {
                    row.themes()
                };
                Ok(Project {
                    id: slugify(&title),
                    status,
                    name: row.text("Project_Name")?,
                    title,
                    description: row.text("Short_Description")?,
                    website: row.text("Website")?,
                    consortium: row.list("Consortium", ',')?,
                    start: parse_date(&row.text("Start_Date_Project")?),
                    end: parse_date(&row.text("End_Date_Project")?),
                    technical_officer: Contact {
                        name: row.text("TO")?,
                        e_mail: row.text("TO_E-mail")?,
                    },
                    themes,
                })
            })
            .collect()
    }

    pub fn products(&self) -> Result<Vec<Product>, CatalogError> {
        let (kind, title_column) = match self.kind {
            TableKind::Benchmarks => (ProductKind::Benchmark, "Benchmark"),
            _ => (ProductKind::Product, "Product"),
        };
        self.rows()
            .map(|row| {
                Ok(Product {
                    kind,
                    id: row.text("Short_Name")?,
                    title: row.text(title_column)?,
                    description: row.text("Description")?,
                    project: row.text("Project")?,
                    variables: row.list("Variables", ';')?,
                    themes: row.themes(),
                    access: row.text("Access")?,
                    website: row.optional("Website"),
                    notebook: row.optional("Notebook"),
                    doi: row.optional("DOI").and_then(|doi| parse_doi(&doi)),
                    start: parse_date(&row.text("Start")?),
                    end: parse_date(&row.text("End")?),
                    geometry: Geometry::parse(&row.text("Polygon")?),
                    region: row.optional("Region"),
                    released: Released::parse(&row.text("Released")?),
                    eo_missions: row.list("EO_Missions", ';')?,
                    keywords: row
                        .optional("Keywords")
                        .map(|keywords| parse_list(&keywords, ';'))
                        .unwrap_or_default(),
                    format: row.optional("Format"),
                    category: row.optional("Category"),
                    coordinate: row.optional("Coordinate"),
                    spatial_resolution: row.optional("Spatial Resolution"),
                    temporal_resolution: row.optional("Temporal Resolution"),
                    collection: row.optional("Collection"),
                    provider: row.optional("Consortium"),
                })
            })
            .collect()
    }

    pub fn processes(&self) -> Result<Vec<Process>, CatalogError> {
        self.rows()
            .map(|row| {
                let link = row.optional("link");
                Ok(Process {
                    name: row.text("Name")?,
                    project: row.text("Project")?,
                    description: row.optional("Description").unwrap_or_default(),
                    asset: row.optional("Asset").or_else(|| link.clone()),
                    link,
                    released: row
                        .optional("Released")
                        .and_then(|released| Released::parse(&released)),
                    languages: row
                        .optional("Languages")
                        .map(|languages| parse_list(&languages, ';'))
                        .unwrap_or_default(),
                })
            })
            .collect()
    }
}

struct Row<'a> {
    table: &'a Table,
    record: &'a StringRecord,
    line: usize,
}

impl Row<'_> {
    fn cell(&self, column: &str) -> Option<&str> {
        let position = self
            .table
            .headers
            .iter()
            .position(|header| header.trim() == column)?;
        Some(self.record.get(position).unwrap_or("").trim())
    }

    /// Value of a column the schema requires; may be empty.
    fn text(&self, column: &str) -> Result<String, CatalogError> {
        self.cell(column)
            .map(str::to_string)
            .ok_or_else(|| CatalogError::MissingColumn {
                table: self.table.kind.label().to_string(),
                row: self.line,
                column: column.to_string(),
            })
    }

    /// Non-empty value of a column that may be missing altogether.
    fn optional(&self, column: &str) -> Option<String> {
        self.cell(column)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn list(&self, column: &str, delimiter: char) -> Result<Vec<String>, CatalogError> {
        Ok(parse_list(&self.text(column)?, delimiter))
    }

    fn themes(&self) -> Vec<String> {
        THEME_COLUMNS
            .iter()
            .filter_map(|column| self.optional(column))
            .collect()
    }
}

/// Locations of the input tables inside a data directory.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: Utf8PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn table_path(&self, kind: TableKind) -> Utf8PathBuf {
        self.root.join(kind.file_name())
    }

    fn open(&self, kind: TableKind) -> Result<Option<Table>, CatalogError> {
        let path = self.table_path(kind);
        if !path.as_std_path().is_file() {
            if kind.required() {
                return Err(CatalogError::MissingTable(path));
            }
            tracing::debug!(table = kind.label(), "optional table absent");
            return Ok(None);
        }
        Table::open(kind, &path).map(Some)
    }

    /// Reads every table into records. Schema problems such as a wrong
    /// column count are collected in the returned report rather than failing.
    pub fn load(&self) -> Result<(CatalogInputs, ValidationReport), CatalogError> {
        let mut report = ValidationReport::default();
        let mut inputs = CatalogInputs::default();
        let mut sources = TableSources::default();

        if let Some(table) = self.open(TableKind::Themes)? {
            table.check_columns(&mut report);
            inputs.themes = table.themes()?;
            sources.themes = Some(table.source().to_string());
        }
        if let Some(table) = self.open(TableKind::Variables)? {
            table.check_columns(&mut report);
            inputs.variables = table.variables()?;
            sources.variables = Some(table.source().to_string());
        }
        if let Some(table) = self.open(TableKind::EoMissions)? {
            table.check_columns(&mut report);
            inputs.eo_missions = table.eo_missions()?;
            sources.eo_missions = Some(table.source().to_string());
        }
        if let Some(table) = self.open(TableKind::Projects)? {
            table.check_columns(&mut report);
            inputs.projects = table.projects()?;
            sources.projects = Some(table.source().to_string());
        }
        if let Some(table) = self.open(TableKind::Products)? {
            table.check_columns(&mut report);
            inputs.products = table.products()?;
            sources.products = Some(table.source().to_string());
        }
        if let Some(table) = self.open(TableKind::Benchmarks)? {
            table.check_columns(&mut report);
            inputs.benchmarks = table.products()?;
            sources.benchmarks = Some(table.source().to_string());
        }
        if let Some(table) = self.open(TableKind::Processes)? {
            inputs.processes = table.processes()?;
            sources.processes = Some(table.source().to_string());
        }
        inputs.sources = sources;

        tracing::info!(
            dir = %self.root,
            themes = inputs.themes.len(),
            variables = inputs.variables.len(),
            eo_missions = inputs.eo_missions.len(),
            projects = inputs.projects.len(),
            products = inputs.products.len(),
            benchmarks = inputs.benchmarks.len(),
            processes = inputs.processes.len(),
            "tables loaded"
        );
        Ok((inputs, report))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn themes_from_csv() {
        let csv = "theme,description,link,image\n\
                   Oceans,Salt water,https://example.org,oceans.png\n\
                   Land,,,\n";
        let table = Table::from_reader(TableKind::Themes, "themes.csv", csv.as_bytes()).unwrap();
        let themes = table.themes().unwrap();
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].image.as_deref(), Some("oceans.png"));
        assert_eq!(themes[1].description, "");
        assert_eq!(themes[1].link, None);

        let mut report = ValidationReport::default();
        table.check_columns(&mut report);
        assert!(report.is_empty());
    }

    #[test]
    fn missing_required_column() {
        let csv = "theme,description\nOceans,x\n";
        let table =
            Table::from_reader(TableKind::EoMissions, "missions.csv", csv.as_bytes()).unwrap();
        assert_matches!(
            table.eo_missions(),
            Err(CatalogError::MissingColumn { row: 2, ref column, .. }) if column == "EO_Missions"
        );
    }

    #[test]
    fn column_count_mismatch_is_reported() {
        let csv = "EO_Missions,Description\nSentinel-2,x\n";
        let table =
            Table::from_reader(TableKind::EoMissions, "missions.csv", csv.as_bytes()).unwrap();
        let mut report = ValidationReport::default();
        table.check_columns(&mut report);
        assert_eq!(report.issue_count(), 1);
        assert_eq!(report.entries[0].entity, "EO Missions table");
    }
}
