use std::collections::HashMap;
use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::catalog::{Catalog, Container, Entry, ModificationTimes, NodeId};
use crate::error::CatalogError;
use crate::metrics::CatalogMetrics;
use crate::slug::slugify;

pub const ROOT_DOCUMENT: &str = "catalog.json";
pub const METRICS_DOCUMENT: &str = "metrics.json";

/// Data directories whose `images` folder is mirrored into the output.
const IMAGE_DIRS: [&str; 4] = ["variables", "themes", "projects", "products"];

#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub root_href: Option<String>,
    pub pretty_print: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            root_href: None,
            pretty_print: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteSummary {
    pub out_dir: String,
    pub documents: usize,
}

/// Output-relative document path of every container reachable from the root.
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    paths: Vec<Option<Utf8PathBuf>>,
}

impl CatalogLayout {
    /// A container lives under the first parent the catalog walk meets; the
    /// root's direct children get `<slug>/catalog.json`, everything deeper
    /// `<parent dir>/<slug>/collection.json`, where the slug of the id is the
    /// directory name. Two containers landing on the same path is an error.
    pub fn plan(catalog: &Catalog) -> Result<Self, CatalogError> {
        let mut paths: Vec<Option<Utf8PathBuf>> = vec![None; catalog.len()];
        let mut owners: HashMap<Utf8PathBuf, NodeId> = HashMap::new();
        let root = catalog.root();
        for (id, parent) in catalog.walk() {
            let container = catalog.node(id);
            let path = match parent {
                None => Utf8PathBuf::from(ROOT_DOCUMENT),
                Some(parent) if parent == root => {
                    Utf8PathBuf::from(path_segment(container)?).join(ROOT_DOCUMENT)
                }
                Some(parent) => {
                    let parent_dir = paths[parent.index()]
                        .as_deref()
                        .and_then(Utf8Path::parent)
                        .unwrap_or(Utf8Path::new(""));
                    parent_dir
                        .join(path_segment(container)?)
                        .join("collection.json")
                }
            };
            if let Some(owner) = owners.insert(path.clone(), id) {
                return Err(CatalogError::PathClash {
                    path,
                    first: catalog.node(owner).id().to_string(),
                    second: container.id().to_string(),
                });
            }
            paths[id.index()] = Some(path);
        }
        Ok(Self { paths })
    }

    pub fn path(&self, id: NodeId) -> Option<&Utf8Path> {
        self.paths.get(id.index()).and_then(|path| path.as_deref())
    }

    pub fn len(&self) -> usize {
        self.paths.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn path_segment(container: &Container) -> Result<String, CatalogError> {
    let segment = slugify(container.id());
    if segment.is_empty() {
        return Err(CatalogError::EmptyPathSegment(container.id().to_string()));
    }
    Ok(segment)
}

/// Href of `to` as seen from the document at `from`, both output-relative.
pub fn relative_href(from: &Utf8Path, to: &Utf8Path) -> String {
    let from_dir: Vec<&str> = from
        .parent()
        .map(|dir| dir.iter().collect())
        .unwrap_or_default();
    let target: Vec<&str> = to.iter().collect();
    let shared = from_dir
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from_dir.len() - shared;
    let rest = target[shared..].join("/");
    if ups == 0 {
        format!("./{rest}")
    } else {
        format!("{}{rest}", "../".repeat(ups))
    }
}

fn absolute_href(root_href: &str, path: &Utf8Path) -> String {
    format!("{}/{}", root_href.trim_end_matches('/'), path)
}

fn document_type(entry: &Entry) -> &'static str {
    match entry {
        Entry::Root { .. } | Entry::Branch { .. } => "Catalog",
        _ => "Collection",
    }
}

fn extent(container: &Container) -> Option<Value> {
    let (start, end) = container.entry().interval();
    let geometry = match container.entry() {
        Entry::Product(product) => product.geometry.as_ref(),
        Entry::Segmentation(segmentation) => segmentation.geometry.as_ref(),
        _ => None,
    };
    if start.is_none() && end.is_none() && geometry.is_none() {
        return None;
    }
    let stamp = |value: Option<chrono::DateTime<chrono::Utc>>| {
        value.map(|value| value.to_rfc3339_opts(SecondsFormat::Secs, true))
    };
    let bbox = geometry
        .map(|geometry| geometry.bbox().to_vec())
        .unwrap_or_else(|| vec![-180.0, -90.0, 180.0, 90.0]);
    Some(json!({
        "spatial": { "bbox": [bbox] },
        "temporal": { "interval": [[stamp(start), stamp(end)]] },
    }))
}

fn link(rel: &str, href: String, title: &str) -> Value {
    json!({
        "rel": rel,
        "href": href,
        "type": "application/json",
        "title": title,
    })
}

/// Renders one container as its JSON document.
pub fn render_document(
    catalog: &Catalog,
    layout: &CatalogLayout,
    id: NodeId,
    options: &WriteOptions,
    times: &dyn ModificationTimes,
) -> Result<Value, CatalogError> {
    let container = catalog.node(id);
    let here = layout
        .path(id)
        .ok_or_else(|| CatalogError::Serialize(format!("'{}' is not reachable", container.id())))?;
    let root_path = Utf8Path::new(ROOT_DOCUMENT);

    let mut links = Vec::new();
    links.push(link(
        "root",
        relative_href(here, root_path),
        catalog.node(catalog.root()).title(),
    ));
    if let Some(root_href) = &options.root_href {
        links.push(link("self", absolute_href(root_href, here), container.title()));
    }
    for parent in container.parents() {
        if let Some(path) = layout.path(*parent) {
            links.push(link("parent", relative_href(here, path), catalog.node(*parent).title()));
        }
    }
    for child in container.children() {
        if let Some(path) = layout.path(*child) {
            links.push(link("child", relative_href(here, path), catalog.node(*child).title()));
        }
    }
    for relation in container.relations() {
        if let Some(path) = layout.path(relation.target) {
            let mut related = link(
                "related",
                relative_href(here, path),
                catalog.node(relation.target).title(),
            );
            if let Value::Object(fields) = &mut related {
                fields.insert("osc:relation".to_string(), json!(relation.kind));
            }
            links.push(related);
        }
    }
    if matches!(container.entry(), Entry::Root { .. }) {
        links.push(json!({
            "rel": "alternate",
            "href": relative_href(here, Utf8Path::new(METRICS_DOCUMENT)),
            "type": "application/json",
            "title": "Metrics",
        }));
    }

    let mut document = Map::new();
    document.insert("type".to_string(), json!(document_type(container.entry())));
    document.insert("id".to_string(), json!(container.id()));
    document.insert("title".to_string(), json!(container.title()));
    document.insert("description".to_string(), json!(container.entry().description()));
    if let Some(updated) = catalog.resolve_updated(id, times) {
        document.insert(
            "updated".to_string(),
            json!(updated.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
    }
    if let Some(extent) = extent(container) {
        document.insert("extent".to_string(), extent);
    }
    if !matches!(container.entry(), Entry::Root { .. } | Entry::Branch { .. }) {
        let properties = serde_json::to_value(container.entry())
            .map_err(|err| CatalogError::Serialize(err.to_string()))?;
        document.insert("properties".to_string(), properties);
    }
    document.insert("links".to_string(), Value::Array(links));
    Ok(Value::Object(document))
}

/// Writes every document of the catalog plus `metrics.json` under `out_dir`.
pub fn write_catalog(
    catalog: &Catalog,
    metrics: &CatalogMetrics,
    out_dir: &Utf8Path,
    options: &WriteOptions,
    times: &dyn ModificationTimes,
) -> Result<WriteSummary, CatalogError> {
    fs::create_dir_all(out_dir.as_std_path())
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    let layout = CatalogLayout::plan(catalog)?;

    let mut documents = 0;
    for (id, _) in catalog.walk() {
        let document = render_document(catalog, &layout, id, options, times)?;
        if let Some(path) = layout.path(id) {
            write_json_atomic(&out_dir.join(path), &document, options.pretty_print)?;
            documents += 1;
        }
    }
    write_json_atomic(&out_dir.join(METRICS_DOCUMENT), metrics, options.pretty_print)?;

    tracing::info!(out_dir = %out_dir, documents, "catalog written");
    Ok(WriteSummary {
        out_dir: out_dir.to_string(),
        documents,
    })
}

/// Serializes into a temp file beside `path`, then persists it in place.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Utf8Path,
    value: &T,
    pretty: bool,
) -> Result<(), CatalogError> {
    let parent = path
        .parent()
        .ok_or_else(|| CatalogError::Filesystem("invalid destination path".to_string()))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    let content = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .map_err(|err| CatalogError::Serialize(err.to_string()))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".osc-build")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    temp.write_all(&content)
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    temp.write_all(b"\n")
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    Ok(())
}

/// Mirrors `<data_dir>/<kind>/images` into `<out_dir>/<kind>/images` for
/// every kind that has one. Returns the number of files copied.
pub fn copy_images(data_dir: &Utf8Path, out_dir: &Utf8Path) -> Result<usize, CatalogError> {
    let mut copied = 0;
    for kind in IMAGE_DIRS {
        let source = data_dir.join(kind).join("images");
        if !source.as_std_path().is_dir() {
            continue;
        }
        copied += copy_dir_recursive(&source, &out_dir.join(kind).join("images"))?;
    }
    if copied > 0 {
        tracing::info!(files = copied, "images copied");
    }
    Ok(copied)
}

fn copy_dir_recursive(source: &Utf8Path, dest: &Utf8Path) -> Result<usize, CatalogError> {
    fs::create_dir_all(dest.as_std_path())
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    let mut copied = 0;
    let mut stack = vec![source.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = dir
            .read_dir_utf8()
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| CatalogError::Filesystem(err.to_string()))?;
            let path = entry.path();
            let relative = path
                .strip_prefix(source)
                .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
            let target = dest.join(relative);
            if path.is_dir() {
                fs::create_dir_all(target.as_std_path())
                    .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
                stack.push(path.to_path_buf());
            } else {
                fs::copy(path.as_std_path(), target.as_std_path())
                    .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
                copied += 1;
            }
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_hrefs() {
        let root = Utf8Path::new("catalog.json");
        let branch = Utf8Path::new("themes/catalog.json");
        let theme = Utf8Path::new("themes/oceans/collection.json");
        let product = Utf8Path::new("products/sst/sst-v2/collection.json");

        assert_eq!(relative_href(root, branch), "./themes/catalog.json");
        assert_eq!(relative_href(branch, root), "../catalog.json");
        assert_eq!(relative_href(branch, theme), "./oceans/collection.json");
        assert_eq!(relative_href(theme, branch), "../catalog.json");
        assert_eq!(relative_href(product, theme), "../../../themes/oceans/collection.json");
    }
}
