mod common;

use assert_matches::assert_matches;

use common::{product, sample_inputs, tagged};
use osc_catalog::builder::{BuildOptions, CatalogBuilder, CatalogInputs};
use osc_catalog::catalog::{Catalog, NodeId, RelationKind};
use osc_catalog::error::CatalogError;
use osc_catalog::linker::{CrossLinker, LinkSummary};

fn child_titles(catalog: &Catalog, parent: NodeId) -> Vec<&str> {
    catalog
        .children(parent)
        .iter()
        .map(|id| catalog.node(*id).title())
        .collect()
}

#[test]
fn linking_adds_relations_and_attachments() {
    let (mut catalog, index) = CatalogBuilder::new(BuildOptions::default())
        .build(&sample_inputs())
        .unwrap();
    let summary = CrossLinker::new(&index).link(&mut catalog).unwrap();

    assert_eq!(
        summary,
        LinkSummary {
            relations: 18,
            attachments: 13,
        }
    );

    let oceans = index.theme("Oceans").unwrap();
    assert_eq!(
        child_titles(&catalog, oceans),
        vec!["Soil Moisture", "SST Benchmarks", "SST Series"]
    );

    let sst = index.variable("Sea Surface Temperature").unwrap();
    assert_eq!(catalog.relations(sst, RelationKind::Theme).collect::<Vec<_>>(), vec![oceans]);

    let workflow = index.processes.values().next().copied().unwrap();
    let cci = index.project("CCI SST").unwrap();
    assert_eq!(
        catalog.relations(workflow, RelationKind::Project).collect::<Vec<_>>(),
        vec![cci]
    );
}

#[test]
fn shared_container_is_one_node_under_every_parent() {
    let (mut catalog, index) = CatalogBuilder::new(BuildOptions::default())
        .build(&sample_inputs())
        .unwrap();
    CrossLinker::new(&index).link(&mut catalog).unwrap();

    let soil = index.segmentation("Soil Moisture").unwrap();
    let land = index.theme("Land").unwrap();
    let oceans = index.theme("Oceans").unwrap();
    let variable = index.variable("Soil Moisture").unwrap();
    let mission = index.eo_mission("SMOS").unwrap();
    let project = index.project("SMOS Soil").unwrap();

    for parent in [land, oceans, variable, mission, project] {
        assert_eq!(catalog.child_by_id(parent, "Soil Moisture"), Some(soil));
    }
    assert_eq!(catalog.node(soil).parents().len(), 6);

    // members stay only under their segmentation parent
    let member = index.product("soil-moisture").unwrap();
    assert_eq!(catalog.node(member).parents(), &[soil]);
}

#[test]
fn relinking_changes_nothing() {
    let (mut catalog, index) = CatalogBuilder::new(BuildOptions::default())
        .build(&sample_inputs())
        .unwrap();
    let linker = CrossLinker::new(&index);
    linker.link(&mut catalog).unwrap();

    let nodes = catalog.len();
    let before: Vec<(Vec<NodeId>, usize)> = catalog
        .walk()
        .iter()
        .map(|(id, _)| {
            let node = catalog.node(*id);
            (node.children().to_vec(), node.relations().len())
        })
        .collect();

    let second = linker.link(&mut catalog).unwrap();
    assert_eq!(second, LinkSummary::default());

    let after: Vec<(Vec<NodeId>, usize)> = catalog
        .walk()
        .iter()
        .map(|(id, _)| {
            let node = catalog.node(*id);
            (node.children().to_vec(), node.relations().len())
        })
        .collect();
    assert_eq!(before, after);
    assert_eq!(nodes, catalog.len());
}

#[test]
fn unresolved_reference_aborts_linking() {
    let mut inputs = sample_inputs();
    inputs.products.push(tagged(
        product("orphan", "Orphan", "CCI SST"),
        &["Cryosphere"],
        &[],
        &[],
    ));

    let (mut catalog, index) = CatalogBuilder::new(BuildOptions::default())
        .build(&inputs)
        .unwrap();
    let err = CrossLinker::new(&index).link(&mut catalog).unwrap_err();
    assert_matches!(
        err,
        CatalogError::UnresolvedLink { target_kind: "Theme", ref target, .. }
            if target == "Cryosphere"
    );
}

#[test]
fn empty_catalog_links_cleanly() {
    let (mut catalog, index) = CatalogBuilder::new(BuildOptions::default())
        .build(&CatalogInputs::default())
        .unwrap();
    let summary = CrossLinker::new(&index).link(&mut catalog).unwrap();
    assert_eq!(summary, LinkSummary::default());
}
