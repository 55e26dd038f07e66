mod common;

use assert_matches::assert_matches;

use common::{in_collection, product, sample_inputs};
use osc_catalog::builder::{BuildOptions, CatalogBuilder, CatalogInputs};
use osc_catalog::catalog::{Branch, Catalog, Entry, NodeId};
use osc_catalog::error::CatalogError;
use osc_catalog::segmentation::{SegmentationPolicy, SingletonGroups};

fn child_ids(catalog: &Catalog, parent: NodeId) -> Vec<&str> {
    catalog
        .children(parent)
        .iter()
        .map(|id| catalog.node(*id).id())
        .collect()
}

#[test]
fn branches_are_populated_in_identifier_order() {
    let (catalog, index) = CatalogBuilder::new(BuildOptions::default())
        .build(&sample_inputs())
        .unwrap();

    assert_eq!(catalog.node(catalog.root()).id(), "OSC-Catalog");
    let themes = catalog.branch(Branch::Themes).unwrap();
    assert_eq!(child_ids(&catalog, themes), vec!["land", "oceans"]);
    let projects = catalog.branch(Branch::Projects).unwrap();
    assert_eq!(child_ids(&catalog, projects), vec!["cci-sst", "smos-soil"]);
    let missions = catalog.branch(Branch::EoMissions).unwrap();
    assert_eq!(child_ids(&catalog, missions), vec!["sentinel-3", "smos"]);
    let processes = catalog.branch(Branch::Processes).unwrap();
    assert_eq!(child_ids(&catalog, processes), vec!["cci-sst-sst-workflow"]);

    // case-sensitive: upper-case letters sort first
    let products = catalog.branch(Branch::Products).unwrap();
    assert_eq!(
        child_ids(&catalog, products),
        vec!["SST Benchmarks", "SST Series", "Soil Moisture"]
    );
    assert_eq!(index.segmentations.len(), 3);
    assert_eq!(index.products.len(), 5);
}

#[test]
fn products_nest_under_their_collection() {
    let (catalog, index) = CatalogBuilder::new(BuildOptions::default())
        .build(&sample_inputs())
        .unwrap();

    let series = index.segmentation("SST Series").unwrap();
    assert_eq!(child_ids(&catalog, series), vec!["sst-2010", "sst-2011", "sst-2015"]);
    assert_matches!(
        catalog.node(series).entry(),
        Entry::Segmentation(segmentation)
            if segmentation.region.as_deref() == Some("Atlantic, Pacific")
    );

    let member = index.product("sst-2015").unwrap();
    assert_eq!(catalog.node(member).parents(), &[series]);
}

#[test]
fn unmatched_collection_attaches_under_products() {
    let inputs = CatalogInputs {
        products: vec![
            in_collection(product("solo", "Solo", "P"), "Alone"),
            product("loose", "Loose", "P"),
        ],
        ..CatalogInputs::default()
    };
    let options = BuildOptions {
        segmentation: SegmentationPolicy {
            singletons: SingletonGroups::Inline,
        },
        ..BuildOptions::default()
    };

    let (catalog, index) = CatalogBuilder::new(options).build(&inputs).unwrap();
    let products = catalog.branch(Branch::Products).unwrap();
    assert!(index.segmentations.is_empty());
    assert_eq!(child_ids(&catalog, products), vec!["loose", "solo"]);
}

#[test]
fn duplicate_records_keep_the_first() {
    let mut inputs = sample_inputs();
    let mut again = common::theme("OCEANS");
    again.description = "second".to_string();
    inputs.themes.push(again);
    let mut duplicate = product("sst-2010", "Other", "CCI SST");
    duplicate.description = "duplicate".to_string();
    inputs.products.push(duplicate);

    let (catalog, index) = CatalogBuilder::new(BuildOptions::default())
        .build(&inputs)
        .unwrap();
    let oceans = index.theme("Oceans").unwrap();
    assert_eq!(catalog.node(oceans).entry().description(), "Oceans theme");
    let kept = index.product("sst-2010").unwrap();
    assert_eq!(catalog.node(kept).title(), "SST-2010");
}

#[test]
fn builder_rejects_clashing_sibling_ids() {
    let mut inputs = CatalogInputs::default();
    // a loose product whose id equals a segmentation title under the same parent
    inputs.products = vec![
        in_collection(product("b", "B", "P"), "a"),
        in_collection(product("c", "C", "P"), "a"),
        product("a", "Clash", "P"),
    ];

    let result = CatalogBuilder::new(BuildOptions::default()).build(&inputs);
    assert_matches!(result, Err(CatalogError::DuplicateChild { .. }));
}

#[test]
fn dropped_duplicate_does_not_feed_its_collection() {
    let mut inputs = sample_inputs();
    let mut duplicate = common::tagged(
        in_collection(product("sst-2015", "Late copy", "CCI SST"), "SST Series"),
        &["Land"],
        &["Soil Moisture"],
        &["SMOS"],
    );
    duplicate.region = Some("Arctic".to_string());
    inputs.products.push(duplicate);

    let (catalog, index) = CatalogBuilder::new(BuildOptions::default())
        .build(&inputs)
        .unwrap();
    let series = index.segmentation("SST Series").unwrap();
    assert_eq!(child_ids(&catalog, series), vec!["sst-2010", "sst-2011", "sst-2015"]);
    assert_eq!(catalog.node(series).refs().themes, vec!["Oceans"]);
    assert_eq!(catalog.node(series).refs().eo_missions, vec!["Sentinel-3"]);
    assert_matches!(
        catalog.node(series).entry(),
        Entry::Segmentation(segmentation)
            if segmentation.region.as_deref() == Some("Atlantic, Pacific")
                && segmentation.variables == vec!["Sea Surface Temperature"]
    );
}
