mod common;

use common::{product, sample_inputs, tagged};
use osc_catalog::validate::validate;

#[test]
fn consistent_inputs_have_no_issues() {
    let report = validate(&sample_inputs());
    assert!(report.is_empty(), "{report:?}");
}

#[test]
fn unknown_theme_yields_one_issue_naming_both() {
    let mut inputs = sample_inputs();
    let mut stray = tagged(product("stray", "Stray Product", "CCI SST"), &["Cryosphere"], &[], &[]);
    stray.collection = Some("Stray".to_string());
    inputs.products.push(stray);

    let report = validate(&inputs);
    assert_eq!(report.issue_count(), 1);
    let issue = report.messages().next().unwrap();
    assert!(issue.contains("Cryosphere"));
    assert!(issue.contains("Stray Product"));
    assert_eq!(report.entries[0].entity, "Product 'Stray Product'");
}

#[test]
fn every_reference_kind_is_checked() {
    let mut inputs = sample_inputs();
    inputs.variables[0].themes.push("Ice".to_string());
    inputs.projects[0].themes.push("Ice".to_string());
    inputs.processes[0].project = "Nobody".to_string();
    inputs
        .benchmarks
        .push(tagged(product("bench-2", "Bench 2", "Ghost"), &[], &["Wind"], &["Landsat"]));

    let report = validate(&inputs);
    let messages: Vec<&str> = report.messages().collect();
    assert_eq!(
        messages,
        vec![
            "Variable 'Sea Surface Temperature' references non-existing theme 'Ice'",
            "Project 'CCI SST' references non-existing theme 'Ice'",
            "Benchmark 'Bench 2' references non-existing project 'Ghost'",
            "Benchmark 'Bench 2' has no collection linked, please add a collection",
            "Benchmark 'Bench 2' references non-existing variable 'Wind'",
            "Benchmark 'Bench 2' references non-existing mission 'Landsat'",
            "Process 'SST Workflow' references non-existing project 'Nobody'",
        ]
    );
    assert_eq!(report.entries.len(), 4);
}

#[test]
fn names_match_after_trimming() {
    let mut inputs = sample_inputs();
    inputs.products[0].themes = vec!["  Oceans ".to_string()];
    assert!(validate(&inputs).is_empty());
}

#[test]
fn duplicate_product_ids_are_reported() {
    let mut inputs = sample_inputs();
    let mut copy = inputs.products[0].clone();
    copy.title = "Copy".to_string();
    inputs.products.push(copy);

    let report = validate(&inputs);
    assert_eq!(report.issue_count(), 1);
    assert_eq!(
        report.messages().next(),
        Some("Product 'Copy' reuses the short name 'sst-2010'")
    );
}
