#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use osc_catalog::builder::CatalogInputs;
use osc_catalog::records::{
    Contact, EoMission, Process, Product, ProductKind, Project, Status, Theme, Variable,
};

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn theme(name: &str) -> Theme {
    Theme {
        name: name.to_string(),
        description: format!("{name} theme"),
        link: Some(format!("https://example.org/themes/{name}")),
        image: None,
    }
}

pub fn variable(name: &str, themes: &[&str]) -> Variable {
    Variable {
        name: name.to_string(),
        description: String::new(),
        link: None,
        themes: strings(themes),
    }
}

pub fn mission(name: &str) -> EoMission {
    EoMission {
        name: name.to_string(),
        description: String::new(),
        link: None,
    }
}

pub fn project(title: &str, themes: &[&str]) -> Project {
    Project {
        id: osc_catalog::slug::slugify(title),
        status: Status::Ongoing,
        name: format!("{title} project"),
        title: title.to_string(),
        description: String::new(),
        website: String::new(),
        consortium: Vec::new(),
        start: None,
        end: None,
        technical_officer: Contact {
            name: "Officer".to_string(),
            e_mail: "officer@example.org".to_string(),
        },
        themes: strings(themes),
    }
}

/// A product of `project` with no other references.
pub fn product(id: &str, title: &str, project: &str) -> Product {
    Product {
        id: id.to_string(),
        title: title.to_string(),
        project: project.to_string(),
        ..Product::default()
    }
}

pub fn dated(mut product: Product, start: (i32, u32, u32), end: (i32, u32, u32)) -> Product {
    product.start = Some(date(start.0, start.1, start.2));
    product.end = Some(date(end.0, end.1, end.2));
    product
}

pub fn tagged(
    mut product: Product,
    themes: &[&str],
    variables: &[&str],
    missions: &[&str],
) -> Product {
    product.themes = strings(themes);
    product.variables = strings(variables);
    product.eo_missions = strings(missions);
    product
}

pub fn in_collection(mut product: Product, collection: &str) -> Product {
    product.collection = Some(collection.to_string());
    product
}

/// Two projects, three collections, one benchmark and one process; every
/// reference resolves.
pub fn sample_inputs() -> CatalogInputs {
    let sst = |id: &str, start: i32, end: i32, region: &str| {
        let mut product = in_collection(
            tagged(
                dated(product(id, &id.to_uppercase(), "CCI SST"), (start, 1, 1), (end, 12, 31)),
                &["Oceans"],
                &["Sea Surface Temperature"],
                &["Sentinel-3"],
            ),
            "SST Series",
        );
        product.region = Some(region.to_string());
        product
    };

    let mut benchmark = in_collection(
        tagged(
            product("sst-bench", "SST Benchmark", "CCI SST"),
            &["Oceans"],
            &["Sea Surface Temperature"],
            &["Sentinel-3"],
        ),
        "SST Benchmarks",
    );
    benchmark.kind = ProductKind::Benchmark;

    CatalogInputs {
        themes: vec![theme("Oceans"), theme("Land")],
        variables: vec![
            variable("Sea Surface Temperature", &["Oceans"]),
            variable("Soil Moisture", &["Land"]),
        ],
        eo_missions: vec![mission("Sentinel-3"), mission("SMOS")],
        projects: vec![project("CCI SST", &["Oceans"]), project("SMOS Soil", &["Land"])],
        products: vec![
            sst("sst-2010", 2010, 2012, "Atlantic"),
            sst("sst-2015", 2015, 2018, "Pacific"),
            sst("sst-2011", 2011, 2013, "Atlantic"),
            in_collection(
                tagged(
                    dated(
                        product("soil-moisture", "Soil Moisture CCI", "SMOS Soil"),
                        (2019, 6, 1),
                        (2021, 1, 1),
                    ),
                    &["Land", "Oceans"],
                    &["Soil Moisture"],
                    &["SMOS"],
                ),
                "Soil Moisture",
            ),
        ],
        benchmarks: vec![benchmark],
        processes: vec![Process {
            name: "SST Workflow".to_string(),
            project: "CCI SST".to_string(),
            description: String::new(),
            link: None,
            asset: None,
            released: None,
            languages: vec!["Python".to_string()],
        }],
        ..CatalogInputs::default()
    }
}

pub fn write_table(dir: &camino::Utf8Path, name: &str, rows: &[&[&str]]) {
    let mut writer = csv::Writer::from_path(dir.join(name)).unwrap();
    for row in rows {
        writer.write_record(*row).unwrap();
    }
    writer.flush().unwrap();
}

pub const PRODUCT_HEADER: [&str; 26] = [
    "Short_Name",
    "Product",
    "Description",
    "Project",
    "Variables",
    "Theme1",
    "Theme2",
    "Theme3",
    "Access",
    "Notebook",
    "DOI",
    "Start",
    "End",
    "Polygon",
    "Region",
    "Released",
    "EO_Missions",
    "Keywords",
    "Format",
    "Category",
    "Coordinate",
    "Spatial Resolution",
    "Temporal Resolution",
    "Collection",
    "Consortium",
    "Website",
];

/// A data directory equivalent to [`sample_inputs`] minus the benchmark.
pub fn write_data_dir(dir: &camino::Utf8Path) {
    write_table(
        dir,
        "themes.csv",
        &[
            &["theme", "description", "link", "image"],
            &["Oceans", "Salt water", "https://example.org/oceans", "oceans.png"],
            &["Land", "Solid ground", "", ""],
        ],
    );
    write_table(
        dir,
        "variables.csv",
        &[
            &["variable", "variable description", "link", "themes"],
            &["Sea Surface Temperature", "Skin temperature", "", "Oceans"],
            &["Soil Moisture", "Water held in soil", "", "Land"],
        ],
    );
    write_table(
        dir,
        "eo-missions.csv",
        &[
            &["EO_Missions", "Description", "Link"],
            &["Sentinel-3", "Ocean and land mission", "https://example.org/s3"],
            &["SMOS", "", ""],
        ],
    );
    write_table(
        dir,
        "projects.csv",
        &[
            &[
                "Short_Name",
                "Status",
                "Project_Name",
                "Short_Description",
                "Website",
                "Consortium",
                "Start_Date_Project",
                "End_Date_Project",
                "TO",
                "TO_E-mail",
                "Theme1",
                "Theme2",
                "Theme3",
            ],
            &[
                "CCI SST",
                "Ongoing",
                "Climate Change Initiative SST",
                "Sea surface records",
                "https://example.org/sst",
                "Met Office, DLR",
                "2010-01-01",
                "2025-12-31",
                "Jane Doe",
                "jane@example.org",
                "Oceans",
                "",
                "",
            ],
            &[
                "SMOS Soil",
                "COMPLETED",
                "SMOS Soil Moisture",
                "Soil records",
                "https://example.org/smos",
                "University A",
                "2015",
                "2020.11",
                "John Roe",
                "john@example.org",
                "Land",
                "",
                "",
            ],
        ],
    );
    write_table(
        dir,
        "products.csv",
        &[
            &PRODUCT_HEADER,
            &[
                "sst-2010",
                "SST 2010",
                "First release",
                "CCI SST",
                "Sea Surface Temperature",
                "Oceans",
                "",
                "",
                "https://example.org/a",
                "",
                "https://doi.org/10.1/sst",
                "2010-01-01",
                "2012-12-31",
                "[[[0,0],[10,0],[10,5],[0,0]]]",
                "Atlantic",
                "2013-02-01",
                "Sentinel-3",
                "ocean; sst",
                "NetCDF",
                "Dataset",
                "",
                "0.05 deg",
                "daily",
                "SST Series",
                "Met Office",
                "",
            ],
            &[
                "sst-2015",
                "SST 2015",
                "Second release",
                "CCI SST",
                "Sea Surface Temperature",
                "Oceans",
                "",
                "",
                "https://example.org/b",
                "",
                "",
                "2015-01-01",
                "2018-12-31",
                "",
                "Pacific",
                "Planned",
                "Sentinel-3",
                "",
                "",
                "",
                "",
                "",
                "",
                "SST Series",
                "",
                "",
            ],
            &[
                "soil-moisture",
                "Soil Moisture CCI",
                "Third release",
                "SMOS Soil",
                "Soil Moisture",
                "Land",
                "Oceans",
                "",
                "https://example.org/c",
                "",
                "",
                "2019-06-01",
                "2021-01-01",
                "[12.5, 41.9]",
                "",
                "planned",
                "SMOS",
                "",
                "",
                "",
                "",
                "",
                "",
                "Soil Moisture",
                "University A",
                "https://example.org/soil",
            ],
        ],
    );
    write_table(
        dir,
        "processes.csv",
        &[
            &["Name", "Project", "Description", "link"],
            &["SST Workflow", "CCI SST", "Processing chain", "https://example.org/wf"],
        ],
    );
}
