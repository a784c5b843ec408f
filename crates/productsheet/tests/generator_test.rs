//! End-to-end tests for product sheet generation.

mod common;

use std::path::Path;

use rusqlite::types::Value;
use tempfile::TempDir;

use common::{GpkgFixture, ROAD_FIELDS, line_blob, metadata_csv, point_blob, road_rows, roads_gpkg, text};
use productsheet::metadata::{DATASET_SECTION, GENERAL_SECTION};
use productsheet::{
    DatasetEvent, GeneratorConfig, ProductSheetError, ProductSheetGenerator, SamplingConfig,
};

fn config(dir: &Path) -> GeneratorConfig {
    GeneratorConfig {
        input_dir: dir.to_path_buf(),
        ..GeneratorConfig::default()
    }
}

// =============================================================================
// Batch Tests
// =============================================================================

#[test]
fn test_batch_writes_product_sheet() {
    let dir = TempDir::new().unwrap();
    roads_gpkg(dir.path(), "roads", 5);
    metadata_csv(dir.path(), "dataset,title,owner\nroads,Road network,NVDB\n");

    let generator = ProductSheetGenerator::prepare(config(dir.path())).unwrap();
    let report = generator.run_batch().unwrap();

    assert_eq!(report.produced.len(), 1);
    assert!(report.skipped.is_empty());

    let outcome = &report.produced[0];
    assert_eq!(outcome.title, "Road network (NOR) - Product Sheet");
    assert_eq!(
        outcome.output,
        dir.path().join("Road network (NOR) - Product Sheet.html")
    );
    assert!(outcome.source.hash.starts_with("sha256:"));

    let html = std::fs::read_to_string(&outcome.output).unwrap();
    assert!(html.contains("Road network (NOR) - Product Sheet"));
    assert!(html.contains("roads.gpkg"));
    assert!(html.contains("NVDB"));
    assert!(html.contains(GENERAL_SECTION));
    assert!(html.contains(DATASET_SECTION));
    assert!(html.contains("Number of layers"));
}

#[test]
fn test_fields_follow_schema_order_and_code_lists() {
    let dir = TempDir::new().unwrap();
    roads_gpkg(dir.path(), "roads", 5);
    metadata_csv(dir.path(), "dataset,title\nroads,Roads\n");

    let report = ProductSheetGenerator::prepare(config(dir.path()))
        .unwrap()
        .run_batch()
        .unwrap();
    let layer = &report.produced[0].layers[0];

    assert_eq!(layer.name, "roads");
    assert_eq!(layer.feature_count, 5);
    assert_eq!(layer.geometry_type, vec!["Point"]);

    let names: Vec<&str> = layer.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["name", "surface", "lanes"]);
    assert_eq!(layer.fields[1].dtype.to_string(), "str:10");
    assert_eq!(layer.fields[2].dtype.to_string(), "int");
    assert_eq!(
        layer.fields[1].allowed_values,
        Some(vec!["gravel".to_string(), "paved".to_string()])
    );
    assert!(layer.fields[2].allowed_values.is_none());
}

#[test]
fn test_code_list_overrides_single_valued_field() {
    let dir = TempDir::new().unwrap();
    let rows = (0..3)
        .map(|i| {
            (
                Some(point_blob(10.0 + i as f64, 60.0, 4326)),
                vec![text(&format!("Road {}", i)), text("paved"), Value::Integer(2)],
            )
        })
        .collect();
    let fixture = GpkgFixture::create(dir.path().join("roads.gpkg"));
    fixture
        .layer("roads", "POINT", 4326, ROAD_FIELDS, rows)
        .attributes(
            "code_roads_surface",
            &[("code", "TEXT")],
            vec![vec![text("paved")], vec![text("gravel")]],
        );
    fixture.finish();
    metadata_csv(dir.path(), "dataset\nroads\n");

    let report = ProductSheetGenerator::prepare(config(dir.path()))
        .unwrap()
        .run_batch()
        .unwrap();
    let surface = &report.produced[0].layers[0].fields[1];
    assert_eq!(
        surface.allowed_values,
        Some(vec!["gravel".to_string(), "paved".to_string()])
    );
}

#[test]
fn test_code_table_is_skipped_as_layer() {
    let dir = TempDir::new().unwrap();
    roads_gpkg(dir.path(), "roads", 3);
    metadata_csv(dir.path(), "dataset\nroads\n");

    let report = ProductSheetGenerator::prepare(config(dir.path()))
        .unwrap()
        .run_batch()
        .unwrap();
    let outcome = &report.produced[0];

    assert_eq!(outcome.layers.len(), 1);
    assert_eq!(outcome.skipped_layers.len(), 1);
    assert_eq!(outcome.skipped_layers[0].layer, "code_roads_surface");
    assert!(outcome.skipped_layers[0].reason.contains("no geometry column"));
}

#[test]
fn test_missing_metadata_skips_dataset() {
    let dir = TempDir::new().unwrap();
    roads_gpkg(dir.path(), "lakes", 3);
    roads_gpkg(dir.path(), "roads", 3);
    metadata_csv(dir.path(), "dataset,title\nroads,Roads\n");

    let generator = ProductSheetGenerator::prepare(config(dir.path())).unwrap();
    let mut events = Vec::new();
    let report = generator
        .run_batch_with(|event| {
            events.push(match event {
                DatasetEvent::Produced(o) => format!("produced {}", o.source.identifier),
                DatasetEvent::Skipped(s) => format!("skipped {}", s.dataset),
                DatasetEvent::Overwrote(_) => "overwrote".to_string(),
            })
        })
        .unwrap();

    assert_eq!(events, vec!["skipped lakes", "produced roads"]);
    assert_eq!(report.produced.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].dataset, "lakes");
    assert_eq!(report.skipped[0].reason, "No metadata found for lakes");

    let html_files = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|x| x == "html").unwrap_or(false))
        .count();
    assert_eq!(html_files, 1);
}

#[test]
fn test_unreadable_code_list_skips_only_that_dataset() {
    let dir = TempDir::new().unwrap();
    let fixture = GpkgFixture::create(dir.path().join("broken.gpkg"));
    fixture
        .layer("roads", "POINT", 4326, ROAD_FIELDS, road_rows(3))
        .register_only("code_roads_surface");
    fixture.finish();
    roads_gpkg(dir.path(), "roads", 3);
    metadata_csv(dir.path(), "dataset,title\nbroken,Broken roads\nroads,Roads\n");

    let report = ProductSheetGenerator::prepare(config(dir.path()))
        .unwrap()
        .run_batch()
        .unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].dataset, "broken");
    assert!(
        report.skipped[0]
            .reason
            .starts_with("Malformed code list table 'code_roads_surface'"),
        "unexpected reason: {}",
        report.skipped[0].reason
    );

    assert_eq!(report.produced.len(), 1);
    assert_eq!(report.produced[0].source.identifier, "roads");
    assert!(report.produced[0].output.exists());
    assert!(!dir.path().join("Broken roads (NOR) - Product Sheet.html").exists());
}

#[test]
fn test_zero_feature_layer_is_omitted() {
    let dir = TempDir::new().unwrap();
    let fixture = GpkgFixture::create(dir.path().join("roads.gpkg"));
    fixture
        .layer("bridges", "POINT", 4326, &[("name", "TEXT")], Vec::new())
        .layer("roads", "POINT", 4326, ROAD_FIELDS, road_rows(4));
    fixture.finish();
    metadata_csv(dir.path(), "dataset\nroads\n");

    let report = ProductSheetGenerator::prepare(config(dir.path()))
        .unwrap()
        .run_batch()
        .unwrap();
    let outcome = &report.produced[0];

    let names: Vec<&str> = outcome.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["roads"]);
    assert!(outcome.skipped_layers.is_empty());
    // Two layers share the budget even though one is empty.
    assert_eq!(outcome.budget, 1250);
}

#[test]
fn test_budget_truncates_map_sample() {
    let dir = TempDir::new().unwrap();
    roads_gpkg(dir.path(), "roads", 30);
    metadata_csv(dir.path(), "dataset\nroads\n");

    let mut config = config(dir.path());
    config.sampling = SamplingConfig {
        max_total_features: 20,
        ..SamplingConfig::default()
    };
    let report = ProductSheetGenerator::prepare(config)
        .unwrap()
        .run_batch()
        .unwrap();
    let outcome = &report.produced[0];

    assert_eq!(outcome.budget, 10);
    let layer = &outcome.layers[0];
    assert_eq!(layer.feature_count, 30);
    assert_eq!(layer.shown(outcome.budget), 10);
    assert_eq!(
        layer.note,
        "Only showing 10 features in map, centered near dataset centroid."
    );
}

#[test]
fn test_same_title_overwrites_with_warning() {
    let dir = TempDir::new().unwrap();
    roads_gpkg(dir.path(), "roads_a", 2);
    roads_gpkg(dir.path(), "roads_b", 2);
    metadata_csv(dir.path(), "dataset,title\nroads_a,Roads?\nroads_b,Roads!\n");

    let report = ProductSheetGenerator::prepare(config(dir.path()))
        .unwrap()
        .run_batch()
        .unwrap();

    assert_eq!(report.produced.len(), 2);
    assert_eq!(report.overwritten.len(), 1);
    assert_eq!(
        report.overwritten[0],
        dir.path().join("Roads (NOR) - Product Sheet.html")
    );
}

#[test]
fn test_output_dir_and_projected_layer() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("sheets");
    let fixture = GpkgFixture::create(dir.path().join("rivers.gpkg"));
    fixture.layer(
        "rivers",
        "LINESTRING",
        3857,
        &[("name", "TEXT")],
        vec![(
            Some(line_blob(&[(1_113_194.9, 8_399_737.9), (1_224_514.4, 8_399_737.9)], 3857)),
            vec![text("Glomma")],
        )],
    );
    fixture.finish();
    metadata_csv(dir.path(), "dataset,title\nrivers,Rivers\n");

    let config = GeneratorConfig {
        output_dir: Some(out.clone()),
        ..config(dir.path())
    };
    let report = ProductSheetGenerator::prepare(config)
        .unwrap()
        .run_batch()
        .unwrap();

    let outcome = &report.produced[0];
    assert_eq!(outcome.output.parent(), Some(out.as_path()));
    assert_eq!(outcome.layers[0].geometry_type, vec!["LineString"]);

    // Map samples are embedded as WGS84.
    let html = std::fs::read_to_string(&outcome.output).unwrap();
    assert!(html.contains("Glomma"));
    assert!(!html.contains("1113194"));
}

#[test]
fn test_undefined_cartesian_layer_is_skipped() {
    let dir = TempDir::new().unwrap();
    let fixture = GpkgFixture::create(dir.path().join("grid.gpkg"));
    fixture
        .layer(
            "cells",
            "POINT",
            -1,
            &[("name", "TEXT")],
            vec![(Some(point_blob(1.0, 2.0, -1)), vec![text("a")])],
        )
        .layer("roads", "POINT", 4326, ROAD_FIELDS, road_rows(2));
    fixture.finish();
    metadata_csv(dir.path(), "dataset\ngrid\n");

    let report = ProductSheetGenerator::prepare(config(dir.path()))
        .unwrap()
        .run_batch()
        .unwrap();
    let outcome = &report.produced[0];

    assert_eq!(outcome.layers.len(), 1);
    assert_eq!(outcome.skipped_layers[0].layer, "cells");
}

// =============================================================================
// Startup Tests
// =============================================================================

#[test]
fn test_no_container_is_fatal() {
    let dir = TempDir::new().unwrap();
    metadata_csv(dir.path(), "dataset\nroads\n");

    let result = ProductSheetGenerator::prepare(config(dir.path()));
    assert!(matches!(result, Err(ProductSheetError::MissingInput(_))));
}

#[test]
fn test_no_metadata_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    roads_gpkg(dir.path(), "roads", 2);

    let result = ProductSheetGenerator::prepare(config(dir.path()));
    assert!(matches!(result, Err(ProductSheetError::MissingInput(_))));
}

#[test]
fn test_missing_key_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    roads_gpkg(dir.path(), "roads", 2);
    metadata_csv(dir.path(), "name,title\nroads,Roads\n");

    let result = ProductSheetGenerator::prepare(config(dir.path()));
    assert!(matches!(result, Err(ProductSheetError::MetadataSheet(_))));
}

#[test]
fn test_unparseable_basemap_is_fatal() {
    let dir = TempDir::new().unwrap();
    roads_gpkg(dir.path(), "roads", 2);
    metadata_csv(dir.path(), "dataset\nroads\n");
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/countries.geojson"), "{ broken").unwrap();

    assert!(ProductSheetGenerator::prepare(config(dir.path())).is_err());
}

#[test]
fn test_input_dir_template_is_used() {
    let dir = TempDir::new().unwrap();
    roads_gpkg(dir.path(), "roads", 2);
    metadata_csv(dir.path(), "dataset,title\nroads,Roads\n");
    std::fs::write(
        dir.path().join("template_standalone.html"),
        "<h1>{{ title }}</h1>{% for l in geojson_layers %}<p>{{ l.name }}={{ l.data.features|length }}</p>{% endfor %}",
    )
    .unwrap();

    let report = ProductSheetGenerator::prepare(config(dir.path()))
        .unwrap()
        .run_batch()
        .unwrap();
    let html = std::fs::read_to_string(&report.produced[0].output).unwrap();
    assert_eq!(html, "<h1>Roads (NOR) - Product Sheet</h1><p>roads=2</p>");
}

// =============================================================================
// Inspect Tests
// =============================================================================

#[test]
fn test_inspect_reports_code_lists_and_tables() {
    let dir = TempDir::new().unwrap();
    let path = roads_gpkg(dir.path(), "roads", 4);

    let report = productsheet::inspect(&path, Default::default(), 2500).unwrap();

    assert_eq!(report.file, "roads.gpkg");
    assert_eq!(report.code_lists.len(), 1);
    assert_eq!(report.code_lists.get("ROADS", "surface").map(|v| v.len()), Some(2));

    let names: Vec<&str> = report.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["roads", "code_roads_surface"]);
    assert!(report.layers[1].geometry_type.is_empty());
}
