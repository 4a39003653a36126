//! End-to-end tests on a synthetic Sentinel-2 scene.
//!
//! The scene is a 12x12 grid of 10 m cells. Healthy canopy covers most of
//! it, with two separated patches of water-stressed crop:
//!
//! - rows 0..=2, cols 8..=11 (12 px)
//! - rows 8..=11, cols 0..=2 (12 px)
//!
//! Three observations carry cloud cover 5%, 20% and 8%; the cloudy one is
//! filled with values that would flip every class if it were composited.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use cropsense_algorithms::alerts::{alert_report, AlertLabels};
use cropsense_algorithms::pipeline::{run_pipeline, PipelineConfig};
use cropsense_core::io::{
    read_geotiff, read_image_stack, read_sample_points, write_geotiff, ObservationRecord,
    SceneManifest,
};
use cropsense_core::{Connectivity, Error, GeoTransform, ImageStack, Raster, SamplePoint, CRS};

const SIZE: usize = 12;
const ORIGIN_X: f64 = 500_000.0;
const ORIGIN_Y: f64 = 1_220_000.0;
const CELL: f64 = 10.0;
const BANDS: [&str; 6] = ["B2", "B3", "B4", "B8", "B11", "B12"];

fn is_stressed(row: usize, col: usize) -> bool {
    (row <= 2 && col >= 8) || (row >= 8 && col <= 2)
}

/// Surface reflectance of healthy or stressed crop in one band
fn reflectance(band: &str, stressed: bool) -> f64 {
    match (band, stressed) {
        ("B2", false) => 0.04,
        ("B3", false) => 0.08,
        ("B4", false) => 0.05,
        ("B8", false) => 0.45,
        ("B11", false) => 0.20,
        ("B12", false) => 0.12,
        ("B2", true) => 0.07,
        ("B3", true) => 0.09,
        ("B4", true) => 0.16,
        ("B8", true) => 0.22,
        ("B11", true) => 0.31,
        ("B12", true) => 0.27,
        _ => f64::NAN,
    }
}

/// One band over the whole scene; `flip` swaps the two cover types
fn band_raster(band: &str, offset: f64, flip: bool) -> Raster<f64> {
    let mut r = Raster::new(SIZE, SIZE);
    r.set_transform(GeoTransform::new(ORIGIN_X, ORIGIN_Y, CELL, -CELL));
    r.set_crs(Some(CRS::from_epsg(32643)));
    for row in 0..SIZE {
        for col in 0..SIZE {
            let stressed = is_stressed(row, col) != flip;
            r.set(row, col, reflectance(band, stressed) + offset).unwrap();
        }
    }
    r
}

fn cell_centre(row: usize, col: usize) -> (f64, f64) {
    (
        ORIGIN_X + (col as f64 + 0.5) * CELL,
        ORIGIN_Y - (row as f64 + 0.5) * CELL,
    )
}

/// Write GeoTIFFs, a manifest and a sample CSV; returns the manifest path
fn write_scene(dir: &Path) -> std::path::PathBuf {
    let dates = [
        ("t1", "2024-01-05", 5.0, 0.000, false),
        ("t2", "2024-01-15", 20.0, 0.000, true),
        ("t3", "2024-01-25", 8.0, 0.004, false),
    ];

    let mut observations = Vec::new();
    for (id, date, cloud, offset, flip) in dates {
        std::fs::create_dir_all(dir.join(id)).unwrap();
        let mut bands = BTreeMap::new();
        for band in BANDS {
            let rel = Path::new(id).join(format!("{}.tif", band));
            write_geotiff(&band_raster(band, offset, flip), dir.join(&rel)).unwrap();
            bands.insert(band.to_string(), rel);
        }
        observations.push(ObservationRecord {
            id: id.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            cloud_cover: cloud,
            bands,
            geotransform: None,
            epsg: None,
        });
    }

    let manifest_path = dir.join("scene.json");
    let file = File::create(&manifest_path).unwrap();
    serde_json::to_writer_pretty(file, &SceneManifest { observations }).unwrap();

    let mut csv = String::from("id,x,y,label,soil_moisture\n");
    let cells = [
        (1, 1), (3, 4), (5, 5), (6, 9), (10, 10), (4, 0), (0, 5), (11, 6),
        (0, 8), (1, 10), (2, 11), (9, 0), (10, 1), (11, 2),
    ];
    for (i, &(row, col)) in cells.iter().enumerate() {
        let (x, y) = cell_centre(row, col);
        let label = if is_stressed(row, col) { "stressed" } else { "healthy" };
        csv.push_str(&format!("S{},{},{},{},{}\n", i + 1, x, y, label, 0.1 + i as f64 * 0.01));
    }
    std::fs::write(dir.join("samples.csv"), csv).unwrap();

    manifest_path
}

fn load(dir: &Path) -> (ImageStack, Vec<SamplePoint>) {
    let manifest = write_scene(dir);
    let stack = read_image_stack(&manifest).unwrap();
    let points = read_sample_points(dir.join("samples.csv")).unwrap();
    (stack, points)
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

#[test]
fn full_pipeline_finds_both_stressed_patches() {
    let dir = tempfile::tempdir().unwrap();
    let (stack, points) = load(dir.path());
    assert_eq!(stack.len(), 3);
    assert_eq!(points.len(), 14);

    let out = run_pipeline(&stack, &points, &PipelineConfig::default()).unwrap();

    // Cloudy t2 excluded
    assert_eq!(out.composite.observations, vec!["t1", "t3"]);

    // Median of two clear dates is their mean
    let ndvi = out.composite.indices.get("NDVI").unwrap();
    let nd = |nir: f64, red: f64| (nir - red) / (nir + red);
    let expected = (nd(0.45, 0.05) + nd(0.454, 0.054)) / 2.0;
    assert_relative_eq!(ndvi.get(5, 5).unwrap(), expected, epsilon = 1e-6);

    assert_eq!(out.model.classes(), &["healthy".to_string(), "stressed".to_string()]);
    assert_eq!(out.features.len(), 14);
    assert_eq!(out.features[0].get("soil_moisture"), Some(0.1));

    for row in 0..SIZE {
        for col in 0..SIZE {
            let expected = if is_stressed(row, col) { "stressed" } else { "healthy" };
            assert_eq!(out.classification.label_at(row, col), Some(expected), "cell ({}, {})", row, col);
        }
    }

    // One healthy background region plus the two patches
    assert_eq!(out.regions.len(), 3);
    let alerts: Vec<_> = out.alerts().collect();
    assert_eq!(alerts.len(), 2);
    assert!(alerts.iter().all(|r| r.label == "stressed" && r.pixel_count == 12));
    assert!(alerts[0].advisory.contains("irrigation"));

    // Row-major numbering: the top-right patch is found first
    let (cx, cy) = cell_centre(1, 8);
    assert_relative_eq!(alerts[0].centroid.x, cx + 1.5 * CELL, epsilon = 1e-9);
    assert_relative_eq!(alerts[0].centroid.y, cy, epsilon = 1e-9);

    let report = alert_report(&out.regions);
    assert!(report.starts_with("2 alert(s) in 3 regions"));
}

#[test]
fn classification_raster_round_trips_through_geotiff() {
    let dir = tempfile::tempdir().unwrap();
    let (stack, points) = load(dir.path());
    let out = run_pipeline(&stack, &points, &PipelineConfig::default()).unwrap();

    let path = dir.path().join("classification.tif");
    write_geotiff(&out.classification.labels, &path).unwrap();
    let back: Raster<f64> = read_geotiff(&path).unwrap();

    assert!(back.ensure_same_grid(&out.classification.labels).is_ok());
    assert_eq!(back.get(0, 11).unwrap(), 2.0);
    assert_eq!(back.get(5, 5).unwrap(), 1.0);
}

#[test]
fn four_connectivity_with_custom_alert_labels() {
    let dir = tempfile::tempdir().unwrap();
    let (stack, points) = load(dir.path());

    let config = PipelineConfig {
        connectivity: Connectivity::Four,
        alert_labels: AlertLabels::new(["healthy"]),
        ..Default::default()
    };
    let out = run_pipeline(&stack, &points, &config).unwrap();

    let alerts: Vec<_> = out.alerts().collect();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].label, "healthy");
    assert_eq!(alerts[0].pixel_count, SIZE * SIZE - 24);
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn strict_threshold_empties_the_stack() {
    let dir = tempfile::tempdir().unwrap();
    let (stack, points) = load(dir.path());

    let config = PipelineConfig {
        cloud_threshold: 4.0,
        ..Default::default()
    };
    let err = run_pipeline(&stack, &points, &config).unwrap_err();
    assert!(matches!(err, Error::EmptyStack { total: 3, .. }));
}

#[test]
fn point_outside_scene_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (stack, mut points) = load(dir.path());
    points[0].location.x = ORIGIN_X - 100.0;

    let err = run_pipeline(&stack, &points, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { .. }));
}

#[test]
fn single_label_training_is_degenerate() {
    let dir = tempfile::tempdir().unwrap();
    let (stack, points) = load(dir.path());
    let healthy: Vec<_> = points.into_iter().filter(|p| p.label == "healthy").collect();

    let err = run_pipeline(&stack, &healthy, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, Error::DegenerateTraining { classes: 1 }));
}

#[test]
fn unknown_predictor_is_a_schema_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let (stack, points) = load(dir.path());

    let config = PipelineConfig {
        predictors: Some(vec!["NDVI".into(), "EVI".into()]),
        ..Default::default()
    };
    let err = run_pipeline(&stack, &points, &config).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

#[test]
fn attribute_predictor_is_rejected_before_training() {
    let dir = tempfile::tempdir().unwrap();
    let (stack, points) = load(dir.path());
    // A single label would fail training; the predictor check comes first
    let healthy: Vec<_> = points.into_iter().filter(|p| p.label == "healthy").collect();

    let config = PipelineConfig {
        predictors: Some(vec!["NDVI".into(), "soil_moisture".into()]),
        ..Default::default()
    };
    let err = run_pipeline(&stack, &healthy, &config).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}
