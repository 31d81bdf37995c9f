//! End-to-end tests for the geowrangle binary
//!
//! Inputs are written with the library, then each subcommand is run as a
//! child process and its JSON output checked.

use geo::{point, polygon};
use geowrangle_core::{write_vector, Crs, Feature, VectorDataset};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn geowrangle() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_geowrangle"));
    for key in [
        "GEOWRANGLE_SUBSET_ID_FIELD",
        "GEOWRANGLE_JOIN_ID_FIELD",
        "GEOWRANGLE_GDB_PATH",
        "GEOWRANGLE_GDB_OUTPUT_DIR",
        "GEOWRANGLE_GDB_GEOMETRY_LAYER",
        "GEOWRANGLE_PLOT_FORMAT",
    ] {
        command.env_remove(key);
    }
    command.env("RUST_LOG", "warn");
    command
}

fn json_stdout(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

fn write_zctas(dir: &Path) -> PathBuf {
    let path = dir.join("zcta.geojson");
    let dataset = VectorDataset::from_features(
        "zcta",
        Crs::wgs84(),
        vec![
            Feature::from_geometry(polygon![
                (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0),
            ])
            .with_property("ZCTA5CE10", "94103"),
            Feature::from_geometry(polygon![
                (x: 10.0, y: 0.0), (x: 20.0, y: 0.0), (x: 20.0, y: 10.0), (x: 10.0, y: 10.0),
            ])
            .with_property("ZCTA5CE10", "94110"),
        ],
    );
    write_vector(&dataset, &path).unwrap();
    path
}

fn write_stops(dir: &Path) -> PathBuf {
    let path = dir.join("stops.geojson");
    let dataset = VectorDataset::from_features(
        "stops",
        Crs::wgs84(),
        vec![
            Feature::from_geometry(point!(x: 5.0, y: 5.0)).with_property("osm_id", 1),
            Feature::from_geometry(point!(x: 50.0, y: 5.0)).with_property("osm_id", 2),
        ],
    );
    write_vector(&dataset, &path).unwrap();
    path
}

#[test]
fn test_subset_json() {
    let temp_dir = TempDir::new().unwrap();
    let zctas = write_zctas(temp_dir.path());
    let out = temp_dir.path().join("subset.geojson");

    let output = geowrangle()
        .arg("subset")
        .arg(&zctas)
        .args(["--id", "94110", "--json", "--output"])
        .arg(&out)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let parsed = json_stdout(&output);
    assert_eq!(parsed["status"], "success");
    assert_eq!(parsed["data"]["features"], 1);
    assert_eq!(parsed["data"]["id_field"], "ZCTA5CE10");
    assert!(out.exists());
}

#[test]
fn test_subset_id_field_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    let zctas = write_zctas(temp_dir.path());

    let output = geowrangle()
        .env("GEOWRANGLE_SUBSET_ID_FIELD", "GEOID10")
        .arg("subset")
        .arg(&zctas)
        .args(["--id", "94110"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("GEOID10"));
}

#[test]
fn test_clip_falls_back_to_join() {
    let temp_dir = TempDir::new().unwrap();
    let zctas = write_zctas(temp_dir.path());
    let stops = write_stops(temp_dir.path());
    let out = temp_dir.path().join("clipped.geojson");

    let output = geowrangle()
        .arg("clip")
        .arg(&zctas)
        .arg(&stops)
        .arg(&out)
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let parsed = json_stdout(&output);
    assert_eq!(parsed["data"]["strategy"], "spatial join");
    assert_eq!(parsed["data"]["features"], 1);
    assert!(out.exists());
}

#[test]
fn test_clip_failure_exits_non_zero() {
    let temp_dir = TempDir::new().unwrap();
    let zctas = write_zctas(temp_dir.path());
    let stops = write_stops(temp_dir.path());
    let out = temp_dir.path().join("clipped.geojson");

    let output = geowrangle()
        .arg("clip")
        .arg(&zctas)
        .arg(&stops)
        .arg(&out)
        .args(["--join", "--id-field", "way_id"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!out.exists());
}

#[test]
fn test_plot_svg() {
    let temp_dir = TempDir::new().unwrap();
    let zctas = write_zctas(temp_dir.path());
    let stops = write_stops(temp_dir.path());
    let out = temp_dir.path().join("map.svg");

    let output = geowrangle()
        .arg("plot")
        .arg(&zctas)
        .arg(&stops)
        .args(["--format", "svg", "--size", "200", "--json", "--output"])
        .arg(&out)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let parsed = json_stdout(&output);
    assert_eq!(parsed["data"]["format"], "svg");
    assert_eq!(parsed["data"]["layers"].as_array().unwrap().len(), 2);
    assert!(std::fs::read_to_string(&out).unwrap().contains("<svg"));
}

#[test]
fn test_show_missing_image() {
    let output = geowrangle().args(["show", "/nonexistent/scene.tif"]).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_config_sources() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("geowrangle.toml");
    std::fs::write(&config_path, "join_id_field = \"way_id\"\n").unwrap();

    let output = geowrangle()
        .env("GEOWRANGLE_PLOT_FORMAT", "svg")
        .arg("config")
        .arg("--config")
        .arg(&config_path)
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let parsed = json_stdout(&output);
    let entries = parsed["data"].as_array().unwrap();
    let entry = |key: &str| entries.iter().find(|e| e["key"] == key).unwrap().clone();

    assert_eq!(entry("join_id_field")["value"], "way_id");
    assert_eq!(entry("join_id_field")["source"], "File");
    assert_eq!(entry("plot_format")["value"], "svg");
    assert_eq!(entry("plot_format")["source"], "Environment");
    assert_eq!(entry("subset_id_field")["source"], "Default");
}
