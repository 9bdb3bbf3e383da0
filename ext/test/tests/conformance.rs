//! Conformance tests that run YAML fixtures against pmatch
//!
//! Run with: cargo test -p pmatch-test --test conformance --features pmatch-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use pmatch_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and run every fixture in one file
fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    let yaml = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));

    // Parse potentially multiple fixtures (separated by ---)
    let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
        panic!("Failed to parse {}: {e}", path.display());
    });
    assert!(!fixtures.is_empty(), "{} has no fixtures", path.display());

    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_http_response() {
    run_fixture_file("01_http_response.yaml");
}

#[test]
fn test_adventure() {
    run_fixture_file("02_adventure.yaml");
}

#[test]
fn test_regex() {
    run_fixture_file("03_regex.yaml");
}

#[test]
fn test_extractors() {
    run_fixture_file("04_extractors.yaml");
}

#[test]
fn test_guards() {
    run_fixture_file("05_guards.yaml");
}

#[test]
fn test_construction_errors() {
    run_fixture_file("06_construction_errors.yaml");
}

#[test]
fn every_fixture_file_is_listed() {
    let mut files: Vec<String> = fs::read_dir(fixtures_dir())
        .expect("read fixtures dir")
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let is_yaml = path.extension().is_some_and(|e| e == "yaml" || e == "yml");
            is_yaml.then(|| path.file_name()?.to_str().map(str::to_owned))?
        })
        .collect();
    files.sort();
    assert_eq!(
        files,
        [
            "01_http_response.yaml",
            "02_adventure.yaml",
            "03_regex.yaml",
            "04_extractors.yaml",
            "05_guards.yaml",
            "06_construction_errors.yaml",
        ]
    );
}
