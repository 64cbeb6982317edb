//! Tests for JsonTagSource against real files

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use tagtree::application::ApplicationError;
use tagtree::domain::{DomainError, TagId};
use tagtree::infrastructure::source::JsonTagSource;
use tagtree::infrastructure::traits::{RealFileSystem, TagSource};
use tagtree::util::testing;

fn source_for(dir: &Path, content: &str) -> JsonTagSource {
    let path = dir.join("tags.json");
    fs::write(&path, content).unwrap();
    JsonTagSource::new(Arc::new(RealFileSystem), path)
}

#[rstest]
#[case::bare_array(r#"[{"id": 1, "name": "a", "parents": []}, {"id": 2, "name": "b", "parents": [1]}]"#)]
#[case::envelope(r#"{"data": [{"id": 1, "name": "a"}, {"id": 2, "name": "b", "parents": [1]}]}"#)]
#[case::populated(r#"[{"id": 1, "name": "a", "children": [{"id": 2, "name": "b"}]}, {"id": 2, "name": "b", "parents": [{"id": 1, "name": "a"}]}]"#)]
fn given_supported_shape_when_fetching_then_reads_all_tags(#[case] content: &str) {
    testing::init_test_setup();
    // Arrange
    let dir = TempDir::new().unwrap();
    let source = source_for(dir.path(), content);

    // Act
    let tags = source.fetch_all().unwrap();

    // Assert
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].name, "a");
    assert_eq!(tags[1].parents, vec![TagId::Int(1)]);
}

#[test]
fn given_string_ids_when_fetching_then_keeps_text_ids() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let source = source_for(
        dir.path(),
        r#"[{"id": "lang", "name": "Languages"}, {"id": "rust", "name": "Rust", "parents": ["lang"]}]"#,
    );

    // Act
    let tags = source.fetch_all().unwrap();

    // Assert
    assert_eq!(tags[0].id, TagId::from("lang"));
    assert_eq!(tags[1].parents, vec![TagId::from("lang")]);
}

#[test]
fn given_empty_array_when_fetching_then_returns_no_tags() {
    let dir = TempDir::new().unwrap();
    let source = source_for(dir.path(), "[]");

    assert!(source.fetch_all().unwrap().is_empty());
}

#[test]
fn given_malformed_json_when_fetching_then_returns_fetch_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let source = source_for(dir.path(), r#"[{"id": 1, "name": "a""#);

    // Act
    let result = source.fetch_all();

    // Assert
    match result {
        Err(ApplicationError::Fetch { context, .. }) => {
            assert!(context.starts_with("parse "), "context: {}", context)
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[test]
fn given_missing_file_when_fetching_then_returns_fetch_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.json");
    let source = JsonTagSource::new(Arc::new(RealFileSystem), &path);

    // Act
    let result = source.fetch_all();

    // Assert
    assert_eq!(source.path(), path.as_path());
    match result {
        Err(ApplicationError::Fetch { context, .. }) => {
            assert!(context.contains("nope.json"), "context: {}", context)
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[test]
fn given_blank_id_when_fetching_then_returns_invalid_record() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let source = source_for(dir.path(), r#"[{"id": 1, "name": "a"}, {"id": "", "name": "b"}]"#);

    // Act
    let result = source.fetch_all();

    // Assert
    match result {
        Err(ApplicationError::Domain(DomainError::InvalidRecord { position, .. })) => {
            assert_eq!(position, 1)
        }
        other => panic!("expected invalid record, got {:?}", other),
    }
}
