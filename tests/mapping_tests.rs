//! Path mapping resolution tests
//!
//! Covers:
//! - A. Default directory/pattern substitution
//! - B. Zero-spec fallback keyed on default directory existence
//! - C. Invalid directory rejection
//! - D. Exclude patterns
//! - E. Declaration order and cross-spec concatenation (no dedup)
//! - F. Mapping-option overlay: only what's set is applied

use std::fs;
use std::path::Path;

use sqlunit_runner::config::{ConfigError, ObjectGroupConfig, ResourceSpec, TypeMapping};
use sqlunit_runner::{build_mapping_options, GlobScanner, PathMappingResolver};
use tempfile::TempDir;

const DEFAULT_TEST_DIR: &str = "src/test/sql";
const DEFAULT_PATTERN: &str = "**/*.sql";

fn touch(base: &Path, relative: &str) {
    let path = base.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "-- sql").unwrap();
}

fn spec(directory: &str, includes: &[&str], excludes: &[&str]) -> ResourceSpec {
    ResourceSpec {
        directory: Some(directory.to_string()),
        includes: includes.iter().map(|s| s.to_string()).collect(),
        excludes: excludes.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn zero_specs_use_default_directory_and_pattern() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "src/test/sql/pkg_a.sql");
    touch(dir.path(), "src/test/sql/nested/pkg_b.sql");
    touch(dir.path(), "src/test/sql/readme.txt");

    let scanner = GlobScanner;
    let resolver = PathMappingResolver::new(&scanner);
    let paths = resolver
        .resolve(dir.path(), &[], DEFAULT_TEST_DIR, DEFAULT_PATTERN)
        .unwrap();

    assert_eq!(
        paths,
        vec![
            "src/test/sql/nested/pkg_b.sql".to_string(),
            "src/test/sql/pkg_a.sql".to_string(),
        ]
    );
}

#[test]
fn zero_specs_with_absent_default_directory_is_empty_not_an_error() {
    let dir = TempDir::new().unwrap();

    let scanner = GlobScanner;
    let resolver = PathMappingResolver::new(&scanner);
    let paths = resolver
        .resolve(dir.path(), &[], DEFAULT_TEST_DIR, DEFAULT_PATTERN)
        .unwrap();

    assert!(paths.is_empty());
}

#[test]
fn spec_with_empty_includes_uses_default_pattern() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "db/tests/one.sql");
    touch(dir.path(), "db/tests/two.pks");

    let scanner = GlobScanner;
    let resolver = PathMappingResolver::new(&scanner);
    let paths = resolver
        .resolve(
            dir.path(),
            &[spec("db/tests", &[], &[])],
            DEFAULT_TEST_DIR,
            DEFAULT_PATTERN,
        )
        .unwrap();

    assert_eq!(paths, vec!["db/tests/one.sql".to_string()]);
}

#[test]
fn explicit_missing_directory_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();

    let scanner = GlobScanner;
    let resolver = PathMappingResolver::new(&scanner);
    let result = resolver.resolve(
        dir.path(),
        &[spec("no/such/dir", &[], &[])],
        DEFAULT_TEST_DIR,
        DEFAULT_PATTERN,
    );

    assert!(matches!(result, Err(ConfigError::InvalidDirectory(d)) if d == "no/such/dir"));
}

#[test]
fn exclude_patterns_filter_matches() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "db/tests/keep.sql");
    touch(dir.path(), "db/tests/skip/drop.sql");

    let scanner = GlobScanner;
    let resolver = PathMappingResolver::new(&scanner);
    let paths = resolver
        .resolve(
            dir.path(),
            &[spec("db/tests", &["**/*.sql"], &["skip/**"])],
            DEFAULT_TEST_DIR,
            DEFAULT_PATTERN,
        )
        .unwrap();

    assert_eq!(paths, vec!["db/tests/keep.sql".to_string()]);
}

#[test]
fn specs_concatenate_in_declaration_order_without_cross_spec_dedup() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "db/a/first.sql");
    touch(dir.path(), "db/b/second.sql");

    let scanner = GlobScanner;
    let resolver = PathMappingResolver::new(&scanner);
    let paths = resolver
        .resolve(
            dir.path(),
            &[
                spec("db/b", &["**/*.sql"], &[]),
                spec("db/a", &["**/*.sql"], &[]),
                // Same directory again: paths repeat.
                spec("db/b", &["**/*.sql"], &[]),
            ],
            DEFAULT_TEST_DIR,
            DEFAULT_PATTERN,
        )
        .unwrap();

    assert_eq!(
        paths,
        vec![
            "db/b/second.sql".to_string(),
            "db/a/first.sql".to_string(),
            "db/b/second.sql".to_string(),
        ]
    );
}

// Mapping-option overlay

#[test]
fn empty_group_leaves_all_engine_defaults_untouched() {
    let options =
        build_mapping_options(vec!["a.sql".to_string()], &ObjectGroupConfig::default()).unwrap();

    assert_eq!(options.file_paths, vec!["a.sql".to_string()]);
    assert!(options.object_owner.is_none());
    assert!(options.regex_pattern.is_none());
    assert!(options.owner_subexpression.is_none());
    assert!(options.name_subexpression.is_none());
    assert!(options.type_subexpression.is_none());
    assert!(options.type_mappings.is_empty());
}

#[test]
fn single_override_does_not_require_respecifying_the_rest() {
    let group = ObjectGroupConfig {
        name_subexpression: Some(2),
        ..ObjectGroupConfig::default()
    };
    let options = build_mapping_options(Vec::new(), &group).unwrap();

    assert_eq!(options.name_subexpression, Some(2));
    assert!(options.regex_pattern.is_none());
    assert!(options.owner_subexpression.is_none());
}

#[test]
fn blank_owner_and_regex_count_as_unset() {
    let group = ObjectGroupConfig {
        owner: Some("  ".to_string()),
        regex_pattern: Some(String::new()),
        ..ObjectGroupConfig::default()
    };
    let options = build_mapping_options(Vec::new(), &group).unwrap();

    assert!(options.object_owner.is_none());
    assert!(options.regex_pattern.is_none());
}

#[test]
fn invalid_regex_is_rejected_at_build_time() {
    let group = ObjectGroupConfig {
        regex_pattern: Some("([unclosed".to_string()),
        ..ObjectGroupConfig::default()
    };

    assert!(matches!(
        build_mapping_options(Vec::new(), &group),
        Err(ConfigError::InvalidRegex { .. })
    ));
}

#[test]
fn custom_type_mappings_replace_the_default_table() {
    let group = ObjectGroupConfig {
        type_mappings: vec![TypeMapping {
            token: "pkb".to_string(),
            object_type: "PACKAGE BODY".to_string(),
        }],
        ..ObjectGroupConfig::default()
    };
    let options = build_mapping_options(Vec::new(), &group).unwrap();

    assert_eq!(options.type_mappings, group.type_mappings);
}
