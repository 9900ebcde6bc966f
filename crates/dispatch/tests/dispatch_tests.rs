//! End-to-end tests for metadata-driven dispatch over an on-disk archive.

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use dispatch::{Archive, DispatchError, OpContext, OperationRegistry, META_FILENAME};

fn write_meta(root: &Path, dir: &str, value: serde_json::Value) {
    let dir = root.join(dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(META_FILENAME), value.to_string()).unwrap();
}

/// An archive with one `gets` rule and one `builds` rule under `data/`.
fn sample_archive(root: &Path) {
    write_meta(
        root,
        "data",
        json!({
            "gets": {
                "day": {
                    "path": "<int:year>/<int:month>/<int:day>/<field>",
                    "operation": "test.read"
                }
            },
            "builds": {
                "day": {
                    "path": "<int:year>/<int:month>/<int:day>/<field>",
                    "operation": "test.write",
                    "source": "raw/{field}"
                }
            }
        }),
    );
}

fn echo_registry() -> OperationRegistry {
    let mut registry = OperationRegistry::new();
    registry.register("test.read", |ctx: OpContext<'_>| {
        Ok(json!({
            "relative": ctx.relative,
            "params": ctx.params,
        }))
    });
    registry.register("test.write", |ctx: OpContext<'_>| {
        Ok(json!({ "source": ctx.params.get_str("source")? }))
    });
    registry
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_get_dispatches_to_read_rule() {
    let tmp = TempDir::new().unwrap();
    sample_archive(tmp.path());
    let archive = Archive::new(tmp.path(), echo_registry());

    let result = archive.get("data/1990/3/14/temp").unwrap();
    assert_eq!(result["relative"], json!("1990/3/14/temp"));
    assert_eq!(result["params"]["year"], json!(1990));
    assert_eq!(result["params"]["month"], json!(3));
    assert_eq!(result["params"]["day"], json!(14));
    assert_eq!(result["params"]["field"], json!("temp"));
}

#[test]
fn test_build_uses_its_own_rule_class() {
    let tmp = TempDir::new().unwrap();
    sample_archive(tmp.path());
    let archive = Archive::new(tmp.path(), echo_registry());

    let result = archive.build("data/1990/3/14/temp").unwrap();
    assert_eq!(result, json!({ "source": "raw/{field}" }));
}

#[test]
fn test_operation_receives_base_directory() {
    let tmp = TempDir::new().unwrap();
    sample_archive(tmp.path());

    let expected_base = tmp.path().join("data");
    let mut registry = OperationRegistry::new();
    let probe = expected_base.clone();
    registry.register("test.read", move |ctx: OpContext<'_>| {
        assert_eq!(ctx.base, probe);
        Ok(json!(null))
    });

    let archive = Archive::new(tmp.path(), registry);
    archive.get("data/1990/3/14/temp").unwrap();
}

#[test]
fn test_unrecognized_path_carries_original_path() {
    let tmp = TempDir::new().unwrap();
    sample_archive(tmp.path());
    let archive = Archive::new(tmp.path(), echo_registry());

    match archive.get("nowhere/at/all").unwrap_err() {
        DispatchError::UnrecognizedPath(p) => assert_eq!(p, "nowhere/at/all"),
        other => panic!("expected UnrecognizedPath, got {other:?}"),
    }
}

#[test]
fn test_unregistered_operation_fails_before_any_io() {
    let tmp = TempDir::new().unwrap();
    sample_archive(tmp.path());
    // Empty registry: resolution succeeds but the lookup must fail.
    let archive = Archive::new(tmp.path(), OperationRegistry::new());

    match archive.get("data/1990/3/14/temp").unwrap_err() {
        DispatchError::OperationNotFound(name) => assert_eq!(name, "test.read"),
        other => panic!("expected OperationNotFound, got {other:?}"),
    }
}

#[test]
fn test_operation_failure_propagates_unchanged() {
    let tmp = TempDir::new().unwrap();
    sample_archive(tmp.path());

    let mut registry = OperationRegistry::new();
    registry.register("test.read", |_: OpContext<'_>| {
        anyhow::bail!("domain failure: file corrupt")
    });
    let archive = Archive::new(tmp.path(), registry);

    let err = archive.get("data/1990/3/14/temp").unwrap_err();
    match err {
        DispatchError::Operation(e) => {
            assert!(e.to_string().contains("domain failure"));
        }
        other => panic!("expected Operation, got {other:?}"),
    }
}

#[test]
fn test_failed_dispatch_leaves_working_directory_untouched() {
    let tmp = TempDir::new().unwrap();
    sample_archive(tmp.path());

    let mut registry = OperationRegistry::new();
    registry.register("test.read", |_: OpContext<'_>| anyhow::bail!("boom"));
    let archive = Archive::new(tmp.path(), registry);

    let before = std::env::current_dir().unwrap();
    let _ = archive.get("data/1990/3/14/temp");
    assert_eq!(std::env::current_dir().unwrap(), before);

    // And the archive is still usable afterwards.
    let _ = archive.get("data/1990/3/14/temp");
    assert_eq!(std::env::current_dir().unwrap(), before);
}

// ============================================================================
// Hierarchy semantics
// ============================================================================

#[test]
fn test_ancestor_rule_covers_descendants_without_metadata() {
    let tmp = TempDir::new().unwrap();
    write_meta(
        tmp.path(),
        "raw",
        json!({
            "gets": { "field": { "path": "<field>", "operation": "test.read" } }
        }),
    );
    // Descendant directories carry no meta.json at all.
    fs::create_dir_all(tmp.path().join("raw/temp")).unwrap();

    let archive = Archive::new(tmp.path(), echo_registry());
    let result = archive.get("raw/temp").unwrap();
    assert_eq!(result["params"]["field"], json!("temp"));
}

#[test]
fn test_closer_directory_overrides_ancestor() {
    let tmp = TempDir::new().unwrap();
    // The walk visits `year` before `year/1990`; the shallow table matches
    // first, so overriding means declaring at the shallower level.
    write_meta(
        tmp.path(),
        "year",
        json!({
            "gets": {
                "special": { "path": "1990/<field>", "operation": "test.special" },
                "any": { "path": "<int:year>/<field>", "operation": "test.read" }
            }
        }),
    );

    let mut registry = echo_registry();
    registry.register("test.special", |_: OpContext<'_>| Ok(json!("special")));
    let archive = Archive::new(tmp.path(), registry);

    assert_eq!(archive.get("year/1990/temp").unwrap(), json!("special"));
    let result = archive.get("year/1991/temp").unwrap();
    assert_eq!(result["params"]["year"], json!(1991));
}

#[test]
fn test_merged_meta_along_path() {
    let tmp = TempDir::new().unwrap();
    write_meta(tmp.path(), "a", json!({ "delta": 0.75, "owner": "a" }));
    write_meta(tmp.path(), "a/b", json!({ "owner": "b" }));

    let archive = Archive::new(tmp.path(), OperationRegistry::new());
    let merged = archive.meta("a/b/c").unwrap();
    assert_eq!(merged.get("delta"), Some(&json!(0.75)));
    assert_eq!(merged.get("owner"), Some(&json!("b")));
}
