use crate::{ABSENT, Attributes, ModelError, Patch, apply_patch};

use serde_json::{Value, json};

fn attributes(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        other => panic!("test fixture must be an object, got {other}"),
    }
}

/// **VALUE**: Verifies the non-destructive patch law: the absent marker deletes,
/// other values overwrite, and keys the patch does not mention are untouched.
///
/// **WHY THIS MATTERS**: Both mirrors (attributes and room state) are reconciled with this
/// rule. Treating a patch as a replacement would wipe host state on every update.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `null` was stored instead of removing the key
/// - the target was cleared before applying
/// - unmentioned keys were dropped
#[test]
fn given_patch_with_absent_marker_when_applied_then_deletes_only_marked_keys() {
    // GIVEN: A mirror and a patch that deletes one key and overwrites another
    let mut target = attributes(json!({"keep": 1, "drop": 2, "change": 3}));
    let patch = attributes(json!({"drop": null, "change": 30, "add": 4}));

    // WHEN: Applying
    apply_patch(&mut target, &patch);

    // THEN: Only mentioned keys moved
    assert_eq!(
        Value::Object(target),
        json!({"keep": 1, "change": 30, "add": 4})
    );
}

#[test]
fn given_absent_marker_for_missing_key_when_applied_then_is_noop() {
    let mut target = attributes(json!({"a": 1}));

    apply_patch(&mut target, &attributes(json!({"ghost": null})));

    assert_eq!(Value::Object(target), json!({"a": 1}));
}

#[test]
fn given_nested_object_when_applied_then_replaces_whole_value() {
    // Patches are shallow: a nested object replaces, it does not merge.
    let mut target = attributes(json!({"sceneState": {"index": 1, "scenes": [1, 2]}}));

    apply_patch(&mut target, &attributes(json!({"sceneState": {"index": 2}})));

    assert_eq!(Value::Object(target), json!({"sceneState": {"index": 2}}));
}

/// **VALUE**: Verifies the builder encodes removals with the absent marker so the host
/// sees the same convention the bridge applies to inbound updates.
#[test]
fn given_patch_builder_when_removing_key_then_encodes_absent_marker() {
    // GIVEN/WHEN: Building a patch with a set and a removal
    let patch = Patch::new().set("color", "red").remove("stale");

    // THEN: The removal is a null entry
    assert_eq!(patch.entries().get("stale"), Some(&ABSENT));
    assert_eq!(patch.into_value(), json!({"color": "red", "stale": null}));
}

#[test]
fn given_patch_when_applied_to_mirror_then_follows_same_rule() {
    let mut target = attributes(json!({"stale": true, "other": 1}));

    Patch::new().remove("stale").set("fresh", 2).apply_to(&mut target);

    assert_eq!(Value::Object(target), json!({"other": 1, "fresh": 2}));
}

#[test]
fn given_non_object_value_when_converted_to_patch_then_returns_validation_error() {
    let result = Patch::try_from(json!([1, 2]));

    assert!(matches!(result, Err(ModelError::Validation { .. })));
}

#[test]
fn given_empty_patch_then_reports_empty() {
    let patch = Patch::new();

    assert!(patch.is_empty());
    assert_eq!(patch.len(), 0);
}
