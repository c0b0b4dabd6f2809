use crate::BridgeError;
use crate::bridge::registry::ListenerRegistry;

/// **VALUE**: Verifies the reference count only reports the first acquire and
/// the last release, which is when the host must hear about it.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - every acquire reported "first" (duplicate `RegisterMagixEvent`)
/// - an intermediate release reported "last" (premature `RemoveMagixEvent`)
/// - the entry lingered at zero
#[test]
fn given_two_acquires_when_releasing_then_only_last_release_reports() {
    // GIVEN: Two listeners for the same name
    let mut registry = ListenerRegistry::new();
    let first = registry.acquire("nextPage");
    let second = registry.acquire("nextPage");

    // WHEN: Releasing both
    let after_one = registry.release("nextPage").expect("registered");
    let after_two = registry.release("nextPage").expect("still registered");

    // THEN: Edges reported once each, entry gone
    assert!(first);
    assert!(!second);
    assert!(!after_one);
    assert!(after_two);
    assert!(!registry.contains("nextPage"));
    assert_eq!(registry.count("nextPage"), 0);
}

#[test]
fn given_unknown_name_when_releasing_then_returns_unregistered_listener() {
    // GIVEN: Empty registry
    let mut registry = ListenerRegistry::new();

    // WHEN: Releasing a name never acquired
    let result = registry.release("ghost");

    // THEN: Error, and nothing changed
    match result {
        Err(BridgeError::UnregisteredListener { message, .. }) => {
            assert!(message.contains("ghost"))
        }
        other => panic!("Expected UnregisteredListener, got {other:?}"),
    }
    assert!(registry.is_empty());
}

#[test]
fn given_names_when_clearing_then_registry_is_empty() {
    let mut registry = ListenerRegistry::new();
    registry.acquire("a");
    registry.acquire("b");
    registry.acquire("b");

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.count("b"), 2);

    registry.clear();

    assert!(registry.is_empty());
}
