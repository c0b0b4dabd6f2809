use crate::bridge::emitter::{Emitter, Handler};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

fn recording(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> Handler {
    let log = Arc::clone(log);
    let tag = tag.to_string();
    Arc::new(move |value: &Value| {
        log.lock()
            .expect("log lock")
            .push(format!("{tag}:{value}"));
    })
}

/// **VALUE**: Verifies handlers for a key run in attach order with the emitted value.
#[test]
fn given_two_handlers_when_emitting_then_both_run_in_order() {
    // GIVEN: Two handlers on the same key
    let emitter: Emitter<String> = Emitter::default();
    let log = Arc::new(Mutex::new(Vec::new()));
    emitter.on("draw".to_string(), recording(&log, "first"));
    emitter.on("draw".to_string(), recording(&log, "second"));

    // WHEN: Emitting
    let ran = emitter.emit("draw", &json!(1));

    // THEN: Both ran, in order
    assert_eq!(ran, 2);
    assert_eq!(
        *log.lock().expect("log lock"),
        vec!["first:1".to_string(), "second:1".to_string()]
    );
}

#[test]
fn given_no_handlers_when_emitting_then_reports_zero() {
    let emitter: Emitter<String> = Emitter::default();

    assert_eq!(emitter.emit("nobody", &Value::Null), 0);
}

#[test]
fn given_detached_handler_when_emitting_then_it_does_not_run() {
    // GIVEN: A handler attached then detached
    let emitter: Emitter<String> = Emitter::default();
    let log = Arc::new(Mutex::new(Vec::new()));
    let id = emitter.on("draw".to_string(), recording(&log, "gone"));

    // WHEN: Detaching twice and emitting
    let first = emitter.off("draw", id);
    let second = emitter.off("draw", id);
    emitter.emit("draw", &json!(1));

    // THEN: Only the first detach succeeds and nothing runs
    assert!(first);
    assert!(!second);
    assert!(log.lock().expect("log lock").is_empty());
    assert_eq!(emitter.listener_count("draw"), 0);
}

/// **VALUE**: Verifies a handler can clear the emitter it is being called from.
///
/// **BUG THIS CATCHES**: Would catch a deadlock if `emit` held its lock while
/// calling handlers (teardown from inside a listener clears the same emitter).
#[test]
fn given_handler_that_clears_emitter_when_emitting_then_does_not_deadlock() {
    // GIVEN: A handler that clears its own emitter
    let emitter = Arc::new(Emitter::<String>::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let inner_emitter = Arc::clone(&emitter);
    let inner_calls = Arc::clone(&calls);
    emitter.on(
        "stop".to_string(),
        Arc::new(move |_: &Value| {
            inner_calls.fetch_add(1, Ordering::SeqCst);
            inner_emitter.clear();
        }),
    );

    // WHEN: Emitting twice
    emitter.emit("stop", &Value::Null);
    emitter.emit("stop", &Value::Null);

    // THEN: Ran once, then the list was empty
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(emitter.listener_count("stop"), 0);
}

/// **VALUE**: Verifies one failing handler does not starve the others.
///
/// **BUG THIS CATCHES**: Would catch a panic escaping `emit` and skipping
/// every handler attached after it.
#[test]
fn given_panicking_handler_when_emitting_then_later_handlers_still_run() {
    // GIVEN: A panicking handler ahead of a recording one
    let emitter: Emitter<String> = Emitter::default();
    let log = Arc::new(Mutex::new(Vec::new()));
    emitter.on("draw".to_string(), Arc::new(|_: &Value| panic!("handler failed")));
    emitter.on("draw".to_string(), recording(&log, "after"));

    // WHEN: Emitting
    let ran = emitter.emit("draw", &json!(7));

    // THEN: Both were called and the second one recorded
    assert_eq!(ran, 2);
    assert_eq!(*log.lock().expect("log lock"), vec!["after:7".to_string()]);
}
