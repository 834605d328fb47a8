//! Integration test: handled-error tracking and event publication across a
//! tree of child loggers, including concurrent use from several threads.

use std::io;
use std::sync::Arc;
use std::thread;

use gsv_logger::{
    EventRecord, HandledError, IntegrationLogger, LogInput, LoggerConfig, MemoryEventSink, StepInfo,
};
use proptest::prelude::*;
use serde_json::{json, Map};

fn root() -> (IntegrationLogger, Arc<MemoryEventSink>) {
    let sink = Arc::new(MemoryEventSink::new());
    (IntegrationLogger::new(LoggerConfig::default(), sink.clone()), sink)
}

fn error(msg: &str) -> HandledError {
    HandledError::new(io::Error::new(io::ErrorKind::Other, msg.to_string()))
}

fn bound(key: &str, value: i64) -> Map<String, serde_json::Value> {
    let mut fields = Map::new();
    fields.insert(key.to_string(), json!(value));
    fields
}

#[test]
fn test_errors_logged_on_worker_threads_are_handled_at_root() {
    let (root, sink) = root();
    let errors: Vec<HandledError> = (0..4).map(|i| error(&format!("worker {i}"))).collect();

    let handles: Vec<_> = errors
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, err)| {
            let child = root.child(bound("worker", i as i64));
            thread::spawn(move || {
                let step = StepInfo::new(format!("step-{i}"), format!("Step {i}"));
                child.step_start(&step);
                child.step_failure(&step, &err);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for err in &errors {
        assert!(root.is_handled_error(err), "{err} not handled at root");
    }
    let failures = sink
        .records()
        .into_iter()
        .filter(|r| matches!(r, EventRecord::Error(_)))
        .count();
    assert_eq!(failures, 4);
    assert_eq!(sink.event_names().len(), 4);
}

#[test]
fn test_unrelated_root_does_not_see_handled_errors() {
    let (a, _) = root();
    let (b, _) = root();
    let err = error("isolated");
    a.child(Map::new()).error(LogInput::error(err.clone(), "failed"));
    assert!(a.is_handled_error(&err));
    assert!(!b.is_handled_error(&err));
}

proptest! {
    #[test]
    fn prop_handled_at_any_depth(depth in 0usize..8) {
        let (root, _) = root();
        let mut logger = root.clone();
        for level in 0..depth {
            logger = logger.child(bound("depth", level as i64));
        }
        let err = error("deep");
        logger.error(&err);
        prop_assert!(root.is_handled_error(&err));
    }
}
