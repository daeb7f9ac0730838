use super::*;
use std::panic::catch_unwind;

#[test]
fn test_from_payload_recovers_signal() {
    let payload: Box<dyn Any + Send> = Box::new(ControlSignal::Fail("boom".into()));
    assert_eq!(
        ControlSignal::from_payload(payload).ok(),
        Some(ControlSignal::Fail("boom".into()))
    );
}

#[test]
fn test_from_payload_returns_non_signal() {
    let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
    let Err(payload) = ControlSignal::from_payload(payload) else {
        panic!("a &str payload is not a signal");
    };
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"index out of bounds"));
}

#[test]
fn test_display() {
    assert_eq!(ControlSignal::Fail("x != y".into()).to_string(), "fail: x != y");
    assert_eq!(ControlSignal::Skip.to_string(), "skip");
    assert_eq!(ControlSignal::Pass.to_string(), "pass");
}

#[test]
fn test_raise_outside_running_test_is_a_plain_panic() {
    let payload = catch_unwind(|| {
        skip();
    })
    .expect_err("skip must not return");
    assert!(payload.downcast_ref::<ControlSignal>().is_none());
    let message = crate::fault::payload_message(&*payload);
    assert!(message.contains("outside a running test"), "{message}");
}
