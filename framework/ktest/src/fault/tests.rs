use super::*;

#[test]
fn test_classify() {
    assert_eq!(classify(false, Phase::Test), FaultDisposition::Chain);
    assert_eq!(classify(false, Phase::Framework), FaultDisposition::Chain);
    assert_eq!(classify(true, Phase::Setup), FaultDisposition::Recover);
    assert_eq!(classify(true, Phase::Test), FaultDisposition::Recover);
    assert_eq!(classify(true, Phase::Teardown), FaultDisposition::Recover);
    assert_eq!(classify(true, Phase::Framework), FaultDisposition::Crash);
}

#[test]
fn test_armed_guard_nests() {
    assert!(!is_armed());
    {
        let _outer = ArmedGuard::arm();
        {
            let _inner = ArmedGuard::arm();
            assert!(is_armed());
        }
        assert!(is_armed());
    }
    assert!(!is_armed());
}

#[test]
fn test_payload_message() {
    let literal: Box<dyn Any + Send> = Box::new("literal");
    let formatted: Box<dyn Any + Send> = Box::new(String::from("formatted 7"));
    let other: Box<dyn Any + Send> = Box::new(7u32);

    assert_eq!(payload_message(&*literal), "literal");
    assert_eq!(payload_message(&*formatted), "formatted 7");
    assert_eq!(payload_message(&*other), "non-string panic payload");
}

#[test]
fn test_fault_display() {
    let fault = Fault {
        phase: Phase::Test,
        message: "index out of bounds".into(),
        location: Some("src/lib.rs:10".into()),
    };
    assert_eq!(
        fault.to_string(),
        "index out of bounds at unit test function (src/lib.rs:10)"
    );

    let fault = Fault {
        location: None,
        phase: Phase::Setup,
        ..fault
    };
    assert_eq!(fault.to_string(), "index out of bounds at setup function");
}

#[test]
fn test_fault_from_payload_without_recorded_fault() {
    clear_fault();
    let payload: Box<dyn Any + Send> = Box::new("no hook saw this");
    let fault = fault_from_payload(&*payload, Phase::Teardown);
    assert_eq!(fault.phase, Phase::Teardown);
    assert_eq!(fault.message, "no hook saw this");
    assert_eq!(fault.location, None);
}
