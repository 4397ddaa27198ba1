use occ_core::{Reason, StabilityReason, Verdict, VerdictClass};

#[test]
fn verdict_strings_parse_into_classes() {
    assert_eq!("PASS".parse::<Verdict>().unwrap(), Verdict::pass());
    assert_eq!("PASS(PA)".parse::<Verdict>().unwrap(), Verdict::tagged_pass("PA"));
    assert_eq!("FAIL(L2)".parse::<Verdict>().unwrap(), Verdict::fail("L2"));
    assert_eq!("NO-EVAL(PA3)".parse::<Verdict>().unwrap(), Verdict::no_eval("PA3"));
    assert_eq!(" no-eval ( IO1 ) ".parse::<Verdict>().unwrap(), Verdict::no_eval("IO1"));
    assert!("SKIPPED(work_cap)".parse::<Verdict>().is_err());
    assert!("FAIL(L2".parse::<Verdict>().is_err());
}

#[test]
fn verdict_display_matches_wire_form() {
    assert_eq!(Verdict::pass().to_string(), "PASS");
    assert_eq!(Verdict::tagged_pass("IO").to_string(), "PASS(IO)");
    assert_eq!(Verdict::fail("L2").to_string(), "FAIL(L2)");
    assert_eq!(Verdict::no_eval("").to_string(), "NO-EVAL");
}

#[test]
fn classes_order_by_dominance() {
    assert!(VerdictClass::NoEval > VerdictClass::Fail);
    assert!(VerdictClass::Fail > VerdictClass::Pass);
    assert!(Verdict::fail("X").same_class(&Verdict::fail("Y")));
    assert!(!Verdict::fail("X").same_class(&Verdict::no_eval("X")));
}

#[test]
fn verdict_serializes_as_string() {
    let json = serde_json::to_string(&Verdict::no_eval("RFS2")).unwrap();
    assert_eq!(json, "\"NO-EVAL(RFS2)\"");
    let back: Verdict = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Verdict::no_eval("RFS2"));
}

#[test]
fn reasons_keep_wire_strings_and_namespaces() {
    let cert = Reason::Certificate("PA".into());
    assert_eq!(cert.wire(), "CERTS_PA");
    assert_eq!(cert.qualified(), "cert:PA");

    let lock = Reason::Lock("PA3".into());
    assert_eq!(lock.wire(), "PA3");
    assert_eq!(lock.qualified(), "lock:PA3");
    assert_ne!(cert.qualified(), lock.qualified());

    let sweep = Reason::Stability(StabilityReason::InsufficientCoverage);
    assert_eq!(sweep.wire(), "insufficient_PCN_or_PCD_coverage");
    assert_eq!(Reason::from_wire("unstable_under_PCN_or_PCD"), Reason::Stability(StabilityReason::Unstable));
    assert_eq!(Reason::from_wire("CERTS_IO"), Reason::Certificate("IO".into()));
    assert_eq!(Reason::from_wire(""), Reason::None);
}
