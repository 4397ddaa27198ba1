use occ_audit::{fill_or_verify, HashSlot};

#[test]
fn sentinels_request_auto_fill() {
    assert!(HashSlot::parse("").is_auto());
    assert!(HashSlot::parse("AUTO").is_auto());
    assert!(HashSlot::parse("auto").is_auto());
    assert!(HashSlot::parse("sha256:...").is_auto());
    assert!(!HashSlot::parse("sha256:abc").is_auto());
    assert!(HashSlot::parse("sha256:abc").is_prefixed());
}

#[test]
fn auto_fill_then_verify_is_a_noop() {
    let filled = fill_or_verify("hashes.code", &HashSlot::Auto, "sha256:aa").unwrap();
    assert_eq!(filled, HashSlot::Digest("sha256:aa".into()));
    let again = fill_or_verify("hashes.code", &filled, "sha256:aa").unwrap();
    assert_eq!(again, filled);
}

#[test]
fn mismatch_reports_both_digests() {
    let stored = HashSlot::Digest("sha256:aa".into());
    let err = fill_or_verify("hashes.data", &stored, "sha256:bb").unwrap_err();
    assert_eq!(err.slot, "hashes.data");
    assert_eq!(err.to_string(), "hashes.data mismatch: cert has sha256:aa, expected sha256:bb");
}

#[test]
fn slots_roundtrip_through_json() {
    let slot: HashSlot = serde_json::from_str("null").unwrap();
    assert!(slot.is_auto());
    let json = serde_json::to_string(&HashSlot::Digest("sha256:ff".into())).unwrap();
    assert_eq!(json, "\"sha256:ff\"");
}
