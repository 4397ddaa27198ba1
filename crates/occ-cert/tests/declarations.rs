use std::fs;

use occ_cert::{
    load_certificate, store_certificate, validate_declared, AuditContext, CertKind, Certificate,
    CertificateDeclaration, CertificateOutcome, CertificateSource, CertificateStatus,
};
use occ_core::{OccError, Verdict};
use serde_json::json;

fn io_body() -> serde_json::Value {
    json!({
        "cert_type": "IO-CERT",
        "cert_version": "1.0",
        "map_O_theta": "id",
        "theta_effective_list": [],
        "observables_list": [],
        "identifiability_metric": {"value": 0.9},
        "threshold_tau": 0.5,
        "degeneracies_list": [],
        "dataset_equivalence": "exact",
    })
}

#[test]
fn relative_paths_resolve_against_the_code_root() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("certs")).unwrap();
    fs::write(root.path().join("certs/io.json"), serde_json::to_vec(&io_body()).unwrap()).unwrap();

    let ctx = AuditContext::new(root.path(), json!({}));
    let decl = CertificateDeclaration::from_path(CertKind::Io, "certs/io.json");
    let outcome = validate_declared("IO", &decl, &ctx).unwrap();
    assert_eq!(outcome.verdict(), Some(&Verdict::tagged_pass("IO")));
}

#[test]
fn disabled_declarations_are_skipped_without_loading() {
    let root = tempfile::tempdir().unwrap();
    let ctx = AuditContext::new(root.path(), json!({}));
    let decl = CertificateDeclaration::from_path(CertKind::Pa, "certs/missing.json").disabled();
    let outcome = validate_declared("PA", &decl, &ctx).unwrap();
    assert_eq!(outcome.status, CertificateStatus::Skipped);
    assert_eq!(serde_json::to_value(&outcome).unwrap()["verdict"], "SKIP");
}

#[test]
fn missing_certificate_file_is_an_io_error() {
    let root = tempfile::tempdir().unwrap();
    let ctx = AuditContext::new(root.path(), json!({}));
    let decl = CertificateDeclaration::from_path(CertKind::Io, "certs/missing.json");
    let err = validate_declared("IO", &decl, &ctx).unwrap_err();
    assert!(matches!(err, OccError::Io(_)));
    assert!(err.info().context["path"].ends_with("missing.json"));
}

#[test]
fn kind_falls_back_to_the_entry_name() {
    let root = tempfile::tempdir().unwrap();
    let ctx = AuditContext::new(root.path(), json!({}));
    let decl: CertificateDeclaration = serde_json::from_value(json!({"certificate": io_body()})).unwrap();
    assert!(decl.enabled);
    assert!(matches!(decl.source, CertificateSource::Inline { .. }));
    let outcome = validate_declared("io", &decl, &ctx).unwrap();
    assert_eq!(outcome.verdict(), Some(&Verdict::tagged_pass("IO")));

    let err = validate_declared("identifiability", &decl, &ctx).unwrap_err();
    assert!(matches!(err, OccError::Config(_)));
}

#[test]
fn path_declarations_parse_from_json() {
    let decl: CertificateDeclaration =
        serde_json::from_value(json!({"enabled": false, "kind": "RFS", "path": "certs/rfs.json"})).unwrap();
    assert!(!decl.enabled);
    assert_eq!(decl.kind, Some(CertKind::Rfs));
    assert!(matches!(decl.source, CertificateSource::Path { .. }));
}

#[test]
fn stored_certificates_load_back_unchanged() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("io.json");
    let cert = Certificate::from_value(io_body()).unwrap();
    store_certificate(&path, &cert).unwrap();
    assert_eq!(load_certificate(&path).unwrap(), cert);

    fs::write(&path, "[1, 2]").unwrap();
    assert!(matches!(load_certificate(&path), Err(OccError::Schema(_))));
    fs::write(&path, "{not json").unwrap();
    assert!(matches!(load_certificate(&path), Err(OccError::Serde(_))));
}

#[test]
fn outcomes_use_the_report_wire_shape() {
    let outcome = CertificateOutcome::evaluated(Verdict::no_eval("PA3"), "dominated");
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value, json!({"verdict": "NO-EVAL(PA3)", "note": "dominated"}));
    let back: CertificateOutcome = serde_json::from_value(value).unwrap();
    assert_eq!(back, outcome);
}

fn pa_body() -> serde_json::Value {
    json!({
        "cert_type": "PA-CERT",
        "cert_version": "1.0",
        "projection_version": "p1",
        "Pi_signature": "Pi: full -> effective",
        "assumptions": [],
        "delta_proj_method": "bound",
        "delta_proj": {"delta": [0.01]},
        "kappa_rule": {"kappa": 2.0},
        "hashes": {"code": "AUTO", "data": "AUTO"},
        "seeds": [1],
        "run_log": {},
        "sigma_data": {"sigma": 0.05},
    })
}

#[test]
fn filled_certificates_ride_on_the_outcome() {
    let root = tempfile::tempdir().unwrap();
    let ctx = AuditContext::new(root.path(), json!({"input_hash": "abc"}));
    let decl = CertificateDeclaration::inline(CertKind::Pa, Certificate::from_value(pa_body()).unwrap());

    let outcome = validate_declared("PA", &decl, &ctx).unwrap();
    assert_eq!(outcome.verdict(), Some(&Verdict::tagged_pass("PA")));
    let filled = outcome.certificate.clone().unwrap();
    assert_eq!(filled.get("hashes").unwrap()["data"].as_str().unwrap(), ctx.expected_data().unwrap());
    assert!(serde_json::to_value(&outcome).unwrap()["certificate"]["hashes"]["code"]
        .as_str()
        .unwrap()
        .starts_with("sha256:"));

    // an already audited certificate comes back without a copy
    let again = validate_declared("PA", &CertificateDeclaration::inline(CertKind::Pa, filled), &ctx).unwrap();
    assert_eq!(again.verdict(), Some(&Verdict::tagged_pass("PA")));
    assert!(again.certificate.is_none());
}

#[test]
fn write_back_declarations_verify_on_the_next_run() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("pa.json");
    store_certificate(&path, &Certificate::from_value(pa_body()).unwrap()).unwrap();
    let decl = CertificateDeclaration::from_path(CertKind::Pa, "pa.json").writing_back();

    let first = AuditContext::new(root.path(), json!({"input_hash": "abc"}));
    let outcome = validate_declared("PA", &decl, &first).unwrap();
    assert_eq!(outcome.verdict(), Some(&Verdict::tagged_pass("PA")));
    let on_disk = load_certificate(&path).unwrap();
    assert_eq!(Some(&on_disk), outcome.certificate.as_ref());
    assert_ne!(on_disk.get("hashes").unwrap()["code"], "AUTO");

    let changed = AuditContext::new(root.path(), json!({"input_hash": "def"}));
    let outcome = validate_declared("PA", &decl, &changed).unwrap();
    assert_eq!(outcome.verdict(), Some(&Verdict::no_eval("PA5")));
    assert!(outcome.note.starts_with("Hash audit failed: hashes.data mismatch"));
    assert!(outcome.certificate.is_none());
}

#[test]
fn plain_path_declarations_leave_the_file_alone() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("pa.json");
    let original = Certificate::from_value(pa_body()).unwrap();
    store_certificate(&path, &original).unwrap();

    let ctx = AuditContext::new(root.path(), json!({"input_hash": "abc"}));
    let decl = CertificateDeclaration::from_path(CertKind::Pa, "pa.json");
    assert!(validate_declared("PA", &decl, &ctx).unwrap().certificate.is_some());
    assert_eq!(load_certificate(&path).unwrap(), original);
    assert!(serde_json::to_value(&decl).unwrap().get("write_back").is_none());
}
