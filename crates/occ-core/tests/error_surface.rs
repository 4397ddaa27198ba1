use occ_core::errors::{ErrorInfo, OccError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("path", "src/lib.rs")
        .with_context("reason", "example")
}

#[test]
fn io_error_surface() {
    let err = OccError::Io(sample_info("IO001", "file vanished"));
    assert_eq!(err.info().code, "IO001");
    assert!(err.info().context.contains_key("path"));
}

#[test]
fn module_error_surface() {
    let err = OccError::Module(sample_info("M001", "unknown module"));
    assert_eq!(err.info().code, "M001");
    assert!(err.info().context.contains_key("reason"));
}

#[test]
fn display_includes_context_and_hint() {
    let err = OccError::Config(ErrorInfo::new("glob", "bad pattern").with_hint("escape the brace"));
    let text = err.to_string();
    assert!(text.starts_with("config error: bad pattern (code: glob)"));
    assert!(text.ends_with("hint: escape the brace"));
}

#[test]
fn io_helper_records_path() {
    let raw = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err = OccError::io("hash-file-open", std::path::Path::new("/tmp/absent"), raw);
    assert_eq!(err.info().code, "hash-file-open");
    assert_eq!(err.info().context.get("path").map(String::as_str), Some("/tmp/absent"));
    assert_eq!(err.info().context.get("kind").map(String::as_str), Some("NotFound"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = OccError::Hash(ErrorInfo::new("H1", "digest"));
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["family"], "Hash");
    assert_eq!(json["detail"]["code"], "H1");
}
