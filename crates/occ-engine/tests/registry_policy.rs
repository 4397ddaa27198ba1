mod common;

use occ_core::OccError;
use occ_audit::EnvFingerprint;
use occ_engine::{AuditSettings, EnginePolicy, ModuleRegistry, NumericsLayout, StabilityPolicy};

use common::ToyModule;

#[test]
fn duplicate_module_names_are_rejected() {
    let err = ModuleRegistry::builder()
        .register(ToyModule::default())
        .register(ToyModule::default())
        .build()
        .unwrap_err();
    assert!(matches!(err, OccError::Module(_)));
    assert_eq!(err.info().code, "module-duplicate");
    assert!(err.info().message.contains("toy"));
}

#[test]
fn lookups_report_the_known_modules() {
    let registry = ModuleRegistry::builder().register(ToyModule::default()).build().unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.names(), vec!["toy".to_string()]);
    assert_eq!(registry.get("toy").unwrap().name(), "toy");
    let err = registry.get("other").err().unwrap();
    assert_eq!(err.info().context["known"], "toy");
}

#[test]
fn empty_policy_document_takes_the_defaults() -> Result<(), OccError> {
    let policy = EnginePolicy::from_yaml_slice(b"{}")?;
    assert_eq!(policy, EnginePolicy::default());
    let stability = &policy.stability;
    assert!(stability.enabled);
    assert_eq!(stability.work_cap, 5.0e7);
    assert_eq!(stability.min_samples, 10);
    assert_eq!(stability.tolerance_factors, vec![0.1, 1.0, 10.0]);
    assert!(stability.require_refinement);
    assert!(!stability.always_record);
    assert_eq!(stability.layout.tolerances, vec!["/numerics/tolerances/eps_psd".to_string()]);
    Ok(())
}

#[test]
fn partial_policy_overrides_only_named_fields() -> Result<(), OccError> {
    let yaml = b"stability:\n  work_cap: 1000.0\n  layout:\n    grid_samples: [/grid/n]\n";
    let policy = EnginePolicy::from_yaml_slice(yaml)?;
    assert_eq!(policy.stability.work_cap, 1000.0);
    assert_eq!(policy.stability.min_samples, 10);
    assert_eq!(policy.stability.layout.grid_samples, vec!["/grid/n".to_string()]);
    assert_eq!(policy.stability.layout.refinements, NumericsLayout::default().refinements);

    let rendered = policy.to_yaml_string()?;
    assert_eq!(EnginePolicy::from_yaml_slice(rendered.as_bytes())?, policy);
    Ok(())
}

#[test]
fn unknown_policy_types_are_serde_errors() {
    let err = EnginePolicy::from_yaml_slice(b"stability:\n  work_cap: lots\n").unwrap_err();
    assert!(matches!(err, OccError::Serde(_)));
    assert!(!StabilityPolicy::disabled().enabled);
}

#[test]
fn detected_audit_settings_read_the_host() {
    let root = tempfile::tempdir().unwrap();
    let audit = AuditSettings::detected(root.path());
    assert_eq!(audit.code_root, root.path());
    assert!(audit.include_globs.is_empty());
    assert_eq!(audit.env, EnvFingerprint::detect());
    assert_eq!(AuditSettings::new(root.path()).env, EnvFingerprint::minimal());
}
