use occ_audit::{fill_or_verify, now_utc_iso, HashSlot};
use occ_core::errors::OccError;
use occ_core::Verdict;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::certificate::{Certificate, IoCertificate, PaCertificate, RfsCertificate};
use crate::context::AuditContext;
use crate::kind::CertKind;
use crate::outcome::{CertificateOutcome, Validation};

fn no_eval(kind: CertKind, rule: u8, note: impl Into<String>) -> CertificateOutcome {
    CertificateOutcome::evaluated(Verdict::no_eval(kind.code(rule).to_string()), note)
}

fn passed(kind: CertKind, note: impl Into<String>) -> CertificateOutcome {
    CertificateOutcome::evaluated(Verdict::tagged_pass(kind.as_str()), note)
}

/// Validates `cert` as a `kind` certificate.
///
/// Never mutates the input. The returned [`Validation`] holds the certificate
/// with every auto-fill slot resolved; store it to make later audits verify
/// instead of fill. Only I/O failures while recomputing the code tree hash are
/// reported as `Err`; every other problem is a `NO-EVAL` outcome.
pub fn validate(cert: &Certificate, kind: CertKind, ctx: &AuditContext) -> Result<Validation, OccError> {
    let mut certificate = cert.clone();
    let outcome = run_checks(&mut certificate, kind, ctx)?;
    debug!(kind = %kind, verdict = %outcome.status, "certificate validated");
    Ok(Validation {
        outcome,
        certificate,
    })
}

/// [`validate`], writing the resolved certificate back over `cert`.
pub fn validate_in_place(
    cert: &mut Certificate,
    kind: CertKind,
    ctx: &AuditContext,
) -> Result<CertificateOutcome, OccError> {
    let Validation {
        outcome,
        certificate,
    } = validate(cert, kind, ctx)?;
    *cert = certificate;
    Ok(outcome)
}

fn run_checks(cert: &mut Certificate, kind: CertKind, ctx: &AuditContext) -> Result<CertificateOutcome, OccError> {
    let missing = cert.missing_fields(kind);
    if !missing.is_empty() {
        return Ok(no_eval(
            kind,
            1,
            format!("Missing required fields: {}", missing.join(", ")),
        ));
    }
    if cert.cert_type() != Some(kind.type_tag()) && cert.cert_type() != Some(kind.as_str()) {
        return Ok(no_eval(kind, 1, format!("cert_type must be {}", kind.type_tag())));
    }

    if kind == CertKind::Pa {
        stamp_run_log(cert);
    }

    if let Some((container, slots)) = kind.audit_slots() {
        if let Err(detail) = audit_hashes(cert, container, slots, ctx)? {
            warn!(kind = %kind, detail = %detail, "certificate hash audit failed");
            return Ok(no_eval(kind, 5, format!("Hash audit failed: {detail}")));
        }
    }

    Ok(match kind {
        CertKind::Pa => check_pa(&cert.to_record::<PaCertificate>()?),
        CertKind::Io => check_io(&cert.to_record::<IoCertificate>()?),
        CertKind::Rfs => check_rfs(&cert.to_record::<RfsCertificate>()?),
    })
}

fn stamp_run_log(cert: &mut Certificate) {
    let fields = cert.fields_mut();
    match fields.get_mut("run_log") {
        Some(Value::Object(log)) => {
            log.entry("validated_at_utc")
                .or_insert_with(|| Value::String(now_utc_iso()));
        }
        Some(slot) if slot.is_null() => {
            let mut log = Map::new();
            log.insert("validated_at_utc".into(), Value::String(now_utc_iso()));
            *slot = Value::Object(log);
        }
        _ => {}
    }
}

/// Outer `Err` is a fault; inner `Err` is an audit failure for the note.
fn audit_hashes(
    cert: &mut Certificate,
    container: &str,
    slots: &[&str],
    ctx: &AuditContext,
) -> Result<Result<(), String>, OccError> {
    let Some(Value::Object(current)) = cert.get(container) else {
        return Ok(Err(format!("{container} must be an object")));
    };
    let mut resolved = current.clone();
    for slot in slots {
        let name = format!("{container}.{slot}");
        let stored = match resolved.get(*slot) {
            None | Some(Value::Null) => HashSlot::Auto,
            Some(Value::String(raw)) => HashSlot::parse(raw),
            Some(_) => return Ok(Err(format!("{name} must be a string"))),
        };
        let expected = ctx.expected(slot)?;
        match fill_or_verify(&name, &stored, &expected) {
            Ok(filled) => {
                resolved.insert((*slot).to_string(), Value::String(filled.as_str().to_string()));
            }
            Err(mismatch) => return Ok(Err(mismatch.to_string())),
        }
    }
    cert.fields_mut().insert(container.to_string(), Value::Object(resolved));
    Ok(Ok(()))
}

fn check_pa(cert: &PaCertificate) -> CertificateOutcome {
    match cert.dominance() {
        Err(detail) => no_eval(
            CertKind::Pa,
            2,
            format!("Projection error bound not usable: {detail}"),
        ),
        Ok(dominance) if dominance.dominated() => no_eval(
            CertKind::Pa,
            3,
            format!(
                "Projection error dominates data uncertainty: max delta {} >= kappa*sigma {}",
                dominance.max_delta,
                dominance.kappa * dominance.sigma
            ),
        ),
        Ok(_) => passed(CertKind::Pa, "PA certificate checks passed (incl. PA5)"),
    }
}

fn check_io(cert: &IoCertificate) -> CertificateOutcome {
    match cert.identifiability() {
        Err(detail) => no_eval(
            CertKind::Io,
            1,
            format!("Identifiability metric not usable: {detail}"),
        ),
        Ok((value, tau)) if value < tau => no_eval(
            CertKind::Io,
            3,
            format!("Identifiability metric below threshold: {value} < {tau}"),
        ),
        Ok(_) => passed(CertKind::Io, "IO certificate checks passed"),
    }
}

fn check_rfs(cert: &RfsCertificate) -> CertificateOutcome {
    let (pcn, pcd) = match cert.sweeps() {
        Ok(flags) => flags,
        Err(detail) => return no_eval(CertKind::Rfs, 1, format!("Sweep block not usable: {detail}")),
    };
    if pcn.flipped() {
        return no_eval(CertKind::Rfs, 2, "Verdict flips under PCN sweep");
    }
    if pcd.flipped() {
        return no_eval(CertKind::Rfs, 3, "Verdict flips under PCD sweep");
    }
    passed(CertKind::Rfs, "RFS certificate checks passed (incl. RFS5)")
}
