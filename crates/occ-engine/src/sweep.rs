//! PCN (grid refinement) and PCD (tolerance) stability sweeps.
//!
//! Both sweeps re-run the full evaluation on perturbed copies of the
//! configuration and compare verdict classes. Work is estimated before each
//! run; over-cap runs are recorded as skipped and never executed.

use std::fmt;

use occ_cert::SweepFlags;
use occ_core::{OccError, Reason, StabilityReason, Verdict};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::combine::Combined;
use crate::policy::{NumericsLayout, StabilityPolicy};

/// Which perturbation a sweep applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SweepKind {
    /// Grid refinement.
    Pcn,
    /// Numeric tolerance scaling.
    Pcd,
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SweepKind::Pcn => "PCN",
            SweepKind::Pcd => "PCD",
        })
    }
}

/// Perturbation applied to one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepPoint {
    /// Grid sample multiplier.
    Refinement(f64),
    /// Tolerance multiplier.
    Factor(f64),
}

impl SweepPoint {
    /// The multiplier.
    pub fn value(&self) -> f64 {
        match self {
            SweepPoint::Refinement(value) | SweepPoint::Factor(value) => *value,
        }
    }

    fn is_baseline(&self) -> bool {
        self.value() == 1.0
    }
}

/// Why a run was not executed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    /// Estimated work above the cap.
    #[error("work_cap_exceeded ({work:.2e} > {cap:.2e})")]
    WorkCapExceeded {
        /// Estimated work of the run.
        work: f64,
        /// Cap in force.
        cap: f64,
    },
    /// A grid sample pointer did not resolve to an integer.
    #[error("grid_unavailable")]
    GridUnavailable,
    /// No tolerance pointer resolved to a number.
    #[error("tolerance_unavailable")]
    ToleranceUnavailable,
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An executed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRun {
    /// Applied perturbation.
    #[serde(flatten)]
    pub point: SweepPoint,
    /// Verdict of the nested evaluation.
    pub verdict: Verdict,
}

/// A run that was planned but not executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRun {
    /// Planned perturbation.
    #[serde(flatten)]
    pub point: SweepPoint,
    /// Reason it was skipped.
    pub reason: SkipReason,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    /// Sweep family.
    pub kind: SweepKind,
    /// Stable with full coverage.
    pub pass: bool,
    /// Some executed run changed verdict class.
    pub flip: bool,
    /// Executed runs in order.
    pub runs: Vec<SweepRun>,
    /// Runs skipped before execution.
    pub skipped: Vec<SkippedRun>,
    /// Configuration problems found while planning the runs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Cap the runs were checked against.
    pub work_cap: f64,
}

impl SweepResult {
    /// `{enabled, flips}` block for an RFS certificate.
    pub fn summary(&self) -> SweepFlags {
        SweepFlags {
            enabled: true,
            flips: self.flip,
        }
    }
}

/// PCN and PCD results of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stability {
    /// Grid refinement sweep.
    pub pcn: SweepResult,
    /// Tolerance sweep.
    pub pcd: SweepResult,
}

impl Stability {
    /// Either sweep flipped.
    pub fn flipped(&self) -> bool {
        self.pcn.flip || self.pcd.flip
    }

    /// Both sweeps passed.
    pub fn passed(&self) -> bool {
        self.pcn.pass && self.pcd.pass
    }
}

fn flipped_against(runs: &[SweepRun], reference: Option<&Verdict>) -> bool {
    match reference {
        Some(reference) => runs.iter().any(|run| !run.verdict.same_class(reference)),
        None => false,
    }
}

#[derive(Default)]
struct Collected {
    runs: Vec<SweepRun>,
    skipped: Vec<SkippedRun>,
}

impl Collected {
    fn skip(&mut self, kind: SweepKind, point: SweepPoint, reason: SkipReason) {
        warn!(sweep = %kind, point = point.value(), reason = %reason, "sweep run skipped");
        self.skipped.push(SkippedRun { point, reason });
    }

    /// Executes one planned run unless it is over the work cap.
    fn execute<E, R>(
        &mut self,
        kind: SweepKind,
        point: SweepPoint,
        config: Value,
        cap: f64,
        estimate: &E,
        run: &mut R,
    ) -> Result<(), OccError>
    where
        E: Fn(&Value) -> Option<f64>,
        R: FnMut(&Value) -> Result<Verdict, OccError>,
    {
        if let Some(work) = estimate(&config) {
            if work > cap {
                self.skip(kind, point, SkipReason::WorkCapExceeded { work, cap });
                return Ok(());
            }
        }
        let verdict = run(&config)?;
        debug!(sweep = %kind, point = point.value(), verdict = %verdict, "sweep run finished");
        self.runs.push(SweepRun { point, verdict });
        Ok(())
    }
}

/// Refinements to run, plus notes on configured entries that were ignored.
fn refinement_plan(config: &Value, layout: &NumericsLayout, defaults: &[f64]) -> (Vec<f64>, Vec<String>) {
    let pointer = &layout.refinements;
    let mut notes = Vec::new();
    let mut list = match config.pointer(pointer) {
        None | Some(Value::Null) => defaults.to_vec(),
        Some(Value::Array(items)) => {
            let mut list = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                match occ_cert::numeric(item) {
                    Some(r) if r.is_finite() && r > 0.0 => list.push(r),
                    _ => notes.push(format!("refinement {pointer}/{idx} ignored: {item} is not a positive number")),
                }
            }
            list
        }
        Some(other) => {
            notes.push(format!("refinements at {pointer} ignored: expected an array, got {other}"));
            defaults.to_vec()
        }
    };
    for note in &notes {
        warn!(sweep = %SweepKind::Pcn, note = %note, "refinement list entry ignored");
    }
    if list.first() != Some(&1.0) {
        list.insert(0, 1.0);
    }
    (list, notes)
}

fn refined_config(config: &Value, refinement: f64, layout: &NumericsLayout, min_samples: u64) -> Option<Value> {
    let mut refined = config.clone();
    for pointer in &layout.grid_samples {
        let slot = refined.pointer_mut(pointer)?;
        let n = slot.as_u64()?;
        let scaled = ((n as f64) * refinement).floor() as u64;
        *slot = Value::from(scaled.max(min_samples));
    }
    Some(refined)
}

fn scaled_config(config: &Value, factor: f64, layout: &NumericsLayout) -> Option<Value> {
    let mut scaled = config.clone();
    let mut touched = false;
    for pointer in &layout.tolerances {
        if let Some(slot) = scaled.pointer_mut(pointer) {
            if let Some(base) = occ_cert::numeric(slot) {
                *slot = Value::from(base * factor);
                touched = true;
            }
        }
    }
    touched.then_some(scaled)
}

/// Grid refinement sweep over the pointers of `layout`.
///
/// The run list is the baseline refinement `1` (prepended when absent)
/// followed by the configured refinements, or the policy defaults when the
/// configuration names none. Configured entries that are not positive numbers
/// are dropped with a note and keep the sweep from passing.
pub fn pcn_sweep<E, R>(
    config: &Value,
    policy: &StabilityPolicy,
    layout: &NumericsLayout,
    estimate: E,
    mut run: R,
) -> Result<SweepResult, OccError>
where
    E: Fn(&Value) -> Option<f64>,
    R: FnMut(&Value) -> Result<Verdict, OccError>,
{
    let (refinements, notes) = refinement_plan(config, layout, &policy.default_refinements);
    let mut collected = Collected::default();
    for refinement in refinements {
        let point = SweepPoint::Refinement(refinement);
        match refined_config(config, refinement, layout, policy.min_samples) {
            Some(refined) => {
                collected.execute(SweepKind::Pcn, point, refined, policy.work_cap, &estimate, &mut run)?
            }
            None => collected.skip(SweepKind::Pcn, point, SkipReason::GridUnavailable),
        }
    }
    let Collected { runs, skipped } = collected;

    let flip = flipped_against(&runs, runs.first().map(|run| &run.verdict));
    let refined = runs.iter().any(|run| !run.point.is_baseline());
    let pass = !flip && skipped.is_empty() && notes.is_empty() && (refined || !policy.require_refinement);
    Ok(SweepResult {
        kind: SweepKind::Pcn,
        pass,
        flip,
        runs,
        skipped,
        notes,
        work_cap: policy.work_cap,
    })
}

/// Tolerance sweep over `policy.tolerance_factors`; every tolerance pointer of
/// `layout` is scaled by the same factor.
pub fn pcd_sweep<E, R>(
    config: &Value,
    policy: &StabilityPolicy,
    layout: &NumericsLayout,
    estimate: E,
    mut run: R,
) -> Result<SweepResult, OccError>
where
    E: Fn(&Value) -> Option<f64>,
    R: FnMut(&Value) -> Result<Verdict, OccError>,
{
    let mut collected = Collected::default();
    for &factor in &policy.tolerance_factors {
        let point = SweepPoint::Factor(factor);
        match scaled_config(config, factor, layout) {
            Some(scaled) => {
                collected.execute(SweepKind::Pcd, point, scaled, policy.work_cap, &estimate, &mut run)?
            }
            None => collected.skip(SweepKind::Pcd, point, SkipReason::ToleranceUnavailable),
        }
    }
    let Collected { runs, skipped } = collected;

    let reference = runs
        .iter()
        .find(|run| run.point.is_baseline())
        .or_else(|| runs.first())
        .map(|run| &run.verdict);
    let flip = flipped_against(&runs, reference);
    let pass = !flip && skipped.is_empty();
    Ok(SweepResult {
        kind: SweepKind::Pcd,
        pass,
        flip,
        runs,
        skipped,
        notes: Vec::new(),
        work_cap: policy.work_cap,
    })
}

/// Downgrades a fragile `PASS`; any other verdict is returned unchanged.
///
/// A diagnostic line is appended whenever the verdict changes.
pub fn apply_downgrade(combined: Combined, stability: &Stability, diagnostic: &mut Vec<String>) -> Combined {
    if !combined.verdict.is_pass() || stability.passed() {
        return combined;
    }
    let reason = if stability.flipped() {
        StabilityReason::Unstable
    } else {
        StabilityReason::InsufficientCoverage
    };
    warn!(reason = reason.code(), "PASS downgraded by stability sweeps");
    diagnostic.push(format!(
        "stability: PASS downgraded to NO-EVAL({}) (PCN pass={}, PCD pass={})",
        reason.code(),
        stability.pcn.pass,
        stability.pcd.pass
    ));
    Combined {
        verdict: Verdict::no_eval(reason.code()),
        first_reason: Reason::Stability(reason),
    }
}
