#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use occ_core::errors::{ErrorInfo, OccError};
use occ_core::{Lock, LockMap};
use occ_engine::{Artifact, DomainModule, ModuleOutput, ModuleRegistry, NumericsLayout};
use serde_json::{json, Value};

/// Deterministic module whose locks react to the grid size and tolerance.
///
/// `GRID` fails when `omega_grid.n < /toy/min_grid`; `PSD` is NO-EVAL when
/// `eps_psd > /toy/eps_limit`. A `/toy/locks` object replaces both.
#[derive(Default)]
pub struct ToyModule {
    counters: Counters,
}

/// Shared view of what the module was asked to compile.
#[derive(Clone, Default)]
pub struct Counters {
    compiles: Arc<AtomicUsize>,
    max_omega: Arc<AtomicU64>,
}

impl Counters {
    pub fn compiles(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }

    pub fn max_omega(&self) -> u64 {
        self.max_omega.load(Ordering::SeqCst)
    }
}

fn grid_n(config: &Value, grid: &str) -> u64 {
    config
        .pointer(&format!("/numerics/grid/{grid}/n"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

impl DomainModule for ToyModule {
    fn name(&self) -> &str {
        "toy"
    }

    fn compile(&self, config: &Value) -> Result<Artifact, OccError> {
        if config.pointer("/toy/explode") == Some(&Value::Bool(true)) {
            return Err(OccError::Module(ErrorInfo::new("toy-compile", "toy exploded")));
        }
        self.counters.compiles.fetch_add(1, Ordering::SeqCst);
        let n_omega = grid_n(config, "omega_grid");
        self.counters.max_omega.fetch_max(n_omega, Ordering::SeqCst);
        Ok(json!({
            "n_omega": n_omega,
            "n_time": grid_n(config, "time_grid"),
            "eps": config.pointer("/numerics/tolerances/eps_psd").and_then(Value::as_f64),
        }))
    }

    fn check(&self, artifact: &Artifact, config: &Value) -> Result<ModuleOutput, OccError> {
        if let Some(raw) = config.pointer("/toy/locks") {
            let locks: LockMap = serde_json::from_value(raw.clone())
                .map_err(|err| OccError::Schema(ErrorInfo::new("toy-locks", err.to_string())))?;
            return Ok(ModuleOutput::new(locks));
        }
        let min_grid = config.pointer("/toy/min_grid").and_then(Value::as_u64).unwrap_or(0);
        let eps_limit = config.pointer("/toy/eps_limit").and_then(Value::as_f64).unwrap_or(f64::INFINITY);
        let n_omega = artifact["n_omega"].as_u64().unwrap_or(0);
        let eps = artifact["eps"].as_f64().unwrap_or(0.0);

        let grid = if n_omega >= min_grid {
            Lock::passed("GRID", "grid resolved")
        } else {
            Lock::failed("GRID", "grid too coarse")
        };
        let psd = if eps <= eps_limit {
            Lock::passed("PSD", "spectral density positive")
        } else {
            Lock::no_eval("PSD", "tolerance too loose to decide")
        };
        Ok(ModuleOutput::new(LockMap::new().with(grid).with(psd)).with_diagnostic(format!("toy: n_omega={n_omega}")))
    }
}

/// Module whose numerics live under `/lattice`; `SITES` fails below
/// `/lattice/min_sites`.
#[derive(Default)]
pub struct LatticeModule {
    counters: Counters,
}

impl DomainModule for LatticeModule {
    fn name(&self) -> &str {
        "lattice"
    }

    fn compile(&self, config: &Value) -> Result<Artifact, OccError> {
        self.counters.compiles.fetch_add(1, Ordering::SeqCst);
        let sites = config.pointer("/lattice/sites").and_then(Value::as_u64).unwrap_or(0);
        self.counters.max_omega.fetch_max(sites, Ordering::SeqCst);
        Ok(json!({"sites": sites}))
    }

    fn check(&self, artifact: &Artifact, config: &Value) -> Result<ModuleOutput, OccError> {
        let min_sites = config.pointer("/lattice/min_sites").and_then(Value::as_u64).unwrap_or(0);
        let lock = if artifact["sites"].as_u64().unwrap_or(0) >= min_sites {
            Lock::passed("SITES", "lattice large enough")
        } else {
            Lock::failed("SITES", "lattice too small")
        };
        Ok(ModuleOutput::new(LockMap::new().with(lock)))
    }

    fn numerics_layout(&self) -> Option<NumericsLayout> {
        Some(NumericsLayout {
            grid_samples: vec!["/lattice/sites".to_string()],
            tolerances: vec!["/lattice/tolerance".to_string()],
            refinements: "/lattice/refinements".to_string(),
        })
    }

    fn estimate_work(&self, config: &Value, layout: &NumericsLayout) -> Option<f64> {
        let sites = layout
            .grid_samples
            .first()
            .and_then(|pointer| config.pointer(pointer))
            .and_then(Value::as_u64)?;
        Some((sites as f64).powi(2))
    }
}

/// Registry holding the toy and lattice modules.
pub fn mixed_registry() -> (ModuleRegistry, Counters, Counters) {
    let toy = ToyModule::default();
    let lattice = LatticeModule::default();
    let (toy_counters, lattice_counters) = (toy.counters.clone(), lattice.counters.clone());
    let registry = ModuleRegistry::builder()
        .register(toy)
        .register(lattice)
        .build()
        .unwrap();
    (registry, toy_counters, lattice_counters)
}

pub fn lattice_config(sites: u64, refinements: Value) -> Value {
    json!({"lattice": {"sites": sites, "tolerance": 1.0e-4, "refinements": refinements}})
}

pub fn toy_registry() -> (ModuleRegistry, Counters) {
    let module = ToyModule::default();
    let counters = module.counters.clone();
    let registry = ModuleRegistry::builder().register(module).build().unwrap();
    (registry, counters)
}

pub fn toy_config(n: u64, refinements: Value) -> Value {
    json!({
        "numerics": {
            "grid": {
                "omega_grid": {"n": n},
                "time_grid": {"n": n},
            },
            "tolerances": {"eps_psd": 1.0e-6},
            "pcn": {"refinements": refinements},
        }
    })
}
