//! Engine configuration.

use occ_core::errors::{ErrorInfo, OccError};
use serde::{Deserialize, Serialize};

/// JSON pointers locating the numeric knobs the sweeps perturb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericsLayout {
    /// Integer grid sample counts scaled by PCN refinements.
    #[serde(default = "NumericsLayout::default_grid_samples")]
    pub grid_samples: Vec<String>,
    /// Numeric tolerances scaled by PCD factors.
    #[serde(default = "NumericsLayout::default_tolerances")]
    pub tolerances: Vec<String>,
    /// Optional list of PCN refinement factors inside the configuration.
    #[serde(default = "NumericsLayout::default_refinements")]
    pub refinements: String,
}

impl NumericsLayout {
    fn default_grid_samples() -> Vec<String> {
        vec![
            "/numerics/grid/omega_grid/n".to_string(),
            "/numerics/grid/time_grid/n".to_string(),
        ]
    }

    fn default_tolerances() -> Vec<String> {
        vec!["/numerics/tolerances/eps_psd".to_string()]
    }

    fn default_refinements() -> String {
        "/numerics/pcn/refinements".to_string()
    }
}

impl Default for NumericsLayout {
    fn default() -> Self {
        Self {
            grid_samples: Self::default_grid_samples(),
            tolerances: Self::default_tolerances(),
            refinements: Self::default_refinements(),
        }
    }
}

/// Controls the PCN/PCD stability sweeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityPolicy {
    /// Run sweeps at all.
    #[serde(default = "StabilityPolicy::default_enabled")]
    pub enabled: bool,
    /// Runs whose estimated work exceeds this are skipped.
    #[serde(default = "StabilityPolicy::default_work_cap")]
    pub work_cap: f64,
    /// Floor applied to refined grid sample counts.
    #[serde(default = "StabilityPolicy::default_min_samples")]
    pub min_samples: u64,
    /// PCD multipliers applied to every tolerance.
    #[serde(default = "StabilityPolicy::default_tolerance_factors")]
    pub tolerance_factors: Vec<f64>,
    /// PCN refinements used when the configuration names none.
    ///
    /// Defaults to `[2.0]`, so a configuration without a refinement list still
    /// gets one refined run. Set `[]` together with `require_refinement:
    /// false` for baseline-only sweeps that pass on the baseline alone.
    #[serde(default = "StabilityPolicy::default_refinements")]
    pub default_refinements: Vec<f64>,
    /// PCN only passes when a non-baseline refinement actually ran.
    ///
    /// On by default: a sweep that only ran the baseline downgrades a `PASS`
    /// to insufficient coverage.
    #[serde(default = "StabilityPolicy::default_require_refinement")]
    pub require_refinement: bool,
    /// Record sweeps even when the provisional verdict is not `PASS`.
    #[serde(default)]
    pub always_record: bool,
    /// Pointer layout of the perturbed knobs.
    #[serde(default)]
    pub layout: NumericsLayout,
}

impl StabilityPolicy {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_work_cap() -> f64 {
        5.0e7
    }

    const fn default_min_samples() -> u64 {
        10
    }

    fn default_tolerance_factors() -> Vec<f64> {
        vec![0.1, 1.0, 10.0]
    }

    fn default_refinements() -> Vec<f64> {
        vec![2.0]
    }

    const fn default_require_refinement() -> bool {
        true
    }

    /// Policy with sweeps turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            work_cap: Self::default_work_cap(),
            min_samples: Self::default_min_samples(),
            tolerance_factors: Self::default_tolerance_factors(),
            default_refinements: Self::default_refinements(),
            require_refinement: Self::default_require_refinement(),
            always_record: false,
            layout: NumericsLayout::default(),
        }
    }
}

/// Top-level engine policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnginePolicy {
    /// Sweep configuration.
    #[serde(default)]
    pub stability: StabilityPolicy,
}

impl EnginePolicy {
    /// Parses a YAML policy document; absent keys take their defaults.
    pub fn from_yaml_slice(data: &[u8]) -> Result<Self, OccError> {
        serde_yaml::from_slice(data)
            .map_err(|err| OccError::Serde(ErrorInfo::new("policy-yaml-parse", err.to_string())))
    }

    /// Renders the policy as YAML.
    pub fn to_yaml_string(&self) -> Result<String, OccError> {
        serde_yaml::to_string(self)
            .map_err(|err| OccError::Serde(ErrorInfo::new("policy-yaml-render", err.to_string())))
    }
}
