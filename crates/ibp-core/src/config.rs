//! TOML configuration schema and loading.

use crate::error::IbpError;
use serde::Deserialize;

/// The raw, as-deserialized configuration document. `RawFamilyConfig`
/// carries only strings and numbers; `Family::from_config` is where these
/// are interned, parsed, and checked for arity/collisions.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    pub family: RawFamilyConfig,
    pub reduce: RawReduceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFamilyConfig {
    pub name: String,
    /// Expression string, defaults to the bare symbol `D` when absent.
    #[serde(default)]
    pub dimension: Option<String>,
    pub internals: Vec<String>,
    pub externals: Vec<String>,
    /// `(name, mass_dimension)` pairs.
    #[serde(default)]
    pub invariants: Vec<(String, i64)>,
    /// The invariant name that is fixed to `1` throughout.
    #[serde(default)]
    pub invar_one: Option<String>,
    /// `(a, b, value_expr)` triples defining `a . b = value_expr`.
    #[serde(alias = "sps_rules")]
    pub sp_rules: Vec<(String, String, String)>,
    /// `(momentum_expr, mass_expr)` pairs; `D_i = momentum^2 - mass^2`.
    pub propagators: Vec<(String, String)>,
}

/// Either a `targets` list, or the scalar `(top, posi, rank, dot)` form
/// kept as a compatibility path for callers that describe a reduction
/// job by its depth/rank budget directly rather than by target integral.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawReduceConfig {
    #[serde(default)]
    pub targets: Option<Vec<Vec<i32>>>,
    #[serde(default)]
    pub top: Option<u64>,
    #[serde(default)]
    pub posi: Option<usize>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub dot: Option<u32>,
}

impl RawConfig {
    pub fn load_from_toml(text: &str) -> Result<Self, IbpError> {
        toml::from_str(text).map_err(|e| IbpError::ConfigError(format!("TOML parse error: {e}")))
    }

    pub fn load_from_file(path: &std::path::Path) -> Result<Self, IbpError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| IbpError::ConfigError(format!("cannot read {}: {e}", path.display())))?;
        Self::load_from_toml(&content)
    }
}

/// The resolved reduction job for one sector run: the union-of-targets
/// `top` mask together with the per-sector depth/rank budget.
#[derive(Debug, Clone)]
pub struct ReduceJob {
    pub top: u64,
    pub depth_max: u32,
    pub rank_max: u32,
    pub targets: Vec<crate::integral::Integral>,
}

impl RawReduceConfig {
    /// Resolve either the `targets` form or the scalar `(top, posi, rank,
    /// dot)` form into a `ReduceJob`. `n` is the propagator count, needed
    /// to validate target vector lengths and to build the scalar-form
    /// corner target.
    pub fn resolve(&self, n: usize) -> Result<ReduceJob, IbpError> {
        if let Some(targets) = &self.targets {
            if targets.is_empty() {
                return Err(IbpError::ConfigError(
                    "reduce.targets must be non-empty".to_string(),
                ));
            }
            let mut top = 0u64;
            let mut depth_max = 0u32;
            let mut rank_max = 0u32;
            let mut integrals = Vec::with_capacity(targets.len());
            for t in targets {
                if t.len() != n {
                    return Err(IbpError::ConfigError(format!(
                        "reduce.targets entry has length {} but the family has {n} propagators",
                        t.len()
                    )));
                }
                let integral = crate::integral::Integral::from_slice(t);
                top |= integral.sector();
                depth_max = depth_max.max(integral.depth() + 1);
                rank_max = rank_max.max(integral.rank() + 1);
                integrals.push(integral);
            }
            Ok(ReduceJob {
                top,
                depth_max,
                rank_max,
                targets: integrals,
            })
        } else {
            let top = self.top.ok_or_else(|| {
                IbpError::ConfigError("reduce section needs either targets or top/posi/rank/dot".to_string())
            })?;
            let posi = self.posi.unwrap_or(top.count_ones() as usize);
            let rank = self.rank.unwrap_or(0);
            let dot = self.dot.unwrap_or(0);
            let corner = crate::integral::Integral::corner(n, top);
            // `posi`/`dot`/`rank` describe the *maximum* depth/rank this job
            // explores; the kernel's depth_max/rank_max are exclusive
            // bounds one past that maximum (same convention the `targets`
            // branch above gets from `integral.depth() + 1`), or the
            // scalar form's own corner would sit exactly on the boundary
            // and never be classified as a master or a reduction.
            Ok(ReduceJob {
                top,
                depth_max: posi as u32 + dot + 1,
                rank_max: rank + 1,
                targets: vec![corner],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUBBLE: &str = r#"
        [family]
        name = "bubble"
        dimension = "D"
        internals = ["k1"]
        externals = ["p1"]
        invariants = [["s", 1], ["m", 1]]
        invar_one = "m"
        sp_rules = [["p1", "p1", "s"]]
        propagators = [["k1", "m"], ["k1+p1", "m"]]

        [reduce]
        targets = [[1, 1]]
    "#;

    #[test]
    fn parses_bubble_config() {
        let cfg = RawConfig::load_from_toml(BUBBLE).unwrap();
        assert_eq!(cfg.family.name, "bubble");
        assert_eq!(cfg.family.propagators.len(), 2);
        assert_eq!(cfg.reduce.targets.as_ref().unwrap()[0], vec![1, 1]);
    }

    #[test]
    fn resolve_targets_derives_top_and_budgets() {
        let cfg = RawConfig::load_from_toml(BUBBLE).unwrap();
        let job = cfg.reduce.resolve(2).unwrap();
        assert_eq!(job.top, 0b11);
        assert_eq!(job.depth_max, 3);
        assert_eq!(job.rank_max, 1);
    }

    #[test]
    fn resolve_scalar_form_builds_corner() {
        let raw = RawReduceConfig {
            targets: None,
            top: Some(0b11),
            posi: Some(2),
            rank: Some(0),
            dot: Some(1),
        };
        let job = raw.resolve(2).unwrap();
        assert_eq!(job.targets[0].as_slice(), &[1, 1]);
        assert_eq!(job.depth_max, 4);
        assert_eq!(job.rank_max, 1);
    }
}
