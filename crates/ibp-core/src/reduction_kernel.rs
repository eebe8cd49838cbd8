//! IBP system generation and Gaussian elimination for one sector.

use crate::error::IbpError;
use crate::ibp_template::IbpTemplateFF;
use crate::integral::Integral;
use crate::modp::ModP;
use crate::seed_generator::SeedCatalogue;
use crate::sparse_row::SparseRow;
use rustc_hash::FxHashMap;

/// Outcome of reducing one sector: its masters, and for every non-master
/// seed within the depth/rank budget, its reduction as a linear
/// combination of masters (an empty combination means "reduces to 0").
pub struct ReductionResult {
    pub masters: Vec<Integral>,
    pub reductions: FxHashMap<Integral, Vec<(Integral, ModP)>>,
}

/// `ReductionKernel`: builds the IBP system for `catalogue` from
/// `templates`, row-reduces it, and reads off masters/reductions.
pub fn reduce_sector(
    catalogue: &SeedCatalogue,
    templates: &[IbpTemplateFF],
    depth_max: u32,
    rank_max: u32,
) -> Result<ReductionResult, IbpError> {
    let mut system = build_system(catalogue, templates, depth_max, rank_max)?;

    // Step 2: ascending (first_column, size, seqno).
    system.sort_by(|a, b| {
        a.first_column()
            .unwrap()
            .cmp(&b.first_column().unwrap())
            .then(a.len().cmp(&b.len()))
            .then(a.seqno.cmp(&b.seqno))
    });

    let mut pivot_of: FxHashMap<u32, usize> = FxHashMap::default();
    let mut g: Vec<SparseRow<ModP>> = Vec::new();

    for mut e in system {
        loop {
            if e.is_empty() {
                break;
            }
            let col0 = e.column_at(0);
            let Some(&prow) = pivot_of.get(&col0) else {
                break;
            };
            let pivot_row = g[prow].clone();
            e.eliminate(&pivot_row, 0);
        }
        if e.is_empty() {
            continue;
        }

        let lead_col = e.first_column().unwrap();
        e.normalize()
            .map_err(|_| IbpError::ModularSingularity { column: lead_col })?;

        let mut i = 1usize;
        while i < e.len() {
            let col_i = e.column_at(i);
            match pivot_of.get(&col_i) {
                Some(&prow) => {
                    let pivot_row = g[prow].clone();
                    e.eliminate(&pivot_row, i);
                }
                None => i += 1,
            }
        }

        pivot_of.insert(e.first_column().unwrap(), g.len());
        g.push(e);
    }

    let mut masters = Vec::new();
    let mut reductions = FxHashMap::default();
    for seed in catalogue.seeds() {
        if seed.depth() >= depth_max || seed.rank() >= rank_max {
            continue;
        }
        let idx = catalogue.weight(seed).expect("every catalogued seed has a weight") as u32;
        match pivot_of.get(&idx) {
            None => masters.push(seed.clone()),
            Some(&prow) => {
                let row = &g[prow];
                let mut combo = Vec::with_capacity(row.len().saturating_sub(1));
                for k in 1..row.len() {
                    let col = row.column_at(k);
                    let coeff = row.coeff_at(k);
                    let target = catalogue.seeds()[col as usize].clone();
                    combo.push((target, -coeff));
                }
                reductions.insert(seed.clone(), combo);
            }
        }
    }

    Ok(ReductionResult { masters, reductions })
}

/// Step 1: for every in-budget seed and every template, build the sparse
/// equation row and keep it if non-empty.
fn build_system(
    catalogue: &SeedCatalogue,
    templates: &[IbpTemplateFF],
    depth_max: u32,
    rank_max: u32,
) -> Result<Vec<SparseRow<ModP>>, IbpError> {
    let mut system = Vec::new();
    for seed in catalogue.seeds() {
        if seed.depth() >= depth_max || seed.rank() >= rank_max {
            continue;
        }
        for template in templates {
            let mut row = SparseRow::new();
            for (delta, coeffs) in template.terms() {
                let target = seed.add(delta)?;
                let Some(target_idx) = catalogue.weight(&target) else {
                    continue;
                };
                let gamma = coeffs.eval(seed);
                if gamma.is_zero() {
                    continue;
                }
                row.insert(target_idx as u32, gamma);
            }
            if !row.is_empty() {
                row.sort();
                row.seqno = system.len();
                system.push(row);
            }
        }
    }
    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;
    use crate::family::Family;
    use crate::seed_generator::generate_seeds;

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
    fn bubble_top_sector_reduces_without_error() {
        let cfg = RawConfig::load_from_toml(BUBBLE).unwrap();
        let mut family = Family::from_config(&cfg.family).unwrap();
        family.prepare().unwrap();

        let depth_max = 3;
        let rank_max = 1;
        let catalogue = generate_seeds(0b11, family.n, depth_max, rank_max);
        let result = reduce_sector(&catalogue, &family.templates, depth_max, rank_max).unwrap();
        // The bubble's only master is its corner integral [1, 1].
        assert!(result.masters.iter().any(|m| m.as_slice() == [1, 1]));
    }
}
