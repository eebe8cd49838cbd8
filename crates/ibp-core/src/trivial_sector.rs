//! Trivial-sector detection.
//!
//! A sector is scaleless (trivial) when the linear system in the loop
//! momenta `k_j` built from its propagator set has no solution; since each
//! monomial of the propagator-derivative system carries at most one `k_j`
//! factor, that system is always linear, so a plain `Matrix::is_consistent`
//! over the sampled prime stands in for a general linear solver.
//!
//! The two booleans are easy to invert by accident: a sector is
//! *non-trivial* exactly when its `k`-equation system has **no** solution;
//! when a solution exists the sector is trivial and its mask is remembered
//! so every submask of it is skipped without re-solving.

use crate::algebra::matrix::Matrix;
use crate::algebra::poly::{Monomial, Poly};
use crate::family::Family;
use crate::modp::ModP;
use crate::symbol::SymbolId;
use rustc_hash::FxHashMap;

pub struct TrivialSectorOracle;

impl TrivialSectorOracle {
    /// Scan every submask of `top` down to the full-internal-momenta floor
    /// `(1 << L) - 1`, skipping submasks of an already-found trivial mask.
    /// Returns a bit-vector of length `top + 1` where index `mask` is `true`
    /// iff `mask` was found non-trivial; masks that are not submasks of
    /// `top` are left `false` and never consulted downstream.
    pub fn find_non_trivial(family: &Family, top: u64) -> Vec<bool> {
        let mut non_trivial = vec![false; top as usize + 1];
        let mut trivial_masks: Vec<u64> = Vec::new();
        let floor = if family.l == 0 { 0 } else { (1u64 << family.l) - 1 };

        for sector in (floor..=top).rev() {
            if (sector & top) != sector {
                continue;
            }
            if trivial_masks.iter().any(|&t| (sector & t) == sector) {
                continue;
            }
            if Self::is_consistent(family, sector) {
                trivial_masks.push(sector);
            } else {
                non_trivial[sector as usize] = true;
            }
        }
        non_trivial
    }

    /// `gSector = H` with every `aᵢ` for `i ∉ σ` set to zero; group its
    /// monomials by their surviving-`a` part, and demand every grouped
    /// coefficient (a linear expression in `k₁..k_n`) vanish. Returns
    /// whether that linear system is consistent.
    fn is_consistent(family: &Family, sector: u64) -> bool {
        let mut g_sector = family.g_diff.clone();
        for (i, &a_sym) in family.index_syms().iter().enumerate() {
            if sector & (1 << i) == 0 {
                g_sector = g_sector.eval_symbol(a_sym, ModP::zero());
            }
        }

        let is_index = |s: SymbolId| family.index_syms().contains(&s);
        let mut groups: FxHashMap<Monomial, Poly> = FxHashMap::default();
        for (mono, &coeff) in g_sector.terms() {
            let a_part: Vec<(SymbolId, u16)> = mono
                .factors()
                .iter()
                .copied()
                .filter(|&(s, _)| is_index(s))
                .collect();
            let k_part: Vec<(SymbolId, u16)> = mono
                .factors()
                .iter()
                .copied()
                .filter(|&(s, _)| !is_index(s))
                .collect();
            let a_mono = Monomial::from_pairs(a_part);
            let k_mono = Monomial::from_pairs(k_part);
            let term = Poly::monomial(k_mono, coeff);
            match groups.get_mut(&a_mono) {
                Some(existing) => *existing = existing.add(&term),
                None => {
                    groups.insert(a_mono, term);
                }
            }
        }

        let k_syms = family.k_syms();
        let mut m = Matrix::zeros(groups.len(), k_syms.len());
        let mut rhs = Vec::with_capacity(groups.len());
        for (row, poly) in groups.values().enumerate() {
            let (c0, ct) = poly.extract_linear(k_syms);
            rhs.push(-c0.constant_term());
            for (col, c) in ct.iter().enumerate() {
                m.set(row, col, c.constant_term());
            }
        }
        m.is_consistent(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;

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
    fn bubble_top_sector_is_non_trivial() {
        let cfg = RawConfig::load_from_toml(BUBBLE).unwrap();
        let mut family = Family::from_config(&cfg.family).unwrap();
        family.prepare().unwrap();
        let top = 0b11u64;
        let non_trivial = TrivialSectorOracle::find_non_trivial(&family, top);
        assert!(non_trivial[top as usize]);
    }
}
