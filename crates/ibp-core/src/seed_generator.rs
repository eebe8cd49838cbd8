//! Seed enumeration for one sector: depth and rank budgets are each split
//! across a sector's support/zero bits via a weak-composition recurrence.
//!
//! The compositions memo is process-wide and append-only, protected by an
//! exclusive mutator, since the same `(number, sum)` composition lists are
//! shared across every sector a run touches.

use crate::integral::Integral;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, OnceLock};

type CompositionsMemo = Mutex<FxHashMap<(u32, u32), Arc<Vec<Vec<u32>>>>>;

fn memo() -> &'static CompositionsMemo {
    static MEMO: OnceLock<CompositionsMemo> = OnceLock::new();
    MEMO.get_or_init(|| Mutex::new(FxHashMap::default()))
}

/// Weak compositions of `sum` into `number` non-negative parts: empty for
/// `(0, 0)`, a single part for `number == 1`, the all-zero vector for
/// `sum == 0`, otherwise the concatenation over `i ∈ 0..=sum` of `i`
/// prepended to every composition of `(number - 1, sum - i)`.
pub fn compositions(number: u32, sum: u32) -> Arc<Vec<Vec<u32>>> {
    if let Some(existing) = memo().lock().unwrap().get(&(number, sum)) {
        return existing.clone();
    }
    let computed = Arc::new(compute_compositions(number, sum));
    memo().lock().unwrap().insert((number, sum), computed.clone());
    computed
}

fn compute_compositions(number: u32, sum: u32) -> Vec<Vec<u32>> {
    if number == 0 {
        return if sum == 0 { vec![vec![]] } else { vec![] };
    }
    if number == 1 {
        return vec![vec![sum]];
    }
    if sum == 0 {
        return vec![vec![0; number as usize]];
    }
    let mut out = Vec::new();
    for i in 0..=sum {
        let rest = compositions(number - 1, sum - i);
        for c in rest.iter() {
            let mut v = Vec::with_capacity(number as usize);
            v.push(i);
            v.extend_from_slice(c);
            out.push(v);
        }
    }
    out
}

/// The seed catalogue for one sector: its seeds in generation order and
/// the `seed -> position` dense index used by `ReductionKernel`.
pub struct SeedCatalogue {
    seeds: Vec<Integral>,
    weights: FxHashMap<Integral, usize>,
}

impl SeedCatalogue {
    pub fn seeds(&self) -> &[Integral] {
        &self.seeds
    }

    pub fn weight(&self, seed: &Integral) -> Option<usize> {
        self.weights.get(seed).copied()
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

/// Enumerate every seed of `sector` (a mask over `n` propagators) with
/// `depth < depth_max` and `rank < rank_max`: nested loop `d` outer, then
/// `r`, then the cross product of the two composition lists. Seed `0` is
/// always the sector's corner `[1,1,..,1,0,..,0]`.
pub fn generate_seeds(sector: u64, n: usize, depth_max: u32, rank_max: u32) -> SeedCatalogue {
    let support: Vec<usize> = (0..n).filter(|&i| sector & (1 << i) != 0).collect();
    let zero_bits: Vec<usize> = (0..n).filter(|&i| sector & (1 << i) == 0).collect();
    let l = support.len() as u32;
    let z = zero_bits.len() as u32;

    let mut seeds = Vec::new();
    let mut weights = FxHashMap::default();

    let d_max = depth_max.saturating_sub(l);
    for d in 0..=d_max {
        let comp_d = compositions(l, d);
        for r in 0..=rank_max {
            let comp_r = compositions(z, r);
            for cd in comp_d.iter() {
                for cr in comp_r.iter() {
                    let mut idx = vec![0i32; n];
                    for (k, &pos) in support.iter().enumerate() {
                        idx[pos] = 1 + cd[k] as i32;
                    }
                    for (k, &pos) in zero_bits.iter().enumerate() {
                        idx[pos] = -(cr[k] as i32);
                    }
                    let integral = Integral::from_slice(&idx);
                    weights.insert(integral.clone(), seeds.len());
                    seeds.push(integral);
                }
            }
        }
    }

    SeedCatalogue { seeds, weights }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compositions_base_cases() {
        assert_eq!(*compositions(0, 0), vec![vec![]]);
        assert_eq!(*compositions(0, 3), Vec::<Vec<u32>>::new());
        assert_eq!(*compositions(1, 5), vec![vec![5]]);
        assert_eq!(*compositions(3, 0), vec![vec![0, 0, 0]]);
    }

    #[test]
    fn compositions_count_matches_stars_and_bars() {
        // C(number=2, sum=3) has sum+1 = 4 compositions: (0,3),(1,2),(2,1),(3,0)
        let comps = compositions(2, 3);
        assert_eq!(comps.len(), 4);
        for c in comps.iter() {
            assert_eq!(c.iter().sum::<u32>(), 3);
        }
    }

    #[test]
    fn first_seed_is_sector_corner() {
        let catalogue = generate_seeds(0b101, 3, 4, 2);
        assert_eq!(catalogue.seeds()[0].as_slice(), &[1, 0, 1]);
    }

    #[test]
    fn weights_are_dense_and_bijective() {
        let catalogue = generate_seeds(0b11, 2, 3, 1);
        for (i, seed) in catalogue.seeds().iter().enumerate() {
            assert_eq!(catalogue.weight(seed), Some(i));
        }
    }
}
