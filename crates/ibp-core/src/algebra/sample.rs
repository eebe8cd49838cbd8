//! Deterministic GF(p) sampling for symbols whose numeric value is left
//! free by the config (the space-time dimension `D`, kinematic invariants
//! not fixed via `invar_one`).
//!
//! The non-goal "no reconstruction of rational functions in kinematic
//! invariants from modular samples" only makes sense if those quantities
//! are already numeric, the same field used everywhere else, by the time
//! any such reconstruction could be attempted. Sampling them once, from a
//! fixed hash of the symbol's name, keeps a `Family` fully deterministic
//! (two runs on the same config produce byte-identical samples, hence
//! byte-identical `result_<id>` files) without reaching for a process-wide
//! RNG.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

use crate::modp::ModP;

/// Sample a non-zero residue mod `p` from a symbol's name and a small
/// disambiguating salt (so that, e.g., `D` in two different families does
/// not collide with some other symbol's hash by construction -- each
/// `Family` salts with its own topology name).
pub fn sample_nonzero(salt: &str, name: &str) -> ModP {
    let mut hasher = FxHasher::default();
    salt.hash(&mut hasher);
    name.hash(&mut hasher);
    let mut bits = hasher.finish();
    loop {
        let candidate = ModP::from(bits);
        if !candidate.is_zero() {
            return candidate;
        }
        // Re-hash the previous output; astronomically unlikely to loop
        // more than once since only one residue out of ~2^63 is zero.
        let mut rehash = FxHasher::default();
        bits.hash(&mut rehash);
        bits = rehash.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_is_deterministic() {
        assert_eq!(sample_nonzero("bubble", "D"), sample_nonzero("bubble", "D"));
    }

    #[test]
    fn different_names_sample_differently_with_overwhelming_probability() {
        assert_ne!(sample_nonzero("bubble", "D"), sample_nonzero("bubble", "s"));
    }

    #[test]
    fn sample_is_never_zero() {
        for name in ["D", "s", "m", "t", "u"] {
            assert!(!sample_nonzero("salt", name).is_zero());
        }
    }
}
