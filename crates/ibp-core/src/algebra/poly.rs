//! Sparse multivariate polynomials over `ModP`, keyed by `SymbolId`.
//!
//! This is the entire surface that plays the role of the "external
//! symbolic algebra library" named in the distilled specification: once
//! every kinematic invariant and the dimension symbol are sampled to GF(p)
//! (see `algebra::sample`), `differentiation, expansion, substitution` all
//! reduce to ordinary sparse-polynomial bookkeeping, and `canonical form`
//! is simply "the hash map of monomial -> coefficient", since like terms
//! are always combined on insertion.

use crate::modp::ModP;
use crate::symbol::SymbolId;
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};
use std::cmp::Ordering;

type Exponent = u16;

/// A monomial, stored as a sorted (by `SymbolId`) list of `(symbol,
/// exponent)` pairs with no duplicate symbols and no zero exponents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Monomial(SmallVec<[(SymbolId, Exponent); 4]>);

impl Monomial {
    pub fn one() -> Self {
        Monomial(SmallVec::new())
    }

    pub fn single(sym: SymbolId) -> Self {
        Monomial(smallvec![(sym, 1)])
    }

    /// The product of a list of symbols (duplicates allowed and merged),
    /// used to build the `x_j` scalar-product basis monomials (`l_i l_j`,
    /// `l_i p_j`).
    pub fn from_symbols(symbols: &[SymbolId]) -> Self {
        let mut m = Monomial::one();
        for &s in symbols {
            m = m.mul(&Monomial::single(s));
        }
        m
    }

    pub fn factors(&self) -> &[(SymbolId, Exponent)] {
        &self.0
    }

    /// Build a monomial from an arbitrary (possibly unsorted, possibly
    /// duplicate-symbol) list of factors, used by callers that split an
    /// existing monomial's factor list into two groups (e.g. the trivial
    /// sector oracle's `a`-part/`k`-part grouping).
    pub fn from_pairs(pairs: impl IntoIterator<Item = (SymbolId, Exponent)>) -> Monomial {
        let mut m = Monomial::one();
        for (sym, exp) in pairs {
            if exp == 0 {
                continue;
            }
            m = m.mul(&Monomial(smallvec![(sym, exp)]));
        }
        m
    }

    pub fn total_degree(&self) -> u32 {
        self.0.iter().map(|&(_, e)| e as u32).sum()
    }

    pub fn degree_in(&self, sym: SymbolId) -> Exponent {
        self.0
            .iter()
            .find(|&&(s, _)| s == sym)
            .map(|&(_, e)| e)
            .unwrap_or(0)
    }

    pub fn contains(&self, sym: SymbolId) -> bool {
        self.degree_in(sym) > 0
    }

    /// Merge two monomials (multiply them), summing shared exponents.
    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut out: SmallVec<[(SymbolId, Exponent); 4]> = SmallVec::new();
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.0.len() && j < other.0.len() {
            let (sa, ea) = self.0[i];
            let (sb, eb) = other.0[j];
            match sa.cmp(&sb) {
                Ordering::Less => {
                    out.push((sa, ea));
                    i += 1;
                }
                Ordering::Greater => {
                    out.push((sb, eb));
                    j += 1;
                }
                Ordering::Equal => {
                    out.push((sa, ea + eb));
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend(self.0[i..].iter().copied());
        out.extend(other.0[j..].iter().copied());
        Monomial(out)
    }

    /// This monomial with one factor's exponent reduced by one (used by
    /// `Poly::diff`); returns `None` if the symbol does not occur.
    fn lower(&self, sym: SymbolId) -> Option<Monomial> {
        let mut out = self.0.clone();
        let slot = out.iter_mut().find(|(s, _)| *s == sym)?;
        if slot.1 == 1 {
            let idx = out.iter().position(|(s, _)| *s == sym).unwrap();
            out.remove(idx);
        } else {
            slot.1 -= 1;
        }
        Some(Monomial(out))
    }

    /// This monomial with all factors of `sym` removed, plus the removed
    /// exponent.
    fn strip(&self, sym: SymbolId) -> (Monomial, Exponent) {
        let exp = self.degree_in(sym);
        if exp == 0 {
            return (self.clone(), 0);
        }
        let rest: SmallVec<[(SymbolId, Exponent); 4]> =
            self.0.iter().copied().filter(|&(s, _)| s != sym).collect();
        (Monomial(rest), exp)
    }
}

/// A sparse polynomial: a map from monomial to non-zero `ModP` coefficient.
#[derive(Clone, Debug, Default)]
pub struct Poly {
    terms: FxHashMap<Monomial, ModP>,
}

impl Poly {
    pub fn zero() -> Self {
        Poly {
            terms: FxHashMap::default(),
        }
    }

    pub fn constant(c: ModP) -> Self {
        let mut p = Poly::zero();
        if !c.is_zero() {
            p.terms.insert(Monomial::one(), c);
        }
        p
    }

    pub fn symbol(sym: SymbolId) -> Self {
        let mut p = Poly::zero();
        p.terms.insert(Monomial::single(sym), ModP::one());
        p
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &ModP)> {
        self.terms.iter()
    }

    pub fn coefficient(&self, mono: &Monomial) -> ModP {
        self.terms.get(mono).copied().unwrap_or(ModP::zero())
    }

    /// Coefficient of the constant term.
    pub fn constant_term(&self) -> ModP {
        self.coefficient(&Monomial::one())
    }

    fn add_term(&mut self, mono: Monomial, coeff: ModP) {
        if coeff.is_zero() {
            return;
        }
        match self.terms.get_mut(&mono) {
            Some(existing) => {
                let sum = *existing + coeff;
                if sum.is_zero() {
                    self.terms.remove(&mono);
                } else {
                    *existing = sum;
                }
            }
            None => {
                self.terms.insert(mono, coeff);
            }
        }
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let mut out = self.clone();
        for (mono, coeff) in &other.terms {
            out.add_term(mono.clone(), *coeff);
        }
        out
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        let mut out = self.clone();
        for (mono, coeff) in &other.terms {
            out.add_term(mono.clone(), -*coeff);
        }
        out
    }

    pub fn neg(&self) -> Poly {
        Poly::zero().sub(self)
    }

    pub fn scale(&self, c: ModP) -> Poly {
        if c.is_zero() {
            return Poly::zero();
        }
        let mut out = Poly::zero();
        for (mono, coeff) in &self.terms {
            out.terms.insert(mono.clone(), *coeff * c);
        }
        out
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        let mut out = Poly::zero();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                out.add_term(ma.mul(mb), *ca * *cb);
            }
        }
        out
    }

    /// Partial derivative with respect to `sym`.
    pub fn diff(&self, sym: SymbolId) -> Poly {
        let mut out = Poly::zero();
        for (mono, coeff) in &self.terms {
            let exp = mono.degree_in(sym);
            if exp == 0 {
                continue;
            }
            if let Some(lowered) = mono.lower(sym) {
                out.add_term(lowered, *coeff * ModP::from_i64(exp as i64));
            }
        }
        out
    }

    /// Substitute a single symbol with a scalar value.
    pub fn eval_symbol(&self, sym: SymbolId, value: ModP) -> Poly {
        let mut out = Poly::zero();
        for (mono, coeff) in &self.terms {
            let (rest, exp) = mono.strip(sym);
            let factor = value.pow(exp as u64);
            out.add_term(rest, *coeff * factor);
        }
        out
    }

    /// Replace every monomial equal to a key of `table` with the
    /// corresponding polynomial (scaled by the monomial's coefficient in
    /// `self`); monomials absent from `table` pass through unchanged.
    ///
    /// Used to rewrite canonical scalar-product monomials (`l_i l_j`,
    /// `l_i p_j`) as affine expressions in the propagator symbols `D_t`.
    pub fn substitute_monomials(&self, table: &FxHashMap<Monomial, Poly>) -> Poly {
        let mut out = Poly::zero();
        for (mono, coeff) in &self.terms {
            match table.get(mono) {
                Some(replacement) => {
                    out = out.add(&replacement.scale(*coeff));
                }
                None => out.add_term(mono.clone(), *coeff),
            }
        }
        out
    }

    /// Replace every monomial whose *total degree in external symbols* is
    /// exactly two with the scalar from `rules` (keyed by the sorted pair
    /// of external symbols involved, or `(s, s)` for a square), leaving the
    /// remaining (non-external) factors of the monomial in place.
    ///
    /// Every monomial handled by this function arises either from
    /// expanding a quadratic propagator `k^2` or from the bilinear `v_j *
    /// dD_s/dl_i` term of an IBP template, so its external degree is
    /// always 0 (pure internal/mixed cross monomial, passed through
    /// untouched), 1 (should not occur for a well-formed family; passed
    /// through so a bug surfaces as a leftover external symbol rather than
    /// silently dropping a term) or 2 (substituted).
    pub fn substitute_external_pairs(
        &self,
        is_external: impl Fn(SymbolId) -> bool,
        rules: &FxHashMap<(SymbolId, SymbolId), ModP>,
    ) -> Poly {
        let mut out = Poly::zero();
        for (mono, coeff) in &self.terms {
            let ext_factors: SmallVec<[(SymbolId, Exponent); 2]> = mono
                .factors()
                .iter()
                .copied()
                .filter(|&(s, _)| is_external(s))
                .collect();
            let ext_degree: u32 = ext_factors.iter().map(|&(_, e)| e as u32).sum();
            if ext_degree != 2 {
                out.add_term(mono.clone(), *coeff);
                continue;
            }
            let key = if ext_factors.len() == 1 {
                (ext_factors[0].0, ext_factors[0].0)
            } else {
                let (a, b) = (ext_factors[0].0, ext_factors[1].0);
                if a <= b {
                    (a, b)
                } else {
                    (b, a)
                }
            };
            let value = rules.get(&key).copied().unwrap_or(ModP::zero());
            let rest: SmallVec<[(SymbolId, Exponent); 4]> = mono
                .factors()
                .iter()
                .copied()
                .filter(|&(s, _)| !is_external(s))
                .collect();
            out.add_term(Monomial(rest), *coeff * value);
        }
        out
    }

    pub fn total_degree(&self) -> u32 {
        self.terms
            .keys()
            .map(|m| m.total_degree())
            .max()
            .unwrap_or(0)
    }

    /// A single-term polynomial `coeff * mono`.
    pub fn monomial(mono: Monomial, coeff: ModP) -> Poly {
        let mut p = Poly::zero();
        p.add_term(mono, coeff);
        p
    }

    /// Factor every monomial into its `is_target`-matching part and the
    /// rest, then replace the target part with its entry in `table`
    /// (scaled by the rest, which carries over as a plain monomial factor
    /// rather than a coefficient scale). Monomials with no target factor
    /// pass through unchanged.
    ///
    /// This generalizes `substitute_monomials` to the case where the
    /// table's domain is only ever a *factor* of a larger monomial (here:
    /// the index variables `a_s` ride along untouched while the scalar
    /// product factor is rewritten in terms of propagator symbols), which
    /// a whole-monomial lookup cannot express.
    pub fn substitute_factor(
        &self,
        is_target: impl Fn(SymbolId) -> bool,
        table: &FxHashMap<Monomial, Poly>,
    ) -> Poly {
        let mut out = Poly::zero();
        for (mono, coeff) in &self.terms {
            let target: SmallVec<[(SymbolId, Exponent); 4]> = mono
                .factors()
                .iter()
                .copied()
                .filter(|&(s, _)| is_target(s))
                .collect();
            if target.is_empty() {
                out.add_term(mono.clone(), *coeff);
                continue;
            }
            let rest: SmallVec<[(SymbolId, Exponent); 4]> = mono
                .factors()
                .iter()
                .copied()
                .filter(|&(s, _)| !is_target(s))
                .collect();
            let target_mono = Monomial(target);
            match table.get(&target_mono) {
                Some(replacement) => {
                    let rest_poly = Poly::monomial(Monomial(rest), *coeff);
                    out = out.add(&replacement.mul(&rest_poly));
                }
                None => out.add_term(mono.clone(), *coeff),
            }
        }
        out
    }

    /// Split `self` into `(c0, [c_1, .., c_k])` where `targets[i]` always
    /// occurs with exponent one and `c_i` is `self`'s coefficient of
    /// `targets[i]` (with that single factor stripped), and `c0` collects
    /// every term containing none of `targets`. Assumes `self` is affine
    /// (degree <= 1) in each `targets[i]` and that no monomial carries more
    /// than one of them -- true of every coefficient this crate builds,
    /// since a scalar-product monomial maps through exactly one
    /// `sps_from_props` table entry.
    pub fn extract_linear(&self, targets: &[SymbolId]) -> (Poly, Vec<Poly>) {
        let mut c0 = Poly::zero();
        let mut ct: Vec<Poly> = vec![Poly::zero(); targets.len()];
        for (mono, coeff) in &self.terms {
            let hit = mono
                .factors()
                .iter()
                .find_map(|&(s, _)| targets.iter().position(|&t| t == s));
            match hit {
                Some(idx) => {
                    let rest: SmallVec<[(SymbolId, Exponent); 4]> = mono
                        .factors()
                        .iter()
                        .copied()
                        .filter(|&(s, _)| s != targets[idx])
                        .collect();
                    ct[idx].add_term(Monomial(rest), *coeff);
                }
                None => c0.add_term(mono.clone(), *coeff),
            }
        }
        (c0, ct)
    }
}

impl PartialEq for Poly {
    fn eq(&self, other: &Self) -> bool {
        self.sub(other).is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolRegistry;

    #[test]
    fn add_combines_like_terms_to_zero() {
        let mut reg = SymbolRegistry::new();
        let a = reg.intern("a");
        let p = Poly::symbol(a);
        let q = p.neg();
        assert!(p.add(&q).is_zero());
    }

    #[test]
    fn diff_of_square_is_linear() {
        let mut reg = SymbolRegistry::new();
        let a = reg.intern("a");
        let square = Poly::symbol(a).mul(&Poly::symbol(a));
        let d = square.diff(a);
        // d(a^2)/da == 2a
        assert_eq!(d, Poly::symbol(a).scale(ModP::from_i64(2)));
    }

    #[test]
    fn eval_symbol_reduces_degree() {
        let mut reg = SymbolRegistry::new();
        let a = reg.intern("a");
        let poly = Poly::symbol(a).mul(&Poly::symbol(a));
        let evaluated = poly.eval_symbol(a, ModP::from_i64(3));
        assert_eq!(evaluated, Poly::constant(ModP::from_i64(9)));
    }

    #[test]
    fn external_pair_substitution() {
        let mut reg = SymbolRegistry::new();
        let p1 = reg.intern("p1");
        let p2 = reg.intern("p2");
        let mono = Poly::symbol(p1).mul(&Poly::symbol(p2));
        let mut rules = FxHashMap::default();
        rules.insert((p1.min(p2), p1.max(p2)), ModP::from_i64(5));
        let subbed = mono.substitute_external_pairs(|s| s == p1 || s == p2, &rules);
        assert_eq!(subbed, Poly::constant(ModP::from_i64(5)));
    }

    #[test]
    fn substitute_factor_rewrites_target_leaving_rest_as_carried_factor() {
        let mut reg = SymbolRegistry::new();
        let a = reg.intern("a1");
        let x = reg.intern("x"); // stands in for a scalar-product monomial
        let d = reg.intern("D1");
        // term: a1 * x, table: x -> 2*D1
        let poly = Poly::symbol(a).mul(&Poly::symbol(x));
        let mut table = FxHashMap::default();
        table.insert(Monomial::single(x), Poly::symbol(d).scale(ModP::from_i64(2)));
        let out = poly.substitute_factor(|s| s == x, &table);
        assert_eq!(out, Poly::symbol(a).mul(&Poly::symbol(d)).scale(ModP::from_i64(2)));
    }

    #[test]
    fn extract_linear_splits_constant_and_per_target_parts() {
        let mut reg = SymbolRegistry::new();
        let a = reg.intern("a1");
        let d1 = reg.intern("D1");
        // 3*a1*D1 + 5*a1  -> c0 = 5*a1, ct[0] (for D1) = 3*a1
        let poly = Poly::symbol(a)
            .mul(&Poly::symbol(d1))
            .scale(ModP::from_i64(3))
            .add(&Poly::symbol(a).scale(ModP::from_i64(5)));
        let (c0, ct) = poly.extract_linear(&[d1]);
        assert_eq!(c0, Poly::symbol(a).scale(ModP::from_i64(5)));
        assert_eq!(ct[0], Poly::symbol(a).scale(ModP::from_i64(3)));
    }
}
