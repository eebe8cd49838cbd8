//! `SparseRow<R>`: a sparse equation over a ring, stored as a strictly
//! descending-column list of non-zero coefficients.
//!
//! Polymorphic over a small capability trait (`Field`) rather than
//! duplicated per coefficient ring, per the design note that the same
//! merge-based elimination algorithm serves both a finite-field and a
//! symbolic instantiation. Only `ModP` is instantiated in this crate: the
//! symbolic ring is resolved to `ModP` values during family preparation
//! (see `algebra`), so there is exactly one concrete `Field` impl, but the
//! kernel itself never assumes that.

use crate::error::IbpError;
use crate::modp::ModP;
use std::cmp::Ordering;

/// The capability set `SparseRow` needs from its coefficient ring.
pub trait Field: Copy + PartialEq {
    fn zero() -> Self;
    fn one() -> Self;
    fn add(self, other: Self) -> Self;
    fn sub(self, other: Self) -> Self;
    fn mul(self, other: Self) -> Self;
    fn is_zero(&self) -> bool;
    fn inverse(&self) -> Result<Self, IbpError>;
}

impl Field for ModP {
    fn zero() -> Self {
        ModP::zero()
    }
    fn one() -> Self {
        ModP::one()
    }
    fn add(self, other: Self) -> Self {
        self + other
    }
    fn sub(self, other: Self) -> Self {
        self - other
    }
    fn mul(self, other: Self) -> Self {
        self * other
    }
    fn is_zero(&self) -> bool {
        ModP::is_zero(self)
    }
    fn inverse(&self) -> Result<Self, IbpError> {
        ModP::inverse(self)
    }
}

/// A sparse equation: `Σ entries[k].1 * x[entries[k].0] == 0`, columns
/// strictly descending, coefficients non-zero.
#[derive(Clone, Debug)]
pub struct SparseRow<R: Field> {
    entries: Vec<(u32, R)>,
    /// Generation order, used only as the final tie-break when ordering
    /// the system (§4.8 step 2).
    pub seqno: usize,
}

impl<R: Field> SparseRow<R> {
    pub fn new() -> Self {
        SparseRow {
            entries: Vec::new(),
            seqno: 0,
        }
    }

    /// Append a term. Caller is responsible for calling `sort()` before
    /// relying on ordering invariants.
    pub fn insert(&mut self, column: u32, coeff: R) {
        if !coeff.is_zero() {
            self.entries.push((column, coeff));
        }
    }

    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.0.cmp(&a.0));
    }

    pub fn erase_zero(&mut self) {
        self.entries.retain(|(_, c)| !c.is_zero());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn first_column(&self) -> Option<u32> {
        self.entries.first().map(|(c, _)| *c)
    }

    pub fn column_at(&self, i: usize) -> u32 {
        self.entries[i].0
    }

    pub fn coeff_at(&self, i: usize) -> R {
        self.entries[i].1
    }

    pub fn entries(&self) -> &[(u32, R)] {
        &self.entries
    }

    /// Divide every coefficient by the leading coefficient. No-op on an
    /// empty row. Idempotent: the leading coefficient is `1` afterwards.
    pub fn normalize(&mut self) -> Result<(), IbpError> {
        if let Some(&(_, lead)) = self.entries.first() {
            let inv = lead.inverse()?;
            for (_, c) in &mut self.entries {
                *c = c.mul(inv);
            }
        }
        Ok(())
    }

    /// `self <- self - self[k].coeff * pivot`, where `pivot[0].col ==
    /// self[k].col` and `pivot` is normalised (leading coefficient `1`).
    ///
    /// Implemented as a linear merge of the two descending column
    /// sequences rather than a hash-map combine, so iteration order (and
    /// therefore the floating/exact value of every coefficient) is fully
    /// deterministic.
    pub fn eliminate(&mut self, pivot: &SparseRow<R>, k: usize) {
        let scale = self.entries[k].1;
        let mut merged = Vec::with_capacity(self.entries.len() + pivot.entries.len());
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.entries.len() && j < pivot.entries.len() {
            let (col_a, coeff_a) = self.entries[i];
            let (col_b, coeff_b) = pivot.entries[j];
            match col_a.cmp(&col_b) {
                Ordering::Greater => {
                    merged.push((col_a, coeff_a));
                    i += 1;
                }
                Ordering::Less => {
                    let c = R::zero().sub(scale.mul(coeff_b));
                    if !c.is_zero() {
                        merged.push((col_b, c));
                    }
                    j += 1;
                }
                Ordering::Equal => {
                    let c = coeff_a.sub(scale.mul(coeff_b));
                    if !c.is_zero() {
                        merged.push((col_a, c));
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        while i < self.entries.len() {
            merged.push(self.entries[i]);
            i += 1;
        }
        while j < pivot.entries.len() {
            let (col_b, coeff_b) = pivot.entries[j];
            let c = R::zero().sub(scale.mul(coeff_b));
            if !c.is_zero() {
                merged.push((col_b, c));
            }
            j += 1;
        }
        self.entries = merged;
    }
}

impl<R: Field> Default for SparseRow<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(u32, i64)]) -> SparseRow<ModP> {
        let mut r = SparseRow::new();
        for &(c, v) in pairs {
            r.insert(c, ModP::from_i64(v));
        }
        r.sort();
        r
    }

    #[test]
    fn normalize_sets_leading_coefficient_to_one() {
        let mut r = row(&[(3, 6), (1, 9)]);
        r.normalize().unwrap();
        assert_eq!(r.coeff_at(0), ModP::one());
        // 9 / 6 = 3/2, check consistency: 6 * (3/2) == 9 in GF(p)
        let three_half = ModP::from_i64(6).inverse().unwrap() * ModP::from_i64(9);
        assert_eq!(r.coeff_at(1), three_half);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut r = row(&[(3, 6), (1, 9)]);
        r.normalize().unwrap();
        let once = r.clone();
        r.normalize().unwrap();
        assert_eq!(r.entries(), once.entries());
    }

    #[test]
    fn eliminate_removes_pivot_column() {
        let mut pivot = row(&[(5, 1), (2, 3)]); // already normalized: leading coeff 1
        pivot.normalize().unwrap();
        let mut target = row(&[(5, 4), (2, 1), (0, 7)]);
        target.eliminate(&pivot, 0);
        assert!(target.entries().iter().all(|&(c, _)| c != 5));
        assert!(!target.is_empty());
    }

    #[test]
    fn eliminate_result_stays_descending_and_zero_free() {
        let mut pivot = row(&[(5, 1), (3, 2), (1, 1)]);
        pivot.normalize().unwrap();
        let mut target = row(&[(5, 1), (3, 2), (0, 9)]);
        target.eliminate(&pivot, 0);
        let cols: Vec<u32> = target.entries().iter().map(|&(c, _)| c).collect();
        let mut sorted = cols.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(cols, sorted);
        assert!(target.entries().iter().all(|&(_, v)| !v.is_zero()));
    }
}
