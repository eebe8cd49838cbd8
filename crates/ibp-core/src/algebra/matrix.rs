//! Dense linear algebra over `ModP` (used by `_compute_sps`'s
//! linearisation matrix and by `TrivialSectorOracle`'s consistency check),
//! plus determinant/adjugate of small matrices of `Poly` entries (used by
//! `_compute_symanzik`).
//!
//! The `Poly` determinant/adjugate routines apply the adjugate identity
//! `adj(M) = det(M) * M^-1` to compute the Symanzik `F` polynomial without
//! ever dividing in the polynomial ring -- `M` has polynomial (not just
//! numeric) entries there, so ordinary Gauss-Jordan inversion does not
//! apply.

use crate::algebra::poly::Poly;
use crate::error::IbpError;
use crate::modp::ModP;

/// A dense `rows x cols` matrix of `ModP` entries, row-major.
#[derive(Clone, Debug)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<ModP>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![ModP::zero(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> ModP {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: ModP) {
        self.data[r * self.cols + c] = value;
    }

    /// Row rank via Gaussian elimination with any non-zero pivot.
    pub fn rank(&self) -> usize {
        let mut m = self.clone();
        let mut pivot_row = 0;
        for col in 0..m.cols {
            if pivot_row >= m.rows {
                break;
            }
            let Some(pivot) = (pivot_row..m.rows).find(|&r| !m.get(r, col).is_zero()) else {
                continue;
            };
            m.swap_rows(pivot_row, pivot);
            let inv = m.get(pivot_row, col).inverse().expect("non-zero pivot");
            m.scale_row(pivot_row, inv);
            for r in 0..m.rows {
                if r == pivot_row {
                    continue;
                }
                let factor = m.get(r, col);
                if !factor.is_zero() {
                    m.add_scaled_row(r, pivot_row, -factor);
                }
            }
            pivot_row += 1;
        }
        pivot_row
    }

    /// Gauss-Jordan inverse. Fails with `IncompletePropagators` (the only
    /// caller of this routine is the `_compute_sps` linearisation, where a
    /// singular matrix means the propagator set cannot be inverted to
    /// scalar products) carrying the observed rank.
    pub fn inverse(&self) -> Result<Matrix, IbpError> {
        assert_eq!(self.rows, self.cols, "inverse requires a square matrix");
        let n = self.rows;
        let mut left = self.clone();
        let mut right = Matrix::identity(n);
        for col in 0..n {
            let Some(pivot) = (col..n).find(|&r| !left.get(r, col).is_zero()) else {
                return Err(IbpError::IncompletePropagators {
                    rank: left.rank(),
                    expected: n,
                });
            };
            left.swap_rows(col, pivot);
            right.swap_rows(col, pivot);
            let inv = left.get(col, col).inverse().expect("non-zero pivot");
            left.scale_row(col, inv);
            right.scale_row(col, inv);
            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = left.get(r, col);
                if !factor.is_zero() {
                    left.add_scaled_row(r, col, -factor);
                    right.add_scaled_row(r, col, -factor);
                }
            }
        }
        Ok(right)
    }

    /// Whether the augmented system `[self | rhs]` is consistent (has at
    /// least one solution over `ModP`).
    pub fn is_consistent(&self, rhs: &[ModP]) -> bool {
        assert_eq!(rhs.len(), self.rows);
        let mut m = self.clone();
        let mut b = rhs.to_vec();
        let mut pivot_row = 0;
        for col in 0..m.cols {
            if pivot_row >= m.rows {
                break;
            }
            let Some(pivot) = (pivot_row..m.rows).find(|&r| !m.get(r, col).is_zero()) else {
                continue;
            };
            m.swap_rows(pivot_row, pivot);
            b.swap(pivot_row, pivot);
            let inv = m.get(pivot_row, col).inverse().expect("non-zero pivot");
            m.scale_row(pivot_row, inv);
            b[pivot_row] = b[pivot_row] * inv;
            for r in 0..m.rows {
                if r == pivot_row {
                    continue;
                }
                let factor = m.get(r, col);
                if !factor.is_zero() {
                    m.add_scaled_row(r, pivot_row, -factor);
                    b[r] = b[r] - factor * b[pivot_row];
                }
            }
            pivot_row += 1;
        }
        for r in pivot_row..m.rows {
            if (0..m.cols).all(|c| m.get(r, c).is_zero()) && !b[r].is_zero() {
                return false;
            }
        }
        true
    }

    fn identity(n: usize) -> Matrix {
        let mut m = Matrix::zeros(n, n);
        for i in 0..n {
            m.set(i, i, ModP::one());
        }
        m
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    fn scale_row(&mut self, r: usize, factor: ModP) {
        for c in 0..self.cols {
            let v = self.get(r, c);
            self.set(r, c, v * factor);
        }
    }

    /// `row[target] += factor * row[source]`.
    fn add_scaled_row(&mut self, target: usize, source: usize, factor: ModP) {
        for c in 0..self.cols {
            let v = self.get(target, c) + factor * self.get(source, c);
            self.set(target, c, v);
        }
    }
}

/// Determinant of a square matrix of `Poly` entries, via Laplace expansion
/// along the first row. Quadratic in the factorial of `n`; fine for the
/// loop counts (`n = L`, typically 1-3) this is ever called with.
pub fn poly_det(m: &[Vec<Poly>]) -> Poly {
    let n = m.len();
    match n {
        0 => Poly::constant(ModP::one()),
        1 => m[0][0].clone(),
        _ => {
            let mut det = Poly::zero();
            for col in 0..n {
                let minor = submatrix(m, 0, col);
                let term = m[0][col].mul(&poly_det(&minor));
                det = if col % 2 == 0 { det.add(&term) } else { det.sub(&term) };
            }
            det
        }
    }
}

/// The classical adjugate, `adj(M)[i][j] = (-1)^{i+j} * det(minor(j, i))`,
/// satisfying `M * adj(M) == det(M) * I`. Used to compute `M^-1 * U` as
/// `adj(M)` without dividing by `U = det(M)` in the polynomial ring.
pub fn poly_adjugate(m: &[Vec<Poly>]) -> Vec<Vec<Poly>> {
    let n = m.len();
    let mut adj = vec![vec![Poly::zero(); n]; n];
    for i in 0..n {
        for j in 0..n {
            let minor = submatrix(m, j, i);
            let cofactor = poly_det(&minor);
            adj[i][j] = if (i + j) % 2 == 0 {
                cofactor
            } else {
                cofactor.neg()
            };
        }
    }
    adj
}

fn submatrix(m: &[Vec<Poly>], skip_row: usize, skip_col: usize) -> Vec<Vec<Poly>> {
    m.iter()
        .enumerate()
        .filter(|&(r, _)| r != skip_row)
        .map(|(_, row)| {
            row.iter()
                .enumerate()
                .filter(|&(c, _)| c != skip_col)
                .map(|(_, v)| v.clone())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_of_identity_is_identity() {
        let id = Matrix::identity(3);
        let inv = id.inverse().unwrap();
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(inv.get(r, c), id.get(r, c));
            }
        }
    }

    #[test]
    fn singular_matrix_fails() {
        let mut m = Matrix::zeros(2, 2);
        m.set(0, 0, ModP::one());
        m.set(0, 1, ModP::from_i64(2));
        m.set(1, 0, ModP::from_i64(2));
        m.set(1, 1, ModP::from_i64(4));
        assert!(matches!(
            m.inverse(),
            Err(IbpError::IncompletePropagators { .. })
        ));
    }

    #[test]
    fn rank_of_full_rank_matrix() {
        let mut m = Matrix::zeros(2, 2);
        m.set(0, 0, ModP::one());
        m.set(1, 1, ModP::one());
        assert_eq!(m.rank(), 2);
    }

    #[test]
    fn poly_det_2x2_matches_formula() {
        let mut reg = crate::symbol::SymbolRegistry::new();
        let a = Poly::symbol(reg.intern("a"));
        let b = Poly::symbol(reg.intern("b"));
        let c = Poly::symbol(reg.intern("c"));
        let d = Poly::symbol(reg.intern("d"));
        let m = vec![vec![a.clone(), b.clone()], vec![c.clone(), d.clone()]];
        let det = poly_det(&m);
        assert_eq!(det, a.mul(&d).sub(&b.mul(&c)));
    }
}
