//! `Integral`: a fixed-length signed-integer index tuple, with its three
//! derived projections (`depth`, `rank`, `sector`).

use crate::error::IbpError;
use smallvec::SmallVec;
use std::fmt;

/// Inline capacity before spilling to the heap; covers the common case of
/// one-to-two-loop topologies with up to eight propagators.
const INLINE_PROPS: usize = 8;

/// A multi-index `(a_1, ..., a_n)`, one signed index per propagator.
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct Integral(SmallVec<[i32; INLINE_PROPS]>);

impl Integral {
    pub fn from_slice(indices: &[i32]) -> Self {
        Integral(SmallVec::from_slice(indices))
    }

    pub fn zeros(n: usize) -> Self {
        Integral(SmallVec::from_elem(0, n))
    }

    /// The sector corner `[1, 1, ..., 1, 0, 0, ..., 0]` for the given mask.
    pub fn corner(n: usize, mask: u64) -> Self {
        let mut v = SmallVec::with_capacity(n);
        for i in 0..n {
            v.push(if mask & (1 << i) != 0 { 1 } else { 0 });
        }
        Integral(v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> i32 {
        self.0[i]
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn depth(&self) -> u32 {
        self.0.iter().map(|&a| a.max(0) as u32).sum()
    }

    pub fn rank(&self) -> u32 {
        self.0.iter().map(|&a| (-a).max(0) as u32).sum()
    }

    /// Bitmask with bit `i` set iff `a_i > 0`.
    pub fn sector(&self) -> u64 {
        let mut mask = 0u64;
        for (i, &a) in self.0.iter().enumerate() {
            if a > 0 {
                mask |= 1 << i;
            }
        }
        mask
    }

    fn check_shape(&self, other: &Integral) -> Result<(), IbpError> {
        if self.0.len() != other.0.len() {
            return Err(IbpError::ShapeMismatch {
                left: self.0.len(),
                right: other.0.len(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &Integral) -> Result<Integral, IbpError> {
        self.check_shape(other)?;
        let v = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a + b)
            .collect();
        Ok(Integral(v))
    }

    pub fn sub(&self, other: &Integral) -> Result<Integral, IbpError> {
        self.check_shape(other)?;
        let v = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a - b)
            .collect();
        Ok(Integral(v))
    }
}

impl fmt::Display for Integral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, a) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{a}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_rank_sector() {
        let a = Integral::from_slice(&[2, -1, 0, 1]);
        assert_eq!(a.depth(), 3);
        assert_eq!(a.rank(), 1);
        assert_eq!(a.sector(), 0b1001);
    }

    #[test]
    fn corner_matches_mask() {
        let c = Integral::corner(4, 0b0110);
        assert_eq!(c.as_slice(), &[0, 1, 1, 0]);
    }

    #[test]
    fn add_shape_mismatch() {
        let a = Integral::from_slice(&[1, 1]);
        let b = Integral::from_slice(&[1, 1, 1]);
        assert!(matches!(a.add(&b), Err(IbpError::ShapeMismatch { .. })));
    }

    #[test]
    fn add_sub_round_trip() {
        let a = Integral::from_slice(&[1, -2, 3]);
        let b = Integral::from_slice(&[0, 1, -1]);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.sub(&b).unwrap(), a);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Integral::from_slice(&[1, 0]);
        let b = Integral::from_slice(&[1, 1]);
        assert!(a < b);
    }
}
