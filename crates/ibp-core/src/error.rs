//! Error taxonomy for the reduction engine.
//!
//! Mirrors the five-way split the driver and kernel distinguish between:
//! malformed input (`ConfigError`, `IncompletePropagators`), programmer
//! bugs that should abort (`ShapeMismatch`, `DivByZero`), and the one
//! expected-but-rare arithmetic condition (`ModularSingularity`).

use std::fmt;

/// Errors surfaced anywhere in family preparation, sector bookkeeping, or
/// the reduction kernel.
#[derive(Debug, Clone)]
pub enum IbpError {
    /// Malformed configuration: missing key, wrong arity, symbol collision.
    ConfigError(String),
    /// Arithmetic attempted between tuples of unequal length.
    ShapeMismatch { left: usize, right: usize },
    /// Modular inverse of zero.
    DivByZero,
    /// A pivot coefficient vanished mod `p` during elimination.
    ModularSingularity { column: u32 },
    /// The scalar-product linearization matrix is rank-deficient.
    IncompletePropagators { rank: usize, expected: usize },
}

impl fmt::Display for IbpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IbpError::ConfigError(msg) => write!(f, "{msg}"),
            IbpError::ShapeMismatch { left, right } => {
                write!(f, "shape mismatch: tuples of length {left} and {right}")
            }
            IbpError::DivByZero => write!(f, "division by zero in GF(p)"),
            IbpError::ModularSingularity { column } => {
                write!(f, "pivot vanished mod p at dense column {column}")
            }
            IbpError::IncompletePropagators { rank, expected } => write!(
                f,
                "propagator set is rank-deficient: rank {rank} of {expected} required scalar products"
            ),
        }
    }
}

impl std::error::Error for IbpError {}
