//! The narrow algebra surface `Family` consumes in place of a general
//! symbolic algebra library: sparse polynomials over `GF(p)`, small dense
//! and `Poly`-valued matrix operations, deterministic sampling of free
//! kinematic symbols, and the arithmetic-expression parser for config
//! strings.

pub mod expr_parser;
pub mod matrix;
pub mod poly;
pub mod sample;

pub use matrix::Matrix;
pub use poly::{Monomial, Poly};
