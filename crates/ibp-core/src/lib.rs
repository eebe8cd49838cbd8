//! Integration-by-parts (IBP) reduction engine core.
//!
//! Given a topology (loop/external momenta, propagators, kinematic
//! invariants) and a list of target integrals, derives IBP relation
//! templates from the family definition, enumerates seeds sector by
//! sector, and row-reduces the resulting sparse linear system over
//! `GF(p)` to express every target as a combination of master integrals.
//!
//! [`modp`] (arithmetic), [`integral`] (the multi-index value type),
//! [`sparse_row`] (the equation type shared by the kernel), [`algebra`]
//! (the narrow polynomial/matrix surface standing in for an external
//! CAS), [`family`] (algebraic preparation), [`trivial_sector`] and
//! [`sector_graph`] (sector decomposition), [`seed_generator`] (seed
//! enumeration), [`reduction_kernel`] (Gaussian elimination), and
//! [`driver`] (glue from config to per-sector result files).

pub mod algebra;
pub mod config;
pub mod driver;
pub mod error;
pub mod family;
pub mod ibp_template;
pub mod integral;
pub mod modp;
pub mod reduction_kernel;
pub mod sector_graph;
pub mod seed_generator;
pub mod sparse_row;
pub mod symbol;
pub mod trivial_sector;

pub use error::IbpError;
pub use family::Family;
pub use integral::Integral;
pub use modp::ModP;
