//! Sparse linear algebra kernel for the quadratic placer.
//!
//! The placer builds one symmetric positive definite system per placement
//! region and solves it twice (x and y right-hand sides). The kernel is a
//! row-indexed sparse matrix plus a Jacobi-preconditioned conjugate-gradient
//! solver; everything is single precision, synchronous and deterministic.

#![warn(missing_docs)]

pub mod cg;
pub mod sparse;

pub use cg::{solve, JacobiPreconditioner, SolveInfo, SolveStatus, SolverOptions};
pub use sparse::SparseMatrix;
