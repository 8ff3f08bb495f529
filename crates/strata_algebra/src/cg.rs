//! Jacobi-preconditioned conjugate-gradient solver.
//!
//! Solves `A x = b` for the symmetric positive definite systems the placer
//! produces. Single precision is plenty at placement scale; the iteration
//! cap and the relative residual tolerance are tunable through
//! [`SolverOptions`].

use crate::sparse::SparseMatrix;

/// How a solve terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The relative residual dropped below the tolerance.
    Converged,
    /// The iteration cap was reached before convergence.
    MaxIterations,
    /// The iteration lost positive definiteness (zero pivot, poisoned
    /// preconditioner).
    Breakdown,
}

/// Result summary of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveInfo {
    /// Termination status.
    pub status: SolveStatus,
    /// Iterations actually run.
    pub iterations: usize,
    /// Final relative residual `‖r‖ / ‖b‖`.
    pub residual: f32,
}

/// Solver tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    /// Relative residual tolerance.
    pub tolerance: f32,
    /// Optional hard iteration cap; `None` selects `max(n, min(4n, 10000))`.
    pub max_iterations: Option<usize>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: None,
        }
    }
}

impl SolverOptions {
    fn iteration_cap(&self, n: usize) -> usize {
        match self.max_iterations {
            Some(cap) => cap.max(n),
            None => n.max((4 * n).min(10_000)),
        }
    }
}

/// Inverse-diagonal (Jacobi) preconditioner.
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<f32>,
    poisoned: bool,
}

impl JacobiPreconditioner {
    /// Builds the preconditioner from the matrix diagonal.
    ///
    /// A zero or negative diagonal entry marks the preconditioner poisoned;
    /// solving with it reports [`SolveStatus::Breakdown`] since the matrix
    /// cannot be positive definite.
    pub fn new(matrix: &SparseMatrix) -> Self {
        let mut poisoned = false;
        let inv_diag = (0..matrix.dim())
            .map(|i| {
                let d = matrix.diagonal(i);
                if d > 0.0 {
                    1.0 / d
                } else {
                    poisoned = true;
                    1.0
                }
            })
            .collect();
        Self { inv_diag, poisoned }
    }

    fn apply(&self, r: &[f32], z: &mut [f32]) {
        for i in 0..r.len() {
            z[i] = r[i] * self.inv_diag[i];
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Runs preconditioned CG on `A x = b`.
///
/// `x` supplies the initial guess; it is resized and zeroed when its length
/// does not match the system. The solve is strictly sequential, so repeated
/// runs on the same input produce bit-identical results.
pub fn solve(
    a: &SparseMatrix,
    b: &[f32],
    x: &mut Vec<f32>,
    precond: &JacobiPreconditioner,
    options: &SolverOptions,
) -> SolveInfo {
    let n = a.dim();
    assert_eq!(b.len(), n);
    if x.len() != n {
        x.clear();
        x.resize(n, 0.0);
    }

    if precond.poisoned {
        return SolveInfo {
            status: SolveStatus::Breakdown,
            iterations: 0,
            residual: f32::INFINITY,
        };
    }

    let b_norm = norm(b);
    if b_norm == 0.0 {
        x.iter_mut().for_each(|v| *v = 0.0);
        return SolveInfo {
            status: SolveStatus::Converged,
            iterations: 0,
            residual: 0.0,
        };
    }

    let mut r = vec![0.0f32; n];
    let mut z = vec![0.0f32; n];
    let mut q = vec![0.0f32; n];

    a.mul_vec(x, &mut r);
    for i in 0..n {
        r[i] = b[i] - r[i];
    }

    let mut residual = norm(&r) / b_norm;
    if residual <= options.tolerance {
        return SolveInfo {
            status: SolveStatus::Converged,
            iterations: 0,
            residual,
        };
    }

    precond.apply(&r, &mut z);
    let mut p = z.clone();
    let mut rho = dot(&r, &z);

    let cap = options.iteration_cap(n);
    for iteration in 1..=cap {
        a.mul_vec(&p, &mut q);
        let pq = dot(&p, &q);
        if pq <= 0.0 || !pq.is_finite() {
            log::debug!("cg breakdown at iteration {iteration}: p'Ap = {pq}");
            return SolveInfo {
                status: SolveStatus::Breakdown,
                iterations: iteration,
                residual,
            };
        }
        let alpha = rho / pq;
        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * q[i];
        }

        residual = norm(&r) / b_norm;
        if residual <= options.tolerance {
            return SolveInfo {
                status: SolveStatus::Converged,
                iterations: iteration,
                residual,
            };
        }

        precond.apply(&r, &mut z);
        let rho_next = dot(&r, &z);
        if rho_next == 0.0 || !rho_next.is_finite() {
            return SolveInfo {
                status: SolveStatus::Breakdown,
                iterations: iteration,
                residual,
            };
        }
        let beta = rho_next / rho;
        for i in 0..n {
            p[i] = z[i] + beta * p[i];
        }
        rho = rho_next;
    }

    SolveInfo {
        status: SolveStatus::MaxIterations,
        iterations: cap,
        residual,
    }
}
