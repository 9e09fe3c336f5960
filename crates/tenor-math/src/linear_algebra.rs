//! Linear algebra utilities.
//!
//! Provides the dense LU solve used by the Newton vector root finder.
//! Singularity is detected explicitly so callers can distinguish an
//! ill-conditioned calibration system from plain non-convergence.

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector};

/// Pivot threshold below which a matrix is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-13;

/// Performs LU decomposition with partial pivoting.
///
/// Returns the permuted, packed LU factors and the row permutation such
/// that `P * A = L * U`. The unit lower-triangular factor is stored below
/// the diagonal, the upper factor on and above it.
///
/// # Errors
///
/// Returns [`MathError::SingularMatrix`] if a pivot falls below the
/// tolerance, and [`MathError::InvalidInput`] for a non-square matrix.
pub fn lu_decomposition(matrix: &DMatrix<f64>) -> MathResult<(DMatrix<f64>, Vec<usize>)> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(MathError::invalid_input(
            "Matrix must be square for LU decomposition",
        ));
    }

    let mut lu = matrix.clone();
    let mut perm: Vec<usize> = (0..n).collect();

    for k in 0..n {
        // Partial pivot: largest magnitude in column k at or below the diagonal
        let mut max_row = k;
        for i in k + 1..n {
            if lu[(i, k)].abs() > lu[(max_row, k)].abs() {
                max_row = i;
            }
        }
        if max_row != k {
            lu.swap_rows(k, max_row);
            perm.swap(k, max_row);
        }

        let pivot = lu[(k, k)];
        if pivot.abs() < PIVOT_TOLERANCE {
            return Err(MathError::SingularMatrix);
        }

        for i in k + 1..n {
            let factor = lu[(i, k)] / pivot;
            lu[(i, k)] = factor;
            for j in k + 1..n {
                let update = factor * lu[(k, j)];
                lu[(i, j)] -= update;
            }
        }
    }

    Ok((lu, perm))
}

/// Solves a linear system `Ax = b` using LU decomposition.
///
/// # Errors
///
/// Returns [`MathError::DimensionMismatch`] if shapes are incompatible and
/// [`MathError::SingularMatrix`] if the matrix cannot be factored.
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(MathError::invalid_input("Matrix must be square"));
    }
    if n != b.len() {
        return Err(MathError::DimensionMismatch {
            rows1: n,
            cols1: n,
            rows2: b.len(),
            cols2: 1,
        });
    }

    let (lu, perm) = lu_decomposition(a)?;

    // Forward substitution on the permuted right-hand side: Ly = Pb
    let mut y = DVector::zeros(n);
    for i in 0..n {
        let mut sum = b[perm[i]];
        for j in 0..i {
            sum -= lu[(i, j)] * y[j];
        }
        y[i] = sum;
    }

    // Back substitution: Ux = y
    let mut x = DVector::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in i + 1..n {
            sum -= lu[(i, j)] * x[j];
        }
        x[i] = sum / lu[(i, i)];
    }

    Ok(x)
}
