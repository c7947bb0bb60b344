//! Penalised least squares solver.
//!
//! The forecast model is linear in its coefficients once changepoints and
//! Fourier terms are fixed, so fitting reduces to
//!
//! ```text
//! minimize ||y - Xβ||² + Σ λ_j β_j²
//! ```
//!
//! which we solve as an ordinary least squares problem on the augmented system
//! `[X; diag(√λ)] β = [y; 0]`.
//!
//! SVD is used because the design matrix is tall and some columns (late
//! changepoint hinges) can be nearly collinear. Nalgebra's `QR::solve` is
//! intended for square systems and panics on non-square input.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if a strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve `min ||y - Xβ||² + Σ penalties[j] · β_j²`.
///
/// `penalties` must have one entry per column of `x`; zero entries leave the
/// coefficient unpenalised.
pub fn solve_ridge(x: &DMatrix<f64>, y: &DVector<f64>, penalties: &[f64]) -> Option<DVector<f64>> {
    let n = x.nrows();
    let p = x.ncols();
    if penalties.len() != p || y.len() != n {
        return None;
    }

    let extra: Vec<(usize, f64)> = penalties
        .iter()
        .enumerate()
        .filter(|(_, lambda)| **lambda > 0.0)
        .map(|(j, lambda)| (j, lambda.sqrt()))
        .collect();

    let mut aug_x = DMatrix::<f64>::zeros(n + extra.len(), p);
    aug_x.rows_mut(0, n).copy_from(x);
    for (row, &(j, root)) in extra.iter().enumerate() {
        aug_x[(n + row, j)] = root;
    }

    let mut aug_y = DVector::<f64>::zeros(n + extra.len());
    aug_y.rows_mut(0, n).copy_from(y);

    solve_least_squares(&aug_x, &aug_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn ridge_without_penalty_matches_ols() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_ridge(&x, &y, &[0.0, 0.0]).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn ridge_penalty_shrinks_coefficient() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_ridge(&x, &y, &[0.0, 100.0]).unwrap();
        assert!(beta[1].abs() < 3.0);
        assert!(beta[1] > 0.0);
    }

    #[test]
    fn ridge_rejects_mismatched_penalties() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0, 1.0]);
        assert!(solve_ridge(&x, &y, &[1.0]).is_none());
    }
}
