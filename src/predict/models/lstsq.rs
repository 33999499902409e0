//! Ordinary least squares through the normal equations.

use super::ModelError;

/// Solve `min ||X b - y||²` for `b`, with `X` given as rows of features.
///
/// The normal matrix `XᵀX` is symmetric positive semi-definite, so it is
/// eliminated without row exchanges. A pivot that collapses to (relative)
/// zero marks a linearly dependent feature; its coefficient is fixed at zero
/// and the remaining features are solved as usual.
pub fn solve(rows: &[Vec<f64>], y: &[f64]) -> Result<Vec<f64>, ModelError> {
    let p = rows.first().map_or(0, Vec::len);
    if p == 0 {
        return Ok(Vec::new());
    }

    let mut a = vec![vec![0.0; p]; p];
    let mut b = vec![0.0; p];
    for (row, &target) in rows.iter().zip(y) {
        for i in 0..p {
            b[i] += row[i] * target;
            for j in 0..p {
                a[i][j] += row[i] * row[j];
            }
        }
    }

    let scale = (0..p).map(|i| a[i][i].abs()).fold(0.0, f64::max);
    let tol = 1e-10 * scale.max(f64::MIN_POSITIVE);
    let mut dependent = vec![false; p];

    for k in 0..p {
        if a[k][k].abs() <= tol {
            dependent[k] = true;
            continue;
        }
        for i in (k + 1)..p {
            let f = a[i][k] / a[k][k];
            if f == 0.0 {
                continue;
            }
            for j in k..p {
                a[i][j] -= f * a[k][j];
            }
            b[i] -= f * b[k];
        }
    }

    let mut coef = vec![0.0; p];
    for k in (0..p).rev() {
        if dependent[k] {
            continue;
        }
        let tail: f64 = ((k + 1)..p).map(|j| a[k][j] * coef[j]).sum();
        coef[k] = (b[k] - tail) / a[k][k];
    }

    if coef.iter().any(|c| !c.is_finite()) {
        return Err(ModelError::Numerical(
            "least-squares solution is not finite".into(),
        ));
    }
    Ok(coef)
}
