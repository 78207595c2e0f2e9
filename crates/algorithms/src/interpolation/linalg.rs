//! Small dense linear solves for kriging and least-squares systems.

use ndarray::{Array1, Array2};
use windmesh_core::{Error, Result};

/// Pivot magnitude below which a system is treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
///
/// Specialised for the small systems built here (kriging with 2–40
/// unknowns, 2×2/3×3 normal equations). Consumes its inputs.
///
/// # Errors
/// `Computation` if a pivot vanishes (relative to the largest entry of `A`).
pub(crate) fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    if a.nrows() != n || a.ncols() != n {
        return Err(Error::Computation(format!(
            "system shape {:?} does not match right-hand side of length {}",
            a.shape(),
            n
        )));
    }

    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);

    for col in 0..n {
        let (max_row, max_val) = (col..n)
            .map(|row| (row, a[[row, col]].abs()))
            .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if !(max_val > SINGULAR_EPS * scale) {
            return Err(Error::Computation(format!(
                "singular {n}x{n} system (pivot {max_val:.3e} at column {col})"
            )));
        }

        if max_row != col {
            for j in 0..n {
                a.swap([col, j], [max_row, j]);
            }
            b.swap(col, max_row);
        }

        let pivot = a[[col, col]];
        for row in (col + 1)..n {
            let factor = a[[row, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            a[[row, col]] = 0.0;
            for j in (col + 1)..n {
                a[[row, j]] -= factor * a[[col, j]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for col in (0..n).rev() {
        let mut sum = b[col];
        for j in (col + 1)..n {
            sum -= a[[col, j]] * x[j];
        }
        x[col] = sum / a[[col, col]];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(Error::Computation("non-finite solution".into()));
    }
    Ok(x)
}
