use crate::error::ValidationError;
use nalgebra::{DMatrix, DVector};

/// Returns `diag(1 / v_i^2)`.
///
/// Fails on zero or non-finite entries.
pub fn inverse_square_diag(
    v: &DVector<f64>,
    field: &'static str,
) -> Result<DMatrix<f64>, ValidationError> {
    for (index, &vi) in v.iter().enumerate() {
        if !vi.is_finite() {
            return Err(ValidationError::NotFinite { field, index });
        }
        if vi == 0.0 {
            return Err(ValidationError::ZeroEntry { field, index });
        }
    }
    Ok(DMatrix::from_diagonal(&v.map(|vi| 1.0 / (vi * vi))))
}

/// Returns the block-diagonal matrix `[a 0; 0 b]`.
pub fn block_diag(a: &DMatrix<f64>, b: &DMatrix<f64>) -> DMatrix<f64> {
    let (ra, ca) = a.shape();
    let (rb, cb) = b.shape();
    let mut m = DMatrix::zeros(ra + rb, ca + cb);
    for i in 0..ra {
        for j in 0..ca {
            m[(i, j)] = a[(i, j)];
        }
    }
    for i in 0..rb {
        for j in 0..cb {
            m[(ra + i, ca + j)] = b[(i, j)];
        }
    }
    m
}

pub fn check_len(
    v: &DVector<f64>,
    field: &'static str,
    expected: usize,
) -> Result<(), ValidationError> {
    if v.len() != expected {
        return Err(ValidationError::Dimension {
            field,
            expected,
            actual: v.len(),
        });
    }
    Ok(())
}

pub fn check_finite(v: &DVector<f64>, field: &'static str) -> Result<(), ValidationError> {
    match v.iter().position(|vi| !vi.is_finite()) {
        Some(index) => Err(ValidationError::NotFinite { field, index }),
        None => Ok(()),
    }
}

pub fn check_positive(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(())
}

/// Checks that `m` is an `n`x`n` symmetric positive semi-definite weight.
pub fn check_weight(
    m: &DMatrix<f64>,
    field: &'static str,
    n: usize,
) -> Result<(), ValidationError> {
    if m.nrows() != n {
        return Err(ValidationError::Dimension {
            field,
            expected: n,
            actual: m.nrows(),
        });
    }
    if m.ncols() != n {
        return Err(ValidationError::Dimension {
            field,
            expected: n,
            actual: m.ncols(),
        });
    }
    // column-major storage
    if let Some(index) = m.iter().position(|v| !v.is_finite()) {
        return Err(ValidationError::NotFiniteEntry {
            field,
            row: index % n,
            col: index / n,
        });
    }
    if n == 0 {
        return Ok(());
    }

    let scale = m.amax().max(f64::MIN_POSITIVE);
    let tol = 1e-12 * scale;
    for i in 0..n {
        for j in (i + 1)..n {
            if (m[(i, j)] - m[(j, i)]).abs() > tol {
                return Err(ValidationError::NotSymmetric { field });
            }
        }
    }

    let eigenvalue = m.symmetric_eigenvalues().min();
    if eigenvalue < -tol {
        return Err(ValidationError::NotPositiveSemiDefinite { field, eigenvalue });
    }
    Ok(())
}
