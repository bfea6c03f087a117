//! Principal component analysis of a small samples × features matrix.
//!
//! Features are z-scored, the samples' Gram matrix is decomposed with Jacobi
//! rotations, and scores are eigenvectors scaled by √eigenvalue.

use std::cmp::Ordering;

use crate::error::TaxbenchError;

const OFF_DIAGONAL_EPSILON: f64 = 1e-24;
const ROTATION_EPSILON: f64 = 1e-15;
const VARIANCE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct PcaResult {
    /// Scores `[n_samples][n_axes]`.
    pub coordinates: Vec<Vec<f64>>,
    /// Retained eigenvalues, descending.
    pub eigenvalues: Vec<f64>,
    pub proportion_explained: Vec<f64>,
    /// Indices of the input features that survived standardization.
    pub kept_features: Vec<usize>,
}

/// Centers every column and scales it to unit variance. Columns with no
/// variance carry no information and are dropped; the returned indices
/// name the columns that were kept.
pub fn standardize(rows: &[Vec<f64>]) -> (Vec<Vec<f64>>, Vec<usize>) {
    let n = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    if n == 0 {
        return (Vec::new(), Vec::new());
    }
    let n_f = n as f64;

    let mut kept = Vec::new();
    let mut scaled: Vec<Vec<f64>> = vec![Vec::new(); n];
    for col in 0..width {
        let mean = rows.iter().map(|row| row[col]).sum::<f64>() / n_f;
        let variance = rows
            .iter()
            .map(|row| (row[col] - mean).powi(2))
            .sum::<f64>()
            / n_f;
        if variance <= VARIANCE_EPSILON {
            continue;
        }
        let sd = variance.sqrt();
        kept.push(col);
        for (out, row) in scaled.iter_mut().zip(rows) {
            out.push((row[col] - mean) / sd);
        }
    }
    (scaled, kept)
}

pub fn pca(rows: &[Vec<f64>], n_axes: usize) -> Result<PcaResult, TaxbenchError> {
    let n = rows.len();
    if n < 2 {
        return Err(TaxbenchError::Analysis(
            "PCA requires at least 2 samples".to_string(),
        ));
    }
    if rows.iter().any(|row| row.len() != rows[0].len()) {
        return Err(TaxbenchError::Analysis(
            "PCA input rows have different lengths".to_string(),
        ));
    }

    let (scaled, kept_features) = standardize(rows);
    if kept_features.is_empty() {
        return Err(TaxbenchError::Analysis(
            "no feature varies between samples".to_string(),
        ));
    }
    let k = n_axes.min(n - 1).min(kept_features.len());

    let mut gram = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let dot: f64 = scaled[i].iter().zip(&scaled[j]).map(|(a, b)| a * b).sum();
            gram[i * n + j] = dot;
            gram[j * n + i] = dot;
        }
    }

    let (eigenvalues, eigenvectors) = jacobi_eigen(&gram, n);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigenvalues[b]
            .partial_cmp(&eigenvalues[a])
            .unwrap_or(Ordering::Equal)
    });
    let sorted: Vec<f64> = order.iter().map(|&i| eigenvalues[i]).collect();

    let positive_sum: f64 = sorted.iter().filter(|&&v| v > 0.0).sum();
    let proportion_explained = sorted[..k]
        .iter()
        .map(|&v| {
            if positive_sum > 0.0 {
                v.max(0.0) / positive_sum
            } else {
                0.0
            }
        })
        .collect();

    let mut coordinates = vec![vec![0.0; k]; n];
    for axis in 0..k {
        let col = order[axis];
        let scale = sorted[axis].max(0.0).sqrt();
        for (sample, coords) in coordinates.iter_mut().enumerate() {
            coords[axis] = eigenvectors[sample * n + col] * scale;
        }
    }

    Ok(PcaResult {
        coordinates,
        eigenvalues: sorted[..k].to_vec(),
        proportion_explained,
        kept_features,
    })
}

/// Eigendecomposition of a symmetric row-major `n × n` matrix. Returns the
/// eigenvalues and the row-major eigenvector matrix (one vector per column).
#[allow(clippy::many_single_char_names)]
fn jacobi_eigen(matrix: &[f64], n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut a = matrix.to_vec();
    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    for _sweep in 0..100 * n {
        let mut off_diag = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                off_diag += a[i * n + j] * a[i * n + j];
            }
        }
        if off_diag < OFF_DIAGONAL_EPSILON {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq.abs() < ROTATION_EPSILON {
                    continue;
                }
                let app = a[p * n + p];
                let aqq = a[q * n + q];
                let tau = (aqq - app) / (2.0 * apq);
                let t = if tau.abs() > 1e15 {
                    1.0 / (2.0 * tau)
                } else {
                    tau.signum() / (tau.abs() + (1.0 + tau * tau).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;

                a[p * n + p] = app - t * apq;
                a[q * n + q] = aqq + t * apq;
                a[p * n + q] = 0.0;
                a[q * n + p] = 0.0;
                for r in 0..n {
                    if r != p && r != q {
                        let arp = a[r * n + p];
                        let arq = a[r * n + q];
                        a[r * n + p] = c * arp - s * arq;
                        a[p * n + r] = a[r * n + p];
                        a[r * n + q] = s * arp + c * arq;
                        a[q * n + r] = a[r * n + q];
                    }
                }
                for r in 0..n {
                    let vrp = v[r * n + p];
                    let vrq = v[r * n + q];
                    v[r * n + p] = c * vrp - s * vrq;
                    v[r * n + q] = s * vrp + c * vrq;
                }
            }
        }
    }

    ((0..n).map(|i| a[i * n + i]).collect(), v)
}
