//! ARMA fitting via conditional least squares
//!
//! Hannan-Rissanen two-stage estimation: a long autoregression first
//! estimates the innovation sequence, then the ARMA(p, q) parameters come
//! from a linear regression on lagged values and lagged innovations. Pure
//! linear algebra, no iterative optimizer, so every candidate fit terminates
//! and a singular design simply reports "no fit" instead of diverging.

/// One fitted ARMA(p, q) candidate on a (possibly differenced) series
#[derive(Debug, Clone)]
pub struct FittedArma {
    pub p: usize,
    pub q: usize,
    pub intercept: f64,
    pub phi: Vec<f64>,
    pub theta: Vec<f64>,
    /// Akaike information criterion; lower is better
    pub aic: f64,
    /// One-step-ahead forecast on the fitted scale
    pub one_step: f64,
}

/// Fit ARMA(p, q) with intercept on `w` by conditional least squares
///
/// Returns `None` when the series is too short for the requested order or
/// the design matrix is singular. Callers treat `None` as "skip this
/// candidate", never as a hard failure.
pub fn fit_arma(w: &[f64], p: usize, q: usize) -> Option<FittedArma> {
    let m = w.len();
    let start = p.max(q);
    let unknowns = p + q + 1;

    // Require at least one more observation than unknowns
    if m <= start || m - start < unknowns + 1 {
        return None;
    }

    let innovations = if q > 0 {
        estimate_innovations(w)
    } else {
        vec![0.0; m]
    };

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(m - start);
    let mut targets: Vec<f64> = Vec::with_capacity(m - start);
    for t in start..m {
        let mut row = Vec::with_capacity(unknowns);
        row.push(1.0);
        for i in 1..=p {
            row.push(w[t - i]);
        }
        for j in 1..=q {
            row.push(innovations[t - j]);
        }
        rows.push(row);
        targets.push(w[t]);
    }

    let coef = least_squares(&rows, &targets)?;
    let intercept = coef[0];
    let phi = coef[1..=p].to_vec();
    let theta = coef[p + 1..].to_vec();

    // Conditional residual recursion with the fitted parameters; residuals
    // before `start` are taken as zero
    let mut resid = vec![0.0; m];
    for t in start..m {
        let mut pred = intercept;
        for (i, ph) in phi.iter().enumerate() {
            pred += ph * w[t - 1 - i];
        }
        for (j, th) in theta.iter().enumerate() {
            pred += th * resid[t - 1 - j];
        }
        resid[t] = w[t] - pred;
    }

    let n_eff = (m - start) as f64;
    let sse: f64 = resid[start..].iter().map(|r| r * r).sum();
    let sigma2 = (sse / n_eff).max(1e-12);
    let aic = n_eff * sigma2.ln() + 2.0 * unknowns as f64;

    let mut one_step = intercept;
    for (i, ph) in phi.iter().enumerate() {
        one_step += ph * w[m - 1 - i];
    }
    for (j, th) in theta.iter().enumerate() {
        one_step += th * resid[m - 1 - j];
    }

    if !one_step.is_finite() || !aic.is_finite() {
        return None;
    }

    Some(FittedArma {
        p,
        q,
        intercept,
        phi,
        theta,
        aic,
        one_step,
    })
}

/// Estimate the innovation sequence with a long autoregression
///
/// Falls back to mean-centered deviations when the series is too short for
/// the long AR, which keeps low-order MA candidates alive on small windows.
fn estimate_innovations(w: &[f64]) -> Vec<f64> {
    let m = w.len();
    let mean = w.iter().sum::<f64>() / m as f64;
    let h = ((m as f64).sqrt() as usize).clamp(1, 8);

    if m < 2 * (h + 1) {
        return w.iter().map(|v| v - mean).collect();
    }

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(m - h);
    let mut targets: Vec<f64> = Vec::with_capacity(m - h);
    for t in h..m {
        let mut row = Vec::with_capacity(h + 1);
        row.push(1.0);
        for i in 1..=h {
            row.push(w[t - i]);
        }
        rows.push(row);
        targets.push(w[t]);
    }

    match least_squares(&rows, &targets) {
        Some(coef) => {
            let mut e = vec![0.0; m];
            for t in h..m {
                let mut pred = coef[0];
                for i in 1..=h {
                    pred += coef[i] * w[t - i];
                }
                e[t] = w[t] - pred;
            }
            e
        }
        None => w.iter().map(|v| v - mean).collect(),
    }
}

/// First difference of a series
pub fn difference(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Population variance; 0.0 for series shorter than two points
pub fn variance(series: &[f64]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / series.len() as f64
}

/// Ordinary least squares via normal equations
fn least_squares(rows: &[Vec<f64>], targets: &[f64]) -> Option<Vec<f64>> {
    let k = rows.first()?.len();

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &y) in rows.iter().zip(targets) {
        for i in 0..k {
            xty[i] += row[i] * y;
            for j in i..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    solve_linear_system(xtx, xty)
}

/// Gaussian elimination with partial pivoting; `None` on a singular system
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot_row][col].abs() < 1e-10 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference() {
        assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0]), vec![2.0, 3.0, 4.0]);
        assert!(difference(&[5.0]).is_empty());
    }

    #[test]
    fn test_variance() {
        assert_eq!(variance(&[2.0, 2.0, 2.0]), 0.0);
        assert!((variance(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
        assert_eq!(variance(&[7.0]), 0.0);
    }

    #[test]
    fn test_fit_rejects_short_series() {
        assert!(fit_arma(&[1.0, 2.0, 3.0], 2, 2).is_none());
        assert!(fit_arma(&[], 0, 0).is_none());
    }

    #[test]
    fn test_intercept_only_fit_is_mean() {
        let w = [1.0, 2.0, 3.0, 2.0, 1.0, 3.0];
        let model = fit_arma(&w, 0, 0).unwrap();

        assert!((model.intercept - 2.0).abs() < 1e-9);
        assert!((model.one_step - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_ar1_recovers_trend_structure() {
        // x_t = 0.8 x_{t-1} + 2, converging toward 10
        let mut w = vec![0.0];
        for _ in 0..30 {
            let last = *w.last().unwrap();
            w.push(0.8 * last + 2.0);
        }

        let model = fit_arma(&w, 1, 0).unwrap();
        assert!((model.phi[0] - 0.8).abs() < 0.05);

        let last = *w.last().unwrap();
        let expected = 0.8 * last + 2.0;
        assert!((model.one_step - expected).abs() < 0.1);
    }

    #[test]
    fn test_singular_design_is_skipped() {
        // Constant series: lagged-value column collinear with the intercept
        let w = [4.0; 12];
        assert!(fit_arma(&w, 1, 0).is_none());
    }

    #[test]
    fn test_solve_linear_system() {
        // 2x + y = 5, x - y = 1  →  x = 2, y = 1
        let a = vec![vec![2.0, 1.0], vec![1.0, -1.0]];
        let b = vec![5.0, 1.0];
        let x = solve_linear_system(a, b).unwrap();

        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_solve_singular_system_is_none() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        let b = vec![3.0, 6.0];
        assert!(solve_linear_system(a, b).is_none());
    }
}
