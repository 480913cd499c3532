//! Forecast engine - one-step-ahead prediction with automatic order selection
//!
//! Sensor series are short, gappy, and frequently near-constant (CO₂
//! plateaus for hours), so the engine is built to degrade instead of crash:
//!
//! 1. Nulls are filtered; fewer than 5 valid points → no forecast
//! 2. A degenerate (all-equal) series forecasts its constant directly;
//!    fitting a model there is numerically meaningless
//! 3. Otherwise ARIMA(p, d, q) with `d` chosen by variance-reducing
//!    differencing and `(p, q)` chosen by a stepwise AIC search, every
//!    candidate fit fail-soft
//!
//! Model choice is an implementation detail; callers only ever see
//! `Option<f64>`.

pub mod arima;

use std::collections::HashSet;

/// Hard floor: below this many valid points no model is attempted
pub const MIN_SERIES_LEN: usize = 5;

/// Bounds of the order search space
pub const MAX_AR_ORDER: usize = 5;
pub const MAX_MA_ORDER: usize = 5;
const MAX_DIFF_ORDER: usize = 2;

/// Forecast the next value of a series; `None` means "insufficient or
/// unusable data", never an error
pub fn forecast_next(series: &[Option<f64>]) -> Option<f64> {
    let valid: Vec<f64> = series
        .iter()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect();

    if valid.len() < MIN_SERIES_LEN {
        log::debug!(
            "Forecast unavailable: {} valid points (floor is {})",
            valid.len(),
            MIN_SERIES_LEN
        );
        return None;
    }

    // Degenerate series: the constant IS the forecast
    let first = valid[0];
    if valid.iter().all(|&v| v == first) {
        return Some(first);
    }

    auto_forecast(&valid)
}

/// Difference, search, fit, forecast, un-difference
fn auto_forecast(series: &[f64]) -> Option<f64> {
    // Difference while it keeps shrinking the variance, up to d = 2
    let mut levels: Vec<Vec<f64>> = vec![series.to_vec()];
    while levels.len() <= MAX_DIFF_ORDER {
        let current = levels.last()?;
        if current.len() < 3 {
            break;
        }
        let next = arima::difference(current);
        if arima::variance(&next) < arima::variance(current) {
            levels.push(next);
        } else {
            break;
        }
    }

    let d = levels.len() - 1;
    let best = stepwise_order_search(levels.last()?)?;
    log::debug!(
        "Selected ARIMA({},{},{}) aic={:.2}",
        best.p,
        d,
        best.q,
        best.aic
    );

    // Integrate the differenced forecast back to the original scale: each
    // level contributes its last observed value
    let mut forecast = best.one_step;
    for level in levels[..d].iter().rev() {
        forecast += level.last()?;
    }

    forecast.is_finite().then_some(forecast)
}

/// Stepwise AIC search over (p, q), bounded by the order maxima
///
/// Seeds the usual small candidates, then expands around each new incumbent.
/// Candidates that fail to fit (too few points, singular design) are skipped;
/// the search only fails when no candidate at all survives. The candidate
/// grid is finite, so termination is guaranteed.
fn stepwise_order_search(w: &[f64]) -> Option<arima::FittedArma> {
    let mut pending: Vec<(usize, usize)> = vec![(2, 2), (0, 0), (1, 0), (0, 1)];
    let mut tried: HashSet<(usize, usize)> = HashSet::new();
    let mut best: Option<arima::FittedArma> = None;

    while let Some((p, q)) = pending.pop() {
        if !tried.insert((p, q)) {
            continue;
        }

        let candidate = match arima::fit_arma(w, p, q) {
            Some(c) => c,
            None => continue, // fail-soft: skip, never abort the search
        };

        let improved = best.as_ref().map_or(true, |b| candidate.aic < b.aic);
        if improved {
            for (dp, dq) in [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (-1, -1)] {
                let np = p as isize + dp;
                let nq = q as isize + dq;
                if (0..=MAX_AR_ORDER as isize).contains(&np)
                    && (0..=MAX_MA_ORDER as isize).contains(&nq)
                {
                    pending.push((np as usize, nq as usize));
                }
            }
            best = Some(candidate);
        }
    }

    best
}
