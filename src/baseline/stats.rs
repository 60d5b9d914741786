//! Daily-bar statistics
//!
//! Pure functions over chronologically sorted daily bars. Prices stay in
//! `Decimal` for the averages; return series move to `f64` for variance
//! and covariance.

use rust_decimal::Decimal;

use crate::provider::DailyBar;

/// Sort bars oldest first
pub fn sort_chronologically(bars: &mut [DailyBar]) {
    bars.sort_by_key(|bar| bar.timestamp);
}

/// Trailing `window` bars, or `None` when fewer are available
pub fn trailing(bars: &[DailyBar], window: usize) -> Option<&[DailyBar]> {
    if window == 0 || bars.len() < window {
        return None;
    }
    Some(&bars[bars.len() - window..])
}

/// Simple moving average of the last `window` closes
pub fn moving_average(bars: &[DailyBar], window: usize) -> Option<Decimal> {
    let tail = trailing(bars, window)?;
    let sum: Decimal = tail.iter().map(|bar| bar.close).sum();
    sum.checked_div(Decimal::from(window))
}

/// Mean of `high - low` over the last `window` bars
pub fn swing_average(bars: &[DailyBar], window: usize) -> Option<Decimal> {
    let tail = trailing(bars, window)?;
    let sum: Decimal = tail.iter().map(|bar| bar.high - bar.low).sum();
    sum.checked_div(Decimal::from(window))
}

/// Closes of the last `window + 1` bars as `f64`, enough for `window` returns
pub fn return_closes(bars: &[DailyBar], window: usize) -> Vec<f64> {
    let start = bars.len().saturating_sub(window + 1);
    bars[start..]
        .iter()
        .map(|bar| bar.close.try_into().unwrap_or(0.0))
        .collect()
}

/// Simple returns `(c[i] - c[i-1]) / c[i-1]`; zero where the prior close is zero
pub fn returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|pair| {
            if pair[0] == 0.0 {
                0.0
            } else {
                (pair[1] - pair[0]) / pair[0]
            }
        })
        .collect()
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample variance (n - 1 denominator); zero below two points
pub fn sample_variance(xs: &[f64]) -> f64 {
    sample_covariance(xs, xs)
}

/// Sample covariance over the common leading length; zero below two points
pub fn sample_covariance(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let (mx, my) = (mean(xs), mean(ys));
    let sum: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    sum / (n - 1) as f64
}

/// Beta of `ticker` returns against `benchmark` returns
///
/// Both series are truncated from the trailing end to the shorter length.
/// Zero when fewer than `min_overlap` returns align or the benchmark
/// variance is zero.
pub fn beta(ticker: &[f64], benchmark: &[f64], benchmark_variance: f64, min_overlap: usize) -> f64 {
    let n = ticker.len().min(benchmark.len());
    if n < min_overlap.max(2) || benchmark_variance == 0.0 || !benchmark_variance.is_finite() {
        return 0.0;
    }

    let ticker = &ticker[ticker.len() - n..];
    let benchmark = &benchmark[benchmark.len() - n..];
    let beta = sample_covariance(ticker, benchmark) / benchmark_variance;

    if beta.is_finite() {
        beta
    } else {
        0.0
    }
}
