//! Feature preparation and ordinary least squares on trailing windows.

use ndarray::{s, Array1, Array2, Axis};

/// Build the training set: row i holds `closes[i..i+lookback]` as
/// features with `closes[i+lookback]` as its label, one row per
/// forecastable index.
pub(crate) fn window_matrix(closes: &[f64], lookback: usize) -> (Array2<f64>, Array1<f64>) {
    let rows = closes.len() - lookback;
    let mut features = Array2::zeros((rows, lookback));
    let mut labels = Array1::zeros(rows);

    for i in 0..rows {
        for j in 0..lookback {
            features[[i, j]] = closes[i + j];
        }
        labels[i] = closes[i + lookback];
    }

    (features, labels)
}

/// Per-column standardization statistics computed from the training
/// set only, applied to both training rows and the prediction window.
#[derive(Debug, Clone)]
pub(crate) struct Standardizer {
    means: Array1<f64>,
    stds: Array1<f64>,
}

impl Standardizer {
    /// Population mean/std per column. A column whose std is zero (to
    /// relative tolerance) keeps its raw values at transform time, the
    /// contract for degenerate input, so no division by zero occurs.
    pub(crate) fn fit(features: &Array2<f64>) -> Self {
        let rows = features.nrows() as f64;
        let means = features.sum_axis(Axis(0)) / rows;

        let mut stds = Array1::zeros(features.ncols());
        for (j, column) in features.axis_iter(Axis(1)).enumerate() {
            let variance = column
                .iter()
                .map(|value| (value - means[j]).powi(2))
                .sum::<f64>()
                / rows;
            stds[j] = variance.sqrt();
        }

        Self { means, stds }
    }

    fn is_degenerate(&self, column: usize) -> bool {
        self.stds[column] < 1e-12 * self.means[column].abs().max(1.0)
    }

    fn scale(&self, column: usize, value: f64) -> f64 {
        if self.is_degenerate(column) {
            value
        } else {
            (value - self.means[column]) / self.stds[column]
        }
    }

    pub(crate) fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        let mut scaled = features.clone();
        for ((_, j), value) in scaled.indexed_iter_mut() {
            *value = self.scale(j, *value);
        }
        scaled
    }

    pub(crate) fn transform_row(&self, row: &[f64]) -> Array1<f64> {
        row.iter()
            .enumerate()
            .map(|(j, &value)| self.scale(j, value))
            .collect()
    }
}

/// Fitted OLS model; `coefficients[0]` is the intercept.
#[derive(Debug, Clone)]
pub(crate) struct OlsModel {
    coefficients: Array1<f64>,
}

impl OlsModel {
    /// Fit via the normal equations. On full-rank input this
    /// reproduces the closed-form OLS solution to float precision;
    /// collinear columns (the degenerate raw-value fallback plus the
    /// intercept) surface as near-zero pivots whose coefficients are
    /// zeroed so the fit still completes.
    pub(crate) fn fit(features: &Array2<f64>, labels: &Array1<f64>) -> Self {
        let design = with_intercept(features);
        let normal = design.t().dot(&design);
        let moment = design.t().dot(labels);

        Self {
            coefficients: solve_symmetric(normal, moment),
        }
    }

    pub(crate) fn predict_row(&self, row: &Array1<f64>) -> f64 {
        self.coefficients[0]
            + self
                .coefficients
                .slice(s![1..])
                .iter()
                .zip(row.iter())
                .map(|(beta, x)| beta * x)
                .sum::<f64>()
    }

    /// Mean squared error of the fit over its own training set.
    pub(crate) fn training_mse(&self, features: &Array2<f64>, labels: &Array1<f64>) -> f64 {
        let design = with_intercept(features);
        let fitted = design.dot(&self.coefficients);
        let residuals = labels - &fitted;
        residuals.mapv(|r| r * r).mean().unwrap_or(0.0)
    }
}

fn with_intercept(features: &Array2<f64>) -> Array2<f64> {
    let mut design = Array2::ones((features.nrows(), features.ncols() + 1));
    design.slice_mut(s![.., 1..]).assign(features);
    design
}

/// Gaussian elimination with partial pivoting; near-zero pivots zero
/// the corresponding unknown instead of dividing.
fn solve_symmetric(mut a: Array2<f64>, mut b: Array1<f64>) -> Array1<f64> {
    let n = a.nrows();
    let scale = a.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = 1e-12 * scale;
    let mut skipped = vec![false; n];

    for k in 0..n {
        let mut pivot = k;
        for row in (k + 1)..n {
            if a[[row, k]].abs() > a[[pivot, k]].abs() {
                pivot = row;
            }
        }

        if a[[pivot, k]].abs() <= tolerance {
            skipped[k] = true;
            continue;
        }

        if pivot != k {
            for col in 0..n {
                a.swap([pivot, col], [k, col]);
            }
            b.swap(pivot, k);
        }

        for row in (k + 1)..n {
            let factor = a[[row, k]] / a[[k, k]];
            if factor == 0.0 {
                continue;
            }
            for col in k..n {
                a[[row, col]] -= factor * a[[k, col]];
            }
            b[row] -= factor * b[k];
        }
    }

    let mut x = Array1::zeros(n);
    for k in (0..n).rev() {
        if skipped[k] {
            continue;
        }
        let mut sum = b[k];
        for col in (k + 1)..n {
            sum -= a[[k, col]] * x[col];
        }
        x[k] = sum / a[[k, k]];
    }

    x
}
