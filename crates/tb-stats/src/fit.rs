use serde::{Deserialize, Serialize};

use crate::{StatsError, mean, sum};

/// Ordinary least-squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub rvalue: f64,
    pub stderr: f64,
    pub intercept_stderr: f64,
}

impl LinearFit {
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

struct Moments {
    x_mean: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

fn moments(x: &[f64], y: &[f64], op: &'static str) -> Result<Moments, StatsError> {
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    let n = x.len();
    let (Some(x_mean), Some(y_mean)) = (mean(x), mean(y)) else {
        return Err(StatsError::NotEnoughValues {
            op,
            required: 2,
            actual: n,
        });
    };

    let products = |f: &dyn Fn(f64, f64) -> f64| {
        let terms = x.iter().zip(y).map(|(&a, &b)| f(a, b)).collect::<Vec<_>>();
        sum(&terms) / n as f64
    };

    Ok(Moments {
        x_mean,
        sxx: products(&|a, _| (a - x_mean).powi(2)),
        syy: products(&|_, b| (b - y_mean).powi(2)),
        sxy: products(&|a, b| (a - x_mean) * (b - y_mean)),
    })
}

/// Pearson correlation coefficient. NaN when either input is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, StatsError> {
    let m = moments(x, y, "pearson")?;
    if x.len() < 2 {
        return Err(StatsError::NotEnoughValues {
            op: "pearson",
            required: 2,
            actual: x.len(),
        });
    }
    let denom = (m.sxx * m.syy).sqrt();
    if denom == 0.0 {
        return Ok(f64::NAN);
    }
    Ok((m.sxy / denom).clamp(-1.0, 1.0))
}

/// Least-squares line through `(x, y)`. Standard errors follow the usual
/// `n - 2` degrees of freedom and are zero for exactly two points.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<LinearFit, StatsError> {
    let m = moments(x, y, "linear_fit")?;
    let n = x.len();
    if n < 2 {
        return Err(StatsError::NotEnoughValues {
            op: "linear_fit",
            required: 2,
            actual: n,
        });
    }
    if m.sxx == 0.0 {
        return Err(StatsError::ConstantInput);
    }

    let slope = m.sxy / m.sxx;
    let y_mean = mean(y).unwrap_or_default();
    let intercept = y_mean - slope * m.x_mean;
    let rvalue = if m.syy == 0.0 {
        0.0
    } else {
        (m.sxy / (m.sxx * m.syy).sqrt()).clamp(-1.0, 1.0)
    };

    let dof = n - 2;
    let stderr = if dof == 0 {
        0.0
    } else {
        ((1.0 - rvalue * rvalue) * m.syy / m.sxx / dof as f64).sqrt()
    };
    let intercept_stderr = stderr * (m.sxx + m.x_mean * m.x_mean).sqrt();

    Ok(LinearFit {
        slope,
        intercept,
        rvalue,
        stderr,
        intercept_stderr,
    })
}
