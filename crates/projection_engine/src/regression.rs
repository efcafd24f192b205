use serde::Serialize;

use crate::error::{EngineError, Result};

/// Fewest historical periods the forecaster will extrapolate from.
pub const MIN_HISTORY_PERIODS: usize = 3;
/// Periods predicted beyond the last observed one.
pub const FORECAST_HORIZON: usize = 6;

/// Ordinary-least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearRegression {
    /// Fits over the paired prefix of `xs` and `ys`. Fewer than two points, or
    /// points that all share one x, leave the slope at 0.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Self {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return Self::default();
        }
        let (xs, ys) = (&xs[..n], &ys[..n]);
        let count = n as f64;

        let sum_x: f64 = xs.iter().sum();
        let sum_y: f64 = ys.iter().sum();
        let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
        let sum_xx: f64 = xs.iter().map(|x| x * x).sum();

        let denominator = count * sum_xx - sum_x * sum_x;
        let slope = if denominator == 0.0 {
            0.0
        } else {
            (count * sum_xy - sum_x * sum_y) / denominator
        };
        let intercept = (sum_y - slope * sum_x) / count;

        Self { slope, intercept }
    }

    /// Fits `values[i]` against period index `i`.
    pub fn fit_series(values: &[f64]) -> Self {
        let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        Self::fit(&xs, values)
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// How close a prediction came to the actual value, 0..=100.
pub fn confidence(predicted: f64, actual: f64) -> f64 {
    let error = (predicted - actual).abs() / actual.abs().max(1.0);
    (100.0 - error * 100.0).clamp(0.0, 100.0)
}

/// Whether predictions may go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Floor {
    /// Quantities that cannot be negative, like sales or expenses.
    AtZero,
    /// Profit or loss.
    Unbounded,
}

impl Floor {
    fn apply(self, value: f64) -> f64 {
        match self {
            Floor::AtZero => value.max(0.0),
            Floor::Unbounded => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionPoint {
    pub period: usize,
    pub actual: f64,
    pub predicted: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesForecast {
    pub model: LinearRegression,
    pub fitted: Vec<PredictionPoint>,
    pub future: Vec<f64>,
    pub average_confidence: f64,
}

/// How far to trust a fitted trend, graded from its average confidence (0..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reliability {
    High,
    Medium,
    Low,
}

impl Reliability {
    pub fn from_confidence(average_confidence: f64) -> Self {
        if average_confidence > 80.0 {
            Reliability::High
        } else if average_confidence > 60.0 {
            Reliability::Medium
        } else {
            Reliability::Low
        }
    }
}

impl SeriesForecast {
    pub fn reliability(&self) -> Reliability {
        Reliability::from_confidence(self.average_confidence)
    }
}

pub fn forecast(history: &[f64], floor: Floor) -> Result<SeriesForecast> {
    forecast_with_horizon(history, floor, FORECAST_HORIZON)
}

/// Backfills predicted-vs-actual over `history` and extrapolates `horizon` periods.
pub fn forecast_with_horizon(history: &[f64], floor: Floor, horizon: usize) -> Result<SeriesForecast> {
    if history.len() < MIN_HISTORY_PERIODS {
        tracing::debug!(periods = history.len(), "not enough history to forecast");
        return Err(EngineError::InsufficientHistory {
            required: MIN_HISTORY_PERIODS,
            actual: history.len(),
        });
    }

    let model = LinearRegression::fit_series(history);

    // Confidence is scored on the raw line, before flooring.
    let fitted: Vec<PredictionPoint> = history
        .iter()
        .enumerate()
        .map(|(period, &actual)| {
            let predicted = model.predict(period as f64);
            PredictionPoint {
                period,
                actual,
                predicted: floor.apply(predicted),
                confidence: confidence(predicted, actual),
            }
        })
        .collect();

    let future = (0..horizon)
        .map(|offset| floor.apply(model.predict((history.len() + offset) as f64)))
        .collect();

    let average_confidence =
        fitted.iter().map(|p| p.confidence).sum::<f64>() / fitted.len() as f64;

    Ok(SeriesForecast {
        model,
        fitted,
        future,
        average_confidence,
    })
}
