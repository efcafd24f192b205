use models::PeriodSeries;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{EngineError, Result};

// Leading decimal number, the way a browser number field reads "12abc" as 12.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number pattern")
});

/// Parses user input as a finite number. Anything else is 0.
pub fn parse_number_or_zero(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let parsed = trimmed.parse::<f64>().ok().or_else(|| {
        LEADING_NUMBER
            .find(trimmed)
            .and_then(|m| m.as_str().parse::<f64>().ok())
    });
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub fn create(len: usize, fill: f64) -> PeriodSeries {
    PeriodSeries::filled(len, fill)
}

/// Copy of `series` with one slot replaced by the parsed `raw` input.
pub fn set_at(series: &PeriodSeries, index: usize, raw: &str) -> Result<PeriodSeries> {
    let mut updated = series.clone();
    if !updated.set(index, parse_number_or_zero(raw)) {
        return Err(EngineError::PeriodOutOfRange {
            index,
            len: series.len(),
        });
    }
    Ok(updated)
}

pub fn sum(series: &PeriodSeries) -> f64 {
    series.iter().sum()
}

/// Total across several series at one period.
pub fn sum_at<'a, I>(series_list: I, index: usize) -> f64
where
    I: IntoIterator<Item = &'a PeriodSeries>,
{
    series_list.into_iter().map(|s| s.get(index)).sum()
}

/// Per-period totals across several series, `periods` slots long.
pub fn sum_by_period<'a, I>(series_list: I, periods: usize) -> PeriodSeries
where
    I: IntoIterator<Item = &'a PeriodSeries>,
{
    let list: Vec<&PeriodSeries> = series_list.into_iter().collect();
    (0..periods)
        .map(|i| sum_at(list.iter().copied(), i))
        .collect()
}

/// Element-wise product of two series over `periods` slots.
pub fn product(a: &PeriodSeries, b: &PeriodSeries, periods: usize) -> PeriodSeries {
    (0..periods).map(|i| a.get(i) * b.get(i)).collect()
}
