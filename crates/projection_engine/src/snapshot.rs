use chrono::Utc;
use models::{ExpenseRow, SalaryPlan, SalesForecast};
use serde::Serialize;

use crate::break_even::{analyze_break_even, BreakEvenAnalysis};
use crate::error::Result;
use crate::profit_loss::{compute_profit_and_loss, ProfitAndLoss};
use crate::regression::{forecast, Floor, Reliability, SeriesForecast};

/// Trend forecasts of the three headline P&L lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialPredictions {
    pub cash_sales: SeriesForecast,
    pub total_expenses: SeriesForecast,
    pub net_profit_loss: SeriesForecast,
    /// Graded on the net profit trend.
    pub reliability: Reliability,
}

pub fn predict_financials(pnl: &ProfitAndLoss) -> Result<FinancialPredictions> {
    let net_profit_loss = forecast(&pnl.net_profit_or_loss(), Floor::Unbounded)?;
    Ok(FinancialPredictions {
        cash_sales: forecast(&pnl.cash_sales(), Floor::AtZero)?,
        total_expenses: forecast(&pnl.total_expenses(), Floor::AtZero)?,
        reliability: net_profit_loss.reliability(),
        net_profit_loss,
    })
}

/// Everything the forecast page shows, computed in one pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSnapshot {
    pub generated_at: String,
    pub profit_and_loss: ProfitAndLoss,
    pub break_even: BreakEvenAnalysis,
    pub predictions: Option<FinancialPredictions>,
    pub prediction_error: Option<String>,
}

/// Builds the snapshot. A prediction failure is recorded in the snapshot rather
/// than failing the whole build.
pub fn build_forecast_snapshot(
    sales: &SalesForecast,
    plan: &SalaryPlan,
    expenses: &[ExpenseRow],
) -> ForecastSnapshot {
    let profit_and_loss = compute_profit_and_loss(sales, plan, expenses);
    let break_even = analyze_break_even(sales, plan, expenses);

    let (predictions, prediction_error) = match predict_financials(&profit_and_loss) {
        Ok(p) => (Some(p), None),
        Err(e) => {
            tracing::warn!("Skipping predictions: {}", e);
            (None, Some(e.to_string()))
        }
    };

    ForecastSnapshot {
        generated_at: Utc::now().to_rfc3339(),
        profit_and_loss,
        break_even,
        predictions,
        prediction_error,
    }
}
