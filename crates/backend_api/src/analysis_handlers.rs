use axum::{extract::State, Json};
use models::{default_expense_rows, keys, PeriodSeries, SalaryPlan, SalesForecast, MONTHS_PER_YEAR};
use projection_engine::{
    analyze_break_even, build_forecast_snapshot, compute_profit_and_loss, forecast,
    predict_financials, simple_break_even, BreakEvenAnalysis, FinancialPredictions, Floor,
    ForecastSnapshot, ProfitAndLoss, SeriesForecast, SimpleBreakEven, SimpleBreakEvenInputs,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ApiError, router::SharedState, Result};

/// The three worksheets the P&L and break-even views are composed from.
struct Worksheets {
    sales: SalesForecast,
    salaries: SalaryPlan,
    expenses: Vec<models::ExpenseRow>,
}

async fn load_worksheets(state: &SharedState, roster_fallback: SalaryPlan) -> Worksheets {
    let repo = &state.repo;
    Worksheets {
        sales: repo
            .load(keys::SALES_FORECAST, SalesForecast::default())
            .await
            .normalized(MONTHS_PER_YEAR),
        salaries: repo.load(keys::SALARY_PLANNER, roster_fallback).await,
        expenses: repo.load(keys::EXPENSE_ROWS, default_expense_rows()).await,
    }
}

/// GET /api/break-even
/// Composes sales, salaries and expenses into a yearly break-even analysis
pub async fn get_break_even(State(state): State<SharedState>) -> Result<Json<BreakEvenAnalysis>> {
    let sheets = load_worksheets(&state, SalaryPlan::empty()).await;
    Ok(Json(analyze_break_even(&sheets.sales, &sheets.salaries, &sheets.expenses)))
}

/// POST /api/break-even/simple
pub async fn calculate_simple_break_even(
    Json(inputs): Json<SimpleBreakEvenInputs>,
) -> Json<SimpleBreakEven> {
    Json(simple_break_even(&inputs))
}

/// GET /api/forecast-pl
pub async fn get_profit_and_loss(State(state): State<SharedState>) -> Result<Json<ProfitAndLoss>> {
    let sheets = load_worksheets(&state, SalaryPlan::default()).await;
    Ok(Json(compute_profit_and_loss(
        &sheets.sales,
        &sheets.salaries,
        &sheets.expenses,
    )))
}

/// GET /api/forecast-pl/predictions
pub async fn get_predictions(State(state): State<SharedState>) -> Result<Json<FinancialPredictions>> {
    let sheets = load_worksheets(&state, SalaryPlan::default()).await;
    let pnl = compute_profit_and_loss(&sheets.sales, &sheets.salaries, &sheets.expenses);
    Ok(Json(predict_financials(&pnl)?))
}

/// POST /api/forecast-pl/snapshot
/// Builds the combined snapshot and persists it
pub async fn create_snapshot(State(state): State<SharedState>) -> Result<Json<ForecastSnapshot>> {
    let _edit = state.edits.lock().await;
    let sheets = load_worksheets(&state, SalaryPlan::default()).await;
    let snapshot = build_forecast_snapshot(&sheets.sales, &sheets.salaries, &sheets.expenses);
    state.repo.save(keys::FORECAST_SNAPSHOT, &snapshot).await?;
    tracing::info!(generated_at = %snapshot.generated_at, "saved forecast snapshot");
    Ok(Json(snapshot))
}

/// GET /api/forecast-pl/snapshot
/// Returns the last persisted snapshot as stored
pub async fn get_snapshot(State(state): State<SharedState>) -> Result<Json<Value>> {
    state
        .repo
        .fetch_document(keys::FORECAST_SNAPSHOT)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no forecast snapshot has been generated".to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub values: PeriodSeries,
    #[serde(default)]
    pub floor_at_zero: bool,
}

/// POST /api/forecast
/// Trend forecast over an arbitrary series
pub async fn forecast_series(Json(request): Json<ForecastRequest>) -> Result<Json<SeriesForecast>> {
    let floor = if request.floor_at_zero {
        Floor::AtZero
    } else {
        Floor::Unbounded
    };
    Ok(Json(forecast(request.values.values(), floor)?))
}
