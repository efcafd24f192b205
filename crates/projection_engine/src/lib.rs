pub mod break_even;
pub mod cogs;
pub mod error;
pub mod profit_loss;
pub mod projection;
pub mod ratio;
pub mod regression;
pub mod sales;
pub mod series;
pub mod snapshot;
pub mod startup;
pub mod unit_economics;
pub mod worksheets;

pub use break_even::{
    analyze_break_even, break_even_from_totals, simple_break_even, total_fixed_costs,
    BreakEvenAnalysis, SimpleBreakEven, SimpleBreakEvenInputs,
};
pub use cogs::{compute_cogs, compute_cogs_per_unit, CogsBreakdown};
pub use error::{EngineError, Result};
pub use profit_loss::{compute_profit_and_loss, MonthExtreme, MonthlyPnl, PnlSummary, ProfitAndLoss};
pub use projection::{project_five_years, ProjectionSummary, YearlyFigures};
pub use ratio::Ratio;
pub use regression::{
    forecast, Floor, LinearRegression, PredictionPoint, Reliability, SeriesForecast,
};
pub use sales::{compute_sales, SalesBreakdown};
pub use snapshot::{build_forecast_snapshot, predict_financials, FinancialPredictions, ForecastSnapshot};
pub use startup::{compute_startup_budget, StartupBudget};
pub use unit_economics::{compute_unit_economics, UnitEconomics};
