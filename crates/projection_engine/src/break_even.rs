use models::{ExpenseRow, PeriodSeries, SalaryPlan, SalesForecast, MONTHS_PER_YEAR};
use serde::{Deserialize, Serialize};

use crate::ratio::Ratio;
use crate::sales;
use crate::series;

/// Per-month salary totals across every roster row.
pub fn total_salary_per_period(plan: &SalaryPlan, periods: usize) -> PeriodSeries {
    series::sum_by_period(plan.rows.iter().map(|r| &r.monthly_salaries), periods)
}

/// Per-month totals across every operating-expense line.
pub fn total_expense_per_period(rows: &[ExpenseRow], periods: usize) -> PeriodSeries {
    series::sum_by_period(rows.iter().map(|r| &r.values), periods)
}

/// Salaries plus operating expenses over the whole year.
pub fn total_fixed_costs(plan: &SalaryPlan, expenses: &[ExpenseRow]) -> f64 {
    series::sum(&total_salary_per_period(plan, MONTHS_PER_YEAR))
        + series::sum(&total_expense_per_period(expenses, MONTHS_PER_YEAR))
}

/// Rounds up to whole units. Values within a relative 1e-9 of an integer are
/// float noise and snap to it.
fn ceil_units(units: f64) -> f64 {
    let nearest = units.round();
    if (units - nearest).abs() <= 1e-9 * nearest.abs().max(1.0) {
        nearest
    } else {
        units.ceil()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenAnalysis {
    pub yearly_units: f64,
    pub yearly_revenue: f64,
    pub yearly_cogs: f64,
    pub average_price_per_unit: Ratio,
    pub average_cost_per_unit: Ratio,
    pub gross_profit: f64,
    pub gross_margin_pct: Ratio,
    pub total_fixed_costs: f64,
    /// Same ratio as the gross margin; COGS is the only variable cost line.
    pub contribution_margin_pct: Ratio,
    pub break_even_sales: Ratio,
    pub break_even_units: Ratio,
    pub monthly_break_even_sales: Ratio,
}

/// Break-even from yearly totals.
///
/// The average price per unit is back-derived from revenue and units so that a
/// price varying by month is amortized over the year.
pub fn break_even_from_totals(
    revenue: f64,
    cogs: f64,
    units: f64,
    fixed_costs: f64,
) -> BreakEvenAnalysis {
    let gross_profit = revenue - cogs;
    let margin = Ratio::of(gross_profit, revenue);
    let gross_margin_pct = margin.map(|m| m * 100.0);
    let contribution_margin_pct = gross_margin_pct;

    let break_even_sales = if contribution_margin_pct.value() == 0.0 {
        Ratio::Undefined
    } else {
        margin.and_then(|m| Ratio::of(fixed_costs, m))
    };

    let average_price_per_unit = Ratio::of(revenue, units);
    let break_even_units = if revenue == 0.0 {
        Ratio::Undefined
    } else {
        break_even_sales
            .and_then(|s| average_price_per_unit.and_then(|p| Ratio::of(s, p)))
            .map(ceil_units)
    };

    BreakEvenAnalysis {
        yearly_units: units,
        yearly_revenue: revenue,
        yearly_cogs: cogs,
        average_price_per_unit,
        average_cost_per_unit: Ratio::of(cogs, units),
        gross_profit,
        gross_margin_pct,
        total_fixed_costs: fixed_costs,
        contribution_margin_pct,
        break_even_sales,
        break_even_units,
        monthly_break_even_sales: break_even_sales.map(|s| s / MONTHS_PER_YEAR as f64),
    }
}

/// Break-even composed from the stored sales forecast, salary roster and
/// expense roster.
pub fn analyze_break_even(
    sales_forecast: &SalesForecast,
    plan: &SalaryPlan,
    expenses: &[ExpenseRow],
) -> BreakEvenAnalysis {
    let breakdown = sales::compute_sales(sales_forecast);
    break_even_from_totals(
        breakdown.total_revenue,
        breakdown.total_cogs,
        breakdown.total_units,
        total_fixed_costs(plan, expenses),
    )
}

/// Inputs of the single-scenario calculator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleBreakEvenInputs {
    #[serde(default)]
    pub price_per_unit: f64,
    #[serde(default)]
    pub cost_per_unit: f64,
    #[serde(default)]
    pub fixed_costs: f64,
    /// Shown next to the result; not part of any formula.
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub operating_expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleBreakEven {
    pub gross_profit: f64,
    pub gross_margin_pct: Ratio,
    pub break_even_units: Ratio,
    pub break_even_sales: Ratio,
    pub yearly_break_even: f64,
}

/// Single-scenario break-even from per-unit price and cost.
pub fn simple_break_even(inputs: &SimpleBreakEvenInputs) -> SimpleBreakEven {
    let gross_profit = inputs.price_per_unit - inputs.cost_per_unit;
    let gross_margin_pct = Ratio::of(gross_profit, inputs.price_per_unit).map(|m| m * 100.0);
    let break_even_units = Ratio::of(inputs.fixed_costs, gross_profit).map(ceil_units);
    let break_even_sales = break_even_units.map(|u| u * inputs.price_per_unit);

    // A zero margin divides by 1, not 0, so the figure stays finite.
    let margin_fraction = gross_margin_pct.value() / 100.0;
    let divisor = if margin_fraction == 0.0 { 1.0 } else { margin_fraction };

    SimpleBreakEven {
        gross_profit,
        gross_margin_pct,
        break_even_units,
        break_even_sales,
        yearly_break_even: inputs.operating_expenses / divisor,
    }
}
