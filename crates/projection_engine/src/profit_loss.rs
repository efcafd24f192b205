use models::{ExpenseRow, SalaryPlan, SalesForecast, MONTHS_PER_YEAR, MONTH_LABELS};
use serde::Serialize;

use crate::break_even::{total_expense_per_period, total_salary_per_period};
use crate::ratio::Ratio;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPnl {
    pub month: String,
    pub cash_sales: f64,
    pub cost_of_services: f64,
    pub gross_profit: f64,
    pub salary: f64,
    pub additional_expenses: f64,
    pub total_expenses: f64,
    pub net_profit_or_loss: f64,
    /// Fraction of cash sales, not percent.
    pub gross_profit_margin: Ratio,
    pub net_profit_margin: Ratio,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlSummary {
    pub total_cash_sales: f64,
    pub total_expenses: f64,
    pub total_net_profit: f64,
    pub average_gross_margin: f64,
    pub average_net_margin: f64,
    pub best_month: Option<MonthExtreme>,
    pub worst_month: Option<MonthExtreme>,
}

/// A month picked out by its net profit. Ties go to the earlier month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthExtreme {
    pub month: String,
    pub net_profit_or_loss: f64,
}

impl From<&MonthlyPnl> for MonthExtreme {
    fn from(m: &MonthlyPnl) -> Self {
        Self {
            month: m.month.clone(),
            net_profit_or_loss: m.net_profit_or_loss,
        }
    }
}

fn pick_month<F>(months: &[MonthlyPnl], better: F) -> Option<MonthExtreme>
where
    F: Fn(f64, f64) -> bool,
{
    let mut iter = months.iter();
    let first = iter.next()?;
    let chosen = iter.fold(first, |current, m| {
        if better(m.net_profit_or_loss, current.net_profit_or_loss) {
            m
        } else {
            current
        }
    });
    Some(chosen.into())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLoss {
    pub months: Vec<MonthlyPnl>,
    pub summary: PnlSummary,
}

impl ProfitAndLoss {
    pub fn cash_sales(&self) -> Vec<f64> {
        self.months.iter().map(|m| m.cash_sales).collect()
    }

    pub fn total_expenses(&self) -> Vec<f64> {
        self.months.iter().map(|m| m.total_expenses).collect()
    }

    pub fn net_profit_or_loss(&self) -> Vec<f64> {
        self.months.iter().map(|m| m.net_profit_or_loss).collect()
    }
}

/// Twelve-month P&L from the sales forecast, salary roster and expense lines.
pub fn compute_profit_and_loss(
    sales: &SalesForecast,
    plan: &SalaryPlan,
    expenses: &[ExpenseRow],
) -> ProfitAndLoss {
    let salaries = total_salary_per_period(plan, MONTHS_PER_YEAR);
    let additional = total_expense_per_period(expenses, MONTHS_PER_YEAR);

    let months: Vec<MonthlyPnl> = (0..MONTHS_PER_YEAR)
        .map(|i| {
            let units = sales.units_sold.get(i);
            let cash_sales = units * sales.price_per_unit.get(i);
            let cost_of_services = units * sales.cost_per_unit.get(i);
            let gross_profit = cash_sales - cost_of_services;
            let salary = salaries.get(i);
            let additional_expenses = additional.get(i);
            let total_expenses = salary + additional_expenses;
            let net_profit_or_loss = gross_profit - total_expenses;

            MonthlyPnl {
                month: MONTH_LABELS[i].to_string(),
                cash_sales,
                cost_of_services,
                gross_profit,
                salary,
                additional_expenses,
                total_expenses,
                net_profit_or_loss,
                gross_profit_margin: Ratio::of(gross_profit, cash_sales),
                net_profit_margin: Ratio::of(net_profit_or_loss, cash_sales),
            }
        })
        .collect();

    let count = months.len() as f64;
    let summary = PnlSummary {
        total_cash_sales: months.iter().map(|m| m.cash_sales).sum(),
        total_expenses: months.iter().map(|m| m.total_expenses).sum(),
        total_net_profit: months.iter().map(|m| m.net_profit_or_loss).sum(),
        average_gross_margin: months.iter().map(|m| m.gross_profit_margin.value()).sum::<f64>() / count,
        average_net_margin: months.iter().map(|m| m.net_profit_margin.value()).sum::<f64>() / count,
        best_month: pick_month(&months, |a, b| a > b),
        worst_month: pick_month(&months, |a, b| a < b),
    };

    ProfitAndLoss { months, summary }
}
