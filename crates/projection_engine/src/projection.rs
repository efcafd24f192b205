use models::{FiveYearProjection, ProjectionRowKind, PROJECTION_YEARS};
use serde::Serialize;

use crate::series;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyFigures {
    pub year: usize,
    pub revenue: f64,
    pub gross_profit: f64,
    pub total_expenses: f64,
    pub total_capital: f64,
    pub ebitda: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub years: Vec<YearlyFigures>,
    pub total_revenue: f64,
    pub total_ebitda: f64,
}

fn rows_total_at(projection: &FiveYearProjection, kind: ProjectionRowKind, year: usize) -> f64 {
    series::sum_at(
        projection
            .rows
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| &r.values),
        year,
    )
}

pub fn project_five_years(projection: &FiveYearProjection) -> ProjectionSummary {
    let years: Vec<YearlyFigures> = (0..PROJECTION_YEARS)
        .map(|y| {
            let sales = projection.sales.get(y);
            let price = projection.price.get(y);
            let gross_profit = sales * (price - projection.cost.get(y));
            let total_expenses = rows_total_at(projection, ProjectionRowKind::Expense, y);

            YearlyFigures {
                year: y + 1,
                revenue: sales * price,
                gross_profit,
                total_expenses,
                total_capital: rows_total_at(projection, ProjectionRowKind::Capital, y),
                ebitda: gross_profit - total_expenses,
            }
        })
        .collect();

    ProjectionSummary {
        total_revenue: years.iter().map(|y| y.revenue).sum(),
        total_ebitda: years.iter().map(|y| y.ebitda).sum(),
        years,
    }
}
