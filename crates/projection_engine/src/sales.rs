use models::{PeriodSeries, SalesForecast};
use serde::Serialize;

use crate::ratio::Ratio;
use crate::series;

/// Per-period and yearly revenue/COGS figures for a sales forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesBreakdown {
    pub revenue: PeriodSeries,
    pub cogs_amount: PeriodSeries,
    pub derived_cost_per_unit: Vec<Ratio>,
    pub total_units: f64,
    pub total_revenue: f64,
    pub total_cogs: f64,
    pub total_price_implied: Ratio,
    pub total_cost_per_unit: Ratio,
}

/// `revenue[i] = unitsSold[i] * pricePerUnit[i]`
pub fn revenue(sales: &SalesForecast) -> PeriodSeries {
    series::product(&sales.units_sold, &sales.price_per_unit, sales.units_sold.len())
}

/// `cogsAmount[i] = unitsSold[i] * costPerUnit[i]`
pub fn cogs_amount(sales: &SalesForecast) -> PeriodSeries {
    series::product(&sales.units_sold, &sales.cost_per_unit, sales.units_sold.len())
}

pub fn compute_sales(sales: &SalesForecast) -> SalesBreakdown {
    let revenue = revenue(sales);
    let cogs_amount = cogs_amount(sales);

    let derived_cost_per_unit = sales
        .units_sold
        .iter()
        .zip(cogs_amount.iter())
        .map(|(units, cogs)| Ratio::of(cogs, units))
        .collect();

    let total_units = series::sum(&sales.units_sold);
    let total_revenue = series::sum(&revenue);
    let total_cogs = series::sum(&cogs_amount);

    SalesBreakdown {
        revenue,
        cogs_amount,
        derived_cost_per_unit,
        total_units,
        total_revenue,
        total_cogs,
        total_price_implied: Ratio::of(total_revenue, total_units),
        total_cost_per_unit: Ratio::of(total_cogs, total_units),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::MONTHS_PER_YEAR;

    fn flat_sales(units: f64, price: f64, cost: f64) -> SalesForecast {
        SalesForecast {
            units_sold: PeriodSeries::filled(MONTHS_PER_YEAR, units),
            price_per_unit: PeriodSeries::filled(MONTHS_PER_YEAR, price),
            cost_per_unit: PeriodSeries::filled(MONTHS_PER_YEAR, cost),
        }
    }

    #[test]
    fn test_flat_year_totals() {
        let breakdown = compute_sales(&flat_sales(10.0, 100.0, 60.0));
        assert_eq!(breakdown.total_revenue, 12000.0);
        assert_eq!(breakdown.total_cogs, 7200.0);
        assert_eq!(breakdown.total_units, 120.0);
        assert_eq!(breakdown.total_price_implied, Ratio::Value(100.0));
        assert_eq!(breakdown.total_cost_per_unit, Ratio::Value(60.0));
        assert_eq!(breakdown.revenue.len(), MONTHS_PER_YEAR);
    }

    #[test]
    fn test_total_revenue_matches_per_period_products() {
        let sales = SalesForecast {
            units_sold: PeriodSeries::from(vec![3.0, 0.0, 7.5, -2.0, 11.0, 4.0, 1.0, 9.0, 0.0, 6.0, 2.0, 8.0]),
            price_per_unit: PeriodSeries::from(vec![10.0, 99.0, 4.0, 12.0, 0.5, 7.0, 3.0, 2.0, 8.0, 1.0, 5.0, 6.0]),
            cost_per_unit: PeriodSeries::zeros(MONTHS_PER_YEAR),
        };
        let expected: f64 = (0..MONTHS_PER_YEAR)
            .map(|i| sales.units_sold.get(i) * sales.price_per_unit.get(i))
            .sum();
        assert!((compute_sales(&sales).total_revenue - expected).abs() < 1e-9);
    }

    #[test]
    fn test_derived_cost_per_unit_zero_units() {
        let mut sales = flat_sales(0.0, 100.0, 60.0);
        sales.units_sold.set(1, 4.0);
        let breakdown = compute_sales(&sales);

        assert!(breakdown.derived_cost_per_unit[0].is_undefined());
        assert_eq!(breakdown.derived_cost_per_unit[0].value(), 0.0);
        assert_eq!(breakdown.derived_cost_per_unit[1], Ratio::Value(60.0));
    }

    #[test]
    fn test_no_units_gives_undefined_implied_price() {
        let breakdown = compute_sales(&SalesForecast::default());
        assert_eq!(breakdown.total_revenue, 0.0);
        assert!(breakdown.total_price_implied.is_undefined());
        assert_eq!(breakdown.total_price_implied.value(), 0.0);
    }

    #[test]
    fn test_negative_units_propagate() {
        let sales = flat_sales(-1.0, 10.0, 4.0);
        let breakdown = compute_sales(&sales);
        assert_eq!(breakdown.total_revenue, -120.0);
        assert_eq!(breakdown.total_cogs, -48.0);
    }
}
