//! Cell and row edits on the stored worksheets.
//!
//! Every edit parses its raw cell text with [`series::parse_number_or_zero`] and
//! rejects indices outside the existing series instead of growing it.

use models::{
    ExpenseRow, SalaryPlan, SalaryRow, SalesForecast, SalesSeriesKind, VariableCostRow,
    MONTHS_PER_YEAR,
};

use crate::error::{EngineError, Result};
use crate::series;

pub fn set_sales_cell(
    forecast: &mut SalesForecast,
    kind: SalesSeriesKind,
    index: usize,
    raw: &str,
) -> Result<()> {
    let target = forecast.series_mut(kind);
    *target = series::set_at(target, index, raw)?;
    Ok(())
}

/// Appends a roster row with twelve zero months and returns its id.
/// Unnamed rows are called `Emp <id>`.
pub fn add_salary_row(plan: &mut SalaryPlan, name: Option<String>) -> u32 {
    let id = plan.next_id();
    plan.rows.push(SalaryRow {
        id,
        name: name.unwrap_or_else(|| format!("Emp {id}")),
        monthly_salaries: series::create(MONTHS_PER_YEAR, 0.0),
    });
    id
}

pub fn remove_salary_row(plan: &mut SalaryPlan, id: u32) -> Result<SalaryRow> {
    let position = plan
        .rows
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| EngineError::RowNotFound(format!("salary row {id}")))?;
    Ok(plan.rows.remove(position))
}

pub fn rename_salary_row(plan: &mut SalaryPlan, id: u32, name: impl Into<String>) -> Result<()> {
    let row = salary_row_mut(plan, id)?;
    row.name = name.into();
    Ok(())
}

pub fn set_salary_cell(plan: &mut SalaryPlan, id: u32, month: usize, raw: &str) -> Result<()> {
    let row = salary_row_mut(plan, id)?;
    row.monthly_salaries = series::set_at(&row.monthly_salaries, month, raw)?;
    Ok(())
}

fn salary_row_mut(plan: &mut SalaryPlan, id: u32) -> Result<&mut SalaryRow> {
    plan.rows
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| EngineError::RowNotFound(format!("salary row {id}")))
}

pub fn add_expense_row(rows: &mut Vec<ExpenseRow>, label: impl Into<String>) -> usize {
    rows.push(ExpenseRow::new(label, MONTHS_PER_YEAR));
    rows.len() - 1
}

pub fn remove_expense_row(rows: &mut Vec<ExpenseRow>, index: usize) -> Result<ExpenseRow> {
    if index >= rows.len() {
        return Err(EngineError::RowNotFound(format!("expense row {index}")));
    }
    Ok(rows.remove(index))
}

pub fn relabel_expense_row(rows: &mut [ExpenseRow], index: usize, label: impl Into<String>) -> Result<()> {
    let row = rows
        .get_mut(index)
        .ok_or_else(|| EngineError::RowNotFound(format!("expense row {index}")))?;
    row.label = label.into();
    Ok(())
}

pub fn set_expense_cell(rows: &mut [ExpenseRow], index: usize, month: usize, raw: &str) -> Result<()> {
    let row = rows
        .get_mut(index)
        .ok_or_else(|| EngineError::RowNotFound(format!("expense row {index}")))?;
    row.values = series::set_at(&row.values, month, raw)?;
    Ok(())
}

/// Appends an empty variable cost item and returns its id.
pub fn add_variable_cost_row(rows: &mut Vec<VariableCostRow>, name: Option<String>) -> u32 {
    let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
    rows.push(VariableCostRow {
        id,
        name: name.unwrap_or_default(),
        cost: 0.0,
    });
    id
}

pub fn remove_variable_cost_row(rows: &mut Vec<VariableCostRow>, id: u32) -> Result<VariableCostRow> {
    let position = rows
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| EngineError::RowNotFound(format!("variable cost {id}")))?;
    Ok(rows.remove(position))
}

pub fn rename_variable_cost_row(rows: &mut [VariableCostRow], id: u32, name: impl Into<String>) -> Result<()> {
    variable_cost_row_mut(rows, id)?.name = name.into();
    Ok(())
}

pub fn set_variable_cost(rows: &mut [VariableCostRow], id: u32, raw: &str) -> Result<()> {
    variable_cost_row_mut(rows, id)?.cost = series::parse_number_or_zero(raw);
    Ok(())
}

fn variable_cost_row_mut(rows: &mut [VariableCostRow], id: u32) -> Result<&mut VariableCostRow> {
    rows.iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| EngineError::RowNotFound(format!("variable cost {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_sales_cell_parses_leading_number() {
        let mut forecast = SalesForecast::default();
        set_sales_cell(&mut forecast, SalesSeriesKind::PricePerUnit, 2, "12.5abc").unwrap();
        assert_eq!(forecast.price_per_unit.get(2), 12.5);

        set_sales_cell(&mut forecast, SalesSeriesKind::UnitsSold, 0, "lots").unwrap();
        assert_eq!(forecast.units_sold.get(0), 0.0);
    }

    #[test]
    fn test_set_sales_cell_out_of_range_leaves_series() {
        let mut forecast = SalesForecast::default();
        let before = forecast.clone();
        let err = set_sales_cell(&mut forecast, SalesSeriesKind::CostPerUnit, 12, "3").unwrap_err();
        assert_eq!(err, EngineError::PeriodOutOfRange { index: 12, len: 12 });
        assert_eq!(forecast, before);
    }

    #[test]
    fn test_salary_rows_lifecycle() {
        let mut plan = SalaryPlan::default();
        let id = add_salary_row(&mut plan, None);
        assert_eq!(id, 4);
        assert_eq!(plan.rows[3].name, "Emp 4");
        assert_eq!(plan.rows[3].monthly_salaries.len(), 12);

        set_salary_cell(&mut plan, id, 11, "4200").unwrap();
        assert_eq!(plan.rows[3].monthly_salaries.get(11), 4200.0);

        rename_salary_row(&mut plan, id, "Senior Engineer").unwrap();
        let removed = remove_salary_row(&mut plan, id).unwrap();
        assert_eq!(removed.name, "Senior Engineer");
        assert_eq!(plan.rows.len(), 3);
        assert!(matches!(remove_salary_row(&mut plan, id), Err(EngineError::RowNotFound(_))));
    }

    #[test]
    fn test_ids_are_not_reused_after_middle_removal() {
        let mut plan = SalaryPlan::default();
        remove_salary_row(&mut plan, 2).unwrap();
        assert_eq!(add_salary_row(&mut plan, Some("New".to_string())), 4);
    }

    #[test]
    fn test_expense_rows_lifecycle() {
        let mut rows = Vec::new();
        let index = add_expense_row(&mut rows, "Rent");
        set_expense_cell(&mut rows, index, 0, "900").unwrap();
        relabel_expense_row(&mut rows, index, "Office rent").unwrap();
        assert_eq!(rows[0].label, "Office rent");
        assert_eq!(rows[0].values.get(0), 900.0);

        assert!(set_expense_cell(&mut rows, 0, 13, "1").is_err());
        assert!(relabel_expense_row(&mut rows, 3, "x").is_err());
        assert_eq!(remove_expense_row(&mut rows, 0).unwrap().label, "Office rent");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_variable_cost_rows_lifecycle() {
        let mut rows = models::default_variable_cost_rows();
        let id = add_variable_cost_row(&mut rows, None);
        assert_eq!(id, 4);
        assert_eq!(rows[3].name, "");

        set_variable_cost(&mut rows, id, "7.5").unwrap();
        set_variable_cost(&mut rows, 1, "-2").unwrap();
        set_variable_cost(&mut rows, 2, "free").unwrap();
        rename_variable_cost_row(&mut rows, id, "Shipping").unwrap();
        assert_eq!(rows[3].cost, 7.5);
        assert_eq!(rows[0].cost, -2.0);
        assert_eq!(rows[1].cost, 0.0);
        assert_eq!(rows[3].name, "Shipping");

        assert!(set_variable_cost(&mut rows, 9, "1").is_err());
        assert_eq!(remove_variable_cost_row(&mut rows, 2).unwrap().name, "Packaging");
        assert_eq!(add_variable_cost_row(&mut rows, Some("Labels".into())), 5);
    }
}
