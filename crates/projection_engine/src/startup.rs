use models::{
    CostRow, LedgerGroup, StartupCostLedger, CAPITAL_WORK_ROW_ID, REGISTRATION_ROW_ID,
    STARTUP_CAPITAL_ROW_ID,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupBudget {
    pub startup_cost_total: f64,
    pub capital_work_total: f64,
    pub startup_capital_total: f64,
    /// Every row in every group.
    pub total: f64,
    pub startup_capital: f64,
    pub capital_work: f64,
    pub registration: f64,
    pub starting_operations_budget: f64,
}

/// Value of the row with stable id `row_id` in `group`.
///
/// Rows stored before ids existed are matched on their exact label instead.
pub fn lookup_row(ledger: &StartupCostLedger, group: LedgerGroup, row_id: &str, legacy_label: &str) -> f64 {
    let rows = ledger.group(group);
    rows.iter()
        .find(|r| r.id.as_deref() == Some(row_id))
        .or_else(|| rows.iter().find(|r| r.id.is_none() && r.label == legacy_label))
        .map(|r| r.value)
        .unwrap_or(0.0)
}

fn group_total(rows: &[CostRow]) -> f64 {
    rows.iter().map(|r| r.value).sum()
}

pub fn compute_startup_budget(ledger: &StartupCostLedger) -> StartupBudget {
    let startup_capital = lookup_row(
        ledger,
        LedgerGroup::StartupCapital,
        STARTUP_CAPITAL_ROW_ID,
        LedgerGroup::StartupCapital.title(),
    );
    let capital_work = lookup_row(
        ledger,
        LedgerGroup::CapitalWork,
        CAPITAL_WORK_ROW_ID,
        LedgerGroup::CapitalWork.title(),
    );
    let registration = lookup_row(ledger, LedgerGroup::StartupCost, REGISTRATION_ROW_ID, "Registration");

    StartupBudget {
        startup_cost_total: group_total(&ledger.startup_cost),
        capital_work_total: group_total(&ledger.capital_work),
        startup_capital_total: group_total(&ledger.startup_capital),
        total: ledger.rows().map(|r| r.value).sum(),
        startup_capital,
        capital_work,
        registration,
        starting_operations_budget: startup_capital - (capital_work + registration),
    }
}
