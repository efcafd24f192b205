use models::VariableCostRow;
use serde::Serialize;

/// Cost of goods sold for one unit, from its variable cost items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CogsBreakdown {
    pub item_count: usize,
    pub cogs_per_unit: f64,
}

pub fn compute_cogs_per_unit(rows: &[VariableCostRow]) -> f64 {
    rows.iter().map(|r| r.cost).filter(|c| c.is_finite()).sum()
}

pub fn compute_cogs(rows: &[VariableCostRow]) -> CogsBreakdown {
    CogsBreakdown {
        item_count: rows.len(),
        cogs_per_unit: compute_cogs_per_unit(rows),
    }
}
