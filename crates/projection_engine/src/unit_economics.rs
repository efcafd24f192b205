use models::UnitEconomicsInputs;
use serde::Serialize;

use crate::ratio::Ratio;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEconomics {
    pub gross_profit: f64,
    pub gross_margin_pct: Ratio,
    pub operating_profit: f64,
    /// APV
    pub average_purchase_value: Ratio,
    /// APF
    pub average_purchase_frequency: Ratio,
    pub churn_rate: Ratio,
    /// ACL, in periods
    pub average_customer_lifespan: Ratio,
    /// CLV = APV * APF * ACL * gross margin fraction
    pub customer_lifetime_value: f64,
    pub arpu: f64,
    pub cac: f64,
    pub assumptions_total: f64,
}

pub fn compute_unit_economics(inputs: &UnitEconomicsInputs) -> UnitEconomics {
    let gross_profit = inputs.revenue - inputs.cogs;
    let margin = Ratio::of(gross_profit, inputs.revenue);

    let average_purchase_value = Ratio::of(inputs.revenue, inputs.total_purchases);
    let average_purchase_frequency = Ratio::of(inputs.total_purchases, inputs.unique_customers);
    let churn_rate = Ratio::of(
        inputs.customers_at_start - inputs.customers_at_end,
        inputs.customers_at_start,
    );
    let average_customer_lifespan = if churn_rate.value() == 0.0 {
        Ratio::Undefined
    } else {
        Ratio::of(1.0, churn_rate.value())
    };

    let customer_lifetime_value = average_purchase_value.value()
        * average_purchase_frequency.value()
        * average_customer_lifespan.value()
        * margin.value();

    UnitEconomics {
        gross_profit,
        gross_margin_pct: margin.map(|m| m * 100.0),
        operating_profit: inputs.revenue - inputs.operating_cost,
        average_purchase_value,
        average_purchase_frequency,
        churn_rate,
        average_customer_lifespan,
        customer_lifetime_value,
        arpu: inputs.arpu,
        cac: inputs.cac,
        assumptions_total: inputs.assumptions.iter().map(|a| a.value).sum(),
    }
}
