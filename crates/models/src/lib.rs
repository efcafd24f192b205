use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const MONTHS_PER_YEAR: usize = 12;
pub const PROJECTION_YEARS: usize = 5;

pub const MONTH_LABELS: [&str; MONTHS_PER_YEAR] = [
	"Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Storage keys shared by every calculator. These are the wire names other
/// pages read back, so they must not change.
pub mod keys {
	pub const SALES_FORECAST: &str = "sales_forecast_table";
	pub const SALARY_PLANNER: &str = "salary_planner";
	pub const EXPENSE_ROWS: &str = "forecast_expense_rows";
	pub const STARTUP_COSTS: &str = "startup_cost_rows";
	pub const UNIT_ECONOMICS: &str = "unit_economics";
	pub const FIVE_YEAR_PROJECTION: &str = "five_year_projection";
	pub const GLOSSARY: &str = "glossary_terms";
	pub const FORECAST_SNAPSHOT: &str = "financial_forecast_snapshot";
	pub const VARIABLE_COSTS: &str = "variable_cost_items";
}

/// Reads a JSON value as a finite number, coercing anything else to 0.
pub fn number_or_zero(value: &Value) -> f64 {
	let parsed = match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse::<f64>().ok(),
		_ => None,
	};
	parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Value::deserialize(deserializer)?;
	Ok(number_or_zero(&raw))
}

// Period series

/// Fixed-length run of per-period amounts (12 months or 5 years).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct PeriodSeries(Vec<f64>);

impl<'de> Deserialize<'de> for PeriodSeries {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = Vec::<Value>::deserialize(deserializer)?;
		Ok(Self(raw.iter().map(number_or_zero).collect()))
	}
}

impl PeriodSeries {
	pub fn zeros(len: usize) -> Self {
		Self::filled(len, 0.0)
	}

	pub fn filled(len: usize, fill: f64) -> Self {
		let fill = if fill.is_finite() { fill } else { 0.0 };
		Self(vec![fill; len])
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Value at `index`, or 0 when the index lies outside the series.
	pub fn get(&self, index: usize) -> f64 {
		self.0.get(index).copied().unwrap_or(0.0)
	}

	pub fn values(&self) -> &[f64] {
		&self.0
	}

	pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
		self.0.iter().copied()
	}

	/// Overwrites one slot. Returns false when `index` is out of range.
	pub fn set(&mut self, index: usize, value: f64) -> bool {
		match self.0.get_mut(index) {
			Some(slot) => {
				*slot = if value.is_finite() { value } else { 0.0 };
				true
			}
			None => false,
		}
	}

	/// Truncates or zero-pads to exactly `len` periods.
	pub fn resized(mut self, len: usize) -> Self {
		self.0.resize(len, 0.0);
		self
	}
}

impl From<Vec<f64>> for PeriodSeries {
	fn from(values: Vec<f64>) -> Self {
		values.into_iter().collect()
	}
}

impl FromIterator<f64> for PeriodSeries {
	fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|v| if v.is_finite() { v } else { 0.0 })
				.collect(),
		)
	}
}

// Sales forecast

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesForecast {
	#[serde(default)]
	pub units_sold: PeriodSeries,
	#[serde(default)]
	pub price_per_unit: PeriodSeries,
	/// Direct cost per unit sold (the COGS rate).
	#[serde(default)]
	pub cost_per_unit: PeriodSeries,
}

impl Default for SalesForecast {
	fn default() -> Self {
		Self {
			units_sold: PeriodSeries::zeros(MONTHS_PER_YEAR),
			price_per_unit: PeriodSeries::zeros(MONTHS_PER_YEAR),
			cost_per_unit: PeriodSeries::zeros(MONTHS_PER_YEAR),
		}
	}
}

impl SalesForecast {
	pub fn normalized(self, periods: usize) -> Self {
		Self {
			units_sold: self.units_sold.resized(periods),
			price_per_unit: self.price_per_unit.resized(periods),
			cost_per_unit: self.cost_per_unit.resized(periods),
		}
	}

	pub fn series(&self, kind: SalesSeriesKind) -> &PeriodSeries {
		match kind {
			SalesSeriesKind::UnitsSold => &self.units_sold,
			SalesSeriesKind::PricePerUnit => &self.price_per_unit,
			SalesSeriesKind::CostPerUnit => &self.cost_per_unit,
		}
	}

	pub fn series_mut(&mut self, kind: SalesSeriesKind) -> &mut PeriodSeries {
		match kind {
			SalesSeriesKind::UnitsSold => &mut self.units_sold,
			SalesSeriesKind::PricePerUnit => &mut self.price_per_unit,
			SalesSeriesKind::CostPerUnit => &mut self.cost_per_unit,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SalesSeriesKind {
	UnitsSold,
	PricePerUnit,
	CostPerUnit,
}

impl SalesSeriesKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			SalesSeriesKind::UnitsSold => "unitsSold",
			SalesSeriesKind::PricePerUnit => "pricePerUnit",
			SalesSeriesKind::CostPerUnit => "costPerUnit",
		}
	}
}

impl fmt::Display for SalesSeriesKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SalesSeriesKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
			"unitssold" | "units" => Ok(SalesSeriesKind::UnitsSold),
			"priceperunit" | "price" => Ok(SalesSeriesKind::PricePerUnit),
			"costperunit" | "cost" | "cogs" => Ok(SalesSeriesKind::CostPerUnit),
			_ => Err(s.to_string()),
		}
	}
}

// Compensation roster

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRow {
	#[serde(default)]
	pub id: u32,
	#[serde(default)]
	pub name: String,
	#[serde(rename = "monthlySalaries", default)]
	pub monthly_salaries: PeriodSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryPlan {
	#[serde(default)]
	pub rows: Vec<SalaryRow>,
}

impl Default for SalaryPlan {
	fn default() -> Self {
		let rows = ["Founder 1 - CEO", "Founder 2 - COO", "Founder 3 - CMO"]
			.iter()
			.enumerate()
			.map(|(i, name)| SalaryRow {
				id: i as u32 + 1,
				name: name.to_string(),
				monthly_salaries: PeriodSeries::zeros(MONTHS_PER_YEAR),
			})
			.collect();
		Self { rows }
	}
}

impl SalaryPlan {
	pub fn empty() -> Self {
		Self { rows: vec![] }
	}

	pub fn next_id(&self) -> u32 {
		self.rows.iter().map(|r| r.id).max().unwrap_or(0) + 1
	}

	pub fn normalized(mut self, periods: usize) -> Self {
		for row in &mut self.rows {
			row.monthly_salaries = std::mem::take(&mut row.monthly_salaries).resized(periods);
		}
		self
	}
}

// Expense roster

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRow {
	#[serde(default)]
	pub label: String,
	#[serde(default)]
	pub values: PeriodSeries,
}

impl ExpenseRow {
	pub fn new(label: impl Into<String>, periods: usize) -> Self {
		Self {
			label: label.into(),
			values: PeriodSeries::zeros(periods),
		}
	}

	pub fn normalized(self, periods: usize) -> Self {
		Self {
			label: self.label,
			values: self.values.resized(periods),
		}
	}
}

pub fn default_expense_rows() -> Vec<ExpenseRow> {
	["Marketing & Promotions", "Utilities", "Customer Service", "Rent"]
		.iter()
		.map(|label| ExpenseRow::new(*label, MONTHS_PER_YEAR))
		.collect()
}

// Variable costs (COGS per unit)

/// One direct cost that goes into a single unit of product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableCostRow {
	#[serde(default)]
	pub id: u32,
	#[serde(default)]
	pub name: String,
	#[serde(default, deserialize_with = "lenient_number")]
	pub cost: f64,
}

pub fn default_variable_cost_rows() -> Vec<VariableCostRow> {
	["Raw material", "Packaging", "Labour cost"]
		.iter()
		.enumerate()
		.map(|(i, name)| VariableCostRow {
			id: i as u32 + 1,
			name: name.to_string(),
			cost: 0.0,
		})
		.collect()
}

// Startup cost ledger

pub const REGISTRATION_ROW_ID: &str = "registration";
pub const CAPITAL_WORK_ROW_ID: &str = "capital_work";
pub const STARTUP_CAPITAL_ROW_ID: &str = "start_up_capital";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRow {
	/// Stable identity used by budget lookups. Older stored ledgers have none.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default)]
	pub label: String,
	#[serde(default, deserialize_with = "lenient_number")]
	pub value: f64,
}

impl CostRow {
	pub fn new(id: Option<&str>, label: impl Into<String>, value: f64) -> Self {
		Self {
			id: id.map(str::to_string),
			label: label.into(),
			value,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LedgerGroup {
	StartupCost,
	#[serde(rename = "capWork")]
	CapitalWork,
	#[serde(rename = "startUpCapital")]
	StartupCapital,
}

impl LedgerGroup {
	pub fn title(&self) -> &'static str {
		match self {
			LedgerGroup::StartupCost => "Startup Cost",
			LedgerGroup::CapitalWork => "Capital Work in Progress (Fixed Asset)",
			LedgerGroup::StartupCapital => "Start-up Capital",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupCostLedger {
	#[serde(rename = "startupCost", default)]
	pub startup_cost: Vec<CostRow>,
	#[serde(rename = "capWork", default)]
	pub capital_work: Vec<CostRow>,
	#[serde(rename = "startUpCapital", default)]
	pub startup_capital: Vec<CostRow>,
}

impl Default for StartupCostLedger {
	fn default() -> Self {
		Self {
			startup_cost: vec![CostRow::new(Some(REGISTRATION_ROW_ID), "Registration", 0.0)],
			capital_work: vec![CostRow::new(Some(CAPITAL_WORK_ROW_ID), "", 0.0)],
			startup_capital: vec![CostRow::new(
				Some(STARTUP_CAPITAL_ROW_ID),
				"Share Capital",
				0.0,
			)],
		}
	}
}

impl StartupCostLedger {
	pub fn group(&self, group: LedgerGroup) -> &[CostRow] {
		match group {
			LedgerGroup::StartupCost => &self.startup_cost,
			LedgerGroup::CapitalWork => &self.capital_work,
			LedgerGroup::StartupCapital => &self.startup_capital,
		}
	}

	pub fn rows(&self) -> impl Iterator<Item = &CostRow> {
		self.startup_cost
			.iter()
			.chain(self.capital_work.iter())
			.chain(self.startup_capital.iter())
	}
}

// Unit economics

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionRow {
	#[serde(default)]
	pub label: String,
	#[serde(default, deserialize_with = "lenient_number")]
	pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEconomicsInputs {
	#[serde(default, deserialize_with = "lenient_number")]
	pub revenue: f64,
	#[serde(default, deserialize_with = "lenient_number")]
	pub cogs: f64,
	#[serde(default, deserialize_with = "lenient_number")]
	pub operating_cost: f64,
	#[serde(default, deserialize_with = "lenient_number")]
	pub arpu: f64,
	#[serde(default, deserialize_with = "lenient_number")]
	pub cac: f64,
	#[serde(default, deserialize_with = "lenient_number")]
	pub total_purchases: f64,
	#[serde(default, deserialize_with = "lenient_number")]
	pub unique_customers: f64,
	#[serde(default, deserialize_with = "lenient_number")]
	pub customers_at_start: f64,
	#[serde(default, deserialize_with = "lenient_number")]
	pub customers_at_end: f64,
	#[serde(default)]
	pub assumptions: Vec<AssumptionRow>,
}

impl Default for UnitEconomicsInputs {
	fn default() -> Self {
		Self {
			revenue: 119.0,
			cogs: 0.0,
			operating_cost: 0.0,
			arpu: 3.0,
			cac: 0.0,
			total_purchases: 5000.0,
			unique_customers: 100.0,
			customers_at_start: 0.0,
			customers_at_end: 0.0,
			assumptions: vec![],
		}
	}
}

// Five-year projection

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionRowKind {
	Capital,
	Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
	#[serde(default)]
	pub id: u32,
	#[serde(rename = "type")]
	pub kind: ProjectionRowKind,
	#[serde(default)]
	pub label: String,
	#[serde(default)]
	pub values: PeriodSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiveYearProjection {
	#[serde(default)]
	pub sales: PeriodSeries,
	#[serde(default)]
	pub price: PeriodSeries,
	#[serde(default)]
	pub cost: PeriodSeries,
	#[serde(default)]
	pub rows: Vec<ProjectionRow>,
}

impl Default for FiveYearProjection {
	fn default() -> Self {
		let rows = [
			"Salaries",
			"Marketing and Promotion",
			"Digital Marketing & Customer Services",
			"Utilities",
			"Office Supplies",
			"Rent",
		]
		.iter()
		.enumerate()
		.map(|(i, label)| ProjectionRow {
			id: i as u32 + 1,
			kind: ProjectionRowKind::Expense,
			label: label.to_string(),
			values: PeriodSeries::zeros(PROJECTION_YEARS),
		})
		.collect();

		Self {
			sales: PeriodSeries::from(vec![6.0, 13.0, 16.0, 23.0, -12.0]),
			price: PeriodSeries::from(vec![8.0, 8.0, 10.0, 10.0, 10.0]),
			cost: PeriodSeries::zeros(PROJECTION_YEARS),
			rows,
		}
	}
}

impl FiveYearProjection {
	pub fn normalized(mut self, years: usize) -> Self {
		self.sales = self.sales.resized(years);
		self.price = self.price.resized(years);
		self.cost = self.cost.resized(years);
		for row in &mut self.rows {
			row.values = std::mem::take(&mut row.values).resized(years);
		}
		self
	}
}

// Glossary

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryTerm {
	pub title: String,
	#[serde(default)]
	pub description: String,
}

pub fn default_glossary() -> Vec<GlossaryTerm> {
	let terms = [
		("Accounts Payable", "Money the business owes suppliers for goods or services already received but not yet paid for."),
		("Accounts Receivable", "Money customers owe the business for goods or services already delivered."),
		("Assets", "Resources the business owns that carry future economic value, such as cash, stock and equipment."),
		("Balance Sheet", "A statement of assets, liabilities and equity at a single point in time."),
		("Break-Even Analysis", "Finding the sales volume at which contribution margin exactly covers fixed costs."),
		("Cash Flow", "The net movement of cash into and out of the business over a period."),
		("Cost of Goods Sold (COGS)", "Direct cost of producing the goods or services sold in a period."),
		("Liabilities", "Obligations the business must settle in the future, such as loans and payables."),
		("Profit & Loss Statement", "A summary of revenue, costs and expenses over a period, ending in net profit or loss."),
		("Unit Economics", "Revenue and cost of a business model expressed per unit or per customer."),
		("Burn Rate", "How fast the business spends its cash before operations turn cash-flow positive, usually per month."),
		("Runway", "How many months the business can keep operating at its current burn rate before cash runs out."),
	];
	terms
		.iter()
		.map(|(title, description)| GlossaryTerm {
			title: title.to_string(),
			description: description.to_string(),
		})
		.collect()
}

// Settings models

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantSettings {
	#[serde(default)]
	pub api_url: Option<String>,
	#[serde(default)]
	pub temperature: Option<f64>,
	#[serde(default)]
	pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
	#[serde(default)]
	pub settings_version: u32,
	#[serde(default)]
	pub server: ServerSettings,
	#[serde(default = "default_store_path")]
	pub store_path: String,
	#[serde(default)]
	pub assistant: Option<AssistantSettings>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			settings_version: 1,
			server: ServerSettings::default(),
			store_path: default_store_path(),
			assistant: None,
		}
	}
}

fn default_host() -> String {
	"127.0.0.1".to_string()
}

fn default_port() -> u16 {
	3000
}

fn default_store_path() -> String {
	"database/planner.json".to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_series_decodes_garbage_as_zero() {
		let series: PeriodSeries = serde_json::from_value(json!([1.5, null, "abc", "2", true])).unwrap();
		assert_eq!(series.values(), &[1.5, 0.0, 0.0, 2.0, 0.0]);
	}

	#[test]
	fn test_series_set_out_of_range() {
		let mut series = PeriodSeries::zeros(3);
		assert!(series.set(2, 4.0));
		assert!(!series.set(3, 4.0));
		assert!(series.set(0, f64::NAN));
		assert_eq!(series.values(), &[0.0, 0.0, 4.0]);
	}

	#[test]
	fn test_sales_forecast_wire_names() {
		let value = serde_json::to_value(SalesForecast::default()).unwrap();
		assert_eq!(value["unitsSold"].as_array().unwrap().len(), 12);
		assert!(value.get("pricePerUnit").is_some());
		assert!(value.get("costPerUnit").is_some());
	}

	#[test]
	fn test_salary_plan_reads_stored_layout() {
		let stored = json!({
			"rows": [
				{ "id": 1, "name": "Ana - CEO", "monthlySalaries": [700, 700] },
				{ "id": 4, "name": "Emp 4", "monthlySalaries": [] }
			]
		});
		let plan: SalaryPlan = serde_json::from_value(stored).unwrap();
		assert_eq!(plan.rows[0].monthly_salaries.get(1), 700.0);
		assert_eq!(plan.next_id(), 5);
	}

	#[test]
	fn test_ledger_rows_without_id_round_trip_unchanged() {
		let stored = json!({
			"startupCost": [{ "label": "Registration", "value": 250.0 }],
			"capWork": [],
			"startUpCapital": [{ "label": "Start-up Capital", "value": 1000.0 }]
		});
		let ledger: StartupCostLedger = serde_json::from_value(stored.clone()).unwrap();
		assert_eq!(ledger.startup_cost[0].id, None);
		assert_eq!(serde_json::to_value(&ledger).unwrap(), stored);
	}

	#[test]
	fn test_sales_series_kind_parsing() {
		assert_eq!("unitsSold".parse::<SalesSeriesKind>(), Ok(SalesSeriesKind::UnitsSold));
		assert_eq!("price-per-unit".parse::<SalesSeriesKind>(), Ok(SalesSeriesKind::PricePerUnit));
		assert_eq!("cost_per_unit".parse::<SalesSeriesKind>(), Ok(SalesSeriesKind::CostPerUnit));
		assert!("margin".parse::<SalesSeriesKind>().is_err());
	}

	#[test]
	fn test_projection_row_kind_tag() {
		let row: ProjectionRow = serde_json::from_value(json!({
			"id": 7, "type": "capital", "label": "Oven", "values": [100, 0, 0, 0, 0]
		}))
		.unwrap();
		assert_eq!(row.kind, ProjectionRowKind::Capital);
	}

	#[test]
	fn test_variable_cost_rows_read_text_costs() {
		let rows: Vec<VariableCostRow> = serde_json::from_value(json!([
			{ "id": 1, "name": "Raw material", "cost": "12.5" },
			{ "id": 2, "name": "Packaging", "cost": "n/a" },
			{ "name": "Labour cost" }
		]))
		.unwrap();
		assert_eq!(rows[0].cost, 12.5);
		assert_eq!(rows[1].cost, 0.0);
		assert_eq!(rows[2].id, 0);
		assert_eq!(default_variable_cost_rows()[2].name, "Labour cost");
	}

	#[test]
	fn test_projection_normalized_pads_and_truncates() {
		let projection: FiveYearProjection = serde_json::from_value(json!({
			"sales": [1, 2],
			"price": [1, 2, 3, 4, 5, 6, 7],
			"rows": [{ "id": 1, "type": "expense", "label": "Rent", "values": [9] }]
		}))
		.unwrap();
		let projection = projection.normalized(PROJECTION_YEARS);
		assert_eq!(projection.sales.values(), &[1.0, 2.0, 0.0, 0.0, 0.0]);
		assert_eq!(projection.price.len(), 5);
		assert_eq!(projection.cost.len(), 5);
		assert_eq!(projection.rows[0].values.len(), 5);
	}
}
