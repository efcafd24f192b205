use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use models::{
    default_expense_rows, default_glossary, default_variable_cost_rows, keys, ExpenseRow,
    FiveYearProjection, GlossaryTerm, PeriodSeries, SalaryPlan, SalesForecast, SalesSeriesKind,
    StartupCostLedger, UnitEconomicsInputs, VariableCostRow, MONTHS_PER_YEAR, PROJECTION_YEARS,
};
use projection_engine::{
    break_even::{total_expense_per_period, total_salary_per_period},
    compute_cogs, compute_sales, compute_startup_budget, compute_unit_economics,
    project_five_years, series, worksheets, CogsBreakdown, EngineError, ProjectionSummary,
    SalesBreakdown, StartupBudget, UnitEconomics,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{router::SharedState, Result};

/// Cell input as the browser sends it: a number or the raw text of the field.
fn raw_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "planner-api"
    }))
}

// ----- Sales forecast -----

#[derive(Debug, Serialize)]
pub struct SalesForecastView {
    pub table: SalesForecast,
    pub breakdown: SalesBreakdown,
}

impl SalesForecastView {
    fn new(table: SalesForecast) -> Self {
        let breakdown = compute_sales(&table);
        Self { table, breakdown }
    }
}

async fn load_sales(state: &SharedState) -> SalesForecast {
    state
        .repo
        .load(keys::SALES_FORECAST, SalesForecast::default())
        .await
        .normalized(MONTHS_PER_YEAR)
}

/// GET /api/sales-forecast
pub async fn get_sales_forecast(State(state): State<SharedState>) -> Result<Json<SalesForecastView>> {
    Ok(Json(SalesForecastView::new(load_sales(&state).await)))
}

/// PUT /api/sales-forecast
pub async fn put_sales_forecast(
    State(state): State<SharedState>,
    Json(table): Json<SalesForecast>,
) -> Result<Json<SalesForecastView>> {
    let _edit = state.edits.lock().await;
    let table = table.normalized(MONTHS_PER_YEAR);
    state.repo.save(keys::SALES_FORECAST, &table).await?;
    Ok(Json(SalesForecastView::new(table)))
}

#[derive(Debug, Deserialize)]
pub struct SalesCellEdit {
    pub series: String,
    pub index: usize,
    pub value: Value,
}

/// PATCH /api/sales-forecast/cells
pub async fn patch_sales_cell(
    State(state): State<SharedState>,
    Json(edit): Json<SalesCellEdit>,
) -> Result<Json<SalesForecastView>> {
    let _edit = state.edits.lock().await;
    let kind: SalesSeriesKind = edit.series.parse().map_err(EngineError::UnknownSeries)?;
    let mut table = load_sales(&state).await;
    worksheets::set_sales_cell(&mut table, kind, edit.index, &raw_cell(&edit.value))?;
    state.repo.save(keys::SALES_FORECAST, &table).await?;
    Ok(Json(SalesForecastView::new(table)))
}

// ----- Salary roster -----

#[derive(Debug, Serialize)]
pub struct SalaryPlanView {
    #[serde(flatten)]
    pub plan: SalaryPlan,
    pub totals: PeriodSeries,
    pub total: f64,
}

impl SalaryPlanView {
    fn new(plan: SalaryPlan) -> Self {
        let totals = total_salary_per_period(&plan, MONTHS_PER_YEAR);
        let total = series::sum(&totals);
        Self { plan, totals, total }
    }
}

async fn load_salaries(state: &SharedState) -> SalaryPlan {
    state
        .repo
        .load(keys::SALARY_PLANNER, SalaryPlan::default())
        .await
        .normalized(MONTHS_PER_YEAR)
}

/// Callers hold `state.edits`.
async fn save_salaries(state: &SharedState, plan: SalaryPlan) -> Result<Json<SalaryPlanView>> {
    state.repo.save(keys::SALARY_PLANNER, &plan).await?;
    Ok(Json(SalaryPlanView::new(plan)))
}

/// GET /api/salaries
pub async fn get_salaries(State(state): State<SharedState>) -> Result<Json<SalaryPlanView>> {
    Ok(Json(SalaryPlanView::new(load_salaries(&state).await)))
}

/// PUT /api/salaries
pub async fn put_salaries(
    State(state): State<SharedState>,
    Json(plan): Json<SalaryPlan>,
) -> Result<Json<SalaryPlanView>> {
    let _edit = state.edits.lock().await;
    save_salaries(&state, plan.normalized(MONTHS_PER_YEAR)).await
}

#[derive(Debug, Default, Deserialize)]
pub struct NewRow {
    #[serde(default)]
    pub name: Option<String>,
}

/// POST /api/salaries/rows
pub async fn add_salary_row(
    State(state): State<SharedState>,
    Json(body): Json<NewRow>,
) -> Result<Json<SalaryPlanView>> {
    let _edit = state.edits.lock().await;
    let mut plan = load_salaries(&state).await;
    let id = worksheets::add_salary_row(&mut plan, body.name);
    tracing::debug!(id, "added salary row");
    save_salaries(&state, plan).await
}

/// DELETE /api/salaries/rows/:id
pub async fn remove_salary_row(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
) -> Result<Json<SalaryPlanView>> {
    let _edit = state.edits.lock().await;
    let mut plan = load_salaries(&state).await;
    worksheets::remove_salary_row(&mut plan, id)?;
    save_salaries(&state, plan).await
}

#[derive(Debug, Deserialize)]
pub struct RenameSalaryRow {
    pub name: String,
}

/// PATCH /api/salaries/rows/:id
pub async fn rename_salary_row(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
    Json(body): Json<RenameSalaryRow>,
) -> Result<Json<SalaryPlanView>> {
    let _edit = state.edits.lock().await;
    let mut plan = load_salaries(&state).await;
    worksheets::rename_salary_row(&mut plan, id, body.name)?;
    save_salaries(&state, plan).await
}

#[derive(Debug, Deserialize)]
pub struct SalaryCellEdit {
    pub id: u32,
    pub month: usize,
    pub value: Value,
}

/// PATCH /api/salaries/cells
pub async fn patch_salary_cell(
    State(state): State<SharedState>,
    Json(edit): Json<SalaryCellEdit>,
) -> Result<Json<SalaryPlanView>> {
    let _edit = state.edits.lock().await;
    let mut plan = load_salaries(&state).await;
    worksheets::set_salary_cell(&mut plan, edit.id, edit.month, &raw_cell(&edit.value))?;
    save_salaries(&state, plan).await
}

// ----- Expense roster -----

#[derive(Debug, Serialize)]
pub struct ExpenseRowsView {
    pub rows: Vec<ExpenseRow>,
    pub totals: PeriodSeries,
    pub total: f64,
}

impl ExpenseRowsView {
    fn new(rows: Vec<ExpenseRow>) -> Self {
        let totals = total_expense_per_period(&rows, MONTHS_PER_YEAR);
        let total = series::sum(&totals);
        Self { rows, totals, total }
    }
}

fn normalize_expenses(rows: Vec<ExpenseRow>) -> Vec<ExpenseRow> {
    rows.into_iter().map(|r| r.normalized(MONTHS_PER_YEAR)).collect()
}

async fn load_expenses(state: &SharedState) -> Vec<ExpenseRow> {
    normalize_expenses(state.repo.load(keys::EXPENSE_ROWS, default_expense_rows()).await)
}

async fn save_expenses(state: &SharedState, rows: Vec<ExpenseRow>) -> Result<Json<ExpenseRowsView>> {
    state.repo.save(keys::EXPENSE_ROWS, &rows).await?;
    Ok(Json(ExpenseRowsView::new(rows)))
}

/// GET /api/expenses
pub async fn get_expenses(State(state): State<SharedState>) -> Result<Json<ExpenseRowsView>> {
    Ok(Json(ExpenseRowsView::new(load_expenses(&state).await)))
}

/// PUT /api/expenses
pub async fn put_expenses(
    State(state): State<SharedState>,
    Json(rows): Json<Vec<ExpenseRow>>,
) -> Result<Json<ExpenseRowsView>> {
    let _edit = state.edits.lock().await;
    save_expenses(&state, normalize_expenses(rows)).await
}

#[derive(Debug, Deserialize)]
pub struct ExpenseLabel {
    pub label: String,
}

/// POST /api/expenses/rows
pub async fn add_expense_row(
    State(state): State<SharedState>,
    Json(body): Json<ExpenseLabel>,
) -> Result<Json<ExpenseRowsView>> {
    let _edit = state.edits.lock().await;
    let mut rows = load_expenses(&state).await;
    worksheets::add_expense_row(&mut rows, body.label);
    save_expenses(&state, rows).await
}

/// DELETE /api/expenses/rows/:index
pub async fn remove_expense_row(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
) -> Result<Json<ExpenseRowsView>> {
    let _edit = state.edits.lock().await;
    let mut rows = load_expenses(&state).await;
    worksheets::remove_expense_row(&mut rows, index)?;
    save_expenses(&state, rows).await
}

/// PATCH /api/expenses/rows/:index
pub async fn relabel_expense_row(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
    Json(body): Json<ExpenseLabel>,
) -> Result<Json<ExpenseRowsView>> {
    let _edit = state.edits.lock().await;
    let mut rows = load_expenses(&state).await;
    worksheets::relabel_expense_row(&mut rows, index, body.label)?;
    save_expenses(&state, rows).await
}

#[derive(Debug, Deserialize)]
pub struct ExpenseCellEdit {
    pub index: usize,
    pub month: usize,
    pub value: Value,
}

/// PATCH /api/expenses/cells
pub async fn patch_expense_cell(
    State(state): State<SharedState>,
    Json(edit): Json<ExpenseCellEdit>,
) -> Result<Json<ExpenseRowsView>> {
    let _edit = state.edits.lock().await;
    let mut rows = load_expenses(&state).await;
    worksheets::set_expense_cell(&mut rows, edit.index, edit.month, &raw_cell(&edit.value))?;
    save_expenses(&state, rows).await
}

// ----- Variable costs -----

#[derive(Debug, Serialize)]
pub struct VariableCostsView {
    pub rows: Vec<VariableCostRow>,
    pub breakdown: CogsBreakdown,
}

impl VariableCostsView {
    fn new(rows: Vec<VariableCostRow>) -> Self {
        let breakdown = compute_cogs(&rows);
        Self { rows, breakdown }
    }
}

async fn load_variable_costs(state: &SharedState) -> Vec<VariableCostRow> {
    state
        .repo
        .load(keys::VARIABLE_COSTS, default_variable_cost_rows())
        .await
}

async fn save_variable_costs(
    state: &SharedState,
    rows: Vec<VariableCostRow>,
) -> Result<Json<VariableCostsView>> {
    state.repo.save(keys::VARIABLE_COSTS, &rows).await?;
    Ok(Json(VariableCostsView::new(rows)))
}

/// GET /api/variable-costs
pub async fn get_variable_costs(State(state): State<SharedState>) -> Result<Json<VariableCostsView>> {
    Ok(Json(VariableCostsView::new(load_variable_costs(&state).await)))
}

/// PUT /api/variable-costs
pub async fn put_variable_costs(
    State(state): State<SharedState>,
    Json(rows): Json<Vec<VariableCostRow>>,
) -> Result<Json<VariableCostsView>> {
    let _edit = state.edits.lock().await;
    save_variable_costs(&state, rows).await
}

/// POST /api/variable-costs/rows
pub async fn add_variable_cost_row(
    State(state): State<SharedState>,
    Json(body): Json<NewRow>,
) -> Result<Json<VariableCostsView>> {
    let _edit = state.edits.lock().await;
    let mut rows = load_variable_costs(&state).await;
    let id = worksheets::add_variable_cost_row(&mut rows, body.name);
    tracing::debug!(id, "added variable cost row");
    save_variable_costs(&state, rows).await
}

/// Either field may be sent; both apply in one save.
#[derive(Debug, Default, Deserialize)]
pub struct VariableCostEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cost: Option<Value>,
}

/// PATCH /api/variable-costs/rows/:id
pub async fn edit_variable_cost_row(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
    Json(edit): Json<VariableCostEdit>,
) -> Result<Json<VariableCostsView>> {
    let _edit = state.edits.lock().await;
    let mut rows = load_variable_costs(&state).await;
    if let Some(name) = edit.name {
        worksheets::rename_variable_cost_row(&mut rows, id, name)?;
    }
    if let Some(cost) = &edit.cost {
        worksheets::set_variable_cost(&mut rows, id, &raw_cell(cost))?;
    }
    save_variable_costs(&state, rows).await
}

/// DELETE /api/variable-costs/rows/:id
pub async fn remove_variable_cost_row(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
) -> Result<Json<VariableCostsView>> {
    let _edit = state.edits.lock().await;
    let mut rows = load_variable_costs(&state).await;
    worksheets::remove_variable_cost_row(&mut rows, id)?;
    save_variable_costs(&state, rows).await
}

// ----- Startup ledger -----

#[derive(Debug, Serialize)]
pub struct StartupCostsView {
    pub ledger: StartupCostLedger,
    pub budget: StartupBudget,
}

/// GET /api/startup-costs
pub async fn get_startup_costs(State(state): State<SharedState>) -> Result<Json<StartupCostsView>> {
    let ledger = state
        .repo
        .load(keys::STARTUP_COSTS, StartupCostLedger::default())
        .await;
    let budget = compute_startup_budget(&ledger);
    Ok(Json(StartupCostsView { ledger, budget }))
}

/// PUT /api/startup-costs
pub async fn put_startup_costs(
    State(state): State<SharedState>,
    Json(ledger): Json<StartupCostLedger>,
) -> Result<Json<StartupCostsView>> {
    let _edit = state.edits.lock().await;
    state.repo.save(keys::STARTUP_COSTS, &ledger).await?;
    let budget = compute_startup_budget(&ledger);
    Ok(Json(StartupCostsView { ledger, budget }))
}

// ----- Unit economics -----

#[derive(Debug, Serialize)]
pub struct UnitEconomicsView {
    pub inputs: UnitEconomicsInputs,
    pub results: UnitEconomics,
}

/// GET /api/unit-economics
pub async fn get_unit_economics(State(state): State<SharedState>) -> Result<Json<UnitEconomicsView>> {
    let inputs = state
        .repo
        .load(keys::UNIT_ECONOMICS, UnitEconomicsInputs::default())
        .await;
    let results = compute_unit_economics(&inputs);
    Ok(Json(UnitEconomicsView { inputs, results }))
}

/// PUT /api/unit-economics
pub async fn put_unit_economics(
    State(state): State<SharedState>,
    Json(inputs): Json<UnitEconomicsInputs>,
) -> Result<Json<UnitEconomicsView>> {
    let _edit = state.edits.lock().await;
    state.repo.save(keys::UNIT_ECONOMICS, &inputs).await?;
    let results = compute_unit_economics(&inputs);
    Ok(Json(UnitEconomicsView { inputs, results }))
}

/// POST /api/unit-economics/calculate
/// Computes without persisting
pub async fn calculate_unit_economics(Json(inputs): Json<UnitEconomicsInputs>) -> Json<UnitEconomics> {
    Json(compute_unit_economics(&inputs))
}

// ----- Five-year projection -----

#[derive(Debug, Serialize)]
pub struct ProjectionView {
    pub projection: FiveYearProjection,
    pub summary: ProjectionSummary,
}

/// GET /api/projection
pub async fn get_projection(State(state): State<SharedState>) -> Result<Json<ProjectionView>> {
    let projection = state
        .repo
        .load(keys::FIVE_YEAR_PROJECTION, FiveYearProjection::default())
        .await
        .normalized(PROJECTION_YEARS);
    let summary = project_five_years(&projection);
    Ok(Json(ProjectionView { projection, summary }))
}

/// PUT /api/projection
pub async fn put_projection(
    State(state): State<SharedState>,
    Json(projection): Json<FiveYearProjection>,
) -> Result<Json<ProjectionView>> {
    let _edit = state.edits.lock().await;
    let projection = projection.normalized(PROJECTION_YEARS);
    state.repo.save(keys::FIVE_YEAR_PROJECTION, &projection).await?;
    let summary = project_five_years(&projection);
    Ok(Json(ProjectionView { projection, summary }))
}

// ----- Glossary -----

/// GET /api/glossary
pub async fn get_glossary(State(state): State<SharedState>) -> Result<Json<Vec<GlossaryTerm>>> {
    Ok(Json(state.repo.load(keys::GLOSSARY, default_glossary()).await))
}

/// PUT /api/glossary
pub async fn put_glossary(
    State(state): State<SharedState>,
    Json(terms): Json<Vec<GlossaryTerm>>,
) -> Result<Json<Vec<GlossaryTerm>>> {
    let _edit = state.edits.lock().await;
    state.repo.save(keys::GLOSSARY, &terms).await?;
    Ok(Json(terms))
}
