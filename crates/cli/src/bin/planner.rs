use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use database::{JsonFileStore, StoreExt};
use models::{
    default_expense_rows, default_variable_cost_rows, keys, FiveYearProjection, SalaryPlan,
    SalesForecast, SalesSeriesKind, StartupCostLedger, UnitEconomicsInputs, MONTHS_PER_YEAR,
};
use projection_engine::{
    analyze_break_even, compute_cogs, compute_profit_and_loss, compute_sales,
    compute_startup_budget, compute_unit_economics, project_five_years, simple_break_even,
    worksheets, EngineError, SimpleBreakEvenInputs,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "planner", about = "Run the planning calculators against a worksheet store.")]
struct Args {
    /// Path to the worksheet store (e.g., database/planner.json)
    #[arg(short, long, default_value = "database/planner.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Revenue and COGS per month from the sales forecast
    Sales,
    /// Break-even from the stored sales, salaries and expenses
    BreakEven,
    /// Single-scenario break-even from per-unit figures
    BreakEvenSimple {
        #[arg(long, allow_negative_numbers = true)]
        price: f64,
        #[arg(long, allow_negative_numbers = true)]
        cost: f64,
        #[arg(long, allow_negative_numbers = true)]
        fixed_costs: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        total_sales: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        operating_expenses: f64,
    },
    /// COGS per unit from the variable cost items
    Cogs,
    UnitEconomics,
    StartupBudget,
    /// Twelve-month profit and loss
    ProfitAndLoss,
    /// Five-year projection
    Projection,
    /// Set one cell of the sales forecast and save it
    SetCell {
        /// unitsSold, pricePerUnit or costPerUnit
        #[arg(long)]
        series: String,
        #[arg(long)]
        index: usize,
        /// Raw cell text; anything unparsable is stored as 0
        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_sales(store: &JsonFileStore) -> SalesForecast {
    store
        .load(keys::SALES_FORECAST, SalesForecast::default())
        .normalized(MONTHS_PER_YEAR)
}

fn run(args: Args) -> Result<()> {
    let store = JsonFileStore::open(&args.store)
        .with_context(|| format!("opening store {}", args.store.display()))?;

    match args.command {
        Command::Sales => print_json(&compute_sales(&load_sales(&store))),
        Command::BreakEven => {
            let plan = store.load(keys::SALARY_PLANNER, SalaryPlan::empty());
            let expenses = store.load(keys::EXPENSE_ROWS, default_expense_rows());
            print_json(&analyze_break_even(&load_sales(&store), &plan, &expenses))
        }
        Command::BreakEvenSimple {
            price,
            cost,
            fixed_costs,
            total_sales,
            operating_expenses,
        } => print_json(&simple_break_even(&SimpleBreakEvenInputs {
            price_per_unit: price,
            cost_per_unit: cost,
            fixed_costs,
            total_sales,
            operating_expenses,
        })),
        Command::Cogs => {
            let rows = store.load(keys::VARIABLE_COSTS, default_variable_cost_rows());
            print_json(&compute_cogs(&rows))
        }
        Command::UnitEconomics => {
            let inputs = store.load(keys::UNIT_ECONOMICS, UnitEconomicsInputs::default());
            print_json(&compute_unit_economics(&inputs))
        }
        Command::StartupBudget => {
            let ledger = store.load(keys::STARTUP_COSTS, StartupCostLedger::default());
            print_json(&compute_startup_budget(&ledger))
        }
        Command::ProfitAndLoss => {
            let plan = store.load(keys::SALARY_PLANNER, SalaryPlan::default());
            let expenses = store.load(keys::EXPENSE_ROWS, default_expense_rows());
            print_json(&compute_profit_and_loss(&load_sales(&store), &plan, &expenses))
        }
        Command::Projection => {
            let projection = store.load(keys::FIVE_YEAR_PROJECTION, FiveYearProjection::default());
            print_json(&project_five_years(&projection))
        }
        Command::SetCell {
            series,
            index,
            value,
        } => {
            let kind: SalesSeriesKind = series.parse().map_err(EngineError::UnknownSeries)?;
            let mut table = load_sales(&store);
            worksheets::set_sales_cell(&mut table, kind, index, &value)?;
            store.save(keys::SALES_FORECAST, &table)?;
            tracing::info!(series = %kind, index, "updated sales cell");
            print_json(&compute_sales(&table))
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planner=info,database=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Args::parse())
}
