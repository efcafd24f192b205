use anyhow::{Context, Result};
use clap::Parser;
use database::{JsonFileStore, StoreExt};
use models::{default_expense_rows, keys, SalaryPlan, SalesForecast, MONTHS_PER_YEAR};
use projection_engine::{build_forecast_snapshot, ForecastSnapshot};
use std::{fs, path::PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "generate-forecast",
    about = "Build the P&L, break-even and trend snapshot from the stored worksheets."
)]
struct Args {
    /// Path to the worksheet store (e.g., database/planner.json)
    #[arg(short, long, default_value = "database/planner.json")]
    store: PathBuf,

    /// Optional file to also write the snapshot to
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Pretty-print the written file
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn generate(args: &Args) -> Result<ForecastSnapshot> {
    let store = JsonFileStore::open(&args.store)
        .with_context(|| format!("opening store {}", args.store.display()))?;

    let sales = store
        .load(keys::SALES_FORECAST, SalesForecast::default())
        .normalized(MONTHS_PER_YEAR);
    let plan = store.load(keys::SALARY_PLANNER, SalaryPlan::default());
    let expenses = store.load(keys::EXPENSE_ROWS, default_expense_rows());

    let snapshot = build_forecast_snapshot(&sales, &plan, &expenses);
    store.save(keys::FORECAST_SNAPSHOT, &snapshot)?;

    if let Some(out) = &args.out {
        let text = if args.pretty {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };
        fs::write(out, text).with_context(|| format!("writing {}", out.display()))?;
    }
    Ok(snapshot)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "generate_forecast=info,database=warn".into()),
        )
        .init();

    let args = Args::parse();
    let snapshot = generate(&args)?;

    println!("Generated forecast snapshot at {}", snapshot.generated_at);
    println!(
        "  Total cash sales: {:.2}  Net profit: {:.2}",
        snapshot.profit_and_loss.summary.total_cash_sales,
        snapshot.profit_and_loss.summary.total_net_profit
    );
    if let Some(error) = &snapshot.prediction_error {
        println!("  Predictions skipped: {}", error);
    }
    if let Some(out) = &args.out {
        println!("  Written to {}", out.display());
    }
    Ok(())
}
