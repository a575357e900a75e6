use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use pocketledger_ingest::{auto_detect_columns, csv_headers, parse_csv_rows, parse_transactions, sample_csv};
use pocketledger_insights::{detect_subscriptions, forecast_end_of_month, generate_insights, Severity};

mod config;
mod store;

#[derive(Parser, Debug)]
#[command(name = "pocketledger", version, about = "Personal finance tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a CSV export into the ledger
    Import {
        /// Path to the CSV file
        #[arg(long)]
        csv: PathBuf,

        /// Parse and report without writing to the ledger
        #[arg(long)]
        dry_run: bool,
    },

    /// List detected recurring subscriptions
    Subscriptions,

    /// Project the end-of-month balance
    Forecast {
        /// Current balance; defaults to the configured starting balance,
        /// then to the sum of the ledger
        #[arg(long)]
        balance: Option<f64>,
    },

    /// Print rule-based spending insights
    Insights,

    /// Write a sample CSV showing the expected columns
    Sample {
        /// Destination file (prints to stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write a default config file under ~/.pocketledger
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Import { csv, dry_run } => import(csv, dry_run),
        Command::Subscriptions => subscriptions(),
        Command::Forecast { balance } => forecast(balance),
        Command::Insights => insights(),
        Command::Sample { out } => sample(out),
        Command::Init => config::init_config(),
    }
}

fn import(csv: PathBuf, dry_run: bool) -> Result<()> {
    if !csv.exists() {
        bail!("CSV not found: {}", csv.display());
    }
    let raw = fs::read_to_string(&csv).with_context(|| format!("reading {}", csv.display()))?;

    let headers = csv_headers(&raw);
    if headers.is_empty() {
        bail!("{} has no header row", csv.display());
    }

    let mapping = auto_detect_columns(&headers);
    if mapping.amount.is_empty() || mapping.date.is_empty() {
        bail!(
            "could not detect required columns (amount: {:?}, date: {:?}) in headers: {}",
            mapping.amount,
            mapping.date,
            headers.join(", ")
        );
    }

    println!("Columns: amount={}, date={}", mapping.amount, mapping.date);
    if let Some(category) = &mapping.category {
        println!("         category={category}");
    }
    if let Some(note) = &mapping.note {
        println!("         note={note}");
    }
    if let Some(merchant) = &mapping.merchant {
        println!("         merchant={merchant}");
    }
    if let Some(kind) = &mapping.kind {
        println!("         type={kind}");
    }

    let result = parse_transactions(&parse_csv_rows(&raw), &mapping);
    println!(
        "\nParsed {} of {} rows ({} skipped)",
        result.drafts.len(),
        result.total,
        result.skipped
    );
    for error in &result.errors {
        println!("  {error}");
    }
    if result.skipped > result.errors.len() {
        println!("  ... and {} more issues", result.skipped - result.errors.len());
    }

    if !result.success {
        bail!("no usable rows in {}", csv.display());
    }

    if dry_run {
        println!("\nDry run; ledger unchanged");
        return Ok(());
    }

    let mut transactions = store::load_transactions()?;
    let assigned = store::merge_drafts(&mut transactions, result.drafts);
    store::save_transactions(&transactions)?;
    println!(
        "\nAdded {} transactions (ledger now {})",
        assigned.len(),
        transactions.len()
    );
    Ok(())
}

fn subscriptions() -> Result<()> {
    let transactions = store::load_transactions()?;
    let subscriptions = detect_subscriptions(&transactions);

    if subscriptions.is_empty() {
        println!("No recurring subscriptions detected");
        return Ok(());
    }

    println!("Detected {} subscriptions:\n", subscriptions.len());
    for sub in &subscriptions {
        println!(
            "{} | ${:.2} {:?} | {} | next bill {} | from {} transactions",
            sub.name,
            sub.amount,
            sub.frequency,
            sub.category,
            sub.next_billing_date,
            sub.detected_from.len()
        );
        if let Some(end) = sub.subscription_end_date {
            println!("  ends {end}");
        }
    }
    Ok(())
}

fn forecast(balance: Option<f64>) -> Result<()> {
    let transactions = store::load_transactions()?;
    let config = config::load_config()?;
    let balance = balance.or(config.forecast.starting_balance);

    let result = forecast_end_of_month(&transactions, balance);

    println!(
        "Current balance:        ${:.2}",
        result.current_balance
    );
    println!(
        "Projected EOM balance:  ${:.2} ({:?} confidence)",
        result.projected_eom_balance, result.confidence
    );
    println!("Projected income:       ${:.2}", result.projected_income);
    println!("Projected expenses:     ${:.2}", result.projected_expenses);
    println!(
        "Recurring patterns:     {} expense, {} income",
        result.recurring_expenses.len(),
        result.recurring_income.len()
    );

    println!();
    for insight in &result.insights {
        println!("- {insight}");
    }
    Ok(())
}

fn insights() -> Result<()> {
    let transactions = store::load_transactions()?;
    let insights = generate_insights(&transactions);

    if insights.is_empty() {
        println!("Not enough activity for insights yet");
        return Ok(());
    }

    for insight in &insights {
        let tag = match insight.severity {
            Severity::Warning => "warn",
            Severity::Success => " ok ",
            Severity::Info => "info",
        };
        println!("[{tag}] {}", insight.message);
    }
    Ok(())
}

fn sample(out: Option<PathBuf>) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(&path, sample_csv()).with_context(|| format!("write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", sample_csv()),
    }
    Ok(())
}
