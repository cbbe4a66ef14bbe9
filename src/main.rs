//! Retirement Projection CLI
//!
//! Command-line interface for running retirement income projections

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use retirement_projection::api;
use retirement_projection::projection::YearlyProjectionRow;
use retirement_projection::{Assumptions, ScenarioInput, ScenarioRunner, ScenarioStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "retirement-projection",
    version,
    about = "Year-by-year retirement income projections for federal employees"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory of assumption tables (built-in tables when omitted)
    #[arg(long, global = true)]
    tables: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full yearly projection for one scenario
    Project {
        /// Scenario JSON file
        input: PathBuf,
        /// Also write the yearly rows to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Compare every scenario in a saved scenario file
    Compare {
        /// Scenario file name inside the scenario directory
        file: String,
        #[arg(long, default_value = "scenarios")]
        dir: PathBuf,
    },
    /// First-year pension annuity
    Pension { input: PathBuf },
    /// Social Security benefit at the claiming age
    SocialSecurity { input: PathBuf },
    /// Standalone account projection
    Account { input: PathBuf },
    /// Federal and state tax for one year
    Tax { input: PathBuf },
    /// COLA compounding schedule
    Cola { input: PathBuf },
    /// Health insurance premium projection
    Health { input: PathBuf },
    /// Monte Carlo sequence-of-returns simulation
    MonteCarlo { input: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
    Csv,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn load_assumptions(tables: Option<&Path>) -> Result<Assumptions> {
    match tables {
        Some(dir) => Assumptions::from_csv_path(dir)
            .with_context(|| format!("Failed to load tables from {}", dir.display())),
        None => Ok(Assumptions::default_tables()),
    }
}

fn write_rows_csv<W: io::Write>(writer: W, rows: &[YearlyProjectionRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_rows(rows: &[YearlyProjectionRow]) {
    println!(
        "{:>4} {:>5} {:>12} {:>10} {:>12} {:>12} {:>10} {:>12} {:>10} {:>12} {:>14}",
        "Age", "Year", "Pension", "Suppl", "SocSec", "Withdrawal", "Other", "Gross", "Taxes", "Net", "Balance"
    );
    println!("{}", "-".repeat(130));

    for row in rows {
        println!(
            "{:>4} {:>5} {:>12.2} {:>10.2} {:>12.2} {:>12.2} {:>10.2} {:>12.2} {:>10.2} {:>12.2} {:>14.2}",
            row.age,
            row.year,
            row.pension_income,
            row.supplement_income,
            row.social_security_income,
            row.account_withdrawal,
            row.other_income,
            row.total_gross_income,
            row.total_taxes,
            row.net_income,
            row.account_balance,
        );
    }
}

/// Flat key/value rendering for results without a row layout
fn print_value(value: &Value, indent: usize) {
    let pad = " ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                match v {
                    Value::Object(_) => {
                        println!("{}{}:", pad, key);
                        print_value(v, indent + 2);
                    }
                    Value::Array(items) if items.iter().any(|i| i.is_object() || i.is_array()) => {
                        println!("{}{}: [{} entries]", pad, key, items.len());
                    }
                    Value::Number(n) => match n.as_f64() {
                        Some(x) if x.fract() != 0.0 => println!("{}{:<28} {:>14.4}", pad, key, x),
                        _ => println!("{}{:<28} {:>14}", pad, key, n),
                    },
                    _ => println!("{}{:<28} {}", pad, key, v),
                }
            }
        }
        other => println!("{}{}", pad, other),
    }
}

fn emit<T: Serialize>(format: OutputFormat, result: &T) -> Result<()> {
    let value = serde_json::to_value(result)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Table => print_value(&value, 0),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            if let Value::Object(map) = &value {
                wtr.write_record(["field", "value"])?;
                for (key, v) in map {
                    if !v.is_object() && !v.is_array() {
                        wtr.write_record([key.as_str(), v.to_string().as_str()])?;
                    }
                }
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

fn run_project(assumptions: &Assumptions, input: &Path, csv_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let scenario: ScenarioInput = read_json(input)?;
    let result = api::compute_retirement_projection(&scenario, assumptions)
        .context("Projection failed")?;

    if let Some(path) = csv_path {
        let file = fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_rows_csv(file, &result.rows)?;
        println!("Yearly rows written to: {}", path.display());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Csv => write_rows_csv(io::stdout(), &result.rows)?,
        OutputFormat::Table => {
            println!("Retirement Projection ({})", chrono::Local::now().format("%Y-%m-%d"));
            println!(
                "Projection: ages {} to {} ({} years)",
                scenario.projection_start_age,
                scenario.projection_end_age,
                result.summary.years
            );
            println!(
                "  Pension: ${:.2}/yr   Social Security: ${:.2}/yr at {}",
                result.pension.annual_pension,
                result.social_security.claiming_annual_amount,
                result.social_security.claiming_age
            );
            if let Some(supplement) = result.supplement.as_ref().filter(|s| s.is_eligible) {
                println!("  FERS supplement: ${:.2}/yr until {}", supplement.annual_amount, supplement.ends_at_age);
            }
            println!();

            print_rows(&result.rows);

            println!();
            println!("Summary:");
            println!("  Total gross income:    ${:>16.2}", result.summary.total_gross_income);
            println!("  Total taxes:           ${:>16.2}", result.summary.total_taxes);
            println!("  Total net income:      ${:>16.2}", result.summary.total_net_income);
            println!("  Max account balance:   ${:>16.2}", result.summary.max_account_balance);
            println!("  Final account balance: ${:>16.2}", result.summary.final_account_balance);

            if !result.notes.is_empty() {
                println!();
                println!("Notes:");
                for note in &result.notes {
                    println!("  - {}", note);
                }
            }
        }
    }
    Ok(())
}

fn run_compare(assumptions: Assumptions, dir: &Path, file: &str, format: OutputFormat) -> Result<()> {
    let store = ScenarioStore::new(dir);
    let scenarios = store
        .read(file)
        .with_context(|| format!("Failed to read scenario file {}", store.path_for(file).display()))?
        .scenarios;

    let runner = ScenarioRunner::with_assumptions(assumptions);
    let comparison = runner.compare(&scenarios);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&comparison)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            wtr.write_record(["id", "name", "gross", "taxes", "net", "final_balance", "error"])?;
            for c in &comparison {
                let (gross, taxes, net, balance) = c
                    .summary
                    .as_ref()
                    .map(|s| (s.total_gross_income, s.total_taxes, s.total_net_income, s.final_account_balance))
                    .unwrap_or_default();
                wtr.write_record([
                    c.id.to_string(),
                    c.name.clone(),
                    format!("{:.2}", gross),
                    format!("{:.2}", taxes),
                    format!("{:.2}", net),
                    format!("{:.2}", balance),
                    c.error.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Table => {
            println!(
                "{:>6} {:<24} {:>16} {:>14} {:>16} {:>16}",
                "ID", "Name", "Gross", "Taxes", "Net", "Final Balance"
            );
            println!("{}", "-".repeat(96));
            for c in &comparison {
                match &c.summary {
                    Some(s) => println!(
                        "{:>6} {:<24} {:>16.2} {:>14.2} {:>16.2} {:>16.2}",
                        c.id, c.name, s.total_gross_income, s.total_taxes, s.total_net_income, s.final_account_balance
                    ),
                    None => println!(
                        "{:>6} {:<24} ERROR: {}",
                        c.id,
                        c.name,
                        c.error.as_deref().unwrap_or("unknown")
                    ),
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let assumptions = load_assumptions(cli.tables.as_deref())?;
    let format = cli.output;

    match cli.command {
        Commands::Project { input, csv } => run_project(&assumptions, &input, csv.as_deref(), format),
        Commands::Compare { file, dir } => run_compare(assumptions, &dir, &file, format),
        Commands::Pension { input } => {
            emit(format, &api::compute_pension(&read_json(&input)?, &assumptions)?)
        }
        Commands::SocialSecurity { input } => {
            emit(format, &api::compute_social_security(&read_json(&input)?, &assumptions)?)
        }
        Commands::Account { input } => {
            let result = api::compute_account_projection(&read_json(&input)?, &assumptions)?;
            match format {
                OutputFormat::Csv => {
                    let mut wtr = csv::Writer::from_writer(io::stdout());
                    for year in &result.years {
                        wtr.serialize(year)?;
                    }
                    wtr.flush()?;
                    Ok(())
                }
                _ => emit(format, &result),
            }
        }
        Commands::Tax { input } => {
            emit(format, &api::compute_tax_liability(&read_json(&input)?, &assumptions)?)
        }
        Commands::Cola { input } => {
            emit(format, &api::compute_cola_adjustment(&read_json(&input)?, &assumptions)?)
        }
        Commands::Health { input } => emit(format, &api::compute_health_premiums(&read_json(&input)?)?),
        Commands::MonteCarlo { input } => emit(format, &api::run_monte_carlo(&read_json(&input)?)?),
    }
}
