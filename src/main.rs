//! Pension ALM CLI
//!
//! Loads a scenario grid and a run configuration, projects every configured
//! asset strategy against the liability, and writes the report tables to CSV.

use anyhow::Context;
use clap::Parser;
use pension_alm::grid::{load_cashflow_schedule, load_margin_table, load_scenario_grid};
use pension_alm::{AlmRunner, Diagnostics, DiscountBasis, RunConfig};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "pension_alm", about = "Stochastic ALM projection for pension balance sheets")]
struct Args {
    /// Scenario grid CSV (Trial,Timestep, then value columns)
    #[arg(long)]
    scenarios: PathBuf,

    /// Run configuration JSON (curve mapping, bases, liability, strategies)
    #[arg(long)]
    config: PathBuf,

    /// Optional Year,nominal,real cashflow CSV overriding the config schedule
    #[arg(long)]
    cashflows: Option<PathBuf>,

    /// Optional tenor-by-basis margin CSV overriding the config margins
    /// (one column per configured basis, in basis order)
    #[arg(long)]
    margins: Option<PathBuf>,

    /// Directory the report CSVs are written to
    #[arg(long, default_value = "alm_output")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    println!("Loading scenario grid from {}...", args.scenarios.display());
    let grid = load_scenario_grid(&args.scenarios)
        .with_context(|| format!("loading scenario grid {}", args.scenarios.display()))?;
    println!(
        "Loaded {} trials x {} timesteps in {:?}",
        grid.shape().trials,
        grid.shape().steps(),
        start.elapsed()
    );

    let mut config = RunConfig::from_path(&args.config)
        .with_context(|| format!("loading run config {}", args.config.display()))?;
    if let Some(path) = &args.cashflows {
        config.liability.cashflows = Some(
            load_cashflow_schedule(path)
                .with_context(|| format!("loading cashflow schedule {}", path.display()))?,
        );
    }

    let bases = if let Some(path) = &args.margins {
        let margins = load_margin_table(path)
            .with_context(|| format!("loading margin table {}", path.display()))?;
        let names: Vec<String> = config.bases.iter().map(|b| b.name.clone()).collect();
        let families: Vec<_> = config.bases.iter().map(|b| b.base).collect();
        DiscountBasis::from_tables(&names, &families, &margins)?
    } else {
        config
            .bases
            .iter()
            .map(|b| b.to_basis())
            .collect::<Result<Vec<_>, _>>()?
    };
    let basis_names: Vec<&str> = bases.iter().map(|b| b.name.as_str()).collect();
    println!(
        "Running {} strategies on bases [{}]...",
        config.strategies.len(),
        basis_names.join(", ")
    );

    let mut diags = Diagnostics::new();
    let run_start = Instant::now();
    let runner = AlmRunner::new(grid, &config.curve_mapping, bases, &mut diags)?;
    let reports = runner.run_strategies(
        &config.liability,
        &config.strategies,
        &config.reporting,
        &mut diags,
    )?;
    println!(
        "Projection complete: {} report tables in {:?}",
        reports.len(),
        run_start.elapsed()
    );

    reports
        .write_all(&args.output)
        .with_context(|| format!("writing reports to {}", args.output.display()))?;
    for name in reports.names() {
        println!("  wrote {}/{}.csv", args.output.display(), name);
    }

    if !diags.is_empty() {
        println!("\nDiagnostics ({}):", diags.len());
        for message in diags.messages() {
            println!("  - {}", message);
        }
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
