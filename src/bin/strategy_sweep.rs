//! Sweep every configured asset strategy in parallel and print a compact
//! funded-status comparison
//!
//! Writes each strategy's percentile table to CSV; the shared rates table is
//! skipped, use the main binary for full report output.

use anyhow::Context;
use clap::Parser;
use pension_alm::grid::load_scenario_grid;
use pension_alm::reporting::quantile;
use pension_alm::runner::StrategyOutput;
use pension_alm::{AlmRunner, Diagnostics, RunConfig};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "strategy_sweep", about = "Compare asset strategies side by side")]
struct Args {
    /// Scenario grid CSV (Trial,Timestep, then value columns)
    #[arg(long)]
    scenarios: PathBuf,

    /// Run configuration JSON
    #[arg(long)]
    config: PathBuf,

    /// Directory the per-strategy percentile CSVs are written to
    #[arg(long, default_value = "sweep_output")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    println!("Loading scenario grid from {}...", args.scenarios.display());
    let grid = load_scenario_grid(&args.scenarios)
        .with_context(|| format!("loading scenario grid {}", args.scenarios.display()))?;
    let config = RunConfig::from_path(&args.config)
        .with_context(|| format!("loading run config {}", args.config.display()))?;
    let horizon = grid.shape().horizon;

    let bases = config
        .bases
        .iter()
        .map(|b| b.to_basis())
        .collect::<Result<Vec<_>, _>>()?;
    let first_basis = bases
        .first()
        .map(|b| b.name.clone())
        .context("run config has no discounting bases")?;

    let mut diags = Diagnostics::new();
    let runner = AlmRunner::new(grid, &config.curve_mapping, bases, &mut diags)?;
    let model = runner.build_liability(&config.liability)?;
    println!(
        "Prepared liability and curves in {:?}; sweeping {} strategies...",
        start.elapsed(),
        config.strategies.len()
    );

    let sweep_start = Instant::now();
    let results: Vec<(String, Diagnostics, StrategyOutput)> = config
        .strategies
        .par_iter()
        .map(|strategy| {
            let mut strategy_diags = Diagnostics::new();
            let output = runner
                .run_strategy(&model, strategy, &config.reporting, &mut strategy_diags)?;
            Ok((strategy.name.clone(), strategy_diags, output))
        })
        .collect::<Result<_, pension_alm::AlmError>>()?;
    println!("Swept in {:?}", sweep_start.elapsed());

    std::fs::create_dir_all(&args.output)?;
    let funding_column = format!("Funding_level_{}", first_basis);
    println!(
        "\n{:<20} {:>14} {:>14} {:>14}",
        "Strategy", "Median FL Y0", "Median FL end", "5% FL end"
    );
    println!("{}", "-".repeat(66));

    for (name, strategy_diags, output) in &results {
        let funding = output
            .frame
            .column(&funding_column)
            .with_context(|| format!("missing column {}", funding_column))?;
        let day0 = quantile(&funding.at_timestep(0), 0.5);
        let terminal = funding.at_timestep(horizon);
        println!(
            "{:<20} {:>14.4} {:>14.4} {:>14.4}",
            name,
            day0,
            quantile(&terminal, 0.5),
            quantile(&terminal, 0.05)
        );

        if let Some(table) = output.reports.get("percentiles") {
            let path = args.output.join(format!("percentiles_{}.csv", name));
            table
                .write_csv(&path)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        diags.extend(strategy_diags.clone());
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
