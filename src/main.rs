use clap::{Args, Parser, Subcommand};
use log::*;
use siteplan::config::RunConfig;
use siteplan::error::{Error, Result};
use siteplan::oracle::{FsplOracle, SignalOracle};
use siteplan::planner::SearchBuilder;
use siteplan::report::write_coverage_csv;
use siteplan::scene::{extract_candidates, SceneFile};
use siteplan::search::SearchBudget;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "siteplan", about = "Base-station placement optimizer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a placement search from a config file.
    Run(RunArgs),
    /// Write an example config file to get started.
    InitConfig {
        /// Destination path.
        #[arg(default_value = "siteplan.toml")]
        path: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to the run config.
    #[arg(short, long, default_value = "siteplan.toml")]
    config: PathBuf,
    /// Override the scene file named in the config.
    #[arg(long)]
    scene: Option<PathBuf>,
    /// Where to write the winning placement.
    #[arg(short, long, default_value = "placement.csv")]
    out: PathBuf,
    /// Also write the winner's coverage map here.
    #[arg(long)]
    coverage_out: Option<PathBuf>,
    /// Override the worker count from the config.
    #[arg(long)]
    workers: Option<usize>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Run(args) => run(args),
        Command::InitConfig { path } => init_config(path),
    };
    if let Err(err) = outcome {
        error!("{err}");
        std::process::exit(1);
    }
}

fn init_config(path: PathBuf) -> Result<()> {
    RunConfig::example().save(&path)?;
    println!("wrote example config to {}", path.display());
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let config = RunConfig::load(&args.config)?;

    let scene_path = args
        .scene
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| config.scene.clone());
    let scene = SceneFile::load(&scene_path)?;
    let candidates = extract_candidates(&scene, config.height_threshold)?;
    info!(
        "{} candidate sites above {} m",
        candidates.len(),
        config.height_threshold
    );

    let oracle = Arc::new(FsplOracle::new(
        config.oracle.frequency_hz,
        config.oracle.tx_power_dbm,
    ));
    let mut builder = SearchBuilder::new(oracle.clone(), config.grid.clone())
        .candidates(candidates)
        .k(config.k)
        .aggregation(config.aggregation)
        .timeout_per_evaluation(config.timeout());
    if let Some(layout) = config.cluster_layout.clone() {
        builder = builder.cluster_layout(layout);
    }

    let budget = match config.wall_clock_budget() {
        Some(limit) => SearchBudget::wall_clock(limit),
        None => SearchBudget::unlimited(),
    };
    let workers = args.workers.unwrap_or(config.worker_count);
    let result = if workers > 1 {
        builder.run_parallel(workers, &budget)?
    } else {
        builder.run(&budget)?
    };

    if !result.completed {
        warn!(
            "budget expired after {}/{} placements; result is partial",
            result.evaluated, result.placements_total
        );
    }
    if !result.failures.is_empty() {
        warn!("{} placement evaluations failed", result.failures.len());
    }

    let best = result
        .best
        .as_ref()
        .ok_or_else(|| Error::AllEvaluationsFailed {
            attempted: result.evaluated,
        })?;
    println!(
        "best placement: score {} over {} evaluated placements ({} failures)",
        best.score,
        result.evaluated,
        result.failures.len()
    );
    for site in result.winning_sites() {
        println!(
            "  {} at ({}, {}, {})",
            site.id, site.position.x, site.position.y, site.position.z
        );
    }

    let mut out = BufWriter::new(File::create(&args.out)?);
    result.write_csv(&mut out)?;
    out.flush()?;
    println!("placement written to {}", args.out.display());

    if let Some(coverage_path) = args.coverage_out {
        let samples = oracle
            .evaluate(&best.placement.resolve(&result.candidates), &config.grid)
            .map_err(Error::OracleUnavailable)?;
        let mut coverage = BufWriter::new(File::create(&coverage_path)?);
        write_coverage_csv(&mut coverage, &config.grid, &samples)?;
        coverage.flush()?;
        println!("coverage written to {}", coverage_path.display());
    }

    Ok(())
}
