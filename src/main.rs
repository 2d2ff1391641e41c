// Entry point: parses arguments, loads the config and dispatches to draw/solve/moments.
use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kurtic::cli::{Args, Command, DrawArgs, MomentsArgs, SolveArgs};
use kurtic::config::AppConfig;
use kurtic::core::kernel::MomentProbe;
use kurtic::plot;
use kurtic::solver::sweep;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = AppConfig::load_or_default(&args.config);

    match &args.command {
        Command::Draw(draw) => run_draw(draw, &config),
        Command::Solve(solve) => run_solve(solve, &config),
        Command::Moments(moments) => run_moments(moments, &config),
    }
}

fn run_draw(args: &DrawArgs, config: &AppConfig) -> Result<()> {
    let job = args.resolve(&config.draw);
    println!("{}", job.banner());

    let summary = plot::run(&job, &config.render)
        .with_context(|| format!("drawing {} from {}", job.output.display(), job.input.display()))?;
    if let Some((lo, hi)) = summary.value_range {
        info!("Interpolated values span {lo:.3}..{hi:.3}");
    }
    Ok(())
}

fn run_solve(args: &SolveArgs, config: &AppConfig) -> Result<()> {
    let sweep_cfg = args.resolve(&config.solver);
    info!(
        "Solving {} × {} grid with the {} kernel",
        sweep_cfg.excess.count,
        sweep_cfg.sigma.count,
        sweep_cfg.kernel.name()
    );
    let points = sweep::run_sweep(&sweep_cfg).context("initialising the solver")?;
    sweep::save_surface(&args.output, &points)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let stats = sweep::stats(&points);
    info!(
        "Wrote {} rows to {} ({} converged, {} unconverged, {} failed)",
        points.len(),
        args.output.display(),
        stats.converged,
        stats.unconverged,
        stats.failed
    );
    Ok(())
}

fn run_moments(args: &MomentsArgs, config: &AppConfig) -> Result<()> {
    let kind = args.kernel.unwrap_or(config.solver.kernel);
    let points = args.points.unwrap_or(config.solver.space_points);
    let mut probe = MomentProbe::new(kind, points)?;
    let m = probe
        .moments(args.a, args.b)
        .with_context(|| format!("moments of the {} kernel", kind.name()))?;
    println!("k = {:.6}, d = {:.6}", m.excess, m.dispersion);
    Ok(())
}
