//! Parameter surface over an (excess kurtosis, σ) sweep.
//!
//! Rows are produced with excess as the outer loop and σ as the inner one;
//! the target dispersion of each point is σ².

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::core::kernel::{KernelKind, MomentProbe};
use crate::core::linspace::Linspace;
use crate::error::{KurticError, KurticResult};
use crate::solver::newton::{MomentModel, NewtonOptions, Target, Termination, solve_point};

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub kernel: KernelKind,
    pub excess: Linspace,
    pub sigma: Linspace,
    pub space_points: usize,
    pub newton: NewtonOptions,
}

#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint {
    pub excess: f64,
    pub sigma: f64,
    pub a: f64,
    pub b: f64,
    /// `None` when the kernel could not be evaluated at the initial guess.
    pub termination: Option<Termination>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub converged: usize,
    pub unconverged: usize,
    pub failed: usize,
}

pub fn run_sweep(cfg: &SweepConfig) -> KurticResult<Vec<SurfacePoint>> {
    let mut probe = MomentProbe::new(cfg.kernel, cfg.space_points)?;
    let mut points = Vec::with_capacity(cfg.excess.count * cfg.sigma.count);

    for k in cfg.excess.points() {
        for sigma in cfg.sigma.points() {
            let guess = cfg.kernel.initial_guess(k, sigma * sigma);
            points.push(solve_surface_point(&mut probe, k, sigma, guess, &cfg.newton));
        }
    }
    Ok(points)
}

/// Solves one `(k, σ)` grid point from `guess`. A point whose guess cannot be
/// evaluated comes back with `NaN` parameters and no termination.
pub fn solve_surface_point<M: MomentModel>(
    model: &mut M,
    k: f64,
    sigma: f64,
    guess: (f64, f64),
    newton: &NewtonOptions,
) -> SurfacePoint {
    let target = Target {
        excess: k,
        dispersion: sigma * sigma,
    };
    match solve_point(model, target, guess, newton) {
        Ok(sol) => {
            info!(
                "Input: (k = {:.6}, d = {:.6})  Solution: (a = {:.6}, b = {:.6})",
                k, target.dispersion, sol.a, sol.b
            );
            if !sol.converged() {
                warn!(
                    "k = {k:.6}, d = {:.6}: {:?} after {} iterations (residual {:.3e})",
                    target.dispersion, sol.termination, sol.iterations, sol.residual
                );
            }
            SurfacePoint {
                excess: k,
                sigma,
                a: sol.a,
                b: sol.b,
                termination: Some(sol.termination),
            }
        }
        Err(err) => {
            warn!("k = {k:.6}, d = {:.6}: {err}", target.dispersion);
            SurfacePoint {
                excess: k,
                sigma,
                a: f64::NAN,
                b: f64::NAN,
                termination: None,
            }
        }
    }
}

pub fn stats(points: &[SurfacePoint]) -> SweepStats {
    points
        .iter()
        .fold(SweepStats::default(), |mut acc, p| {
            match p.termination {
                Some(Termination::Converged) => acc.converged += 1,
                Some(_) => acc.unconverged += 1,
                None => acc.failed += 1,
            }
            acc
        })
}

/// One `k σ a b` row per point, six decimals each.
pub fn write_surface(out: &mut impl Write, points: &[SurfacePoint]) -> std::io::Result<()> {
    for p in points {
        writeln!(out, "{:.6} {:.6} {:.6} {:.6}", p.excess, p.sigma, p.a, p.b)?;
    }
    Ok(())
}

pub fn save_surface(path: &Path, points: &[SurfacePoint]) -> KurticResult<()> {
    let file = File::create(path).map_err(|e| KurticError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_surface(&mut out, points)
        .and_then(|_| out.flush())
        .map_err(|e| KurticError::io(path, e))
}
