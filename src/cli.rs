use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DrawConfig, SolverConfig};
use crate::core::interp::InterpMethod;
use crate::core::kernel::KernelKind;
use crate::core::linspace::Linspace;
use crate::plot::DrawJob;
use crate::solver::sweep::SweepConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, global = true, default_value = "kurtic.toml")]
    pub config: String,

    /// Log solver iterations and other debug detail
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render the 5×5 contour matrix of a surface table
    Draw(DrawArgs),
    /// Solve kernel parameters over an (excess, σ) grid and write the surface
    Solve(SolveArgs),
    /// Print dispersion and excess kurtosis of a kernel
    Moments(MomentsArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct DrawArgs {
    /// Dimension tag used in file names and the title (e.g. 1, 2, 3)
    #[arg(value_name = "DIMENSION")]
    pub dimension: Option<String>,

    /// Lower bound of the contour range
    #[arg(value_name = "ZMIN", requires = "z_max", allow_negative_numbers = true)]
    pub z_min: Option<f64>,

    /// Upper bound of the contour range
    #[arg(value_name = "ZMAX", allow_negative_numbers = true)]
    pub z_max: Option<f64>,

    /// First excess-kurtosis value of the row/column captions
    #[arg(value_name = "KMIN", requires = "k_max", allow_negative_numbers = true)]
    pub k_min: Option<f64>,

    /// Last excess-kurtosis value of the row/column captions
    #[arg(value_name = "KMAX", allow_negative_numbers = true)]
    pub k_max: Option<f64>,

    /// Input table (default: surface{DIMENSION}d.plt)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output PNG (default: plots{DIMENSION}d.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rows per subplot block (overrides config)
    #[arg(long)]
    pub shift: Option<usize>,

    /// Interpolation method (overrides config)
    #[arg(long, value_enum)]
    pub interpolation: Option<InterpMethod>,
}

impl DrawArgs {
    /// Applies command-line overrides on top of the configured defaults.
    pub fn resolve(&self, config: &DrawConfig) -> DrawJob {
        let mut draw = config.clone();
        if let Some(dimension) = &self.dimension {
            draw.dimension = dimension.clone();
        }
        if let (Some(lo), Some(hi)) = (self.z_min, self.z_max) {
            draw.z_min = lo;
            draw.z_max = hi;
        }
        if let (Some(lo), Some(hi)) = (self.k_min, self.k_max) {
            draw.k_min = lo;
            draw.k_max = hi;
        }
        if let Some(shift) = self.shift {
            draw.shift = shift;
        }
        if let Some(method) = self.interpolation {
            draw.interpolation = method;
        }
        let input = self
            .input
            .clone()
            .unwrap_or_else(|| PathBuf::from(draw.input_for(&draw.dimension)));
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(draw.output_for(&draw.dimension)));
        DrawJob {
            dimension: draw.dimension.clone(),
            input,
            output,
            draw,
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SolveArgs {
    /// Excess-kurtosis grid as BEGIN:COUNT:LAST
    #[arg(long, allow_hyphen_values = true)]
    pub excess: Linspace,

    /// σ grid as BEGIN:COUNT:LAST; the target dispersion is σ²
    #[arg(long, allow_hyphen_values = true)]
    pub sigma: Linspace,

    /// Quadrature nodes over the kernel support (overrides config)
    #[arg(long)]
    pub space_points: Option<usize>,

    /// Convergence threshold on |Δk| + |Δd| (overrides config)
    #[arg(long)]
    pub eps: Option<f64>,

    /// Kernel family (overrides config)
    #[arg(long, value_enum)]
    pub kernel: Option<KernelKind>,

    /// Output surface table
    #[arg(short, long)]
    pub output: PathBuf,
}

impl SolveArgs {
    pub fn resolve(&self, config: &SolverConfig) -> SweepConfig {
        let mut newton = config.newton();
        if let Some(eps) = self.eps {
            newton.eps = eps;
        }
        SweepConfig {
            kernel: self.kernel.unwrap_or(config.kernel),
            excess: self.excess,
            sigma: self.sigma,
            space_points: self.space_points.unwrap_or(config.space_points),
            newton,
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MomentsArgs {
    /// First kernel parameter
    #[arg(allow_negative_numbers = true)]
    pub a: f64,

    /// Second kernel parameter
    #[arg(allow_negative_numbers = true)]
    pub b: f64,

    /// Quadrature nodes over the kernel support (overrides config)
    #[arg(long)]
    pub points: Option<usize>,

    /// Kernel family (overrides config)
    #[arg(long, value_enum)]
    pub kernel: Option<KernelKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_args(argv: &[&str]) -> DrawArgs {
        let mut full = vec!["kurtic", "draw"];
        full.extend_from_slice(argv);
        match Args::try_parse_from(full).unwrap().command {
            Command::Draw(d) => d,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bare_draw_uses_config_defaults() {
        let job = draw_args(&[]).resolve(&DrawConfig::default());
        assert_eq!(job.dimension, "1");
        assert_eq!(job.input, PathBuf::from("surface1d.plt"));
        assert_eq!(job.output, PathBuf::from("plots1d.png"));
        assert_eq!(job.draw.z_min, 0.0);
        assert_eq!(job.draw.z_max, 8.0);
        assert_eq!(job.draw.k_min, -1.0);
    }

    #[test]
    fn positionals_override_in_order() {
        let job = draw_args(&["2", "-1", "4", "-0.5", "0.5"]).resolve(&DrawConfig::default());
        assert_eq!(job.dimension, "2");
        assert_eq!(job.input, PathBuf::from("surface2d.plt"));
        assert_eq!(job.draw.z_min, -1.0);
        assert_eq!(job.draw.z_max, 4.0);
        assert_eq!(job.draw.k_min, -0.5);
        assert_eq!(job.draw.k_max, 0.5);
    }

    #[test]
    fn zmin_without_zmax_is_rejected() {
        assert!(Args::try_parse_from(["kurtic", "draw", "3", "1.0"]).is_err());
    }

    #[test]
    fn named_options_override_derived_paths() {
        let job = draw_args(&["3", "--input", "in.plt", "-o", "out.png", "--shift", "400"])
            .resolve(&DrawConfig::default());
        assert_eq!(job.input, PathBuf::from("in.plt"));
        assert_eq!(job.output, PathBuf::from("out.png"));
        assert_eq!(job.draw.shift, 400);
    }

    #[test]
    fn solve_parses_grids() {
        let args = Args::try_parse_from([
            "kurtic", "solve", "--excess", "-1:5:1", "--sigma", "0.5:4:2", "--kernel",
            "roughgarden", "-o", "surface.plt",
        ])
        .unwrap();
        let Command::Solve(solve) = args.command else {
            panic!("expected solve");
        };
        let sweep = solve.resolve(&SolverConfig::default());
        assert_eq!(sweep.kernel, KernelKind::Roughgarden);
        assert_eq!(sweep.excess.count, 5);
        assert_eq!(sweep.excess.origin, -1.0);
        assert_eq!(sweep.sigma.step, 0.5);
        assert_eq!(sweep.space_points, 10_001);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["kurtic", "moments", "1", "1", "--config", "x.toml", "-v"])
                .unwrap();
        assert_eq!(args.config, "x.toml");
        assert!(args.verbose);
    }
}
