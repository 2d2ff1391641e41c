//! Damped Newton iteration for the two-parameter moment-matching problem.
//!
//! The residual is `F(a, b) = (k(a, b) - k*, d(a, b) - d*)`. Each step solves
//! `J · δ = F` and halves `δ` until the residual's L1 norm decreases (or the
//! kernel can be evaluated at all). Convergence is declared once
//! `|F₀| + |F₁| < eps`.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::kernel::{Evaluation, MomentProbe, Moments};
use crate::error::KurticResult;

/// Maps kernel parameters `(a, b)` to moments, with an optional Jacobian.
pub trait MomentModel {
    fn evaluate(&mut self, a: f64, b: f64) -> KurticResult<Evaluation>;
}

impl MomentModel for MomentProbe {
    fn evaluate(&mut self, a: f64, b: f64) -> KurticResult<Evaluation> {
        MomentProbe::evaluate(self, a, b)
    }
}

/// Relative perturbation for forward-difference Jacobians.
const FD_REL_STEP: f64 = 1.5e-8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewtonOptions {
    pub max_iter: usize,
    pub eps: f64,
    pub max_halvings: usize,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            max_iter: 100,
            eps: 1e-6,
            max_halvings: 30,
        }
    }
}

/// Requested excess kurtosis and dispersion (variance).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub excess: f64,
    pub dispersion: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Converged,
    MaxIterations,
    /// Singular Jacobian, or no step length reduced the residual.
    Stuck,
}

#[derive(Debug, Clone, Copy)]
pub struct Solution {
    pub a: f64,
    pub b: f64,
    pub moments: Moments,
    pub residual: f64,
    pub iterations: usize,
    pub termination: Termination,
}

impl Solution {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

fn residual_of(m: Moments, target: Target) -> Vector2<f64> {
    Vector2::new(m.excess - target.excess, m.dispersion - target.dispersion)
}

fn l1(v: &Vector2<f64>) -> f64 {
    v[0].abs() + v[1].abs()
}

fn jacobian_at<M: MomentModel>(
    model: &mut M,
    x: Vector2<f64>,
    eval: &Evaluation,
    target: Target,
) -> Option<Matrix2<f64>> {
    if let Some(j) = eval.jacobian {
        return Some(j);
    }
    let f0 = residual_of(eval.moments, target);
    let mut j = Matrix2::zeros();
    for c in 0..2 {
        let h = FD_REL_STEP * x[c].abs().max(1.0);
        let mut xp = x;
        xp[c] += h;
        let fp = residual_of(model.evaluate(xp[0], xp[1]).ok()?.moments, target);
        j.set_column(c, &((fp - f0) / h));
    }
    Some(j)
}

/// Solves for `(a, b)` starting at `guess`. Errors only when the kernel
/// cannot be evaluated at the starting point.
pub fn solve_point<M: MomentModel>(
    model: &mut M,
    target: Target,
    guess: (f64, f64),
    opts: &NewtonOptions,
) -> KurticResult<Solution> {
    let mut x = Vector2::new(guess.0, guess.1);
    let mut eval = model.evaluate(x[0], x[1])?;
    let mut f = residual_of(eval.moments, target);
    let mut iterations = 0;

    let finish = |x: Vector2<f64>, eval: &Evaluation, f: &Vector2<f64>, iterations, termination| {
        Solution {
            a: x[0],
            b: x[1],
            moments: eval.moments,
            residual: l1(f),
            iterations,
            termination,
        }
    };

    while iterations < opts.max_iter {
        if l1(&f) < opts.eps {
            return Ok(finish(x, &eval, &f, iterations, Termination::Converged));
        }
        iterations += 1;

        let Some(delta) = jacobian_at(model, x, &eval, target)
            .and_then(|j| j.try_inverse())
            .map(|inv| inv * f)
        else {
            warn!(
                "Stuck at iteration {iterations}: singular Jacobian at (a = {:.6}, b = {:.6})",
                x[0], x[1]
            );
            return Ok(finish(x, &eval, &f, iterations, Termination::Stuck));
        };

        let mut scale = 1.0;
        let mut accepted = None;
        for _ in 0..=opts.max_halvings {
            let candidate = x - delta * scale;
            if let Ok(next) = model.evaluate(candidate[0], candidate[1]) {
                let next_f = residual_of(next.moments, target);
                if l1(&next_f).is_finite() && l1(&next_f) < l1(&f) {
                    accepted = Some((candidate, next, next_f));
                    break;
                }
            }
            scale *= 0.5;
        }

        let Some((next_x, next_eval, next_f)) = accepted else {
            warn!(
                "Stuck at iteration {iterations}: no descent step from (a = {:.6}, b = {:.6})",
                x[0], x[1]
            );
            return Ok(finish(x, &eval, &f, iterations, Termination::Stuck));
        };

        debug!(
            iteration = iterations,
            a = next_x[0],
            b = next_x[1],
            residual = l1(&next_f),
            step_scale = scale,
            "newton step"
        );
        x = next_x;
        eval = next_eval;
        f = next_f;
    }

    let termination = if l1(&f) < opts.eps {
        Termination::Converged
    } else {
        Termination::MaxIterations
    };
    Ok(finish(x, &eval, &f, iterations, termination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::KernelKind;
    use approx::assert_abs_diff_eq;

    #[test]
    fn recovers_gaussian_parameters_from_nearby_guess() {
        let mut probe = MomentProbe::new(KernelKind::Kurtic, 4001).unwrap();
        let target = Target {
            excess: 0.0,
            dispersion: 4.0,
        };
        let opts = NewtonOptions {
            eps: 1e-9,
            ..NewtonOptions::default()
        };
        let sol = solve_point(&mut probe, target, (0.3, 0.2), &opts).unwrap();
        assert!(sol.converged(), "termination: {:?}", sol.termination);
        assert_abs_diff_eq!(sol.a, 0.25, epsilon = 1e-4);
        assert_abs_diff_eq!(sol.b, 0.25, epsilon = 1e-4);
    }

    #[test]
    fn finite_difference_path_converges_for_roughgarden() {
        let mut probe = MomentProbe::new(KernelKind::Roughgarden, 4001).unwrap();
        let truth = probe.moments(1.5, 2.0).unwrap();
        let target = Target {
            excess: truth.excess,
            dispersion: truth.dispersion,
        };
        let sol = solve_point(&mut probe, target, (1.3, 2.2), &NewtonOptions::default()).unwrap();
        assert!(sol.converged(), "termination: {:?}", sol.termination);
        assert_abs_diff_eq!(sol.a, 1.5, epsilon = 1e-3);
        assert_abs_diff_eq!(sol.b, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn already_converged_guess_takes_no_steps() {
        let mut probe = MomentProbe::new(KernelKind::Kurtic, 2001).unwrap();
        let m = probe.moments(1.0, 1.0).unwrap();
        let target = Target {
            excess: m.excess,
            dispersion: m.dispersion,
        };
        let sol = solve_point(&mut probe, target, (1.0, 1.0), &NewtonOptions::default()).unwrap();
        assert_eq!(sol.iterations, 0);
        assert!(sol.converged());
    }

    #[test]
    fn iteration_cap_reports_last_iterate() {
        let mut probe = MomentProbe::new(KernelKind::Kurtic, 4001).unwrap();
        let target = Target {
            excess: 0.0,
            dispersion: 4.0,
        };
        let start = probe.moments(0.3, 0.2).unwrap();
        let start_residual =
            (start.excess - target.excess).abs() + (start.dispersion - target.dispersion).abs();
        let opts = NewtonOptions {
            max_iter: 1,
            eps: 1e-9,
            ..NewtonOptions::default()
        };
        let sol = solve_point(&mut probe, target, (0.3, 0.2), &opts).unwrap();
        assert_eq!(sol.termination, Termination::MaxIterations);
        assert_eq!(sol.iterations, 1);
        assert!(!sol.converged());
        assert!(sol.a != 0.3 || sol.b != 0.2);
        assert!(sol.residual.is_finite());
        assert!(sol.residual < start_residual);
        let m = probe.moments(sol.a, sol.b).unwrap();
        assert_abs_diff_eq!(m.excess, sol.moments.excess, epsilon = 1e-12);
        assert_abs_diff_eq!(m.dispersion, sol.moments.dispersion, epsilon = 1e-12);
    }

    #[test]
    fn unreachable_excess_never_converges() {
        // roughgarden excess stays above -1.2 (the uniform limit)
        let mut probe = MomentProbe::new(KernelKind::Roughgarden, 2001).unwrap();
        let target = Target {
            excess: -1.5,
            dispersion: 1.0,
        };
        let opts = NewtonOptions {
            max_iter: 20,
            ..NewtonOptions::default()
        };
        let sol = solve_point(&mut probe, target, (1.0, 4.0), &opts).unwrap();
        assert!(
            matches!(
                sol.termination,
                Termination::MaxIterations | Termination::Stuck
            ),
            "termination: {:?}",
            sol.termination
        );
        assert!(sol.iterations <= 20);
        assert!(sol.a.is_finite() && sol.b.is_finite());
        assert!(sol.residual.is_finite() && sol.residual > 0.2);
    }

    /// Moments that ignore `b`, so every Jacobian is singular.
    struct FlatInB;

    impl MomentModel for FlatInB {
        fn evaluate(&mut self, a: f64, _b: f64) -> KurticResult<Evaluation> {
            Ok(Evaluation {
                moments: Moments {
                    dispersion: 2.0 * a,
                    excess: a,
                },
                jacobian: Some(Matrix2::new(1.0, 0.0, 2.0, 0.0)),
            })
        }
    }

    /// Evaluable only at the starting point.
    struct Cliff;

    impl MomentModel for Cliff {
        fn evaluate(&mut self, a: f64, b: f64) -> KurticResult<Evaluation> {
            if (a, b) != (1.0, 1.0) {
                return Err(crate::error::KurticError::KernelNotDecaying {
                    kernel: "cliff",
                    a,
                    b,
                });
            }
            Ok(Evaluation {
                moments: Moments {
                    dispersion: b,
                    excess: a,
                },
                jacobian: Some(Matrix2::identity()),
            })
        }
    }

    #[test]
    fn singular_jacobian_is_stuck_at_the_guess() {
        let target = Target {
            excess: 0.5,
            dispersion: 3.0,
        };
        let sol = solve_point(&mut FlatInB, target, (1.0, 1.0), &NewtonOptions::default()).unwrap();
        assert_eq!(sol.termination, Termination::Stuck);
        assert_eq!(sol.iterations, 1);
        assert_eq!((sol.a, sol.b), (1.0, 1.0));
        assert_abs_diff_eq!(sol.residual, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn failed_descent_is_stuck_at_the_guess() {
        let target = Target {
            excess: 0.0,
            dispersion: 0.0,
        };
        let sol = solve_point(&mut Cliff, target, (1.0, 1.0), &NewtonOptions::default()).unwrap();
        assert_eq!(sol.termination, Termination::Stuck);
        assert_eq!(sol.iterations, 1);
        assert_eq!((sol.a, sol.b), (1.0, 1.0));
        assert_abs_diff_eq!(sol.residual, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn unevaluable_start_is_an_error() {
        let mut probe = MomentProbe::new(KernelKind::Kurtic, 2001).unwrap();
        let target = Target {
            excess: 0.0,
            dispersion: 1.0,
        };
        assert!(solve_point(&mut probe, target, (1.0, 0.0), &NewtonOptions::default()).is_err());
    }
}
