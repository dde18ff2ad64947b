use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::HexapodKinematics;
use crate::angles::{Orientation, RollPitchYaw};
use crate::errors::HexapodError;
use crate::geometry::{rotation_matrix, rotation_partials};
use crate::lengths::{StrutLengths, STRUT_COUNT};

type Residuals = SVector<f64, STRUT_COUNT>;
type Jacobian = SMatrix<f64, STRUT_COUNT, 3>;

const MIN_DAMPING: f64 = 1e-12;
const MAX_DAMPING: f64 = 1e16;
const DAMPING_FACTOR: f64 = 10.0;

/// Which strut residuals drive the forward solve.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidualMode {
    /// Least squares over all six struts
    #[default]
    AllStruts,
    /// Square system over struts 0, 1 and 2 only; the other three readings
    /// are ignored
    FirstThree,
}

impl ResidualMode {
    fn uses(&self, strut: usize) -> bool {
        match self {
            ResidualMode::AllStruts => true,
            ResidualMode::FirstThree => strut < 3,
        }
    }
}

/// Tuning for the forward solver.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Stop once the residual norm falls to this value
    pub residual_tolerance: f64,
    /// Stop once an accepted step is this small relative to the estimate
    pub step_tolerance: f64,
    /// Stop once the largest gradient component falls to this value
    pub gradient_tolerance: f64,
    pub initial_damping: f64,
    pub residual_mode: ResidualMode,
    pub initial_guess: Orientation,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            residual_tolerance: 1e-10,
            step_tolerance: 1e-12,
            gradient_tolerance: 1e-8,
            initial_damping: 1e-3,
            residual_mode: ResidualMode::AllStruts,
            initial_guess: Orientation::zero(),
        }
    }
}

impl SolverConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_residual_mode(mut self, mode: ResidualMode) -> Self {
        self.residual_mode = mode;
        self
    }

    pub fn with_initial_guess(mut self, guess: Orientation) -> Self {
        self.initial_guess = guess;
        self
    }

    pub fn validate(&self) -> Result<(), HexapodError> {
        if self.max_iterations == 0 {
            return Err(HexapodError::Configuration(
                "Solver needs at least one iteration".to_string(),
            ));
        }
        let tolerances = [
            ("residual_tolerance", self.residual_tolerance),
            ("step_tolerance", self.step_tolerance),
            ("gradient_tolerance", self.gradient_tolerance),
            ("initial_damping", self.initial_damping),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value <= 0.0 {
                return Err(HexapodError::Configuration(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        let guess = self.initial_guess;
        if ![guess.roll.0, guess.pitch.0, guess.yaw.0].iter().all(|v| v.is_finite()) {
            return Err(HexapodError::Configuration("Initial guess must be finite".to_string()));
        }
        Ok(())
    }
}

/// Result of a successful forward solve.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ForwardSolution {
    pub orientation: Orientation,
    pub iterations: usize,
    /// Norm of the residuals the solver minimized
    pub residual_norm: f64,
}

impl HexapodKinematics {
    /// Orientation whose inverse kinematics best matches `observed`.
    ///
    /// Observed lengths need not be mutually consistent; the result is the
    /// least-squares fit.
    pub fn solve_forward(&self, observed: &StrutLengths) -> Result<Orientation, HexapodError> {
        self.solve_forward_detailed(observed).map(|s| s.orientation)
    }

    /// Forward solve reporting iteration count and final residual norm.
    ///
    /// Levenberg-Marquardt on `r(θ) = L(θ) - observed` with the analytic
    /// Jacobian `dL_i/dθ = (R·p_i - b_i) · (dR/dθ · p_i) / L_i`. Fails with
    /// [`HexapodError::Convergence`] if no criterion is met within the
    /// iteration budget or the damping grows without bound.
    pub fn solve_forward_detailed(&self, observed: &StrutLengths) -> Result<ForwardSolution, HexapodError> {
        let solver = &self.config.solver;
        let mode = solver.residual_mode;

        let mut x = solver.initial_guess.to_radians().as_vector();
        let (mut r, mut j) = self.linearize(&x, observed, mode);
        let mut cost = r.norm_squared();
        let mut lambda = solver.initial_damping;

        for iteration in 0..solver.max_iterations {
            let residual_norm = cost.sqrt();
            if residual_norm <= solver.residual_tolerance {
                return Ok(solution(&x, iteration, residual_norm));
            }

            let jt = j.transpose();
            let jtj: Matrix3<f64> = jt * j;
            let gradient: Vector3<f64> = jt * r;
            if gradient.amax() <= solver.gradient_tolerance {
                debug!("Forward solve stationary after {} iterations", iteration);
                return Ok(solution(&x, iteration, residual_norm));
            }

            loop {
                let mut damped = jtj;
                for k in 0..3 {
                    damped[(k, k)] += lambda * jtj[(k, k)].max(MIN_DAMPING);
                }

                if let Some(cholesky) = damped.cholesky() {
                    let step = cholesky.solve(&(-gradient));
                    let candidate = x + step;
                    let candidate_r = self.residual_vector(&candidate, observed, mode);
                    let candidate_cost = candidate_r.norm_squared();

                    if candidate_cost < cost {
                        lambda = (lambda / DAMPING_FACTOR).max(MIN_DAMPING);
                        x = candidate;
                        cost = candidate_cost;
                        (r, j) = self.linearize(&x, observed, mode);

                        debug!(
                            "iteration {}: residual norm {:.3e}, step {:.3e}, damping {:.1e}",
                            iteration,
                            cost.sqrt(),
                            step.norm(),
                            lambda
                        );

                        if step.norm() <= solver.step_tolerance * (x.norm() + solver.step_tolerance) {
                            return Ok(solution(&x, iteration + 1, cost.sqrt()));
                        }
                        break;
                    }
                }

                lambda *= DAMPING_FACTOR;
                if lambda > MAX_DAMPING {
                    warn!("Forward solve stalled at residual norm {:.3e}", cost.sqrt());
                    return Err(HexapodError::Convergence {
                        iterations: iteration + 1,
                        residual_norm: cost.sqrt(),
                    });
                }
            }
        }

        warn!(
            "Forward solve hit the iteration limit ({}) at residual norm {:.3e}",
            solver.max_iterations,
            cost.sqrt()
        );
        Err(HexapodError::Convergence {
            iterations: solver.max_iterations,
            residual_norm: cost.sqrt(),
        })
    }

    /// Per-strut residuals `L_i(orientation) - observed_i`, for all six struts.
    pub fn residuals(&self, orientation: &Orientation, observed: &StrutLengths) -> [f64; STRUT_COUNT] {
        let lengths = self.lengths_at(&orientation.to_radians());
        let mut residuals = [0.0; STRUT_COUNT];
        for (i, r) in residuals.iter_mut().enumerate() {
            *r = lengths[i] - observed[i];
        }
        residuals
    }

    /// Jacobian of the six strut lengths with respect to roll, pitch and yaw
    /// in radians.
    pub fn length_jacobian(&self, orientation: &Orientation) -> SMatrix<f64, STRUT_COUNT, 3> {
        // residuals against zero lengths are discarded
        let unused = StrutLengths::from_distances([0.0; STRUT_COUNT]);
        self.linearize(&orientation.to_radians().as_vector(), &unused, ResidualMode::AllStruts)
            .1
    }

    fn residual_vector(&self, x: &Vector3<f64>, observed: &StrutLengths, mode: ResidualMode) -> Residuals {
        let lengths = self.lengths_at(&RollPitchYaw::from_vector(x));
        Residuals::from_fn(|i, _| {
            if mode.uses(i) {
                lengths[i] - observed[i]
            } else {
                0.0
            }
        })
    }

    /// Residuals and Jacobian at `x`, with unused rows zeroed.
    fn linearize(&self, x: &Vector3<f64>, observed: &StrutLengths, mode: ResidualMode) -> (Residuals, Jacobian) {
        let rpy = RollPitchYaw::from_vector(x);
        let rotation = rotation_matrix(&rpy);
        let partials = rotation_partials(&rpy);

        let mut r = Residuals::zeros();
        let mut j = Jacobian::zeros();
        for i in 0..STRUT_COUNT {
            if !mode.uses(i) {
                continue;
            }
            let p = self.platform[i].coords;
            let d = rotation * p - self.base[i].coords;
            let length = d.norm();
            r[i] = length - observed[i];
            if length > 0.0 {
                for (k, partial) in partials.iter().enumerate() {
                    j[(i, k)] = d.dot(&(partial * p)) / length;
                }
            }
        }
        (r, j)
    }
}

fn solution(x: &Vector3<f64>, iterations: usize, residual_norm: f64) -> ForwardSolution {
    ForwardSolution {
        orientation: RollPitchYaw::from_vector(x).to_degrees(),
        iterations,
        residual_norm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_config::PlatformConfig;

    fn bench() -> HexapodKinematics {
        HexapodKinematics::from_config(PlatformConfig::default()).unwrap()
    }

    fn bench_with(solver: SolverConfig) -> HexapodKinematics {
        let mut config = PlatformConfig::default();
        config.solver = solver;
        HexapodKinematics::from_config(config).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let kin = bench();
        let o = Orientation::new(10.0, 5.0, 15.0);
        let lengths = kin.solve_inverse(&o);
        let solved = kin.solve_forward_detailed(&lengths).unwrap();

        println!("solved {:?} in {} iterations", solved.orientation, solved.iterations);
        assert!(solved.orientation.max_abs_diff(&o) < 1e-6);
        assert!(solved.residual_norm < 1e-6);
    }

    #[test]
    fn test_neutral_converges_immediately() {
        let kin = bench();
        let solved = kin.solve_forward_detailed(&kin.neutral_lengths()).unwrap();

        assert_eq!(solved.iterations, 0);
        assert!(solved.orientation.max_abs_diff(&Orientation::zero()) < 1e-9);
    }

    #[test]
    fn test_first_three_mode_round_trip() {
        let kin = bench_with(SolverConfig::default().with_residual_mode(ResidualMode::FirstThree));
        let o = Orientation::new(-20.0, 12.0, 25.0);
        let solved = kin.solve_forward(&kin.solve_inverse(&o)).unwrap();

        assert!(solved.max_abs_diff(&o) < 1e-6);
    }

    #[test]
    fn test_first_three_mode_ignores_other_struts() {
        let kin = bench_with(SolverConfig::default().with_residual_mode(ResidualMode::FirstThree));
        let o = Orientation::new(5.0, -5.0, 5.0);
        let mut lengths = *kin.solve_inverse(&o).as_array();
        lengths[3] += 40.0;
        lengths[4] -= 25.0;
        lengths[5] += 10.0;

        let solved = kin.solve_forward(&StrutLengths::new(lengths).unwrap()).unwrap();
        assert!(solved.max_abs_diff(&o) < 1e-6);
    }

    #[test]
    fn test_inconsistent_reading_gives_least_squares_fit() {
        let kin = bench();
        let observed = StrutLengths::new([510.0, 495.0, 500.0, 502.0, 499.0, 505.0]).unwrap();
        let solved = kin.solve_forward_detailed(&observed).unwrap();

        // No orientation reproduces these lengths exactly.
        assert!(solved.residual_norm > 1.0);

        // The fit is a local minimum: nudging any angle does not improve it.
        let cost = |o: &Orientation| kin.residuals(o, &observed).iter().map(|r| r * r).sum::<f64>();
        let best = cost(&solved.orientation);
        for delta in [
            Orientation::new(0.01, 0.0, 0.0),
            Orientation::new(0.0, 0.01, 0.0),
            Orientation::new(0.0, 0.0, 0.01),
        ] {
            let plus = Orientation::new(
                solved.orientation.roll.0 + delta.roll.0,
                solved.orientation.pitch.0 + delta.pitch.0,
                solved.orientation.yaw.0 + delta.yaw.0,
            );
            let minus = Orientation::new(
                solved.orientation.roll.0 - delta.roll.0,
                solved.orientation.pitch.0 - delta.pitch.0,
                solved.orientation.yaw.0 - delta.yaw.0,
            );
            assert!(cost(&plus) >= best);
            assert!(cost(&minus) >= best);
        }
    }

    #[test]
    fn test_iteration_budget_is_enforced() {
        let kin = bench_with(SolverConfig::default().with_max_iterations(1));
        let lengths = kin.solve_inverse(&Orientation::new(30.0, -30.0, 30.0));

        match kin.solve_forward(&lengths) {
            Err(HexapodError::Convergence { iterations, residual_norm }) => {
                assert_eq!(iterations, 1);
                assert!(residual_norm > 0.0);
            }
            other => panic!("expected Convergence, got {:?}", other),
        }
    }

    #[test]
    fn test_jacobian_matches_finite_differences() {
        let kin = bench();
        let o = Orientation::new(7.0, -4.0, 12.0);
        let j = kin.length_jacobian(&o);
        let h = 1e-6_f64;

        for k in 0..3 {
            let mut plus = o.to_radians().as_vector();
            let mut minus = plus;
            plus[k] += h;
            minus[k] -= h;
            let lp = kin.lengths_at(&RollPitchYaw::from_vector(&plus));
            let lm = kin.lengths_at(&RollPitchYaw::from_vector(&minus));
            for i in 0..STRUT_COUNT {
                let numeric = (lp[i] - lm[i]) / (2.0 * h);
                assert!(
                    (j[(i, k)] - numeric).abs() < 1e-4,
                    "strut {} axis {}: {} vs {}",
                    i,
                    k,
                    j[(i, k)],
                    numeric
                );
            }
        }
    }

    #[test]
    fn test_solver_config_validation() {
        assert!(SolverConfig::default().validate().is_ok());
        assert!(SolverConfig::default().with_max_iterations(0).validate().is_err());

        let mut config = SolverConfig::default();
        config.residual_tolerance = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_solver_config_partial_json() {
        let config: SolverConfig = serde_json::from_str(r#"{"residual_mode": "FirstThree"}"#).unwrap();
        assert_eq!(config.residual_mode, ResidualMode::FirstThree);
        assert_eq!(config.max_iterations, 100);
    }
}
