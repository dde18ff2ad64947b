use serde::{Deserialize, Serialize};
use tracing::debug;

use super::HexapodKinematics;
use crate::angles::Orientation;
use crate::lengths::StrutLengths;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Passed,
    Failed,
}

/// Comparison of observed lengths with the inverse kinematics of a solved
/// orientation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Verification {
    pub outcome: VerificationOutcome,
    pub orientation: Orientation,
    pub observed: StrutLengths,
    pub recomputed: StrutLengths,
    pub max_deviation: f64,
    pub tolerance: f64,
}

impl Verification {
    pub fn passed(&self) -> bool {
        self.outcome == VerificationOutcome::Passed
    }
}

impl HexapodKinematics {
    /// Recomputes lengths for `orientation` and compares them element-wise
    /// with `observed` using the configured tolerance.
    pub fn verify(&self, observed: &StrutLengths, orientation: &Orientation) -> Verification {
        self.verify_with_tolerance(observed, orientation, self.config.verify_tolerance)
    }

    /// A strut passes when `|recomputed - observed| <= tolerance`.
    pub fn verify_with_tolerance(
        &self,
        observed: &StrutLengths,
        orientation: &Orientation,
        tolerance: f64,
    ) -> Verification {
        let recomputed = self.solve_inverse(orientation);
        let max_deviation = recomputed.max_abs_diff(observed);
        let outcome = if recomputed.all_close(observed, tolerance) {
            VerificationOutcome::Passed
        } else {
            VerificationOutcome::Failed
        };
        debug!(
            "Verification {:?}: max deviation {:.3e} (tolerance {:.1e})",
            outcome, max_deviation, tolerance
        );

        Verification {
            outcome,
            orientation: *orientation,
            observed: *observed,
            recomputed,
            max_deviation,
            tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_config::PlatformConfig;

    #[test]
    fn test_solved_orientation_verifies() {
        let kin = HexapodKinematics::from_config(PlatformConfig::default()).unwrap();
        let o = Orientation::new(-7.5, 3.25, -12.0);
        let observed = kin.solve_inverse(&o);
        let solved = kin.solve_forward(&observed).unwrap();

        let check = kin.verify(&observed, &solved);
        assert!(check.passed());
        assert!(check.max_deviation < 1e-6);
    }

    #[test]
    fn test_single_strut_deviation_decides_outcome() {
        let kin = HexapodKinematics::from_config(PlatformConfig::default()).unwrap();
        let o = Orientation::new(10.0, 5.0, 15.0);
        let mut perturbed = *kin.solve_inverse(&o).as_array();
        perturbed[4] += 2e-3;
        let observed = StrutLengths::new(perturbed).unwrap();

        let strict = kin.verify_with_tolerance(&observed, &o, 1e-3);
        assert_eq!(strict.outcome, VerificationOutcome::Failed);
        assert!((strict.max_deviation - 2e-3).abs() < 1e-9);

        let loose = kin.verify_with_tolerance(&observed, &o, 1e-2);
        assert_eq!(loose.outcome, VerificationOutcome::Passed);
    }
}
