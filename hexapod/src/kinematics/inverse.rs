use nalgebra::{Point3, Vector3};
use tracing::warn;

use super::HexapodKinematics;
use crate::angles::{Orientation, RollPitchYaw};
use crate::errors::HexapodError;
use crate::geometry::{distance, rotate_points, rotation_matrix};
use crate::lengths::{StrutLengths, STRUT_COUNT};

impl HexapodKinematics {
    /// Platform attachment points after rotating the platform about the world
    /// origin.
    pub fn rotated_platform(&self, orientation: &Orientation) -> [Point3<f64>; STRUT_COUNT] {
        let rotation = rotation_matrix(&orientation.to_radians());
        rotate_points(&self.platform, &rotation)
    }

    /// Strut lengths for an orientation: `L_i = |R·p_i - b_i|`.
    ///
    /// Total for every finite orientation. Travel limits are not checked here;
    /// see [`HexapodKinematics::solve_inverse_checked`].
    pub fn solve_inverse(&self, orientation: &Orientation) -> StrutLengths {
        StrutLengths::from_distances(self.lengths_at(&orientation.to_radians()))
    }

    /// Like [`HexapodKinematics::solve_inverse`], but fails when a length falls
    /// outside the configured actuator travel.
    pub fn solve_inverse_checked(&self, orientation: &Orientation) -> Result<StrutLengths, HexapodError> {
        let lengths = self.solve_inverse(orientation);
        if let Some(travel) = self.config.travel {
            for (strut, &length) in lengths.iter().enumerate() {
                if !travel.contains(length) {
                    warn!(
                        "Strut {} would need length {:.3}, travel is [{}, {}]",
                        strut, length, travel.min, travel.max
                    );
                    return Err(HexapodError::OutOfTravel { strut, length });
                }
            }
        }
        Ok(lengths)
    }

    /// Lengths in the neutral pose.
    pub fn neutral_lengths(&self) -> StrutLengths {
        self.solve_inverse(&Orientation::zero())
    }

    /// Strut vectors `R·p_i - b_i`, pointing from base anchor to attachment.
    pub fn strut_vectors(&self, orientation: &Orientation) -> [Vector3<f64>; STRUT_COUNT] {
        let rotated = self.rotated_platform(orientation);
        let mut vectors = [Vector3::zeros(); STRUT_COUNT];
        for (i, v) in vectors.iter_mut().enumerate() {
            *v = rotated[i] - self.base[i];
        }
        vectors
    }

    pub(crate) fn lengths_at(&self, rpy: &RollPitchYaw) -> [f64; STRUT_COUNT] {
        let rotated = rotate_points(&self.platform, &rotation_matrix(rpy));
        let mut lengths = [0.0; STRUT_COUNT];
        for (i, length) in lengths.iter_mut().enumerate() {
            *length = distance(&rotated[i], &self.base[i]);
        }
        lengths
    }
}
