//! Orientation kinematics for a rotation-only hexapod.
//!
//! Inverse kinematics maps an orientation to six strut lengths in closed form.
//! Forward kinematics recovers an orientation from six observed lengths with a
//! damped least-squares solve, and [`HexapodKinematics::verify`] checks a solve
//! by running the inverse again.

mod forward;
mod inverse;
mod verify;

pub use forward::*;
pub use verify::*;

use nalgebra::Point3;

use crate::errors::HexapodError;
use crate::lengths::STRUT_COUNT;
use crate::platform_config::PlatformConfig;

/// Kinematics engine for one platform geometry.
///
/// The geometry is fixed at construction. Every operation is a pure function
/// of its arguments, so one engine can be shared freely between tasks.
#[derive(Debug, Clone)]
pub struct HexapodKinematics {
    config: PlatformConfig,

    /// Base anchors, fixed in the world frame
    base: [Point3<f64>; STRUT_COUNT],

    /// Platform attachments in the neutral pose
    platform: [Point3<f64>; STRUT_COUNT],
}

impl HexapodKinematics {
    /// Validates `config` and builds an engine from it.
    pub fn from_config(config: PlatformConfig) -> Result<Self, HexapodError> {
        config.validate()?;
        let base = to_points(&config.base_points)?;
        let platform = to_points(&config.platform_points)?;
        Ok(Self { config, base, platform })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn base_points(&self) -> &[Point3<f64>; STRUT_COUNT] {
        &self.base
    }

    pub fn platform_points(&self) -> &[Point3<f64>; STRUT_COUNT] {
        &self.platform
    }
}

fn to_points(points: &[[f64; 3]]) -> Result<[Point3<f64>; STRUT_COUNT], HexapodError> {
    let points: [[f64; 3]; STRUT_COUNT] = points.try_into().map_err(|_| {
        HexapodError::Configuration(format!("Expected {} points, got {}", STRUT_COUNT, points.len()))
    })?;
    Ok(points.map(Point3::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_rejects_invalid_geometry() {
        let mut config = PlatformConfig::default();
        config.base_points.truncate(4);
        assert!(matches!(
            HexapodKinematics::from_config(config),
            Err(HexapodError::Configuration(_))
        ));
    }

    #[test]
    fn test_points_are_index_aligned() {
        let config = PlatformConfig::default();
        let kin = HexapodKinematics::from_config(config.clone()).unwrap();

        for i in 0..STRUT_COUNT {
            assert_eq!(kin.base_points()[i], Point3::from(config.base_points[i]));
            assert_eq!(kin.platform_points()[i], Point3::from(config.platform_points[i]));
        }
        assert_eq!(kin.config(), &config);
    }
}
