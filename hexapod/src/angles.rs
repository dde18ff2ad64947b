//! Unit-tagged angles.
//!
//! Orientation values cross the public API in degrees and are carried in
//! radians inside the solvers. The two units are separate types so a value in
//! one cannot be passed where the other is expected.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[serde(transparent)]
pub struct Degrees(pub f64);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[serde(transparent)]
pub struct Radians(pub f64);

impl From<Degrees> for Radians {
    fn from(d: Degrees) -> Self {
        Radians(d.0.to_radians())
    }
}

impl From<Radians> for Degrees {
    fn from(r: Radians) -> Self {
        Degrees(r.0.to_degrees())
    }
}

/// Platform orientation in degrees.
///
/// Roll is about X, pitch about Y, yaw about Z. The rotation built from an
/// orientation is always `Rz(yaw) · Ry(pitch) · Rx(roll)`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub roll: Degrees,
    pub pitch: Degrees,
    pub yaw: Degrees,
}

impl Orientation {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            roll: Degrees(roll),
            pitch: Degrees(pitch),
            yaw: Degrees(yaw),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn to_radians(&self) -> RollPitchYaw {
        RollPitchYaw {
            roll: self.roll.into(),
            pitch: self.pitch.into(),
            yaw: self.yaw.into(),
        }
    }

    /// Largest per-axis difference to `other`, in degrees.
    pub fn max_abs_diff(&self, other: &Orientation) -> f64 {
        (self.roll.0 - other.roll.0)
            .abs()
            .max((self.pitch.0 - other.pitch.0).abs())
            .max((self.yaw.0 - other.yaw.0).abs())
    }
}

/// Orientation in radians, used inside the solvers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RollPitchYaw {
    pub roll: Radians,
    pub pitch: Radians,
    pub yaw: Radians,
}

impl RollPitchYaw {
    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self {
            roll: Radians(v.x),
            pitch: Radians(v.y),
            yaw: Radians(v.z),
        }
    }

    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.roll.0, self.pitch.0, self.yaw.0)
    }

    pub fn to_degrees(&self) -> Orientation {
        Orientation {
            roll: self.roll.into(),
            pitch: self.pitch.into(),
            yaw: self.yaw.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_to_radians_boundary() {
        let o = Orientation::new(180.0, -90.0, 45.0);
        let rad = o.to_radians();

        assert!((rad.roll.0 - std::f64::consts::PI).abs() < 1e-12);
        assert!((rad.pitch.0 + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((rad.yaw.0 - std::f64::consts::FRAC_PI_4).abs() < 1e-12);

        let back = rad.to_degrees();
        assert!(back.max_abs_diff(&o) < 1e-12);
    }

    #[test]
    fn test_orientation_serializes_in_degrees() {
        let o = Orientation::new(10.0, 5.0, 15.0);
        let json = serde_json::to_string(&o).unwrap();
        assert_eq!(json, r#"{"roll":10.0,"pitch":5.0,"yaw":15.0}"#);
    }
}
