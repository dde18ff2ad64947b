//! Platform configuration for a rotation-only hexapod.
//!
//! The configuration names the six base anchor points (fixed in the world
//! frame) and the six platform attachment points in the neutral pose, both in
//! the same length unit. Index `i` in each list is strut `i`.
//!
//! Configurations deserialize from JSON and must pass [`PlatformConfig::validate`]
//! before an engine is built from them.

use serde::{Deserialize, Serialize};

use crate::errors::HexapodError;
use crate::kinematics::SolverConfig;
use crate::lengths::{ReadingScale, STRUT_COUNT};

/// Base anchor angles of the default rig, in degrees.
pub const DEFAULT_BASE_ANGLES: [f64; STRUT_COUNT] = [-15.0, 15.0, 105.0, 135.0, 225.0, 255.0];

/// Platform attachment angles of the default rig, in degrees.
pub const DEFAULT_PLATFORM_ANGLES: [f64; STRUT_COUNT] = [-45.0, 45.0, 75.0, 165.0, 195.0, 285.0];

pub const DEFAULT_VERIFY_TOLERANCE: f64 = 1e-3;

/// Mechanical travel of the actuators, in length units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrutTravel {
    pub min: f64,
    pub max: f64,
}

impl StrutTravel {
    pub fn contains(&self, length: f64) -> bool {
        length >= self.min && length <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub base_points: Vec<[f64; 3]>,
    pub platform_points: Vec<[f64; 3]>,

    #[serde(default)]
    pub travel: Option<StrutTravel>,

    #[serde(default)]
    pub solver: SolverConfig,

    /// Conversion from raw device counts to length units
    #[serde(default)]
    pub scale: ReadingScale,

    /// Absolute tolerance used when verifying a solve against observed lengths
    #[serde(default = "default_verify_tolerance")]
    pub verify_tolerance: f64,
}

fn default_verify_tolerance() -> f64 {
    DEFAULT_VERIFY_TOLERANCE
}

impl PlatformConfig {
    /// Builds a configuration from explicit point lists with default solver
    /// settings.
    pub fn from_points(base_points: Vec<[f64; 3]>, platform_points: Vec<[f64; 3]>) -> Self {
        Self {
            base_points,
            platform_points,
            travel: None,
            solver: SolverConfig::default(),
            scale: ReadingScale::default(),
            verify_tolerance: DEFAULT_VERIFY_TOLERANCE,
        }
    }

    /// Hexapod with base anchors on a circle in the `z = 0` plane and platform
    /// attachments on a circle in the `z = height` plane.
    ///
    /// Angles are in degrees, measured from +X towards +Y.
    pub fn symmetric_hexapod(
        base_radius: f64,
        platform_radius: f64,
        base_angles: [f64; STRUT_COUNT],
        platform_angles: [f64; STRUT_COUNT],
        height: f64,
    ) -> Self {
        let on_circle = |radius: f64, angle: f64, z: f64| {
            let (s, c) = angle.to_radians().sin_cos();
            [radius * c, radius * s, z]
        };
        let base_points = base_angles
            .iter()
            .map(|&a| on_circle(base_radius, a, 0.0))
            .collect();
        let platform_points = platform_angles
            .iter()
            .map(|&a| on_circle(platform_radius, a, height))
            .collect();
        Self::from_points(base_points, platform_points)
    }

    /// Bench rig: 300 base radius, 200 platform radius, struts offset by 30°,
    /// platform height chosen so every strut is 500 long in the neutral pose.
    pub fn bench_rig() -> Self {
        let mut config = Self::symmetric_hexapod(
            300.0,
            200.0,
            DEFAULT_BASE_ANGLES,
            DEFAULT_PLATFORM_ANGLES,
            300.0 + 100.0 * 3.0_f64.sqrt(),
        );
        config.travel = Some(StrutTravel { min: 350.0, max: 650.0 });
        config
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, HexapodError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| HexapodError::Configuration(format!("Could not parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, HexapodError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| HexapodError::Configuration(format!("Could not serialize configuration: {}", e)))
    }

    pub fn validate(&self) -> Result<(), HexapodError> {
        let fail = |msg: String| Err(HexapodError::Configuration(msg));

        if self.base_points.len() != STRUT_COUNT {
            return fail(format!(
                "Expected {} base points, got {}",
                STRUT_COUNT,
                self.base_points.len()
            ));
        }
        if self.platform_points.len() != STRUT_COUNT {
            return fail(format!(
                "Expected {} platform points, got {}",
                STRUT_COUNT,
                self.platform_points.len()
            ));
        }

        for (name, points) in [("base", &self.base_points), ("platform", &self.platform_points)] {
            if let Some(i) = points.iter().position(|p| p.iter().any(|c| !c.is_finite())) {
                return fail(format!("{} point {} has a non-finite coordinate", name, i));
            }
        }

        for (i, (b, p)) in self.base_points.iter().zip(self.platform_points.iter()).enumerate() {
            if b == p {
                return fail(format!("Strut {} has coincident base and platform points", i));
            }
        }

        if let Some(travel) = self.travel {
            if !(travel.min.is_finite() && travel.max.is_finite()) || travel.min < 0.0 || travel.min > travel.max {
                return fail(format!("Invalid strut travel [{}, {}]", travel.min, travel.max));
            }
        }

        if !self.verify_tolerance.is_finite() || self.verify_tolerance < 0.0 {
            return fail("Verification tolerance must be a non-negative number".to_string());
        }

        if !self.scale.units_per_count.is_finite() || self.scale.units_per_count == 0.0 || !self.scale.offset.is_finite() {
            return fail("Reading scale must be finite with a non-zero factor".to_string());
        }

        self.solver.validate()
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::bench_rig()
    }
}
