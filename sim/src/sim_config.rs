//! Simulator configuration.
//!
//! A simulator instance models one platform geometry at one pose. The pose can
//! be changed over the wire; the geometry and fault mode are fixed at startup.

use hexapod::{HexapodError, Orientation, PlatformConfig};
use serde::{Deserialize, Serialize};

/// Deliberate protocol faults for exercising client error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Fault {
    #[default]
    None,
    /// Answer readings with five fields
    ShortReading,
    /// Answer readings with seven fields
    ExtraField,
    /// Replace one field with text
    NonNumeric,
    /// Never answer a reading
    Silent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub port: u16,
    pub platform: PlatformConfig,
    pub initial_pose: Orientation,
    pub fault: Fault,
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, HexapodError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| HexapodError::Configuration(format!("Could not parse simulator configuration: {}", e)))?;
        config.platform.validate()?;
        Ok(config)
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }

    pub fn with_pose(mut self, pose: Orientation) -> Self {
        self.initial_pose = pose;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            port: 16101,
            platform: PlatformConfig::default(),
            initial_pose: Orientation::zero(),
            fault: Fault::None,
        }
    }
}
