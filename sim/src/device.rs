use hexapod::protocol::{format_reading, Request, ACK, NACK};
use hexapod::{HexapodError, HexapodKinematics, Orientation, STRUT_COUNT};
use tracing::{debug, info};

use crate::sim_config::{Fault, SimConfig};

/// Simulated device state: a platform held at one pose.
#[derive(Debug, Clone)]
pub struct SimulatedPlatform {
    kinematics: HexapodKinematics,
    pose: Orientation,
    fault: Fault,
}

impl SimulatedPlatform {
    pub fn from_config(config: &SimConfig) -> Result<Self, HexapodError> {
        Ok(Self {
            kinematics: HexapodKinematics::from_config(config.platform.clone())?,
            pose: config.initial_pose,
            fault: config.fault,
        })
    }

    pub fn pose(&self) -> Orientation {
        self.pose
    }

    pub fn set_pose(&mut self, pose: Orientation) {
        info!(
            "Pose set to roll {}, pitch {}, yaw {}",
            pose.roll.0, pose.pitch.0, pose.yaw.0
        );
        self.pose = pose;
    }

    /// Raw counts for the current pose, inverting the reading scale and
    /// rounding to the nearest count.
    pub fn counts(&self) -> [i64; STRUT_COUNT] {
        let scale = self.kinematics.config().scale;
        let lengths = self.kinematics.solve_inverse(&self.pose);
        let mut counts = [0i64; STRUT_COUNT];
        for (count, length) in counts.iter_mut().zip(lengths.iter()) {
            *count = ((length - scale.offset) / scale.units_per_count).round() as i64;
        }
        counts
    }

    /// Reading line for the current pose, shaped by the configured fault.
    /// `None` means the device stays silent.
    pub fn reading(&self) -> Option<String> {
        let counts = self.counts();
        let fields: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
        match self.fault {
            Fault::None => Some(format_reading(&counts)),
            Fault::ShortReading => Some(fields[..STRUT_COUNT - 1].join(",") + "\n"),
            Fault::ExtraField => Some(fields.join(",") + "," + &fields[0] + "\n"),
            Fault::NonNumeric => {
                let mut fields = fields;
                fields[2] = "n/a".to_string();
                Some(fields.join(",") + "\n")
            }
            Fault::Silent => None,
        }
    }

    /// Answers one request line.
    pub fn handle(&mut self, line: &str) -> Option<String> {
        let response = match Request::parse(line) {
            Some(Request::Read) => self.reading(),
            Some(Request::SetPose(pose)) => {
                self.set_pose(pose);
                Some(format!("{}\n", ACK))
            }
            None => Some(format!("{}\n", NACK)),
        };
        debug!("{:?} -> {:?}", line, response);
        response
    }
}
