pub mod angles;
pub mod calibration;
pub mod drivers;
pub mod errors;
pub mod geometry;
pub mod kinematics;
pub mod lengths;
pub mod platform_config;
pub mod protocol;

pub use angles::{Degrees, Orientation, Radians, RollPitchYaw};
pub use calibration::{CalibrationReport, CalibrationSession, CalibrationState, LengthSource};
pub use errors::{AcquisitionError, HexapodError};
pub use kinematics::{
    ForwardSolution, HexapodKinematics, ResidualMode, SolverConfig, Verification, VerificationOutcome,
};
pub use lengths::{ReadingScale, StrutLengths, STRUT_COUNT};
pub use platform_config::{PlatformConfig, StrutTravel};
