use std::error::Error;
use std::fmt;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum HexapodError {
    Configuration(String),
    Acquisition(AcquisitionError),
    NotCalibrated,
    AlreadyCalibrated,
    CalibrationInProgress,
    Convergence { iterations: usize, residual_norm: f64 },
    OutOfTravel { strut: usize, length: f64 },
    InvalidLength { strut: usize, length: f64 },
}

impl Error for HexapodError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HexapodError::Acquisition(ref e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for HexapodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HexapodError::Configuration(ref msg) => write!(f, "Configuration error: {}", msg),
            HexapodError::Acquisition(ref e) => write!(f, "Acquisition failed: {}", e),
            HexapodError::NotCalibrated => write!(f, "Reference lengths have not been calibrated"),
            HexapodError::AlreadyCalibrated => write!(f, "Reference lengths are already set for this session"),
            HexapodError::CalibrationInProgress => write!(f, "Another calibration is in progress"),
            HexapodError::Convergence { iterations, residual_norm } => write!(
                f,
                "Forward kinematics did not converge after {} iterations (residual norm {:.6e})",
                iterations, residual_norm
            ),
            HexapodError::OutOfTravel { strut, length } => {
                write!(f, "Strut {} length {:.3} is outside actuator travel", strut, length)
            }
            HexapodError::InvalidLength { strut, length } => {
                write!(f, "Strut {} length {} is negative or not finite", strut, length)
            }
        }
    }
}

impl From<AcquisitionError> for HexapodError {
    fn from(e: AcquisitionError) -> Self {
        HexapodError::Acquisition(e)
    }
}

/// Failures of the strut-length acquisition channel.
///
/// A reading is either six integers or one of these; there is no partial
/// reading.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    Unreachable(String),
    Timeout(u64),
    Disconnected,
    FailedToSend(String),
    FailedToReceive(String),
    Empty,
    FieldCount { expected: usize, found: usize },
    NonNumeric { index: usize, field: String },
    InvalidLength { index: usize },
    Rejected(String),
}

impl Error for AcquisitionError {}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            AcquisitionError::Unreachable(ref msg) => write!(f, "Device unreachable: {}", msg),
            AcquisitionError::Timeout(ms) => write!(f, "No reading within {} ms", ms),
            AcquisitionError::Disconnected => write!(f, "Device appears to be disconnected"),
            AcquisitionError::FailedToSend(ref msg) => write!(f, "SendError: {}", msg),
            AcquisitionError::FailedToReceive(ref msg) => write!(f, "ReceiveError: {}", msg),
            AcquisitionError::Empty => write!(f, "Device returned an empty reading"),
            AcquisitionError::FieldCount { expected, found } => {
                write!(f, "Expected {} readings, device returned {}", expected, found)
            }
            AcquisitionError::NonNumeric { index, ref field } => {
                write!(f, "Reading {} is not an integer: {:?}", index, field)
            }
            AcquisitionError::InvalidLength { index } => {
                write!(f, "Reading {} scales to a negative or non-finite length", index)
            }
            AcquisitionError::Rejected(ref reply) => write!(f, "Device rejected the request: {:?}", reply),
        }
    }
}
