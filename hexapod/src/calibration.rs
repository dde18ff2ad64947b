//! Calibration session: captures neutral-pose reference lengths once and
//! gates every reference-dependent solve on them.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::angles::Orientation;
use crate::errors::{AcquisitionError, HexapodError};
use crate::kinematics::{ForwardSolution, HexapodKinematics, Verification};
use crate::lengths::StrutLengths;
use crate::protocol::parse_reading;

/// Anything that can be asked for one raw reading line.
///
/// The line is decoded by the session, so a malformed reading is classified
/// the same way no matter where it came from.
pub trait LengthSource {
    fn read_raw(&mut self) -> impl Future<Output = Result<String, AcquisitionError>> + Send;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Uninitialized,
    Calibrating,
    Calibrated,
}

/// Everything the calibration protocol produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CalibrationReport {
    pub reference: StrutLengths,
    pub neutral: ForwardSolution,
    pub verification: Verification,
}

/// A kinematics engine plus the write-once reference lengths.
///
/// Reference lengths are set by the first successful [`calibrate`] and never
/// change afterwards. Calibrations are serialized by a guard; a second caller
/// gets [`HexapodError::CalibrationInProgress`] instead of waiting.
///
/// [`calibrate`]: CalibrationSession::calibrate
#[derive(Debug)]
pub struct CalibrationSession {
    kinematics: HexapodKinematics,
    reference: OnceLock<StrutLengths>,
    calibrating: AtomicBool,
}

struct CalibrationGuard<'a>(&'a AtomicBool);

impl<'a> CalibrationGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, HexapodError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HexapodError::CalibrationInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for CalibrationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CalibrationSession {
    pub fn new(kinematics: HexapodKinematics) -> Self {
        Self {
            kinematics,
            reference: OnceLock::new(),
            calibrating: AtomicBool::new(false),
        }
    }

    pub fn kinematics(&self) -> &HexapodKinematics {
        &self.kinematics
    }

    pub fn state(&self) -> CalibrationState {
        if self.reference.get().is_some() {
            CalibrationState::Calibrated
        } else if self.calibrating.load(Ordering::Acquire) {
            CalibrationState::Calibrating
        } else {
            CalibrationState::Uninitialized
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.reference.get().is_some()
    }

    /// Reads one line from `source` and stores it as the reference lengths.
    ///
    /// On any failure the session stays uncalibrated and may be calibrated
    /// again.
    pub async fn calibrate<S: LengthSource>(&self, source: &mut S) -> Result<StrutLengths, HexapodError> {
        if self.is_calibrated() {
            return Err(HexapodError::AlreadyCalibrated);
        }
        let _guard = CalibrationGuard::acquire(&self.calibrating)?;
        info!("Calibrating: acquiring neutral-pose lengths");

        let lengths = match self.acquire(source).await {
            Ok(lengths) => lengths,
            Err(e) => {
                warn!("Calibration failed: {}", e);
                return Err(e);
            }
        };

        self.reference
            .set(lengths)
            .map_err(|_| HexapodError::AlreadyCalibrated)?;
        info!("Calibrated: reference lengths {:?}", lengths.as_array());
        Ok(lengths)
    }

    /// Reads and decodes one observation without touching the reference.
    pub async fn acquire<S: LengthSource>(&self, source: &mut S) -> Result<StrutLengths, HexapodError> {
        let raw = source.read_raw().await?;
        let counts = parse_reading(&raw)?;
        let lengths = StrutLengths::from_counts(&counts, &self.kinematics.config().scale)?;
        Ok(lengths)
    }

    pub fn reference(&self) -> Result<&StrutLengths, HexapodError> {
        self.reference.get().ok_or(HexapodError::NotCalibrated)
    }

    /// Forward solve of the reference lengths: the estimated neutral pose.
    pub fn neutral_pose(&self) -> Result<ForwardSolution, HexapodError> {
        let reference = self.reference()?;
        self.kinematics.solve_forward_detailed(reference)
    }

    /// Forward solve gated on calibration.
    pub fn solve_forward(&self, observed: &StrutLengths) -> Result<ForwardSolution, HexapodError> {
        self.reference()?;
        self.kinematics.solve_forward_detailed(observed)
    }

    /// Verification gated on calibration. The check itself never fails; a
    /// failed comparison is reported in the returned outcome.
    pub fn verify(&self, observed: &StrutLengths, orientation: &Orientation) -> Result<Verification, HexapodError> {
        self.reference()?;
        let verification = self.kinematics.verify(observed, orientation);
        if !verification.passed() {
            warn!(
                "Verification failed: max deviation {:.3e} exceeds {:.1e}",
                verification.max_deviation, verification.tolerance
            );
        }
        Ok(verification)
    }

    /// Calibrate, solve the neutral pose and verify it against the reference.
    pub async fn run_protocol<S: LengthSource>(&self, source: &mut S) -> Result<CalibrationReport, HexapodError> {
        let reference = self.calibrate(source).await?;
        let neutral = self.neutral_pose()?;
        info!(
            "Neutral pose: roll {:.4}, pitch {:.4}, yaw {:.4} ({} iterations, residual {:.3e})",
            neutral.orientation.roll.0,
            neutral.orientation.pitch.0,
            neutral.orientation.yaw.0,
            neutral.iterations,
            neutral.residual_norm
        );
        let verification = self.verify(&reference, &neutral.orientation)?;
        Ok(CalibrationReport {
            reference,
            neutral,
            verification,
        })
    }
}
