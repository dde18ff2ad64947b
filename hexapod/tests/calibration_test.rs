/// Calibration gating, malformed readings and verification outcomes.
use std::collections::VecDeque;
use std::sync::Arc;

use hexapod::{
    AcquisitionError, CalibrationSession, CalibrationState, HexapodError, HexapodKinematics, LengthSource,
    Orientation, PlatformConfig, StrutLengths, VerificationOutcome,
};
use tokio::sync::oneshot;

/// Replays a fixed list of responses, one per read.
struct Scripted(VecDeque<Result<String, AcquisitionError>>);

impl Scripted {
    fn lines(lines: &[&str]) -> Self {
        Self(lines.iter().map(|l| Ok(l.to_string())).collect())
    }
}

impl LengthSource for Scripted {
    async fn read_raw(&mut self) -> Result<String, AcquisitionError> {
        self.0.pop_front().unwrap_or(Err(AcquisitionError::Disconnected))
    }
}

/// Holds its reading until released.
struct Gated {
    release: Option<oneshot::Receiver<()>>,
}

impl LengthSource for Gated {
    async fn read_raw(&mut self) -> Result<String, AcquisitionError> {
        if let Some(release) = self.release.take() {
            let _ = release.await;
        }
        Ok("500,500,500,500,500,500".to_string())
    }
}

fn session() -> CalibrationSession {
    CalibrationSession::new(HexapodKinematics::from_config(PlatformConfig::default()).unwrap())
}

#[tokio::test]
async fn test_forward_before_calibration_fails() {
    let session = session();
    let observed = StrutLengths::new([500.0; 6]).unwrap();

    assert_eq!(session.neutral_pose().unwrap_err(), HexapodError::NotCalibrated);
    assert_eq!(session.solve_forward(&observed).unwrap_err(), HexapodError::NotCalibrated);
    assert_eq!(
        session.verify(&observed, &Orientation::zero()).unwrap_err(),
        HexapodError::NotCalibrated
    );
}

#[tokio::test]
async fn test_calibrate_with_equal_lengths() {
    let session = session();
    let reference = session
        .calibrate(&mut Scripted::lines(&["500,500,500,500,500,500"]))
        .await
        .unwrap();
    assert_eq!(reference.as_array(), &[500.0; 6]);

    let neutral = session.neutral_pose().unwrap();
    println!("neutral estimate: {:?}", neutral);
    assert!(neutral.orientation.max_abs_diff(&Orientation::zero()) < 1e-6);
}

#[tokio::test]
async fn test_malformed_readings_leave_session_uninitialized() {
    let cases: [(&str, AcquisitionError); 4] = [
        ("500,500,500,500,500", AcquisitionError::FieldCount { expected: 6, found: 5 }),
        ("500,500,500,500,500,500,500", AcquisitionError::FieldCount { expected: 6, found: 7 }),
        (
            "500,500,five hundred,500,500,500",
            AcquisitionError::NonNumeric {
                index: 2,
                field: "five hundred".to_string(),
            },
        ),
        ("", AcquisitionError::Empty),
    ];

    for (line, expected) in cases {
        let session = session();
        let err = session.calibrate(&mut Scripted::lines(&[line])).await.unwrap_err();

        assert_eq!(err, HexapodError::Acquisition(expected));
        assert_eq!(session.state(), CalibrationState::Uninitialized);
        assert_eq!(session.reference().unwrap_err(), HexapodError::NotCalibrated);
    }
}

#[tokio::test]
async fn test_failed_calibration_can_be_retried() {
    let session = session();
    let mut source = Scripted(VecDeque::from([
        Err(AcquisitionError::Timeout(1000)),
        Ok("500,500,500,500,500,500".to_string()),
    ]));

    let err = session.calibrate(&mut source).await.unwrap_err();
    assert_eq!(err, HexapodError::Acquisition(AcquisitionError::Timeout(1000)));
    assert_eq!(session.state(), CalibrationState::Uninitialized);

    session.calibrate(&mut source).await.unwrap();
    assert_eq!(session.state(), CalibrationState::Calibrated);
}

#[tokio::test]
async fn test_concurrent_calibration_is_rejected() {
    let session = Arc::new(session());
    let (release, gate) = oneshot::channel();

    let first = {
        let session = session.clone();
        tokio::spawn(async move {
            let mut source = Gated { release: Some(gate) };
            session.calibrate(&mut source).await
        })
    };

    while session.state() != CalibrationState::Calibrating {
        tokio::task::yield_now().await;
    }

    let err = session
        .calibrate(&mut Scripted::lines(&["400,400,400,400,400,400"]))
        .await
        .unwrap_err();
    assert_eq!(err, HexapodError::CalibrationInProgress);

    release.send(()).unwrap();
    first.await.unwrap().unwrap();
    assert_eq!(session.reference().unwrap().as_array(), &[500.0; 6]);
}

#[tokio::test]
async fn test_verification_tolerance() {
    let session = session();
    session
        .calibrate(&mut Scripted::lines(&["500,500,500,500,500,500"]))
        .await
        .unwrap();

    let kin = session.kinematics();
    let o = Orientation::new(10.0, 5.0, 15.0);
    let mut lengths = *kin.solve_inverse(&o).as_array();
    lengths[0] += 2e-3;
    let observed = StrutLengths::new(lengths).unwrap();

    // Default tolerance is 1e-3.
    let strict = session.verify(&observed, &o).unwrap();
    assert_eq!(strict.outcome, VerificationOutcome::Failed);

    let loose = kin.verify_with_tolerance(&observed, &o, 1e-2);
    assert_eq!(loose.outcome, VerificationOutcome::Passed);
}

#[tokio::test]
async fn test_run_protocol_reports_passed_verification() {
    let session = session();
    let report = session
        .run_protocol(&mut Scripted::lines(&["500,500,500,500,500,500\r\n"]))
        .await
        .unwrap();

    assert!(report.verification.passed());
    assert!(report.neutral.residual_norm < 1e-6);
    assert_eq!(report.reference.as_array(), &[500.0; 6]);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"outcome\":\"Passed\""));
}

#[tokio::test]
async fn test_protocol_on_inconsistent_reading() {
    let session = session();
    let report = session
        .run_protocol(&mut Scripted::lines(&["510,495,500,502,499,505"]))
        .await
        .unwrap();

    // No pose reproduces these counts, so the best fit cannot verify at 1e-3.
    assert!(report.neutral.residual_norm > 1.0);
    assert_eq!(report.verification.outcome, VerificationOutcome::Failed);
}
