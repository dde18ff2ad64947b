use std::time::Duration;

use hexapod::drivers::{LengthDriver, LengthDriverConfig};
use hexapod::{
    CalibrationSession, HexapodError, HexapodKinematics, Orientation, PlatformConfig, StrutLengths,
    VerificationOutcome,
};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// One line of output per observation.
#[derive(Serialize)]
struct Sample {
    observed: StrutLengths,
    orientation: Orientation,
    iterations: usize,
    residual_norm: f64,
    verification: VerificationOutcome,
}

fn load<T: serde::de::DeserializeOwned>(path: Option<String>, default: T) -> Result<T, HexapodError> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| HexapodError::Configuration(format!("Could not read {}: {}", path, e)))?;
            serde_json::from_str(&json).map_err(|e| HexapodError::Configuration(format!("{}: {}", path, e)))
        }
        None => Ok(default),
    }
}

/// Usage: `example [driver.json] [platform.json] [samples]`
///
/// Calibrates against the device, then reads and solves `samples`
/// observations (default 5), printing each as JSON.
#[tokio::main]
async fn main() -> Result<(), HexapodError> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let driver_settings: LengthDriverConfig = load(args.next(), LengthDriverConfig::default())?;
    let platform: PlatformConfig = load(args.next(), PlatformConfig::default())?;
    let samples: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(5);

    let session = CalibrationSession::new(HexapodKinematics::from_config(platform)?);

    info!("going to connect to {}", driver_settings.connection_url());
    let mut driver = match LengthDriver::connect(driver_settings.clone()).await {
        Ok(driver) => driver,
        Err(e) => {
            error!("Failed to connect to {:?}: {}", driver_settings, e);
            return Err(e.into());
        }
    };

    let report = session.run_protocol(&mut driver).await?;
    if !report.verification.passed() {
        warn!("Neutral pose does not reproduce the reference lengths; check the geometry");
    }
    println!(
        "{}",
        serde_json::to_string(&report.neutral.orientation)
            .map_err(|e| HexapodError::Configuration(e.to_string()))?
    );

    for _ in 0..samples {
        sleep(Duration::from_millis(500)).await;

        let observed = match session.acquire(&mut driver).await {
            Ok(observed) => observed,
            Err(e) => {
                warn!("Skipping sample: {}", e);
                if !driver.is_connected() {
                    driver = LengthDriver::connect(driver_settings.clone()).await?;
                }
                continue;
            }
        };
        let solution = session.solve_forward(&observed)?;
        let verification = session.verify(&observed, &solution.orientation)?;

        let sample = Sample {
            observed,
            orientation: solution.orientation,
            iterations: solution.iterations,
            residual_norm: solution.residual_norm,
            verification: verification.outcome,
        };
        println!(
            "{}",
            serde_json::to_string(&sample).map_err(|e| HexapodError::Configuration(e.to_string()))?
        );
    }

    driver.disconnect().await;
    Ok(())
}
