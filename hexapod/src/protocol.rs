//! Line protocol spoken by the strut-length device.
//!
//! Every message is a single ASCII line terminated by `\n` (a preceding `\r`
//! is tolerated).
//!
//! | Request                | Response                          |
//! |------------------------|-----------------------------------|
//! | `R`                    | six comma-separated integer counts |
//! | `P roll,pitch,yaw`     | `OK` (simulator only, degrees)    |
//!
//! A device that does not understand a request answers `ERR`.

use crate::angles::Orientation;
use crate::errors::AcquisitionError;
use crate::lengths::STRUT_COUNT;

pub const ACK: &str = "OK";
pub const NACK: &str = "ERR";

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Read,
    SetPose(Orientation),
}

impl Request {
    /// Serialized request including the line terminator.
    pub fn to_line(&self) -> String {
        match self {
            Request::Read => "R\n".to_string(),
            Request::SetPose(o) => format!("P {},{},{}\n", o.roll.0, o.pitch.0, o.yaw.0),
        }
    }

    /// Parses one request line. Returns `None` for anything unrecognized.
    pub fn parse(line: &str) -> Option<Request> {
        let line = line.trim();
        if line == "R" {
            return Some(Request::Read);
        }
        let args = line.strip_prefix("P ")?;
        let values: Vec<f64> = args
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        match values.as_slice() {
            [roll, pitch, yaw] => Some(Request::SetPose(Orientation::new(*roll, *pitch, *yaw))),
            _ => None,
        }
    }
}

/// Parses a reading line into six integer counts.
///
/// Anything other than exactly six integer fields is rejected; a reading is
/// never partially accepted.
pub fn parse_reading(line: &str) -> Result<[i64; STRUT_COUNT], AcquisitionError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(AcquisitionError::Empty);
    }

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != STRUT_COUNT {
        return Err(AcquisitionError::FieldCount {
            expected: STRUT_COUNT,
            found: fields.len(),
        });
    }

    let mut counts = [0i64; STRUT_COUNT];
    for (index, (field, count)) in fields.iter().zip(counts.iter_mut()).enumerate() {
        *count = field.trim().parse::<i64>().map_err(|_| AcquisitionError::NonNumeric {
            index,
            field: field.to_string(),
        })?;
    }
    Ok(counts)
}

/// Formats counts as a reading line including the terminator.
pub fn format_reading(counts: &[i64; STRUT_COUNT]) -> String {
    let fields: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
    fields.join(",") + "\n"
}

/// Splits complete lines off the front of `buffer`, leaving any partial line.
pub fn extract_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let mut chunk = buffer.drain(..=pos).collect::<Vec<_>>();
        chunk.pop(); // remove the `\n`
        if chunk.last() == Some(&b'\r') {
            chunk.pop();
        }
        lines.push(String::from_utf8_lossy(&chunk).into_owned());
    }
    lines
}
