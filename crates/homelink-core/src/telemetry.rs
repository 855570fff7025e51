use thiserror::Error;

/// Tag the firmware prefixes onto temperature lines.
pub const TEMPERATURE_TAG: &str = "temp:";

/// Shortest line accepted as telemetry. The firmware pads its temperature
/// lines well past this, so anything shorter is a truncated or garbled read.
pub const MIN_LINE_LEN: usize = 61;

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryFrame {
    pub value: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("not a telemetry line")]
    NotTelemetry,
    #[error("no numeric payload in telemetry line")]
    BadPayload,
}

/// Parses one raw line from the device. The value is the first run of
/// `0-9`, `.` or `-` after the tag.
pub fn parse_line(line: &str) -> Result<TelemetryFrame, TelemetryError> {
    if line.len() < MIN_LINE_LEN || !line.starts_with(TEMPERATURE_TAG) {
        return Err(TelemetryError::NotTelemetry);
    }

    let payload = &line[TEMPERATURE_TAG.len()..];
    let start = payload
        .find(is_numeric_char)
        .ok_or(TelemetryError::BadPayload)?;
    let rest = &payload[start..];
    let end = rest
        .find(|c: char| !is_numeric_char(c))
        .unwrap_or(rest.len());

    rest[..end]
        .parse::<f64>()
        .map(|value| TelemetryFrame { value })
        .map_err(|_| TelemetryError::BadPayload)
}

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == '-'
}
