use crate::codec;
use crate::state::ZoneColor;
use crate::telemetry::{parse_line, TelemetryError, TelemetryFrame, MIN_LINE_LEN};

fn zone(name: &str, red: u8, green: u8, blue: u8) -> ZoneColor {
    ZoneColor {
        zone: name.to_string(),
        red,
        green,
        blue,
    }
}

/// A tagged line padded past the length guard, the way the firmware pads
/// its debug output.
fn padded_line(payload: &str) -> String {
    let mut line = format!("temp:{payload}");
    while line.len() < MIN_LINE_LEN {
        line.push('#');
    }
    line
}

#[test]
fn encode_emits_one_frame_per_zone_in_index_order() {
    let zones = vec![(zone("zone1", 255, 0, 0), 0), (zone("zone2", 0, 0, 0), 1)];

    let frames = codec::encode(&zones);

    assert_eq!(frames, vec!["255 000 000 0", "000 000 000 1"]);
}

#[test]
fn encode_zero_pads_every_channel() {
    let frames = codec::encode(&[(zone("zone1", 7, 42, 255), 0)]);

    assert_eq!(frames, vec!["007 042 255 0"]);
    assert_eq!(frames[0].len(), "DDD DDD DDD Z".len());
}

#[test]
fn encode_of_no_zones_is_empty() {
    assert!(codec::encode(&[]).is_empty());
}

#[test]
fn parse_extracts_first_numeric_run_after_tag() {
    let line = padded_line(" water probe reading 71.25 adc raw follows");

    let frame = parse_line(&line).expect("telemetry line");

    assert_eq!(frame, TelemetryFrame { value: 71.25 });
}

#[test]
fn parse_accepts_negative_values() {
    let line = padded_line(" outdoor probe -3.5 (calibrated)");

    assert_eq!(parse_line(&line).expect("telemetry line").value, -3.5);
}

#[test]
fn parse_rejects_short_line_even_with_valid_payload() {
    // Under the length guard: a truncated read, not telemetry.
    assert_eq!(parse_line("temp: 71.25"), Err(TelemetryError::NotTelemetry));
}

#[test]
fn parse_rejects_untagged_line_regardless_of_numeric_content() {
    let line = "4".repeat(MIN_LINE_LEN + 10);

    assert_eq!(parse_line(&line), Err(TelemetryError::NotTelemetry));
}

#[test]
fn parse_rejects_line_without_digits() {
    let line = padded_line(" sensor warming up, no reading yet xxxxxxxxxxxxxxxxxxxx");

    assert_eq!(parse_line(&line), Err(TelemetryError::BadPayload));
}

#[test]
fn parse_rejects_unparseable_numeric_run() {
    // First run after the tag is `.-.-`, which is not a number.
    let line = padded_line(" .-.- glitched payload");

    assert_eq!(parse_line(&line), Err(TelemetryError::BadPayload));
}

#[test]
fn parse_never_panics_on_garbage_bytes() {
    let mut line = padded_line(" 71.25");
    line.push('\u{fffd}');

    assert!(parse_line(&line).is_ok());
    assert!(parse_line("").is_err());
}
