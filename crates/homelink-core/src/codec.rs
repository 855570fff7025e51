use crate::state::ZoneColor;

/// Builds the ASCII command frames the LED controller understands.
///
/// One frame per zone: `RRR GGG BBB Z`, each channel zero-padded to three
/// digits, `Z` the zone-index digit. Frames are written to the device one at
/// a time, so a multi-zone update is not atomic.
pub fn encode(zones: &[(ZoneColor, usize)]) -> Vec<String> {
    zones
        .iter()
        .map(|(color, index)| {
            format!(
                "{:03} {:03} {:03} {}",
                color.red, color.green, color.blue, index
            )
        })
        .collect()
}
