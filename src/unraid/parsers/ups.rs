use super::{key_values, leading_number};
use crate::unraid::types::UpsStatus;

/// Parse `apcaccess -u` (`KEY      : value` lines, units stripped).
///
/// Numeric fields outside their plausible range are dropped rather than
/// reported.
pub fn parse_apcaccess(output: &str) -> UpsStatus {
    let mut ups = UpsStatus::default();

    for (key, value) in key_values(output, ':') {
        match key {
            "STATUS" => ups.status = Some(value.to_string()).filter(|v| !v.is_empty()),
            "MODEL" => ups.model = Some(value.to_string()).filter(|v| !v.is_empty()),
            "BCHARGE" => ups.battery_charge_percent = ranged(value, 0.0, 100.0),
            "TIMELEFT" => ups.runtime_minutes = ranged(value, 0.0, 1440.0),
            "LOADPCT" => ups.load_percent = ranged(value, 0.0, 200.0),
            "NOMPOWER" => ups.nominal_power_watts = ranged(value, 0.0, 100_000.0),
            "LINEV" => ups.line_voltage = ranged(value, 0.0, 500.0),
            _ => {}
        }
    }

    ups
}

fn ranged(value: &str, min: f64, max: f64) -> Option<f64> {
    leading_number(value).filter(|v| (min..=max).contains(v))
}
