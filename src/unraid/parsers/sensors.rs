use super::leading_number;
use crate::unraid::types::SensorReading;

/// Parse lm-sensors `sensors` output.
///
/// ```text
/// coretemp-isa-0000
/// Adapter: ISA adapter
/// Package id 0:  +45.0°C  (high = +80.0°C, crit = +100.0°C)
/// Core 0:        +42.0°C  (high = +80.0°C, crit = +100.0°C)
/// ```
///
/// A line without a colon starts a new chip. Only readings in °C are kept.
pub fn parse_sensors(output: &str) -> Vec<SensorReading> {
    let mut chip = String::new();
    let mut readings = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((label, value)) = trimmed.split_once(':') else {
            chip = trimmed.to_string();
            continue;
        };
        if label == "Adapter" {
            continue;
        }

        // Drop the "(high = ..., crit = ...)" thresholds
        let value = value.split('(').next().unwrap_or_default().trim();
        if !value.ends_with("°C") && !value.ends_with(" C") {
            continue;
        }
        if let Some(celsius) = leading_number(value) {
            readings.push(SensorReading {
                chip: chip.clone(),
                label: label.trim().to_string(),
                celsius,
            });
        }
    }

    readings
}

/// Parse `paste` of `/sys/class/thermal/thermal_zone*/{type,temp}`; temps
/// are milli-degrees.
pub fn parse_thermal_zones(output: &str) -> Vec<SensorReading> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let zone = parts.next()?;
            let millis: f64 = parts.next()?.parse().ok()?;
            if !millis.is_finite() {
                return None;
            }
            Some(SensorReading {
                chip: "thermal_zone".to_string(),
                label: zone.to_string(),
                celsius: millis / 1000.0,
            })
        })
        .collect()
}
