use super::leading_number;
use crate::unraid::types::SmartReport;
use once_cell::sync::Lazy;
use regex::Regex;

static ATTRIBUTE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s+(\S+)\s").expect("valid attribute regex"));

/// Parse `smartctl -n standby -i -H -A <dev>` text output.
///
/// Handles ATA attribute tables and the NVMe health log. A disk that was
/// spun down comes back with `standby` set and nothing else filled in.
pub fn parse_smartctl(output: &str) -> SmartReport {
    let mut report = SmartReport::default();

    if output.contains("STANDBY mode") || output.contains("in STANDBY") {
        report.standby = true;
        return report;
    }

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            if let Some((name, raw)) = parse_attribute(line) {
                report.attributes.insert(name, raw);
            }
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "Device Model" | "Model Number" | "Product" => {
                report.model.get_or_insert_with(|| value.to_string());
            }
            "Serial Number" | "Serial number" => {
                report.serial.get_or_insert_with(|| value.to_string());
            }
            "User Capacity" | "Total NVM Capacity" | "Namespace 1 Size/Capacity" => {
                report.capacity.get_or_insert_with(|| value.to_string());
            }
            "SMART overall-health self-assessment test result" | "SMART Health Status" => {
                report.health = Some(value.to_string());
                report.passed = Some(value == "PASSED" || value == "OK");
            }
            // NVMe health log
            "Temperature" if report.temperature.is_none() => {
                report.temperature = leading_number(value).map(|t| t as i64);
            }
            "Power On Hours" if report.power_on_hours.is_none() => {
                let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
                report.power_on_hours = digits.parse().ok();
            }
            _ => {
                if let Some((name, raw)) = parse_attribute(line) {
                    report.attributes.insert(name, raw);
                }
            }
        }
    }

    if let Some(&temp) = report
        .attributes
        .get("Temperature_Celsius")
        .or_else(|| report.attributes.get("Airflow_Temperature_Cel"))
    {
        report.temperature = Some(temp);
    }
    if let Some(&hours) = report.attributes.get("Power_On_Hours") {
        report.power_on_hours = u64::try_from(hours).ok();
    }

    report
}

/// `ID# ATTRIBUTE_NAME FLAG VALUE WORST THRESH TYPE UPDATED WHEN_FAILED RAW_VALUE`
fn parse_attribute(line: &str) -> Option<(String, i64)> {
    if !ATTRIBUTE_LINE.is_match(line) {
        return None;
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 10 {
        return None;
    }
    // Raw values may carry suffixes like "35 (Min/Max 20/45)" or "6123h+05m"
    let raw: String = parts[9]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    Some((parts[1].to_string(), raw.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_raw_value_keeps_leading_digits() {
        let line = "194 Temperature_Celsius     0x0022   114   100   000    Old_age   Always       -       33 (Min/Max 18/45)";
        assert_eq!(
            parse_attribute(line),
            Some(("Temperature_Celsius".to_string(), 33))
        );
    }

    #[test]
    fn header_line_is_not_an_attribute() {
        assert_eq!(
            parse_attribute("ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE"),
            None
        );
    }
}
