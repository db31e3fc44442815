use super::key_values;
use crate::unraid::types::{LoadAverage, MemoryInfo, SystemIdentity};
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_HOSTNAME_LEN: usize = 32;

static IDLE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\d.]+)\s*(?:%\s*)?id").expect("Invalid idle field regex"));

static INVALID_HOSTNAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_-]").expect("Invalid hostname regex"));

static REPEATED_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_+").expect("Invalid underscore regex"));

/// Parse `/proc/meminfo` (values in kB).
pub fn parse_meminfo(output: &str) -> MemoryInfo {
    let mut info = MemoryInfo::default();
    let mut available = None;

    for (key, value) in key_values(output, ':') {
        let kb = value
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let bytes = kb.saturating_mul(1024);
        match key {
            "MemTotal" => info.total_bytes = bytes,
            "MemFree" => info.free_bytes = bytes,
            "MemAvailable" => available = Some(bytes),
            "Buffers" => info.buffers_bytes = bytes,
            "Cached" => info.cached_bytes = bytes,
            _ => {}
        }
    }

    // Kernels before 3.14 have no MemAvailable
    info.available_bytes = available.unwrap_or_else(|| {
        info.free_bytes
            .saturating_add(info.buffers_bytes)
            .saturating_add(info.cached_bytes)
    });
    info
}

/// Parse `/proc/uptime`; returns seconds since boot.
pub fn parse_uptime(output: &str) -> Option<f64> {
    output
        .split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parse `/proc/loadavg`.
pub fn parse_loadavg(output: &str) -> Option<LoadAverage> {
    let mut parts = output.split_whitespace().map(|p| p.parse::<f64>().ok());
    Some(LoadAverage {
        one: parts.next()??,
        five: parts.next()??,
        fifteen: parts.next()??,
    })
}

/// Parse the `Cpu(s)` line of `top -bn1`; returns busy percentage.
///
/// `%Cpu(s):  3.1 us,  1.0 sy,  0.0 ni, 95.6 id, ...`
pub fn parse_top_cpu(output: &str) -> Option<f64> {
    let line = output.lines().find(|l| l.contains("Cpu(s)"))?;
    let idle: f64 = IDLE_FIELD.captures(line)?.get(1)?.as_str().parse().ok()?;
    if !(0.0..=100.0).contains(&idle) {
        return None;
    }
    Some(((100.0 - idle) * 100.0).round() / 100.0)
}

/// Parse `hostname; uname -r; cat /etc/unraid-version`.
///
/// The version file reads `version="6.12.4"`.
pub fn parse_system_identity(output: &str) -> SystemIdentity {
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
    let hostname = lines.next().unwrap_or_default().to_string();
    let kernel = lines.next().unwrap_or_default().to_string();
    let unraid_version = lines.find_map(|line| {
        let (key, value) = line.split_once('=')?;
        (key.trim() == "version")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    });

    SystemIdentity {
        hostname,
        kernel,
        unraid_version,
    }
}

/// Normalise a hostname into a metric-label-friendly name.
///
/// Lower-cases, replaces anything outside `[a-z0-9_-]` with `_`, collapses
/// runs of `_`, truncates to 32 characters, trims `_` and capitalises.
/// Returns `None` when nothing usable is left.
pub fn sanitize_hostname(hostname: &str) -> Option<String> {
    let lower = hostname.trim().to_lowercase();
    let replaced = INVALID_HOSTNAME_CHARS.replace_all(&lower, "_");
    let collapsed = REPEATED_UNDERSCORES.replace_all(&replaced, "_");
    let truncated: String = collapsed.chars().take(MAX_HOSTNAME_LEN).collect();
    let trimmed = truncated.trim_matches('_');

    let mut chars = trimmed.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

