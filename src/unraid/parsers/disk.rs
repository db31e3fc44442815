use crate::unraid::types::FilesystemUsage;

/// Parse POSIX `df -kP` output. Sizes are 1K blocks and come back as bytes.
///
/// The header and any line with fewer than six columns are skipped. Mount
/// points containing spaces are rejoined from the trailing columns.
pub fn parse_df(output: &str) -> Vec<FilesystemUsage> {
    output
        .lines()
        .filter(|line| !line.starts_with("Filesystem"))
        .filter_map(parse_df_line)
        .collect()
}

fn parse_df_line(line: &str) -> Option<FilesystemUsage> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 6 {
        return None;
    }

    let total_kb: u64 = parts[1].parse().ok()?;
    let used_kb: u64 = parts[2].parse().ok()?;
    let available_kb: u64 = parts[3].parse().ok()?;
    let use_percent = match parts[4].trim_end_matches('%').parse::<f64>() {
        Ok(pct) => pct,
        Err(_) if total_kb > 0 => used_kb as f64 / total_kb as f64 * 100.0,
        Err(_) => 0.0,
    };

    Some(FilesystemUsage {
        filesystem: parts[0].to_string(),
        mount_point: parts[5..].join(" "),
        total_bytes: total_kb.saturating_mul(1024),
        used_bytes: used_kb.saturating_mul(1024),
        available_bytes: available_kb.saturating_mul(1024),
        use_percent,
    })
}
