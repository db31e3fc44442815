//! Pure parsers for command output
//!
//! Each function takes the raw stdout of one command family and returns a
//! typed record from [`crate::unraid::types`]. None of them do I/O, and
//! none of them panic: lines that don't fit the expected shape are skipped.

pub mod array;
pub mod disk;
pub mod docker;
pub mod network;
pub mod sensors;
pub mod smart;
pub mod system;
pub mod ups;
pub mod userscripts;
pub mod vm;

/// Split `key<sep>value` lines, trimming both halves.
pub(crate) fn key_values(output: &str, sep: char) -> impl Iterator<Item = (&str, &str)> {
    output.lines().filter_map(move |line| {
        let (key, value) = line.split_once(sep)?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key, value.trim()))
    })
}

/// First decimal number in `text`, e.g. `"120.0 Volts"` -> `120.0`.
pub(crate) fn leading_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit() || c == '-' || c == '.')?;
    let rest = &text[start..];
    let end = rest
        .char_indices()
        .skip(1)
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    rest[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
