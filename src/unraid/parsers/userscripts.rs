use crate::unraid::types::UserScript;

/// Parse `ls -1` of the scripts directory: one script name per line.
pub fn parse_script_list(output: &str) -> Vec<UserScript> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|name| UserScript {
            name: name.to_string(),
        })
        .collect()
}
