use crate::unraid::types::{Container, ContainerState};

/// Format string passed to `docker ps -a --format`.
pub const DOCKER_PS_FORMAT: &str = "{{.ID}}|{{.Names}}|{{.Status}}|{{.Image}}";

/// Parse `docker ps -a --format '{{.ID}}|{{.Names}}|{{.Status}}|{{.Image}}'`.
///
/// Lines without exactly four fields are skipped.
pub fn parse_docker_ps(output: &str) -> Vec<Container> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.trim().split('|').collect();
            let [id, name, status, image] = parts.as_slice() else {
                return None;
            };
            let (id, name) = (id.trim(), name.trim());
            if id.is_empty() || name.is_empty() {
                return None;
            }
            Some(Container {
                id: id.to_string(),
                name: name.to_string(),
                status: status.trim().to_string(),
                image: image.trim().to_string(),
                state: ContainerState::from_status(status),
            })
        })
        .collect()
}

/// Best-effort parse of the default `docker ps -a` table.
///
/// Columns are whitespace-aligned and may themselves contain spaces, so
/// this only relies on the id being first, the name last, and the status
/// starting at the first `Up`/`Exited`/`Created`/... token.
pub fn parse_docker_ps_table(output: &str) -> Vec<Container> {
    const STATUS_WORDS: &[&str] = &["Up", "Exited", "Created", "Restarting", "Paused", "Dead"];

    output
        .lines()
        .skip_while(|line| !line.starts_with("CONTAINER ID"))
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 5 {
                return None;
            }
            let name = parts[parts.len() - 1];
            let status_idx = parts
                .iter()
                .position(|p| STATUS_WORDS.contains(p))
                .filter(|&idx| idx > 1 && idx < parts.len() - 1)?;

            // Status runs until a port mapping or the name
            let status_end = parts[status_idx..parts.len() - 1]
                .iter()
                .position(|p| p.contains("->") || p.contains("/tcp") || p.contains("/udp"))
                .map_or(parts.len() - 1, |offset| status_idx + offset);
            let status = parts[status_idx..status_end].join(" ");

            Some(Container {
                id: parts[0].to_string(),
                name: name.to_string(),
                image: parts[1].to_string(),
                state: ContainerState::from_status(&status),
                status,
            })
        })
        .collect()
}
