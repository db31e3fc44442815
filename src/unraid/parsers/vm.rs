use crate::unraid::types::{OsType, VirtualMachine, VmState};

/// Field separator used by the batched VM listing script.
pub const VM_FIELD_DELIMITER: &str = "§§§";

/// Printed by the batched script when libvirt is down.
pub const LIBVIRT_NOT_RUNNING: &str = "libvirt_not_running";

const LINUX_NAME_HINTS: &[&str] = &[
    "ubuntu", "linux", "debian", "centos", "fedora", "rhel", "suse", "arch",
];

/// Parse the batched script output: one `name§§§state§§§cpus§§§mem§§§xml`
/// line per domain.
pub fn parse_vm_details(output: &str) -> Vec<VirtualMachine> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split(VM_FIELD_DELIMITER);
            let name = fields.next()?.trim();
            let state = fields.next()?;
            let cpus = fields.next()?;
            let memory = fields.next()?;
            let xml = fields.next()?;
            if name.is_empty() {
                return None;
            }
            Some(VirtualMachine {
                id: None,
                name: name.to_string(),
                state: VmState::parse(state),
                vcpus: cpus.trim().parse().ok(),
                memory_bytes: parse_memory(memory),
                os_type: detect_os_type(xml, name),
            })
        })
        .collect()
}

/// Parse `virsh list --all`.
///
/// ```text
///  Id   Name          State
/// ------------------------------
///  1    Windows 11    running
///  -    ubuntu        shut off
/// ```
///
/// Names may contain spaces, so the state is matched from the end of the line.
pub fn parse_virsh_list(output: &str) -> Vec<VirtualMachine> {
    const STATES: &[&str] = &[
        "in shutdown",
        "shut off",
        "pmsuspended",
        "running",
        "blocked",
        "paused",
        "crashed",
        "idle",
    ];

    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with('-'))
        .skip(1)
        .filter_map(|line| {
            let line = line.trim();
            let (id, rest) = line.split_once(char::is_whitespace)?;
            let rest = rest.trim();
            let state = STATES.iter().find(|s| rest.ends_with(*s))?;
            let name = rest[..rest.len() - state.len()].trim();
            if name.is_empty() {
                return None;
            }
            Some(VirtualMachine {
                id: id.parse().ok(),
                name: name.to_string(),
                state: VmState::parse(state),
                vcpus: None,
                memory_bytes: None,
                os_type: detect_os_type("", name),
            })
        })
        .collect()
}

/// `virsh dominfo` memory, e.g. `4194304 KiB`.
fn parse_memory(text: &str) -> Option<u64> {
    let mut parts = text.split_whitespace();
    let value: u64 = parts.next()?.parse().ok()?;
    let multiplier = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        Some("kib") | Some("kb") | None => 1024,
        Some("mib") | Some("mb") => 1024 * 1024,
        Some("gib") | Some("gb") => 1024 * 1024 * 1024,
        Some("b") | Some("bytes") => 1,
        Some(_) => return None,
    };
    value.checked_mul(multiplier)
}

/// Guess the guest OS from the `<os>` XML block, falling back to the name.
pub fn detect_os_type(xml: &str, name: &str) -> OsType {
    let xml = xml.to_lowercase();
    if xml.contains("windows") || xml.contains("win") {
        return OsType::Windows;
    }
    if xml.contains("linux") {
        return OsType::Linux;
    }

    let name = name.to_lowercase().replace(['-', '_'], " ");
    if name.contains("windows") || name.contains("win") {
        OsType::Windows
    } else if LINUX_NAME_HINTS.iter().any(|hint| name.contains(hint)) {
        OsType::Linux
    } else {
        OsType::Unknown
    }
}
