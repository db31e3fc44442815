//! Typed records produced by the output parsers
//!
//! Every field a command may leave out is an `Option`; counters the host
//! always reports default to zero.

use std::collections::BTreeMap;
use std::fmt;

/// `mdcmd status`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayStatus {
    /// `mdState`, upper-cased (`STARTED`, `STOPPED`, ...)
    pub state: String,
    pub num_disks: u32,
    pub num_disabled: u32,
    pub num_invalid: u32,
    pub num_missing: u32,
    /// Epoch seconds of the last completed sync (`sbSynced`); `None` if never
    pub last_sync: Option<u64>,
    pub sync_action: Option<String>,
    pub sync_active: bool,
    pub sync_progress: Option<f64>,
    pub sync_errors: u64,
    pub disks: Vec<ArrayDisk>,
}

impl ArrayStatus {
    pub fn is_started(&self) -> bool {
        self.state == "STARTED"
    }

    /// `started`, `stopped`, `syncing_<action>` or the raw state lower-cased.
    pub fn summary(&self) -> String {
        match self.state.as_str() {
            "STARTED" => match (&self.sync_action, self.sync_active) {
                (Some(action), true) => format!("syncing_{}", action.to_lowercase()),
                _ => "started".to_string(),
            },
            "STOPPED" => "stopped".to_string(),
            other => other.to_lowercase(),
        }
    }
}

/// One slot of the md array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayDisk {
    pub slot: u32,
    /// `parity`, `parity2`, `disk1`, ...
    pub name: String,
    /// Block device, e.g. `sdb`
    pub device: Option<String>,
    /// `rdevStatus`, e.g. `DISK_OK`, `DISK_DSBL`, `DISK_NP`
    pub status: String,
    pub size_bytes: u64,
    pub errors: u64,
}

impl ArrayDisk {
    pub fn is_ok(&self) -> bool {
        self.status == "DISK_OK"
    }
}

/// One line of `df -kP`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilesystemUsage {
    pub filesystem: String,
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub use_percent: f64,
}

/// `smartctl -n standby -i -H -A`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmartReport {
    pub model: Option<String>,
    pub serial: Option<String>,
    pub capacity: Option<String>,
    /// Raw self-assessment result, e.g. `PASSED`
    pub health: Option<String>,
    pub passed: Option<bool>,
    pub temperature: Option<i64>,
    pub power_on_hours: Option<u64>,
    /// Attribute name to leading raw value
    pub attributes: BTreeMap<String, i64>,
    /// The disk was spun down and smartctl did not wake it
    pub standby: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Exited,
    Created,
    Restarting,
    Paused,
    Dead,
    Unknown,
}

impl ContainerState {
    /// Derive state from the `Status` column (`Up 3 hours`, `Exited (0) ...`).
    pub fn from_status(status: &str) -> Self {
        let status = status.trim();
        if status.contains("(Paused)") {
            ContainerState::Paused
        } else if status.starts_with("Up") {
            ContainerState::Running
        } else if status.starts_with("Exited") {
            ContainerState::Exited
        } else if status.starts_with("Created") {
            ContainerState::Created
        } else if status.starts_with("Restarting") {
            ContainerState::Restarting
        } else if status.starts_with("Paused") {
            ContainerState::Paused
        } else if status.starts_with("Dead") {
            ContainerState::Dead
        } else {
            ContainerState::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerState::Running => "running",
            ContainerState::Exited => "exited",
            ContainerState::Created => "created",
            ContainerState::Restarting => "restarting",
            ContainerState::Paused => "paused",
            ContainerState::Dead => "dead",
            ContainerState::Unknown => "unknown",
        }
    }

    pub const ALL: [ContainerState; 7] = [
        ContainerState::Running,
        ContainerState::Exited,
        ContainerState::Created,
        ContainerState::Restarting,
        ContainerState::Paused,
        ContainerState::Dead,
        ContainerState::Unknown,
    ];
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub status: String,
    pub image: String,
    pub state: ContainerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Running,
    Idle,
    Paused,
    InShutdown,
    ShutOff,
    Crashed,
    Suspended,
    Unknown,
}

impl VmState {
    /// Parse the state text printed by `virsh domstate` / `virsh list`.
    pub fn parse(state: &str) -> Self {
        match state.trim().to_lowercase().as_str() {
            "running" => VmState::Running,
            "idle" | "blocked" => VmState::Idle,
            "paused" => VmState::Paused,
            "in shutdown" => VmState::InShutdown,
            "shut off" => VmState::ShutOff,
            "crashed" => VmState::Crashed,
            "pmsuspended" => VmState::Suspended,
            _ => VmState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VmState::Running => "running",
            VmState::Idle => "idle",
            VmState::Paused => "paused",
            VmState::InShutdown => "in shutdown",
            VmState::ShutOff => "shut off",
            VmState::Crashed => "crashed",
            VmState::Suspended => "pmsuspended",
            VmState::Unknown => "unknown",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, VmState::Running | VmState::Idle)
    }
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    Windows,
    Linux,
    Unknown,
}

impl OsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Windows => "windows",
            OsType::Linux => "linux",
            OsType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualMachine {
    /// Domain id; only running domains have one
    pub id: Option<u32>,
    pub name: String,
    pub state: VmState,
    pub vcpus: Option<u32>,
    pub memory_bytes: Option<u64>,
    pub os_type: OsType,
}

/// One entry of the User Scripts plugin's scripts directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScript {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub chip: String,
    pub label: String,
    pub celsius: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub buffers_bytes: u64,
    pub cached_bytes: u64,
}

impl MemoryInfo {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes() as f64 / self.total_bytes as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemIdentity {
    pub hostname: String,
    pub kernel: String,
    pub unraid_version: Option<String>,
}

/// `apcaccess -u`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsStatus {
    /// e.g. `ONLINE`, `ONBATT`
    pub status: Option<String>,
    pub model: Option<String>,
    pub battery_charge_percent: Option<f64>,
    pub runtime_minutes: Option<f64>,
    pub load_percent: Option<f64>,
    pub nominal_power_watts: Option<f64>,
    pub line_voltage: Option<f64>,
}

impl UpsStatus {
    pub fn is_online(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.split_whitespace().any(|flag| flag == "ONLINE"))
    }

    /// Current draw estimated from nominal power and load percentage.
    pub fn load_watts(&self) -> Option<f64> {
        Some(self.nominal_power_watts? * self.load_percent? / 100.0)
    }
}

/// One row of `/proc/net/dev`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_dropped: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_dropped: u64,
}
