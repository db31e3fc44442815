use super::key_values;
use crate::unraid::types::{ArrayDisk, ArrayStatus};
use std::collections::BTreeMap;

/// Slot numbers Unraid reserves for parity.
const PARITY_SLOT: u32 = 0;
const PARITY2_SLOT: u32 = 29;

#[derive(Default)]
struct SlotFields {
    disk_name: Option<String>,
    device: Option<String>,
    status: Option<String>,
    size_kb: Option<u64>,
    errors: Option<u64>,
}

/// Parse `mdcmd status` (`key=value` lines, per-slot keys suffixed `.N`).
///
/// Slots with neither a name nor a device are empty and left out. A sync is
/// active while `mdResyncPos` is non-zero; progress is `pos / size`.
pub fn parse_mdcmd_status(output: &str) -> ArrayStatus {
    let mut status = ArrayStatus::default();
    let mut slots: BTreeMap<u32, SlotFields> = BTreeMap::new();
    let mut resync_pos = 0u64;
    let mut resync_size = 0u64;

    for (key, value) in key_values(output, '=') {
        if let Some((field, slot)) = key.split_once('.') {
            let Ok(slot) = slot.parse::<u32>() else {
                continue;
            };
            let entry = slots.entry(slot).or_default();
            let value = value.to_string();
            match field {
                "diskName" => entry.disk_name = Some(value).filter(|v| !v.is_empty()),
                "rdevName" => entry.device = Some(value).filter(|v| !v.is_empty()),
                "rdevStatus" => entry.status = Some(value).filter(|v| !v.is_empty()),
                "rdevSize" | "diskSize" => {
                    if let Ok(size) = value.parse::<u64>() {
                        entry.size_kb = Some(entry.size_kb.map_or(size, |s| s.max(size)));
                    }
                }
                "rdevNumErrors" => entry.errors = value.parse().ok(),
                _ => {}
            }
            continue;
        }

        match key {
            "mdState" => status.state = value.to_uppercase(),
            "mdNumDisks" => status.num_disks = value.parse().unwrap_or(0),
            "mdNumDisabled" => status.num_disabled = value.parse().unwrap_or(0),
            "mdNumInvalid" => status.num_invalid = value.parse().unwrap_or(0),
            "mdNumMissing" => status.num_missing = value.parse().unwrap_or(0),
            "sbSynced" => status.last_sync = value.parse().ok().filter(|&t: &u64| t > 0),
            "mdResyncAction" => {
                status.sync_action = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            "mdResyncPos" => resync_pos = value.parse().unwrap_or(0),
            "mdResyncSize" => resync_size = value.parse().unwrap_or(0),
            "mdResyncCorr" => status.sync_errors = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    status.sync_active = resync_pos > 0;
    if status.sync_active && resync_size > 0 {
        let progress = resync_pos as f64 / resync_size as f64 * 100.0;
        status.sync_progress = Some(progress.min(100.0));
    }

    status.disks = slots
        .into_iter()
        .filter(|(_, fields)| fields.disk_name.is_some() || fields.device.is_some())
        .map(|(slot, fields)| ArrayDisk {
            slot,
            name: fields.disk_name.unwrap_or_else(|| default_slot_name(slot)),
            device: fields.device,
            status: fields.status.unwrap_or_else(|| "UNKNOWN".to_string()),
            size_bytes: fields.size_kb.unwrap_or(0).saturating_mul(1024),
            errors: fields.errors.unwrap_or(0),
        })
        .collect();

    status
}

fn default_slot_name(slot: u32) -> String {
    match slot {
        PARITY_SLOT => "parity".to_string(),
        PARITY2_SLOT => "parity2".to_string(),
        n => format!("disk{n}"),
    }
}
