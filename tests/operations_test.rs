//! Operation component tests
//!
//! Each component runs against a recording executor, so these check both the
//! commands issued and how their output is interpreted.

mod common;

use common::{services_running, RecordingExecutor, MDCMD_STATUS, SMARTCTL_SATA, SMARTCTL_STANDBY};
use std::sync::atomic::Ordering;
use std::time::Duration;
use unraid_exporter::error::ExporterError;
use unraid_exporter::unraid::operations::{
    ContainerAction, DiskOperations, DockerOperations, SystemOperations, UpsOperations,
    UserScriptAction, UserScriptOperations, VmAction, VmOperations,
};
use unraid_exporter::unraid::types::{ContainerState, OsType, VmState};
use unraid_exporter::unraid::CommandOutput;

const DF_OUTPUT: &str = "\
Filesystem     1024-blocks       Used  Available Capacity Mounted on
shfs            7813996000 3906998000 3906998000      50% /mnt/user
/dev/nvme0n1p1   976762584  97676258  879086326      10% /mnt/cache
/dev/sda1         30044176    1502208   28541968       5% /boot
";

const VM_DETAILS: &str = "\
Windows 11§§§running§§§4§§§8388608 KiB§§§<os>   <type arch='x86_64' machine='pc-q35-7.1'>hvm</type> </os> <!-- windows -->
ubuntu-server§§§shut off§§§2§§§2097152 KiB§§§<os> <type arch='x86_64'>hvm</type> </os>
";

const VIRSH_LIST: &str = "\
 Id   Name          State
------------------------------
 1    Windows 11    running
 -    ubuntu        shut off
";

// --- Disk ---

#[tokio::test]
async fn test_array_status_parses_mdcmd() {
    // Given: A started array with a running parity check
    let executor = RecordingExecutor::new();
    executor.responses.on_stdout("mdcmd status", MDCMD_STATUS);
    let disk = DiskOperations::new(executor.clone());

    // When: Querying array status
    let array = disk.array_status().await.expect("array status");

    // Then: State, sync progress and slots are parsed
    assert!(array.is_started());
    assert_eq!(array.num_disks, 3);
    assert!(array.sync_active);
    assert_eq!(array.sync_progress, Some(25.0));
    assert_eq!(array.last_sync, Some(1_700_000_000));
    let names: Vec<&str> = array.disks.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["parity", "md1", "md2"]);
    assert!(!array.disks[2].is_ok());
    assert_eq!(array.disks[2].errors, 12);
    assert_eq!(array.disks[0].size_bytes, 3_907_018_532 * 1024);
}

#[tokio::test]
async fn test_array_status_failure_carries_exit_code() {
    // Given: mdcmd missing on the host
    let executor = RecordingExecutor::new();
    let disk = DiskOperations::new(executor);

    // When: Querying array status
    let err = disk.array_status().await.unwrap_err();

    // Then: The command error keeps the exit code
    assert_eq!(err.exit_code(), Some(127));
    assert!(err.to_string().contains("mdcmd status"));
}

#[tokio::test]
async fn test_array_status_without_state_is_parse_error() {
    // Given: mdcmd answering with nothing useful
    let executor = RecordingExecutor::new();
    executor.responses.on_stdout("mdcmd status", "garbage\n");
    let disk = DiskOperations::new(executor);

    // When/Then: The missing state is reported
    assert!(matches!(
        disk.array_status().await,
        Err(ExporterError::Parse(_))
    ));
}

#[tokio::test]
async fn test_filesystem_usage_queries_standard_mounts() {
    // Given: df reporting three of the five mounts (exit 1 for the missing ones)
    let executor = RecordingExecutor::new();
    executor
        .responses
        .on("df -kP", CommandOutput::new(DF_OUTPUT, "", 1));
    let disk = DiskOperations::new(executor.clone());

    // When: Querying filesystem usage
    let usage = disk.filesystem_usage().await.expect("usage");

    // Then: Present mounts are returned and all five were asked for
    let mounts: Vec<&str> = usage.iter().map(|u| u.mount_point.as_str()).collect();
    assert_eq!(mounts, vec!["/mnt/user", "/mnt/cache", "/boot"]);
    assert_eq!(usage[0].use_percent, 50.0);
    assert_eq!(usage[2].total_bytes, 30_044_176 * 1024);
    let command = &executor.commands()[0];
    for mount in ["/mnt/user", "/mnt/cache", "/boot", "/var/log", "/var/lib/docker"] {
        assert!(command.contains(mount), "{command} missing {mount}");
    }
}

#[tokio::test]
async fn test_smart_report_reads_attributes() {
    // Given: smartctl answering for sdb with a warning bit set
    let executor = RecordingExecutor::new();
    executor
        .responses
        .on("smartctl", CommandOutput::new(SMARTCTL_SATA, "", 4));
    let disk = DiskOperations::new(executor.clone());

    // When: Fetching the report by short device name
    let report = disk.smart_report("sdb").await.expect("report");

    // Then: The device path is quoted and the report parsed
    assert_eq!(
        executor.commands(),
        vec!["smartctl -n standby -i -H -A '/dev/sdb'"]
    );
    assert_eq!(report.model.as_deref(), Some("WDC WD40EFRX-68N32N0"));
    assert_eq!(report.serial.as_deref(), Some("WD-WCC7K1234567"));
    assert_eq!(report.passed, Some(true));
    assert_eq!(report.temperature, Some(33));
    assert_eq!(report.power_on_hours, Some(28731));
    assert!(!report.standby);
}

#[tokio::test]
async fn test_smart_report_for_spun_down_disk() {
    // Given: A disk in standby
    let executor = RecordingExecutor::new();
    executor
        .responses
        .on("smartctl", CommandOutput::new(SMARTCTL_STANDBY, "", 2));
    let disk = DiskOperations::new(executor);

    // When: Fetching its report
    let report = disk.smart_report("/dev/sdc").await.expect("report");

    // Then: It is flagged as standby with no readings
    assert!(report.standby);
    assert_eq!(report.temperature, None);
}

#[tokio::test]
async fn test_smart_report_with_no_output_fails() {
    // Given: smartctl printing nothing
    let executor = RecordingExecutor::new();
    executor
        .responses
        .on("smartctl", CommandOutput::new("", "open failed", 2));
    let disk = DiskOperations::new(executor);

    // When/Then: The failure surfaces as a command error
    let err = disk.smart_report("sdz").await.unwrap_err();
    assert_eq!(err.exit_code(), Some(2));
}

// --- Docker ---

#[tokio::test]
async fn test_containers_listed_when_docker_running() {
    // Given: Docker running with two containers
    let executor = RecordingExecutor::new();
    services_running(&executor.responses);
    executor.responses.on_stdout(
        "docker ps -a --format",
        "a1b2c3|plex|Up 3 hours|plexinc/pms-docker\nd4e5f6|sonarr|Exited (0) 2 days ago|linuxserver/sonarr\n",
    );
    let docker = DockerOperations::new(executor.clone());

    // When: Listing containers
    let containers = docker.containers().await.expect("containers");

    // Then: Both are parsed with their state
    assert_eq!(containers.len(), 2);
    assert_eq!(containers[0].name, "plex");
    assert_eq!(containers[0].state, ContainerState::Running);
    assert_eq!(containers[1].state, ContainerState::Exited);
}

#[tokio::test]
async fn test_containers_empty_when_docker_stopped() {
    // Given: No rc.d status, no dockerd process
    let executor = RecordingExecutor::new();
    let docker = DockerOperations::new(executor.clone());

    // When: Listing containers
    let containers = docker.containers().await.expect("containers");

    // Then: Nothing is listed and docker ps never runs
    assert!(containers.is_empty());
    assert!(!executor.ran("docker ps"));
    assert!(executor.ran("pgrep -f 'dockerd'"));
}

#[tokio::test]
async fn test_docker_detected_by_process_and_socket() {
    // Given: rc.d script silent but dockerd and its socket present
    let executor = RecordingExecutor::new();
    executor.responses.on_stdout("pgrep -f 'dockerd'", "1234\n");
    executor.responses.on_stdout("[ -S '/var/run/docker.sock' ]", "");
    let docker = DockerOperations::new(executor);

    // When/Then: The service counts as running
    assert!(docker.is_running().await.unwrap());
}

#[tokio::test]
async fn test_docker_process_without_socket_is_not_running() {
    // Given: dockerd present but its socket missing
    let executor = RecordingExecutor::new();
    executor.responses.on_stdout("pgrep -f 'dockerd'", "1234\n");
    let docker = DockerOperations::new(executor);

    // When/Then: The service counts as stopped
    assert!(!docker.is_running().await.unwrap());
}

#[tokio::test]
async fn test_containers_fall_back_to_table_output() {
    // Given: An old docker rejecting --format
    let executor = RecordingExecutor::new();
    services_running(&executor.responses);
    executor.responses.on(
        "docker ps -a --format",
        CommandOutput::new("", "unknown flag: --format", 125),
    );
    executor.responses.on_stdout(
        "docker ps -a",
        "CONTAINER ID   IMAGE                COMMAND   CREATED       STATUS                     PORTS                    NAMES\n\
         a1b2c3d4e5f6   plexinc/pms-docker   \"/init\"   2 weeks ago   Up 3 hours                 0.0.0.0:32400->32400/tcp   plex\n",
    );
    let docker = DockerOperations::new(executor);

    // When: Listing containers
    let containers = docker.containers().await.expect("containers");

    // Then: The table is parsed
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].name, "plex");
    assert_eq!(containers[0].image, "plexinc/pms-docker");
    assert_eq!(containers[0].state, ContainerState::Running);
}

#[tokio::test]
async fn test_container_action_uses_quoted_name_and_timeout() {
    // Given: A host accepting docker commands
    let executor = RecordingExecutor::new();
    executor.responses.on_stdout("docker restart", "plex\n");
    let docker = DockerOperations::new(executor.clone());

    // When: Restarting a container
    docker
        .apply("plex", ContainerAction::Restart)
        .await
        .expect("restart");

    // Then: The command is quoted and bounded by the action timeout
    assert_eq!(executor.commands(), vec!["docker restart 'plex'"]);
    assert_eq!(*executor.timeouts.lock(), vec![Duration::from_secs(30)]);
}

#[tokio::test]
async fn test_container_action_failure_is_command_error() {
    // Given: docker refusing the container name
    let executor = RecordingExecutor::new();
    executor.responses.on(
        "docker stop",
        CommandOutput::new("", "Error: No such container: ghost", 1),
    );
    let docker = DockerOperations::new(executor);

    // When: Stopping it
    let err = docker
        .apply("ghost", ContainerAction::Stop)
        .await
        .unwrap_err();

    // Then: The exit code and stderr are kept
    assert_eq!(err.exit_code(), Some(1));
    assert!(err.to_string().contains("No such container"));
}

#[test]
fn test_container_action_names() {
    assert_eq!("resume".parse::<ContainerAction>().unwrap(), ContainerAction::Unpause);
    assert_eq!("pause".parse::<ContainerAction>().unwrap(), ContainerAction::Pause);
    assert!("explode".parse::<ContainerAction>().is_err());
}

// --- VMs ---

#[tokio::test]
async fn test_vms_listed_from_batched_script() {
    // Given: libvirt running and the batched listing answering
    let executor = RecordingExecutor::new();
    // Registered first: the script itself mentions the rc.d status check
    executor.responses.on_stdout("virsh dumpxml", VM_DETAILS);
    services_running(&executor.responses);
    let vm = VmOperations::new(executor);

    // When: Listing VMs
    let vms = vm.vms().await.expect("vms");

    // Then: Name, state, resources and OS are parsed
    assert_eq!(vms.len(), 2);
    assert_eq!(vms[0].name, "Windows 11");
    assert_eq!(vms[0].state, VmState::Running);
    assert_eq!(vms[0].vcpus, Some(4));
    assert_eq!(vms[0].memory_bytes, Some(8_388_608 * 1024));
    assert_eq!(vms[0].os_type, OsType::Windows);
    assert_eq!(vms[1].state, VmState::ShutOff);
    assert_eq!(vms[1].os_type, OsType::Linux);
}

#[tokio::test]
async fn test_vms_fall_back_to_virsh_list() {
    // Given: The batched script failing
    let executor = RecordingExecutor::new();
    executor
        .responses
        .on("virsh dumpxml", CommandOutput::new("", "syntax error", 2));
    services_running(&executor.responses);
    executor.responses.on_stdout("virsh list --all", VIRSH_LIST);
    let vm = VmOperations::new(executor);

    // When: Listing VMs
    let vms = vm.vms().await.expect("vms");

    // Then: The plain listing is used
    assert_eq!(vms.len(), 2);
    assert_eq!(vms[0].id, Some(1));
    assert_eq!(vms[0].name, "Windows 11");
    assert_eq!(vms[1].id, None);
    assert_eq!(vms[1].state, VmState::ShutOff);
}

#[tokio::test]
async fn test_vms_empty_when_libvirt_stopped() {
    // Given: libvirt not running
    let executor = RecordingExecutor::new();
    let vm = VmOperations::new(executor.clone());

    // When: Listing VMs
    let vms = vm.vms().await.expect("vms");

    // Then: Nothing is listed and virsh never runs
    assert!(vms.is_empty());
    assert!(!executor.ran("virsh"));
}

#[tokio::test]
async fn test_vm_action_quotes_name() {
    // Given: virsh accepting commands
    let executor = RecordingExecutor::new();
    executor
        .responses
        .on_stdout("virsh shutdown", "Domain 'Windows 11' is being shutdown\n");
    let vm = VmOperations::new(executor.clone());

    // When: Shutting down a VM whose name has a space
    vm.apply("Windows 11", VmAction::Shutdown)
        .await
        .expect("shutdown");

    // Then: The name is passed as one argument
    assert_eq!(executor.commands(), vec!["virsh shutdown 'Windows 11'"]);
}

#[tokio::test]
async fn test_vm_action_rejects_empty_name() {
    let executor = RecordingExecutor::new();
    let vm = VmOperations::new(executor.clone());

    let result = vm.apply("  ", VmAction::Start).await;

    assert!(matches!(result, Err(ExporterError::Parse(_))));
    assert!(executor.commands().is_empty());
}

#[test]
fn test_vm_action_aliases() {
    assert_eq!("stop".parse::<VmAction>().unwrap(), VmAction::Shutdown);
    assert_eq!("force-stop".parse::<VmAction>().unwrap(), VmAction::Destroy);
    assert_eq!("pause".parse::<VmAction>().unwrap(), VmAction::Suspend);
    assert!("hibernate".parse::<VmAction>().is_err());
}

// --- UPS ---

#[tokio::test]
async fn test_ups_status_none_without_daemon() {
    // Given: No apcupsd
    let executor = RecordingExecutor::new();
    let ups = UpsOperations::new(executor.clone());

    // When/Then: No status and apcaccess never queried
    assert_eq!(ups.status().await.unwrap(), None);
    assert!(!executor.ran("apcaccess -u"));
}

#[tokio::test]
async fn test_ups_status_parsed_when_available() {
    // Given: apcupsd running
    let executor = RecordingExecutor::new();
    executor.responses.on_stdout("pgrep apcupsd", "running\n");
    executor.responses.on_stdout(
        "apcaccess -u",
        "STATUS   : ONLINE\nMODEL    : Back-UPS XS 1500G\nBCHARGE  : 100.0\nTIMELEFT : 45.5\nLOADPCT  : 20.0\nNOMPOWER : 865\nLINEV    : 121.0\n",
    );
    let ups = UpsOperations::new(executor);

    // When: Reading status
    let status = ups.status().await.unwrap().expect("ups present");

    // Then: Readings and derived load are available
    assert!(status.is_online());
    assert_eq!(status.model.as_deref(), Some("Back-UPS XS 1500G"));
    assert_eq!(status.runtime_minutes, Some(45.5));
    assert_eq!(status.load_watts(), Some(173.0));
}

// --- User scripts ---

#[tokio::test]
async fn test_user_scripts_empty_without_plugin() {
    // Given: No User Scripts plugin directory
    let executor = RecordingExecutor::new();
    let userscripts = UserScriptOperations::new(executor.clone());

    // When/Then: No scripts and the directory is never listed
    assert!(userscripts.scripts().await.unwrap().is_empty());
    assert!(!executor.ran("ls -1"));
}

#[tokio::test]
async fn test_user_scripts_listed_one_per_line() {
    // Given: The plugin with two scripts
    let executor = RecordingExecutor::new();
    executor.responses.on_stdout("echo 'exists'", "exists\n");
    executor
        .responses
        .on_stdout("ls -1", "backup appdata\nclear cache\n\n");
    let userscripts = UserScriptOperations::new(executor.clone());

    // When: Listing scripts
    let scripts = userscripts.scripts().await.unwrap();

    // Then: Both names come back in order
    let names: Vec<&str> = scripts.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["backup appdata", "clear cache"]);
    assert!(executor.ran("ls -1 '/boot/config/plugins/user.scripts/scripts'"));
}

#[tokio::test]
async fn test_user_script_run_returns_output_with_long_timeout() {
    // Given: A script that prints a line
    let executor = RecordingExecutor::new();
    executor.responses.on_stdout("bash '/boot", "backup done\n");
    let userscripts = UserScriptOperations::new(executor.clone());

    // When: Running it in the foreground
    let stdout = userscripts.run("backup appdata").await.unwrap();

    // Then: The quoted script body runs under the longer timeout
    assert_eq!(stdout, "backup done\n");
    assert_eq!(
        executor.commands(),
        vec!["bash '/boot/config/plugins/user.scripts/scripts/backup appdata/script'"]
    );
    assert_eq!(*executor.timeouts.lock(), vec![Duration::from_secs(300)]);
}

#[tokio::test]
async fn test_user_script_failure_is_command_error() {
    // Given: A script exiting non-zero
    let executor = RecordingExecutor::new();
    executor
        .responses
        .on("bash '/boot", CommandOutput::new("", "rsync: connection refused", 23));
    let userscripts = UserScriptOperations::new(executor);

    // When: Running it
    let err = userscripts.run("backup").await.unwrap_err();

    // Then: The exit code is carried
    assert!(matches!(err, ExporterError::Command { .. }));
    assert_eq!(err.exit_code(), Some(23));
}

#[tokio::test]
async fn test_user_script_background_and_stop_commands() {
    let executor = RecordingExecutor::new();
    executor.responses.on_stdout("nohup bash", "");
    executor.responses.on_stdout("pkill -f", "");
    let userscripts = UserScriptOperations::new(executor.clone());

    userscripts
        .apply("nightly", UserScriptAction::Background)
        .await
        .unwrap();
    userscripts.apply("nightly", UserScriptAction::Stop).await.unwrap();

    let commands = executor.commands();
    assert_eq!(
        commands[0],
        "nohup bash '/boot/config/plugins/user.scripts/scripts/nightly/script' </dev/null >/dev/null 2>&1 &"
    );
    assert_eq!(
        commands[1],
        r"pkill -f '[/]boot/config/plugins/user\.scripts/scripts/nightly/script'"
    );
}

#[tokio::test]
async fn test_user_script_rejects_path_names() {
    // Given: Names that would escape the scripts directory
    let executor = RecordingExecutor::new();
    let userscripts = UserScriptOperations::new(executor.clone());

    // When/Then: Each is refused before anything runs
    for name in ["", "..", "../../etc/rc.d/rc.local"] {
        let err = userscripts.apply(name, UserScriptAction::Run).await.unwrap_err();
        assert!(matches!(err, ExporterError::Parse(_)), "{name:?} should be rejected");
    }
    assert!(executor.commands().is_empty());
}

#[test]
fn test_user_script_action_aliases() {
    assert_eq!("start".parse::<UserScriptAction>().unwrap(), UserScriptAction::Run);
    assert_eq!(
        "background".parse::<UserScriptAction>().unwrap(),
        UserScriptAction::Background
    );
    assert_eq!("kill".parse::<UserScriptAction>().unwrap(), UserScriptAction::Stop);
    assert!("pause".parse::<UserScriptAction>().is_err());
}

// --- System ---

#[tokio::test]
async fn test_system_readings() {
    // Given: A host answering the procfs commands
    let executor = RecordingExecutor::new();
    executor
        .responses
        .on_stdout("uname -r", "Tower\n6.1.64-Unraid\nversion=\"6.12.6\"\n");
    executor.responses.on_stdout(
        "top -bn1",
        "%Cpu(s):  3.1 us,  1.0 sy,  0.0 ni, 95.6 id,  0.3 wa,  0.0 hi,  0.0 si,  0.0 st\n",
    );
    executor.responses.on_stdout(
        "cat /proc/meminfo",
        "MemTotal:       32768000 kB\nMemFree:         8192000 kB\nMemAvailable:   16384000 kB\nBuffers:          512000 kB\nCached:          4096000 kB\n",
    );
    executor
        .responses
        .on_stdout("cat /proc/uptime", "86400.25 170000.00\n");
    executor
        .responses
        .on_stdout("cat /proc/loadavg", "0.52 0.61 0.70 2/512 12345\n");
    let system = SystemOperations::new(executor);

    // When/Then: Each reading parses
    let identity = system.identity().await.unwrap();
    assert_eq!(identity.hostname, "Tower");
    assert_eq!(identity.unraid_version.as_deref(), Some("6.12.6"));
    assert_eq!(system.cpu_usage().await.unwrap(), 4.4);
    let memory = system.memory().await.unwrap();
    assert_eq!(memory.used_bytes(), 16_384_000 * 1024);
    assert_eq!(memory.used_percent(), 50.0);
    assert_eq!(system.uptime().await.unwrap(), 86400.25);
    assert_eq!(system.load_average().await.unwrap().five, 0.61);
}

#[tokio::test]
async fn test_temperatures_fall_back_to_thermal_zones() {
    // Given: No lm-sensors on the host
    let executor = RecordingExecutor::new();
    executor
        .responses
        .on_stdout("thermal_zone", "acpitz\t27800\nx86_pkg_temp\t45000\n");
    let system = SystemOperations::new(executor);

    // When: Reading temperatures
    let readings = system.temperatures().await.unwrap();

    // Then: Thermal zones are used
    assert_eq!(readings.len(), 2);
    assert_eq!(readings[0].label, "acpitz");
    assert_eq!(readings[1].celsius, 45.0);
}

#[tokio::test]
async fn test_network_counters_skip_virtual_interfaces() {
    // Given: /proc/net/dev with physical, bridge and veth interfaces
    let executor = RecordingExecutor::new();
    executor.responses.on_stdout(
        "cat /proc/net/dev",
        "Inter-|   Receive                                                |  Transmit\n \
         face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n    \
         lo: 1000 10 0 0 0 0 0 0 1000 10 0 0 0 0 0 0\n  \
         eth0: 123456 789 1 2 0 0 0 0 654321 987 3 4 0 0 0 0\n   \
         br0: 5000 50 0 0 0 0 0 0 5000 50 0 0 0 0 0 0\n\
         veth12ab: 10 1 0 0 0 0 0 0 10 1 0 0 0 0 0 0\n",
    );
    let system = SystemOperations::new(executor);

    // When: Reading counters
    let counters = system.network_counters().await.unwrap();

    // Then: Only eth0 is kept
    assert_eq!(counters.len(), 1);
    assert_eq!(counters[0].name, "eth0");
    assert_eq!(counters[0].rx_bytes, 123_456);
    assert_eq!(counters[0].tx_errors, 3);
}

#[tokio::test]
async fn test_unreachable_host_propagates() {
    // Given: An executor whose every command fails
    let executor = RecordingExecutor::new();
    executor.fail_all.store(true, Ordering::SeqCst);
    let system = SystemOperations::new(executor);

    // When/Then: The connection error reaches the caller
    assert!(matches!(
        system.uptime().await,
        Err(ExporterError::Connection(_))
    ));
}
