//! Shared test doubles: a scripted SSH transport and a recording executor.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use secrecy::SecretString;
use unraid_exporter::config::{Config, MetricsConfig, PoolConfig, ServerConfig, UnraidConfig};
use unraid_exporter::error::{ExporterError, Result};
use unraid_exporter::logging::LoggingConfig;
use unraid_exporter::unraid::transport::{Session, Transport};
use unraid_exporter::unraid::{CommandExecutor, CommandOutput, SshTarget};

/// Canned answers matched by substring, first match wins.
#[derive(Default)]
pub struct Responses {
    entries: Mutex<Vec<(String, CommandOutput)>>,
}

impl Responses {
    pub fn on(&self, needle: &str, output: CommandOutput) {
        self.entries.lock().push((needle.to_string(), output));
    }

    pub fn on_stdout(&self, needle: &str, stdout: &str) {
        self.on(needle, CommandOutput::new(stdout, "", 0));
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn answer(&self, command: &str) -> CommandOutput {
        self.entries
            .lock()
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::new("", "command not found", 127))
    }
}

/// State shared between a [`ScriptedTransport`] and the sessions it opens.
#[derive(Default)]
pub struct Script {
    pub opens: AtomicUsize,
    pub runs: AtomicUsize,
    pub fail_open: AtomicBool,
    pub fail_run: AtomicBool,
    pub reject_auth: AtomicBool,
    pub run_delay: Mutex<Option<Duration>>,
    pub responses: Responses,
    pub commands: Mutex<Vec<String>>,
    closes: Mutex<Vec<Arc<AtomicUsize>>>,
}

impl Script {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Close count of every session opened so far, in open order.
    pub fn close_counts(&self) -> Vec<usize> {
        self.closes
            .lock()
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .collect()
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_run(&self, fail: bool) {
        self.fail_run.store(fail, Ordering::SeqCst);
    }
}

pub struct ScriptedTransport {
    pub script: Arc<Script>,
}

impl ScriptedTransport {
    pub fn new() -> (Arc<Self>, Arc<Script>) {
        let script = Arc::new(Script::default());
        (
            Arc::new(Self {
                script: Arc::clone(&script),
            }),
            script,
        )
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self, _target: &SshTarget) -> Result<Box<dyn Session>> {
        self.script.opens.fetch_add(1, Ordering::SeqCst);
        if self.script.reject_auth.load(Ordering::SeqCst) {
            return Err(ExporterError::Auth("password rejected".to_string()));
        }
        if self.script.fail_open.load(Ordering::SeqCst) {
            return Err(ExporterError::Connection("connection refused".to_string()));
        }
        let closes = Arc::new(AtomicUsize::new(0));
        self.script.closes.lock().push(Arc::clone(&closes));
        Ok(Box::new(ScriptedSession {
            script: Arc::clone(&self.script),
            closes,
        }))
    }
}

struct ScriptedSession {
    script: Arc<Script>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn run(&self, command: &str) -> Result<CommandOutput> {
        self.script.runs.fetch_add(1, Ordering::SeqCst);
        self.script.commands.lock().push(command.to_string());

        let delay = *self.script.run_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.fail_run.load(Ordering::SeqCst) {
            return Err(ExporterError::Connection("channel closed".to_string()));
        }
        Ok(self.script.responses.answer(command))
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn target() -> SshTarget {
    SshTarget::new("tower", "root", "secret", 22)
}

pub fn test_config() -> Config {
    Config {
        unraid: UnraidConfig {
            host: "tower".to_string(),
            port: 22,
            username: "root".to_string(),
            password: SecretString::from("secret".to_string()),
        },
        server: ServerConfig::default(),
        metrics: MetricsConfig::default(),
        pool: PoolConfig::default(),
        logging: LoggingConfig::default(),
    }
}

/// Executor answering from [`Responses`] and recording every command.
#[derive(Default)]
pub struct RecordingExecutor {
    pub responses: Responses,
    pub commands: Mutex<Vec<String>>,
    pub timeouts: Mutex<Vec<Duration>>,
    pub fail_all: AtomicBool,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.commands.lock().iter().any(|c| c.contains(needle))
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, command: &str) -> Result<CommandOutput> {
        self.commands.lock().push(command.to_string());
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(ExporterError::Connection("host unreachable".to_string()));
        }
        Ok(self.responses.answer(command))
    }

    async fn execute_with_timeout(&self, command: &str, timeout: Duration) -> Result<CommandOutput> {
        self.timeouts.lock().push(timeout);
        self.execute(command).await
    }
}

/// Docker and libvirt both report running through their rc.d scripts.
pub fn services_running(responses: &Responses) {
    responses.on_stdout("/etc/rc.d/rc.docker status", "status of dockerd: is currently running\n");
    responses.on_stdout("/etc/rc.d/rc.libvirt status", "libvirtd is currently running\n");
}

pub const MDCMD_STATUS: &str = "\
sbSynced=1700000000
mdState=STARTED
mdNumDisks=3
mdNumDisabled=0
mdNumInvalid=0
mdNumMissing=0
mdResyncAction=check P
mdResyncPos=250000
mdResyncSize=1000000
mdResyncCorr=0
diskName.0=
rdevName.0=sdb
rdevStatus.0=DISK_OK
rdevSize.0=3907018532
rdevNumErrors.0=0
diskName.1=md1
rdevName.1=sdc
rdevStatus.1=DISK_OK
rdevSize.1=3907018532
rdevNumErrors.1=0
diskName.2=md2
rdevName.2=sdd
rdevStatus.2=DISK_DSBL
rdevSize.2=1953514552
rdevNumErrors.2=12
diskName.3=
rdevName.3=
rdevStatus.3=DISK_NP
";

pub const SMARTCTL_SATA: &str = "\
smartctl 7.3 2022-02-28 r5338 [x86_64-linux-6.1.64-Unraid] (local build)
=== START OF INFORMATION SECTION ===
Device Model:     WDC WD40EFRX-68N32N0
Serial Number:    WD-WCC7K1234567
User Capacity:    4,000,787,030,016 bytes [4.00 TB]

=== START OF READ SMART DATA SECTION ===
SMART overall-health self-assessment test result: PASSED

ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
  5 Reallocated_Sector_Ct   0x0033   200   200   140    Pre-fail  Always       -       0
  9 Power_On_Hours          0x0032   061   061   000    Old_age   Always       -       28731
194 Temperature_Celsius     0x0022   114   100   000    Old_age   Always       -       33 (Min/Max 18/45)
";

pub const SMARTCTL_STANDBY: &str = "\
smartctl 7.3 2022-02-28 r5338 [x86_64-linux-6.1.64-Unraid] (local build)
Device is in STANDBY mode, exit(2)
";

pub const DOCKER_PS: &str = "\
a1b2c3|plex|Up 3 hours|plexinc/pms-docker
d4e5f6|sonarr|Exited (0) 2 days ago|linuxserver/sonarr
";

/// A healthy host with Docker, libvirt, sensors and no UPS.
pub fn scripted_host(responses: &Responses) {
    // Before the service checks: the VM script contains the rc.d status call
    responses.on_stdout(
        "virsh dumpxml",
        "Windows 11§§§running§§§4§§§8388608 KiB§§§<os> windows </os>\n",
    );
    services_running(responses);
    responses.on_stdout("mdcmd status", MDCMD_STATUS);
    responses.on_stdout(
        "df -kP",
        "Filesystem 1024-blocks Used Available Capacity Mounted on\nshfs 1000 400 600 40% /mnt/user\n",
    );
    responses.on("'/dev/sdd'", CommandOutput::new(SMARTCTL_STANDBY, "", 2));
    responses.on_stdout("smartctl", SMARTCTL_SATA);
    responses.on_stdout("docker ps -a --format", DOCKER_PS);
    responses.on_stdout("uname -r", "Tower\n6.1.64-Unraid\nversion=\"6.12.6\"\n");
    responses.on_stdout("top -bn1", "%Cpu(s):  3.1 us,  1.0 sy,  0.0 ni, 95.6 id\n");
    responses.on_stdout(
        "cat /proc/meminfo",
        "MemTotal: 1000 kB\nMemFree: 200 kB\nMemAvailable: 600 kB\n",
    );
    responses.on_stdout("cat /proc/uptime", "3600.00 7000.00\n");
    responses.on_stdout("cat /proc/loadavg", "0.50 0.40 0.30 1/200 999\n");
    responses.on_stdout("sensors", "coretemp-isa-0000\nCore 0:  +41.0°C  (high = +80.0°C)\n");
    responses.on_stdout(
        "cat /proc/net/dev",
        "  eth0: 1000 10 0 0 0 0 0 0 2000 20 1 0 0 0 0 0\n",
    );
}
