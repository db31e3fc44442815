//! Logging setup
//!
//! Installs the `tracing` subscriber used by the binary. The filter layer is
//! wrapped in a reload handle so directives can be changed at runtime and
//! put back with [`LoggingHandle::restore`] on shutdown.
//!
//! A polling exporter repeats itself: the same message fires every scrape
//! while a disk sleeps or a service is down. [`DuplicateFilter`] lets the
//! first few copies of an info or debug event through per period and drops
//! the rest. Warnings and errors are never suppressed, and two events only
//! count as duplicates when their message and every field match.

use anyhow::{Context as _, Result};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Filter, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as fmt_layer, reload, EnvFilter, Layer, Registry};

/// Debug messages that fire on every command and carry no information.
const CHATTER_PATTERNS: &[&str] = &["Reusing existing connection", "Retrying command"];

/// Tracker entries kept before stale keys are pruned.
const MAX_TRACKED_MESSAGES: usize = 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_max_duplicates")]
    pub max_duplicates: u32,
    #[serde(default = "default_rate_limit_period")]
    pub rate_limit_period_seconds: u64,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_max_duplicates() -> u32 {
    5
}

fn default_rate_limit_period() -> u64 {
    300
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            max_duplicates: default_max_duplicates(),
            rate_limit_period_seconds: default_rate_limit_period(),
        }
    }
}

impl LoggingConfig {
    /// Filter directives derived from the configured level.
    ///
    /// russh logs every packet at debug, so it is held at `warn` unless
    /// `RUST_LOG` says otherwise.
    pub fn directives(&self) -> String {
        format!("{},russh=warn", self.level)
    }

    pub fn rate_limit_period(&self) -> Duration {
        Duration::from_secs(self.rate_limit_period_seconds)
    }

    /// Install the global subscriber.
    ///
    /// `RUST_LOG`, when set, takes precedence over the configured level.
    pub fn setup(&self) -> Result<LoggingHandle> {
        let directives = match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(from_env) if !from_env.trim().is_empty() => from_env,
            _ => self.directives(),
        };
        let filter = EnvFilter::try_new(&directives)
            .with_context(|| format!("Invalid log directives: {directives}"))?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer::layer().with_filter(DuplicateFilter::new(self)))
            .try_init()
            .context("Failed to install tracing subscriber")?;

        Ok(LoggingHandle {
            reload_handle,
            original: directives,
        })
    }
}

/// Owned by `main`; dropping it leaves the current filter in place.
pub struct LoggingHandle {
    reload_handle: reload::Handle<EnvFilter, Registry>,
    original: String,
}

impl LoggingHandle {
    /// Swap in new filter directives, e.g. `"debug,russh=info"`.
    pub fn set_directives(&self, directives: &str) -> Result<()> {
        let filter = EnvFilter::try_new(directives)
            .with_context(|| format!("Invalid log directives: {directives}"))?;
        self.reload_handle
            .reload(filter)
            .context("Failed to reload log filter")
    }

    /// Put back the directives that were active when logging was set up.
    pub fn restore(&self) -> Result<()> {
        self.set_directives(&self.original)
    }

    pub fn original_directives(&self) -> &str {
        &self.original
    }
}

impl fmt::Debug for LoggingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingHandle")
            .field("original", &self.original)
            .finish()
    }
}

/// Counts identical messages inside a rolling period.
#[derive(Debug)]
pub struct DuplicateTracker {
    max_duplicates: u32,
    period: Duration,
    seen: HashMap<String, (u32, Instant)>,
}

impl DuplicateTracker {
    pub fn new(max_duplicates: u32, period: Duration) -> Self {
        Self {
            max_duplicates,
            period,
            seen: HashMap::new(),
        }
    }

    /// Record one occurrence of `key` at `now`; returns whether to emit it.
    pub fn observe(&mut self, key: &str, now: Instant) -> bool {
        if self.seen.len() >= MAX_TRACKED_MESSAGES && !self.seen.contains_key(key) {
            let period = self.period;
            self.seen
                .retain(|_, (_, started)| now.saturating_duration_since(*started) <= period);
        }

        let entry = self.seen.entry(key.to_string()).or_insert((0, now));
        if now.saturating_duration_since(entry.1) > self.period {
            *entry = (0, now);
        }
        entry.0 = entry.0.saturating_add(1);
        entry.0 <= self.max_duplicates
    }

    pub fn tracked(&self) -> usize {
        self.seen.len()
    }
}

/// Per-layer filter dropping repeated messages and per-command chatter.
#[derive(Debug, Clone)]
pub struct DuplicateFilter {
    tracker: Arc<Mutex<DuplicateTracker>>,
}

impl DuplicateFilter {
    pub fn new(config: &LoggingConfig) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(DuplicateTracker::new(
                config.max_duplicates,
                config.rate_limit_period(),
            ))),
        }
    }
}

/// Whether a debug message is known per-command noise.
pub fn is_chatter(level: &Level, message: &str) -> bool {
    *level == Level::DEBUG && CHATTER_PATTERNS.iter().any(|p| message.contains(p))
}

impl<S: Subscriber> Filter<S> for DuplicateFilter {
    fn enabled(&self, _meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        true
    }

    fn event_enabled(&self, event: &Event<'_>, _cx: &Context<'_, S>) -> bool {
        let meta = event.metadata();
        if matches!(*meta.level(), Level::ERROR | Level::WARN) {
            return true;
        }

        let mut visitor = EventKeyVisitor::default();
        event.record(&mut visitor);
        if is_chatter(meta.level(), &visitor.message) {
            return false;
        }

        let key = format!(
            "{}|{}|{}|{}",
            meta.level(),
            meta.target(),
            visitor.message,
            visitor.fields
        );
        self.tracker.lock().observe(&key, Instant::now())
    }
}

/// Collects the message and every other field of an event into a dedup key.
#[derive(Default)]
struct EventKeyVisitor {
    message: String,
    fields: String,
}

impl Visit for EventKeyVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push_str(&format!("{}={};", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push_str(&format!("{}={:?};", field.name(), value));
        }
    }
}
