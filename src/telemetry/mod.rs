use chrono::{DateTime, Local};

use crate::{app::Logger, timesync::SyncStatus, Result};

pub mod probes;

pub const PLACEHOLDER: &str = "N/A";

pub const LABEL_IP: &str = "IP";
pub const LABEL_DATE: &str = "Date";
pub const LABEL_TIME: &str = "Time";
pub const LABEL_SYNC: &str = "Sync";
pub const LABEL_LOAD: &str = "Load";
pub const LABEL_TEMP: &str = "Temp";
pub const LABEL_MEM: &str = "Mem";
pub const LABEL_DISK: &str = "Disk";

/// One display line before layout: `label: value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub label: String,
    pub value: String,
}

impl Entry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn text(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

/// Ordered label/value pairs captured in one refresh. Order drives pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub entries: Vec<Entry>,
}

impl Snapshot {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Inputs shared by every probe during one refresh.
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext {
    pub now: DateTime<Local>,
    pub sync_status: SyncStatus,
}

/// One metric source. Failures stay inside the probe's result; the collector
/// replaces them with a placeholder.
pub trait Probe {
    fn label(&self) -> &str;
    fn sample(&self, ctx: &ProbeContext) -> Result<String>;
}

/// Runs probes in order and assembles a snapshot.
pub struct Collector {
    probes: Vec<Box<dyn Probe>>,
}

impl Collector {
    pub fn new(probes: Vec<Box<dyn Probe>>) -> Self {
        Self { probes }
    }

    /// IP, date, time, sync status, load, temperature, memory, disk.
    pub fn with_default_probes() -> Self {
        Self::new(probes::default_probes())
    }

    pub fn collect(&self, ctx: &ProbeContext, logger: &Logger) -> Snapshot {
        let entries = self
            .probes
            .iter()
            .map(|probe| {
                let value = match probe.sample(ctx) {
                    Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
                    Ok(_) => {
                        logger.debug(format!("probe '{}' returned nothing", probe.label()));
                        PLACEHOLDER.to_string()
                    }
                    Err(err) => {
                        logger.debug(format!("probe '{}' failed: {err}", probe.label()));
                        PLACEHOLDER.to_string()
                    }
                };
                Entry::new(probe.label(), value)
            })
            .collect();
        Snapshot::new(entries)
    }
}
