//! Host metric probes. Each one shells out (or asks `sysinfo`) and turns the
//! result into a short display string. Parsers are kept pure so they can be
//! tested against captured output.

use std::process::Command;

use sysinfo::{Components, System};

use super::{
    Probe, ProbeContext, LABEL_DATE, LABEL_DISK, LABEL_IP, LABEL_LOAD, LABEL_MEM, LABEL_SYNC,
    LABEL_TEMP, LABEL_TIME,
};
use crate::{Error, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

pub fn default_probes() -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(IpProbe),
        Box::new(DateProbe),
        Box::new(TimeProbe),
        Box::new(SyncProbe),
        Box::new(LoadProbe),
        Box::new(TempProbe),
        Box::new(MemProbe),
        Box::new(DiskProbe),
    ]
}

/// Run a utility and return its stdout, treating a non-zero exit as failure.
pub fn run_command(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        return Err(Error::Probe(format!(
            "{program} exited with {}",
            output.status
        )));
    }
    String::from_utf8(output.stdout)
        .map_err(|_| Error::Probe(format!("{program} produced non-UTF-8 output")))
}

pub struct IpProbe;

impl Probe for IpProbe {
    fn label(&self) -> &str {
        LABEL_IP
    }

    fn sample(&self, _ctx: &ProbeContext) -> Result<String> {
        parse_hostname_ips(&run_command("hostname", &["-I"])?)
    }
}

pub struct DateProbe;

impl Probe for DateProbe {
    fn label(&self) -> &str {
        LABEL_DATE
    }

    fn sample(&self, ctx: &ProbeContext) -> Result<String> {
        Ok(ctx.now.format(DATE_FORMAT).to_string())
    }
}

pub struct TimeProbe;

impl Probe for TimeProbe {
    fn label(&self) -> &str {
        LABEL_TIME
    }

    fn sample(&self, ctx: &ProbeContext) -> Result<String> {
        Ok(ctx.now.format(TIME_FORMAT).to_string())
    }
}

pub struct SyncProbe;

impl Probe for SyncProbe {
    fn label(&self) -> &str {
        LABEL_SYNC
    }

    fn sample(&self, ctx: &ProbeContext) -> Result<String> {
        Ok(ctx.sync_status.as_str().to_string())
    }
}

pub struct LoadProbe;

impl Probe for LoadProbe {
    fn label(&self) -> &str {
        LABEL_LOAD
    }

    fn sample(&self, _ctx: &ProbeContext) -> Result<String> {
        format_load(System::load_average().one)
    }
}

/// `vcgencmd` first (Raspberry Pi firmware), then the kernel's thermal sensors.
pub struct TempProbe;

impl Probe for TempProbe {
    fn label(&self) -> &str {
        LABEL_TEMP
    }

    fn sample(&self, _ctx: &ProbeContext) -> Result<String> {
        run_command("vcgencmd", &["measure_temp"])
            .and_then(|raw| parse_vcgencmd_temp(&raw))
            .or_else(|_| {
                let components = Components::new_with_refreshed_list();
                pick_cpu_temperature(
                    components
                        .list()
                        .iter()
                        .map(|c| (c.label(), c.temperature())),
                )
            })
    }
}

pub struct MemProbe;

impl Probe for MemProbe {
    fn label(&self) -> &str {
        LABEL_MEM
    }

    fn sample(&self, _ctx: &ProbeContext) -> Result<String> {
        parse_free_mb(&run_command("free", &["-m"])?)
    }
}

pub struct DiskProbe;

impl Probe for DiskProbe {
    fn label(&self) -> &str {
        LABEL_DISK
    }

    fn sample(&self, _ctx: &ProbeContext) -> Result<String> {
        parse_df_root(&run_command("df", &["-h", "/"])?)
    }
}

/// First address printed by `hostname -I`.
pub fn parse_hostname_ips(raw: &str) -> Result<String> {
    raw.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| Error::Probe("no address assigned".into()))
}

/// One-minute load average, one decimal.
pub fn format_load(one_minute: f64) -> Result<String> {
    if !one_minute.is_finite() || one_minute < 0.0 {
        return Err(Error::Probe(format!("bad load value {one_minute}")));
    }
    Ok(format!("{one_minute:.1}"))
}

/// `temp=38.0'C` from `vcgencmd measure_temp`.
pub fn parse_vcgencmd_temp(raw: &str) -> Result<String> {
    let value = raw
        .trim()
        .strip_prefix("temp=")
        .and_then(|rest| rest.strip_suffix("'C"))
        .ok_or_else(|| Error::Probe(format!("unexpected vcgencmd output '{}'", raw.trim())))?;
    let celsius: f32 = value
        .parse()
        .map_err(|_| Error::Probe(format!("bad temperature '{value}'")))?;
    Ok(format_celsius(celsius))
}

/// A CPU/SoC sensor if one is labelled as such, otherwise the first sensor with a reading.
pub fn pick_cpu_temperature<'a>(
    readings: impl IntoIterator<Item = (&'a str, Option<f32>)>,
) -> Result<String> {
    let readings: Vec<(&str, f32)> = readings
        .into_iter()
        .filter_map(|(label, temp)| temp.filter(|t| t.is_finite()).map(|t| (label, t)))
        .collect();
    let is_cpu = |label: &str| {
        let label = label.to_ascii_lowercase();
        label.contains("cpu") || label.contains("soc")
    };
    readings
        .iter()
        .find(|entry| is_cpu(entry.0))
        .or_else(|| readings.first())
        .map(|(_, celsius)| format_celsius(*celsius))
        .ok_or_else(|| Error::Probe("no temperature sensor".into()))
}

fn format_celsius(celsius: f32) -> String {
    format!("{celsius:.1}°C")
}

/// `used/total` from the `Mem:` row of `free -m`.
pub fn parse_free_mb(raw: &str) -> Result<String> {
    let row = raw
        .lines()
        .find(|line| line.trim_start().starts_with("Mem:"))
        .ok_or_else(|| Error::Probe("free output has no Mem row".into()))?;
    let fields: Vec<&str> = row.split_whitespace().collect();
    let total: u64 = fields
        .get(1)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| Error::Probe("free: missing total".into()))?;
    let used: u64 = fields
        .get(2)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| Error::Probe("free: missing used".into()))?;
    Ok(format!("{used}MB/{total}MB"))
}

/// `used/size` of the filesystem mounted at `/` from `df -h /`.
pub fn parse_df_root(raw: &str) -> Result<String> {
    let row = raw
        .lines()
        .skip(1)
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|fields| fields.last() == Some(&"/"))
        .ok_or_else(|| Error::Probe("df output has no root mount".into()))?;
    match (row.get(1), row.get(2)) {
        (Some(size), Some(used)) => Ok(format!("{used}/{size}")),
        _ => Err(Error::Probe("df: short row".into())),
    }
}
