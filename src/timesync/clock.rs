use std::time::SystemTime;

use super::{HardwareClock, SystemClock};
use crate::{telemetry::probes::run_command, Error, Result};

/// Sets CLOCK_REALTIME directly. Needs CAP_SYS_TIME.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealtimeClock;

#[cfg(target_os = "linux")]
impl SystemClock for RealtimeClock {
    fn set(&self, time: SystemTime) -> Result<()> {
        let since = time
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| Error::TimeSync(format!("time before epoch: {e}")))?;
        let spec = rustix::time::Timespec {
            tv_sec: since.as_secs() as _,
            tv_nsec: since.subsec_nanos() as _,
        };
        rustix::time::clock_settime(rustix::time::ClockId::Realtime, spec)
            .map_err(|errno| Error::Io(errno.into()))
    }
}

#[cfg(not(target_os = "linux"))]
impl SystemClock for RealtimeClock {
    fn set(&self, time: SystemTime) -> Result<()> {
        let _ = time;
        Err(Error::TimeSync(
            "setting the system clock is only supported on Linux".into(),
        ))
    }
}

/// `hwclock --hctosys`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HwClock;

impl HardwareClock for HwClock {
    fn restore_system_clock(&self) -> Result<()> {
        run_command("hwclock", &["--hctosys"]).map(|_| ())
    }
}
