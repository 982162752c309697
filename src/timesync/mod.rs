use std::time::{Duration, SystemTime};

use crate::{app::Logger, config::Config, Result};

pub mod clock;
pub mod sntp;

pub use clock::{HwClock, RealtimeClock};
pub use sntp::SntpClient;

/// Wall-clock interval between sync attempts, measured from the last attempt.
pub const RESYNC_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Outcome of the most recent sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Network,
    HardwareClock,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Network => "synced via network",
            SyncStatus::HardwareClock => "synced via hardware clock",
            SyncStatus::Failed => "sync failed",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative time over the network.
pub trait TimeSource {
    fn fetch(&self, server: &str, timeout: Duration) -> Result<SystemTime>;
}

/// The host's realtime clock.
pub trait SystemClock {
    fn set(&self, time: SystemTime) -> Result<()>;
}

/// Battery-backed RTC that can seed the host clock.
pub trait HardwareClock {
    fn restore_system_clock(&self) -> Result<()>;
}

pub struct TimeSync {
    source: Box<dyn TimeSource>,
    clock: Box<dyn SystemClock>,
    rtc: Box<dyn HardwareClock>,
    server: String,
    timeout: Duration,
}

impl TimeSync {
    pub fn new(
        source: Box<dyn TimeSource>,
        clock: Box<dyn SystemClock>,
        rtc: Box<dyn HardwareClock>,
        server: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            clock,
            rtc,
            server: server.into(),
            timeout,
        }
    }

    /// SNTP + `clock_settime` + `hwclock`, using the server and timeout from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(SntpClient),
            Box::new(RealtimeClock),
            Box::new(HwClock),
            config.ntp_server.clone(),
            config.sync_timeout,
        )
    }

    /// Network first, RTC second. Never fails; the status says what happened.
    pub fn synchronize(&self, logger: &Logger) -> SyncStatus {
        match self.sync_from_network() {
            Ok(()) => {
                logger.info(format!("time synced from {}", self.server));
                return SyncStatus::Network;
            }
            Err(err) => logger.warn(format!("network time sync via {} failed: {err}", self.server)),
        }

        match self.rtc.restore_system_clock() {
            Ok(()) => {
                logger.info("system clock restored from hardware clock");
                SyncStatus::HardwareClock
            }
            Err(err) => {
                logger.error(format!("hardware clock sync failed: {err}"));
                SyncStatus::Failed
            }
        }
    }

    fn sync_from_network(&self) -> Result<()> {
        let now = self.source.fetch(&self.server, self.timeout)?;
        self.clock.set(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Source(Option<SystemTime>);

    impl TimeSource for Source {
        fn fetch(&self, _server: &str, _timeout: Duration) -> Result<SystemTime> {
            self.0
                .ok_or_else(|| Error::TimeSync("no reply before timeout".into()))
        }
    }

    #[derive(Clone, Default)]
    struct Clock {
        fail: bool,
        set_to: Rc<RefCell<Vec<SystemTime>>>,
    }

    impl SystemClock for Clock {
        fn set(&self, time: SystemTime) -> Result<()> {
            if self.fail {
                return Err(Error::TimeSync("EPERM".into()));
            }
            self.set_to.borrow_mut().push(time);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Rtc {
        ok: bool,
        calls: Rc<RefCell<u32>>,
    }

    impl HardwareClock for Rtc {
        fn restore_system_clock(&self) -> Result<()> {
            *self.calls.borrow_mut() += 1;
            if self.ok {
                Ok(())
            } else {
                Err(Error::Probe("hwclock: no usable clock interface".into()))
            }
        }
    }

    fn sync(source: Source, clock: Clock, rtc: Rtc) -> SyncStatus {
        TimeSync::new(
            Box::new(source),
            Box::new(clock),
            Box::new(rtc),
            "ntp.example",
            Duration::from_secs(3),
        )
        .synchronize(&Logger::silent())
    }

    #[test]
    fn network_success_sets_clock_and_skips_rtc() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let clock = Clock::default();
        let rtc = Rtc::default();
        let status = sync(Source(Some(t)), clock.clone(), rtc.clone());
        assert_eq!(status, SyncStatus::Network);
        assert_eq!(*clock.set_to.borrow(), vec![t]);
        assert_eq!(*rtc.calls.borrow(), 0);
    }

    #[test]
    fn network_failure_falls_back_to_rtc() {
        let rtc = Rtc {
            ok: true,
            ..Rtc::default()
        };
        let status = sync(Source(None), Clock::default(), rtc.clone());
        assert_eq!(status, SyncStatus::HardwareClock);
        assert_eq!(status.as_str(), "synced via hardware clock");
        assert_eq!(*rtc.calls.borrow(), 1);
    }

    #[test]
    fn clock_set_failure_counts_as_network_failure() {
        let clock = Clock {
            fail: true,
            ..Clock::default()
        };
        let rtc = Rtc {
            ok: true,
            ..Rtc::default()
        };
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(5);
        assert_eq!(sync(Source(Some(t)), clock, rtc), SyncStatus::HardwareClock);
    }

    #[test]
    fn both_failing_reports_failure() {
        let status = sync(Source(None), Clock::default(), Rtc::default());
        assert_eq!(status, SyncStatus::Failed);
        assert_eq!(status.to_string(), "sync failed");
    }
}
