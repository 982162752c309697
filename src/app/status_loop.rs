use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

use chrono::Local;

use super::{lifecycle::blank_on_exit, schedule::Periodic, Logger};
use crate::{
    display::{Display, PanelDriver},
    pager::{paginate, Page},
    render::{Frame, Renderer, ScrollOffsets},
    telemetry::{Collector, ProbeContext},
    timesync::{SyncStatus, TimeSync, RESYNC_INTERVAL},
    Result,
};

/// Poll period of the loop.
pub const TICK: Duration = Duration::from_millis(100);
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(10);
pub const PAGE_INTERVAL: Duration = Duration::from_secs(5);

struct Timers {
    resync: Periodic,
    refresh: Periodic,
    advance: Periodic,
    redraw: Periodic,
}

/// Everything the running daemon owns: pages, scroll state, sync status, the panel.
pub struct StatusLoop<P: PanelDriver> {
    display: Display<P>,
    collector: Collector,
    time_sync: TimeSync,
    renderer: Renderer,
    frame: Frame,
    pages: Vec<Page>,
    current: usize,
    offsets: ScrollOffsets,
    sync_status: SyncStatus,
    timers: Timers,
}

impl<P: PanelDriver> StatusLoop<P> {
    /// `sync_status` is the result of the startup sync; the next one is due
    /// `RESYNC_INTERVAL` after `now`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        display: Display<P>,
        collector: Collector,
        time_sync: TimeSync,
        renderer: Renderer,
        sync_status: SyncStatus,
        scroll_speed: Duration,
        now: Instant,
        logger: &Logger,
    ) -> Self {
        let mut status_loop = Self {
            display,
            collector,
            time_sync,
            frame: Frame::new(renderer.width(), renderer.height()),
            renderer,
            pages: Vec::new(),
            current: 0,
            offsets: ScrollOffsets::new(),
            sync_status,
            timers: Timers {
                resync: Periodic::new(RESYNC_INTERVAL, now),
                refresh: Periodic::new(REFRESH_INTERVAL, now),
                advance: Periodic::new(PAGE_INTERVAL, now),
                redraw: Periodic::new(scroll_speed, now),
            },
        };
        status_loop.rebuild_pages(logger);
        status_loop
    }

    /// Fresh telemetry, fresh pages. Scroll offsets are keyed by page position, so
    /// they are dropped here.
    pub fn rebuild_pages(&mut self, logger: &Logger) {
        let ctx = ProbeContext {
            now: Local::now(),
            sync_status: self.sync_status,
        };
        let snapshot = self.collector.collect(&ctx, logger);
        self.pages = paginate(&snapshot, self.renderer.capacity());
        self.offsets.reset();
        if self.current >= self.pages.len() {
            self.current = 0;
        }
        logger.debug(format!(
            "rebuilt {} pages from {} entries",
            self.pages.len(),
            snapshot.len()
        ));
    }

    pub fn advance_page(&mut self) {
        if !self.pages.is_empty() {
            self.current = (self.current + 1) % self.pages.len();
        }
    }

    /// Render the current page (stepping any scrolling lines) and push it.
    pub fn draw(&mut self) -> Result<()> {
        let empty = Page::default();
        let page = self.pages.get(self.current).unwrap_or(&empty);
        if let Err(never) =
            self.renderer
                .draw_page(&mut self.frame, self.current, page, &mut self.offsets)
        {
            match never {}
        }
        self.display.display(&self.frame)
    }

    /// Run whichever periodic actions are due at `now`.
    pub fn step(&mut self, now: Instant, logger: &Logger) -> Result<()> {
        let mut rebuild = false;
        if self.timers.resync.due(now) {
            self.sync_status = self.time_sync.synchronize(logger);
            rebuild = true;
        }
        if self.timers.refresh.due(now) {
            rebuild = true;
        }
        if rebuild {
            self.rebuild_pages(logger);
        }
        if self.timers.advance.due(now) {
            self.advance_page();
            logger.trace(format!("showing page {}", self.current));
        }
        if self.timers.redraw.due(now) {
            self.draw()?;
        }
        Ok(())
    }

    /// Tick until `running` goes false. Errors end the loop immediately.
    pub fn run(&mut self, running: &AtomicBool, logger: &Logger) -> Result<()> {
        self.draw()?;
        while running.load(Ordering::SeqCst) {
            self.step(Instant::now(), logger)?;
            thread::sleep(TICK);
        }
        logger.info("interrupt received, stopping");
        Ok(())
    }

    pub fn shutdown(&mut self, logger: &Logger) {
        blank_on_exit(&mut self.display, logger);
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn offsets(&self) -> &ScrollOffsets {
        &self.offsets
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn display(&self) -> &Display<P> {
        &self.display
    }
}
