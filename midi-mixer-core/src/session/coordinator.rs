use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{select, tick, Receiver};
use parking_lot::Mutex;

use crate::models::config::RefreshTimings;
use crate::models::state::{RefreshSignal, RefreshState, SessionUrgency};
use crate::processing::debounce::Debouncer;
use crate::session::endpoint::EndpointModel;
use crate::session::signals::RefreshReceivers;
use crate::traits::audio_backend::AudioBackend;

/// How long the loop sleeps when nothing is pending.
const IDLE_WAIT: Duration = Duration::from_secs(1);

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub hardware_refreshes: u64,
    pub session_refreshes: u64,
}

/// Serializes every mutation of the endpoint model.
///
/// Signals arm one of two debouncers; `poll` runs whichever refresh is due
/// while holding the model lock, so readers never see a half-built model.
/// A hardware refresh always arms an immediate session refresh afterwards,
/// because sessions belong to the endpoint that was just replaced.
///
/// The state machine is driven by explicit instants. `run` wraps it in a
/// channel loop on a dedicated thread.
pub struct RefreshCoordinator {
    backend: Arc<dyn AudioBackend>,
    model: Arc<Mutex<EndpointModel>>,
    timings: RefreshTimings,
    hardware: Debouncer,
    sessions: Debouncer,
    stats: RefreshStats,
}

impl RefreshCoordinator {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        model: Arc<Mutex<EndpointModel>>,
        timings: RefreshTimings,
    ) -> Self {
        Self {
            backend,
            model,
            timings,
            hardware: Debouncer::new(timings.hardware_quiet, timings.hardware_max_wait),
            sessions: Debouncer::new(timings.session_quiet, timings.session_max_wait),
            stats: RefreshStats::default(),
        }
    }

    pub fn state(&self) -> RefreshState {
        if self.hardware.is_pending() {
            RefreshState::HardwarePending
        } else if self.sessions.is_pending() {
            RefreshState::SessionPending
        } else {
            RefreshState::Idle
        }
    }

    pub fn stats(&self) -> RefreshStats {
        self.stats
    }

    pub fn on_signal(&mut self, signal: RefreshSignal, now: Instant) {
        match signal {
            RefreshSignal::Hardware => {
                log::debug!("default audio devices change detected");
                self.hardware.trigger(now);
            }
            RefreshSignal::Sessions(SessionUrgency::Immediate) => {
                log::trace!("triggering audio session refresh");
                self.sessions.trigger(now);
            }
            RefreshSignal::Sessions(SessionUrgency::Lazy) => {
                log::trace!("scheduling lazy audio session resync");
                self.sessions.throttle(now, self.timings.lazy_resync);
            }
        }
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.hardware.deadline(), self.sessions.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run every refresh whose debounce period has elapsed.
    pub fn poll(&mut self, now: Instant) {
        if self.hardware.fire(now) {
            self.refresh_hardware();
            self.on_signal(RefreshSignal::Sessions(SessionUrgency::Immediate), now);
        }
        if self.sessions.fire(now) {
            self.refresh_sessions();
        }
    }

    fn refresh_hardware(&mut self) {
        log::trace!("refreshing hardware devices");
        let mut model = self.model.lock();
        model.refresh_hardware(self.backend.as_ref());
        self.stats.hardware_refreshes += 1;
    }

    fn refresh_sessions(&mut self) {
        log::trace!("refreshing audio sessions");
        let mut model = self.model.lock();
        match model.refresh_sessions() {
            Ok(_) => {}
            Err(e) if e.is_not_found() => log::debug!("skipping session refresh: {}", e),
            Err(e) => log::error!("failed to refresh audio sessions: {}", e),
        }
        self.stats.session_refreshes += 1;
    }

    /// Consume signals until `shutdown` fires or every producer is gone.
    ///
    /// Pending debounce timers are abandoned on shutdown.
    pub fn run(mut self, receivers: RefreshReceivers, shutdown: Receiver<()>) -> RefreshStats {
        log::trace!("enter refresh coordinator loop");
        let ticker = tick(self.timings.periodic_resync);

        loop {
            let wait = self
                .next_deadline()
                .map(|d| d.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_WAIT);

            select! {
                recv(shutdown) -> _ => break,
                recv(receivers.hardware) -> msg => match msg {
                    Ok(()) => self.on_signal(RefreshSignal::Hardware, Instant::now()),
                    Err(_) => break,
                },
                recv(receivers.sessions) -> msg => match msg {
                    Ok(urgency) => self.on_signal(RefreshSignal::Sessions(urgency), Instant::now()),
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    self.on_signal(RefreshSignal::Sessions(SessionUrgency::Lazy), Instant::now());
                },
                default(wait) => {}
            }

            self.poll(Instant::now());
        }

        log::trace!("exit refresh coordinator loop");
        self.stats
    }
}
