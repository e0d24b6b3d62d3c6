use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::models::state::{RefreshSignal, SessionUrgency};

/// Default capacity of each refresh signal queue.
pub const SIGNAL_QUEUE_CAPACITY: usize = 20;

/// Cloneable, non-blocking producer side of the refresh signal queues.
///
/// Safe to call from OS notification threads: every send is a `try_send`,
/// and a full or closed queue only drops the signal.
#[derive(Debug, Clone)]
pub struct RefreshSignaller {
    hardware: Sender<()>,
    sessions: Sender<SessionUrgency>,
}

/// Consumer side, owned by the refresh coordinator loop.
#[derive(Debug)]
pub struct RefreshReceivers {
    pub hardware: Receiver<()>,
    pub sessions: Receiver<SessionUrgency>,
}

/// Create a linked signaller/receiver pair with `capacity` slots per queue.
pub fn refresh_channels(capacity: usize) -> (RefreshSignaller, RefreshReceivers) {
    let (hw_tx, hw_rx) = bounded(capacity);
    let (session_tx, session_rx) = bounded(capacity);
    (
        RefreshSignaller {
            hardware: hw_tx,
            sessions: session_tx,
        },
        RefreshReceivers {
            hardware: hw_rx,
            sessions: session_rx,
        },
    )
}

impl RefreshSignaller {
    pub fn request_hardware_refresh(&self) -> bool {
        Self::offer(&self.hardware, (), "hardware")
    }

    pub fn request_session_refresh(&self, urgency: SessionUrgency) -> bool {
        Self::offer(&self.sessions, urgency, "session")
    }

    pub fn send(&self, signal: RefreshSignal) -> bool {
        match signal {
            RefreshSignal::Hardware => self.request_hardware_refresh(),
            RefreshSignal::Sessions(urgency) => self.request_session_refresh(urgency),
        }
    }

    fn offer<T>(tx: &Sender<T>, value: T, kind: &str) -> bool {
        match tx.try_send(value) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::debug!("{} refresh queue full, dropping signal", kind);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::trace!("{} refresh queue closed, dropping signal", kind);
                false
            }
        }
    }
}
