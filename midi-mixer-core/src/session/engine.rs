use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;

use crate::models::config::{RefreshTimings, VolumeMapping};
use crate::models::error::MixerError;
use crate::models::state::{ControlMessage, SessionUrgency};
use crate::session::coordinator::{RefreshCoordinator, RefreshStats};
use crate::session::dispatcher::MappingDispatcher;
use crate::session::endpoint::{EndpointModel, ModelSnapshot};
use crate::session::signals::{refresh_channels, RefreshSignaller, SIGNAL_QUEUE_CAPACITY};
use crate::traits::audio_backend::AudioBackend;
use crate::traits::foreground::ForegroundProcess;

/// The volume engine: cached endpoint model, refresh coordinator thread and
/// mapping dispatcher behind one explicit lifecycle.
///
/// ```text
/// [OS notifications] ─┐
/// [periodic tick]    ─┼→ [signal queues] → [RefreshCoordinator] ─┐
/// [control messages] ─┘         ↑                                ↓ (lock)
///                               └──── [MappingDispatcher] ←→ [EndpointModel]
///                                             ↑
///                                      [MIDI (cc, value)]
/// ```
pub struct Mixer {
    backend: Arc<dyn AudioBackend>,
    model: Arc<Mutex<EndpointModel>>,
    signaller: RefreshSignaller,
    dispatcher: MappingDispatcher,
    shutdown: Option<Sender<()>>,
    coordinator: Option<thread::JoinHandle<RefreshStats>>,
}

impl Mixer {
    /// Build the model, subscribe to OS notifications and start the
    /// refresh coordinator.
    ///
    /// The first hardware and session enumeration runs before this returns,
    /// so mappings work immediately.
    pub fn start(
        backend: Arc<dyn AudioBackend>,
        foreground: Arc<dyn ForegroundProcess>,
        timings: RefreshTimings,
    ) -> Result<Self, MixerError> {
        timings.validate().map_err(MixerError::InvalidConfig)?;

        let model = Arc::new(Mutex::new(EndpointModel::new()));
        {
            let mut model = model.lock();
            model.refresh_hardware(backend.as_ref());
            match model.refresh_sessions() {
                Ok(count) => log::debug!("{} audio sessions at startup", count),
                Err(e) if e.is_not_found() => log::warn!("{}", e),
                Err(e) => log::error!("failed to enumerate audio sessions: {}", e),
            }
        }

        let (signaller, receivers) = refresh_channels(SIGNAL_QUEUE_CAPACITY);
        backend.subscribe(signaller.clone())?;

        let (shutdown_tx, shutdown_rx) = bounded(1);
        let coordinator =
            RefreshCoordinator::new(Arc::clone(&backend), Arc::clone(&model), timings);
        let handle = thread::Builder::new()
            .name("refresh-coordinator".into())
            .spawn(move || coordinator.run(receivers, shutdown_rx))
            .map_err(|e| {
                backend.unsubscribe();
                MixerError::Io(format!("failed to spawn refresh coordinator: {}", e))
            })?;

        let dispatcher = MappingDispatcher::new(Arc::clone(&model), signaller.clone(), foreground);

        log::info!("volume engine started");
        Ok(Self {
            backend,
            model,
            signaller,
            dispatcher,
            shutdown: Some(shutdown_tx),
            coordinator: Some(handle),
        })
    }

    /// Apply one volume mapping to a MIDI control change.
    ///
    /// Never fails: every outcome is logged and stale state is resynced in
    /// the background. Returns the number of volumes set.
    pub fn handle_midi_message(&self, mapping: &VolumeMapping, cc: u8, value: u8) -> usize {
        self.dispatcher.handle(mapping, cc, value)
    }

    /// React to a command from the shell or the user.
    ///
    /// `RefreshConfig` belongs to the owner of the configuration and is
    /// ignored here.
    pub fn handle_control_message(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::RefreshDevices => {
                log::info!("refreshing audio devices");
                self.signaller.request_hardware_refresh();
            }
            ControlMessage::RefreshSessions => {
                log::info!("refreshing audio sessions");
                self.signaller
                    .request_session_refresh(SessionUrgency::Immediate);
            }
            ControlMessage::RefreshConfig => {
                log::debug!("configuration reload requested from the volume engine, ignoring");
            }
            ControlMessage::Quit => self.cleanup(),
        }
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        self.model.lock().snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.coordinator.is_some()
    }

    /// Stop the coordinator, drop OS subscriptions and release every cached
    /// native handle. Safe to call more than once.
    pub fn cleanup(&mut self) {
        let Some(handle) = self.coordinator.take() else {
            return;
        };

        log::debug!("stopping volume engine");
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.try_send(());
        }
        match handle.join() {
            Ok(stats) => log::debug!(
                "refresh coordinator ran {} hardware and {} session refreshes",
                stats.hardware_refreshes,
                stats.session_refreshes
            ),
            Err(_) => log::error!("refresh coordinator thread panicked"),
        }

        self.backend.unsubscribe();
        self.model.lock().clear();
        log::info!("volume engine stopped");
    }
}

impl Drop for Mixer {
    fn drop(&mut self) {
        self.cleanup();
    }
}
