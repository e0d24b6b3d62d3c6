use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{never, select, Receiver};

use crate::models::config::MixerConfig;
use crate::models::error::MixerError;
use crate::models::state::ControlMessage;
use crate::processing::debounce::Debouncer;
use crate::processing::midi::ControlChange;
use crate::processing::shell::spawn_shell_mapping;
use crate::session::engine::Mixer;
use crate::storage::config_store::ConfigStore;

/// Quiet period before a configuration reload runs.
pub const CONFIG_RELOAD_QUIET: Duration = Duration::from_secs(1);

const CONFIG_RELOAD_MAX_WAIT: Duration = Duration::from_secs(5);

const IDLE_WAIT: Duration = Duration::from_secs(1);

/// Whether the event loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What changed in an adopted configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigChange {
    pub device_changed: bool,
}

/// Front of the application: owns the configuration and the volume engine
/// and fans each MIDI event out to every mapping.
pub struct Controller {
    config: ConfigStore,
    mixer: Mixer,
    reload: Debouncer,
}

impl Controller {
    pub fn new(config: ConfigStore, mixer: Mixer) -> Self {
        Self {
            config,
            mixer,
            reload: Debouncer::new(CONFIG_RELOAD_QUIET, CONFIG_RELOAD_MAX_WAIT),
        }
    }

    pub fn config(&self) -> Arc<MixerConfig> {
        self.config.current()
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    /// Route one control change to every volume and shell mapping.
    ///
    /// Returns the number of volumes set.
    pub fn handle_cc(&self, event: ControlChange) -> usize {
        let config = self.config.current();
        if config.echo_midi_events {
            log::info!("CC: {}, Value: {}", event.cc, event.value);
        }

        let mut applied = 0;
        for mapping in &config.mapping.mixer {
            applied += self.mixer.handle_midi_message(mapping, event.cc, event.value);
        }
        for mapping in &config.mapping.shell {
            spawn_shell_mapping(mapping, event.cc, event.value);
        }
        applied
    }

    /// Handle a command. Configuration reloads are debounced and run from
    /// `poll`.
    pub fn handle_control(&mut self, message: ControlMessage, now: Instant) -> Flow {
        match message {
            ControlMessage::RefreshConfig => {
                log::debug!("configuration reload requested");
                self.reload.trigger(now);
                Flow::Continue
            }
            ControlMessage::Quit => {
                log::info!("quitting");
                self.mixer.handle_control_message(ControlMessage::Quit);
                Flow::Quit
            }
            other => {
                self.mixer.handle_control_message(other);
                Flow::Continue
            }
        }
    }

    /// Run a due configuration reload. Returns the change when a new
    /// configuration was adopted.
    pub fn poll(&mut self, now: Instant) -> Option<ConfigChange> {
        if !self.reload.fire(now) {
            return None;
        }
        match self.reload_config() {
            Ok(change) => Some(change),
            Err(e) => {
                log::error!("unable to load new config, keeping the previous one: {}", e);
                None
            }
        }
    }

    pub fn reload_config(&self) -> Result<ConfigChange, MixerError> {
        let previous = self.config.reload()?;
        let current = self.config.current();
        let device_changed = !previous
            .midi_device_name
            .eq_ignore_ascii_case(&current.midi_device_name);
        if device_changed {
            log::debug!(
                "MIDI device changed from '{}' to '{}'",
                previous.midi_device_name,
                current.midi_device_name
            );
        }
        Ok(ConfigChange { device_changed })
    }

    /// Process MIDI events and commands until `Quit` arrives or the control
    /// channel closes.
    ///
    /// When a reload names a different MIDI device, `reconnect` is called
    /// with the new name and may return a fresh event stream. A closed
    /// stream just stops delivering events.
    pub fn run<F>(
        mut self,
        midi: Receiver<ControlChange>,
        control: Receiver<ControlMessage>,
        mut reconnect: F,
    ) where
        F: FnMut(&str) -> Option<Receiver<ControlChange>>,
    {
        log::trace!("enter controller loop");
        let mut midi = midi;

        loop {
            let wait = self
                .reload
                .deadline()
                .map(|d| d.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_WAIT);

            let mut midi_closed = false;
            select! {
                recv(midi) -> msg => match msg {
                    Ok(event) => {
                        self.handle_cc(event);
                    }
                    Err(_) => midi_closed = true,
                },
                recv(control) -> msg => {
                    let message = msg.unwrap_or(ControlMessage::Quit);
                    if self.handle_control(message, Instant::now()) == Flow::Quit {
                        break;
                    }
                },
                default(wait) => {}
            }

            if midi_closed {
                log::warn!("MIDI input closed");
                midi = never();
            }
            if let Some(change) = self.poll(Instant::now()) {
                if change.device_changed {
                    let name = self.config.current().midi_device_name.clone();
                    if let Some(stream) = reconnect(&name) {
                        midi = stream;
                    }
                }
            }
        }

        log::trace!("exit controller loop");
    }
}
