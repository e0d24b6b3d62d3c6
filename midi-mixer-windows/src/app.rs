//! Wires the WASAPI backend, MIDI input and configuration into a running
//! controller.

use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::{bounded, never, Receiver};
use serde::Serialize;

use midi_mixer_core::models::config::RefreshTimings;
use midi_mixer_core::models::error::MixerError;
use midi_mixer_core::processing::midi::ControlChange;
use midi_mixer_core::session::controller::Controller;
use midi_mixer_core::session::endpoint::{EndpointModel, ModelSnapshot};
use midi_mixer_core::session::engine::Mixer;
use midi_mixer_core::storage::config_store::ConfigStore;
use midi_mixer_core::storage::config_watcher::ConfigWatcher;

use crate::backend::WasapiBackend;
use crate::com::ComGuard;
use crate::console::install_quit_handler;
use crate::foreground::WindowsForeground;
use crate::midi_input::{input_port_names, MidiInputPort};

/// Capacity of the control message queue.
pub const CONTROL_QUEUE_CAPACITY: usize = 8;

fn open_midi(device_name: &str) -> Option<(MidiInputPort, Receiver<ControlChange>)> {
    match MidiInputPort::open(device_name) {
        Ok(opened) => Some(opened),
        Err(e) => {
            log::error!("{}", e);
            None
        }
    }
}

/// Run until Ctrl+C or the console closes.
pub fn run(config_path: &Path) -> Result<(), MixerError> {
    let _com = ComGuard::init_multithreaded()?;

    let config = ConfigStore::open(config_path)?;
    let backend = Arc::new(WasapiBackend::new()?);
    let mixer = Mixer::start(backend, Arc::new(WindowsForeground), RefreshTimings::default())?;

    let (control_tx, control_rx) = bounded(CONTROL_QUEUE_CAPACITY);
    install_quit_handler(control_tx.clone())?;
    let _watcher = match ConfigWatcher::start(config.path(), control_tx) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            log::warn!("configuration changes will not be picked up: {}", e);
            None
        }
    };

    let mut port = None;
    let midi_rx = match open_midi(&config.current().midi_device_name) {
        Some((opened, rx)) => {
            port = Some(opened);
            rx
        }
        None => never(),
    };

    let controller = Controller::new(config, mixer);
    controller.run(midi_rx, control_rx, move |device_name| {
        // close the old port before opening the new one
        port = None;
        open_midi(device_name).map(|(opened, rx)| {
            port = Some(opened);
            rx
        })
    });
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct DeviceReport {
    pub audio: ModelSnapshot,
    pub midi_inputs: Vec<String>,
}

/// Enumerate audio endpoints, sessions and MIDI inputs once.
pub fn list_devices() -> Result<DeviceReport, MixerError> {
    let _com = ComGuard::init_multithreaded()?;
    let backend = WasapiBackend::new()?;

    let mut model = EndpointModel::new();
    model.refresh_hardware(&backend);
    if let Err(e) = model.refresh_sessions() {
        log::warn!("{}", e);
    }
    let audio = model.snapshot();
    model.clear();

    let midi_inputs = input_port_names().unwrap_or_else(|e| {
        log::warn!("{}", e);
        Vec::new()
    });
    Ok(DeviceReport { audio, midi_inputs })
}
