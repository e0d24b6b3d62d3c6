//! MIDI input via midir.

use crossbeam_channel::{bounded, Receiver, TrySendError};
use midir::{MidiInput, MidiInputConnection};

use midi_mixer_core::models::error::MixerError;
use midi_mixer_core::processing::midi::{parse_control_change, ControlChange};

/// Capacity of the control change queue between the MIDI callback and the
/// controller loop.
pub const MIDI_QUEUE_CAPACITY: usize = 64;

const CLIENT_NAME: &str = "midi-mixer";

/// An open MIDI input port. Events stop and the stream closes on drop.
pub struct MidiInputPort {
    name: String,
    _connection: MidiInputConnection<()>,
}

impl MidiInputPort {
    /// Open the first input port whose name contains `device_name`.
    pub fn open(device_name: &str) -> Result<(Self, Receiver<ControlChange>), MixerError> {
        if device_name.is_empty() {
            return Err(MixerError::Midi("missing MIDI device name".into()));
        }
        log::debug!("looking for MIDI input {}", device_name);

        let input = MidiInput::new(CLIENT_NAME)
            .map_err(|e| MixerError::Midi(format!("unable to open MIDI driver: {}", e)))?;

        let mut found = None;
        for port in input.ports() {
            let name = match input.port_name(&port) {
                Ok(name) => name,
                Err(_) => continue,
            };
            log::debug!("found MIDI device {}", name);
            if port_matches(&name, device_name) {
                found = Some((port, name));
                break;
            }
        }
        let (port, name) = found.ok_or_else(|| {
            MixerError::Midi(format!("unable to find MIDI input device: {}", device_name))
        })?;

        let (tx, rx) = bounded(MIDI_QUEUE_CAPACITY);
        let connection = input
            .connect(
                &port,
                "midi-mixer-input",
                move |_stamp, message, _| {
                    let Some(event) = parse_control_change(message) else {
                        return;
                    };
                    match tx.try_send(event) {
                        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                        Err(TrySendError::Full(_)) => {
                            log::debug!("MIDI queue full, dropping event")
                        }
                    }
                },
                (),
            )
            .map_err(|e| MixerError::Midi(format!("unable to open {}: {}", name, e)))?;

        log::info!("using MIDI device {}", name);
        Ok((
            Self {
                name,
                _connection: connection,
            },
            rx,
        ))
    }
}

impl Drop for MidiInputPort {
    fn drop(&mut self) {
        log::debug!("closing MIDI device {}", self.name);
    }
}

/// Port names match on a case-sensitive substring, so `nanoKONTROL2`
/// selects `nanoKONTROL2 1 SLIDER/KNOB`.
fn port_matches(port_name: &str, wanted: &str) -> bool {
    port_name.contains(wanted)
}

/// Names of every MIDI input port.
pub fn input_port_names() -> Result<Vec<String>, MixerError> {
    let input = MidiInput::new(CLIENT_NAME)
        .map_err(|e| MixerError::Midi(format!("unable to open MIDI driver: {}", e)))?;
    Ok(input
        .ports()
        .iter()
        .filter_map(|p| input.port_name(p).ok())
        .collect())
}
