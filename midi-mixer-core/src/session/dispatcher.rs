use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::VolumeMapping;
use crate::models::error::MixerError;
use crate::models::state::SessionUrgency;
use crate::models::targets::{EndpointRole, SpecialTarget};
use crate::session::endpoint::EndpointModel;
use crate::session::registry::SYSTEM_SESSION_NAME;
use crate::session::signals::RefreshSignaller;
use crate::traits::foreground::ForegroundProcess;

/// What a single volume-set was aimed at, for log lines.
enum Target<'a> {
    Endpoint(EndpointRole),
    Session(&'a str),
    Process(&'a str),
    Device(&'a str),
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Endpoint(role) => write!(f, "default {} device", role),
            Self::Session(name) => write!(f, "session {}", name),
            Self::Process(name) => write!(f, "process {}", name),
            Self::Device(name) => write!(f, "device '{}'", name),
        }
    }
}

/// Resync requests collected while applying one mapping.
#[derive(Default)]
struct Resync {
    hardware: bool,
    sessions: bool,
}

/// Routes one control change to the volume targets of a mapping.
///
/// Every target is applied independently: a missing endpoint, an absent
/// process or a native failure is logged and the remaining targets still run.
/// Stale handles are never surfaced; they turn into one resync request per
/// call.
pub struct MappingDispatcher {
    model: Arc<Mutex<EndpointModel>>,
    signaller: RefreshSignaller,
    foreground: Arc<dyn ForegroundProcess>,
}

impl MappingDispatcher {
    pub fn new(
        model: Arc<Mutex<EndpointModel>>,
        signaller: RefreshSignaller,
        foreground: Arc<dyn ForegroundProcess>,
    ) -> Self {
        Self {
            model,
            signaller,
            foreground,
        }
    }

    /// Apply `mapping` to the event `(cc, value)`.
    ///
    /// Returns how many volume targets were set. Does nothing unless the
    /// mapping listens on `cc`.
    pub fn handle(&self, mapping: &VolumeMapping, cc: u8, value: u8) -> usize {
        if mapping.cc != cc {
            return 0;
        }

        let level = mapping.scale().level(value);
        log::trace!("cc {} value {} -> volume {:.3}", cc, value, level);

        // resolved before taking the model lock
        let foreground = if mapping.special.contains(&SpecialTarget::Active) {
            Some(self.foreground.process_name())
        } else {
            None
        };

        let mut applied = 0;
        let mut resync = Resync::default();
        {
            let mut model = self.model.lock();

            for special in &mapping.special {
                let (target, result) = match special {
                    SpecialTarget::Output => (
                        Target::Endpoint(EndpointRole::Output),
                        set_endpoint(&model, EndpointRole::Output, level),
                    ),
                    SpecialTarget::Input => (
                        Target::Endpoint(EndpointRole::Input),
                        set_endpoint(&model, EndpointRole::Input, level),
                    ),
                    SpecialTarget::System => (
                        Target::Session(SYSTEM_SESSION_NAME),
                        set_session(&mut model, SYSTEM_SESSION_NAME, level),
                    ),
                    SpecialTarget::Active => match foreground.as_deref() {
                        Some(name) if !name.is_empty() => {
                            (Target::Process(name), set_session(&mut model, name, level))
                        }
                        _ => {
                            log::debug!("no foreground process to apply volume to");
                            continue;
                        }
                    },
                    SpecialTarget::RefreshDevices => {
                        self.signaller.request_hardware_refresh();
                        continue;
                    }
                    SpecialTarget::RefreshSessions => {
                        self.signaller
                            .request_session_refresh(SessionUrgency::Immediate);
                        continue;
                    }
                };
                applied += record(&target, result, level, &mut resync);
            }

            for filename in &mapping.filename {
                let target = Target::Process(filename);
                match set_session(&mut model, filename, level) {
                    // the process is simply not running
                    Err(e) if e.is_not_found() => {}
                    result => applied += record(&target, result, level, &mut resync),
                }
            }

            for device in &mapping.device {
                let target = Target::Device(device);
                let result = set_devices(&model, device, level);
                applied += record(&target, result, level, &mut resync);
            }
        }

        if resync.hardware {
            self.signaller.request_hardware_refresh();
        }
        if resync.sessions {
            self.signaller.request_session_refresh(SessionUrgency::Lazy);
        }
        applied
    }
}

fn set_endpoint(
    model: &EndpointModel,
    role: EndpointRole,
    level: f32,
) -> Result<usize, MixerError> {
    let endpoint = model
        .endpoint(role)
        .ok_or(MixerError::EndpointNotFound(role))?;
    endpoint.set_volume(level)?;
    Ok(1)
}

fn set_session(model: &mut EndpointModel, name: &str, level: f32) -> Result<usize, MixerError> {
    model
        .endpoint_mut(EndpointRole::Output)
        .ok_or(MixerError::EndpointNotFound(EndpointRole::Output))?
        .sessions_mut()
        .set_volume(name, level)
}

/// Set every enumerated endpoint whose friendly name matches `name`.
fn set_devices(model: &EndpointModel, name: &str, level: f32) -> Result<usize, MixerError> {
    let mut matched = 0;
    let mut first_error = None;
    for endpoint in model.devices_named(name) {
        match endpoint.set_volume(level) {
            Ok(()) => matched += 1,
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None if matched == 0 => {
            log::debug!("no audio device named '{}'", name);
            Ok(0)
        }
        None => Ok(matched),
    }
}

/// Log the outcome of one target and return how many volumes it set.
fn record(
    target: &Target<'_>,
    result: Result<usize, MixerError>,
    level: f32,
    resync: &mut Resync,
) -> usize {
    match result {
        Ok(count) => {
            log::trace!("set {} volume to {:.3}", target, level);
            count
        }
        Err(e) if e.is_not_found() => {
            log::debug!("skipping {}: {}", target, e);
            0
        }
        Err(e) if e.is_transient() => {
            log::debug!("stale handle for {}: {}", target, e);
            match target {
                Target::Endpoint(_) | Target::Device(_) => resync.hardware = true,
                Target::Session(_) | Target::Process(_) => resync.sessions = true,
            }
            0
        }
        Err(e) => {
            log::error!("failed to set {} volume: {}", target, e);
            0
        }
    }
}
