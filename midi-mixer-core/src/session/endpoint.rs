use serde::Serialize;

use crate::models::error::{validate_level, MixerError};
use crate::models::state::SessionActivity;
use crate::models::targets::EndpointRole;
use crate::session::registry::SessionRegistry;
use crate::traits::audio_backend::{AudioBackend, EndpointHandle};

/// One hardware endpoint in one role, plus its session registry.
///
/// Only output endpoints ever populate their registry. Sessions are released
/// before the endpoint handle.
pub struct Endpoint {
    role: EndpointRole,
    sessions: SessionRegistry,
    handle: Box<dyn EndpointHandle>,
}

impl Endpoint {
    pub fn new(role: EndpointRole, handle: Box<dyn EndpointHandle>) -> Self {
        Self {
            role,
            sessions: SessionRegistry::new(),
            handle,
        }
    }

    pub fn role(&self) -> EndpointRole {
        self.role
    }

    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionRegistry {
        &mut self.sessions
    }

    pub fn volume(&self) -> Result<f32, MixerError> {
        self.handle.volume()
    }

    /// Set the endpoint master volume. Out-of-range levels are rejected
    /// without touching the native layer.
    pub fn set_volume(&self, level: f32) -> Result<(), MixerError> {
        validate_level(level)?;
        self.handle.set_volume(level)
    }

    pub fn refresh_sessions(&mut self) -> Result<usize, MixerError> {
        self.sessions.refresh(self.handle.as_ref())
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("role", &self.role)
            .field("name", &self.name())
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

/// Cached view of the OS audio state.
///
/// Holds at most one default endpoint per role and the list of every active
/// endpoint for device-name targeting. Mutated only by the refresh
/// coordinator, always under the engine lock.
#[derive(Debug, Default)]
pub struct EndpointModel {
    output: Option<Endpoint>,
    input: Option<Endpoint>,
    devices: Vec<Endpoint>,
}

impl EndpointModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(&self, role: EndpointRole) -> Option<&Endpoint> {
        match role {
            EndpointRole::Output => self.output.as_ref(),
            EndpointRole::Input => self.input.as_ref(),
        }
    }

    pub fn endpoint_mut(&mut self, role: EndpointRole) -> Option<&mut Endpoint> {
        match role {
            EndpointRole::Output => self.output.as_mut(),
            EndpointRole::Input => self.input.as_mut(),
        }
    }

    fn slot(&mut self, role: EndpointRole) -> &mut Option<Endpoint> {
        match role {
            EndpointRole::Output => &mut self.output,
            EndpointRole::Input => &mut self.input,
        }
    }

    pub fn devices(&self) -> &[Endpoint] {
        &self.devices
    }

    /// Replace the cached default endpoint for `role`.
    ///
    /// A missing default device leaves the slot empty; any other failure
    /// keeps the previous endpoint.
    pub fn refresh_endpoint(
        &mut self,
        backend: &dyn AudioBackend,
        role: EndpointRole,
    ) -> Result<(), MixerError> {
        match backend.default_endpoint(role) {
            Ok(handle) => {
                let slot = self.slot(role);
                if let Some(previous) = slot.take() {
                    log::trace!("releasing {} endpoint {}", role, previous.name());
                    drop(previous);
                }
                let endpoint = Endpoint::new(role, handle);
                log::info!("using default {} device named: {}", role, endpoint.name());
                *slot = Some(endpoint);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                *self.slot(role) = None;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the list of active endpoints used for device-name targeting.
    pub fn refresh_devices(&mut self, backend: &dyn AudioBackend) -> Result<usize, MixerError> {
        let mut devices = Vec::new();
        for role in EndpointRole::ALL {
            for handle in backend.active_endpoints(role)? {
                log::debug!("found {} device named '{}'", role, handle.name());
                devices.push(Endpoint::new(role, handle));
            }
        }
        self.devices = devices;
        Ok(self.devices.len())
    }

    /// Refresh both default endpoints and the device list.
    ///
    /// Each part is refreshed independently; failures are logged and leave
    /// that part of the model as it was.
    pub fn refresh_hardware(&mut self, backend: &dyn AudioBackend) {
        for role in EndpointRole::ALL {
            match self.refresh_endpoint(backend, role) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => log::warn!("no default {} device detected", role),
                Err(e) => log::error!("failed to refresh {} endpoint: {}", role, e),
            }
        }
        if let Err(e) = self.refresh_devices(backend) {
            log::error!("failed to enumerate audio devices: {}", e);
        }
    }

    /// Rebuild the session registry of the default output endpoint.
    pub fn refresh_sessions(&mut self) -> Result<usize, MixerError> {
        match self.output.as_mut() {
            Some(endpoint) => endpoint.refresh_sessions(),
            None => Err(MixerError::EndpointNotFound(EndpointRole::Output)),
        }
    }

    /// Endpoints whose friendly name equals `name`, ignoring case.
    pub fn devices_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Endpoint> + 'a {
        self.devices
            .iter()
            .filter(move |d| d.name().to_lowercase() == name.to_lowercase())
    }

    /// Release every cached native handle.
    pub fn clear(&mut self) {
        if let Some(output) = self.output.as_mut() {
            output.sessions_mut().clear();
        }
        self.output = None;
        self.input = None;
        self.devices.clear();
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            output: self.output.as_ref().map(EndpointSnapshot::from),
            input: self.input.as_ref().map(EndpointSnapshot::from),
            devices: self.devices.iter().map(EndpointSnapshot::from).collect(),
        }
    }
}

/// Serializable view of the cached model, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSnapshot {
    pub output: Option<EndpointSnapshot>,
    pub input: Option<EndpointSnapshot>,
    pub devices: Vec<EndpointSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSnapshot {
    pub id: String,
    pub name: String,
    pub role: EndpointRole,
    pub volume: Option<f32>,
    pub sessions: Vec<SessionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub name: String,
    pub volume: Option<f32>,
    pub activity: SessionActivity,
}

impl From<&Endpoint> for EndpointSnapshot {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            id: endpoint.id().to_string(),
            name: endpoint.name().to_string(),
            role: endpoint.role(),
            volume: endpoint.volume().ok(),
            sessions: endpoint
                .sessions()
                .iter()
                .map(|s| SessionSnapshot {
                    name: s.name().to_string(),
                    volume: s.volume().ok(),
                    activity: s.activity(),
                })
                .collect(),
        }
    }
}
