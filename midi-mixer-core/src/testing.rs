//! In-memory audio backend for unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::MixerError;
use crate::models::state::SessionActivity;
use crate::models::targets::EndpointRole;
use crate::session::signals::RefreshSignaller;
use crate::traits::audio_backend::{AudioBackend, EndpointHandle, SessionHandle, SessionIdentity};
use crate::traits::foreground::ForegroundProcess;

#[derive(Debug, Clone)]
pub struct MockSessionSpec {
    pub identity: SessionIdentity,
    pub state: SessionActivity,
    pub fail_with: Option<MixerError>,
    pub fail_state: Option<MixerError>,
}

impl MockSessionSpec {
    pub fn process(name: &str) -> Self {
        Self {
            identity: SessionIdentity::Process(name.to_string()),
            state: SessionActivity::Active,
            fail_with: None,
            fail_state: None,
        }
    }

    pub fn system() -> Self {
        Self {
            identity: SessionIdentity::System,
            state: SessionActivity::Active,
            fail_with: None,
            fail_state: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockEndpointSpec {
    pub id: String,
    pub name: String,
    pub role: EndpointRole,
    pub sessions: Vec<MockSessionSpec>,
}

/// Observable state shared by the mock backend and every handle it hands out.
#[derive(Debug, Default)]
pub struct MockWorld {
    pub endpoints: Vec<MockEndpointSpec>,
    pub defaults: HashMap<EndpointRole, String>,
    /// Volume per endpoint id, or per `"{endpoint}#{session index}"`.
    pub volumes: HashMap<String, f32>,
    pub fail_default: Option<MixerError>,
    pub fail_active: Option<MixerError>,
    pub fail_sessions: Option<MixerError>,
    pub set_volume_calls: usize,
    pub default_lookups: usize,
    pub session_enumerations: usize,
    pub live_handles: usize,
    pub released_handles: usize,
    pub subscribed: Option<RefreshSignaller>,
}

impl MockWorld {
    pub fn endpoint_volume(&self, id: &str) -> Option<f32> {
        self.volumes.get(id).copied()
    }

    pub fn session_volume(&self, endpoint_id: &str, index: usize) -> Option<f32> {
        self.volumes.get(&session_key(endpoint_id, index)).copied()
    }

    pub fn session_mut(&mut self, endpoint_id: &str, index: usize) -> &mut MockSessionSpec {
        let endpoint = self
            .endpoints
            .iter_mut()
            .find(|e| e.id == endpoint_id)
            .expect("unknown mock endpoint");
        &mut endpoint.sessions[index]
    }
}

fn session_key(endpoint_id: &str, index: usize) -> String {
    format!("{}#{}", endpoint_id, index)
}

#[derive(Clone, Default)]
pub struct MockBackend {
    pub world: Arc<Mutex<MockWorld>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint and make it the default for its role.
    pub fn with_default(
        self,
        id: &str,
        name: &str,
        role: EndpointRole,
        sessions: Vec<MockSessionSpec>,
    ) -> Self {
        self.add_endpoint(id, name, role, sessions);
        self.world.lock().defaults.insert(role, id.to_string());
        self
    }

    pub fn add_endpoint(
        &self,
        id: &str,
        name: &str,
        role: EndpointRole,
        sessions: Vec<MockSessionSpec>,
    ) {
        self.world.lock().endpoints.push(MockEndpointSpec {
            id: id.to_string(),
            name: name.to_string(),
            role,
            sessions,
        });
    }

    fn handle_for(&self, spec: &MockEndpointSpec) -> Box<dyn EndpointHandle> {
        self.world.lock().live_handles += 1;
        Box::new(MockEndpoint {
            id: spec.id.clone(),
            name: spec.name.clone(),
            world: Arc::clone(&self.world),
        })
    }
}

impl AudioBackend for MockBackend {
    fn default_endpoint(&self, role: EndpointRole) -> Result<Box<dyn EndpointHandle>, MixerError> {
        let spec = {
            let mut world = self.world.lock();
            world.default_lookups += 1;
            if let Some(err) = world.fail_default.clone() {
                return Err(err);
            }
            let id = world
                .defaults
                .get(&role)
                .cloned()
                .ok_or(MixerError::EndpointNotFound(role))?;
            world
                .endpoints
                .iter()
                .find(|e| e.id == id)
                .cloned()
                .ok_or(MixerError::EndpointNotFound(role))?
        };
        Ok(self.handle_for(&spec))
    }

    fn active_endpoints(
        &self,
        role: EndpointRole,
    ) -> Result<Vec<Box<dyn EndpointHandle>>, MixerError> {
        let specs: Vec<MockEndpointSpec> = {
            let world = self.world.lock();
            if let Some(err) = world.fail_active.clone() {
                return Err(err);
            }
            world.endpoints.iter().filter(|e| e.role == role).cloned().collect()
        };
        Ok(specs.iter().map(|s| self.handle_for(s)).collect())
    }

    fn subscribe(&self, signaller: RefreshSignaller) -> Result<(), MixerError> {
        self.world.lock().subscribed = Some(signaller);
        Ok(())
    }

    fn unsubscribe(&self) {
        self.world.lock().subscribed = None;
    }
}

pub struct MockEndpoint {
    id: String,
    name: String,
    world: Arc<Mutex<MockWorld>>,
}

impl EndpointHandle for MockEndpoint {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_volume(&self, level: f32) -> Result<(), MixerError> {
        let mut world = self.world.lock();
        world.set_volume_calls += 1;
        world.volumes.insert(self.id.clone(), level);
        Ok(())
    }

    fn volume(&self) -> Result<f32, MixerError> {
        Ok(self.world.lock().endpoint_volume(&self.id).unwrap_or(1.0))
    }

    fn sessions(&self) -> Result<Vec<Box<dyn SessionHandle>>, MixerError> {
        let mut world = self.world.lock();
        world.session_enumerations += 1;
        if let Some(err) = world.fail_sessions.clone() {
            return Err(err);
        }
        let count = world
            .endpoints
            .iter()
            .find(|e| e.id == self.id)
            .map(|e| e.sessions.len())
            .unwrap_or(0);
        world.live_handles += count;
        Ok((0..count)
            .map(|index| {
                Box::new(MockSession {
                    endpoint_id: self.id.clone(),
                    index,
                    world: Arc::clone(&self.world),
                }) as Box<dyn SessionHandle>
            })
            .collect())
    }
}

impl Drop for MockEndpoint {
    fn drop(&mut self) {
        let mut world = self.world.lock();
        world.live_handles -= 1;
        world.released_handles += 1;
    }
}

pub struct MockSession {
    endpoint_id: String,
    index: usize,
    world: Arc<Mutex<MockWorld>>,
}

impl MockSession {
    fn spec(&self, world: &MockWorld) -> Option<MockSessionSpec> {
        world
            .endpoints
            .iter()
            .find(|e| e.id == self.endpoint_id)
            .and_then(|e| e.sessions.get(self.index))
            .cloned()
    }
}

impl SessionHandle for MockSession {
    fn identity(&self) -> SessionIdentity {
        let world = self.world.lock();
        self.spec(&world)
            .map(|s| s.identity)
            .unwrap_or(SessionIdentity::System)
    }

    fn set_volume(&self, level: f32) -> Result<(), MixerError> {
        let mut world = self.world.lock();
        world.set_volume_calls += 1;
        if let Some(err) = self.spec(&world).and_then(|s| s.fail_with) {
            return Err(err);
        }
        world
            .volumes
            .insert(session_key(&self.endpoint_id, self.index), level);
        Ok(())
    }

    fn volume(&self) -> Result<f32, MixerError> {
        let world = self.world.lock();
        Ok(world
            .session_volume(&self.endpoint_id, self.index)
            .unwrap_or(1.0))
    }

    fn state(&self) -> Result<SessionActivity, MixerError> {
        let world = self.world.lock();
        match self.spec(&world) {
            Some(spec) => match spec.fail_state {
                Some(err) => Err(err),
                None => Ok(spec.state),
            },
            None => Ok(SessionActivity::Expired),
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        let mut world = self.world.lock();
        world.live_handles -= 1;
        world.released_handles += 1;
    }
}

/// Foreground tracker that always reports the same process.
pub struct FixedForeground(pub Mutex<String>);

impl FixedForeground {
    pub fn new(name: &str) -> Self {
        Self(Mutex::new(name.to_string()))
    }
}

impl ForegroundProcess for FixedForeground {
    fn process_name(&self) -> String {
        self.0.lock().clone()
    }
}
