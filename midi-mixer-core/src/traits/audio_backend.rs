use crate::models::error::MixerError;
use crate::models::state::SessionActivity;
use crate::models::targets::EndpointRole;
use crate::session::signals::RefreshSignaller;

/// Who owns an audio session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdentity {
    /// Session owned by a single process, identified by its executable name.
    Process(String),
    /// The multiplexed system sounds session, or a session whose owning
    /// process could not be resolved.
    System,
}

/// A volume-controllable audio session handle.
///
/// Dropping the handle releases the native resources behind it.
/// Implemented by:
/// - `WasapiSession` (Windows)
pub trait SessionHandle: Send {
    fn identity(&self) -> SessionIdentity;

    /// Set the session master volume. `level` has already been validated.
    ///
    /// Returns `MixerError::Invalidated` when the OS reports the session or
    /// its device as gone.
    fn set_volume(&self, level: f32) -> Result<(), MixerError>;

    fn volume(&self) -> Result<f32, MixerError>;

    fn state(&self) -> Result<SessionActivity, MixerError>;
}

/// A hardware audio endpoint handle.
///
/// Dropping the handle releases the native resources behind it, including any
/// session notification registered by `sessions`.
/// Implemented by:
/// - `WasapiEndpoint` (Windows)
pub trait EndpointHandle: Send {
    /// Stable device identifier.
    fn id(&self) -> &str;

    /// Friendly name shown to users.
    fn name(&self) -> &str;

    /// Set the endpoint master volume scalar. `level` has already been validated.
    fn set_volume(&self, level: f32) -> Result<(), MixerError>;

    fn volume(&self) -> Result<f32, MixerError>;

    /// Enumerate the audio sessions currently routed through this endpoint.
    fn sessions(&self) -> Result<Vec<Box<dyn SessionHandle>>, MixerError>;
}

/// Entry point into a platform audio subsystem.
///
/// Implemented by:
/// - `WasapiBackend` (Windows)
pub trait AudioBackend: Send + Sync {
    /// The current default endpoint for `role`.
    ///
    /// Returns `MixerError::EndpointNotFound` when the role has no default device.
    fn default_endpoint(&self, role: EndpointRole) -> Result<Box<dyn EndpointHandle>, MixerError>;

    /// Every active endpoint for `role`.
    fn active_endpoints(
        &self,
        role: EndpointRole,
    ) -> Result<Vec<Box<dyn EndpointHandle>>, MixerError>;

    /// Route device and session change notifications into `signaller`.
    ///
    /// Callbacks fire on OS-owned threads; implementations must only enqueue.
    fn subscribe(&self, signaller: RefreshSignaller) -> Result<(), MixerError>;

    /// Stop delivering notifications.
    fn unsubscribe(&self);
}
