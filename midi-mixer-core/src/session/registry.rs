use std::collections::HashMap;

use crate::models::error::{validate_level, MixerError};
use crate::models::state::SessionActivity;
use crate::traits::audio_backend::{EndpointHandle, SessionHandle, SessionIdentity};

/// Registry key of the system sounds session.
pub const SYSTEM_SESSION_NAME: &str = "[system process]";

/// One audio session cached by the registry.
pub struct AudioSession {
    /// Lowercase executable name, or `SYSTEM_SESSION_NAME`.
    name: String,
    handle: Box<dyn SessionHandle>,
    activity: SessionActivity,
}

impl AudioSession {
    pub fn new(handle: Box<dyn SessionHandle>) -> Self {
        let name = match handle.identity() {
            SessionIdentity::Process(exe) => exe.to_lowercase(),
            SessionIdentity::System => SYSTEM_SESSION_NAME.to_string(),
        };
        Self {
            name,
            handle,
            activity: SessionActivity::Active,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn activity(&self) -> SessionActivity {
        self.activity
    }

    pub fn volume(&self) -> Result<f32, MixerError> {
        self.handle.volume()
    }

    /// Set the volume, then check whether the session is still alive.
    ///
    /// Liveness is only a hint: a failed state read keeps the last activity.
    fn set_volume(&mut self, level: f32) -> Result<(), MixerError> {
        self.handle.set_volume(level).inspect_err(|e| {
            if e.is_transient() {
                self.activity = SessionActivity::Expired;
            }
        })?;

        match self.handle.state() {
            Ok(activity) => self.activity = activity,
            Err(e) => {
                log::debug!("unable to read state of audio session {}: {}", self.name, e);
                return Ok(());
            }
        }
        if self.activity.is_expired() {
            return Err(MixerError::Invalidated(format!(
                "audio session {} expired",
                self.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSession")
            .field("name", &self.name)
            .field("activity", &self.activity)
            .finish()
    }
}

/// Audio sessions of one output endpoint, indexed by lowercase executable name.
///
/// Several sessions may share a name (one per process, or several per
/// process). The set is only ever rebuilt wholesale by `refresh`.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<AudioSession>,
    index: HashMap<String, Vec<usize>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-enumerate the sessions of `endpoint`.
    ///
    /// The cached set is replaced only when enumeration succeeds; on error
    /// the previous sessions stay in place. Returns the new session count.
    pub fn refresh(&mut self, endpoint: &dyn EndpointHandle) -> Result<usize, MixerError> {
        let handles = endpoint.sessions()?;
        let sessions: Vec<AudioSession> = handles.into_iter().map(AudioSession::new).collect();

        self.clear();
        for session in sessions {
            log::trace!("discovered audio session {}", session.name);
            self.index
                .entry(session.name.clone())
                .or_default()
                .push(self.sessions.len());
            self.sessions.push(session);
        }

        log::debug!(
            "{} audio sessions detected for {}",
            self.sessions.len(),
            endpoint.name()
        );
        Ok(self.sessions.len())
    }

    /// Release every cached session.
    pub fn clear(&mut self) {
        for session in &self.sessions {
            log::trace!("releasing audio session {}", session.name);
        }
        self.index.clear();
        self.sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AudioSession> {
        self.sessions.iter()
    }

    /// All sessions whose executable name equals `name`, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Vec<&AudioSession> {
        self.index
            .get(&name.to_lowercase())
            .map(|ids| ids.iter().map(|&i| &self.sessions[i]).collect())
            .unwrap_or_default()
    }

    /// Apply `level` to every session named `name`.
    ///
    /// Every match is attempted even if an earlier one fails. A hard failure
    /// wins over an invalidated session when reporting.
    pub fn set_volume(&mut self, name: &str, level: f32) -> Result<usize, MixerError> {
        validate_level(level)?;

        let ids = match self.index.get(&name.to_lowercase()) {
            Some(ids) if !ids.is_empty() => ids.clone(),
            _ => return Err(MixerError::SessionNotFound(name.to_string())),
        };

        let mut hard_error = None;
        let mut transient_error = None;
        for id in &ids {
            match self.sessions[*id].set_volume(level) {
                Ok(()) => {}
                Err(e) if e.is_transient() => {
                    log::debug!("{}", e);
                    transient_error.get_or_insert(e);
                }
                Err(e) => {
                    hard_error.get_or_insert(e);
                }
            }
        }

        match hard_error.or(transient_error) {
            Some(e) => Err(e),
            None => Ok(ids.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::targets::EndpointRole;
    use crate::testing::{MockBackend, MockSessionSpec};
    use crate::traits::audio_backend::AudioBackend;

    fn backend(sessions: Vec<MockSessionSpec>) -> MockBackend {
        MockBackend::new().with_default("out", "Speakers", EndpointRole::Output, sessions)
    }

    fn loaded(backend: &MockBackend) -> (Box<dyn EndpointHandle>, SessionRegistry) {
        let endpoint = backend.default_endpoint(EndpointRole::Output).unwrap();
        let mut registry = SessionRegistry::new();
        registry.refresh(endpoint.as_ref()).unwrap();
        (endpoint, registry)
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let backend = backend(vec![MockSessionSpec::process("Discord.exe")]);
        let (_endpoint, registry) = loaded(&backend);

        let found = registry.find_by_name("discord.exe");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "discord.exe");
        assert_eq!(registry.find_by_name("DISCORD.EXE").len(), 1);
        assert!(registry.find_by_name("discord").is_empty());
    }

    #[test]
    fn shared_names_all_receive_volume() {
        let backend = backend(vec![
            MockSessionSpec::process("chrome.exe"),
            MockSessionSpec::process("spotify.exe"),
            MockSessionSpec::process("Chrome.exe"),
        ]);
        let (_endpoint, mut registry) = loaded(&backend);

        assert_eq!(registry.set_volume("chrome.exe", 0.3), Ok(2));

        let world = backend.world.lock();
        assert_eq!(world.session_volume("out", 0), Some(0.3));
        assert_eq!(world.session_volume("out", 1), None);
        assert_eq!(world.session_volume("out", 2), Some(0.3));
    }

    #[test]
    fn system_session_kept_under_reserved_name() {
        let backend = backend(vec![MockSessionSpec::system()]);
        let (_endpoint, registry) = loaded(&backend);
        assert_eq!(registry.find_by_name(SYSTEM_SESSION_NAME).len(), 1);
    }

    #[test]
    fn missing_session_is_not_found() {
        let backend = backend(vec![MockSessionSpec::process("a.exe")]);
        let (_endpoint, mut registry) = loaded(&backend);
        let err = registry.set_volume("game.exe", 1.0).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn out_of_range_level_never_reaches_native_layer() {
        let backend = backend(vec![MockSessionSpec::process("a.exe")]);
        let (_endpoint, mut registry) = loaded(&backend);

        assert_eq!(registry.set_volume("a.exe", 1.2), Err(MixerError::InvalidVolume(1.2)));
        assert_eq!(registry.set_volume("a.exe", -0.5), Err(MixerError::InvalidVolume(-0.5)));
        assert_eq!(backend.world.lock().set_volume_calls, 0);
    }

    #[test]
    fn expired_session_reports_transient() {
        let backend = backend(vec![MockSessionSpec::process("game.exe")]);
        let (_endpoint, mut registry) = loaded(&backend);
        backend.world.lock().session_mut("out", 0).state = SessionActivity::Expired;

        let err = registry.set_volume("game.exe", 0.5).unwrap_err();
        assert!(err.is_transient());
        assert!(registry.find_by_name("game.exe")[0].activity().is_expired());
    }

    #[test]
    fn unreadable_state_after_set_is_success() {
        let backend = backend(vec![MockSessionSpec::process("game.exe")]);
        let (_endpoint, mut registry) = loaded(&backend);
        backend.world.lock().session_mut("out", 0).fail_state =
            Some(MixerError::Native("GetState failed".into()));

        assert_eq!(registry.set_volume("game.exe", 0.4), Ok(1));
        assert_eq!(backend.world.lock().session_volume("out", 0), Some(0.4));
        assert_eq!(
            registry.find_by_name("game.exe")[0].activity(),
            SessionActivity::Active
        );
    }

    #[test]
    fn invalidated_device_reports_transient_after_trying_all() {
        let backend = backend(vec![
            MockSessionSpec::process("game.exe"),
            MockSessionSpec::process("game.exe"),
        ]);
        let (_endpoint, mut registry) = loaded(&backend);
        backend.world.lock().session_mut("out", 0).fail_with =
            Some(MixerError::Invalidated("device invalidated".into()));

        let err = registry.set_volume("game.exe", 0.7).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(backend.world.lock().session_volume("out", 1), Some(0.7));
    }

    #[test]
    fn hard_error_outranks_transient() {
        let backend = backend(vec![
            MockSessionSpec::process("game.exe"),
            MockSessionSpec::process("game.exe"),
        ]);
        let (_endpoint, mut registry) = loaded(&backend);
        {
            let mut world = backend.world.lock();
            world.session_mut("out", 0).fail_with = Some(MixerError::Invalidated("gone".into()));
            world.session_mut("out", 1).fail_with = Some(MixerError::Native("E_FAIL".into()));
        }

        assert_eq!(
            registry.set_volume("game.exe", 0.7),
            Err(MixerError::Native("E_FAIL".into()))
        );
    }

    #[test]
    fn refresh_rebuilds_and_releases_previous_sessions() {
        let backend = backend(vec![
            MockSessionSpec::process("a.exe"),
            MockSessionSpec::process("b.exe"),
        ]);
        let (endpoint, mut registry) = loaded(&backend);
        assert_eq!(backend.world.lock().live_handles, 3);

        backend.world.lock().endpoints[0].sessions = vec![MockSessionSpec::process("c.exe")];
        registry.refresh(endpoint.as_ref()).unwrap();

        assert!(registry.find_by_name("a.exe").is_empty());
        assert_eq!(registry.find_by_name("c.exe").len(), 1);
        let world = backend.world.lock();
        assert_eq!(world.live_handles, 2);
        assert_eq!(world.released_handles, 2);
    }

    #[test]
    fn failed_refresh_keeps_previous_sessions() {
        let backend = backend(vec![MockSessionSpec::process("a.exe")]);
        let (endpoint, mut registry) = loaded(&backend);

        backend.world.lock().fail_sessions = Some(MixerError::Native("enum failed".into()));
        assert!(registry.refresh(endpoint.as_ref()).is_err());
        assert_eq!(registry.find_by_name("a.exe").len(), 1);
    }

    #[test]
    fn clear_releases_everything() {
        let backend = backend(vec![
            MockSessionSpec::process("a.exe"),
            MockSessionSpec::system(),
        ]);
        let (_endpoint, mut registry) = loaded(&backend);
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(backend.world.lock().live_handles, 1); // endpoint only
    }
}
