use windows::Win32::Devices::FunctionDiscovery::PKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
use windows::Win32::Media::Audio::{IAudioSessionManager2, IAudioSessionNotification, IMMDevice};
use windows::Win32::System::Com::{CoTaskMemFree, CLSCTX_ALL, STGM_READ};

use midi_mixer_core::models::error::MixerError;
use midi_mixer_core::traits::audio_backend::{EndpointHandle, SessionHandle};

use crate::com::audio_error;
use crate::notifications::{SessionNotifier, SignalSlot};
use crate::session::WasapiSession;

/// Session-created registration, undone on drop.
struct SessionWatch {
    manager: IAudioSessionManager2,
    client: IAudioSessionNotification,
}

impl Drop for SessionWatch {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.manager.UnregisterSessionNotification(&self.client) {
                log::debug!("failed to unregister session notification: {}", e);
            }
        }
    }
}

/// One MMDevice endpoint with its volume control.
pub struct WasapiEndpoint {
    watch: Option<SessionWatch>,
    id: String,
    name: String,
    volume: IAudioEndpointVolume,
    device: IMMDevice,
}

// SAFETY: the process runs COM in the multithreaded apartment, where these
// interface pointers may be called from any thread. The engine serializes
// all access behind its model lock.
unsafe impl Send for WasapiEndpoint {}

impl WasapiEndpoint {
    pub(crate) fn open(device: IMMDevice) -> Result<Self, MixerError> {
        unsafe {
            let raw_id = device.GetId().map_err(|e| audio_error("GetId failed", e))?;
            let id = raw_id.to_string().unwrap_or_default();
            CoTaskMemFree(Some(raw_id.0 as *const _));

            let name = friendly_name(&device).unwrap_or_else(|e| {
                log::debug!("no friendly name for {}: {}", id, e);
                id.clone()
            });

            let volume: IAudioEndpointVolume = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| audio_error("IAudioEndpointVolume activation failed", e))?;

            Ok(Self {
                watch: None,
                id,
                name,
                volume,
                device,
            })
        }
    }

    fn session_manager(&self) -> Result<IAudioSessionManager2, MixerError> {
        if let Some(watch) = &self.watch {
            return Ok(watch.manager.clone());
        }
        unsafe {
            self.device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| audio_error("IAudioSessionManager2 activation failed", e))
        }
    }

    /// Send an immediate session refresh whenever a session is created on
    /// this endpoint.
    pub(crate) fn watch_sessions(&mut self, signals: SignalSlot) -> Result<(), MixerError> {
        let manager = self.session_manager()?;
        let client = SessionNotifier::client(signals);
        unsafe {
            // notifications only start after the first enumeration
            manager
                .GetSessionEnumerator()
                .map_err(|e| audio_error("GetSessionEnumerator failed", e))?;
            manager
                .RegisterSessionNotification(&client)
                .map_err(|e| audio_error("RegisterSessionNotification failed", e))?;
        }
        self.watch = Some(SessionWatch { manager, client });
        Ok(())
    }
}

fn friendly_name(device: &IMMDevice) -> windows::core::Result<String> {
    unsafe {
        let store = device.OpenPropertyStore(STGM_READ)?;
        let value = store.GetValue(&PKEY_Device_FriendlyName)?;
        Ok(value.to_string())
    }
}

impl EndpointHandle for WasapiEndpoint {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_volume(&self, level: f32) -> Result<(), MixerError> {
        unsafe {
            self.volume
                .SetMasterVolumeLevelScalar(level, std::ptr::null())
                .map_err(|e| audio_error("SetMasterVolumeLevelScalar failed", e))
        }
    }

    fn volume(&self) -> Result<f32, MixerError> {
        unsafe {
            self.volume
                .GetMasterVolumeLevelScalar()
                .map_err(|e| audio_error("GetMasterVolumeLevelScalar failed", e))
        }
    }

    fn sessions(&self) -> Result<Vec<Box<dyn SessionHandle>>, MixerError> {
        let manager = self.session_manager()?;
        unsafe {
            let enumerator = manager
                .GetSessionEnumerator()
                .map_err(|e| audio_error("GetSessionEnumerator failed", e))?;
            let count = enumerator
                .GetCount()
                .map_err(|e| audio_error("GetCount failed", e))?;

            let mut sessions: Vec<Box<dyn SessionHandle>> =
                Vec::with_capacity(count.max(0) as usize);
            for i in 0..count {
                let control = enumerator
                    .GetSession(i)
                    .map_err(|e| audio_error("GetSession failed", e))?;
                sessions.push(Box::new(WasapiSession::open(control)?));
            }
            Ok(sessions)
        }
    }
}
