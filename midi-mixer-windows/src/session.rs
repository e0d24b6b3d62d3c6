use windows::core::Interface;
use windows::Win32::Foundation::S_OK;
use windows::Win32::Media::Audio::{
    AudioSessionStateActive, AudioSessionStateExpired, IAudioSessionControl, IAudioSessionControl2,
    ISimpleAudioVolume,
};

use midi_mixer_core::models::error::MixerError;
use midi_mixer_core::models::state::SessionActivity;
use midi_mixer_core::traits::audio_backend::{SessionHandle, SessionIdentity};

use crate::com::audio_error;
use crate::process::process_name;

/// One WASAPI audio session. Dropping it releases both interfaces.
pub struct WasapiSession {
    identity: SessionIdentity,
    control: IAudioSessionControl2,
    volume: ISimpleAudioVolume,
}

// SAFETY: the process runs COM in the multithreaded apartment, where these
// interface pointers may be called from any thread. The engine serializes
// all access behind its model lock.
unsafe impl Send for WasapiSession {}

impl WasapiSession {
    pub(crate) fn open(control: IAudioSessionControl) -> Result<Self, MixerError> {
        let control: IAudioSessionControl2 = control
            .cast()
            .map_err(|e| audio_error("IAudioSessionControl2 unavailable", e))?;
        let volume: ISimpleAudioVolume = control
            .cast()
            .map_err(|e| audio_error("ISimpleAudioVolume unavailable", e))?;

        let identity = unsafe {
            if control.IsSystemSoundsSession() == S_OK {
                SessionIdentity::System
            } else {
                // sessions shared by several processes have no single owner
                control
                    .GetProcessId()
                    .ok()
                    .and_then(process_name)
                    .map(SessionIdentity::Process)
                    .unwrap_or(SessionIdentity::System)
            }
        };

        Ok(Self {
            identity,
            control,
            volume,
        })
    }
}

impl SessionHandle for WasapiSession {
    fn identity(&self) -> SessionIdentity {
        self.identity.clone()
    }

    fn set_volume(&self, level: f32) -> Result<(), MixerError> {
        unsafe {
            self.volume
                .SetMasterVolume(level, std::ptr::null())
                .map_err(|e| audio_error("SetMasterVolume failed", e))
        }
    }

    fn volume(&self) -> Result<f32, MixerError> {
        unsafe {
            self.volume
                .GetMasterVolume()
                .map_err(|e| audio_error("GetMasterVolume failed", e))
        }
    }

    fn state(&self) -> Result<SessionActivity, MixerError> {
        let state = unsafe {
            self.control
                .GetState()
                .map_err(|e| audio_error("GetState failed", e))?
        };
        Ok(if state == AudioSessionStateActive {
            SessionActivity::Active
        } else if state == AudioSessionStateExpired {
            SessionActivity::Expired
        } else {
            SessionActivity::Inactive
        })
    }
}
