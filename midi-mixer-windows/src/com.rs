//! COM apartment setup and HRESULT classification.

use windows::Win32::Foundation::E_NOTFOUND;
use windows::Win32::Media::Audio::{AUDCLNT_E_DEVICE_INVALIDATED, AUDCLNT_E_NOT_INITIALIZED};
use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED};

use midi_mixer_core::models::error::MixerError;
use midi_mixer_core::models::targets::EndpointRole;

/// Joins the calling thread to the multithreaded apartment for its lifetime.
///
/// While one guard is alive, every other thread of the process may use COM
/// objects through the implicit MTA.
pub struct ComGuard {
    _private: (),
}

impl ComGuard {
    pub fn init_multithreaded() -> Result<Self, MixerError> {
        unsafe {
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .map_err(|e| MixerError::Native(format!("CoInitializeEx failed: {}", e)))?;
        }
        Ok(Self { _private: () })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}

/// Map a failed audio call to the engine's error classes.
pub(crate) fn audio_error(context: &str, e: windows::core::Error) -> MixerError {
    let code = e.code();
    if code == AUDCLNT_E_DEVICE_INVALIDATED || code == AUDCLNT_E_NOT_INITIALIZED {
        MixerError::Invalidated(format!("{}: {}", context, e))
    } else {
        MixerError::Native(format!("{}: {}", context, e))
    }
}

/// Like `audio_error`, but a missing device means the role has no default.
pub(crate) fn endpoint_error(role: EndpointRole, e: windows::core::Error) -> MixerError {
    if e.code() == E_NOTFOUND {
        MixerError::EndpointNotFound(role)
    } else {
        audio_error("GetDefaultAudioEndpoint failed", e)
    }
}
