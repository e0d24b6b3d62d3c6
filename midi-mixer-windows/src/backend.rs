//! WASAPI implementation of the engine's audio backend.
//!
//! Wraps `IMMDeviceEnumerator` for default-endpoint lookup, active device
//! enumeration and device change notifications.

use std::sync::Arc;

use parking_lot::Mutex;
use windows::Win32::Media::Audio::{
    eCapture, eConsole, eRender, EDataFlow, IMMDeviceEnumerator, IMMNotificationClient,
    MMDeviceEnumerator, DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::{CoCreateInstance, CLSCTX_ALL};

use midi_mixer_core::models::error::MixerError;
use midi_mixer_core::models::targets::EndpointRole;
use midi_mixer_core::session::signals::RefreshSignaller;
use midi_mixer_core::traits::audio_backend::{AudioBackend, EndpointHandle};

use crate::com::{audio_error, endpoint_error};
use crate::endpoint::WasapiEndpoint;
use crate::notifications::{DeviceNotifier, SignalSlot};

pub struct WasapiBackend {
    enumerator: IMMDeviceEnumerator,
    signals: SignalSlot,
    device_client: Mutex<Option<IMMNotificationClient>>,
}

// SAFETY: the process runs COM in the multithreaded apartment, where the
// enumerator may be called from any thread. The notification client is
// only touched under its mutex.
unsafe impl Send for WasapiBackend {}
unsafe impl Sync for WasapiBackend {}

impl WasapiBackend {
    /// Create the device enumerator.
    ///
    /// Requires a live `ComGuard`. Failure here is fatal for the engine.
    pub fn new() -> Result<Self, MixerError> {
        let enumerator: IMMDeviceEnumerator = unsafe {
            CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                .map_err(|e| MixerError::Native(format!("failed to create enumerator: {}", e)))?
        };
        Ok(Self {
            enumerator,
            signals: Arc::new(Mutex::new(None)),
            device_client: Mutex::new(None),
        })
    }

    fn data_flow(role: EndpointRole) -> EDataFlow {
        match role {
            EndpointRole::Output => eRender,
            EndpointRole::Input => eCapture,
        }
    }
}

impl AudioBackend for WasapiBackend {
    fn default_endpoint(&self, role: EndpointRole) -> Result<Box<dyn EndpointHandle>, MixerError> {
        let device = unsafe {
            self.enumerator
                .GetDefaultAudioEndpoint(Self::data_flow(role), eConsole)
                .map_err(|e| endpoint_error(role, e))?
        };
        let mut endpoint = WasapiEndpoint::open(device)?;

        if role == EndpointRole::Output {
            if let Err(e) = endpoint.watch_sessions(Arc::clone(&self.signals)) {
                log::warn!("new audio sessions will only be found by periodic resync: {}", e);
            }
        }
        Ok(Box::new(endpoint))
    }

    fn active_endpoints(
        &self,
        role: EndpointRole,
    ) -> Result<Vec<Box<dyn EndpointHandle>>, MixerError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(Self::data_flow(role), DEVICE_STATE_ACTIVE)
                .map_err(|e| audio_error("EnumAudioEndpoints failed", e))?;
            let count = collection
                .GetCount()
                .map_err(|e| audio_error("GetCount failed", e))?;

            let mut endpoints: Vec<Box<dyn EndpointHandle>> = Vec::with_capacity(count as usize);
            for i in 0..count {
                let device = match collection.Item(i) {
                    Ok(d) => d,
                    Err(e) => {
                        log::debug!("skipping {} device #{}: {}", role, i, e);
                        continue;
                    }
                };
                match WasapiEndpoint::open(device) {
                    Ok(endpoint) => endpoints.push(Box::new(endpoint)),
                    Err(e) => log::debug!("skipping {} device #{}: {}", role, i, e),
                }
            }
            Ok(endpoints)
        }
    }

    fn subscribe(&self, signaller: RefreshSignaller) -> Result<(), MixerError> {
        *self.signals.lock() = Some(signaller);

        let mut slot = self.device_client.lock();
        if slot.is_some() {
            return Ok(());
        }
        let client = DeviceNotifier::client(Arc::clone(&self.signals));
        unsafe {
            self.enumerator
                .RegisterEndpointNotificationCallback(&client)
                .map_err(|e| {
                    MixerError::Native(format!("failed to register device notifications: {}", e))
                })?;
        }
        *slot = Some(client);
        log::debug!("registered for audio device notifications");
        Ok(())
    }

    fn unsubscribe(&self) {
        if let Some(client) = self.device_client.lock().take() {
            unsafe {
                if let Err(e) = self.enumerator.UnregisterEndpointNotificationCallback(&client) {
                    log::debug!("failed to unregister device notifications: {}", e);
                }
            }
        }
        *self.signals.lock() = None;
    }
}

impl Drop for WasapiBackend {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
