//! COM callback objects for device and session change notifications.
//!
//! Callbacks run on OS-owned threads. They only enqueue a refresh signal;
//! the model is never touched from here.

use std::sync::Arc;

use parking_lot::Mutex;
use windows::core::PCWSTR;
use windows::Win32::Foundation::PROPERTYKEY;
use windows::Win32::Media::Audio::{
    eCapture, eRender, EDataFlow, ERole, IAudioSessionControl, IAudioSessionNotification,
    IAudioSessionNotification_Impl, IMMNotificationClient, IMMNotificationClient_Impl, DEVICE_STATE,
};
use windows_core::{implement, Ref};

use midi_mixer_core::models::state::SessionUrgency;
use midi_mixer_core::session::signals::RefreshSignaller;

/// Signal destination shared by every callback object. Empty while nobody
/// is subscribed.
pub(crate) type SignalSlot = Arc<Mutex<Option<RefreshSignaller>>>;

#[implement(IMMNotificationClient)]
pub(crate) struct DeviceNotifier {
    signals: SignalSlot,
}

impl DeviceNotifier {
    pub(crate) fn client(signals: SignalSlot) -> IMMNotificationClient {
        Self { signals }.into()
    }

    fn hardware_changed(&self, event: &str) {
        log::trace!("detected {} event", event);
        if let Some(signaller) = self.signals.lock().as_ref() {
            signaller.request_hardware_refresh();
        }
    }
}

impl IMMNotificationClient_Impl for DeviceNotifier_Impl {
    fn OnDeviceStateChanged(
        &self,
        _device_id: &PCWSTR,
        _new_state: DEVICE_STATE,
    ) -> windows::core::Result<()> {
        self.hardware_changed("device state changed");
        Ok(())
    }

    fn OnDeviceAdded(&self, _device_id: &PCWSTR) -> windows::core::Result<()> {
        self.hardware_changed("device added");
        Ok(())
    }

    fn OnDeviceRemoved(&self, _device_id: &PCWSTR) -> windows::core::Result<()> {
        self.hardware_changed("device removed");
        Ok(())
    }

    fn OnDefaultDeviceChanged(
        &self,
        flow: EDataFlow,
        _role: ERole,
        _default_device_id: &PCWSTR,
    ) -> windows::core::Result<()> {
        let event = if flow == eRender {
            "default output changed"
        } else if flow == eCapture {
            "default input changed"
        } else {
            "default device changed"
        };
        self.hardware_changed(event);
        Ok(())
    }

    fn OnPropertyValueChanged(
        &self,
        _device_id: &PCWSTR,
        _key: &PROPERTYKEY,
    ) -> windows::core::Result<()> {
        Ok(())
    }
}

#[implement(IAudioSessionNotification)]
pub(crate) struct SessionNotifier {
    signals: SignalSlot,
}

impl SessionNotifier {
    pub(crate) fn client(signals: SignalSlot) -> IAudioSessionNotification {
        Self { signals }.into()
    }
}

impl IAudioSessionNotification_Impl for SessionNotifier_Impl {
    fn OnSessionCreated(
        &self,
        _new_session: Ref<'_, IAudioSessionControl>,
    ) -> windows::core::Result<()> {
        log::trace!("detected session created event");
        if let Some(signaller) = self.signals.lock().as_ref() {
            signaller.request_session_refresh(SessionUrgency::Immediate);
        }
        Ok(())
    }
}
