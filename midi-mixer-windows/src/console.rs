//! Console control events (Ctrl+C, window close) mapped to `Quit`.

use std::sync::OnceLock;

use crossbeam_channel::Sender;
use windows::core::BOOL;
use windows::Win32::System::Console::SetConsoleCtrlHandler;

use midi_mixer_core::models::error::MixerError;
use midi_mixer_core::models::state::ControlMessage;

static CONTROL: OnceLock<Sender<ControlMessage>> = OnceLock::new();

unsafe extern "system" fn on_console_event(ctrl_type: u32) -> BOOL {
    log::debug!("console control event {}", ctrl_type);
    match CONTROL.get() {
        Some(control) => {
            let _ = control.try_send(ControlMessage::Quit);
            BOOL::from(true)
        }
        None => BOOL::from(false),
    }
}

/// Route console shutdown events into `control`. Only the first call
/// installs a handler.
pub fn install_quit_handler(control: Sender<ControlMessage>) -> Result<(), MixerError> {
    if CONTROL.set(control).is_err() {
        return Ok(());
    }
    unsafe {
        SetConsoleCtrlHandler(Some(on_console_event), true)
            .map_err(|e| MixerError::Native(format!("SetConsoleCtrlHandler failed: {}", e)))
    }
}
