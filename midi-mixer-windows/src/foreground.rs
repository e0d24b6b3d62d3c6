use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};

use midi_mixer_core::traits::foreground::ForegroundProcess;

use crate::process::process_name;

/// Resolves the owner of the foreground window on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsForeground;

impl ForegroundProcess for WindowsForeground {
    fn process_name(&self) -> String {
        let mut pid = 0u32;
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.is_invalid() {
                return String::new();
            }
            GetWindowThreadProcessId(hwnd, Some(&mut pid));
        }
        process_name(pid).unwrap_or_default()
    }
}
