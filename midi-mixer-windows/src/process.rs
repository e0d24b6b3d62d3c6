//! Process id to executable name lookup.

use windows::core::PWSTR;
use windows::Win32::Foundation::CloseHandle;
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};

/// Lowercase executable name of `pid`, e.g. `discord.exe`.
///
/// Returns `None` for the idle process and for processes that cannot be
/// opened (protected or already exited).
pub fn process_name(pid: u32) -> Option<String> {
    if pid == 0 {
        return None;
    }

    let mut buffer = [0u16; 1024];
    let mut len = buffer.len() as u32;
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
        let result = QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_WIN32,
            PWSTR(buffer.as_mut_ptr()),
            &mut len,
        );
        let _ = CloseHandle(handle);
        result.ok()?;
    }

    let path = String::from_utf16_lossy(&buffer[..len as usize]);
    executable_name(&path)
}

fn executable_name(path: &str) -> Option<String> {
    path.rsplit(['\\', '/'])
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories_and_lowercases() {
        assert_eq!(
            executable_name(r"C:\Program Files\Discord\Discord.exe").as_deref(),
            Some("discord.exe")
        );
        assert_eq!(executable_name("game.EXE").as_deref(), Some("game.exe"));
        assert_eq!(executable_name(r"C:\weird\"), None);
    }

    #[test]
    fn current_process_resolves() {
        let name = process_name(std::process::id()).unwrap();
        assert!(name.ends_with(".exe"));
    }

    #[test]
    fn idle_process_has_no_name() {
        assert_eq!(process_name(0), None);
    }
}
