/// Reports which process owns the foreground window.
pub trait ForegroundProcess: Send + Sync {
    /// Lowercase executable name (e.g. `firefox.exe`), or an empty string when unknown.
    fn process_name(&self) -> String;
}

/// Tracker for platforms without a window system.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoForeground;

impl ForegroundProcess for NoForeground {
    fn process_name(&self) -> String {
        String::new()
    }
}
