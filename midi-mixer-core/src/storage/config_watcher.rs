use std::ffi::OsString;
use std::path::Path;

use crossbeam_channel::{Sender, TrySendError};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::models::error::MixerError;
use crate::models::state::ControlMessage;

/// Turns writes to the configuration file into `RefreshConfig` messages.
///
/// Watches the parent directory, since editors often replace the file
/// instead of writing it in place. Watching stops when this is dropped.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn start(path: &Path, control: Sender<ControlMessage>) -> Result<Self, MixerError> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| MixerError::InvalidConfig(format!("{} is not a file", path.display())))?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !is_write(&event.kind) {
                    return;
                }
                if !event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str())) {
                    return;
                }
                match control.try_send(ControlMessage::RefreshConfig) {
                    Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                    Err(TrySendError::Full(_)) => {
                        log::debug!("control queue full, dropping config change")
                    }
                }
            }
            Err(e) => log::error!("config watch error: {}", e),
        })
        .map_err(|e| MixerError::Io(format!("failed to create config watcher: {}", e)))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| MixerError::Io(format!("failed to watch {}: {}", dir.display(), e)))?;
        log::debug!("watching {} for configuration changes", dir.display());

        Ok(Self { _watcher: watcher })
    }
}

fn is_write(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}
