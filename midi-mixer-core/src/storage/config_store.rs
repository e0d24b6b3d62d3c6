use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::config::MixerConfig;
use crate::models::error::MixerError;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "config.yml";

/// Read and validate a configuration file.
pub fn load_config(path: &Path) -> Result<MixerConfig, MixerError> {
    let source = fs::read_to_string(path).map_err(|e| {
        MixerError::Io(format!("failed to read config {}: {}", path.display(), e))
    })?;
    MixerConfig::from_yaml(&source)
}

/// Holds the active configuration and swaps it atomically on reload.
///
/// Readers get an `Arc` snapshot that stays valid even if a reload happens
/// while they use it. A reload that fails to read, parse or validate leaves
/// the active configuration untouched.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Arc<MixerConfig>>,
}

impl ConfigStore {
    /// Load `path`. Unlike `reload`, a broken file is an error here.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MixerError> {
        let path = path.into();
        let config = load_config(&path)?;
        log::info!(
            "loaded {} with {} volume and {} shell mappings",
            path.display(),
            config.mapping.mixer.len(),
            config.mapping.shell.len()
        );
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(config)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Arc<MixerConfig> {
        self.current.read().clone()
    }

    /// Re-read the file and adopt it only if every mapping is valid.
    ///
    /// Returns the configuration that was active before the swap.
    pub fn reload(&self) -> Result<Arc<MixerConfig>, MixerError> {
        let config = Arc::new(load_config(&self.path)?);
        let previous = std::mem::replace(&mut *self.current.write(), config);
        log::info!("reloaded configuration from {}", self.path.display());
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = concat!(
        "midiDeviceName: nano\n",
        "mapping:\n  mixer:\n",
        "    - cc: 1\n      special: output\n",
        "    - cc: 2\n      filename: game.exe\n",
    );

    fn write(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join(DEFAULT_CONFIG_FILENAME);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn open_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(write(dir.path(), VALID)).unwrap();
        let config = store.current();
        assert_eq!(config.midi_device_name, "nano");
        assert_eq!(config.mapping.mixer.len(), 2);
    }

    #[test]
    fn open_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigStore::open(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, MixerError::Io(_)));
    }

    #[test]
    fn reload_swaps_whole_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), VALID);
        let store = ConfigStore::open(&path).unwrap();
        let before = store.current();

        fs::write(&path, "mapping:\n  mixer:\n    - cc: 9\n      special: input\n").unwrap();
        let previous = store.reload().unwrap();

        assert!(Arc::ptr_eq(&before, &previous));
        let after = store.current();
        assert_eq!(after.mapping.mixer.len(), 1);
        assert_eq!(after.mapping.mixer[0].cc, 9);
        // earlier snapshots are unaffected
        assert_eq!(before.mapping.mixer.len(), 2);
    }

    #[test]
    fn invalid_entry_keeps_previous_mappings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), VALID);
        let store = ConfigStore::open(&path).unwrap();

        fs::write(
            &path,
            concat!(
                "mapping:\n  mixer:\n",
                "    - cc: 1\n      special: output\n",
                "    - cc: 2\n      min: 90\n      max: 10\n",
            ),
        )
        .unwrap();
        assert!(store.reload().is_err());
        assert_eq!(*store.current(), MixerConfig::from_yaml(VALID).unwrap());

        fs::write(&path, "mapping: [not, a, map").unwrap();
        assert!(matches!(store.reload(), Err(MixerError::InvalidConfig(_))));
        assert_eq!(store.current().mapping.mixer.len(), 2);
    }
}
