//! # midi-mixer-core
//!
//! Platform-agnostic core of the MIDI volume mixer.
//!
//! Turns MIDI control changes into volume changes on audio endpoints and
//! per-process audio sessions. Platform backends (Windows WASAPI) implement
//! the `AudioBackend` trait and plug into the generic `Mixer` engine.
//!
//! ## Architecture
//!
//! ```text
//! midi-mixer-core (this crate)
//! ├── traits/       ← AudioBackend, EndpointHandle, SessionHandle, ForegroundProcess
//! ├── models/       ← MixerError, MixerConfig, VolumeMapping, RefreshState, targets
//! ├── processing/   ← VolumeScale, Debouncer, MIDI parsing, shell mappings
//! ├── session/      ← EndpointModel, SessionRegistry, RefreshCoordinator,
//! │                   MappingDispatcher, Mixer, Controller
//! └── storage/      ← ConfigStore, ConfigWatcher
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use models::config::{MappingOptions, MixerConfig, RefreshTimings, ShellMapping, VolumeMapping};
pub use models::error::MixerError;
pub use models::state::{
    ControlMessage, RefreshSignal, RefreshState, SessionActivity, SessionUrgency,
};
pub use models::targets::{EndpointRole, SpecialTarget};
pub use processing::midi::{parse_control_change, ControlChange};
pub use processing::scaling::VolumeScale;
pub use session::controller::{ConfigChange, Controller, Flow};
pub use session::endpoint::{EndpointModel, EndpointSnapshot, ModelSnapshot, SessionSnapshot};
pub use session::engine::Mixer;
pub use session::registry::{SessionRegistry, SYSTEM_SESSION_NAME};
pub use session::signals::{refresh_channels, RefreshReceivers, RefreshSignaller};
pub use storage::config_store::{load_config, ConfigStore, DEFAULT_CONFIG_FILENAME};
pub use storage::config_watcher::ConfigWatcher;
pub use traits::audio_backend::{AudioBackend, EndpointHandle, SessionHandle, SessionIdentity};
pub use traits::foreground::{ForegroundProcess, NoForeground};
