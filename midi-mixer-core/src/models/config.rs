use std::time::Duration;

use serde::{Deserialize, Deserializer};

use super::error::MixerError;
use super::targets::SpecialTarget;
use crate::processing::scaling::VolumeScale;

/// Highest value a MIDI data byte can carry.
pub const MIDI_VALUE_MAX: u8 = 127;

/// Top-level configuration file.
///
/// ```yaml
/// midiDeviceName: nanoKONTROL2
/// echoMIDIEvents: false
/// mapping:
///   mixer:
///     - cc: 1
///       special: output
///   shell:
///     - cc: 40
///       command: "echo {value}"
///       template: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixerConfig {
    /// Substring matched against MIDI input port names.
    #[serde(default, alias = "midiDevicename", alias = "midi_device_name")]
    pub midi_device_name: String,

    /// Log every incoming control change at info level.
    #[serde(default, alias = "echoMIDIEvents", alias = "echo_midi_events")]
    pub echo_midi_events: bool,

    #[serde(default)]
    pub mapping: MappingOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MappingOptions {
    #[serde(default)]
    pub mixer: Vec<VolumeMapping>,

    #[serde(default)]
    pub shell: Vec<ShellMapping>,
}

impl MixerConfig {
    /// Parse and validate a YAML document. Nothing is returned unless every
    /// mapping is valid.
    pub fn from_yaml(source: &str) -> Result<Self, MixerError> {
        let config: MixerConfig = serde_yaml::from_str(source)
            .map_err(|e| MixerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MixerError> {
        for (i, mapping) in self.mapping.mixer.iter().enumerate() {
            mapping
                .validate()
                .map_err(|e| MixerError::InvalidConfig(format!("mixer mapping #{}: {}", i, e)))?;
            if !mapping.has_targets() {
                log::warn!("mixer mapping #{} on cc {} has no targets", i, mapping.cc);
            }
        }
        for (i, mapping) in self.mapping.shell.iter().enumerate() {
            mapping
                .validate()
                .map_err(|e| MixerError::InvalidConfig(format!("shell mapping #{}: {}", i, e)))?;
        }
        Ok(())
    }
}

/// Maps one MIDI control change number to a set of volume targets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMapping {
    pub cc: u8,

    #[serde(default, alias = "min")]
    pub hardware_min: u8,

    #[serde(default = "default_hardware_max", alias = "max")]
    pub hardware_max: u8,

    #[serde(default)]
    pub volume_min: f32,

    #[serde(default = "default_volume_max")]
    pub volume_max: f32,

    #[serde(default)]
    pub reverse: bool,

    #[serde(default, deserialize_with = "one_or_many")]
    pub special: Vec<SpecialTarget>,

    /// Process executable names, matched case-insensitively.
    #[serde(default, deserialize_with = "one_or_many")]
    pub filename: Vec<String>,

    /// Endpoint friendly names, matched case-insensitively.
    #[serde(default, deserialize_with = "one_or_many")]
    pub device: Vec<String>,
}

fn default_hardware_max() -> u8 {
    MIDI_VALUE_MAX
}

fn default_volume_max() -> f32 {
    1.0
}

impl VolumeMapping {
    /// A mapping for `cc` with default ranges and no targets.
    pub fn new(cc: u8) -> Self {
        Self {
            cc,
            hardware_min: 0,
            hardware_max: MIDI_VALUE_MAX,
            volume_min: 0.0,
            volume_max: 1.0,
            reverse: false,
            special: Vec::new(),
            filename: Vec::new(),
            device: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), MixerError> {
        if self.cc > MIDI_VALUE_MAX {
            return Err(MixerError::InvalidMapping(format!(
                "cc {} is outside the MIDI range 0-127",
                self.cc
            )));
        }
        if self.hardware_max > MIDI_VALUE_MAX {
            return Err(MixerError::InvalidMapping(format!(
                "hardware maximum {} is outside the MIDI range 0-127",
                self.hardware_max
            )));
        }
        if self.hardware_min > self.hardware_max {
            return Err(MixerError::InvalidMapping(format!(
                "hardware minimum {} should not be greater than maximum {}",
                self.hardware_min, self.hardware_max
            )));
        }
        if !(0.0..=1.0).contains(&self.volume_min) {
            return Err(MixerError::InvalidMapping(format!(
                "volume minimum {} should be in range [0,1]",
                self.volume_min
            )));
        }
        if !(0.0..=1.0).contains(&self.volume_max) {
            return Err(MixerError::InvalidMapping(format!(
                "volume maximum {} should be in range [0,1]",
                self.volume_max
            )));
        }
        Ok(())
    }

    pub fn scale(&self) -> VolumeScale {
        VolumeScale {
            hardware_min: self.hardware_min,
            hardware_max: self.hardware_max,
            volume_min: self.volume_min,
            volume_max: self.volume_max,
            reverse: self.reverse,
        }
    }

    pub fn has_targets(&self) -> bool {
        !(self.special.is_empty() && self.filename.is_empty() && self.device.is_empty())
    }
}

/// Runs a shell command when its control change arrives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShellMapping {
    pub cc: u8,

    /// Command lines. Templates join them with CRLF into one script;
    /// otherwise each item is passed as a separate argument.
    #[serde(deserialize_with = "one_or_many")]
    pub command: Vec<String>,

    #[serde(default)]
    pub log_output: bool,

    #[serde(default)]
    pub suppress_errors: bool,

    #[serde(default)]
    pub use_powershell: bool,

    /// Substitute `{cc}` and `{value}` before running.
    #[serde(default, rename = "template")]
    pub is_template: bool,
}

impl ShellMapping {
    pub fn validate(&self) -> Result<(), MixerError> {
        if self.cc > MIDI_VALUE_MAX {
            return Err(MixerError::InvalidMapping(format!(
                "cc {} is outside the MIDI range 0-127",
                self.cc
            )));
        }
        if self.command.iter().all(|c| c.trim().is_empty()) {
            return Err(MixerError::InvalidMapping("command must not be empty".into()));
        }
        Ok(())
    }
}

/// Accepts either a single scalar or a list for list-valued fields.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::One(v)) => vec![v],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}

/// Debounce and resync intervals used by the refresh coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshTimings {
    /// Quiet period before a hardware refresh runs (default: 1s).
    pub hardware_quiet: Duration,

    /// Upper bound on how long a burst can postpone a hardware refresh (default: 5s).
    pub hardware_max_wait: Duration,

    /// Quiet period for immediate session refreshes (default: 500ms).
    pub session_quiet: Duration,

    /// Upper bound on how long a burst can postpone a session refresh (default: 3s).
    pub session_max_wait: Duration,

    /// Delay for failure-driven resyncs (default: 5s).
    pub lazy_resync: Duration,

    /// Safety-net resync interval (default: 30s).
    pub periodic_resync: Duration,
}

impl RefreshTimings {
    pub fn validate(&self) -> Result<(), String> {
        if self.hardware_max_wait < self.hardware_quiet {
            return Err("hardware max wait must not be shorter than its quiet period".into());
        }
        if self.session_max_wait < self.session_quiet {
            return Err("session max wait must not be shorter than its quiet period".into());
        }
        if self.periodic_resync.is_zero() {
            return Err("periodic resync interval must be positive".into());
        }
        Ok(())
    }
}

impl Default for RefreshTimings {
    fn default() -> Self {
        Self {
            hardware_quiet: Duration::from_secs(1),
            hardware_max_wait: Duration::from_secs(5),
            session_quiet: Duration::from_millis(500),
            session_max_wait: Duration::from_secs(3),
            lazy_resync: Duration::from_secs(5),
            periodic_resync: Duration::from_secs(30),
        }
    }
}
