use thiserror::Error;

use super::targets::EndpointRole;

/// Errors produced by the mixer engine and its native backends.
///
/// Variants fall into four classes that callers treat differently:
/// - validation (`InvalidVolume`, `InvalidMapping`, `InvalidConfig`): rejected
///   before any native call is made.
/// - not found (`EndpointNotFound`, `SessionNotFound`): the target simply is
///   not present right now. Never logged as an error.
/// - transient (`Invalidated`): the OS reported the device or session as gone.
///   Triggers a resync instead of surfacing.
/// - hard (`Native`, `Io`, `Midi`): unexpected failures. Logged, and the
///   affected operation is skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MixerError {
    #[error("invalid volume level {0}, expected a value in [0, 1]")]
    InvalidVolume(f32),

    #[error("invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no default {0} endpoint")]
    EndpointNotFound(EndpointRole),

    #[error("audio session not found: {0}")]
    SessionNotFound(String),

    #[error("invalidated: {0}")]
    Invalidated(String),

    #[error("native audio error: {0}")]
    Native(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("midi error: {0}")]
    Midi(String),
}

impl MixerError {
    /// Expected steady-state outcome: the target is not active at the moment.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EndpointNotFound(_) | Self::SessionNotFound(_))
    }

    /// The native layer reported a stale handle; a resync will fix it.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Invalidated(_))
    }
}

impl From<std::io::Error> for MixerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Reject volume levels outside `[0, 1]` (NaN included).
pub fn validate_level(level: f32) -> Result<(), MixerError> {
    if (0.0..=1.0).contains(&level) {
        Ok(())
    } else {
        Err(MixerError::InvalidVolume(level))
    }
}
