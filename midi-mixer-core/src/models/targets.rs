use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of an audio endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    /// Render device (speakers, headphones).
    Output,
    /// Capture device (microphone, line in).
    Input,
}

impl EndpointRole {
    pub const ALL: [EndpointRole; 2] = [EndpointRole::Output, EndpointRole::Input];
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output => f.write_str("output"),
            Self::Input => f.write_str("input"),
        }
    }
}

/// Keyword targets a volume mapping can name in its `special` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialTarget {
    /// Default output endpoint volume.
    Output,
    /// Default input endpoint volume.
    Input,
    /// The system sounds session of the default output endpoint.
    System,
    /// Session(s) of the process owning the foreground window.
    Active,
    /// Ask the coordinator to re-enumerate hardware endpoints.
    RefreshDevices,
    /// Ask the coordinator to re-enumerate audio sessions.
    RefreshSessions,
}

impl FromStr for SpecialTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // refresh_devices, refreshDevices and refresh-devices are all accepted
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "output" => Ok(Self::Output),
            "input" => Ok(Self::Input),
            "system" => Ok(Self::System),
            "active" => Ok(Self::Active),
            "refreshdevices" => Ok(Self::RefreshDevices),
            "refreshsessions" => Ok(Self::RefreshSessions),
            _ => Err(format!("unknown special target '{}'", s)),
        }
    }
}

impl<'de> Deserialize<'de> for SpecialTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for SpecialTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Output => "output",
            Self::Input => "input",
            Self::System => "system",
            Self::Active => "active",
            Self::RefreshDevices => "refresh_devices",
            Self::RefreshSessions => "refresh_sessions",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keyword_spellings() {
        assert_eq!("output".parse::<SpecialTarget>(), Ok(SpecialTarget::Output));
        assert_eq!("SYSTEM".parse::<SpecialTarget>(), Ok(SpecialTarget::System));
        assert_eq!("refresh_devices".parse::<SpecialTarget>(), Ok(SpecialTarget::RefreshDevices));
        assert_eq!("refreshDevices".parse::<SpecialTarget>(), Ok(SpecialTarget::RefreshDevices));
        assert_eq!("refresh-sessions".parse::<SpecialTarget>(), Ok(SpecialTarget::RefreshSessions));
    }

    #[test]
    fn rejects_unknown_keyword() {
        let err = "louder".parse::<SpecialTarget>().unwrap_err();
        assert!(err.contains("louder"));
    }
}
