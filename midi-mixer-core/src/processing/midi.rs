/// A MIDI Control Change event, channel stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChange {
    pub cc: u8,
    pub value: u8,
}

/// Parse a raw MIDI message into a control change.
///
/// Accepts status bytes `0xB0..=0xBF` (any channel) followed by two data
/// bytes. Everything else, including running status, yields `None`.
pub fn parse_control_change(message: &[u8]) -> Option<ControlChange> {
    match message {
        [status, cc, value, ..] if status & 0xF0 == 0xB0 => Some(ControlChange {
            cc: cc & 0x7F,
            value: value & 0x7F,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_any_channel() {
        assert_eq!(
            parse_control_change(&[0xB0, 7, 100]),
            Some(ControlChange { cc: 7, value: 100 })
        );
        assert_eq!(
            parse_control_change(&[0xBF, 1, 0]),
            Some(ControlChange { cc: 1, value: 0 })
        );
    }

    #[test]
    fn ignores_other_messages() {
        assert_eq!(parse_control_change(&[0x90, 60, 100]), None); // note on
        assert_eq!(parse_control_change(&[0xB0, 7]), None);
        assert_eq!(parse_control_change(&[]), None);
    }

    #[test]
    fn masks_data_bytes() {
        assert_eq!(
            parse_control_change(&[0xB3, 0x81, 0xFF]),
            Some(ControlChange { cc: 1, value: 127 })
        );
    }
}
