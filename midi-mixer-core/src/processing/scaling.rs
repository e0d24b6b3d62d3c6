/// Maps a raw MIDI controller value onto a volume level.
///
/// The value is clamped to `[hardware_min, hardware_max]`, normalized and
/// stretched onto `[volume_min, volume_max]`. With `reverse` set the result
/// is mirrored inside the output range, so `volume_min` and `volume_max`
/// swap places.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeScale {
    pub hardware_min: u8,
    pub hardware_max: u8,
    pub volume_min: f32,
    pub volume_max: f32,
    pub reverse: bool,
}

impl Default for VolumeScale {
    fn default() -> Self {
        Self {
            hardware_min: 0,
            hardware_max: 127,
            volume_min: 0.0,
            volume_max: 1.0,
            reverse: false,
        }
    }
}

impl VolumeScale {
    pub fn clamp(&self, value: u8) -> u8 {
        value.clamp(self.hardware_min, self.hardware_max.max(self.hardware_min))
    }

    /// Position of `value` inside the hardware range, in `[0, 1]`.
    ///
    /// A zero-width range acts as a switch and always yields 1.
    pub fn normalize(&self, value: u8) -> f32 {
        let clamped = self.clamp(value);
        let span = self.hardware_max.saturating_sub(self.hardware_min);
        if span == 0 {
            return 1.0;
        }
        f32::from(clamped - self.hardware_min) / f32::from(span)
    }

    /// Final volume level for `value`, always inside `[volume_min, volume_max]`.
    pub fn level(&self, value: u8) -> f32 {
        let scaled = self.volume_min + self.normalize(value) * (self.volume_max - self.volume_min);
        let level = if self.reverse {
            self.volume_min + self.volume_max - scaled
        } else {
            scaled
        };
        level.clamp(self.volume_min.min(self.volume_max), self.volume_max.max(self.volume_min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scale(hardware_min: u8, hardware_max: u8, volume_min: f32, volume_max: f32) -> VolumeScale {
        VolumeScale {
            hardware_min,
            hardware_max,
            volume_min,
            volume_max,
            reverse: false,
        }
    }

    #[test]
    fn endpoints_map_to_output_bounds() {
        let s = scale(10, 100, 0.2, 0.8);
        assert_relative_eq!(s.level(10), 0.2);
        assert_relative_eq!(s.level(100), 0.8);
    }

    #[test]
    fn every_in_range_value_stays_in_output_range() {
        let s = scale(5, 120, 0.1, 0.9);
        for v in 5..=120u8 {
            let level = s.level(v);
            assert!((0.1..=0.9).contains(&level), "value {} gave {}", v, level);
        }
    }

    #[test]
    fn default_range_midpoint() {
        let s = VolumeScale::default();
        assert_relative_eq!(s.level(64), 64.0 / 127.0, epsilon = 1e-6);
        assert_relative_eq!(s.level(64), 0.504, epsilon = 1e-3);
    }

    #[test]
    fn values_outside_range_are_clamped() {
        let s = scale(20, 100, 0.0, 1.0);
        assert_eq!(s.clamp(0), 20);
        assert_eq!(s.clamp(127), 100);
        assert_relative_eq!(s.level(0), 0.0);
        assert_relative_eq!(s.level(127), 1.0);
    }

    #[test]
    fn reverse_mirrors_inside_output_range() {
        let forward = scale(0, 127, 0.25, 0.75);
        let reversed = VolumeScale {
            reverse: true,
            ..forward
        };
        for v in 0..=127u8 {
            assert_relative_eq!(
                reversed.level(v),
                0.25 + 0.75 - forward.level(v),
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn reverse_zero_is_full_volume() {
        let s = VolumeScale {
            reverse: true,
            ..VolumeScale::default()
        };
        assert_relative_eq!(s.level(0), 1.0);
        assert_relative_eq!(s.level(127), 0.0);
    }

    #[test]
    fn zero_width_range_acts_as_switch() {
        let s = scale(64, 64, 0.0, 0.3);
        assert_relative_eq!(s.level(0), 0.3);
        assert_relative_eq!(s.level(127), 0.3);
    }
}
