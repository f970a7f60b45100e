//! Extruder configuration from TOML.

use serde::Deserialize;

/// Duty-cycle extruder configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtruderConfig {
    /// Every drive command is multiplied by this before clamping.
    #[serde(default = "default_extrude_modifier")]
    pub extrude_modifier: f32,

    /// Swap the H-bridge legs (reverses the motor).
    #[serde(default)]
    pub invert: bool,
}

fn default_extrude_modifier() -> f32 {
    0.6
}

impl ExtruderConfig {
    /// Create a config with the given modifier.
    pub fn new(extrude_modifier: f32) -> Self {
        Self {
            extrude_modifier,
            invert: false,
        }
    }

    /// Scale and clamp a requested duty cycle to [-1, 1].
    pub fn effective_duty(&self, requested: f32) -> f32 {
        (requested * self.extrude_modifier).clamp(-1.0, 1.0)
    }
}

impl Default for ExtruderConfig {
    fn default() -> Self {
        Self::new(default_extrude_modifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_duty_scales_then_clamps() {
        let config = ExtruderConfig::new(0.6);
        assert!((config.effective_duty(1.0) - 0.6).abs() < 1e-6);
        assert_eq!(config.effective_duty(0.0), 0.0);

        let hot = ExtruderConfig::new(2.0);
        assert_eq!(hot.effective_duty(0.9), 1.0);
        assert_eq!(hot.effective_duty(-0.9), -1.0);
    }
}
