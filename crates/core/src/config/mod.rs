use serde::{Deserialize, Serialize};

use crate::Result;

/// Target simulation cadence in steps per second.
pub const DEFAULT_STEPS_PER_SECOND: f32 = 60.0;

/// Top-level configuration for the overlay subsystem.
///
/// Mirrors the narrow inputs the surrounding application feeds the
/// compositor: the effects toggle, the selected effect identifier, and the
/// playback session the audio tap follows. The effect is kept as a raw
/// string on purpose — unknown identifiers are valid input and resolve to
/// "none" at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub effect: String,
    /// Overrides the catalog's per-effect particle count when set.
    pub particle_count: Option<usize>,
    pub steps_per_second: f32,
    /// Playback session the audio tap follows; ≤ 0 means no audio.
    pub session_id: i32,
    /// Seed for the particle random source. Fixed seeds make runs
    /// reproducible; `None` lets the compositor pick one.
    pub seed: Option<u64>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            effect: "none".to_string(),
            particle_count: None,
            steps_per_second: DEFAULT_STEPS_PER_SECOND,
            session_id: 0,
            seed: None,
        }
    }
}

impl OverlayConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = OverlayConfig::default();
        assert!(config.enabled);
        assert_eq!(config.effect, "none");
        assert_eq!(config.steps_per_second, DEFAULT_STEPS_PER_SECOND);
        assert!(config.particle_count.is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let mut config = OverlayConfig::default();
        config.effect = "snow".to_string();
        config.particle_count = Some(120);
        config.session_id = 4;

        let json = config.to_json().unwrap();
        let back = OverlayConfig::from_json(&json).unwrap();
        assert_eq!(back.effect, "snow");
        assert_eq!(back.particle_count, Some(120));
        assert_eq!(back.session_id, 4);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(OverlayConfig::from_json("{ not json").is_err());
    }
}
