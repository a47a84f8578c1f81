use serde::{Deserialize, Serialize};

/// Tunables for the playback position tracker. The settings page serializes
/// this as JSON; unknown fields are rejected, missing fields fall back to the
/// defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Minimum distance, in seconds, between any two saved positions. Also
    /// the smallest position worth keeping as a resume point.
    pub seek_min_diff_seconds: f64,
    /// Window after a keyboard or skip-button save during which further
    /// keyboard saves are suppressed.
    pub seek_debounce_ms: f64,
    /// Upper bound on saved positions. The resume point is stored separately
    /// and does not count against this.
    pub seek_max_history: usize,
    /// How long after the video first becomes playable a resume point may
    /// still be captured. Services that auto-resume eagerly override this.
    pub load_time_capture_delay_ms: f64,
    /// Settling time after the capture window closes before seeks are
    /// tracked at all.
    pub ready_for_tracking_delay_ms: f64,
    /// Lag of the stable position reading behind the live one.
    pub stable_time_delay_ms: f64,
    /// Safety timeout clearing the keyboard-seek flag when the matching
    /// `seeked` event never arrives.
    pub keyboard_seek_flag_timeout_ms: f64,
    /// Same safety timeout, used while no video element is attached yet.
    pub detached_seek_flag_timeout_ms: f64,
    /// Step used by the arrow-key relative seek.
    pub seek_step_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            seek_min_diff_seconds: 15.0,
            seek_debounce_ms: 5_000.0,
            seek_max_history: 10,
            load_time_capture_delay_ms: 1_000.0,
            ready_for_tracking_delay_ms: 500.0,
            stable_time_delay_ms: 500.0,
            keyboard_seek_flag_timeout_ms: 2_000.0,
            detached_seek_flag_timeout_ms: 500.0,
            seek_step_seconds: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"seek_debounce_ms": 3000}"#).unwrap();
        assert_eq!(cfg.seek_debounce_ms, 3_000.0);
        assert_eq!(cfg.seek_max_history, 10);
        assert_eq!(cfg.seek_min_diff_seconds, 15.0);
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(serde_json::from_str::<EngineConfig>(r#"{"seek_debounce": 1}"#).is_err());
    }
}
