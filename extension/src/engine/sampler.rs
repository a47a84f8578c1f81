/// Maintains the two derived position readings for one video: the live value
/// seen on the most recent frame, and a deliberately stale copy of it.
///
/// The stale copy trails by `stable_time_delay_ms` and is frozen for the whole
/// duration of a seek. Some services move their progress indicator to the
/// destination a frame or two before the `seeking` event fires, so by the time
/// a seek is observed the live reading may already be poisoned; the stale copy
/// is what still holds the position the viewer actually left.
#[derive(Debug, Default)]
pub struct SamplerState {
    last_known_time: Option<f64>,
    stable_time: Option<f64>,
    last_stable_update: Option<f64>,
}

impl SamplerState {
    /// Seeds both readings at once. Used when attaching to a video that is
    /// already playable, so the stable reading is defined from the start.
    pub fn prime(&mut self, time: f64, now: f64) {
        self.last_known_time = Some(time);
        self.stable_time = Some(time);
        self.last_stable_update = Some(now);
    }

    /// One display-frame tick. `seek_in_progress` covers both the element's
    /// own `seeking` state and any armed seek flag.
    pub fn tick(&mut self, now: f64, playback: Option<f64>, seek_in_progress: bool, delay_ms: f64) {
        if let Some(t) = playback {
            self.last_known_time = Some(t);
        }
        if seek_in_progress {
            return;
        }
        let due = match self.last_stable_update {
            None => true,
            Some(at) => now - at >= delay_ms,
        };
        if due {
            if let Some(t) = self.last_known_time {
                self.stable_time = Some(t);
                self.last_stable_update = Some(now);
            }
        }
    }

    pub fn last_known_time(&self) -> Option<f64> {
        self.last_known_time
    }

    pub fn stable_time(&self) -> Option<f64> {
        self.stable_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: f64 = 500.0;

    #[test]
    fn prime_defines_both_readings() {
        let mut s = SamplerState::default();
        s.prime(150.0, 0.0);
        assert_eq!(s.last_known_time(), Some(150.0));
        assert_eq!(s.stable_time(), Some(150.0));
    }

    #[test]
    fn stable_reading_lags_by_the_configured_delay() {
        let mut s = SamplerState::default();
        s.prime(0.0, 0.0);
        s.tick(100.0, Some(0.1), false, DELAY);
        assert_eq!(s.stable_time(), Some(0.0));
        s.tick(499.0, Some(0.5), false, DELAY);
        assert_eq!(s.stable_time(), Some(0.0));
        s.tick(500.0, Some(0.5), false, DELAY);
        assert_eq!(s.stable_time(), Some(0.5));
    }

    #[test]
    fn stable_reading_is_frozen_while_a_seek_is_in_flight() {
        let mut s = SamplerState::default();
        s.prime(1_350.0, 0.0);
        // The service rewrites its indicator to the destination before the
        // seek is even observable, then the seek runs long past the lag.
        s.tick(600.0, Some(3_700.0), true, DELAY);
        s.tick(1_200.0, Some(3_700.0), true, DELAY);
        assert_eq!(s.last_known_time(), Some(3_700.0));
        assert_eq!(s.stable_time(), Some(1_350.0));
    }

    #[test]
    fn stable_reading_catches_up_after_the_seek_settles() {
        let mut s = SamplerState::default();
        s.prime(100.0, 0.0);
        s.tick(600.0, Some(300.0), true, DELAY);
        // Immediately after the seek completes the stale copy still holds
        // the pre-seek value.
        assert_eq!(s.stable_time(), Some(100.0));
        // The gate is long overdue, so the first calm tick catches up.
        s.tick(650.0, Some(300.2), false, DELAY);
        assert_eq!(s.stable_time(), Some(300.2));
    }

    #[test]
    fn first_tick_without_priming_takes_what_it_can() {
        let mut s = SamplerState::default();
        s.tick(0.0, None, false, DELAY);
        assert_eq!(s.stable_time(), None);
        s.tick(16.0, Some(42.0), false, DELAY);
        assert_eq!(s.stable_time(), Some(42.0));
    }
}
