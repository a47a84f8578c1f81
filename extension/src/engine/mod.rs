//! The platform-free core of the position tracker.
//!
//! Everything in here is driven by the DOM layer: it feeds in millisecond
//! timestamps, per-frame position samples and the video's `seeking`/`seeked`
//! events, and reads back what to do. No module below touches the browser,
//! which is what lets the whole behavior run under plain `cargo test`.

pub mod classifier;
pub mod history;
pub mod sampler;

use classifier::{classify, ClassifierState, SeekClass};
use history::{PositionHistory, RecordOutcome, SeekSource};
use sampler::SamplerState;

use common::EngineConfig;

/// Lifecycle of one attached video.
///
/// `Fresh` until the video first becomes playable, then a short window in
/// which a service auto-resume may still supply the resume point, then a
/// settling pause, and only after that are seeks tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingPhase {
    Fresh,
    CaptureOpen,
    Settling,
    Tracking,
}

/// State machine for one video element. Created on attach, dropped on
/// detach; nothing survives a video swap.
#[derive(Debug)]
pub struct Engine {
    cfg: EngineConfig,
    playable_since: Option<f64>,
    sampler: SamplerState,
    classifier: ClassifierState,
    history: PositionHistory,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Engine {
        Engine {
            history: PositionHistory::new(cfg.clone()),
            cfg,
            playable_since: None,
            sampler: SamplerState::default(),
            classifier: ClassifierState::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn phase(&self, now: f64) -> TrackingPhase {
        let Some(playable) = self.playable_since else {
            return TrackingPhase::Fresh;
        };
        if now < playable + self.cfg.load_time_capture_delay_ms {
            TrackingPhase::CaptureOpen
        } else if now
            < playable + self.cfg.load_time_capture_delay_ms + self.cfg.ready_for_tracking_delay_ms
        {
            TrackingPhase::Settling
        } else {
            TrackingPhase::Tracking
        }
    }

    pub fn capture_window_open(&self, now: f64) -> bool {
        self.phase(now) == TrackingPhase::CaptureOpen
    }

    pub fn ready_for_tracking(&self, now: f64) -> bool {
        self.phase(now) == TrackingPhase::Tracking
    }

    /// The video reached a playable state. Only the first call counts; later
    /// `canplay` events (every seek fires one) do not reopen the window.
    pub fn on_playable(&mut self, now: f64, playback: Option<f64>) {
        if self.playable_since.is_some() {
            return;
        }
        self.playable_since = Some(now);
        if let Some(t) = playback {
            self.sampler.prime(t, now);
        }
    }

    /// One display-frame tick.
    pub fn tick(&mut self, now: f64, playback: Option<f64>, element_seeking: bool) {
        let in_seek = element_seeking || self.classifier.any_mark();
        self.sampler
            .tick(now, playback, in_seek, self.cfg.stable_time_delay_ms);
        if self.capture_window_open(now) {
            if let Some(t) = playback {
                self.history.offer_load_time(t);
            }
        }
    }

    /// A `seeking` event. `playback` is whatever position is readable at that
    /// moment (on racing services already the destination); `element_clock`
    /// is the element's own reading, the fallback of last resort.
    pub fn on_seeking(
        &mut self,
        now: f64,
        playback: Option<f64>,
        element_clock: f64,
    ) -> Option<RecordOutcome> {
        match self.phase(now) {
            TrackingPhase::Fresh | TrackingPhase::Settling => None,
            TrackingPhase::CaptureOpen => {
                // The destination of an early seek is where the service put
                // the viewer back; that is the resume point, not history.
                if let Some(t) = playback {
                    self.history.offer_load_time(t);
                }
                None
            }
            TrackingPhase::Tracking => {
                if self.classifier.programmatic() {
                    return None;
                }
                let source = match classify(self.classifier.keyboard_or_button(), false) {
                    SeekClass::KeyboardOrButton => SeekSource::KeyboardOrButton,
                    SeekClass::TimelineClick => SeekSource::TimelineClick,
                    SeekClass::AutoResume => return None,
                };
                let origin = self.pre_seek_position(playback, element_clock);
                Some(self.history.record_seek(origin, now, source))
            }
        }
    }

    /// The position the current seek departed from. The stable reading is
    /// authoritative; everything after it is a progressively worse guess.
    fn pre_seek_position(&self, playback: Option<f64>, element_clock: f64) -> f64 {
        self.sampler
            .stable_time()
            .or(self.classifier.before_seek_hint())
            .or(self.sampler.last_known_time())
            .or(playback)
            .unwrap_or(element_clock)
    }

    pub fn on_seeked(&mut self) {
        self.classifier.on_seeked();
    }

    /// Arms the keyboard flag; the caller schedules the fallback timer with
    /// the returned epoch.
    pub fn mark_keyboard_seek(&mut self) -> u64 {
        self.classifier.mark_keyboard_or_button()
    }

    /// Arms the programmatic flag ahead of a restore, so the restore's own
    /// seek leaves no trace in history.
    pub fn mark_programmatic_seek(&mut self) -> u64 {
        self.classifier.mark_programmatic()
    }

    pub fn record_before_seek(&mut self, time: f64) {
        self.classifier.record_before_seek(time);
    }

    pub fn on_flag_timeout(&mut self, epoch: u64) -> bool {
        self.classifier.on_flag_timeout(epoch)
    }

    /// Saves the live position at the viewer's request. Uses the live
    /// reading, not the stable one: the viewer means "here", not half a
    /// second ago.
    pub fn save_manual(&mut self, now: f64, playback: Option<f64>) -> Option<RecordOutcome> {
        if !self.ready_for_tracking(now) {
            return None;
        }
        let t = playback.or(self.sampler.last_known_time())?;
        Some(self.history.record_manual(t, now))
    }

    /// Position for UI display. Never stale on services with a readable live
    /// clock, zero when nothing is known yet.
    pub fn display_time(&self, playback: Option<f64>) -> f64 {
        playback.or(self.sampler.last_known_time()).unwrap_or(0.0)
    }

    pub fn stable_time(&self) -> Option<f64> {
        self.sampler.stable_time()
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drives a fresh engine through playable + capture + settling starting
    /// from the top of the video (so no resume point is captured), then
    /// fast-forwards the steady position to `position`. The stable reading
    /// is freshly updated at the returned timestamp.
    fn ready_engine(position: f64) -> (Engine, f64) {
        let mut e = Engine::new(EngineConfig::default());
        e.on_playable(0.0, Some(0.0));
        let mut now = 0.0;
        while now < 2_000.0 {
            now += 16.0;
            e.tick(now, Some(0.0), false);
        }
        now += 500.0;
        e.tick(now, Some(position), false);
        assert!(e.ready_for_tracking(now));
        assert_eq!(e.stable_time(), Some(position));
        assert_eq!(e.history().load_time_position(), None);
        (e, now)
    }

    #[test]
    fn phases_advance_on_schedule() {
        let mut e = Engine::new(EngineConfig::default());
        assert_eq!(e.phase(0.0), TrackingPhase::Fresh);
        e.on_playable(100.0, Some(0.0));
        assert_eq!(e.phase(100.0), TrackingPhase::CaptureOpen);
        assert_eq!(e.phase(1_099.0), TrackingPhase::CaptureOpen);
        assert_eq!(e.phase(1_100.0), TrackingPhase::Settling);
        assert_eq!(e.phase(1_599.0), TrackingPhase::Settling);
        assert_eq!(e.phase(1_600.0), TrackingPhase::Tracking);
    }

    #[test]
    fn playable_is_latched_once() {
        let mut e = Engine::new(EngineConfig::default());
        e.on_playable(0.0, Some(10.0));
        // A seek fires canplay again much later; the window must not reopen.
        e.on_playable(30_000.0, Some(900.0));
        assert!(e.ready_for_tracking(30_000.0));
    }

    #[test]
    fn rapid_keyboard_seeks_record_only_the_origin() {
        let (mut e, t0) = ready_engine(150.0);
        let mut pos = 150.0;
        for i in 0..20 {
            let now = t0 + i as f64 * 150.0;
            e.mark_keyboard_seek();
            e.on_seeking(now + 1.0, Some(pos + 4.0), pos + 4.0);
            pos += 4.0;
            e.on_seeked();
            e.tick(now + 10.0, Some(pos), false);
        }
        assert_eq!(e.history().len(), 1);
        assert_eq!(e.history().entries().next().unwrap().time, 150.0);
    }

    #[test]
    fn every_timeline_click_is_saved() {
        let (mut e, t0) = ready_engine(150.0);
        let mut src = 150.0;
        for i in 0..5 {
            let now = t0 + (i + 1) as f64 * 500.0;
            let dst = src + 75.0;
            assert_eq!(
                e.on_seeking(now, Some(dst), dst),
                Some(RecordOutcome::Saved)
            );
            e.on_seeked();
            e.tick(now + 16.0, Some(dst), false);
            src = dst;
        }
        let times: Vec<f64> = e.history().entries().map(|e| e.time).collect();
        assert_eq!(times, vec![150.0, 225.0, 300.0, 375.0, 450.0]);
    }

    #[test]
    fn indicator_racing_ahead_of_the_seek_event_does_not_poison_the_save() {
        let (mut e, t0) = ready_engine(1_350.0);
        // The progress indicator jumps to the destination one frame before
        // the seek event is observable.
        e.tick(t0 + 16.0, Some(3_700.0), false);
        assert_eq!(
            e.on_seeking(t0 + 32.0, Some(3_700.0), 3_700.0),
            Some(RecordOutcome::Saved)
        );
        assert_eq!(e.history().entries().next().unwrap().time, 1_350.0);
    }

    #[test]
    fn auto_resume_sets_the_resume_point_and_records_nothing() {
        let mut e = Engine::new(EngineConfig::default());
        e.on_playable(0.0, Some(0.0));
        e.tick(100.0, Some(0.0), false);
        e.on_seeking(200.0, Some(515.0), 515.0);
        e.on_seeked();
        assert_eq!(e.history().load_time_position(), Some(515.0));
        assert_eq!(e.history().len(), 0);

        // The viewer watches on to 615s, then clicks the timeline.
        let mut now = 250.0;
        let mut pos = 515.0;
        while pos < 615.0 {
            now += 16.0;
            pos += 0.016;
            e.tick(now, Some(pos), false);
        }
        assert_eq!(
            e.on_seeking(now + 16.0, Some(800.0), 800.0),
            Some(RecordOutcome::Saved)
        );
        assert_eq!(e.history().len(), 1);
        let saved = e.history().entries().next().unwrap().time;
        assert!((saved - 615.0).abs() < 1.0, "saved {saved}");
        assert_eq!(e.history().load_time_position(), Some(515.0));
    }

    #[test]
    fn seeks_during_settling_are_invisible() {
        let mut e = Engine::new(EngineConfig::default());
        e.on_playable(0.0, Some(500.0));
        assert_eq!(e.on_seeking(1_200.0, Some(800.0), 800.0), None);
        assert_eq!(e.history().len(), 0);
        assert_eq!(e.history().load_time_position(), None);
    }

    #[test]
    fn lost_seeked_event_falls_back_to_the_timer() {
        let (mut e, t0) = ready_engine(300.0);
        let epoch = e.mark_keyboard_seek();
        assert_eq!(
            e.on_seeking(t0 + 10.0, Some(340.0), 340.0),
            Some(RecordOutcome::Saved)
        );
        // No seeked arrives. While the flag is armed the stable reading
        // stays frozen.
        e.tick(t0 + 1_000.0, Some(340.0), false);
        assert_eq!(e.stable_time(), Some(300.0));
        assert!(e.on_flag_timeout(epoch));
        e.tick(t0 + 2_100.0, Some(340.0), false);
        assert_eq!(e.stable_time(), Some(340.0));
        // Well inside the debounce window, yet the next click saves: it is
        // classified as a timeline click, not a keyboard seek.
        assert_eq!(
            e.on_seeking(t0 + 2_510.0, Some(500.0), 500.0),
            Some(RecordOutcome::Saved)
        );
        assert_eq!(e.history().len(), 2);
    }

    #[test]
    fn stable_reading_survives_the_seeked_edge() {
        let (mut e, t0) = ready_engine(100.0);
        e.mark_keyboard_seek();
        e.on_seeking(t0 + 10.0, Some(400.0), 400.0);
        e.tick(t0 + 600.0, Some(400.0), true);
        e.on_seeked();
        // Immediately after the seek lands, before any further tick, the
        // stable reading still holds the origin.
        assert_eq!(e.stable_time(), Some(100.0));
    }

    #[test]
    fn restore_seek_leaves_no_trace() {
        let (mut e, t0) = ready_engine(900.0);
        e.mark_programmatic_seek();
        assert_eq!(e.on_seeking(t0 + 10.0, Some(1_800.0), 1_800.0), None);
        e.on_seeked();
        assert_eq!(e.history().len(), 0);
    }

    #[test]
    fn hint_stands_in_when_no_sample_was_ever_taken() {
        let mut e = Engine::new(EngineConfig::default());
        e.on_playable(0.0, None);
        let mut now = 0.0;
        while now < 2_000.0 {
            now += 16.0;
            e.tick(now, None, false);
        }
        e.record_before_seek(250.0);
        e.mark_keyboard_seek();
        assert_eq!(
            e.on_seeking(now + 10.0, None, 3.0),
            Some(RecordOutcome::Saved)
        );
        assert_eq!(e.history().entries().next().unwrap().time, 250.0);
    }

    #[test]
    fn manual_save_takes_the_live_position() {
        let (mut e, t0) = ready_engine(150.0);
        // The live reading has moved past the stable one.
        e.tick(t0 + 16.0, Some(150.4), false);
        assert_eq!(
            e.save_manual(t0 + 20.0, Some(150.4)),
            Some(RecordOutcome::Saved)
        );
        assert_eq!(e.history().entries().next().unwrap().time, 150.4);
    }

    #[test]
    fn manual_save_waits_for_tracking() {
        let mut e = Engine::new(EngineConfig::default());
        e.on_playable(0.0, Some(100.0));
        assert_eq!(e.save_manual(500.0, Some(100.0)), None);
        assert_eq!(e.history().len(), 0);
    }

    #[test]
    fn display_time_prefers_the_live_reading() {
        let (mut e, t0) = ready_engine(60.0);
        assert_eq!(e.display_time(Some(61.0)), 61.0);
        e.tick(t0 + 16.0, Some(62.0), false);
        assert_eq!(e.display_time(None), 62.0);
        let fresh = Engine::new(EngineConfig::default());
        assert_eq!(fresh.display_time(None), 0.0);
    }
}
