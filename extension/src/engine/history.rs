use common::EngineConfig;

use std::collections::VecDeque;

/// How a saved position came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionKind {
    /// Where the video sat shortly after it first became playable. At most
    /// one of these exists, and it is displayed ahead of everything else.
    LoadTime,
    /// The position the viewer left behind with a seek.
    Seek,
    /// Saved explicitly with the save key.
    Manual,
}

/// One saved playback position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionEntry {
    /// Seconds from content start.
    pub time: f64,
    /// Millisecond timestamp of the save.
    pub saved_at: f64,
    pub kind: PositionKind,
}

/// Which control surface produced a recordable seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekSource {
    /// Keyboard or native skip button. Debounced.
    KeyboardOrButton,
    /// A click on the rendered timeline. Never debounced.
    TimelineClick,
}

/// What became of a save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Saved,
    /// Within `seek_min_diff_seconds` of a position already on file.
    TooClose,
    /// A keyboard save landed inside the debounce window.
    Debounced,
}

/// The saved positions for one attached video.
///
/// The resume point (`load_time_position`) is kept outside `entries` so that
/// eviction never touches it and it never counts against the cap.
#[derive(Debug)]
pub struct PositionHistory {
    entries: VecDeque<PositionEntry>,
    load_time_position: Option<f64>,
    /// Timestamp of the most recent successful save. Drives the keyboard
    /// debounce. Deliberately not advanced by suppressed attempts, so a
    /// held-down key collapses into the single save at the first press.
    last_seek_time: Option<f64>,
    cfg: EngineConfig,
}

impl PositionHistory {
    pub fn new(cfg: EngineConfig) -> PositionHistory {
        PositionHistory {
            entries: VecDeque::with_capacity(cfg.seek_max_history),
            load_time_position: None,
            last_seek_time: None,
            cfg,
        }
    }

    /// A position the video was observed at while the capture window was
    /// open. The first candidate past the minimum threshold sticks; starting
    /// from the very beginning is not a useful resume point.
    pub fn offer_load_time(&mut self, time: f64) -> bool {
        if self.load_time_position.is_some() || time < self.cfg.seek_min_diff_seconds {
            return false;
        }
        self.load_time_position = Some(time);
        true
    }

    /// Records the position a seek departed from.
    pub fn record_seek(&mut self, time: f64, now: f64, source: SeekSource) -> RecordOutcome {
        if self.too_close(time) {
            return RecordOutcome::TooClose;
        }
        if source == SeekSource::KeyboardOrButton {
            if let Some(last) = self.last_seek_time {
                if now - last < self.cfg.seek_debounce_ms {
                    return RecordOutcome::Debounced;
                }
            }
        }
        self.push(PositionEntry {
            time,
            saved_at: now,
            kind: PositionKind::Seek,
        });
        self.last_seek_time = Some(now);
        RecordOutcome::Saved
    }

    /// Records a position at the viewer's explicit request. Proximity
    /// rejection still applies; the debounce does not.
    pub fn record_manual(&mut self, time: f64, now: f64) -> RecordOutcome {
        if self.too_close(time) {
            return RecordOutcome::TooClose;
        }
        self.push(PositionEntry {
            time,
            saved_at: now,
            kind: PositionKind::Manual,
        });
        self.last_seek_time = Some(now);
        RecordOutcome::Saved
    }

    fn too_close(&self, time: f64) -> bool {
        self.entries
            .iter()
            .map(|e| e.time)
            .chain(self.load_time_position)
            .any(|existing| (existing - time).abs() < self.cfg.seek_min_diff_seconds)
    }

    fn push(&mut self, entry: PositionEntry) {
        if self.entries.len() >= self.cfg.seek_max_history {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.load_time_position.is_none()
    }

    pub fn load_time_position(&self) -> Option<f64> {
        self.load_time_position
    }

    pub fn entries(&self) -> impl Iterator<Item = &PositionEntry> {
        self.entries.iter()
    }

    /// The list the restore dialog shows: the resume point first when it
    /// exists, then saved positions newest first.
    pub fn display_list(&self) -> Vec<PositionEntry> {
        let mut list = Vec::with_capacity(self.entries.len() + 1);
        if let Some(t) = self.load_time_position {
            list.push(PositionEntry {
                time: t,
                saved_at: 0.0,
                kind: PositionKind::LoadTime,
            });
        }
        list.extend(self.entries.iter().rev().copied());
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> PositionHistory {
        PositionHistory::new(EngineConfig::default())
    }

    #[test]
    fn first_keyboard_save_is_not_debounced() {
        let mut h = history();
        assert_eq!(
            h.record_seek(150.0, 0.0, SeekSource::KeyboardOrButton),
            RecordOutcome::Saved
        );
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn keyboard_burst_collapses_to_one_save() {
        let mut h = history();
        // Twenty presses over three seconds, playback advancing ~4s per press.
        let mut pos = 150.0;
        let mut saved = 0;
        for i in 0..20 {
            let now = i as f64 * 150.0;
            if h.record_seek(pos, now, SeekSource::KeyboardOrButton) == RecordOutcome::Saved {
                saved += 1;
            }
            pos += 4.0;
        }
        assert_eq!(saved, 1);
        assert_eq!(h.len(), 1);
        assert_eq!(h.entries().next().unwrap().time, 150.0);
    }

    #[test]
    fn suppressed_attempts_do_not_extend_the_debounce_window() {
        let mut h = history();
        assert_eq!(
            h.record_seek(100.0, 0.0, SeekSource::KeyboardOrButton),
            RecordOutcome::Saved
        );
        // Keep pressing every 4.9s; the window is anchored at the first save,
        // so the attempt at 9.8s is past it.
        assert_eq!(
            h.record_seek(200.0, 4_900.0, SeekSource::KeyboardOrButton),
            RecordOutcome::Debounced
        );
        assert_eq!(
            h.record_seek(300.0, 9_800.0, SeekSource::KeyboardOrButton),
            RecordOutcome::Saved
        );
    }

    #[test]
    fn timeline_clicks_are_never_debounced() {
        let mut h = history();
        for (i, t) in [150.0, 225.0, 300.0, 375.0, 450.0].into_iter().enumerate() {
            assert_eq!(
                h.record_seek(t, i as f64 * 500.0, SeekSource::TimelineClick),
                RecordOutcome::Saved
            );
        }
        assert_eq!(h.len(), 5);
        let times: Vec<f64> = h.entries().map(|e| e.time).collect();
        assert_eq!(times, vec![150.0, 225.0, 300.0, 375.0, 450.0]);
    }

    #[test]
    fn near_duplicate_positions_are_rejected() {
        let mut h = history();
        assert_eq!(
            h.record_seek(100.0, 0.0, SeekSource::TimelineClick),
            RecordOutcome::Saved
        );
        assert_eq!(
            h.record_seek(110.0, 1_000.0, SeekSource::TimelineClick),
            RecordOutcome::TooClose
        );
        // Exactly the threshold apart is allowed.
        assert_eq!(
            h.record_seek(115.0, 2_000.0, SeekSource::TimelineClick),
            RecordOutcome::Saved
        );
    }

    #[test]
    fn proximity_also_applies_against_the_resume_point() {
        let mut h = history();
        assert!(h.offer_load_time(515.0));
        assert_eq!(
            h.record_seek(520.0, 0.0, SeekSource::TimelineClick),
            RecordOutcome::TooClose
        );
        assert_eq!(
            h.record_seek(615.0, 0.0, SeekSource::TimelineClick),
            RecordOutcome::Saved
        );
    }

    #[test]
    fn resume_point_is_set_at_most_once_and_never_below_threshold() {
        let mut h = history();
        assert!(!h.offer_load_time(3.0));
        assert_eq!(h.load_time_position(), None);
        assert!(h.offer_load_time(515.0));
        assert!(!h.offer_load_time(900.0));
        assert_eq!(h.load_time_position(), Some(515.0));
    }

    #[test]
    fn eviction_drops_the_oldest_and_spares_the_resume_point() {
        let mut h = history();
        assert!(h.offer_load_time(20.0));
        for i in 0..12 {
            let t = 100.0 + i as f64 * 50.0;
            assert_eq!(
                h.record_seek(t, i as f64, SeekSource::TimelineClick),
                RecordOutcome::Saved
            );
        }
        assert_eq!(h.len(), 10);
        // The two oldest seeks are gone, the resume point is not.
        assert_eq!(h.entries().next().unwrap().time, 200.0);
        assert_eq!(h.load_time_position(), Some(20.0));
    }

    #[test]
    fn manual_save_skips_the_debounce_but_not_proximity() {
        let mut h = history();
        assert_eq!(
            h.record_seek(100.0, 0.0, SeekSource::KeyboardOrButton),
            RecordOutcome::Saved
        );
        assert_eq!(h.record_manual(200.0, 100.0), RecordOutcome::Saved);
        assert_eq!(h.record_manual(205.0, 200.0), RecordOutcome::TooClose);
    }

    #[test]
    fn manual_save_anchors_the_debounce_window() {
        let mut h = history();
        assert_eq!(h.record_manual(100.0, 0.0), RecordOutcome::Saved);
        assert_eq!(
            h.record_seek(200.0, 1_000.0, SeekSource::KeyboardOrButton),
            RecordOutcome::Debounced
        );
    }

    #[test]
    fn display_list_puts_the_resume_point_first_then_newest() {
        let mut h = history();
        assert!(h.offer_load_time(500.0));
        h.record_seek(100.0, 0.0, SeekSource::TimelineClick);
        h.record_seek(200.0, 1.0, SeekSource::TimelineClick);
        h.record_manual(300.0, 2.0);
        let list = h.display_list();
        assert_eq!(list[0].kind, PositionKind::LoadTime);
        assert_eq!(list[0].time, 500.0);
        let rest: Vec<f64> = list[1..].iter().map(|e| e.time).collect();
        assert_eq!(rest, vec![300.0, 200.0, 100.0]);
    }
}
