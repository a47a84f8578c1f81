/// What kind of seek a `seeking` event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekClass {
    /// Keyboard or native skip button. Saved, subject to the debounce.
    KeyboardOrButton,
    /// Service-initiated resume shortly after load. Never saved; may still
    /// supply the resume point.
    AutoResume,
    /// A click on the rendered timeline. Saved, never debounced.
    TimelineClick,
}

/// All three origins surface as the same `seeking` event; the only telling
/// signals are the keyboard flag and whether the capture window is still open.
pub fn classify(keyboard_or_button: bool, capture_window_open: bool) -> SeekClass {
    match (keyboard_or_button, capture_window_open) {
        (true, _) => SeekClass::KeyboardOrButton,
        (false, true) => SeekClass::AutoResume,
        (false, false) => SeekClass::TimelineClick,
    }
}

/// Flag bookkeeping for seeks currently in flight.
///
/// Every mark bumps `epoch` and the platform layer arms a fresh fallback
/// timer carrying that epoch. A timer firing with a stale epoch is ignored,
/// which is what keeps a burst of key presses from having its flag cleared by
/// the first press's leftover timer.
#[derive(Debug, Default)]
pub struct ClassifierState {
    keyboard_or_button: bool,
    programmatic: bool,
    epoch: u64,
    before_seek_hint: Option<f64>,
}

impl ClassifierState {
    /// Arms the keyboard flag. Returns the epoch the caller's fallback timer
    /// must carry.
    pub fn mark_keyboard_or_button(&mut self) -> u64 {
        self.keyboard_or_button = true;
        self.epoch += 1;
        self.epoch
    }

    /// Arms the programmatic flag: the next seek is ours (a restore) and must
    /// not be recorded. Returns the epoch for the fallback timer.
    pub fn mark_programmatic(&mut self) -> u64 {
        self.programmatic = true;
        self.epoch += 1;
        self.epoch
    }

    /// A pre-seek position snapshot from the control layer, consulted only
    /// when the stable reading is missing.
    pub fn record_before_seek(&mut self, time: f64) {
        self.before_seek_hint = Some(time);
    }

    pub fn before_seek_hint(&self) -> Option<f64> {
        self.before_seek_hint
    }

    /// The matching `seeked` arrived; every in-flight mark is spent.
    pub fn on_seeked(&mut self) {
        self.clear();
    }

    /// A fallback timer fired. Only honored when no newer mark superseded it.
    pub fn on_flag_timeout(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.clear();
        true
    }

    fn clear(&mut self) {
        self.keyboard_or_button = false;
        self.programmatic = false;
        self.before_seek_hint = None;
        self.epoch += 1;
    }

    pub fn keyboard_or_button(&self) -> bool {
        self.keyboard_or_button
    }

    pub fn programmatic(&self) -> bool {
        self.programmatic
    }

    /// True while any mark is armed. The sampler freezes on this.
    pub fn any_mark(&self) -> bool {
        self.keyboard_or_button || self.programmatic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(classify(true, false), SeekClass::KeyboardOrButton);
        assert_eq!(classify(true, true), SeekClass::KeyboardOrButton);
        assert_eq!(classify(false, true), SeekClass::AutoResume);
        assert_eq!(classify(false, false), SeekClass::TimelineClick);
    }

    #[test]
    fn seeked_clears_the_flag() {
        let mut c = ClassifierState::default();
        c.mark_keyboard_or_button();
        assert!(c.keyboard_or_button());
        c.on_seeked();
        assert!(!c.keyboard_or_button());
    }

    #[test]
    fn stale_timer_cannot_clear_a_newer_mark() {
        let mut c = ClassifierState::default();
        let first = c.mark_keyboard_or_button();
        let second = c.mark_keyboard_or_button();
        assert!(!c.on_flag_timeout(first));
        assert!(c.keyboard_or_button());
        assert!(c.on_flag_timeout(second));
        assert!(!c.keyboard_or_button());
    }

    #[test]
    fn timer_armed_before_a_seeked_is_dead_afterwards() {
        let mut c = ClassifierState::default();
        let epoch = c.mark_keyboard_or_button();
        c.on_seeked();
        c.mark_keyboard_or_button();
        // The old timer firing late must not clear the new mark.
        assert!(!c.on_flag_timeout(epoch));
        assert!(c.keyboard_or_button());
    }

    #[test]
    fn hint_is_spent_with_the_seek() {
        let mut c = ClassifierState::default();
        c.record_before_seek(123.0);
        c.mark_keyboard_or_button();
        assert_eq!(c.before_seek_hint(), Some(123.0));
        c.on_seeked();
        assert_eq!(c.before_seek_hint(), None);
    }

    #[test]
    fn programmatic_mark_is_independent_of_the_keyboard_flag() {
        let mut c = ClassifierState::default();
        c.mark_programmatic();
        assert!(c.programmatic());
        assert!(!c.keyboard_or_button());
        assert!(c.any_mark());
        c.on_seeked();
        assert!(!c.any_mark());
    }
}
