use crate::services::Service;

use web_sys::{Element, HtmlVideoElement};

/// `readyState` value from which the element can actually play.
const HAVE_FUTURE_DATA: u16 = 3;

/// The live video element together with the player root it was found under,
/// carrying the derived time readers. One of these exists per attachment;
/// a video swap during an in-page navigation builds a fresh one. Clones
/// share the same underlying DOM handles.
#[derive(Clone)]
pub struct AugmentedVideo {
    player: Element,
    element: HtmlVideoElement,
}

impl AugmentedVideo {
    pub fn new(player: Element, element: HtmlVideoElement) -> AugmentedVideo {
        AugmentedVideo { player, element }
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.element
    }

    pub fn player(&self) -> &Element {
        &self.player
    }

    /// Whether `other` is the very element this accessor is attached to.
    pub fn is_same_element(&self, other: &HtmlVideoElement) -> bool {
        js_sys::Object::is(self.element.as_ref(), other.as_ref())
    }

    pub fn is_playable(&self) -> bool {
        self.element.ready_state() >= HAVE_FUTURE_DATA
    }

    pub fn is_seeking(&self) -> bool {
        self.element.seeking()
    }

    /// The live content time. On services with a buffer-relative element
    /// clock this is the service's own reading and may be momentarily
    /// unreadable; everywhere else it is the element clock.
    pub fn playback_time(&self, service: &dyn Service) -> Option<f64> {
        if service.buffer_relative_clock() {
            service.authoritative_time(&self.player, &self.element)
        } else {
            Some(self.element.current_time())
        }
    }

    /// Content duration, if anything trustworthy is available.
    pub fn duration(&self, service: &dyn Service) -> Option<f64> {
        if let Some(d) = service.authoritative_duration(&self.player, &self.element) {
            return Some(d);
        }
        if service.buffer_relative_clock() {
            // The element's duration is buffer-sized; of no use here.
            return None;
        }
        Some(self.element.duration()).filter(|d| d.is_finite() && *d > 0.0)
    }

    /// Relative fallback seek: shifts the element's own clock. Works even on
    /// buffer-relative clocks, where an absolute content time would not.
    pub fn nudge_clock(&self, delta: f64) {
        self.write_clock(self.element.current_time() + delta);
    }

    /// Writes the element clock, clamped into the playable range. The write
    /// is meaningless on buffer-relative elements; callers check the clock
    /// kind before relying on this.
    pub fn write_clock(&self, time: f64) {
        let upper = self.element.duration();
        let clamped = if upper.is_finite() && upper > 0.0 {
            time.clamp(0.0, upper)
        } else {
            time.max(0.0)
        };
        self.element.set_current_time(clamped);
    }
}
