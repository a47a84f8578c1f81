use super::{SeekButtons, Service};
use crate::dom;

use web_sys::{Element, HtmlVideoElement};

const PLAYER_SELECTOR: &str = ".watch-video";
const TIMELINE_SELECTOR: &str = "[data-uia=\"timeline-bar\"], .timeline-bar";
const BACK_BUTTON: &str = "[data-uia=\"control-back10\"]";
const FORWARD_BUTTON: &str = "[data-uia=\"control-forward10\"]";

/// Netflix. The element clock reads content time, but direct writes to it
/// are throttled by the player, so relative seeks go through the native
/// 10-second skip buttons and absolute seeks through the timeline.
pub struct Netflix;

impl Service for Netflix {
    fn name(&self) -> &'static str {
        "netflix"
    }

    fn player(&self) -> Option<Element> {
        dom::query_deep(PLAYER_SELECTOR)
    }

    fn video(&self, player: &Element) -> Option<HtmlVideoElement> {
        dom::videos_under(player).into_iter().next()
    }

    fn seek_by_delta(&self, player: &Element, _video: &HtmlVideoElement, delta: f64) -> bool {
        // The native step is 10s regardless of the requested magnitude.
        let selector = if delta < 0.0 { BACK_BUTTON } else { FORWARD_BUTTON };
        let Some(button) = dom::query_under(player, selector) else {
            tracing::debug!("Netflix skip button not found: {selector}");
            return false;
        };
        dom::synthesize_click(&button).is_ok()
    }

    fn seek_to_time(
        &self,
        player: &Element,
        _video: &HtmlVideoElement,
        time: f64,
        duration: Option<f64>,
    ) -> bool {
        let Some(duration) = duration.filter(|d| *d > 0.0) else {
            return false;
        };
        let Some(timeline) = dom::query_under(player, TIMELINE_SELECTOR) else {
            tracing::debug!("Netflix timeline bar not found");
            return false;
        };
        dom::click_timeline_at(&timeline, time / duration)
    }

    fn seek_buttons(&self, player: &Element) -> Option<SeekButtons> {
        Some(SeekButtons {
            backward: dom::query_under(player, BACK_BUTTON)?,
            forward: dom::query_under(player, FORWARD_BUTTON)?,
        })
    }
}
