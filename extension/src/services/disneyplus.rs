use super::Service;
use crate::dom;

use web_sys::{Element, HtmlVideoElement};

const PLAYER_SELECTOR: &str = "#hudson-wrapper, disney-web-player";
const SLIDER_SELECTOR: &str = "[role=\"slider\"].progress-bar, .slider-container [role=\"slider\"]";
const TIMELINE_SELECTOR: &str = ".slider-container, .progress-bar__seekable-range";

/// Disney+. The media element is fed through MSE and its clock counts
/// buffer time, so content time and duration come from the progress slider
/// instead. While the controls are faded out the slider attributes are
/// stale or absent and both readers return nothing.
///
/// The player also moves the slider to the destination a frame before the
/// `seeking` event fires, and auto-resumes within a few hundred
/// milliseconds of becoming playable.
pub struct DisneyPlus;

impl DisneyPlus {
    fn slider(&self, player: &Element) -> Option<Element> {
        dom::query_under(player, SLIDER_SELECTOR)
    }
}

impl Service for DisneyPlus {
    fn name(&self) -> &'static str {
        "disneyplus"
    }

    fn player(&self) -> Option<Element> {
        dom::query_deep(PLAYER_SELECTOR)
    }

    fn video(&self, player: &Element) -> Option<HtmlVideoElement> {
        dom::videos_under(player).into_iter().next()
    }

    fn buffer_relative_clock(&self) -> bool {
        true
    }

    fn authoritative_time(&self, player: &Element, _video: &HtmlVideoElement) -> Option<f64> {
        let slider = self.slider(player)?;
        dom::numeric_attribute(&slider, "aria-valuenow")
    }

    fn authoritative_duration(&self, player: &Element, _video: &HtmlVideoElement) -> Option<f64> {
        let slider = self.slider(player)?;
        dom::numeric_attribute(&slider, "aria-valuemax").filter(|d| *d > 0.0)
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
            tracing::debug!("Disney+ timeline not found");
            return false;
        };
        dom::click_timeline_at(&timeline, time / duration)
    }

    fn load_time_capture_delay_ms(&self) -> Option<f64> {
        // Resumes almost immediately; a full second would let the resume
        // seek spill into the settling phase on slow pages.
        Some(600.0)
    }
}
