use super::{SeekButtons, Service};
use crate::dom;

use web_sys::{Element, HtmlVideoElement};

const PLAYER_SELECTOR: &str = ".webPlayerSDKContainer, .webPlayerContainer";
const BACK_BUTTON: &str = ".fastSeekBack";
const FORWARD_BUTTON: &str = ".fastSeekForward";

/// `readyState` from which the element has at least loaded its metadata; an
/// inert pre-roll placeholder never gets this far.
const HAVE_METADATA: u16 = 1;

/// Prime Video. Keeps a hidden pre-roll `<video>` mounted next to the main
/// one, so picking "the" video means picking the widest element that
/// actually has a source attached.
pub struct PrimeVideo;

impl Service for PrimeVideo {
    fn name(&self) -> &'static str {
        "primevideo"
    }

    fn player(&self) -> Option<Element> {
        dom::query_deep(PLAYER_SELECTOR)
    }

    fn video(&self, player: &Element) -> Option<HtmlVideoElement> {
        dom::videos_under(player)
            .into_iter()
            .filter(|v| !v.src().is_empty() && v.ready_state() >= HAVE_METADATA)
            .max_by_key(|v| v.client_width())
    }

    fn seek_buttons(&self, player: &Element) -> Option<SeekButtons> {
        Some(SeekButtons {
            backward: dom::query_under(player, BACK_BUTTON)?,
            forward: dom::query_under(player, FORWARD_BUTTON)?,
        })
    }
}
