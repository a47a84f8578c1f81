use super::Service;
use crate::dom;

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlVideoElement};

/// Fallback recipe for hosts without a dedicated one. The element clock is
/// trusted and the first real video on the page is taken as the player.
pub struct Generic;

impl Service for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn player(&self) -> Option<Element> {
        gloo_utils::document().body().map(|b| b.unchecked_into())
    }

    fn video(&self, player: &Element) -> Option<HtmlVideoElement> {
        // Skip thumbnail-preview videos; anything without a box is not the
        // main player.
        dom::videos_under(player)
            .into_iter()
            .max_by_key(|v| v.client_width())
            .filter(|v| v.client_width() > 0)
    }
}
