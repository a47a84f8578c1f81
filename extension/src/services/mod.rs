mod disneyplus;
mod generic;
mod netflix;
mod primevideo;

use web_sys::{Element, HtmlVideoElement};

pub use disneyplus::DisneyPlus;
pub use generic::Generic;
pub use netflix::Netflix;
pub use primevideo::PrimeVideo;

/// The rewind/forward controls a service renders natively. Clicks on these
/// are classified the same way as keyboard seeks.
pub struct SeekButtons {
    pub backward: Element,
    pub forward: Element,
}

/// One per-site recipe. Everything beyond locating the player and the video
/// is an optional capability: a default of `None`/`false` means "not
/// provided", and every fallback lives with the caller, never here.
pub trait Service {
    fn name(&self) -> &'static str;

    /// The current player root, or `None` while the page is still loading or
    /// an in-page navigation is in flight.
    fn player(&self) -> Option<Element>;

    /// The active media element under `player`. Recipes must disambiguate
    /// when several candidates exist (ad pre-rolls, thumbnail previews).
    fn video(&self, player: &Element) -> Option<HtmlVideoElement>;

    /// True when the element's own clock counts buffer time rather than
    /// content time. Such services must also implement [`authoritative_time`]
    /// so the caller has something better to read.
    ///
    /// [`authoritative_time`]: Service::authoritative_time
    fn buffer_relative_clock(&self) -> bool {
        false
    }

    /// Content time in seconds read from the service's own UI, or `None`
    /// when it cannot be read right now (controls faded out, for instance).
    fn authoritative_time(&self, player: &Element, video: &HtmlVideoElement) -> Option<f64> {
        let _ = (player, video);
        None
    }

    /// Content duration in seconds, same caveats as [`Service::authoritative_time`].
    fn authoritative_duration(&self, player: &Element, video: &HtmlVideoElement) -> Option<f64> {
        let _ = (player, video);
        None
    }

    /// Relative seek by `delta` seconds. Returning `false` means the recipe
    /// did not handle it and the caller should write the element clock.
    /// Recipes that click native skip buttons ignore the magnitude and jump
    /// by whatever the service's native step is.
    fn seek_by_delta(&self, player: &Element, video: &HtmlVideoElement, delta: f64) -> bool {
        let _ = (player, video, delta);
        false
    }

    /// Absolute seek to `time`. Returning `false` means the seek target
    /// could not be located; the caller treats that as a soft failure.
    fn seek_to_time(
        &self,
        player: &Element,
        video: &HtmlVideoElement,
        time: f64,
        duration: Option<f64>,
    ) -> bool {
        let _ = (player, video, time, duration);
        false
    }

    fn seek_buttons(&self, player: &Element) -> Option<SeekButtons> {
        let _ = player;
        None
    }

    /// Shorter capture window for services that auto-resume eagerly.
    fn load_time_capture_delay_ms(&self) -> Option<f64> {
        None
    }
}

/// Picks the recipe for the given host. Anything unrecognized gets the
/// generic element-clock recipe.
pub fn service_for_host(host: &str) -> Box<dyn Service> {
    if host_matches(host, "netflix.com") {
        Box::new(Netflix)
    } else if host_matches(host, "disneyplus.com") {
        Box::new(DisneyPlus)
    } else if host_matches(host, "primevideo.com") || host_matches(host, "amazon.com") {
        Box::new(PrimeVideo)
    } else {
        Box::new(Generic)
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_matching_requires_a_label_boundary() {
        assert!(host_matches("netflix.com", "netflix.com"));
        assert!(host_matches("www.netflix.com", "netflix.com"));
        assert!(!host_matches("notnetflix.com", "netflix.com"));
    }

    #[test]
    fn unknown_hosts_fall_back_to_the_generic_recipe() {
        assert_eq!(service_for_host("player.example.org").name(), "generic");
        assert_eq!(service_for_host("www.disneyplus.com").name(), "disneyplus");
        assert_eq!(service_for_host("www.primevideo.com").name(), "primevideo");
    }
}
