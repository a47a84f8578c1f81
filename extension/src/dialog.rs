use crate::dom::wrap_jserror;
use crate::engine::history::{PositionEntry, PositionKind};

use anyhow::Error as AnyError;
use gloo_timers::callback::Timeout;
use std::rc::Rc;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{HtmlElement, KeyboardEvent, MouseEvent};

const BANNER_DISMISS_MS: u32 = 4_000;

const DIALOG_STYLE: &str = "position: fixed; top: 16px; right: 16px; z-index: 2147483647; \
     background: rgba(20, 20, 20, 0.92); color: #eee; padding: 12px 16px; \
     border-radius: 6px; font: 14px/1.6 sans-serif; min-width: 220px;";
const TITLE_STYLE: &str = "font-weight: bold; margin-bottom: 6px;";
const ROW_STYLE: &str = "cursor: pointer; white-space: nowrap;";
const BANNER_STYLE: &str = "position: fixed; top: 16px; left: 50%; transform: translateX(-50%); \
     z-index: 2147483647; background: rgba(160, 30, 30, 0.95); color: #fff; \
     padding: 8px 14px; border-radius: 4px; font: 14px sans-serif;";

/// What a key press means to the open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    Close,
    Pick(usize),
}

/// Maps a `KeyboardEvent::code` to a dialog action. Everything unrecognized
/// propagates to the ordinary key bindings.
pub fn action_for_code(code: &str) -> Option<DialogAction> {
    if code == "Escape" {
        return Some(DialogAction::Close);
    }
    let digit = code
        .strip_prefix("Digit")
        .or_else(|| code.strip_prefix("Numpad"))?;
    let index: usize = digit.parse().ok().filter(|_| digit.len() == 1)?;
    Some(DialogAction::Pick(index))
}

/// The numbered list of saved positions, rendered as an overlay on the
/// host page. Key handling runs on the capture phase of the window's key
/// path so Escape is consumed before the page's own fullscreen handling
/// sees it.
pub struct RestoreDialog {
    root: HtmlElement,
    key_cb: Closure<dyn FnMut(KeyboardEvent)>,
    row_cbs: Vec<Closure<dyn FnMut(MouseEvent)>>,
}

impl RestoreDialog {
    pub fn open(
        entries: &[PositionEntry],
        on_pick: Rc<dyn Fn(usize)>,
        on_close: Rc<dyn Fn()>,
    ) -> Result<RestoreDialog, AnyError> {
        let document = gloo_utils::document();
        let root: HtmlElement = document
            .create_element("div")
            .map_err(|e| wrap_jserror("couldn't create dialog root", e))?
            .dyn_into()
            .expect("div is an HtmlElement");
        root.set_attribute("style", DIALOG_STYLE)
            .map_err(|e| wrap_jserror("couldn't style dialog", e))?;

        let title = document
            .create_element("div")
            .map_err(|e| wrap_jserror("couldn't create dialog title", e))?;
        title.set_attribute("style", TITLE_STYLE).ok();
        title.set_text_content(Some(if entries.is_empty() {
            "No saved positions yet"
        } else {
            "Jump back to"
        }));
        root.append_child(&title)
            .map_err(|e| wrap_jserror("couldn't attach dialog title", e))?;

        let mut row_cbs = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let row = document
                .create_element("div")
                .map_err(|e| wrap_jserror("couldn't create dialog row", e))?;
            row.set_attribute("style", ROW_STYLE).ok();
            row.set_text_content(Some(&row_label(index, entry)));

            let pick = on_pick.clone();
            let cb: Closure<dyn FnMut(MouseEvent)> = Closure::new(move |_: MouseEvent| pick(index));
            row.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
                .map_err(|e| wrap_jserror("couldn't wire dialog row", e))?;
            row_cbs.push(cb);

            root.append_child(&row)
                .map_err(|e| wrap_jserror("couldn't attach dialog row", e))?;
        }

        document
            .body()
            .ok_or_else(|| AnyError::msg("page has no body"))?
            .append_child(&root)
            .map_err(|e| wrap_jserror("couldn't attach dialog", e))?;

        let count = entries.len();
        let key_cb: Closure<dyn FnMut(KeyboardEvent)> = Closure::new(move |event: KeyboardEvent| {
            let Some(action) = action_for_code(&event.code()) else {
                return;
            };
            event.prevent_default();
            event.stop_propagation();
            match action {
                DialogAction::Close => on_close(),
                DialogAction::Pick(index) if index < count => on_pick(index),
                // A digit past the end of the list is swallowed, nothing else.
                DialogAction::Pick(_) => (),
            }
        });
        gloo_utils::window()
            .add_event_listener_with_callback_and_bool(
                "keydown",
                key_cb.as_ref().unchecked_ref(),
                true,
            )
            .map_err(|e| wrap_jserror("couldn't install dialog key handler", e))?;

        Ok(RestoreDialog {
            root,
            key_cb,
            row_cbs,
        })
    }

    /// Removes the overlay and its listeners. The closures themselves are
    /// dropped a tick later: dismissal is usually triggered from inside the
    /// key closure, which must not be destroyed mid-call.
    pub fn dismiss(self) {
        if let Err(e) = gloo_utils::window().remove_event_listener_with_callback_and_bool(
            "keydown",
            self.key_cb.as_ref().unchecked_ref(),
            true,
        ) {
            tracing::warn!("Could not remove dialog key handler: {:?}", e);
        }
        self.root.remove();
        let callbacks = (self.key_cb, self.row_cbs);
        Timeout::new(0, move || drop(callbacks)).forget();
    }
}

fn row_label(index: usize, entry: &PositionEntry) -> String {
    let key = if index <= 9 {
        format!("[{index}] ")
    } else {
        "    ".to_string()
    };
    let suffix = match entry.kind {
        PositionKind::LoadTime => " · resume point",
        PositionKind::Manual => " · saved",
        PositionKind::Seek => "",
    };
    format!("{key}{}{suffix}", format_time(entry.time))
}

/// `H:MM:SS`, hours omitted while they are zero.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Transient failure notice, for when a restore target cannot be reached.
pub fn show_banner(text: &str) {
    let document = gloo_utils::document();
    let banner = match document.create_element("div") {
        Ok(el) => el,
        Err(e) => {
            tracing::warn!("Could not create banner: {:?}", e);
            return;
        }
    };
    banner.set_attribute("style", BANNER_STYLE).ok();
    banner.set_text_content(Some(text));
    let Some(body) = document.body() else {
        return;
    };
    if let Err(e) = body.append_child(&banner) {
        tracing::warn!("Could not attach banner: {:?}", e);
        return;
    }
    Timeout::new(BANNER_DISMISS_MS, move || {
        banner.remove();
    })
    .forget();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_and_digits_are_dialog_keys() {
        assert_eq!(action_for_code("Escape"), Some(DialogAction::Close));
        assert_eq!(action_for_code("Digit0"), Some(DialogAction::Pick(0)));
        assert_eq!(action_for_code("Digit9"), Some(DialogAction::Pick(9)));
        assert_eq!(action_for_code("Numpad3"), Some(DialogAction::Pick(3)));
    }

    #[test]
    fn everything_else_propagates() {
        assert_eq!(action_for_code("ArrowRight"), None);
        assert_eq!(action_for_code("KeyH"), None);
        assert_eq!(action_for_code("Enter"), None);
        // Not a single digit
        assert_eq!(action_for_code("DigitX"), None);
        assert_eq!(action_for_code("NumpadAdd"), None);
    }

    #[test]
    fn times_format_like_a_clock() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(61.0), "1:01");
        assert_eq!(format_time(615.0), "10:15");
        assert_eq!(format_time(3_700.0), "1:01:40");
        assert_eq!(format_time(-5.0), "0:00");
    }
}
