use anyhow::Error as AnyError;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlVideoElement, MouseEvent, MouseEventInit, ShadowRoot};

/// Turns a `JsValue` error into an `anyhow` one, stringifying whatever the
/// browser handed back (errors from the DOM are arbitrary JS values).
pub fn wrap_jserror(context: &'static str, value: JsValue) -> AnyError {
    let detail = js_sys::JSON::stringify(&value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_else(|| "[opaque JS error]".to_string());
    AnyError::msg(detail).context(context)
}

/// querySelector over the whole document, descending into open shadow roots
/// when the plain lookup comes up empty. Streaming players increasingly hide
/// their controls behind shadow boundaries.
pub fn query_deep(selector: &str) -> Option<Element> {
    let doc = gloo_utils::document();
    if let Ok(Some(el)) = doc.query_selector(selector) {
        return Some(el);
    }
    let all = doc.query_selector_all("*").ok()?;
    for i in 0..all.length() {
        let Some(node) = all.get(i) else { continue };
        let Some(el) = node.dyn_ref::<Element>() else {
            continue;
        };
        if let Some(root) = el.shadow_root() {
            if let Some(found) = query_shadow(&root, selector) {
                return Some(found);
            }
        }
    }
    None
}

/// Scoped variant of [`query_deep`], searching under `root` only.
pub fn query_under(root: &Element, selector: &str) -> Option<Element> {
    if let Ok(Some(el)) = root.query_selector(selector) {
        return Some(el);
    }
    let all = root.query_selector_all("*").ok()?;
    for i in 0..all.length() {
        let Some(node) = all.get(i) else { continue };
        let Some(el) = node.dyn_ref::<Element>() else {
            continue;
        };
        if let Some(shadow) = el.shadow_root() {
            if let Some(found) = query_shadow(&shadow, selector) {
                return Some(found);
            }
        }
    }
    None
}

fn query_shadow(root: &ShadowRoot, selector: &str) -> Option<Element> {
    if let Ok(Some(el)) = root.query_selector(selector) {
        return Some(el);
    }
    let all = root.query_selector_all("*").ok()?;
    for i in 0..all.length() {
        let Some(node) = all.get(i) else { continue };
        let Some(el) = node.dyn_ref::<Element>() else {
            continue;
        };
        if let Some(nested) = el.shadow_root() {
            if let Some(found) = query_shadow(&nested, selector) {
                return Some(found);
            }
        }
    }
    None
}

/// All `<video>` elements under `root`, shadow roots included.
pub fn videos_under(root: &Element) -> Vec<HtmlVideoElement> {
    let mut out = Vec::new();
    collect_videos_element(root, &mut out);
    out
}

fn collect_videos_element(root: &Element, out: &mut Vec<HtmlVideoElement>) {
    if let Ok(list) = root.query_selector_all("video") {
        for i in 0..list.length() {
            if let Some(v) = list.get(i).and_then(|n| n.dyn_into().ok()) {
                out.push(v);
            }
        }
    }
    if let Ok(all) = root.query_selector_all("*") {
        for i in 0..all.length() {
            let Some(node) = all.get(i) else { continue };
            if let Some(shadow) = node.dyn_ref::<Element>().and_then(|el| el.shadow_root()) {
                collect_videos_shadow(&shadow, out);
            }
        }
    }
}

fn collect_videos_shadow(root: &ShadowRoot, out: &mut Vec<HtmlVideoElement>) {
    if let Ok(list) = root.query_selector_all("video") {
        for i in 0..list.length() {
            if let Some(v) = list.get(i).and_then(|n| n.dyn_into().ok()) {
                out.push(v);
            }
        }
    }
    if let Ok(all) = root.query_selector_all("*") {
        for i in 0..all.length() {
            let Some(node) = all.get(i) else { continue };
            if let Some(nested) = node.dyn_ref::<Element>().and_then(|el| el.shadow_root()) {
                collect_videos_shadow(&nested, out);
            }
        }
    }
}

/// Dispatches a full synthetic click (down, up, click) at the center of the
/// element. Players that ignore plain `click()` still honor this.
pub fn synthesize_click(el: &Element) -> Result<(), AnyError> {
    let rect = el.get_bounding_client_rect();
    let x = rect.left() + rect.width() / 2.0;
    let y = rect.top() + rect.height() / 2.0;
    click_at(el, x, y)
}

/// Dispatches a synthetic click on `el` at the given viewport coordinates.
pub fn click_at(el: &Element, client_x: f64, client_y: f64) -> Result<(), AnyError> {
    for event_type in ["mousedown", "mouseup", "click"] {
        let init = MouseEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_client_x(client_x as i32);
        init.set_client_y(client_y as i32);
        let event = MouseEvent::new_with_mouse_event_init_dict(event_type, &init)
            .map_err(|e| wrap_jserror("couldn't build synthetic mouse event", e))?;
        el.dispatch_event(&event)
            .map_err(|e| wrap_jserror("couldn't dispatch synthetic mouse event", e))?;
    }
    Ok(())
}

/// Clicks the rendered timeline at the given fraction of its width. Returns
/// false when the timeline has no usable box to click on.
pub fn click_timeline_at(timeline: &Element, fraction: f64) -> bool {
    let rect = timeline.get_bounding_client_rect();
    if rect.width() <= 0.0 {
        return false;
    }
    let fraction = fraction.clamp(0.0, 1.0);
    let x = rect.left() + rect.width() * fraction;
    let y = rect.top() + rect.height() / 2.0;
    match click_at(timeline, x, y) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Timeline click failed: {:?}", e);
            false
        }
    }
}

/// Reads a numeric attribute such as `aria-valuenow` off a progress slider.
pub fn numeric_attribute(el: &Element, name: &str) -> Option<f64> {
    el.get_attribute(name)?.parse().ok()
}
