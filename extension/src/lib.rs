//! Content layer giving streaming sites a keyboard-driven seek control and
//! a history of the positions the viewer jumped away from.

mod dialog;
mod dom;
pub mod engine;
mod handler;
mod keys;
mod services;
mod video;

use handler::Handler;

use common::EngineConfig;
use std::cell::RefCell;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Event;

thread_local! {
    /// The one live handler for this page. Kept here so its listeners and
    /// timers survive as long as the page does.
    static HANDLER: RefCell<Option<Handler>> = RefCell::new(None);
    static PAGEHIDE_CB: RefCell<Option<Closure<dyn FnMut(Event)>>> = RefCell::new(None);
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    launch(EngineConfig::default());
}

/// Restarts the tracker with overrides from the settings page. Unknown
/// fields are rejected so a typo surfaces instead of silently defaulting.
#[wasm_bindgen]
pub fn configure(overrides: JsValue) -> Result<(), JsValue> {
    let cfg: EngineConfig = serde_wasm_bindgen::from_value(overrides)?;
    launch(cfg);
    Ok(())
}

fn launch(cfg: EngineConfig) {
    HANDLER.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            old.cleanup();
        }
    });

    let host = page_host();
    let service = services::service_for_host(&host);
    let handler = Handler::start(service, cfg);
    HANDLER.with(|slot| *slot.borrow_mut() = Some(handler));

    install_pagehide_cleanup();
}

fn page_host() -> String {
    let href = gloo_utils::window().location().href().unwrap_or_default();
    url::Url::parse(&href)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

fn install_pagehide_cleanup() {
    PAGEHIDE_CB.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let cb: Closure<dyn FnMut(Event)> = Closure::new(|_: Event| {
            HANDLER.with(|slot| {
                if let Some(handler) = slot.borrow_mut().take() {
                    handler.cleanup();
                }
            });
        });
        if let Err(e) = gloo_utils::window()
            .add_event_listener_with_callback("pagehide", cb.as_ref().unchecked_ref())
        {
            tracing::warn!("Could not install pagehide cleanup: {:?}", e);
        }
        *slot.borrow_mut() = Some(cb);
    });
}
