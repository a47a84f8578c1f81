use crate::dialog::{self, RestoreDialog};
use crate::engine::history::RecordOutcome;
use crate::engine::Engine;
use crate::keys::{self, KeyAction};
use crate::services::{SeekButtons, Service};
use crate::video::AugmentedVideo;

use common::EngineConfig;
use gloo_timers::callback::{Interval, Timeout};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Event, KeyboardEvent};

/// How often player discovery re-runs. In-page navigations swap the video
/// element without a page load; this tick is what notices.
const SETUP_TICK_MS: u32 = 1_000;

/// Whether a restore request reached its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    Failed,
}

/// Wires one service recipe to the tracking engine and owns every listener,
/// timer and overlay for the lifetime of the page.
pub struct Handler {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    service: Rc<dyn Service>,
    cfg: EngineConfig,
    attached: Option<Attached>,
    dialog: Option<RestoreDialog>,
    /// A keyboard seek arrived while no video was attached. Cleared by a
    /// short timer, or handed to the engine if a video shows up first.
    detached_seek_mark: bool,
    detached_mark_timer: Option<Timeout>,
    setup_tick: Option<Interval>,
    raf_id: Option<i32>,
    raf_cb: Option<Closure<dyn FnMut(f64)>>,
    key_cb: Option<Closure<dyn FnMut(KeyboardEvent)>>,
}

/// Everything tied to one particular video element.
struct Attached {
    video: AugmentedVideo,
    engine: Engine,
    /// Fallback timer for the current seek flag. Replacing it drops, and
    /// thereby cancels, the previous one.
    flag_timer: Option<Timeout>,
    seeking_cb: Closure<dyn FnMut(Event)>,
    seeked_cb: Closure<dyn FnMut(Event)>,
    canplay_cb: Closure<dyn FnMut(Event)>,
    buttons: Option<AttachedButtons>,
}

/// Native skip buttons with our click listeners on them, kept so the
/// listeners can be removed again.
struct AttachedButtons {
    buttons: SeekButtons,
    backward_cb: Closure<dyn FnMut(Event)>,
    forward_cb: Closure<dyn FnMut(Event)>,
}

fn now() -> f64 {
    gloo_utils::window()
        .performance()
        .map(|p| p.now())
        .unwrap_or(0.0)
}

impl Handler {
    pub fn start(service: Box<dyn Service>, cfg: EngineConfig) -> Handler {
        tracing::info!("Starting position tracker with the {} recipe", service.name());
        let inner = Rc::new(RefCell::new(Inner {
            service: service.into(),
            cfg,
            attached: None,
            dialog: None,
            detached_seek_mark: false,
            detached_mark_timer: None,
            setup_tick: None,
            raf_id: None,
            raf_cb: None,
            key_cb: None,
        }));
        install_key_listener(&inner);
        install_frame_loop(&inner);
        install_setup_tick(&inner);
        setup_pass(&inner);
        Handler { inner }
    }

    /// Tears down every listener, timer and overlay. Nothing fires after
    /// this returns.
    pub fn cleanup(&self) {
        close_dialog(&self.inner);
        let mut inner = self.inner.borrow_mut();
        detach(&mut inner);
        inner.setup_tick = None;
        if let Some(id) = inner.raf_id.take() {
            if let Err(e) = gloo_utils::window().cancel_animation_frame(id) {
                tracing::warn!("Could not cancel animation frame: {:?}", e);
            }
        }
        inner.raf_cb = None;
        if let Some(cb) = inner.key_cb.take() {
            if let Err(e) = gloo_utils::window()
                .remove_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref())
            {
                tracing::warn!("Could not remove key listener: {:?}", e);
            }
        }
        inner.detached_seek_mark = false;
        inner.detached_mark_timer = None;
        tracing::debug!("Position tracker torn down");
    }

    pub fn open_restore_dialog(&self) {
        open_dialog(&self.inner);
    }

    pub fn close_restore_dialog(&self) {
        close_dialog(&self.inner);
    }

    pub fn save_manual_position(&self) {
        save_manual(&self.inner);
    }

    pub fn mark_keyboard_seek(&self) {
        mark_keyboard(&self.inner);
    }

    /// Offers a key event to the open dialog. Returns true when consumed.
    /// The dialog's own capture-phase listener normally gets there first;
    /// this is the entry point for embedders that route keys by hand.
    pub fn handle_dialog_keys(&self, event: &KeyboardEvent) -> bool {
        let is_open = self.inner.borrow().dialog.is_some();
        if !is_open {
            return false;
        }
        match dialog::action_for_code(&event.code()) {
            Some(dialog::DialogAction::Close) => {
                close_dialog(&self.inner);
                true
            }
            Some(dialog::DialogAction::Pick(index)) => {
                restore_entry(&self.inner, index);
                true
            }
            None => false,
        }
    }
}

/// One pass of player discovery. Runs at startup and from the setup tick.
fn setup_pass(rc: &Rc<RefCell<Inner>>) {
    let mut inner = rc.borrow_mut();
    let service = inner.service.clone();
    let Some(player) = service.player() else {
        if inner.attached.is_some() {
            tracing::info!("Player left the page; detaching");
            detach(&mut inner);
        }
        return;
    };
    let Some(video_el) = service.video(&player) else {
        if inner.attached.is_some() {
            tracing::info!("Video left the player; detaching");
            detach(&mut inner);
        }
        return;
    };
    if let Some(att) = &inner.attached {
        if att.video.is_same_element(&video_el) {
            return;
        }
        tracing::info!("Video element was swapped; reattaching");
    }
    detach(&mut inner);
    attach(rc, &mut inner, AugmentedVideo::new(player, video_el));
}

fn attach(rc: &Rc<RefCell<Inner>>, inner: &mut Inner, video: AugmentedVideo) {
    let service = inner.service.clone();
    let mut cfg = inner.cfg.clone();
    if let Some(ms) = service.load_time_capture_delay_ms() {
        cfg.load_time_capture_delay_ms = ms;
    }
    let mut engine = Engine::new(cfg);

    let weak = Rc::downgrade(rc);
    let seeking_cb: Closure<dyn FnMut(Event)> =
        Closure::new(move |_: Event| on_seeking_event(&weak));
    let weak = Rc::downgrade(rc);
    let seeked_cb: Closure<dyn FnMut(Event)> =
        Closure::new(move |_: Event| on_seeked_event(&weak));
    let weak = Rc::downgrade(rc);
    let canplay_cb: Closure<dyn FnMut(Event)> =
        Closure::new(move |_: Event| on_canplay_event(&weak));

    let element = video.element();
    for (event, cb) in [
        ("seeking", &seeking_cb),
        ("seeked", &seeked_cb),
        ("canplay", &canplay_cb),
    ] {
        if let Err(e) =
            element.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())
        {
            tracing::error!("Could not set {event} callback: {:?}", e);
        }
    }

    // Native skip buttons count as keyboard seeks.
    let buttons = service.seek_buttons(video.player()).map(|buttons| {
        let weak = Rc::downgrade(rc);
        let backward_cb: Closure<dyn FnMut(Event)> =
            Closure::new(move |event: Event| on_skip_button_click(&weak, &event));
        let weak = Rc::downgrade(rc);
        let forward_cb: Closure<dyn FnMut(Event)> =
            Closure::new(move |event: Event| on_skip_button_click(&weak, &event));
        for (button, cb) in [
            (&buttons.backward, &backward_cb),
            (&buttons.forward, &forward_cb),
        ] {
            if let Err(e) =
                button.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            {
                tracing::error!("Could not observe skip button: {:?}", e);
            }
        }
        AttachedButtons {
            buttons,
            backward_cb,
            forward_cb,
        }
    });

    if video.is_playable() {
        let playback = video.playback_time(service.as_ref());
        engine.on_playable(now(), playback);
    }

    let mut attached = Attached {
        video,
        engine,
        flag_timer: None,
        seeking_cb,
        seeked_cb,
        canplay_cb,
        buttons,
    };

    // A key press just before attachment still means the next seek is
    // keyboard-made.
    if inner.detached_seek_mark {
        inner.detached_seek_mark = false;
        inner.detached_mark_timer = None;
        let epoch = attached.engine.mark_keyboard_seek();
        attached.flag_timer = Some(flag_timeout(
            rc,
            epoch,
            inner.cfg.keyboard_seek_flag_timeout_ms,
        ));
    }

    tracing::info!("Attached to video ({} recipe)", service.name());
    inner.attached = Some(attached);
}

fn detach(inner: &mut Inner) {
    let Some(att) = inner.attached.take() else {
        return;
    };
    let element = att.video.element();
    for (event, cb) in [
        ("seeking", &att.seeking_cb),
        ("seeked", &att.seeked_cb),
        ("canplay", &att.canplay_cb),
    ] {
        if let Err(e) =
            element.remove_event_listener_with_callback(event, cb.as_ref().unchecked_ref())
        {
            tracing::warn!("Could not remove {event} callback: {:?}", e);
        }
    }
    if let Some(b) = &att.buttons {
        for (button, cb) in [
            (&b.buttons.backward, &b.backward_cb),
            (&b.buttons.forward, &b.forward_cb),
        ] {
            if let Err(e) =
                button.remove_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            {
                tracing::warn!("Could not remove skip-button callback: {:?}", e);
            }
        }
    }
}

fn install_setup_tick(rc: &Rc<RefCell<Inner>>) {
    let weak = Rc::downgrade(rc);
    let interval = Interval::new(SETUP_TICK_MS, move || {
        if let Some(rc) = weak.upgrade() {
            setup_pass(&rc);
        }
    });
    rc.borrow_mut().setup_tick = Some(interval);
}

fn install_frame_loop(rc: &Rc<RefCell<Inner>>) {
    let weak = Rc::downgrade(rc);
    let cb: Closure<dyn FnMut(f64)> = Closure::new(move |timestamp: f64| {
        let Some(rc) = weak.upgrade() else { return };
        frame_tick(&rc, timestamp);
        schedule_frame(&rc);
    });
    rc.borrow_mut().raf_cb = Some(cb);
    schedule_frame(rc);
}

fn schedule_frame(rc: &Rc<RefCell<Inner>>) {
    let id = {
        let inner = rc.borrow();
        let Some(cb) = inner.raf_cb.as_ref() else { return };
        match gloo_utils::window().request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Could not schedule animation frame: {:?}", e);
                return;
            }
        }
    };
    rc.borrow_mut().raf_id = Some(id);
}

fn frame_tick(rc: &Rc<RefCell<Inner>>, timestamp: f64) {
    let mut inner = rc.borrow_mut();
    let service = inner.service.clone();
    let Some(att) = inner.attached.as_mut() else {
        return;
    };
    let playback = att.video.playback_time(service.as_ref());
    let seeking = att.video.is_seeking();
    att.engine.tick(timestamp, playback, seeking);
}

fn install_key_listener(rc: &Rc<RefCell<Inner>>) {
    let weak = Rc::downgrade(rc);
    let cb: Closure<dyn FnMut(KeyboardEvent)> = Closure::new(move |event: KeyboardEvent| {
        let Some(rc) = weak.upgrade() else { return };
        on_key_event(&rc, &event);
    });
    if let Err(e) = gloo_utils::window()
        .add_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref())
    {
        tracing::error!("Could not install key listener: {:?}", e);
    }
    rc.borrow_mut().key_cb = Some(cb);
}

fn on_key_event(rc: &Rc<RefCell<Inner>>, event: &KeyboardEvent) {
    if keys::has_modifier(event) || keys::targets_editable_element(event) {
        return;
    }
    let Some(action) = keys::action_for_code(&event.code()) else {
        return;
    };
    event.prevent_default();
    let step = rc.borrow().cfg.seek_step_seconds;
    match action {
        KeyAction::SeekBackward => seek_by(rc, -step),
        KeyAction::SeekForward => seek_by(rc, step),
        KeyAction::ToggleRestoreDialog => toggle_dialog(rc),
        KeyAction::SaveManualPosition => save_manual(rc),
    }
}

fn on_seeking_event(weak: &Weak<RefCell<Inner>>) {
    let Some(rc) = weak.upgrade() else { return };
    let mut inner = rc.borrow_mut();
    let service = inner.service.clone();
    let Some(att) = inner.attached.as_mut() else {
        return;
    };
    let playback = att.video.playback_time(service.as_ref());
    let element_clock = att.video.element().current_time();
    match att.engine.on_seeking(now(), playback, element_clock) {
        Some(RecordOutcome::Saved) => {
            tracing::debug!("Saved pre-seek position");
        }
        Some(outcome) => tracing::trace!("Seek not saved: {:?}", outcome),
        None => tracing::trace!("Seek ignored"),
    }
}

fn on_seeked_event(weak: &Weak<RefCell<Inner>>) {
    let Some(rc) = weak.upgrade() else { return };
    let mut inner = rc.borrow_mut();
    let Some(att) = inner.attached.as_mut() else {
        return;
    };
    att.engine.on_seeked();
    att.flag_timer = None;
}

fn on_canplay_event(weak: &Weak<RefCell<Inner>>) {
    let Some(rc) = weak.upgrade() else { return };
    let mut inner = rc.borrow_mut();
    let service = inner.service.clone();
    let Some(att) = inner.attached.as_mut() else {
        return;
    };
    let playback = att.video.playback_time(service.as_ref());
    att.engine.on_playable(now(), playback);
}

fn on_skip_button_click(weak: &Weak<RefCell<Inner>>, event: &Event) {
    // Clicks we synthesize ourselves (seek_by_delta on recipes that drive
    // the native buttons) arrive untrusted and are already marked by the
    // key path; only the viewer's own clicks count here.
    if !event.is_trusted() {
        return;
    }
    let Some(rc) = weak.upgrade() else { return };
    mark_keyboard(&rc);
}

/// Flags the next seek as keyboard-made and arms the fallback timer that
/// clears the flag when no `seeked` ever arrives.
fn mark_keyboard(rc: &Rc<RefCell<Inner>>) {
    let mut inner = rc.borrow_mut();
    let flag_ms = inner.cfg.keyboard_seek_flag_timeout_ms;
    let detached_ms = inner.cfg.detached_seek_flag_timeout_ms;
    if let Some(att) = inner.attached.as_mut() {
        let epoch = att.engine.mark_keyboard_seek();
        att.flag_timer = Some(flag_timeout(rc, epoch, flag_ms));
    } else {
        inner.detached_seek_mark = true;
        let weak = Rc::downgrade(rc);
        inner.detached_mark_timer = Some(Timeout::new(detached_ms as u32, move || {
            if let Some(rc) = weak.upgrade() {
                rc.borrow_mut().detached_seek_mark = false;
            }
        }));
    }
}

fn mark_programmatic(rc: &Rc<RefCell<Inner>>) {
    let mut inner = rc.borrow_mut();
    let flag_ms = inner.cfg.keyboard_seek_flag_timeout_ms;
    if let Some(att) = inner.attached.as_mut() {
        let epoch = att.engine.mark_programmatic_seek();
        att.flag_timer = Some(flag_timeout(rc, epoch, flag_ms));
    }
}

fn flag_timeout(rc: &Rc<RefCell<Inner>>, epoch: u64, after_ms: f64) -> Timeout {
    let weak = Rc::downgrade(rc);
    Timeout::new(after_ms as u32, move || {
        let Some(rc) = weak.upgrade() else { return };
        let mut inner = rc.borrow_mut();
        if let Some(att) = inner.attached.as_mut() {
            if att.engine.on_flag_timeout(epoch) {
                tracing::debug!("Seek flag expired without a seeked event");
            }
        }
    })
}

/// Relative seek driven by the keyboard. Goes through the service when it
/// has a recipe for it, otherwise writes the element clock.
fn seek_by(rc: &Rc<RefCell<Inner>>, delta: f64) {
    let snapshot = {
        let mut inner = rc.borrow_mut();
        let service = inner.service.clone();
        inner.attached.as_mut().map(|att| {
            let playback = att.video.playback_time(service.as_ref());
            let display = att.engine.display_time(playback);
            att.engine.record_before_seek(display);
            (service.clone(), att.video.clone())
        })
    };
    let Some((service, video)) = snapshot else {
        // No video yet; remember the intent so an immediately following
        // attach still classifies the first seek correctly.
        mark_keyboard(rc);
        return;
    };
    mark_keyboard(rc);
    if !service.seek_by_delta(video.player(), video.element(), delta) {
        video.nudge_clock(delta);
    }
}

fn save_manual(rc: &Rc<RefCell<Inner>>) {
    let mut inner = rc.borrow_mut();
    let service = inner.service.clone();
    let Some(att) = inner.attached.as_mut() else {
        return;
    };
    let playback = att.video.playback_time(service.as_ref());
    match att.engine.save_manual(now(), playback) {
        Some(RecordOutcome::Saved) => tracing::debug!("Saved position on request"),
        Some(outcome) => tracing::debug!("Manual save rejected: {:?}", outcome),
        None => tracing::debug!("Nothing to save yet"),
    }
}

fn toggle_dialog(rc: &Rc<RefCell<Inner>>) {
    if rc.borrow().dialog.is_some() {
        close_dialog(rc);
    } else {
        open_dialog(rc);
    }
}

fn open_dialog(rc: &Rc<RefCell<Inner>>) {
    close_dialog(rc);
    let Some(entries) = rc
        .borrow()
        .attached
        .as_ref()
        .map(|att| att.engine.history().display_list())
    else {
        return;
    };
    let weak = Rc::downgrade(rc);
    let on_pick: Rc<dyn Fn(usize)> = Rc::new(move |index| {
        if let Some(rc) = weak.upgrade() {
            restore_entry(&rc, index);
        }
    });
    let weak = Rc::downgrade(rc);
    let on_close: Rc<dyn Fn()> = Rc::new(move || {
        if let Some(rc) = weak.upgrade() {
            close_dialog(&rc);
        }
    });
    match RestoreDialog::open(&entries, on_pick, on_close) {
        Ok(d) => rc.borrow_mut().dialog = Some(d),
        Err(e) => tracing::error!("Could not open restore dialog: {}", e),
    }
}

fn close_dialog(rc: &Rc<RefCell<Inner>>) {
    let dialog = rc.borrow_mut().dialog.take();
    if let Some(d) = dialog {
        d.dismiss();
    }
}

/// Jumps back to the chosen saved position. The restore's own seek is
/// flagged programmatic so it never records itself.
fn restore_entry(rc: &Rc<RefCell<Inner>>, index: usize) {
    close_dialog(rc);
    let snapshot = {
        let inner = rc.borrow();
        let service = inner.service.clone();
        inner.attached.as_ref().and_then(|att| {
            let entry = att.engine.history().display_list().get(index).copied()?;
            let duration = att.video.duration(service.as_ref());
            Some((service.clone(), att.video.clone(), entry.time, duration))
        })
    };
    let Some((service, video, time, duration)) = snapshot else {
        return;
    };
    mark_programmatic(rc);
    let outcome = if service.seek_to_time(video.player(), video.element(), time, duration) {
        RestoreOutcome::Restored
    } else if !service.buffer_relative_clock() {
        video.write_clock(time);
        RestoreOutcome::Restored
    } else {
        RestoreOutcome::Failed
    };
    match outcome {
        RestoreOutcome::Restored => {
            tracing::debug!("Jumped back to {}", dialog::format_time(time));
        }
        RestoreOutcome::Failed => {
            tracing::warn!("Could not reach restore target {}", dialog::format_time(time));
            dialog::show_banner(&format!(
                "Couldn't jump to {}",
                dialog::format_time(time)
            ));
        }
    }
}
