use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, KeyboardEvent};

/// Actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    SeekBackward,
    SeekForward,
    ToggleRestoreDialog,
    SaveManualPosition,
}

pub fn action_for_code(code: &str) -> Option<KeyAction> {
    match code {
        "ArrowLeft" => Some(KeyAction::SeekBackward),
        "ArrowRight" => Some(KeyAction::SeekForward),
        "KeyH" => Some(KeyAction::ToggleRestoreDialog),
        "KeyS" => Some(KeyAction::SaveManualPosition),
        _ => None,
    }
}

/// Keys typed into search boxes or comment fields belong to the page.
pub fn targets_editable_element(event: &KeyboardEvent) -> bool {
    let Some(target) = event.target() else {
        return false;
    };
    let Some(element) = target.dyn_ref::<Element>() else {
        return false;
    };
    match element.tag_name().to_ascii_lowercase().as_str() {
        "input" | "textarea" | "select" => true,
        _ => element
            .dyn_ref::<HtmlElement>()
            .is_some_and(|el| el.is_content_editable()),
    }
}

/// A key chord held by the page's own shortcuts should stay with the page.
pub fn has_modifier(event: &KeyboardEvent) -> bool {
    event.ctrl_key() || event.alt_key() || event.meta_key()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_keys_seek() {
        assert_eq!(action_for_code("ArrowLeft"), Some(KeyAction::SeekBackward));
        assert_eq!(action_for_code("ArrowRight"), Some(KeyAction::SeekForward));
    }

    #[test]
    fn unbound_keys_are_left_alone() {
        assert_eq!(action_for_code("Space"), None);
        assert_eq!(action_for_code("KeyQ"), None);
        assert_eq!(action_for_code("Escape"), None);
    }
}
