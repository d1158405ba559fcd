use log::warn;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

/// Current value of the `<input>` that fired `e`.
pub fn input_value(e: &InputEvent) -> String {
    let input: HtmlInputElement = e.target_unchecked_into();
    input.value()
}

/// Current value of the `<textarea>` that fired `e`.
pub fn textarea_value(e: &InputEvent) -> String {
    let area: HtmlTextAreaElement = e.target_unchecked_into();
    area.value()
}

/// Blocking `window.alert`.
pub fn alert(message: &str) {
    if let Err(e) = gloo_utils::window().alert_with_message(message) {
        warn!("Could not show alert {:?}: {:?}", message, e);
    }
}
