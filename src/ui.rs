//! DOM glue for the countdown overlay and the settings panel

use crate::settings::{Settings, clamp_ball_count};

/// Edit made in the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsChange {
    BallCount(u32),
    Sound(bool),
    Vibration(bool),
}

impl SettingsChange {
    /// Apply to `settings`, returning whether anything changed
    pub fn apply(self, settings: &mut Settings) -> bool {
        let before = settings.clone();
        match self {
            SettingsChange::BallCount(n) => settings.set_ball_count(n as i64),
            SettingsChange::Sound(on) => settings.sound_enabled = on,
            SettingsChange::Vibration(on) => settings.vibration_enabled = on,
        }
        *settings != before
    }
}

/// Text shown in the countdown overlay
pub fn countdown_label(n: u8) -> String {
    if n == 0 { String::new() } else { n.to_string() }
}

/// Range input value to a ball count; garbage is ignored
pub fn parse_ball_count(value: &str) -> Option<u32> {
    let n = value.trim().parse::<f64>().ok()?;
    n.is_finite().then(|| clamp_ball_count(n.round() as i64))
}

#[cfg(target_arch = "wasm32")]
pub use web::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlInputElement};

    use super::{SettingsChange, countdown_label, parse_ball_count};
    use crate::settings::Settings;

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn input(document: &Document, id: &str) -> Option<HtmlInputElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    pub fn show_countdown(n: u8) {
        let Some(el) = document().and_then(|d| d.get_element_by_id("countdown")) else {
            return;
        };
        el.set_text_content(Some(&countdown_label(n)));
        let _ = el.set_attribute("class", "");
    }

    pub fn hide_countdown() {
        if let Some(el) = document().and_then(|d| d.get_element_by_id("countdown")) {
            let _ = el.set_attribute("class", "hidden");
        }
    }

    /// Fill the panel from `settings` and report every edit through `on_change`
    pub fn bind_settings_panel(settings: &Settings, on_change: impl Fn(SettingsChange) + 'static) {
        let Some(document) = document() else { return };
        let on_change = Rc::new(on_change);

        // Toggle button
        if let (Some(btn), Some(panel)) = (
            document.get_element_by_id("settings-btn"),
            document.get_element_by_id("settings-panel"),
        ) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let _ = panel.class_list().toggle("hidden");
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Ball count slider
        if let Some(slider) = input(&document, "ball-count") {
            slider.set_value(&settings.ball_count.to_string());
            let value_label = document.get_element_by_id("ball-count-value");
            if let Some(label) = &value_label {
                label.set_text_content(Some(&settings.ball_count.to_string()));
            }

            let on_change = on_change.clone();
            let slider_clone = slider.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let Some(count) = parse_ball_count(&slider_clone.value()) else {
                    return;
                };
                if let Some(label) = &value_label {
                    label.set_text_content(Some(&count.to_string()));
                }
                on_change(SettingsChange::BallCount(count));
            });
            let _ = slider.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Checkboxes
        let toggles: [(&str, bool, fn(bool) -> SettingsChange); 2] = [
            ("sound-toggle", settings.sound_enabled, SettingsChange::Sound),
            ("vibration-toggle", settings.vibration_enabled, SettingsChange::Vibration),
        ];
        for (id, checked, make) in toggles {
            let Some(checkbox) = input(&document, id) else {
                log::warn!("Settings control #{} missing", id);
                continue;
            };
            checkbox.set_checked(checked);

            let on_change = on_change.clone();
            let checkbox_clone = checkbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                on_change(make(checkbox_clone.checked()));
            });
            let _ = checkbox.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}
