//! Theme — the two fixed palettes and the egui visuals built from them.

use egui::{Color32, Visuals};

/// A fixed palette: window background, text, widget background.
pub struct Palette {
    pub bg: Color32,
    pub fg: Color32,
    pub widget_bg: Color32,
}

pub const LIGHT: Palette = Palette {
    bg: Color32::from_rgb(0xf0, 0xfa, 0xff),
    fg: Color32::from_rgb(0x1a, 0x1a, 0x2e),
    widget_bg: Color32::from_rgb(0xff, 0xff, 0xff),
};

pub const DARK: Palette = Palette {
    bg: Color32::from_rgb(0x1a, 0x1a, 0x2e),
    fg: Color32::from_rgb(0xf7, 0xf7, 0xf7),
    widget_bg: Color32::from_rgb(0x2e, 0x2e, 0x3e),
};

/// Build the full widget style for one theme. The result is a pure function
/// of the flag, so applying it is idempotent and toggling twice restores
/// every styled attribute.
pub fn visuals(dark_mode: bool) -> Visuals {
    let palette = if dark_mode { &DARK } else { &LIGHT };
    let mut visuals = if dark_mode {
        Visuals::dark()
    } else {
        Visuals::light()
    };

    visuals.panel_fill = palette.bg;
    visuals.window_fill = palette.bg;
    visuals.extreme_bg_color = palette.widget_bg;
    visuals.override_text_color = Some(palette.fg);
    visuals.widgets.inactive.bg_fill = palette.widget_bg;
    visuals.widgets.inactive.weak_bg_fill = palette.widget_bg;
    visuals.widgets.hovered.bg_fill = palette.widget_bg;
    visuals.widgets.active.bg_fill = palette.widget_bg;

    visuals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_visuals_use_the_light_palette() {
        let v = visuals(false);
        assert_eq!(v.panel_fill, LIGHT.bg);
        assert_eq!(v.extreme_bg_color, LIGHT.widget_bg);
        assert_eq!(v.override_text_color, Some(LIGHT.fg));
    }

    #[test]
    fn dark_visuals_use_the_dark_palette() {
        let v = visuals(true);
        assert_eq!(v.panel_fill, DARK.bg);
        assert_eq!(v.extreme_bg_color, DARK.widget_bg);
        assert_eq!(v.override_text_color, Some(DARK.fg));
    }

    #[test]
    fn toggling_twice_restores_every_styled_attribute() {
        let original = visuals(false);
        let _dark = visuals(true);
        let restored = visuals(false);

        assert_eq!(original.panel_fill, restored.panel_fill);
        assert_eq!(original.window_fill, restored.window_fill);
        assert_eq!(original.extreme_bg_color, restored.extreme_bg_color);
        assert_eq!(original.override_text_color, restored.override_text_color);
        assert_eq!(
            original.widgets.inactive.bg_fill,
            restored.widgets.inactive.bg_fill
        );
        assert_eq!(
            original.widgets.active.bg_fill,
            restored.widgets.active.bg_fill
        );
    }

    #[test]
    fn themes_are_distinct() {
        assert_ne!(visuals(true).panel_fill, visuals(false).panel_fill);
    }
}
