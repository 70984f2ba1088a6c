use serde::Serialize;

use crate::models::ThemeSelection;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ThemeOption {
    pub id: &'static str,
    pub color: &'static str,
    pub label: &'static str,
}

pub const BACKGROUND_OPTIONS: [ThemeOption; 4] = [
    ThemeOption {
        id: "default",
        color: "#0a0a0a",
        label: "기본",
    },
    ThemeOption {
        id: "dark_blue",
        color: "#0F172A",
        label: "네이비",
    },
    ThemeOption {
        id: "deep_purple",
        color: "#13111C",
        label: "딥퍼플",
    },
    ThemeOption {
        id: "pure_black",
        color: "#000000",
        label: "블랙",
    },
];

pub const ACCENT_OPTIONS: [ThemeOption; 5] = [
    ThemeOption {
        id: "default",
        color: "#7B52FF",
        label: "퍼플",
    },
    ThemeOption {
        id: "blue",
        color: "#3B82F6",
        label: "블루",
    },
    ThemeOption {
        id: "teal",
        color: "#14B8A6",
        label: "틸",
    },
    ThemeOption {
        id: "pink",
        color: "#EC4899",
        label: "핑크",
    },
    ThemeOption {
        id: "orange",
        color: "#F97316",
        label: "오렌지",
    },
];

// Written by the light-mode toggle of earlier builds; not offered in the picker.
const LEGACY_LIGHT_BACKGROUND_ID: &str = "light_mode";
const LEGACY_LIGHT_BACKGROUND_COLOR: &str = "#f2f2f6";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ResolvedTheme {
    pub background_id: String,
    pub background_color: &'static str,
    pub accent_id: String,
    pub accent_color: &'static str,
}

/// Maps stored ids onto the option tables; unknown ids fall back to the first entry.
pub fn resolve(selection: &ThemeSelection) -> ResolvedTheme {
    let background = if selection.background_id == LEGACY_LIGHT_BACKGROUND_ID {
        Some((LEGACY_LIGHT_BACKGROUND_ID, LEGACY_LIGHT_BACKGROUND_COLOR))
    } else {
        find(&BACKGROUND_OPTIONS, &selection.background_id).map(|opt| (opt.id, opt.color))
    };
    let (background_id, background_color) =
        background.unwrap_or((BACKGROUND_OPTIONS[0].id, BACKGROUND_OPTIONS[0].color));
    let accent = find(&ACCENT_OPTIONS, &selection.accent_id).unwrap_or(&ACCENT_OPTIONS[0]);

    if background_id != selection.background_id || accent.id != selection.accent_id {
        log::debug!(
            "theme selection normalized background={} accent={}",
            background_id,
            accent.id
        );
    }

    ResolvedTheme {
        background_id: background_id.to_string(),
        background_color,
        accent_id: accent.id.to_string(),
        accent_color: accent.color,
    }
}

fn find<'a>(options: &'a [ThemeOption], id: &str) -> Option<&'a ThemeOption> {
    options.iter().find(|opt| opt.id == id.trim())
}
