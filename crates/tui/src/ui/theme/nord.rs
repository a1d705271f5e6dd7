//! Nord palette mapped onto the demo's theme roles.

use ratatui::style::Color;

use super::roles::ThemeRoles;

// Polar Night
pub const N0: Color = Color::Rgb(0x2E, 0x34, 0x40); // #2E3440
pub const N1: Color = Color::Rgb(0x3B, 0x42, 0x52); // #3B4252
pub const N3: Color = Color::Rgb(0x4C, 0x56, 0x6A); // #4C566A

// Snow Storm
pub const S0: Color = Color::Rgb(0xD8, 0xDE, 0xE9); // #D8DEE9
pub const S2: Color = Color::Rgb(0xEC, 0xEF, 0xF4); // #ECEFF4

// Frost
pub const F1: Color = Color::Rgb(0x88, 0xC0, 0xD0); // #88C0D0
pub const F2: Color = Color::Rgb(0x81, 0xA1, 0xC1); // #81A1C1
pub const F3: Color = Color::Rgb(0x5E, 0x81, 0xAC); // #5E81AC

// Aurora
pub const A_RED: Color = Color::Rgb(0xBF, 0x61, 0x6A); // #BF616A
pub const A_YELLOW: Color = Color::Rgb(0xEB, 0xCB, 0x8B); // #EBCB8B
pub const A_GREEN: Color = Color::Rgb(0xA3, 0xBE, 0x8C); // #A3BE8C

pub const TEXT_MUTED: Color = Color::Rgb(0x61, 0x6E, 0x88); // #616E88
pub const BG_MODAL_OVERLAY: Color = Color::Rgb(0x1A, 0x1E, 0x28);

pub fn roles() -> ThemeRoles {
    ThemeRoles {
        background: N0,
        surface: N1,
        border: N3,
        text: S0,
        text_muted: TEXT_MUTED,
        accent_primary: F1,
        accent_secondary: F2,
        focus: F1,
        active: A_GREEN,
        warning: A_YELLOW,
        error: A_RED,
        selection_bg: F3,
        selection_fg: S2,
        modal_bg: BG_MODAL_OVERLAY,
    }
}
