use ratatui::style::{Color, Modifier, Style};

/// Semantic color roles used by the demo view.
#[derive(Debug, Clone)]
pub struct ThemeRoles {
    pub background: Color,
    pub surface: Color,
    pub border: Color,

    pub text: Color,
    pub text_muted: Color,

    pub accent_primary: Color,
    pub accent_secondary: Color,

    pub focus: Color,
    /// Marker color of the active (`tabindex="0"`) list item.
    pub active: Color,
    pub warning: Color,
    pub error: Color,

    pub selection_bg: Color,
    pub selection_fg: Color,

    /// Background behind an open dialog.
    pub modal_bg: Color,
}

impl Default for ThemeRoles {
    fn default() -> Self {
        super::nord::roles()
    }
}

impl ThemeRoles {
    pub fn text_primary_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn text_muted_style(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        let color = if focused { self.focus } else { self.border };
        Style::default().fg(color)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    pub fn active_marker_style(&self) -> Style {
        Style::default().fg(self.active).add_modifier(Modifier::BOLD)
    }

    pub fn hotkey_style(&self) -> Style {
        Style::default().fg(self.accent_secondary)
    }

    pub fn accent_emphasis_style(&self) -> Style {
        Style::default().fg(self.accent_primary).add_modifier(Modifier::BOLD)
    }

    pub fn modal_background_style(&self) -> Style {
        Style::default().bg(self.modal_bg)
    }

    pub fn status_warning(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn status_error(&self) -> Style {
        Style::default().fg(self.error)
    }
}
