//! Draws the document outline, the open dialog, the hotkey bar and the
//! status line.

use keynav_engine::{Document, MemoryDocument};
use keynav_types::{ElementId, attributes};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, element_label, is_rendered};
use crate::ui::theme::ThemeRoles;

const FOCUS_MARKER: &str = "▸ ";
const NO_MARKER: &str = "  ";
const ACTIVE_ITEM: &str = "● ";
const ROVING_ITEM: &str = "○ ";

pub fn draw(frame: &mut Frame, app: &App, theme: &ThemeRoles) {
    let [body, hints, status] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(3), Constraint::Length(1)]).areas(frame.area());
    let doc = app.document();

    let title = doc.title().unwrap_or("keynav demo");
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {title} "), theme.accent_emphasis_style()))
        .border_style(theme.border_style(app.open_dialog().is_none()));
    let lines = outline(doc, doc.root(), body.width.saturating_sub(2) as usize, theme);
    frame.render_widget(Paragraph::new(lines).block(block).style(theme.text_primary_style()), body);

    if let Some(dialog) = app.open_dialog() {
        let popup = centered_rect(60, 50, body);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!(" {} ", element_label(doc, dialog)), theme.accent_emphasis_style()))
            .border_style(theme.border_style(true))
            .style(theme.modal_background_style());
        let lines = outline(doc, dialog, popup.width.saturating_sub(2) as usize, theme);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }

    frame.render_widget(hint_bar(app, theme), hints);
    let status_style = if app.status().ends_with("no handler") {
        theme.status_warning()
    } else {
        theme.text_muted_style()
    };
    frame.render_widget(Paragraph::new(Span::styled(app.status().to_string(), status_style)), status);
}

/// One line per rendered element below `scope`, in document order.
/// Dialog contents only appear when `scope` is that dialog.
pub fn outline(doc: &MemoryDocument, scope: ElementId, width: usize, theme: &ThemeRoles) -> Vec<Line<'static>> {
    let focused = doc.active_element();
    let base = if scope == doc.root() { 0 } else { doc.depth(scope) + 1 };
    doc.elements()
        .into_iter()
        .filter(|element| *element != scope && doc.contains(scope, *element))
        .filter(|element| is_rendered(doc, *element) && !inside_dialog(doc, *element, scope))
        .map(|element| {
            let depth = doc.depth(element).saturating_sub(base);
            outline_line(doc, element, depth, focused == Some(element), width, theme)
        })
        .collect()
}

fn inside_dialog(doc: &MemoryDocument, element: ElementId, scope: ElementId) -> bool {
    let mut current = Some(element);
    while let Some(node) = current {
        if node == scope {
            return false;
        }
        if doc.tag_name(node).is_some_and(|tag| tag.eq_ignore_ascii_case(attributes::DIALOG)) {
            return true;
        }
        current = doc.parent(node);
    }
    false
}

fn outline_line(
    doc: &MemoryDocument,
    element: ElementId,
    depth: usize,
    focused: bool,
    width: usize,
    theme: &ThemeRoles,
) -> Line<'static> {
    let indent = "  ".repeat(depth);
    let mut used = FOCUS_MARKER.width() + indent.width();
    let mut spans = vec![
        Span::styled(if focused { FOCUS_MARKER } else { NO_MARKER }, theme.accent_emphasis_style()),
        Span::raw(indent),
    ];

    if doc.attribute(element, attributes::LIST_ITEM).is_some() {
        let active = doc.tab_index(element).as_deref() == Some(attributes::TABINDEX_ACTIVE);
        let (marker, style) = if active {
            (ACTIVE_ITEM, theme.active_marker_style())
        } else {
            (ROVING_ITEM, theme.text_muted_style())
        };
        used += marker.width();
        spans.push(Span::styled(marker, style));
    }

    let hint = doc
        .attribute(element, attributes::HOTKEY_KEY)
        .map(|combo| format!(" [{combo}]"));
    let hint_width = hint.as_deref().map_or(0, UnicodeWidthStr::width);
    let label = truncate_to_width(&element_label(doc, element), width.saturating_sub(used + hint_width));
    let label_style = if focused {
        theme.selection_style()
    } else if doc.text(element).is_some() {
        theme.text_primary_style()
    } else {
        theme.text_muted_style()
    };
    spans.push(Span::styled(label, label_style));
    if let Some(hint) = hint {
        spans.push(Span::styled(hint, theme.hotkey_style()));
    }
    Line::from(spans)
}

fn hint_bar(app: &App, theme: &ThemeRoles) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for hint in app.hotkey_hints() {
        spans.push(Span::styled(hint.combo, theme.hotkey_style()));
        spans.push(Span::styled(format!(" {}  ", hint.label), theme.text_muted_style()));
    }
    spans.push(Span::styled("Tab/Shift+Tab", theme.hotkey_style()));
    spans.push(Span::styled(" move  ", theme.text_muted_style()));
    spans.push(Span::styled("Ctrl+C", theme.hotkey_style()));
    spans.push(Span::styled(" quit", theme.text_muted_style()));
    Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme.border_style(false))
                .title(Span::styled(" Hotkeys ", theme.text_muted_style())),
        )
}

/// Cuts `text` to `max_width` terminal cells, ending in an ellipsis when
/// anything was dropped.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width + 1 > max_width {
            break;
        }
        out.push(ch);
        used += width;
    }
    out.push('…');
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn truncates_by_display_width() {
        assert_eq!(truncate_to_width("Compose", 10), "Compose");
        assert_eq!(truncate_to_width("Compose", 5), "Comp…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
        assert_eq!(truncate_to_width("anything", 0), "");
    }

    #[test]
    fn outline_marks_focus_active_items_and_hotkeys() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let save = doc.append_with(root, "button", &[("data-knw-hotkeys-key", "alt+s")]);
        doc.set_text(save, "Save");
        let list = doc.append(root, "ul");
        let first = doc.append_with(list, "li", &[("data-knw-list-item", ""), ("tabindex", "0")]);
        doc.set_text(first, "First");
        let second = doc.append_with(list, "li", &[("data-knw-list-item", ""), ("tabindex", "-1")]);
        doc.set_text(second, "Second");
        let hidden = doc.append_with(root, "p", &[("hidden", "")]);
        doc.set_text(hidden, "Invisible");
        doc.focus(second);

        let lines: Vec<String> = outline(&doc, root, 40, &ThemeRoles::default())
            .iter()
            .map(line_text)
            .collect();
        assert_eq!(
            lines,
            vec!["  Save [alt+s]", "  <ul>", "    ● First", "▸   ○ Second"]
        );
    }

    #[test]
    fn dialog_contents_render_only_in_their_own_scope() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let dialog = doc.append(root, "dialog");
        let close = doc.append(dialog, "button");
        doc.set_text(close, "Close");

        let theme = ThemeRoles::default();
        assert!(outline(&doc, root, 40, &theme).is_empty());
        let inside: Vec<String> = outline(&doc, dialog, 40, &theme).iter().map(line_text).collect();
        assert_eq!(inside, vec!["  Close"]);
    }

    #[test]
    fn draws_the_demo_without_panicking() {
        let mut app = App::new(crate::demo_document().unwrap(), keynav_util::KeynavConfig::default()).unwrap();
        app.handle_key(crossterm::event::KeyEvent::from(crossterm::event::KeyCode::Char('h')))
            .unwrap();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).expect("terminal");
        terminal
            .draw(|frame| draw(frame, &app, &ThemeRoles::default()))
            .expect("draw");
        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("Documentation"));
        assert!(rendered.contains("Hotkeys"));
    }
}
