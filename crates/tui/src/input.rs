//! Translation from terminal key presses to document keydowns.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use keynav_types::{ElementId, KeyboardEvent};

/// Builds the keydown a browser would report for `key`, aimed at `target`.
///
/// Releases and keys with no document counterpart (function keys, media
/// keys, ...) yield `None`. `BackTab` is reported as Shift+Tab.
pub fn to_keyboard_event(key: &KeyEvent, target: Option<ElementId>) -> Option<KeyboardEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let mut shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let mut code = None;
    let name = match key.code {
        KeyCode::Char(' ') => {
            code = Some("Space".to_string());
            " ".to_string()
        }
        KeyCode::Char(ch) => ch.to_string(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Esc => "Escape".into(),
        KeyCode::Up => "ArrowUp".into(),
        KeyCode::Down => "ArrowDown".into(),
        KeyCode::Left => "ArrowLeft".into(),
        KeyCode::Right => "ArrowRight".into(),
        KeyCode::Home => "Home".into(),
        KeyCode::End => "End".into(),
        KeyCode::Delete => "Delete".into(),
        KeyCode::Backspace => "Backspace".into(),
        KeyCode::Tab => "Tab".into(),
        KeyCode::BackTab => {
            shift = true;
            "Tab".into()
        }
        _ => return None,
    };
    Some(KeyboardEvent {
        target,
        key: Some(name),
        code,
        which: None,
        alt_key: key.modifiers.contains(KeyModifiers::ALT),
        ctrl_key: key.modifiers.contains(KeyModifiers::CONTROL),
        shift_key: shift,
        meta_key: key.modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_carries_its_physical_code() {
        let event = to_keyboard_event(&KeyEvent::from(KeyCode::Char(' ')), Some(ElementId(3))).unwrap();
        assert_eq!(event.key.as_deref(), Some(" "));
        assert_eq!(event.code.as_deref(), Some("Space"));
        assert_eq!(event.target, Some(ElementId(3)));
    }

    #[test]
    fn back_tab_is_shift_tab() {
        let event = to_keyboard_event(&KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT), None).unwrap();
        assert_eq!(event.key.as_deref(), Some("Tab"));
        assert!(event.shift_key);
    }

    #[test]
    fn modifiers_are_copied() {
        let event = to_keyboard_event(&KeyEvent::new(KeyCode::Char('s'), KeyModifiers::ALT), None).unwrap();
        assert!(event.alt_key);
        assert!(!event.ctrl_key);
        let event = to_keyboard_event(&KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL), None).unwrap();
        assert!(event.ctrl_key);
    }

    #[test]
    fn releases_and_unmapped_keys_are_dropped() {
        let mut release = KeyEvent::from(KeyCode::Enter);
        release.kind = KeyEventKind::Release;
        assert!(to_keyboard_event(&release, None).is_none());
        assert!(to_keyboard_event(&KeyEvent::from(KeyCode::F(5)), None).is_none());
    }
}
