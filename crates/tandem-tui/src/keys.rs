use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Logical inputs the arbiter understands, independent of key binding.
///
/// What an action does depends on the arbiter's current sub-state: `Up` moves
/// the settings cursor in the overlay, the picker selection in a picker, and
/// recalls history in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The universal stop gesture (Ctrl+C): handoff back to the terminal, or
    /// the two-step exit.
    Interrupt,
    Escape,
    /// Open / close the settings overlay.
    ToggleSettings,

    Up,
    Down,
    Left,
    Right,
    Home,
    End,

    Confirm,
    Backspace,
    Delete,
    ClearLine,
    Char(char),
}

/// Map a raw key event to an [`Action`].  Key releases and repeats of
/// non-character keys on terminals that report them are dropped.
pub fn map_key(event: KeyEvent) -> Option<Action> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let alt = event.modifiers.contains(KeyModifiers::ALT);
    // "plain" = no modifier that would make a char a control sequence
    let plain = !ctrl && !alt;

    match event.code {
        KeyCode::Char('c') if ctrl => Some(Action::Interrupt),
        KeyCode::Char('s') if ctrl => Some(Action::ToggleSettings),
        KeyCode::Char('u') if ctrl => Some(Action::ClearLine),
        KeyCode::Char('a') if ctrl => Some(Action::Home),
        KeyCode::Char('e') if ctrl => Some(Action::End),
        KeyCode::F(2) => Some(Action::ToggleSettings),

        KeyCode::Esc => Some(Action::Escape),
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Delete => Some(Action::Delete),
        KeyCode::Up => Some(Action::Up),
        KeyCode::BackTab => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Tab => Some(Action::Down),
        KeyCode::Left => Some(Action::Left),
        KeyCode::Right => Some(Action::Right),
        KeyCode::Home => Some(Action::Home),
        KeyCode::End => Some(Action::End),

        // Printable characters, only when no ctrl/alt modifier
        KeyCode::Char(c) if plain => Some(Action::Char(c)),

        _ => None,
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    use super::*;

    fn key(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent { code, modifiers: mods, kind: KeyEventKind::Press, state: KeyEventState::NONE }
    }

    fn plain_key(c: char) -> KeyEvent { key(KeyCode::Char(c), KeyModifiers::NONE) }
    fn ctrl_key(c: char)  -> KeyEvent { key(KeyCode::Char(c), KeyModifiers::CONTROL) }

    #[test]
    fn ctrl_c_is_interrupt() {
        assert_eq!(map_key(ctrl_key('c')), Some(Action::Interrupt));
    }

    #[test]
    fn settings_toggle_has_two_bindings() {
        assert_eq!(map_key(ctrl_key('s')), Some(Action::ToggleSettings));
        assert_eq!(map_key(key(KeyCode::F(2), KeyModifiers::NONE)), Some(Action::ToggleSettings));
    }

    #[test]
    fn plain_char_types() {
        assert_eq!(map_key(plain_key('h')), Some(Action::Char('h')));
        assert_eq!(map_key(key(KeyCode::Char('H'), KeyModifiers::SHIFT)), Some(Action::Char('H')));
    }

    #[test]
    fn ctrl_and_alt_chars_do_not_type() {
        assert_eq!(map_key(ctrl_key('x')), None);
        assert_eq!(map_key(key(KeyCode::Char('a'), KeyModifiers::ALT)), None);
    }

    #[test]
    fn tab_cycles_like_arrows() {
        assert_eq!(map_key(key(KeyCode::Tab, KeyModifiers::NONE)), Some(Action::Down));
        assert_eq!(map_key(key(KeyCode::BackTab, KeyModifiers::SHIFT)), Some(Action::Up));
    }

    #[test]
    fn release_events_are_dropped() {
        let mut ev = plain_key('a');
        ev.kind = KeyEventKind::Release;
        assert_eq!(map_key(ev), None);
    }

    #[test]
    fn digits_are_plain_chars() {
        for c in ['1', '2', '3', '4'] {
            assert_eq!(map_key(plain_key(c)), Some(Action::Char(c)));
        }
    }
}
