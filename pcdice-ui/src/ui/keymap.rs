use super::action_id::ActionId;
use super::{InputEvent, KeyCode};

/// What a binding matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPattern {
    /// A printable character (shifted characters arrive already shifted).
    Char(char),
    /// A named key with no modifiers.
    Key(KeyCode),
    Ctrl(char),
    Alt(char),
    CtrlKey(KeyCode),
    ShiftKey(KeyCode),
}

impl KeyPattern {
    pub fn matches(&self, event: &InputEvent) -> bool {
        let m = event.modifiers;
        match (*self, event.key) {
            (KeyPattern::Char(c), KeyCode::Char(k)) => c == k && !m.ctrl && !m.alt,
            (KeyPattern::Ctrl(c), KeyCode::Char(k)) => m.ctrl && c.eq_ignore_ascii_case(&k),
            (KeyPattern::Alt(c), KeyCode::Char(k)) => m.alt && c == k,
            (KeyPattern::Key(code), key) => code == key && !m.ctrl && !m.alt && !m.shift,
            (KeyPattern::CtrlKey(code), key) => code == key && m.ctrl,
            (KeyPattern::ShiftKey(code), key) => code == key && m.shift && !m.ctrl,
            _ => false,
        }
    }

    /// Short label for the help pane.
    pub fn label(&self) -> String {
        match self {
            KeyPattern::Char(' ') => "Space".to_string(),
            KeyPattern::Char(c) => c.to_string(),
            KeyPattern::Key(code) => key_name(*code),
            KeyPattern::Ctrl(c) => format!("Ctrl+{}", c),
            KeyPattern::Alt(c) => format!("Alt+{}", c),
            KeyPattern::CtrlKey(code) => format!("Ctrl+{}", key_name(*code)),
            KeyPattern::ShiftKey(code) => format!("Shift+{}", key_name(*code)),
        }
    }
}

fn key_name(code: KeyCode) -> String {
    match code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::F(n) => format!("F{}", n),
        other => format!("{:?}", other),
    }
}

#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub pattern: KeyPattern,
    pub action: ActionId,
    pub description: &'static str,
}

/// Ordered bindings for one layer. First match wins.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<KeyBinding>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bindings(bindings: Vec<KeyBinding>) -> Self {
        Self { bindings }
    }

    pub fn lookup(&self, event: &InputEvent) -> Option<ActionId> {
        self.bindings
            .iter()
            .find(|b| b.pattern.matches(event))
            .map(|b| b.action)
    }

    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }
}
