//! Typed text accumulated from committed keystrokes

/// What committing a key label does to the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Append text verbatim
    Insert(String),
    /// Remove the last character
    DeleteLast,
}

impl KeyAction {
    pub fn from_label(label: &str) -> Self {
        match label {
            "SPACE" => KeyAction::Insert(" ".to_string()),
            "DEL" => KeyAction::DeleteLast,
            "ENTER" => KeyAction::Insert("\n".to_string()),
            other => KeyAction::Insert(other.to_string()),
        }
    }
}

/// Append-only text with delete-last
#[derive(Debug, Clone, Default)]
pub struct TypedBuffer {
    text: String,
}

impl TypedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, action: &KeyAction) {
        match action {
            KeyAction::Insert(s) => self.text.push_str(s),
            KeyAction::DeleteLast => {
                self.text.pop();
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Last line of the text, which is what a single-line text box shows
    pub fn last_line(&self) -> &str {
        self.text.rsplit('\n').next().unwrap_or("")
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
