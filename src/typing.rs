//! Forward committed keystrokes to the focused application
//!
//! Built on enigo behind the `typing` cargo feature. Without the feature,
//! [`OsTyper::new`] fails with [`TypingError::Unavailable`].

use crate::buffer::KeyAction;
use thiserror::Error;

/// Error type for typing operations
#[derive(Debug, Error)]
pub enum TypingError {
    #[error("Enigo error: {0}")]
    Enigo(String),
    #[error("OS typing not compiled in (build with --features typing)")]
    Unavailable,
}

/// Receives every committed keystroke after it is applied to the buffer
pub trait KeystrokeSink {
    fn send(&mut self, action: &KeyAction) -> Result<(), TypingError>;
}

#[cfg(feature = "typing")]
pub use os::OsTyper;

#[cfg(feature = "typing")]
mod os {
    use super::{KeyAction, KeystrokeSink, TypingError};
    use enigo::{Direction, Enigo, Key, Keyboard, Settings};

    pub struct OsTyper {
        enigo: Enigo,
    }

    impl OsTyper {
        pub fn new() -> Result<Self, TypingError> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| TypingError::Enigo(format!("Failed to initialize Enigo: {}", e)))?;
            Ok(Self { enigo })
        }

        fn send_key(&mut self, key: Key) -> Result<(), TypingError> {
            self.enigo
                .key(key, Direction::Click)
                .map_err(|e| TypingError::Enigo(format!("Failed to send key: {}", e)))
        }
    }

    impl KeystrokeSink for OsTyper {
        fn send(&mut self, action: &KeyAction) -> Result<(), TypingError> {
            match action {
                KeyAction::DeleteLast => self.send_key(Key::Backspace),
                KeyAction::Insert(text) if text == "\n" => self.send_key(Key::Return),
                KeyAction::Insert(text) => self
                    .enigo
                    .text(text)
                    .map_err(|e| TypingError::Enigo(format!("Failed to type text: {}", e))),
            }
        }
    }
}

#[cfg(not(feature = "typing"))]
pub struct OsTyper;

#[cfg(not(feature = "typing"))]
impl OsTyper {
    pub fn new() -> Result<Self, TypingError> {
        Err(TypingError::Unavailable)
    }
}

#[cfg(not(feature = "typing"))]
impl KeystrokeSink for OsTyper {
    fn send(&mut self, _action: &KeyAction) -> Result<(), TypingError> {
        Err(TypingError::Unavailable)
    }
}
