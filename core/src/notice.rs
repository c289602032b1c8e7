use std::fmt;

/// A short user-facing message for a degraded-but-working situation
/// (catalog missing, sprite host unreachable, hotkeys unavailable).
///
/// The engine never renders these itself; front ends drain them and show
/// them however they like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
