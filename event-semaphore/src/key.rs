use std::borrow::Borrow;
use std::fmt::Display;

/// Identifies one logical asynchronous occurrence, such as
/// `didDiscoverPeripheral:<peripheral id>`.
///
/// Keys built with [`EventKey::scoped`] combine an operation name with the
/// identifier of its target so that concurrent operations on different
/// peripherals or characteristics never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey(String);

impl EventKey {
    const SEPARATOR: char = ':';

    pub fn new(event: impl Into<String>) -> Self {
        Self(event.into())
    }

    /// Builds an `"<operation>:<target>"` key.
    pub fn scoped(operation: &str, target: impl Display) -> Self {
        Self(format!("{operation}{}{target}", Self::SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part of the key before the first `:`, or the whole key if it is unscoped.
    pub fn operation(&self) -> &str {
        self.0
            .split_once(Self::SEPARATOR)
            .map_or(self.as_str(), |(operation, _)| operation)
    }

    /// The part of the key after the first `:`, if any.
    pub fn target(&self) -> Option<&str> {
        self.0
            .split_once(Self::SEPARATOR)
            .map(|(_, target)| target)
    }
}

impl Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventKey {
    fn from(event: &str) -> Self {
        Self::new(event)
    }
}

impl From<String> for EventKey {
    fn from(event: String) -> Self {
        Self(event)
    }
}

impl From<EventKey> for String {
    fn from(key: EventKey) -> Self {
        key.0
    }
}
