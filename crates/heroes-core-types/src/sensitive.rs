//! Sensitive data marker for automatic redaction
//!
//! The `Sensitive<T>` wrapper ensures that sensitive data (passwords,
//! tokens, API keys) is never accidentally logged or displayed.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// Deserializes transparently from the inner value so it can sit directly in
/// request payloads. It has no `Serialize` impl.
///
/// # Example
///
/// ```
/// use heroes_core_types::Sensitive;
///
/// let password = Sensitive::new("secret123");
/// println!("{:?}", password); // Prints: ***REDACTED***
/// println!("{}", password);   // Prints: ***REDACTED***
///
/// // Access the actual value when needed
/// assert_eq!(password.expose(), &"secret123");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Use this method sparingly and only when the sensitive data
    /// must be accessed (e.g., for hashing).
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Sensitive)
    }
}
