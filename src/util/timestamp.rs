//! Timestamp handling for media streams
//!
//! Presentation timestamps travel through this crate as opaque tick counts;
//! interpreting them against a time base is the embedder's business.

use std::fmt;

/// A presentation timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    /// Timestamp value in stream ticks
    pub value: i64,
}

impl Timestamp {
    /// Create a new timestamp
    pub fn new(value: i64) -> Self {
        Timestamp { value }
    }

    /// No timestamp / unknown timestamp
    pub fn none() -> Self {
        Timestamp { value: i64::MIN }
    }

    /// Check if timestamp is valid
    pub fn is_valid(&self) -> bool {
        self.value != i64::MIN
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::none()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "NOPTS")
        }
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Timestamp::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_creation() {
        let ts = Timestamp::new(100);
        assert!(ts.is_valid());
        assert_eq!(ts.value, 100);
    }

    #[test]
    fn test_timestamp_none() {
        let ts = Timestamp::none();
        assert!(!ts.is_valid());
        assert_eq!(format!("{}", ts), "NOPTS");
    }
}
