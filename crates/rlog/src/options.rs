//! Flush and rotation thresholds

use crate::{Error, Result};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default size at which the active file is rotated (256 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Default number of pending bytes that forces a flush (4 KiB).
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 4096;

/// Default age of the pending buffer that forces a flush on the next write.
pub const DEFAULT_MAX_BUFFER_AGE: Duration = Duration::from_secs(15);

/// Thresholds controlling when the writer flushes and rotates.
///
/// ```
/// use rlog::Options;
/// use std::time::Duration;
///
/// let options = Options::default()
///     .with_max_file_size(64 * 1024 * 1024)
///     .with_max_buffer_size(16 * 1024)
///     .with_max_buffer_age(Duration::from_secs(5));
/// assert!(options.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Size in bytes the active file may not reach before it is rotated
    pub max_file_size: u64,
    /// Number of pending bytes that triggers a flush
    pub max_buffer_size: usize,
    /// Age of the pending buffer that triggers a flush on the next write
    #[serde(rename = "max_buffer_age_ms", with = "millis")]
    pub max_buffer_age: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            max_buffer_age: DEFAULT_MAX_BUFFER_AGE,
        }
    }
}

impl Options {
    /// Specifies the size at which the active file is rotated.
    #[must_use]
    pub const fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Specifies the number of pending bytes that forces a flush.
    #[must_use]
    pub const fn with_max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }

    /// Specifies how old the pending buffer may get before a write flushes it.
    #[must_use]
    pub const fn with_max_buffer_age(mut self, max_buffer_age: Duration) -> Self {
        self.max_buffer_age = max_buffer_age;
        self
    }

    /// Checks that every threshold is positive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] naming the first zero threshold.
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(Error::InvalidOptions(
                "max_file_size must be positive".to_string(),
            ));
        }
        if self.max_buffer_size == 0 {
            return Err(Error::InvalidOptions(
                "max_buffer_size must be positive".to_string(),
            ));
        }
        if self.max_buffer_age.is_zero() {
            return Err(Error::InvalidOptions(
                "max_buffer_age must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;

    #[test]
    fn test_defaults() {
        let options = Options::default();

        assert_eq!(options.max_file_size, 256 * 1024 * 1024);
        assert_eq!(options.max_buffer_size, 4096);
        assert_eq!(options.max_buffer_age, Duration::from_secs(15));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_thresholds_rejected() {
        assert_matches!(
            Options::default().with_max_file_size(0).validate(),
            Err(Error::InvalidOptions(msg)) if msg.contains("max_file_size")
        );
        assert_matches!(
            Options::default().with_max_buffer_size(0).validate(),
            Err(Error::InvalidOptions(msg)) if msg.contains("max_buffer_size")
        );
        assert_matches!(
            Options::default()
                .with_max_buffer_age(Duration::ZERO)
                .validate(),
            Err(Error::InvalidOptions(msg)) if msg.contains("max_buffer_age")
        );
    }

    #[test]
    fn test_deserialize_partial_config() {
        let options: Options =
            serde_json::from_str(r#"{"max_buffer_size": 10, "max_buffer_age_ms": 250}"#).unwrap();

        assert_eq!(options.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(options.max_buffer_size, 10);
        assert_eq!(options.max_buffer_age, Duration::from_millis(250));
    }

    #[test]
    fn test_serialize_uses_millis() {
        let json = serde_json::to_value(Options::default()).unwrap();

        assert_eq!(json["max_buffer_age_ms"], 15_000);
        assert_eq!(json["max_buffer_size"], 4096);
    }
}
