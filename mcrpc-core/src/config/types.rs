//! Configuration type definitions
//!
//! A link waits in two ways. The *long* timeout covers the first frame of
//! an exchange, when the peer may still be busy. The *short* timeout covers
//! frames that follow one already received; it starts small, doubles after
//! each timed-out attempt up to a ceiling, and is reset once the exchange
//! is decided either way.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default long timeout for both roles (ms)
pub const DEFAULT_LONG_TIMEOUT_MS: u32 = 5000;

/// Default short timeout reset value for the master (ms)
pub const MASTER_SHORT_TIMEOUT_MS: u32 = 3;

/// Default short timeout reset value for the slave (ms)
pub const SLAVE_SHORT_TIMEOUT_MS: u32 = 2;

/// Default ceiling for the backed-off short timeout (ms)
pub const DEFAULT_SHORT_TIMEOUT_MAX_MS: u32 = 100;

/// Default number of extra short-class attempts after a timeout
pub const DEFAULT_SHORT_RETRIES: u8 = 3;

/// Upper bound on `short_retries`
pub const MAX_SHORT_RETRIES: u8 = 8;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Short timeout starts above its own ceiling
    ShortAboveCeiling,
    /// More short retries than [`MAX_SHORT_RETRIES`]
    TooManyRetries,
    /// Serialization or deserialization failed
    Encoding,
}

/// Timeout policy for one end of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RpcConfig {
    /// Wait for the first frame of an exchange (slave idle wait, default
    /// master send/receive budget)
    pub long_timeout_ms: u32,
    /// Reset value of the wait between frames of an exchange in progress
    pub short_timeout_ms: u32,
    /// Ceiling the short timeout backs off to
    pub short_timeout_max_ms: u32,
    /// Extra short-class receive attempts after a timeout
    pub short_retries: u8,
    /// Drop stale received bytes before starting an exchange, and after a
    /// failed one
    pub discard_stale_input: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::master()
    }
}

impl RpcConfig {
    /// Defaults for the calling side
    pub const fn master() -> Self {
        Self {
            long_timeout_ms: DEFAULT_LONG_TIMEOUT_MS,
            short_timeout_ms: MASTER_SHORT_TIMEOUT_MS,
            short_timeout_max_ms: DEFAULT_SHORT_TIMEOUT_MAX_MS,
            short_retries: DEFAULT_SHORT_RETRIES,
            discard_stale_input: true,
        }
    }

    /// Defaults for the serving side
    pub const fn slave() -> Self {
        Self {
            long_timeout_ms: DEFAULT_LONG_TIMEOUT_MS,
            short_timeout_ms: SLAVE_SHORT_TIMEOUT_MS,
            short_timeout_max_ms: DEFAULT_SHORT_TIMEOUT_MAX_MS,
            short_retries: DEFAULT_SHORT_RETRIES,
            discard_stale_input: true,
        }
    }

    /// Same policy with a different long timeout
    pub const fn with_long_timeout(mut self, ms: u32) -> Self {
        self.long_timeout_ms = ms;
        self
    }

    /// Same policy with a different short timeout reset value and ceiling
    pub const fn with_short_timeout(mut self, ms: u32, max_ms: u32) -> Self {
        self.short_timeout_ms = ms;
        self.short_timeout_max_ms = max_ms;
        self
    }

    /// Same policy with a different retry count
    pub const fn with_short_retries(mut self, retries: u8) -> Self {
        self.short_retries = retries;
        self
    }

    /// Check the policy is internally consistent
    ///
    /// Zero timeouts are legal: every wait then becomes a single poll,
    /// which is what host tests use to drive failure paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_timeout_ms > self.short_timeout_max_ms {
            return Err(ConfigError::ShortAboveCeiling);
        }
        if self.short_retries > MAX_SHORT_RETRIES {
            return Err(ConfigError::TooManyRetries);
        }
        Ok(())
    }

    /// Serialize into `buf` as postcard bytes
    ///
    /// Returns the used prefix of `buf`.
    #[cfg(feature = "serde")]
    pub fn to_slice<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Encoding)
    }

    /// Deserialize from postcard bytes and validate
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Encoding)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults() {
        let master = RpcConfig::master();
        let slave = RpcConfig::slave();

        assert_eq!(master.long_timeout_ms, 5000);
        assert_eq!(master.short_timeout_ms, 3);
        assert_eq!(slave.long_timeout_ms, 5000);
        assert_eq!(slave.short_timeout_ms, 2);
        assert_eq!(RpcConfig::default(), master);
        assert!(master.validate().is_ok());
        assert!(slave.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_are_valid() {
        let config = RpcConfig::master()
            .with_long_timeout(0)
            .with_short_timeout(0, 0)
            .with_short_retries(0);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_inverted_short_timeout() {
        let config = RpcConfig::slave().with_short_timeout(50, 10);
        assert_eq!(config.validate(), Err(ConfigError::ShortAboveCeiling));
    }

    #[test]
    fn test_validate_rejects_excess_retries() {
        let config = RpcConfig::slave().with_short_retries(MAX_SHORT_RETRIES + 1);
        assert_eq!(config.validate(), Err(ConfigError::TooManyRetries));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_persistence() {
        let config = RpcConfig::slave().with_long_timeout(250);
        let mut buf = [0u8; 32];
        let used = config.to_slice(&mut buf).unwrap().len();

        assert_eq!(RpcConfig::from_bytes(&buf[..used]), Ok(config));
        assert_eq!(
            RpcConfig::from_bytes(&buf[..1]),
            Err(ConfigError::Encoding)
        );
    }
}
