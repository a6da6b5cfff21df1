//! Short/long timeout bookkeeping

use crate::config::RpcConfig;

/// Timeout state for one end of a link
///
/// Only the short timeout moves at runtime: it doubles on every timed-out
/// short attempt (capped at the configured ceiling) and snaps back to its
/// reset value once an exchange step has been decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeoutState {
    long_ms: u32,
    short_reset_ms: u32,
    short_max_ms: u32,
    short_ms: u32,
    retries: u8,
}

impl TimeoutState {
    /// Create from a role configuration
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            long_ms: config.long_timeout_ms,
            short_reset_ms: config.short_timeout_ms,
            short_max_ms: config.short_timeout_max_ms,
            short_ms: config.short_timeout_ms,
            retries: config.short_retries,
        }
    }

    /// Wait for the first frame of an exchange
    pub fn long(&self) -> u32 {
        self.long_ms
    }

    /// Current wait for a frame mid-exchange
    pub fn short(&self) -> u32 {
        self.short_ms
    }

    /// Extra attempts allowed after a short timeout
    pub fn retries(&self) -> u8 {
        self.retries
    }

    /// Widen the short timeout after it expired
    pub fn back_off(&mut self) {
        self.short_ms = self.short_ms.saturating_mul(2).max(1).min(self.short_max_ms);
    }

    /// Return the short timeout to its reset value
    pub fn reset(&mut self) {
        self.short_ms = self.short_reset_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_off_doubles_until_ceiling() {
        let config = RpcConfig::master().with_short_timeout(3, 20);
        let mut state = TimeoutState::new(&config);

        assert_eq!(state.short(), 3);
        state.back_off();
        assert_eq!(state.short(), 6);
        state.back_off();
        assert_eq!(state.short(), 12);
        state.back_off();
        assert_eq!(state.short(), 20);
        state.back_off();
        assert_eq!(state.short(), 20);
    }

    #[test]
    fn test_reset_restores_initial_value() {
        let config = RpcConfig::slave();
        let mut state = TimeoutState::new(&config);
        state.back_off();
        state.back_off();
        state.reset();
        assert_eq!(state.short(), config.short_timeout_ms);
        assert_eq!(state.long(), config.long_timeout_ms);
    }

    #[test]
    fn test_zero_ceiling_stays_zero() {
        let config = RpcConfig::slave().with_short_timeout(0, 0);
        let mut state = TimeoutState::new(&config);
        state.back_off();
        assert_eq!(state.short(), 0);
    }
}
