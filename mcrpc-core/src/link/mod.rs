//! Shared link endpoint
//!
//! Both engines drive their transport through a [`Link`], which pairs the
//! transport with the role's timeout state and decides which timeout class
//! each frame gets.

pub mod timeout;

pub use timeout::TimeoutState;

use mcrpc_protocol::{deadline_after, remaining, send_frame, Error, FrameReader, Magic, Transport};

use crate::config::RpcConfig;

/// A transport plus the timeout policy of one role
pub struct Link<T> {
    transport: T,
    config: RpcConfig,
    timeouts: TimeoutState,
}

impl<T: Transport> Link<T> {
    /// Wrap a transport
    pub fn new(transport: T, config: RpcConfig) -> Self {
        Self {
            transport,
            timeouts: TimeoutState::new(&config),
            config,
        }
    }

    /// Role configuration
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Current timeout state
    pub fn timeouts(&self) -> &TimeoutState {
        &self.timeouts
    }

    /// Access the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the underlying transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send the first frame of an exchange
    pub fn send_long(&mut self, magic: Magic, payload: &[u8], timeout_ms: u32) -> Result<(), Error> {
        send_frame(&mut self.transport, magic, payload, timeout_ms)
    }

    /// Send a frame that follows one already sent
    pub fn send_short(&mut self, magic: Magic, payload: &[u8]) -> Result<(), Error> {
        let result = send_frame(&mut self.transport, magic, payload, self.timeouts.short());
        if matches!(result, Err(Error::Timeout)) {
            self.timeouts.back_off();
        }
        result
    }

    /// Wait for the first frame of an exchange
    ///
    /// Returns `None` if nothing arrived within `timeout_ms`. Misaligned or
    /// corrupted frames are skipped while time remains, so filler clocked
    /// out by an idle peer does not end the wait. A frame that started
    /// arriving and then stalled is a timeout error.
    pub fn recv_long(
        &mut self,
        magic: Magic,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<Option<usize>, Error> {
        let deadline = deadline_after(&self.transport, timeout_ms);
        loop {
            let mut reader = FrameReader::new(magic);
            let budget = remaining(&self.transport, deadline);
            let err = match reader.resume(&mut self.transport, buf, budget) {
                Ok(n) => return Ok(Some(n)),
                Err(e) => e,
            };

            if err.is_timeout() {
                return if reader.started() { Err(err) } else { Ok(None) };
            }
            if !err.is_soft() || remaining(&self.transport, deadline) == 0 {
                return Err(err);
            }
            trace!("skipping bad frame: {}", err);
        }
    }

    /// Receive a frame that follows one already received
    ///
    /// A timeout is retried with a widened short timeout, up to the
    /// configured retry count. Each retry resumes the frame where the last
    /// attempt stopped. Any other failure is returned at once.
    pub fn recv_short(&mut self, magic: Magic, buf: &mut [u8]) -> Result<usize, Error> {
        let mut reader = FrameReader::new(magic);
        let mut attempt = 0u8;
        loop {
            match reader.resume(&mut self.transport, buf, self.timeouts.short()) {
                Err(Error::Timeout) if attempt < self.timeouts.retries() => {
                    attempt += 1;
                    self.timeouts.back_off();
                    trace!("short timeout, retry {} at {} ms", attempt, self.timeouts.short());
                }
                other => return other,
            }
        }
    }

    /// Close out an exchange step, successful or not
    pub fn end_exchange(&mut self) {
        self.timeouts.reset();
    }

    /// Drop stale input when the configuration asks for it
    pub fn resync(&mut self) {
        if self.config.discard_stale_input {
            self.transport.discard_input();
        }
    }
}
