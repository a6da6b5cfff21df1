//! Master engine
//!
//! Sequences one remote call at a time:
//!
//! ```text
//! put_command:  command header (long) ─▶ command data (short, if any)
//! get_result:   result header (long)  ─▶ result data (short, if any)
//! ```
//!
//! The two halves are exposed separately so a caller can do other work
//! while the slave runs the callback.

use mcrpc_protocol::{
    CommandHeader, Error, FrameError, Magic, ResultHeader, Transport, MAX_LOCAL_BUFFER,
};

use crate::config::RpcConfig;
use crate::link::Link;

/// Calling side of a link
///
/// `B` bounds the outbound payload, matching the local buffer of the slave
/// this master talks to.
pub struct Master<T, const B: usize = MAX_LOCAL_BUFFER> {
    link: Link<T>,
}

impl<T: Transport> Master<T> {
    /// Create a master with the default payload limit
    pub fn new(transport: T, config: RpcConfig) -> Self {
        Self::with_limit(transport, config)
    }
}

impl<T: Transport, const B: usize> Master<T, B> {
    /// Create a master with an explicit payload limit
    pub fn with_limit(transport: T, config: RpcConfig) -> Self {
        Self {
            link: Link::new(transport, config),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &RpcConfig {
        self.link.config()
    }

    /// Access the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        self.link.transport_mut()
    }

    /// Give back the underlying transport
    pub fn into_transport(self) -> T {
        self.link.into_transport()
    }

    /// Send a command to the slave
    ///
    /// The command header waits up to `timeout_ms`; the data frame that
    /// follows uses the short timeout.
    pub fn put_command(&mut self, rpc_id: u32, data: &[u8], timeout_ms: u32) -> Result<(), Error> {
        if data.len() > B {
            return Err(Error::Capacity {
                len: data.len() as u32,
                capacity: B as u32,
            });
        }

        self.link.resync();

        let header = CommandHeader {
            rpc_id,
            payload_len: data.len() as u32,
        };
        let result = self.send_command(&header, data, timeout_ms);
        self.link.end_exchange();

        match result {
            Ok(()) => trace!("command {} sent, {} bytes", rpc_id, data.len()),
            Err(e) => debug!("command {} not sent: {}", rpc_id, e),
        }
        result
    }

    fn send_command(&mut self, header: &CommandHeader, data: &[u8], timeout_ms: u32) -> Result<(), Error> {
        self.link
            .send_long(Magic::CommandHeader, &header.to_bytes(), timeout_ms)?;
        if !data.is_empty() {
            self.link.send_short(Magic::CommandData, data)?;
        }
        Ok(())
    }

    /// Wait for the slave's result and copy it into `buf`
    ///
    /// Returns the result length. A result longer than `buf` fails before
    /// its data frame is read.
    pub fn get_result(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Error> {
        let result = self.receive_result(buf, timeout_ms);
        self.link.end_exchange();

        if let Err(e) = &result {
            debug!("no result: {}", e);
        }
        result
    }

    fn receive_result(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Error> {
        let mut raw = [0u8; ResultHeader::SIZE];
        let n = self
            .link
            .recv_long(Magic::ResultHeader, &mut raw, timeout_ms)?
            .ok_or(Error::Timeout)?;
        let header = ResultHeader::from_bytes(&raw[..n])?;

        let len = header.payload_len as usize;
        if len > buf.len() {
            return Err(Error::Capacity {
                len: header.payload_len,
                capacity: buf.len() as u32,
            });
        }
        if len == 0 {
            return Ok(0);
        }

        let received = self.link.recv_short(Magic::ResultData, &mut buf[..len])?;
        if received != len {
            return Err(FrameError::Malformed.into());
        }
        Ok(len)
    }

    /// Run a full remote call
    ///
    /// Sends `out` to callback `rpc_id` and copies its result into `input`.
    /// Returns the result length.
    pub fn call(
        &mut self,
        rpc_id: u32,
        out: &[u8],
        input: &mut [u8],
        send_timeout_ms: u32,
        recv_timeout_ms: u32,
    ) -> Result<usize, Error> {
        self.put_command(rpc_id, out, send_timeout_ms)?;
        self.get_result(input, recv_timeout_ms)
    }

    /// [`call`](Self::call) with the configured long timeout for both halves
    pub fn invoke(&mut self, rpc_id: u32, out: &[u8], input: &mut [u8]) -> Result<usize, Error> {
        let timeout = self.link.config().long_timeout_ms;
        self.call(rpc_id, out, input, timeout, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcrpc_protocol::{mock, receive_frame, send_frame, TransportError};

    fn fast() -> RpcConfig {
        RpcConfig::master()
            .with_long_timeout(0)
            .with_short_timeout(0, 0)
            .with_short_retries(0)
    }

    #[test]
    fn test_put_command_frames() {
        let (mut slave, end) = mock::duplex();
        let mut master = Master::new(end, fast());

        master.put_command(7, &[1, 2, 3], 0).unwrap();

        let mut buf = [0u8; 16];
        let n = receive_frame(&mut slave, Magic::CommandHeader, &mut buf, 0).unwrap();
        let header = CommandHeader::from_bytes(&buf[..n]).unwrap();
        assert_eq!(header.rpc_id, 7);
        assert_eq!(header.payload_len, 3);

        let n = receive_frame(&mut slave, Magic::CommandData, &mut buf, 0).unwrap();
        assert_eq!(&buf[..n], &[1, 2, 3]);
        assert_eq!(slave.pending(), 0);
    }

    #[test]
    fn test_put_command_without_data_sends_header_only() {
        let (slave, end) = mock::duplex();
        let mut master = Master::new(end, fast());

        master.put_command(1, &[], 0).unwrap();
        assert_eq!(slave.pending(), 8 + CommandHeader::SIZE);
    }

    #[test]
    fn test_put_command_rejects_oversized_payload() {
        let (slave, end) = mock::duplex();
        let mut master: Master<_, 4> = Master::with_limit(end, fast());

        let result = master.put_command(1, &[0; 5], 0);
        assert_eq!(result, Err(Error::Capacity { len: 5, capacity: 4 }));
        assert_eq!(slave.pending(), 0);
    }

    #[test]
    fn test_put_command_discards_stale_input() {
        let (mut slave, end) = mock::duplex();
        let mut master = Master::new(end, fast());
        slave.write(&[0xAA; 3], 0).unwrap();

        master.put_command(1, &[], 0).unwrap();
        assert_eq!(master.transport_mut().pending(), 0);
    }

    #[test]
    fn test_put_command_write_failure() {
        let (_slave, mut end) = mock::duplex();
        end.fail_writes(TransportError::Bus);
        let mut master = Master::new(end, fast());

        assert_eq!(master.put_command(1, &[1], 0), Err(Error::Transport));
    }

    #[test]
    fn test_get_result_copies_data() {
        let (mut slave, end) = mock::duplex();
        let mut master = Master::new(end, fast());

        let header = ResultHeader { payload_len: 2 };
        send_frame(&mut slave, Magic::ResultHeader, &header.to_bytes(), 0).unwrap();
        send_frame(&mut slave, Magic::ResultData, &[9, 8], 0).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(master.get_result(&mut buf, 0), Ok(2));
        assert_eq!(&buf[..2], &[9, 8]);
    }

    #[test]
    fn test_get_result_empty() {
        let (mut slave, end) = mock::duplex();
        let mut master = Master::new(end, fast());

        let header = ResultHeader { payload_len: 0 };
        send_frame(&mut slave, Magic::ResultHeader, &header.to_bytes(), 0).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(master.get_result(&mut buf, 0), Ok(0));
    }

    #[test]
    fn test_get_result_buffer_too_small() {
        let (mut slave, end) = mock::duplex();
        let mut master = Master::new(end, fast());

        let header = ResultHeader { payload_len: 6 };
        send_frame(&mut slave, Magic::ResultHeader, &header.to_bytes(), 0).unwrap();
        send_frame(&mut slave, Magic::ResultData, &[1; 6], 0).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(
            master.get_result(&mut buf, 0),
            Err(Error::Capacity { len: 6, capacity: 4 })
        );
        assert_eq!(buf, [0; 4]);
        // Data frame left unread
        assert_eq!(master.transport_mut().pending(), 8 + 6);
    }

    #[test]
    fn test_get_result_short_data_is_malformed() {
        let (mut slave, end) = mock::duplex();
        let mut master = Master::new(end, fast());

        let header = ResultHeader { payload_len: 3 };
        send_frame(&mut slave, Magic::ResultHeader, &header.to_bytes(), 0).unwrap();
        send_frame(&mut slave, Magic::ResultData, &[1, 2], 0).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(
            master.get_result(&mut buf, 0),
            Err(Error::Frame(FrameError::Malformed))
        );
    }

    #[test]
    fn test_get_result_times_out_without_slave() {
        let (_slave, end) = mock::duplex();
        let mut master = Master::new(end, fast());

        let mut buf = [0u8; 4];
        assert_eq!(master.get_result(&mut buf, 0), Err(Error::Timeout));
    }

    #[test]
    fn test_get_result_wrong_magic() {
        let (mut slave, end) = mock::duplex();
        let mut master = Master::new(end, fast());
        send_frame(&mut slave, Magic::CommandHeader, &[0; 8], 0).unwrap();

        let mut buf = [0u8; 4];
        let err = master.get_result(&mut buf, 0).unwrap_err();
        assert!(matches!(err, Error::Frame(FrameError::MagicMismatch { .. })));
        assert!(err.is_soft());
    }
}
