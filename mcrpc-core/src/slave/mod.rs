//! Slave engine
//!
//! The serving side owns a callback registry, one local buffer and a
//! single deferred-callback slot. Each [`Slave::poll`] is one service
//! iteration:
//!
//! ```text
//! deferred callback? ─▶ run it (no id, no input)
//!         │
//!         ▼
//! command header (long) ──silence──▶ Idle
//!         │
//! command data (short, if any)
//!         │
//! registered? ──no──▶ Unhandled (nothing sent)
//!         │
//! callback ─▶ result header (long) ─▶ result data (short, if any)
//! ```

pub mod registry;

pub use registry::{Callback, Registry, RegistryError, MAX_CALLBACKS};

use mcrpc_protocol::{
    CommandHeader, Error, FrameError, Magic, ResultHeader, Transport, MAX_LOCAL_BUFFER,
};

use crate::config::RpcConfig;
use crate::link::Link;

/// Context handed to a callback
///
/// The input sits at the start of the local buffer. A callback writes its
/// result into the same buffer (in place is fine) and returns its length.
pub struct Call<'a> {
    rpc_id: Option<u32>,
    buf: &'a mut [u8],
    len: usize,
    deferred: &'a mut Option<Callback>,
}

impl<'a> Call<'a> {
    pub(crate) fn new(
        rpc_id: Option<u32>,
        buf: &'a mut [u8],
        len: usize,
        deferred: &'a mut Option<Callback>,
    ) -> Self {
        let len = len.min(buf.len());
        Self {
            rpc_id,
            buf,
            len,
            deferred,
        }
    }

    /// Id the callback was invoked for
    ///
    /// `None` when it runs as the deferred callback.
    pub fn rpc_id(&self) -> Option<u32> {
        self.rpc_id
    }

    /// Received command data
    pub fn input(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Whole local buffer, input included
    pub fn buffer(&mut self) -> &mut [u8] {
        self.buf
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Copy `data` into the buffer as the result
    ///
    /// Data beyond the buffer capacity is dropped. Returns the length to
    /// hand back from the callback.
    pub fn respond(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.buf.len());
        self.buf[..n].copy_from_slice(&data[..n]);
        n
    }

    /// Run `callback` at the start of the next poll
    ///
    /// Replaces any callback already scheduled.
    pub fn schedule(&mut self, callback: Callback) {
        *self.deferred = Some(callback);
    }
}

/// A received command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    pub rpc_id: u32,
    /// Bytes of command data at the start of the slave buffer
    pub len: usize,
}

/// Outcome of one service iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Poll {
    /// No command arrived
    Idle,
    /// A callback ran and its result was sent
    Dispatched(u32),
    /// A command arrived for an unregistered id and was dropped
    Unhandled(u32),
    /// The exchange broke off
    Failed(Error),
}

/// Serving side of a link
///
/// `N` is the registry capacity and `B` the local buffer size.
pub struct Slave<T, const N: usize = MAX_CALLBACKS, const B: usize = MAX_LOCAL_BUFFER> {
    link: Link<T>,
    registry: Registry<N>,
    deferred: Option<Callback>,
    buffer: [u8; B],
}

impl<T: Transport> Slave<T> {
    /// Create a slave with the default capacities
    pub fn new(transport: T, config: RpcConfig) -> Self {
        Self::with_capacity(transport, config)
    }
}

impl<T: Transport, const N: usize, const B: usize> Slave<T, N, B> {
    /// Create a slave with explicit capacities
    pub fn with_capacity(transport: T, config: RpcConfig) -> Self {
        Self {
            link: Link::new(transport, config),
            registry: Registry::new(),
            deferred: None,
            buffer: [0; B],
        }
    }

    pub fn config(&self) -> &RpcConfig {
        self.link.config()
    }

    pub fn registry(&self) -> &Registry<N> {
        &self.registry
    }

    /// Local buffer contents
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Access the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        self.link.transport_mut()
    }

    /// Give back the underlying transport
    pub fn into_transport(self) -> T {
        self.link.into_transport()
    }

    /// Register `callback` for `rpc_id`
    pub fn register_callback(&mut self, rpc_id: u32, callback: Callback) -> Result<(), RegistryError> {
        let result = self.registry.register(rpc_id, callback);
        match result {
            Ok(()) => debug!("registered rpc {}", rpc_id),
            Err(e) => warn!("rpc {} not registered: {}", rpc_id, e),
        }
        result
    }

    /// Look up the callback for `rpc_id`
    pub fn find_callback(&self, rpc_id: u32) -> Option<Callback> {
        self.registry.find(rpc_id)
    }

    /// Run `callback` at the start of the next poll
    ///
    /// Replaces any callback already scheduled.
    pub fn schedule_callback(&mut self, callback: Callback) {
        self.deferred = Some(callback);
    }

    /// Check whether a deferred callback is waiting
    pub fn has_scheduled(&self) -> bool {
        self.deferred.is_some()
    }

    /// Receive one command into the local buffer
    ///
    /// Waits the long timeout for the header. A command longer than the
    /// local buffer is rejected before its data frame is read, so the
    /// buffer keeps its previous contents. On any failure other than an
    /// idle timeout, stale input is dropped.
    pub fn get_command(&mut self) -> Result<Command, Error> {
        self.next_command()?.ok_or(Error::Timeout)
    }

    /// `None` when the link stayed idle
    fn next_command(&mut self) -> Result<Option<Command>, Error> {
        let result = self.receive_command();
        self.link.end_exchange();

        match result {
            Ok(command) => Ok(Some(command)),
            Err(Received::Idle) => Ok(None),
            Err(Received::Broken(e)) => {
                debug!("command dropped: {}", e);
                self.link.resync();
                Err(e)
            }
        }
    }

    fn receive_command(&mut self) -> Result<Command, Received> {
        let long = self.link.config().long_timeout_ms;
        let mut raw = [0u8; CommandHeader::SIZE];
        let n = match self.link.recv_long(Magic::CommandHeader, &mut raw, long) {
            Ok(Some(n)) => n,
            Ok(None) => return Err(Received::Idle),
            Err(e) => return Err(Received::Broken(e)),
        };
        let header = CommandHeader::from_bytes(&raw[..n]).map_err(|e| Received::Broken(e.into()))?;

        let len = header.payload_len as usize;
        if len > B {
            return Err(Received::Broken(Error::Capacity {
                len: header.payload_len,
                capacity: B as u32,
            }));
        }

        if len > 0 {
            let received = self
                .link
                .recv_short(Magic::CommandData, &mut self.buffer[..len])
                .map_err(Received::Broken)?;
            if received != len {
                return Err(Received::Broken(FrameError::Malformed.into()));
            }
        }

        trace!("command {} received, {} bytes", header.rpc_id, len);
        Ok(Command {
            rpc_id: header.rpc_id,
            len,
        })
    }

    /// Send a result to the master
    pub fn put_result(&mut self, data: &[u8]) -> Result<(), Error> {
        let result = send_result::<T, B>(&mut self.link, data);
        self.link.end_exchange();
        result
    }

    /// One service iteration
    ///
    /// Runs the deferred callback if one is waiting, then waits for a
    /// command and dispatches it. Unknown ids are dropped without a reply.
    pub fn poll(&mut self) -> Poll {
        if let Some(callback) = self.deferred.take() {
            let mut call = Call::new(None, &mut self.buffer, 0, &mut self.deferred);
            callback(&mut call);
            trace!("deferred callback ran");
        }

        let command = match self.next_command() {
            Ok(Some(command)) => command,
            Ok(None) => return Poll::Idle,
            Err(e) => return Poll::Failed(e),
        };

        let Some(callback) = self.registry.find(command.rpc_id) else {
            debug!("no callback for rpc {}", command.rpc_id);
            return Poll::Unhandled(command.rpc_id);
        };

        let mut call = Call::new(
            Some(command.rpc_id),
            &mut self.buffer,
            command.len,
            &mut self.deferred,
        );
        let len = callback(&mut call).min(B);

        let result = send_result::<T, B>(&mut self.link, &self.buffer[..len]);
        self.link.end_exchange();

        match result {
            Ok(()) => Poll::Dispatched(command.rpc_id),
            Err(e) => {
                debug!("result for rpc {} not sent: {}", command.rpc_id, e);
                self.link.resync();
                Poll::Failed(e)
            }
        }
    }
}

/// Why no command came out of a receive
enum Received {
    Idle,
    Broken(Error),
}

fn send_result<T: Transport, const B: usize>(link: &mut Link<T>, data: &[u8]) -> Result<(), Error> {
    if data.len() > B {
        return Err(Error::Capacity {
            len: data.len() as u32,
            capacity: B as u32,
        });
    }

    let header = ResultHeader {
        payload_len: data.len() as u32,
    };
    let long = link.config().long_timeout_ms;
    link.send_long(Magic::ResultHeader, &header.to_bytes(), long)?;
    if !data.is_empty() {
        link.send_short(Magic::ResultData, data)?;
    }
    Ok(())
}
