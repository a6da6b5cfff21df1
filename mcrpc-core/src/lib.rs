//! Master and slave engines for mcrpc
//!
//! This crate contains the protocol logic that sits above the wire codec
//! and does not depend on a particular bus:
//!
//! - Per-role timeout configuration
//! - Short/long timeout state shared by both roles
//! - Master engine (`call`, `put_command`, `get_result`)
//! - Slave engine (callback registry, `poll` loop, deferred callback)
//!
//! Both engines take any [`Transport`](mcrpc_protocol::Transport) at
//! construction; adapters for concrete buses live in `mcrpc-drivers`.

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to later modules
mod fmt;

pub mod config;
pub mod link;
pub mod master;
pub mod slave;

pub use config::{ConfigError, RpcConfig};
pub use master::Master;
pub use slave::{Call, Callback, Command, Poll, Registry, RegistryError, Slave, MAX_CALLBACKS};

pub use mcrpc_protocol::{Error, FrameError, TransportError, MAX_LOCAL_BUFFER};
