#![cfg_attr(not(feature = "std"), no_std)]

//! A protocol engine for the XMODEM family of file-transfer protocols:
//! classic XMODEM (128-byte blocks, 8-bit checksum), XMODEM-CRC (128-byte
//! blocks, 16-bit CRC), and XMODEM-1K (1024-byte CRC blocks).
//!
//! This crate is the protocol engine only: framing, the sender/receiver
//! state machines, the integrity algorithms, and the timeout/retry policy.
//! Constructing the actual byte channel (a serial port, a socket, a pipe)
//! is the caller's job — implement [`Channel`] (or [`SetReadTimeout`] plus
//! `Read`/`Write` to get it for free) over whatever transport you have,
//! then drive a transfer through [`Session`]:
//!
//! ```no_run
//! use xmodem_proto::{Session, SliceSource};
//! # fn get_channel() -> impl xmodem_proto::Channel { unimplemented!() }
//! let channel = get_channel();
//! let mut session = Session::new(channel);
//! let data = b"hello, modem";
//! let mut source = SliceSource::new(data);
//! session.send(&mut source).unwrap();
//! ```
//!
//! # Non-goals
//!
//! This crate does not perform flow control beyond the protocol's natural
//! stop-and-wait handshake, does not support duplex transfer, does not
//! implement YMODEM or ZMODEM, and does not expose caller-initiated
//! cancellation mid-transfer (cancellation is received from the peer only,
//! as a `CAN CAN` sequence).

mod channel;
mod checksum;
mod config;
mod consts;
mod error;
mod packet;
mod payload;
mod receiver;
mod sender;
mod session;
mod util;

pub use channel::{Channel, SetReadTimeout};
pub use config::XmodemConfig;
pub use consts::MAX_ERRORS;
pub use error::{Error, Result, TransportError};
pub use packet::{trim_sub_padding, BlockLength, Mode};
pub use payload::{PayloadSink, PayloadSource, SliceSource};
pub use session::Session;
