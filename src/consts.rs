//! Wire-protocol byte literals and timeout/retry constants.
//!
//! These are the only process-wide values the engine depends on; they are
//! configuration, not state.

#[cfg(not(feature = "std"))]
use core::time::Duration;
#[cfg(feature = "std")]
use std::time::Duration;

pub(crate) const SOH: u8 = 0x01;
pub(crate) const STX: u8 = 0x02;
pub(crate) const EOT: u8 = 0x04;
pub(crate) const ACK: u8 = 0x06;
pub(crate) const NAK: u8 = 0x15;
pub(crate) const CAN: u8 = 0x18;
/// ASCII SUB (substitute), used to pad a partial final block.
pub(crate) const SUB: u8 = 0x1A;
/// The letter `C`, the receiver's "I can do CRC" preference byte.
pub(crate) const CRC_PREFERENCE: u8 = 0x43;

pub(crate) const STANDARD_BLOCK_LEN: usize = 128;
pub(crate) const ONEK_BLOCK_LEN: usize = 1024;

/// Number of recoverable errors tolerated before a session aborts.
pub const MAX_ERRORS: u32 = 25;

/// How long the receiver waits for a byte during a single negotiation round.
pub const RECEIVER_NEGOTIATION_ROUND_TIMEOUT: Duration = Duration::from_secs(10);
/// Negotiation rounds attempted per preference level (`C`, then `NAK`).
pub const RECEIVER_NEGOTIATION_ROUNDS: u32 = 10;
/// Per-byte timeout while a block is in flight.
pub const RECEIVER_BYTE_TIMEOUT: Duration = Duration::from_secs(2);

/// How long the sender waits for a preference byte during a single round.
pub const SENDER_PREFERENCE_ROUND_TIMEOUT: Duration = Duration::from_secs(3);
/// Negotiation rounds the sender attempts before giving up.
pub const SENDER_PREFERENCE_ROUNDS: u32 = 16;
/// How long the sender waits for a response after transmitting a block.
pub const SENDER_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
/// How long the sender waits for an ACK after sending EOT, per attempt.
pub const SENDER_EOT_TIMEOUT: Duration = Duration::from_secs(2);
/// Number of EOT retransmission attempts.
pub const SENDER_EOT_ATTEMPTS: u32 = 10;

/// Window within which a second `CAN` confirms a cancel request.
pub const CANCEL_CONFIRM_TIMEOUT: Duration = Duration::from_secs(1);

/// Default pad byte used to fill a partial final block (ASCII SUB).
pub const DEFAULT_PAD_BYTE: u8 = SUB;
