//! Session-level configuration: tunable limits and timeouts, all defaulted
//! to the values this protocol mandates.

#[cfg(not(feature = "std"))]
use core::time::Duration;
#[cfg(feature = "std")]
use std::time::Duration;

use crate::consts::*;

/// Tunables for a single [`Session`](crate::Session).
///
/// Mirrors the teacher crate's public `max_errors`/`pad_byte` fields on its
/// `Xmodem` struct, extended with the timeout table this spec requires
/// (the teacher left timeouts to the caller's transport configuration).
#[derive(Copy, Clone, Debug)]
pub struct XmodemConfig {
	/// Errors tolerated before a transfer aborts. Errors include bad
	/// checksums/CRCs and timeouts while waiting for bytes.
	pub max_errors: u32,

	/// The byte used to pad a partial final block.
	pub pad_byte: u8,

	/// How long the receiver waits for a byte during one negotiation round.
	pub receiver_negotiation_round_timeout: Duration,
	/// Negotiation rounds attempted per preference level (`C`, then `NAK`).
	pub receiver_negotiation_rounds: u32,
	/// Per-byte timeout while a block is in flight.
	pub receiver_byte_timeout: Duration,

	/// How long the sender waits for a preference byte per round.
	pub sender_preference_round_timeout: Duration,
	/// Negotiation rounds the sender attempts before giving up.
	pub sender_preference_rounds: u32,
	/// How long the sender waits for a response after transmitting a block.
	pub sender_response_timeout: Duration,
	/// How long the sender waits for an ACK after EOT, per attempt.
	pub sender_eot_timeout: Duration,
	/// Number of EOT retransmission attempts.
	pub sender_eot_attempts: u32,

	/// Window within which a second `CAN` confirms a cancel request.
	pub cancel_confirm_timeout: Duration,
}

impl Default for XmodemConfig {
	fn default() -> Self {
		XmodemConfig {
			max_errors: MAX_ERRORS,
			pad_byte: DEFAULT_PAD_BYTE,
			receiver_negotiation_round_timeout: RECEIVER_NEGOTIATION_ROUND_TIMEOUT,
			receiver_negotiation_rounds: RECEIVER_NEGOTIATION_ROUNDS,
			receiver_byte_timeout: RECEIVER_BYTE_TIMEOUT,
			sender_preference_round_timeout: SENDER_PREFERENCE_ROUND_TIMEOUT,
			sender_preference_rounds: SENDER_PREFERENCE_ROUNDS,
			sender_response_timeout: SENDER_RESPONSE_TIMEOUT,
			sender_eot_timeout: SENDER_EOT_TIMEOUT,
			sender_eot_attempts: SENDER_EOT_ATTEMPTS,
			cancel_confirm_timeout: CANCEL_CONFIRM_TIMEOUT,
		}
	}
}
