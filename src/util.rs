//! Small helpers shared between the sender and receiver state machines: the
//! `CAN CAN` confirmation handshake used by both directions, and a
//! best-effort-cancel wrapper for genuine transport failures.

use ::log::warn;

use crate::channel::Channel;
use crate::config::XmodemConfig;
use crate::consts::CAN;
use crate::error::Result;

/// Wait up to `config.cancel_confirm_timeout` for a second `CAN`, confirming
/// a cancel request.
pub(crate) fn confirm_cancel<C: Channel>(channel: &mut C, config: &XmodemConfig) -> Result<bool> {
	Ok(channel.read_byte(config.cancel_confirm_timeout)? == Some(CAN))
}

/// Emit three `CAN` bytes, best-effort, to make sure the peer aborts.
pub(crate) fn cancel<C: Channel>(channel: &mut C) {
	if let Err(e) = channel.write_all(&[CAN, CAN, CAN]) {
		warn!("failed to send cancel: {}", e);
	}
}

/// Run a single channel operation; on a genuine transport failure (not a
/// recoverable protocol condition — those never reach here as an `Err`),
/// make a best-effort attempt to tell the peer to abort before the error
/// propagates, per the "session aborts ... if possible" transport-error rule.
pub(crate) fn cancel_on_err<C: Channel, T>(
	channel: &mut C,
	op: impl FnOnce(&mut C) -> Result<T>,
) -> Result<T> {
	let result = op(channel);
	if result.is_err() {
		cancel(channel);
	}
	result
}
