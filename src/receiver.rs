//! The receiver state machine (§4.4): negotiate, receive and validate
//! packets in order, emit the assembled payload.

use ::log::{debug, warn};

use crate::channel::Channel;
use crate::config::XmodemConfig;
use crate::consts::{ACK, CAN, CRC_PREFERENCE, EOT, NAK, SOH, STX};
use crate::error::{Error, Result};
use crate::packet::{self, BlockLength, Mode};
use crate::payload::PayloadSink;
use crate::util::{cancel, cancel_on_err, confirm_cancel};

/// Run the receiver state machine to completion.
///
/// On success the assembled, untrimmed payload has been appended to `sink`.
/// On failure an [`Error`] describes why the transfer was abandoned; the
/// peer has already been sent three `CAN` bytes where that's called for.
pub(crate) fn run<C: Channel, S: PayloadSink>(
	channel: &mut C,
	config: &XmodemConfig,
	sink: &mut S,
) -> Result<()> {
	let mut error_count = 0u32;
	let mut expected_seq: u8 = 1;

	let (mode, mut pending_start) = match negotiate(channel, config)? {
		Negotiation::Eot => {
			cancel_on_err(channel, |c| c.write_all(&[ACK]))?;
			debug!("receiver: EOT during negotiation, empty transfer");
			return Ok(());
		}
		Negotiation::DataFrame { mode, start_byte } => (mode, Some(start_byte)),
	};
	debug!("receiver: negotiated {:?}", mode);

	loop {
		let start = match pending_start.take() {
			Some(b) => b,
			None => match cancel_on_err(channel, |c| c.read_byte(config.receiver_byte_timeout))? {
				Some(b) => b,
				None => {
					cancel_on_err(channel, |c| c.write_all(&[NAK]))?;
					error_count += 1;
					if error_count >= config.max_errors {
						cancel(channel);
						return Err(Error::ExhaustedRetries);
					}
					continue;
				}
			},
		};

		match start {
			SOH | STX => {
				let block_len = BlockLength::from_start_byte(start).expect("matched above");
				match receive_block(channel, mode, block_len, &mut expected_seq, &mut error_count, sink, config)? {
					BlockOutcome::Continue => continue,
				}
			}
			EOT => {
				cancel_on_err(channel, |c| c.write_all(&[ACK]))?;
				debug!("receiver: transfer complete");
				return Ok(());
			}
			CAN => {
				if cancel_on_err(channel, |c| confirm_cancel(c, config))? {
					cancel_on_err(channel, |c| c.write_all(&[ACK]))?;
					return Err(Error::Canceled);
				}
				warn!("receiver: spurious CAN ignored");
				continue;
			}
			_ => {
				cancel_on_err(channel, |c| c.write_all(&[NAK]))?;
				error_count += 1;
				if error_count >= config.max_errors {
					cancel(channel);
					return Err(Error::ExhaustedRetries);
				}
				continue;
			}
		}
	}
}

enum Negotiation {
	DataFrame { mode: Mode, start_byte: u8 },
	Eot,
}

fn negotiate<C: Channel>(channel: &mut C, config: &XmodemConfig) -> Result<Negotiation> {
	let preferences: [(u8, Mode); 2] = [
		(CRC_PREFERENCE, Mode::Crc),
		(NAK, Mode::Checksum),
	];

	for (preference_byte, mode_if_matched) in preferences.iter().copied() {
		for _ in 0..config.receiver_negotiation_rounds {
			cancel_on_err(channel, |c| c.write_all(&[preference_byte]))?;
			match cancel_on_err(channel, |c| c.read_byte(config.receiver_negotiation_round_timeout))? {
				Some(SOH) => {
					return Ok(Negotiation::DataFrame {
						mode: mode_if_matched,
						start_byte: SOH,
					})
				}
				Some(STX) => {
					return Ok(Negotiation::DataFrame {
						mode: Mode::Crc,
						start_byte: STX,
					})
				}
				Some(EOT) => return Ok(Negotiation::Eot),
				Some(CAN) => {
					if cancel_on_err(channel, |c| confirm_cancel(c, config))? {
						cancel_on_err(channel, |c| c.write_all(&[ACK]))?;
						return Err(Error::Canceled);
					}
					warn!("receiver: spurious CAN ignored during negotiation");
				}
				Some(b) => warn!("receiver: unexpected byte {:#04x} during negotiation", b),
				None => debug!("receiver: negotiation round timed out, resending preference"),
			}
		}
	}

	cancel(channel);
	Err(Error::NegotiationFailed)
}

enum BlockOutcome {
	Continue,
}

#[allow(clippy::too_many_arguments)]
fn receive_block<C: Channel, S: PayloadSink>(
	channel: &mut C,
	mode: Mode,
	block_len: BlockLength,
	expected_seq: &mut u8,
	error_count: &mut u32,
	sink: &mut S,
	config: &XmodemConfig,
) -> Result<BlockOutcome> {
	let total = 2 + block_len.len() + mode.trailer_len();
	let mut raw = [0u8; packet::MAX_WIRE_LEN];

	for slot in raw.iter_mut().take(total) {
		match cancel_on_err(channel, |c| c.read_byte(config.receiver_byte_timeout))? {
			Some(b) => *slot = b,
			None => {
				cancel_on_err(channel, |c| c.write_all(&[NAK]))?;
				*error_count += 1;
				if *error_count >= config.max_errors {
					cancel(channel);
					return Err(Error::ExhaustedRetries);
				}
				return Ok(BlockOutcome::Continue);
			}
		}
	}

	match packet::decode(&raw[..total], block_len, mode) {
		Err(_) => {
			cancel_on_err(channel, |c| c.write_all(&[NAK]))?;
			*error_count += 1;
			if *error_count >= config.max_errors {
				cancel(channel);
				return Err(Error::ExhaustedRetries);
			}
			Ok(BlockOutcome::Continue)
		}
		Ok(packet) => {
			if packet.seq == *expected_seq {
				sink.extend(packet.payload());
				*error_count = 0;
				*expected_seq = expected_seq.wrapping_add(1);
				cancel_on_err(channel, |c| c.write_all(&[ACK]))?;
				debug!("receiver: accepted block {}", packet.seq);
				Ok(BlockOutcome::Continue)
			} else if packet.seq == expected_seq.wrapping_sub(1) {
				// Benign retransmission of the previously accepted block.
				// Acknowledged, not appended, and not counted as an error.
				cancel_on_err(channel, |c| c.write_all(&[ACK]))?;
				debug!("receiver: duplicate of block {}", packet.seq);
				Ok(BlockOutcome::Continue)
			} else {
				cancel(channel);
				Err(Error::Desync)
			}
		}
	}
}
