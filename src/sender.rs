//! The sender state machine (§4.5): await negotiation, stream the payload
//! as framed packets, handle acks/retries, terminate with EOT.

use ::log::{debug, warn};

use crate::channel::Channel;
use crate::config::XmodemConfig;
use crate::consts::{ACK, CAN, CRC_PREFERENCE, EOT, NAK, ONEK_BLOCK_LEN};
use crate::error::{Error, Result};
use crate::packet::{self, BlockLength, Mode};
use crate::payload::PayloadSource;
use crate::util::{cancel, cancel_on_err, confirm_cancel};

/// Run the sender state machine to completion.
pub(crate) fn run<C: Channel, P: PayloadSource>(
	channel: &mut C,
	config: &XmodemConfig,
	source: &mut P,
) -> Result<()> {
	let mode = await_preference(channel, config)?;
	debug!("sender: negotiated {:?}", mode);

	let mut seq: u8 = 1;
	let mut error_count = 0u32;

	while source.remaining() > 0 {
		let use_1k = matches!(mode, Mode::Crc) && source.remaining() >= ONEK_BLOCK_LEN;
		let block_len = if use_1k { BlockLength::OneK } else { BlockLength::Standard };

		let mut block = [config.pad_byte; ONEK_BLOCK_LEN];
		let slice = &mut block[..block_len.len()];
		source.read(slice)?;

		let frame = packet::encode(mode, seq, block_len, slice);

		loop {
			cancel_on_err(channel, |c| c.write_all(frame.as_slice()))?;
			cancel_on_err(channel, |c| c.flush())?;
			debug!("sender: sent block {}", seq);

			match cancel_on_err(channel, |c| c.read_byte(config.sender_response_timeout))? {
				Some(ACK) => {
					seq = seq.wrapping_add(1);
					break;
				}
				Some(CAN) => {
					if cancel_on_err(channel, |c| confirm_cancel(c, config))? {
						cancel_on_err(channel, |c| c.write_all(&[ACK]))?;
						return Err(Error::Canceled);
					}
					warn!("sender: spurious CAN ignored");
					error_count += 1;
				}
				Some(NAK) => {
					warn!("sender: NAK for block {}, retransmitting", seq);
					error_count += 1;
				}
				Some(b) => {
					warn!("sender: expected ACK, got {:#04x}", b);
					error_count += 1;
				}
				None => {
					warn!("sender: timeout waiting for response to block {}", seq);
					error_count += 1;
				}
			}

			if error_count >= config.max_errors {
				cancel(channel);
				return Err(Error::ExhaustedRetries);
			}
		}
	}

	terminate(channel, config)
}

fn await_preference<C: Channel>(channel: &mut C, config: &XmodemConfig) -> Result<Mode> {
	for _ in 0..config.sender_preference_rounds {
		match cancel_on_err(channel, |c| c.read_byte(config.sender_preference_round_timeout))? {
			Some(CRC_PREFERENCE) => return Ok(Mode::Crc),
			Some(NAK) => return Ok(Mode::Checksum),
			Some(CAN) => {
				if cancel_on_err(channel, |c| confirm_cancel(c, config))? {
					cancel_on_err(channel, |c| c.write_all(&[ACK]))?;
					return Err(Error::Canceled);
				}
				warn!("sender: spurious CAN ignored while awaiting preference");
			}
			Some(b) => warn!("sender: unexpected byte {:#04x} while awaiting preference", b),
			None => debug!("sender: preference wait timed out, retrying"),
		}
	}

	cancel(channel);
	Err(Error::NegotiationFailed)
}

fn terminate<C: Channel>(channel: &mut C, config: &XmodemConfig) -> Result<()> {
	for _ in 0..config.sender_eot_attempts {
		cancel_on_err(channel, |c| c.write_all(&[EOT]))?;
		cancel_on_err(channel, |c| c.flush())?;

		match cancel_on_err(channel, |c| c.read_byte(config.sender_eot_timeout))? {
			Some(ACK) => {
				debug!("sender: transfer complete");
				return Ok(());
			}
			Some(CAN) => {
				if cancel_on_err(channel, |c| confirm_cancel(c, config))? {
					cancel_on_err(channel, |c| c.write_all(&[ACK]))?;
					return Err(Error::Canceled);
				}
			}
			Some(b) => warn!("sender: expected ACK for EOT, got {:#04x}", b),
			None => warn!("sender: timeout waiting for ACK of EOT"),
		}
	}

	cancel(channel);
	Err(Error::ExhaustedRetries)
}
