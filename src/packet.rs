//! The framed on-wire packet: header, payload, trailer.
//!
//! `encode`/`decode` are free functions over plain byte slices so the
//! "bad packet -> NAK -> retry" loop in the state machines can be unit
//! tested without a live channel.

use crate::checksum::{checksum, crc16};
use crate::consts::{ONEK_BLOCK_LEN, SOH, STANDARD_BLOCK_LEN, STX, SUB};

/// The integrity algorithm negotiated for a session.
///
/// XMODEM-1K is not a third, disjoint mode: it is a CRC session in which the
/// sender chooses to emit a 1024-byte (`STX`) block instead of a 128-byte
/// (`SOH`) one whenever it has a full block of data left to send — a
/// block-length decision the sender makes per block (see `sender::run`), not
/// a negotiated property of the session. `Mode` only needs to distinguish
/// the trailer's integrity algorithm.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
	/// Classic XMODEM: 128-byte blocks, 8-bit additive checksum.
	Checksum,
	/// XMODEM-CRC or XMODEM-1K: 16-bit CRC trailer.
	Crc,
}

impl Mode {
	pub(crate) fn trailer_len(self) -> usize {
		match self {
			Mode::Checksum => 1,
			Mode::Crc => 2,
		}
	}
}

/// The size of a single packet's payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockLength {
	/// 128-byte block, framed with `SOH`.
	Standard = 128,
	/// 1024-byte block, framed with `STX`.
	OneK = 1024,
}

impl BlockLength {
	pub(crate) fn len(self) -> usize {
		self as usize
	}

	pub(crate) fn start_byte(self) -> u8 {
		match self {
			BlockLength::Standard => SOH,
			BlockLength::OneK => STX,
		}
	}

	pub(crate) fn from_start_byte(b: u8) -> Option<Self> {
		match b {
			SOH => Some(BlockLength::Standard),
			STX => Some(BlockLength::OneK),
			_ => None,
		}
	}
}

/// A decoded data packet: its sequence number and its payload bytes
/// (untrimmed — trailing `SUB` padding, if any, is preserved).
pub(crate) struct Packet {
	pub seq: u8,
	block: Block,
}

impl Packet {
	pub(crate) fn payload(&self) -> &[u8] {
		self.block.as_slice()
	}
}

enum Block {
	Standard([u8; STANDARD_BLOCK_LEN]),
	OneK([u8; ONEK_BLOCK_LEN]),
}

impl Block {
	fn new(len: BlockLength) -> Self {
		match len {
			BlockLength::Standard => Block::Standard([0; STANDARD_BLOCK_LEN]),
			BlockLength::OneK => Block::OneK([0; ONEK_BLOCK_LEN]),
		}
	}

	fn as_slice(&self) -> &[u8] {
		match self {
			Block::Standard(b) => b,
			Block::OneK(b) => b,
		}
	}

	fn as_mut_slice(&mut self) -> &mut [u8] {
		match self {
			Block::Standard(b) => b,
			Block::OneK(b) => b,
		}
	}
}

/// The largest a single encoded packet can be: `STX` header (3 bytes) +
/// a 1024-byte block + a 2-byte CRC trailer.
pub(crate) const MAX_WIRE_LEN: usize = 3 + ONEK_BLOCK_LEN + 2;

/// A fully framed, ready-to-transmit packet, stored inline so encoding
/// never needs an allocator.
pub(crate) struct WireFrame {
	buf: [u8; MAX_WIRE_LEN],
	len: usize,
}

impl WireFrame {
	fn new() -> Self {
		WireFrame {
			buf: [0; MAX_WIRE_LEN],
			len: 0,
		}
	}

	fn push(&mut self, byte: u8) {
		self.buf[self.len] = byte;
		self.len += 1;
	}

	fn push_slice(&mut self, bytes: &[u8]) {
		self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
		self.len += bytes.len();
	}

	pub(crate) fn as_slice(&self) -> &[u8] {
		&self.buf[..self.len]
	}
}

/// Build the on-wire bytes for a data packet: header, payload, trailer.
///
/// `payload` must be exactly `block_len.len()` bytes — the sender is
/// responsible for padding a partial final block with `SUB` before calling
/// this.
pub(crate) fn encode(mode: Mode, seq: u8, block_len: BlockLength, payload: &[u8]) -> WireFrame {
	debug_assert_eq!(payload.len(), block_len.len());

	let mut frame = WireFrame::new();
	frame.push(block_len.start_byte());
	frame.push(seq);
	frame.push(!seq);
	frame.push_slice(payload);

	match mode {
		Mode::Checksum => frame.push(checksum(payload)),
		Mode::Crc => frame.push_slice(&crc16(payload).to_be_bytes()),
	}

	frame
}

/// Why a candidate frame was rejected; the caller treats both uniformly as
/// "bad packet, respond NAK".
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DecodeError {
	/// `seq_complement != !seq`.
	SequenceMismatch,
	/// The recomputed checksum/CRC didn't match the received trailer.
	Integrity,
}

/// Decode and validate everything *after* the start byte: `seq`,
/// `seq_complement`, the payload, and the trailer.
///
/// `raw` must be exactly `2 + block_len.len() + mode.trailer_len()` bytes,
/// i.e. the bytes read following the already-consumed `SOH`/`STX`.
pub(crate) fn decode(raw: &[u8], block_len: BlockLength, mode: Mode) -> Result<Packet, DecodeError> {
	debug_assert_eq!(raw.len(), 2 + block_len.len() + mode.trailer_len());

	let seq = raw[0];
	let seq_complement = raw[1];
	if seq_complement != !seq {
		return Err(DecodeError::SequenceMismatch);
	}

	let payload_end = 2 + block_len.len();
	let payload = &raw[2..payload_end];
	let trailer = &raw[payload_end..];

	let ok = match mode {
		Mode::Checksum => trailer[0] == checksum(payload),
		Mode::Crc => {
			let received = u16::from_be_bytes([trailer[0], trailer[1]]);
			received == crc16(payload)
		}
	};
	if !ok {
		return Err(DecodeError::Integrity);
	}

	let mut block = Block::new(block_len);
	block.as_mut_slice().copy_from_slice(payload);
	Ok(Packet { seq, block })
}

/// Trim trailing `SUB` (0x1A) padding from an assembled payload.
///
/// The receiver never does this on its own — trailing `SUB` is part of the
/// delivered payload as far as the protocol is concerned, since `SUB` is a
/// legal data byte. Consumers that know their payload is padded text (and
/// so can't legitimately end in `SUB`) opt into trimming explicitly by
/// calling this.
pub fn trim_sub_padding(buf: &[u8]) -> &[u8] {
	let mut end = buf.len();
	while end > 0 && buf[end - 1] == SUB {
		end -= 1;
	}
	&buf[..end]
}
