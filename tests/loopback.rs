//! Round-trip tests against our own implementation, in-process.
//!
//! Two styles are used. The happy-path and boundary tests run two real
//! `Session`s against each other over a pair of crossed `mpsc` pipes, mirroring
//! how a live transfer behaves end to end. The fault-injection tests instead
//! pair a real `Session` against a hand-scripted peer that speaks just enough
//! of the wire protocol to provoke one specific edge case (a dropped ACK, a
//! cancel, a run of NAKs) — scripting the peer is the only way to force a
//! real two-sided implementation into those corners deterministically.

use std::sync::mpsc::{channel as mpsc_channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use xmodem_proto::{trim_sub_padding, Channel, Error, Session, SliceSource};

const SOH: u8 = 0x01;
const STX: u8 = 0x02;
const EOT: u8 = 0x04;
const ACK: u8 = 0x06;
const NAK: u8 = 0x15;
const CAN: u8 = 0x18;
const CRC_PREFERENCE: u8 = 0x43; // 'C'
const SUB: u8 = 0x1A;

type FrameLog = Arc<Mutex<Vec<Vec<u8>>>>;

/// A [`Channel`] over a pair of `mpsc` endpoints, optionally recording every
/// `write_all` call (one call == one on-wire frame) for inspection.
struct MpscChannel {
	tx: Sender<u8>,
	rx: Receiver<u8>,
	log: Option<FrameLog>,
}

impl MpscChannel {
	fn new(tx: Sender<u8>, rx: Receiver<u8>) -> Self {
		MpscChannel { tx, rx, log: None }
	}

	fn recording(tx: Sender<u8>, rx: Receiver<u8>, log: FrameLog) -> Self {
		MpscChannel { tx, rx, log: Some(log) }
	}
}

fn broken_pipe() -> Error {
	Error::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer hung up"))
}

impl Channel for MpscChannel {
	fn read_byte(&mut self, timeout: Duration) -> xmodem_proto::Result<Option<u8>> {
		match self.rx.recv_timeout(timeout) {
			Ok(b) => Ok(Some(b)),
			Err(RecvTimeoutError::Timeout) => Ok(None),
			Err(RecvTimeoutError::Disconnected) => Err(broken_pipe()),
		}
	}

	fn write_all(&mut self, bytes: &[u8]) -> xmodem_proto::Result<()> {
		if let Some(log) = &self.log {
			log.lock().unwrap().push(bytes.to_vec());
		}
		for &b in bytes {
			self.tx.send(b).map_err(|_| broken_pipe())?;
		}
		Ok(())
	}

	fn flush(&mut self) -> xmodem_proto::Result<()> {
		Ok(())
	}
}

/// Two crossed raw `mpsc` pipes: `a` writes what `b` reads, and vice versa.
fn raw_pair() -> ((Sender<u8>, Receiver<u8>), (Sender<u8>, Receiver<u8>)) {
	let (tx1, rx1) = mpsc_channel();
	let (tx2, rx2) = mpsc_channel();
	((tx1, rx2), (tx2, rx1))
}

fn recv_n(rx: &Receiver<u8>, n: usize) -> Vec<u8> {
	(0..n).map(|_| rx.recv().expect("peer hung up mid-script")).collect()
}

fn send_all(tx: &Sender<u8>, bytes: &[u8]) {
	for &b in bytes {
		tx.send(b).expect("peer hung up mid-script");
	}
}

fn checksum8(data: &[u8]) -> u8 {
	data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

fn crc16_xmodem(data: &[u8]) -> u16 {
	let mut crc: u16 = 0;
	for &b in data {
		crc ^= (b as u16) << 8;
		for _ in 0..8 {
			crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x1021 } else { crc << 1 };
		}
	}
	crc
}

fn pattern(len: usize) -> Vec<u8> {
	// High bit always set, so this never coincides with the SUB (0x1A) pad byte.
	(0..len).map(|i| ((i % 200) as u8).wrapping_add(0x80)).collect()
}

#[test]
fn crc1k_happy_path_two_full_blocks() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let log: FrameLog = Arc::new(Mutex::new(Vec::new()));
	let sender_chan = MpscChannel::recording(a_tx, a_rx, log.clone());
	let receiver_chan = MpscChannel::new(b_tx, b_rx);

	let data = pattern(2048);
	let data_for_send = data.clone();
	let send_handle = thread::spawn(move || {
		let mut session = Session::new(sender_chan);
		let mut source = SliceSource::new(&data_for_send);
		session.send(&mut source)
	});
	let recv_handle = thread::spawn(move || {
		let mut session = Session::new(receiver_chan);
		let mut sink = Vec::new();
		session.receive_into(&mut sink).map(|_| sink)
	});

	send_handle.join().unwrap().unwrap();
	let received = recv_handle.join().unwrap().unwrap();
	assert_eq!(received, data);

	let frames = log.lock().unwrap();
	let stx_frames: Vec<_> = frames.iter().filter(|f| f[0] == STX).collect();
	assert_eq!(stx_frames.len(), 2, "2048 bytes should be exactly two 1024-byte blocks");
	for frame in &stx_frames {
		assert_eq!(frame.len(), 1 + 2 + 1024 + 2);
	}
}

#[test]
fn exact_1024_boundary_has_no_padded_tail_block() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let log: FrameLog = Arc::new(Mutex::new(Vec::new()));
	let sender_chan = MpscChannel::recording(a_tx, a_rx, log.clone());
	let receiver_chan = MpscChannel::new(b_tx, b_rx);

	let data = pattern(1024);
	let data_for_send = data.clone();
	let send_handle = thread::spawn(move || {
		let mut session = Session::new(sender_chan);
		let mut source = SliceSource::new(&data_for_send);
		session.send(&mut source)
	});
	let recv_handle = thread::spawn(move || {
		let mut session = Session::new(receiver_chan);
		let mut sink = Vec::new();
		session.receive_into(&mut sink).map(|_| sink)
	});

	send_handle.join().unwrap().unwrap();
	let received = recv_handle.join().unwrap().unwrap();
	assert_eq!(received, data);

	let frames = log.lock().unwrap();
	assert_eq!(frames.iter().filter(|f| f[0] == STX || f[0] == SOH).count(), 1);
}

#[test]
fn oversized_payload_pads_final_block_with_sub() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let log: FrameLog = Arc::new(Mutex::new(Vec::new()));
	let sender_chan = MpscChannel::recording(a_tx, a_rx, log.clone());
	let receiver_chan = MpscChannel::new(b_tx, b_rx);

	let data = pattern(1025);
	let data_for_send = data.clone();
	let send_handle = thread::spawn(move || {
		let mut session = Session::new(sender_chan);
		let mut source = SliceSource::new(&data_for_send);
		session.send(&mut source)
	});
	let recv_handle = thread::spawn(move || {
		let mut session = Session::new(receiver_chan);
		let mut sink = Vec::new();
		session.receive_into(&mut sink).map(|_| sink)
	});

	send_handle.join().unwrap().unwrap();
	let received = recv_handle.join().unwrap().unwrap();

	assert_eq!(trim_sub_padding(&received), &data[..]);
	assert_eq!(received.len(), 1024 + 128);

	let frames = log.lock().unwrap();
	assert_eq!(frames[0][0], STX);
	assert_eq!(frames[0].len(), 1 + 2 + 1024 + 2);
	let tail = frames.iter().find(|f| f[0] == SOH).expect("a trailing SOH block");
	assert_eq!(tail.len(), 1 + 2 + 128 + 2);
	assert_eq!(&tail[3 + 1..3 + 128], &vec![SUB; 127][..]);
}

#[test]
fn empty_payload_is_an_immediate_eot() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let sender_chan = MpscChannel::new(a_tx, a_rx);
	let receiver_chan = MpscChannel::new(b_tx, b_rx);

	let send_handle = thread::spawn(move || {
		let mut session = Session::new(sender_chan);
		let mut source = SliceSource::new(&[]);
		session.send(&mut source)
	});
	let recv_handle = thread::spawn(move || {
		let mut session = Session::new(receiver_chan);
		let mut sink = Vec::new();
		session.receive_into(&mut sink).map(|_| sink)
	});

	send_handle.join().unwrap().unwrap();
	let received = recv_handle.join().unwrap().unwrap();
	assert!(received.is_empty());
}

/// A legacy receiver that only ever understands the plain-checksum handshake:
/// it offers `NAK` instead of `C`, so a modern sender must fall back to
/// `Checksum` mode rather than insisting on CRC.
#[test]
fn sender_falls_back_to_checksum_when_peer_never_offers_crc() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let sender_chan = MpscChannel::new(a_tx, a_rx);

	let payload_text = b"HELLO";
	let mut expected_block = [SUB; 128];
	expected_block[..payload_text.len()].copy_from_slice(payload_text);
	let expected_checksum = checksum8(&expected_block);

	let peer = thread::spawn(move || {
		send_all(&b_tx, &[NAK]);
		let frame = recv_n(&b_rx, 1 + 2 + 128 + 1);
		assert_eq!(frame[0], SOH);
		assert_eq!(frame[1], 1);
		assert_eq!(frame[2], !1u8);
		assert_eq!(&frame[3..131], &expected_block[..]);
		assert_eq!(frame[131], expected_checksum);
		send_all(&b_tx, &[ACK]);

		let eot = recv_n(&b_rx, 1);
		assert_eq!(eot[0], EOT);
		send_all(&b_tx, &[ACK]);
	});

	let mut session = Session::new(sender_chan);
	let mut source = SliceSource::new(payload_text);
	session.send(&mut source).unwrap();
	peer.join().unwrap();
}

/// The sender must retransmit the identical frame, unchanged, when the peer
/// NAKs it — whether the peer NAKed because of a bad CRC, a bad checksum, or
/// anything else is none of the sender's business.
#[test]
fn sender_retransmits_unchanged_frame_after_a_nak() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let sender_chan = MpscChannel::new(a_tx, a_rx);

	let peer = thread::spawn(move || {
		send_all(&b_tx, &[CRC_PREFERENCE]);
		let frame_len = 1 + 2 + 128 + 2;
		let first = recv_n(&b_rx, frame_len);
		send_all(&b_tx, &[NAK]);
		let second = recv_n(&b_rx, frame_len);
		assert_eq!(first, second, "retransmission must be byte-identical");
		send_all(&b_tx, &[ACK]);

		let eot = recv_n(&b_rx, 1);
		assert_eq!(eot[0], EOT);
		send_all(&b_tx, &[ACK]);
	});

	let mut session = Session::new(sender_chan);
	let mut source = SliceSource::new(b"retry me");
	session.send(&mut source).unwrap();
	peer.join().unwrap();
}

#[test]
fn confirmed_cancel_from_peer_aborts_the_transfer() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let sender_chan = MpscChannel::new(a_tx, a_rx);

	let peer = thread::spawn(move || {
		send_all(&b_tx, &[CRC_PREFERENCE]);
		let frame_len = 1 + 2 + 128 + 2;
		let _ = recv_n(&b_rx, frame_len);
		send_all(&b_tx, &[CAN, CAN]);
		let ack = recv_n(&b_rx, 1);
		assert_eq!(ack[0], ACK);
	});

	let mut session = Session::new(sender_chan);
	let mut source = SliceSource::new(b"cancel me");
	let result = session.send(&mut source);
	assert!(matches!(result, Err(Error::Canceled)));
	peer.join().unwrap();
}

/// A single `CAN`, not followed by a second one, is noise — the sender keeps
/// going (resending the outstanding block) rather than aborting.
#[test]
fn single_unconfirmed_cancel_is_ignored() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let sender_chan = MpscChannel::new(a_tx, a_rx);

	let peer = thread::spawn(move || {
		send_all(&b_tx, &[CRC_PREFERENCE]);
		let frame_len = 1 + 2 + 128 + 2;
		let first = recv_n(&b_rx, frame_len);
		send_all(&b_tx, &[CAN]);
		// No second CAN follows; the sender should time out waiting for
		// confirmation and retransmit the same block.
		let second = recv_n(&b_rx, frame_len);
		assert_eq!(first, second);
		send_all(&b_tx, &[ACK]);

		let eot = recv_n(&b_rx, 1);
		assert_eq!(eot[0], EOT);
		send_all(&b_tx, &[ACK]);
	});

	let mut session = Session::new(sender_chan);
	let mut source = SliceSource::new(b"spurious");
	session.send(&mut source).unwrap();
	peer.join().unwrap();
}

#[test]
fn twentyfour_naks_still_succeed_on_the_next_attempt() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let sender_chan = MpscChannel::new(a_tx, a_rx);

	let peer = thread::spawn(move || {
		send_all(&b_tx, &[NAK]);
		let frame_len = 1 + 2 + 128 + 1;
		for _ in 0..24 {
			let _ = recv_n(&b_rx, frame_len);
			send_all(&b_tx, &[NAK]);
		}
		let _ = recv_n(&b_rx, frame_len);
		send_all(&b_tx, &[ACK]);

		let eot = recv_n(&b_rx, 1);
		assert_eq!(eot[0], EOT);
		send_all(&b_tx, &[ACK]);
	});

	let mut session = Session::new(sender_chan);
	let mut source = SliceSource::new(b"just under the limit");
	session.send(&mut source).unwrap();
	peer.join().unwrap();
}

#[test]
fn twentyfive_naks_exhaust_retries_and_cancel() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let sender_chan = MpscChannel::new(a_tx, a_rx);

	let peer = thread::spawn(move || {
		send_all(&b_tx, &[NAK]);
		let frame_len = 1 + 2 + 128 + 1;
		for _ in 0..25 {
			let _ = recv_n(&b_rx, frame_len);
			send_all(&b_tx, &[NAK]);
		}
		let cancel = recv_n(&b_rx, 3);
		assert_eq!(cancel, vec![CAN, CAN, CAN]);
	});

	let mut session = Session::new(sender_chan);
	let mut source = SliceSource::new(b"one too many");
	let result = session.send(&mut source);
	assert!(matches!(result, Err(Error::ExhaustedRetries)));
	peer.join().unwrap();
}

/// A dropped ACK makes the sender retransmit a block the receiver already
/// has; the receiver must re-acknowledge it without appending it twice.
#[test]
fn receiver_tolerates_a_duplicate_retransmitted_block() {
	let ((a_tx, a_rx), (b_tx, b_rx)) = raw_pair();
	let receiver_chan = MpscChannel::new(a_tx, a_rx);

	let block1 = {
		let mut b = [SUB; 128];
		let text = b"first block";
		b[..text.len()].copy_from_slice(text);
		b
	};
	let block2 = {
		let mut b = [SUB; 128];
		let text = b"second block";
		b[..text.len()].copy_from_slice(text);
		b
	};

	fn build_frame(seq: u8, block: &[u8; 128]) -> Vec<u8> {
		let mut frame = vec![SOH, seq, !seq];
		frame.extend_from_slice(block);
		frame.extend_from_slice(&crc16_xmodem(block).to_be_bytes());
		frame
	}

	let peer = thread::spawn(move || {
		let preference = recv_n(&b_rx, 1);
		assert_eq!(preference[0], CRC_PREFERENCE);

		let frame1 = build_frame(1, &block1);
		send_all(&b_tx, &frame1);
		let ack = recv_n(&b_rx, 1);
		assert_eq!(ack[0], ACK);

		// Simulate the ACK above being lost in transit: the sender retries.
		send_all(&b_tx, &frame1);
		let ack = recv_n(&b_rx, 1);
		assert_eq!(ack[0], ACK);

		let frame2 = build_frame(2, &block2);
		send_all(&b_tx, &frame2);
		let ack = recv_n(&b_rx, 1);
		assert_eq!(ack[0], ACK);

		send_all(&b_tx, &[EOT]);
		let ack = recv_n(&b_rx, 1);
		assert_eq!(ack[0], ACK);
	});

	let mut session = Session::new(receiver_chan);
	let mut sink = Vec::new();
	session.receive_into(&mut sink).unwrap();
	peer.join().unwrap();

	let mut expected = block1.to_vec();
	expected.extend_from_slice(&block2);
	assert_eq!(sink, expected);
}
