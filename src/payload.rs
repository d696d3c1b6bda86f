//! The payload interfaces the core consumes (§6): a bounded byte source for
//! sending, and a growable sink for receiving.

use crate::error::Result;

/// A bounded sequence of bytes to be sent.
///
/// `remaining()` must be exact, not an estimate: the sender uses it to
/// decide whether a full 1024-byte block can be emitted in CRC-1K mode.
pub trait PayloadSource {
	/// Number of bytes not yet consumed.
	fn remaining(&self) -> usize;

	/// Read up to `buf.len()` bytes, returning the number read. Returns `0`
	/// only when `remaining() == 0`.
	fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// A growable buffer that receives assembled payload bytes.
pub trait PayloadSink {
	/// Append `data` to the end of the buffer.
	fn extend(&mut self, data: &[u8]);
}

/// The common case: the entire payload already sits in memory as a slice.
pub struct SliceSource<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> SliceSource<'a> {
	/// Wrap `data` as a payload source starting at offset 0.
	pub fn new(data: &'a [u8]) -> Self {
		SliceSource { data, pos: 0 }
	}
}

impl<'a> PayloadSource for SliceSource<'a> {
	fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}

	fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
		let n = core::cmp::min(buf.len(), self.remaining());
		buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
		self.pos += n;
		Ok(n)
	}
}

#[cfg(feature = "std")]
impl PayloadSink for std::vec::Vec<u8> {
	fn extend(&mut self, data: &[u8]) {
		std::vec::Vec::extend_from_slice(self, data);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slice_source_reports_remaining() {
		let data = [1u8, 2, 3, 4, 5];
		let mut src = SliceSource::new(&data);
		assert_eq!(src.remaining(), 5);
		let mut buf = [0u8; 3];
		assert_eq!(src.read(&mut buf).unwrap(), 3);
		assert_eq!(buf, [1, 2, 3]);
		assert_eq!(src.remaining(), 2);
		let mut buf = [0u8; 3];
		assert_eq!(src.read(&mut buf).unwrap(), 2);
		assert_eq!(&buf[..2], &[4, 5]);
		assert_eq!(src.remaining(), 0);
		assert_eq!(src.read(&mut buf).unwrap(), 0);
	}

	#[test]
	fn empty_slice_source_is_immediately_exhausted() {
		let data: [u8; 0] = [];
		let mut src = SliceSource::new(&data);
		assert_eq!(src.remaining(), 0);
		let mut buf = [0u8; 4];
		assert_eq!(src.read(&mut buf).unwrap(), 0);
	}
}
