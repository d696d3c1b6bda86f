//! The byte channel adapter (§4.1): a capability trait wrapping the
//! external reader/writer with a timed single-byte read primitive.

#[cfg(not(feature = "std"))]
use core::time::Duration;
#[cfg(feature = "std")]
use std::time::Duration;

use crate::error::{Error, Result};

/// The byte channel adapter the core consumes.
///
/// Implementors do not interpret bytes and perform no buffering beyond the
/// transport's own. Any error other than a timeout is fatal and surfaces as
/// [`Error::Transport`].
pub trait Channel {
	/// Read the next byte within `timeout`, measured from this call.
	///
	/// Returns `Ok(None)` on timeout. A spurious empty read observed before
	/// the deadline must not be reported as a timeout.
	fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>>;

	/// Write `bytes` to the transport in order.
	fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

	/// Guarantee that prior writes have been handed to the transport.
	fn flush(&mut self) -> Result<()>;
}

/// A transport capability for reconfiguring the read deadline per call.
///
/// The engine's timeout table has five distinct deadlines (negotiation
/// round, in-block byte, post-packet response, EOT-ack, cancel-confirm), so
/// a single fixed timeout configured once on the device — as the teacher's
/// own doc comments assume callers will do — isn't enough. This trait lets
/// the blanket [`Channel`] impl below re-arm the transport's timeout before
/// every read, the same way the teacher's sibling `ttywrite` CLI calls
/// `port.set_timeout(..)` on a serial port before driving a transfer.
#[cfg(feature = "std")]
pub trait SetReadTimeout {
	/// Reconfigure the transport's read timeout.
	fn set_read_timeout(&mut self, timeout: Duration) -> std::io::Result<()>;
}

#[cfg(feature = "std")]
impl<T> Channel for T
where
	T: std::io::Read + std::io::Write + SetReadTimeout,
{
	fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>> {
		self.set_read_timeout(timeout)?;
		let mut buf = [0u8; 1];
		match std::io::Read::read(self, &mut buf) {
			Ok(0) => Err(Error::from(std::io::Error::new(
				std::io::ErrorKind::UnexpectedEof,
				"channel closed",
			))),
			Ok(_) => Ok(Some(buf[0])),
			Err(e)
				if e.kind() == std::io::ErrorKind::TimedOut
					|| e.kind() == std::io::ErrorKind::WouldBlock =>
			{
				Ok(None)
			}
			Err(e) => Err(Error::from(e)),
		}
	}

	fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
		std::io::Write::write_all(self, bytes).map_err(Error::from)
	}

	fn flush(&mut self) -> Result<()> {
		std::io::Write::flush(self).map_err(Error::from)
	}
}

#[cfg(not(feature = "std"))]
pub trait SetReadTimeout {
	/// Reconfigure the transport's read timeout.
	fn set_read_timeout(&mut self, timeout: Duration) -> core_io::Result<()>;
}

#[cfg(not(feature = "std"))]
impl<T> Channel for T
where
	T: core_io::Read + core_io::Write + SetReadTimeout,
{
	fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>> {
		self.set_read_timeout(timeout)?;
		let mut buf = [0u8; 1];
		match core_io::Read::read(self, &mut buf) {
			Ok(0) => Err(Error::from(core_io::Error::new(
				core_io::ErrorKind::UnexpectedEof,
				"channel closed",
			))),
			Ok(_) => Ok(Some(buf[0])),
			Err(e)
				if e.kind() == core_io::ErrorKind::TimedOut
					|| e.kind() == core_io::ErrorKind::WouldBlock =>
			{
				Ok(None)
			}
			Err(e) => Err(Error::from(e)),
		}
	}

	fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
		core_io::Write::write_all(self, bytes).map_err(Error::from)
	}

	fn flush(&mut self) -> Result<()> {
		core_io::Write::flush(self).map_err(Error::from)
	}
}
