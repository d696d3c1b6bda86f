#[cfg(not(feature = "std"))]
use core::fmt;
#[cfg(feature = "std")]
use std::fmt;

/// Errors that can escape a [`Session`](crate::Session) as an unrecoverable
/// failure.
///
/// Every recoverable condition (a bad checksum, a dropped byte, a single
/// spurious `CAN`) is handled in-band by the sender/receiver state machines
/// with a `NAK`/retransmit and never becomes an `Error`; only the taxonomy
/// below is allowed to surface.
#[derive(Debug)]
pub enum Error {
	/// The underlying channel failed for a reason other than a timeout.
	Transport(TransportError),

	/// `error_count` reached [`MAX_ERRORS`](crate::MAX_ERRORS) before the
	/// transfer could complete.
	ExhaustedRetries,

	/// The peer sent two consecutive `CAN` bytes, or negotiation/EOT
	/// handling ran out of rounds and this side gave up.
	Canceled,

	/// A data packet arrived whose sequence number was neither the expected
	/// next block nor a retransmission of the previous one.
	Desync,

	/// No usable preference byte (sender) or start byte (receiver) arrived
	/// within the allotted negotiation rounds.
	NegotiationFailed,
}

/// An underlying I/O failure, carried inside [`Error::Transport`].
///
/// Kept as a thin wrapper rather than re-exporting `std::io::Error` directly
/// so the type is available unchanged whether or not the `std` feature is
/// enabled.
#[derive(Debug)]
pub struct TransportError {
	#[cfg(feature = "std")]
	inner: std::io::Error,
	#[cfg(not(feature = "std"))]
	inner: core_io::Error,
}

#[cfg(feature = "std")]
impl From<std::io::Error> for TransportError {
	fn from(inner: std::io::Error) -> Self {
		TransportError { inner }
	}
}

#[cfg(not(feature = "std"))]
impl From<core_io::Error> for TransportError {
	fn from(inner: core_io::Error) -> Self {
		TransportError { inner }
	}
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Error {
		Error::Transport(TransportError::from(err))
	}
}

#[cfg(not(feature = "std"))]
impl From<core_io::Error> for Error {
	fn from(err: core_io::Error) -> Error {
		Error::Transport(TransportError::from(err))
	}
}

impl fmt::Display for TransportError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "transport error: {}", self.inner)
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::Transport(e) => write!(f, "{}", e),
			Error::ExhaustedRetries => {
				write!(f, "exhausted retries: too many errors in one transfer")
			}
			Error::Canceled => write!(f, "transfer canceled"),
			Error::Desync => write!(f, "protocol desync: unexpected sequence number"),
			Error::NegotiationFailed => write!(f, "negotiation failed: no peer response"),
		}
	}
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Transport(e) => Some(&e.inner),
			_ => None,
		}
	}
}

/// The result type returned throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;
