//! The session façade (§4.6): binds a channel to a transfer direction.

use crate::channel::Channel;
use crate::config::XmodemConfig;
use crate::error::Result;
use crate::payload::{PayloadSink, PayloadSource};
use crate::{receiver, sender};

/// A one-shot XMODEM transfer bound to a channel.
///
/// A `Session` owns its channel for the duration of the transfer; it holds
/// no state beyond that. `send` and `receive` are the only entry points —
/// callers never construct the sender/receiver state machines directly.
pub struct Session<C: Channel> {
	channel: C,
	config: XmodemConfig,
}

impl<C: Channel> Session<C> {
	/// Create a session over `channel` with the spec-mandated defaults.
	pub fn new(channel: C) -> Self {
		Session::with_config(channel, XmodemConfig::default())
	}

	/// Create a session with custom tunables (retry limits, timeouts, pad
	/// byte).
	pub fn with_config(channel: C, config: XmodemConfig) -> Self {
		Session { channel, config }
	}

	/// The session's current configuration.
	pub fn config(&self) -> &XmodemConfig {
		&self.config
	}

	/// Mutable access to the session's configuration, for adjusting
	/// timeouts or retry limits before a transfer starts.
	pub fn config_mut(&mut self) -> &mut XmodemConfig {
		&mut self.config
	}

	/// Send `source` to the peer, acting as the XMODEM sender.
	///
	/// Performs preference negotiation, streams `source` as framed packets,
	/// and terminates with `EOT`. Returns `Ok(())` on a successful transfer.
	pub fn send<P: PayloadSource>(&mut self, source: &mut P) -> Result<()> {
		sender::run(&mut self.channel, &self.config, source)
	}

	/// Receive a transfer from the peer into a growable sink, acting as the
	/// XMODEM receiver.
	///
	/// Negotiates the integrity mode, accepts packets in order, and returns
	/// once the peer sends `EOT`. The delivered bytes are untrimmed — see
	/// [`trim_sub_padding`](crate::trim_sub_padding) for consumers that want
	/// the classic trailing-`SUB` trim.
	pub fn receive_into<S: PayloadSink>(&mut self, sink: &mut S) -> Result<()> {
		receiver::run(&mut self.channel, &self.config, sink)
	}

	/// Receive a transfer from the peer, returning the assembled payload.
	#[cfg(feature = "std")]
	pub fn receive(&mut self) -> Result<std::vec::Vec<u8>> {
		let mut sink = std::vec::Vec::new();
		receiver::run(&mut self.channel, &self.config, &mut sink)?;
		Ok(sink)
	}

	/// Reclaim the underlying channel.
	pub fn into_inner(self) -> C {
		self.channel
	}
}
