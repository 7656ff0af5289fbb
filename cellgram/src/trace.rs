//! Diagnostic event channels for grammar construction and parsing.
//!
//! Every message goes to the `log` facade under a per-channel target
//! (`cellgram::grammar` or `cellgram::parse`) at `Trace` level, so the two
//! channels can be toggled independently with `RUST_LOG`. Callers may also
//! subscribe callbacks to a channel on a [`Trace`]. Subscribing and
//! cancelling take `&self`, so a trace owned by a shared parser can be
//! toggled while other threads parse.
//!
//! Messages are formatted lazily: nothing is rendered unless the log target
//! is enabled or somebody is subscribed.
//!
//! # Example
//! ```rust
//! # use cellgram::{Channel, Trace};
//! # use std::sync::{Arc, Mutex};
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let trace = Trace::new();
//! let sub = trace.subscribe(Channel::Parse, move |msg| sink.lock().unwrap().push(msg.to_owned()));
//! trace.emit(Channel::Parse, || "hello".to_owned());
//! trace.emit(Channel::Grammar, || "ignored".to_owned());
//! assert!(trace.cancel(sub));
//! trace.emit(Channel::Parse, || "dropped".to_owned());
//! assert_eq!(*seen.lock().unwrap(), vec!["hello".to_owned()]);
//! ```

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A named diagnostic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Grammar summary, closures and state discovery.
    Grammar,
    /// Shift/reduce trace of individual parse calls.
    Parse,
}

impl Channel {
    /// The `log` target messages on this channel are written to.
    pub const fn target(self) -> &'static str {
        match self {
            Channel::Grammar => "cellgram::grammar",
            Channel::Parse => "cellgram::parse",
        }
    }
}

/// Handle returned by [`Trace::subscribe`], used to cancel the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    channel: Channel,
    id: u64,
}

impl Subscription {
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

type Sink = Arc<dyn Fn(&str) + Send + Sync>;

/// Registry of channel subscribers.
#[derive(Default)]
pub struct Trace {
    sinks: RwLock<Vec<(Subscription, Sink)>>,
    next_id: AtomicU64,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sink` to receive every message emitted on `channel`.
    pub fn subscribe<F>(&self, channel: Channel, sink: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let subscription = Subscription {
            channel,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        self.sinks.write().push((subscription, Arc::new(sink)));
        subscription
    }

    /// Removes a subscription. Returns `false` if it was already cancelled.
    pub fn cancel(&self, subscription: Subscription) -> bool {
        let mut sinks = self.sinks.write();
        let before = sinks.len();
        sinks.retain(|(s, _)| *s != subscription);
        sinks.len() != before
    }

    /// Whether a message on `channel` would reach anybody.
    pub fn is_enabled(&self, channel: Channel) -> bool {
        log::log_enabled!(target: channel.target(), log::Level::Trace)
            || self.sinks.read().iter().any(|(s, _)| s.channel == channel)
    }

    /// Formats and dispatches a message if the channel is enabled.
    ///
    /// Sinks run outside the lock, so a sink may subscribe or cancel.
    pub fn emit<F>(&self, channel: Channel, message: F)
    where
        F: FnOnce() -> String,
    {
        if !self.is_enabled(channel) {
            return;
        }
        let message = message();
        log::trace!(target: channel.target(), "{}", message);
        let sinks: Vec<Sink> = self
            .sinks
            .read()
            .iter()
            .filter(|(s, _)| s.channel == channel)
            .map(|(_, sink)| Arc::clone(sink))
            .collect();
        for sink in sinks {
            sink(&message);
        }
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field(
                "subscriptions",
                &self.sinks.read().iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Prefixes every line of `x` with a tab.
pub(crate) fn indent(x: impl fmt::Display) -> String {
    format!("\t{}", x.to_string().replace('\n', "\n\t"))
}
