//! Progress notification sinks.
//!
//! The analyzer narrates its work through a [`ProgressSink`] injected by the
//! caller. Notifications are advisory only: a sink may drop or ignore every
//! event and the pipeline never blocks on one.

use tokio::sync::mpsc;
use tracing::info;

/// Receives human-readable progress messages. Must never block.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, message: &str);
}

/// Discards every notification.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn notify(&self, _message: &str) {}
}

/// Logs notifications through `tracing`.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn notify(&self, message: &str) {
        info!("{}", message);
    }
}

/// Forwards notifications over an unbounded channel. A closed receiver is
/// ignored rather than treated as an error.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn notify(&self, message: &str) {
        let _ = self.tx.send(message.to_string());
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_messages() {
        let (sink, mut rx) = ChannelSink::new();
        sink.notify("analyzing Faker#KR1");

        assert_eq!(rx.try_recv().unwrap(), "analyzing Faker#KR1");
    }

    #[test]
    fn test_channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);

        // Must not panic or block.
        sink.notify("nobody is listening");
    }

    #[test]
    fn test_recording_sink_collects() {
        let sink = testing::RecordingSink::default();
        sink.notify("one");
        sink.notify("two");

        assert_eq!(sink.messages(), vec!["one", "two"]);
    }
}
