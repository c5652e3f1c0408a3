//! Delimited stream reader.
//!
//! Wraps a blocking byte source, splits it into delimiter-terminated records
//! on a dedicated execution unit, and hands the records to a consumer through
//! a bounded, ordered queue.
//!
//! ```text
//!  byte source ──> Producer::run (own thread / blocking task)
//!                     │  RecordScanner: read_until(delimiter)
//!                     │  blocking_send (suspends while the queue is full)
//!                     v
//!              bounded mpsc queue ──> RecordStream (consumer)
//!                     ^                   │
//!                     └── ShutdownSignal <┘ stop(): raise, drain to close
//! ```
//!
//! The queue closes exactly once, when the producer loop exits. A
//! stop request is cooperative: the producer sees it at the top of its loop,
//! so it can be delayed by at most one read and one enqueue.

pub mod diagnostics;
pub mod scanner;

mod producer;
mod shutdown;
mod stream;

pub use diagnostics::{
    CapturedDiagnostic, Diagnostic, DiagnosticKind, DiagnosticSink, Level, MemorySink, NoopSink,
    SharedSink, TracingSink,
};
pub use linepump_config::ReaderConfig;
pub use linepump_types::{ReadFault, ReaderEvent, Record, RunSummary, Termination};
pub use producer::Producer;
pub use scanner::RecordScanner;
pub use shutdown::ShutdownSignal;
pub use stream::RecordStream;

use std::io::Read;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::diagnostics::Reporter;

/// A reader that has not started yet.
///
/// Configuration happens here, before anything runs. Starting consumes the
/// value, so the configuration can never change under a running producer.
pub struct DelimitedReader<R> {
    source: R,
    config: ReaderConfig,
    sink: SharedSink,
}

impl<R: Read> DelimitedReader<R> {
    /// A reader over `source` with the default configuration and no diagnostics.
    pub fn new(source: R) -> Self {
        Self::with_config(source, ReaderConfig::default())
    }

    pub fn with_config(source: R, config: ReaderConfig) -> Self {
        Self {
            source,
            config,
            sink: Arc::new(NoopSink),
        }
    }

    /// Label used in diagnostics. Has no behavioral effect.
    #[must_use]
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            config: self.config.with_name(name),
            ..self
        }
    }

    #[must_use]
    pub fn with_delimiter(self, delimiter: u8) -> Self {
        Self {
            config: self.config.with_delimiter(delimiter),
            ..self
        }
    }

    #[must_use]
    pub fn with_sink(self, sink: SharedSink) -> Self {
        Self { sink, ..self }
    }

    #[must_use]
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Create the queue and return both halves.
    ///
    /// Nothing runs until the caller invokes [`Producer::run`] on an execution
    /// unit of its choosing.
    pub fn split(self) -> (Producer<R>, RecordStream) {
        let capacity = self.config.queue_capacity();
        let (tx, rx) = mpsc::channel(capacity.get());
        let shutdown = ShutdownSignal::new();
        let reporter = Reporter::new(self.config.name(), self.sink);

        let producer = Producer::new(
            self.source,
            self.config.delimiter(),
            tx,
            shutdown.clone(),
            reporter.clone(),
        );
        let stream = RecordStream::new(rx, shutdown, reporter, capacity);
        (producer, stream)
    }
}

impl<R: Read + Send + 'static> DelimitedReader<R> {
    /// Start the producer on tokio's blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> RecordStream {
        let (producer, mut stream) = self.split();
        let join = tokio::task::spawn_blocking(move || producer.run());
        stream.attach(join);
        stream
    }
}
