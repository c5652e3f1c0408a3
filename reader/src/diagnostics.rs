//! Diagnostics sink: how a reader reports what it is doing.
//!
//! The reader never logs through a global. Every event goes to the
//! [`DiagnosticSink`] injected at construction; the default is [`NoopSink`].
//! [`TracingSink`] forwards to `tracing` with the reader name as a field.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use linepump_types::ReadFault;

/// Shared handle to a sink; the producer and the stream hold one each.
pub type SharedSink = Arc<dyn DiagnosticSink>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// What happened.
#[derive(Debug, Clone, Copy)]
pub enum DiagnosticKind<'a> {
    /// A record was read; `offset` is its zero-based position in the stream.
    RecordRead { len: usize, offset: u64 },
    /// Bytes after the last delimiter were dropped at end-of-stream.
    UnterminatedTail { len: usize },
    EndOfStream { records: u64 },
    ReadFailed { fault: &'a ReadFault },
    ShutdownObserved { records: u64 },
    ConsumerGone { records: u64 },
    StopRequested,
    StopRepeated,
    Drained { discarded: usize },
    /// The producer task ended without handing back its summary.
    ProducerLost { reason: &'a str },
}

impl DiagnosticKind<'_> {
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Self::RecordRead { .. }
            | Self::UnterminatedTail { .. }
            | Self::ShutdownObserved { .. }
            | Self::ConsumerGone { .. }
            | Self::StopRequested
            | Self::StopRepeated
            | Self::Drained { .. } => Level::Debug,
            Self::EndOfStream { .. } => Level::Info,
            Self::ProducerLost { .. } => Level::Warn,
            Self::ReadFailed { .. } => Level::Error,
        }
    }

    /// Stable machine-readable name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::RecordRead { .. } => "record_read",
            Self::UnterminatedTail { .. } => "unterminated_tail",
            Self::EndOfStream { .. } => "end_of_stream",
            Self::ReadFailed { .. } => "read_failed",
            Self::ShutdownObserved { .. } => "shutdown_observed",
            Self::ConsumerGone { .. } => "consumer_gone",
            Self::StopRequested => "stop_requested",
            Self::StopRepeated => "stop_repeated",
            Self::Drained { .. } => "drained",
            Self::ProducerLost { .. } => "producer_lost",
        }
    }
}

/// One event from a named reader.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostic<'a> {
    reader: &'a str,
    kind: DiagnosticKind<'a>,
}

impl<'a> Diagnostic<'a> {
    #[must_use]
    pub fn new(reader: &'a str, kind: DiagnosticKind<'a>) -> Self {
        Self { reader, kind }
    }

    #[must_use]
    pub fn reader(&self) -> &'a str {
        self.reader
    }

    #[must_use]
    pub fn kind(&self) -> DiagnosticKind<'a> {
        self.kind
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.kind.level()
    }
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reader = self.reader;
        match self.kind {
            DiagnosticKind::RecordRead { len, offset } => {
                write!(f, "read data={{len={len}, offset={offset}}} from {reader}")
            }
            DiagnosticKind::UnterminatedTail { len } => {
                write!(f, "dropped {len} unterminated trailing bytes from {reader}")
            }
            DiagnosticKind::EndOfStream { records } => {
                write!(f, "read {records} total items from {reader}")
            }
            DiagnosticKind::ReadFailed { fault } => write!(f, "{fault}"),
            DiagnosticKind::ShutdownObserved { records } => {
                write!(f, "{reader} stopped after {records} items")
            }
            DiagnosticKind::ConsumerGone { records } => {
                write!(f, "consumer of {reader} went away after {records} items")
            }
            DiagnosticKind::StopRequested => write!(f, "{reader} exiting"),
            DiagnosticKind::StopRepeated => write!(f, "{reader} already stopping"),
            DiagnosticKind::Drained { discarded } => {
                write!(f, "drained {reader}, discarded {discarded} items")
            }
            DiagnosticKind::ProducerLost { reason } => {
                write!(f, "producer for {reader} did not finish cleanly: {reason}")
            }
        }
    }
}

/// Receives leveled, structured events from readers.
///
/// Called from the producer's execution unit and from the consumer side, so
/// implementations must be cheap and must not block.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: &Diagnostic<'_>);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn emit(&self, _event: &Diagnostic<'_>) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: &Diagnostic<'_>) {
        let reader = event.reader();
        match event.kind() {
            DiagnosticKind::RecordRead { len, offset } => {
                tracing::debug!(reader, len, offset, "{event}");
            }
            DiagnosticKind::UnterminatedTail { len } => {
                tracing::debug!(reader, len, "{event}");
            }
            DiagnosticKind::EndOfStream { records } => {
                tracing::info!(reader, records, "{event}");
            }
            DiagnosticKind::ShutdownObserved { records }
            | DiagnosticKind::ConsumerGone { records } => {
                tracing::debug!(reader, records, "{event}");
            }
            DiagnosticKind::StopRequested | DiagnosticKind::StopRepeated => {
                tracing::debug!(reader, "{event}");
            }
            DiagnosticKind::Drained { discarded } => {
                tracing::debug!(reader, discarded, "{event}");
            }
            DiagnosticKind::ProducerLost { .. } => {
                tracing::warn!(reader, "{event}");
            }
            DiagnosticKind::ReadFailed { fault } => {
                tracing::error!(reader, kind = ?fault.kind(), records = fault.records(), "{event}");
            }
        }
    }
}

/// An owned copy of a [`Diagnostic`], as kept by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedDiagnostic {
    pub reader: String,
    pub level: Level,
    pub label: &'static str,
    pub message: String,
}

/// Keeps every event in memory. Useful in tests and for post-mortems.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CapturedDiagnostic>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<CapturedDiagnostic> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Labels in emission order.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.label).collect()
    }

    #[must_use]
    pub fn count(&self, label: &str) -> usize {
        self.events().iter().filter(|e| e.label == label).count()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, event: &Diagnostic<'_>) {
        let captured = CapturedDiagnostic {
            reader: event.reader().to_string(),
            level: event.level(),
            label: event.kind().label(),
            message: event.to_string(),
        };
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(captured);
    }
}

/// Name plus sink, so call sites only say what happened.
#[derive(Clone)]
pub(crate) struct Reporter {
    name: Arc<str>,
    sink: SharedSink,
}

impl Reporter {
    pub(crate) fn new(name: &str, sink: SharedSink) -> Self {
        Self {
            name: Arc::from(name),
            sink,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn emit(&self, kind: DiagnosticKind<'_>) {
        self.sink.emit(&Diagnostic::new(&self.name, kind));
    }
}
