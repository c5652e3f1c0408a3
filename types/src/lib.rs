//! Core domain types for linepump.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Both the producer and the consumer side of a reader speak in these types.

#![allow(clippy::missing_errors_doc)]

mod record;
pub use record::Record;

use std::io;

use thiserror::Error;

// ============================================================================
// Queue Events
// ============================================================================

/// An item carried by a reader's bounded queue.
///
/// `EndOfStream` and `Fault` are terminal: at most one of them is sent, it is
/// always the last item, and the queue closes right after it. A run that ends
/// because shutdown was requested sends neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// One delimiter-terminated record, delimiter stripped.
    Record(Record),
    /// The source reported end-of-stream after `records` records.
    EndOfStream { records: u64 },
    /// The source failed with something other than end-of-stream.
    Fault(ReadFault),
}

impl ReaderEvent {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Record(_))
    }

    #[must_use]
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::EndOfStream { .. } | Self::Fault(_) => None,
        }
    }
}

// ============================================================================
// Read Faults
// ============================================================================

/// A non-EOF failure of the byte source.
///
/// `std::io::Error` is not `Clone`, so the fault keeps the error kind and the
/// rendered message. That is enough for a consumer to decide whether to
/// escalate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to read from {reader} after {records} records: {message}")]
pub struct ReadFault {
    reader: String,
    kind: io::ErrorKind,
    message: String,
    records: u64,
}

impl ReadFault {
    #[must_use]
    pub fn new(reader: impl Into<String>, error: &io::Error, records: u64) -> Self {
        Self {
            reader: reader.into(),
            kind: error.kind(),
            message: error.to_string(),
            records,
        }
    }

    /// Name of the reader whose source failed.
    #[must_use]
    pub fn reader(&self) -> &str {
        &self.reader
    }

    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Records delivered before the failure.
    #[must_use]
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Rebuild an `io::Error` carrying the same kind and message.
    #[must_use]
    pub fn to_io_error(&self) -> io::Error {
        io::Error::new(self.kind, self.message.clone())
    }
}

// ============================================================================
// Run Outcome
// ============================================================================

/// Why a producer loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    EndOfStream,
    /// Shutdown was requested and observed at the top of the loop.
    Stopped,
    /// The receiving half went away, so the enqueue failed.
    ConsumerGone,
    Fault(ReadFault),
}

impl Termination {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::EndOfStream => "end-of-stream",
            Self::Stopped => "stopped",
            Self::ConsumerGone => "consumer-gone",
            Self::Fault(_) => "fault",
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        !matches!(self, Self::Fault(_))
    }
}

/// Returned by a producer once its loop has exited and the queue is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    records: u64,
    termination: Termination,
}

impl RunSummary {
    #[must_use]
    pub fn new(records: u64, termination: Termination) -> Self {
        Self {
            records,
            termination,
        }
    }

    /// Records successfully enqueued.
    #[must_use]
    pub fn records(&self) -> u64 {
        self.records
    }

    #[must_use]
    pub fn termination(&self) -> &Termination {
        &self.termination
    }

    #[must_use]
    pub fn into_termination(self) -> Termination {
        self.termination
    }
}

// ============================================================================
// Tests
// ============================================================================
