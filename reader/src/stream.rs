//! Consumer side of a reader: receive records, stop early.

use std::num::NonZeroUsize;

use linepump_types::{ReadFault, ReaderEvent, Record, RunSummary};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::diagnostics::{DiagnosticKind, Reporter};
use crate::shutdown::ShutdownSignal;

/// The receiving half of a reader's bounded queue, plus its stop control.
///
/// Records arrive in source order. The queue closes exactly once, when the
/// producer loop exits; after that every receive returns `None`.
pub struct RecordStream {
    rx: mpsc::Receiver<ReaderEvent>,
    shutdown: ShutdownSignal,
    reporter: Reporter,
    capacity: NonZeroUsize,
    join: Option<JoinHandle<RunSummary>>,
    summary: Option<RunSummary>,
}

impl RecordStream {
    pub(crate) fn new(
        rx: mpsc::Receiver<ReaderEvent>,
        shutdown: ShutdownSignal,
        reporter: Reporter,
        capacity: NonZeroUsize,
    ) -> Self {
        Self {
            rx,
            shutdown,
            reporter,
            capacity,
            join: None,
            summary: None,
        }
    }

    pub(crate) fn attach(&mut self, join: JoinHandle<RunSummary>) {
        self.join = Some(join);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.reporter.name()
    }

    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Next queue item, or `None` once the queue is closed and empty.
    pub async fn recv(&mut self) -> Option<ReaderEvent> {
        self.rx.recv().await
    }

    /// Blocking variant of [`Self::recv`] for consumers outside an async runtime.
    ///
    /// Panics if called from inside an async task, like `blocking_recv`.
    pub fn blocking_recv(&mut self) -> Option<ReaderEvent> {
        self.rx.blocking_recv()
    }

    /// Next record; `Ok(None)` at end-of-stream or after a stop.
    ///
    /// A read fault is returned as `Err` exactly once; later calls see `Ok(None)`.
    pub async fn next_record(&mut self) -> Result<Option<Record>, ReadFault> {
        into_record(self.rx.recv().await)
    }

    pub fn blocking_next_record(&mut self) -> Result<Option<Record>, ReadFault> {
        into_record(self.rx.blocking_recv())
    }

    /// Ask the producer to stop without waiting for it.
    ///
    /// Returns `true` for the request that raised the signal. The producer
    /// only notices at the top of its loop, so it may still deliver the record
    /// it is reading or enqueueing. Use [`Self::stop`] to wait for it.
    pub fn request_stop(&self) -> bool {
        let first = self.shutdown.raise();
        if first {
            self.reporter.emit(DiagnosticKind::StopRequested);
        } else {
            self.reporter.emit(DiagnosticKind::StopRepeated);
        }
        first
    }

    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.shutdown.is_raised()
    }

    /// Stop the producer and wait until it has exited.
    ///
    /// Raises the shutdown signal, then receives and discards everything left
    /// in the queue until it closes. Draining is what frees a producer that is
    /// blocked on a full queue. For readers started with
    /// [`crate::DelimitedReader::spawn`] the producer task is awaited as well
    /// and its summary becomes available from [`Self::summary`].
    ///
    /// Returns the number of records discarded, at most capacity + 1. Calling
    /// it again is a no-op that returns 0.
    ///
    /// A read blocked inside the byte source cannot be interrupted; this
    /// returns only once that read completes.
    pub async fn stop(&mut self) -> usize {
        self.request_stop();

        let mut discarded = 0;
        while let Some(event) = self.rx.recv().await {
            if let ReaderEvent::Record(_) = event {
                discarded += 1;
            }
        }

        if let Some(join) = self.join.take() {
            match join.await {
                Ok(summary) => self.summary = Some(summary),
                Err(e) => {
                    let reason = e.to_string();
                    self.reporter
                        .emit(DiagnosticKind::ProducerLost { reason: &reason });
                }
            }
        }

        self.reporter.emit(DiagnosticKind::Drained { discarded });
        discarded
    }

    /// Blocking variant of [`Self::stop`] for consumers outside an async runtime.
    ///
    /// Returns once the queue has closed, i.e. once the producer loop has
    /// exited. A spawned producer task is not joined here, so
    /// [`Self::summary`] stays empty.
    pub fn blocking_stop(&mut self) -> usize {
        self.request_stop();

        let mut discarded = 0;
        while let Some(event) = self.rx.blocking_recv() {
            if let ReaderEvent::Record(_) = event {
                discarded += 1;
            }
        }

        self.reporter.emit(DiagnosticKind::Drained { discarded });
        discarded
    }

    /// Outcome of a spawned producer, once [`Self::stop`] has joined it.
    #[must_use]
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }
}

fn into_record(event: Option<ReaderEvent>) -> Result<Option<Record>, ReadFault> {
    match event {
        Some(ReaderEvent::Record(record)) => Ok(Some(record)),
        Some(ReaderEvent::Fault(fault)) => Err(fault),
        Some(ReaderEvent::EndOfStream { .. }) | None => Ok(None),
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        // Best-effort stop if the consumer walks away early; do not block in Drop.
        //
        // Closing the receiver makes a pending `blocking_send` in the producer fail,
        // so the loop exits even though nobody drains.
        self.shutdown.raise();
        self.rx.close();
    }
}
