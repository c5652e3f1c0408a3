//! The read loop: the only writer to a reader's queue.

use std::io::{BufReader, Read};

use linepump_types::{ReadFault, ReaderEvent, RunSummary, Termination};
use tokio::sync::mpsc;

use crate::diagnostics::{DiagnosticKind, Reporter};
use crate::scanner::RecordScanner;
use crate::shutdown::ShutdownSignal;

/// The producing half of a reader.
///
/// Obtained from [`crate::DelimitedReader::split`]. [`Producer::run`] blocks, so
/// run it on its own thread or blocking task. It must not be called from
/// inside an async task: enqueueing uses `blocking_send`.
pub struct Producer<R> {
    scanner: RecordScanner<BufReader<R>>,
    tx: mpsc::Sender<ReaderEvent>,
    shutdown: ShutdownSignal,
    reporter: Reporter,
}

impl<R: Read> Producer<R> {
    pub(crate) fn new(
        source: R,
        delimiter: u8,
        tx: mpsc::Sender<ReaderEvent>,
        shutdown: ShutdownSignal,
        reporter: Reporter,
    ) -> Self {
        Self {
            scanner: RecordScanner::new(BufReader::new(source), delimiter),
            tx,
            shutdown,
            reporter,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.reporter.name()
    }

    /// Run the read loop to completion.
    ///
    /// Each iteration checks the shutdown signal, then blocks on the source
    /// until a delimiter, end-of-stream, or an error. Records are enqueued in
    /// source order; a full queue blocks the loop until the consumer makes
    /// room. A stop request is only seen at the top of the loop, never in the
    /// middle of a read or an enqueue.
    ///
    /// End-of-stream and read faults are sent as a final [`ReaderEvent`]. On
    /// every exit path the queue is closed when this returns.
    pub fn run(self) -> RunSummary {
        let Self {
            mut scanner,
            tx,
            shutdown,
            reporter,
        } = self;

        let mut records: u64 = 0;
        let termination = loop {
            if shutdown.is_raised() {
                reporter.emit(DiagnosticKind::ShutdownObserved { records });
                break Termination::Stopped;
            }

            match scanner.next_record() {
                Ok(Some(record)) => {
                    reporter.emit(DiagnosticKind::RecordRead {
                        len: record.len(),
                        offset: records,
                    });
                    // Blocks while the queue is full; fails only once the receiver is gone.
                    if tx.blocking_send(ReaderEvent::Record(record)).is_err() {
                        reporter.emit(DiagnosticKind::ConsumerGone { records });
                        break Termination::ConsumerGone;
                    }
                    records += 1;
                }
                Ok(None) => {
                    if let Some(len) = scanner.take_discarded_tail() {
                        reporter.emit(DiagnosticKind::UnterminatedTail { len });
                    }
                    reporter.emit(DiagnosticKind::EndOfStream { records });
                    let _ = tx.blocking_send(ReaderEvent::EndOfStream { records });
                    break Termination::EndOfStream;
                }
                Err(err) => {
                    let fault = ReadFault::new(reporter.name(), &err, records);
                    reporter.emit(DiagnosticKind::ReadFailed { fault: &fault });
                    let _ = tx.blocking_send(ReaderEvent::Fault(fault.clone()));
                    break Termination::Fault(fault);
                }
            }
        };

        // The one and only close of the queue.
        drop(tx);
        RunSummary::new(records, termination)
    }
}
