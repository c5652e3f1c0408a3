//! Shared test utilities and fixtures
//!
//! Byte sources with controllable behavior and helpers for draining streams.

#![allow(dead_code)]

use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use linepump_reader::{MemorySink, ReaderEvent, RecordStream};

/// A source whose reads block until the test hands it bytes.
///
/// Dropping the [`Gate`] ends the stream.
pub struct GatedSource {
    rx: mpsc::Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
    waits: Arc<AtomicUsize>,
}

pub struct Gate {
    tx: mpsc::Sender<Vec<u8>>,
    waits: Arc<AtomicUsize>,
}

impl Gate {
    pub fn feed(&self, bytes: &[u8]) {
        self.tx.send(bytes.to_vec()).expect("gated source dropped");
    }

    /// Wait until the source has started blocking for the `n`th time.
    pub async fn parked(&self, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.waits.load(Ordering::Acquire) < n {
            assert!(Instant::now() < deadline, "source never blocked {n} times");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

pub fn gated() -> (GatedSource, Gate) {
    let (tx, rx) = mpsc::channel();
    let waits = Arc::new(AtomicUsize::new(0));
    (
        GatedSource {
            rx,
            pending: Vec::new(),
            pos: 0,
            waits: waits.clone(),
        },
        Gate { tx, waits },
    )
}

impl Read for GatedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.pending.len() {
            self.waits.fetch_add(1, Ordering::AcqRel);
            match self.rx.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Yields `data`, then fails every read with `kind`.
pub struct FailingSource {
    data: io::Cursor<Vec<u8>>,
    kind: io::ErrorKind,
}

impl FailingSource {
    pub fn new(data: &[u8], kind: io::ErrorKind) -> Self {
        Self {
            data: io::Cursor::new(data.to_vec()),
            kind,
        }
    }
}

impl Read for FailingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.data.read(buf)?;
        if n == 0 {
            return Err(io::Error::new(self.kind, "source failed"));
        }
        Ok(n)
    }
}

/// Returns `Interrupted` on every other read, data otherwise.
pub struct FlakySource {
    data: io::Cursor<Vec<u8>>,
    interrupt_next: bool,
}

impl FlakySource {
    pub fn new(data: &[u8]) -> Self {
        Self {
            data: io::Cursor::new(data.to_vec()),
            interrupt_next: true,
        }
    }
}

impl Read for FlakySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if std::mem::replace(&mut self.interrupt_next, false) {
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        self.interrupt_next = true;
        // One byte at a time so the interruptions land mid-record.
        let len = buf.len().min(1);
        self.data.read(&mut buf[..len])
    }
}

/// Everything a stream delivers until it closes, split into record payloads
/// and the terminal event (if one was sent).
pub async fn collect(stream: &mut RecordStream) -> (Vec<Vec<u8>>, Option<ReaderEvent>) {
    let mut records = Vec::new();
    let mut terminal = None;
    while let Some(event) = stream.recv().await {
        match event {
            ReaderEvent::Record(record) => {
                assert!(terminal.is_none(), "record after terminal event");
                records.push(record.into_vec());
            }
            other => {
                assert!(terminal.is_none(), "two terminal events");
                terminal = Some(other);
            }
        }
    }
    (records, terminal)
}

/// Blocking twin of [`collect`] for tests outside a runtime.
pub fn blocking_collect(stream: &mut RecordStream) -> (Vec<Vec<u8>>, Option<ReaderEvent>) {
    let mut records = Vec::new();
    let mut terminal = None;
    while let Some(event) = stream.blocking_recv() {
        match event {
            ReaderEvent::Record(record) => records.push(record.into_vec()),
            other => terminal = Some(other),
        }
    }
    (records, terminal)
}

/// Poll `sink` until `label` has been emitted `count` times.
pub async fn wait_for(sink: &MemorySink, label: &str, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while sink.count(label) < count {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {count} x {label}, saw {:?}",
            sink.labels()
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn payloads(items: &[&str]) -> Vec<Vec<u8>> {
    items.iter().map(|s| s.as_bytes().to_vec()).collect()
}
