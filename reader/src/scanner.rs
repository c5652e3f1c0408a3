//! Delimiter framing over a buffered byte source.
//!
//! A record is everything up to (not including) the next delimiter byte.
//! [`RecordScanner`] returns one [`Record`] per delimiter and `Ok(None)` at
//! end-of-stream. Bytes after the last delimiter are never emitted: a
//! trailing unterminated chunk is dropped and its length is kept for
//! diagnostics.

use std::io::{self, BufRead};

use linepump_types::Record;

/// Reads delimiter-terminated records from a blocking buffered reader.
pub struct RecordScanner<R> {
    reader: R,
    delimiter: u8,
    discarded_tail: Option<usize>,
}

impl<R: BufRead> RecordScanner<R> {
    pub fn new(reader: R, delimiter: u8) -> Self {
        Self {
            reader,
            delimiter,
            discarded_tail: None,
        }
    }

    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Read the next record, blocking until a delimiter, end-of-stream, or an error.
    ///
    /// Returns `Ok(None)` on end-of-stream. `Interrupted` reads are retried by
    /// `read_until`; any other error is returned as-is.
    pub fn next_record(&mut self) -> io::Result<Option<Record>> {
        // Fresh buffer per record: the previous one now belongs to the consumer.
        let mut buf = Vec::new();
        let read = self.reader.read_until(self.delimiter, &mut buf)?;
        if read == 0 {
            return Ok(None);
        }

        if buf.last() != Some(&self.delimiter) {
            self.discarded_tail = Some(buf.len());
            return Ok(None);
        }

        buf.pop();
        Ok(Some(Record::new(buf)))
    }

    /// Length of the unterminated chunk dropped at end-of-stream, if any.
    ///
    /// Cleared by the call.
    pub fn take_discarded_tail(&mut self) -> Option<usize> {
        self.discarded_tail.take()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> Iterator for RecordScanner<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
