use std::mem;

/// Accumulates encoded lines into newline-joined payloads bounded by
/// `max_payload_bytes`.
///
/// The buffer never transmits anything itself. `push` hands back the
/// payloads that became due, so the caller can send them after releasing
/// whatever lock guards the buffer.
pub(crate) struct Batch {
    buf: Vec<u8>,
    max_payload_bytes: usize,
}

impl Batch {
    pub(crate) fn new(max_payload_bytes: usize) -> Batch {
        Batch {
            buf: Vec::with_capacity(max_payload_bytes.min(8192)),
            max_payload_bytes,
        }
    }

    /// Append a line, returning any payloads that must now be transmitted.
    ///
    /// A line whose addition would push the buffer past the budget displaces
    /// the current batch and starts the next one. A line that alone exceeds
    /// the budget is returned for immediate transmission without being
    /// buffered; the transport gets to attempt it rather than the buffer
    /// silently dropping it.
    pub(crate) fn push(&mut self, line: &str) -> Vec<Vec<u8>> {
        let mut due = Vec::new();
        if line.len() > self.max_payload_bytes {
            if let Some(full) = self.take() {
                due.push(full);
            }
            due.push(line.as_bytes().to_vec());
            return due;
        }
        if !self.buf.is_empty() && self.buf.len() + 1 + line.len() > self.max_payload_bytes {
            if let Some(full) = self.take() {
                due.push(full);
            }
        }
        if !self.buf.is_empty() {
            self.buf.push(b'\n');
        }
        self.buf.extend_from_slice(line.as_bytes());
        due
    }

    /// Drain the buffered payload, leaving the batch empty.
    pub(crate) fn take(&mut self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            None
        } else {
            let next = Vec::with_capacity(self.buf.capacity());
            Some(mem::replace(&mut self.buf, next))
        }
    }

    #[cfg(test)]
    fn buffered_len(&self) -> usize {
        self.buf.len()
    }
}
