//! Growable byte staging area used by the async pipeline
//!
//! An [`ElasticBuffer`] is written at its write cursor and drained from its
//! read cursor. Once drained it is [`reset`](ElasticBuffer::reset) and reused,
//! so a pipeline allocates its two buffers once and then only swaps them.

/// Initial capacity of a buffer (10 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Below this capacity growth doubles, above it growth is linear (100 MiB)
pub const THRESHOLD_BUFFER_SIZE: usize = 100 * 1024 * 1024;

/// Linear growth step once past the threshold (10 MiB)
pub const INCREMENT_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Append-only byte buffer with read and write cursors.
///
/// Invariant: `read <= write <= capacity`.
#[derive(Debug)]
pub struct ElasticBuffer {
    data: Vec<u8>,
    read: usize,
    write: usize,
}

impl ElasticBuffer {
    /// Create a buffer with [`DEFAULT_BUFFER_SIZE`] capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            read: 0,
            write: 0,
        }
    }

    /// Copy `bytes` at the write cursor, growing first if they do not fit.
    pub fn append(&mut self, bytes: &[u8]) {
        self.ensure_writable(bytes.len());
        self.data[self.write..self.write + bytes.len()].copy_from_slice(bytes);
        self.write += bytes.len();
    }

    /// Bytes between the read and write cursors
    #[inline]
    pub fn readable_span(&self) -> &[u8] {
        &self.data[self.read..self.write]
    }

    #[inline]
    pub fn readable_len(&self) -> usize {
        self.write - self.read
    }

    #[inline]
    pub fn writable_len(&self) -> usize {
        self.data.len() - self.write
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Consume `len` readable bytes.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds [`readable_len`](Self::readable_len).
    pub fn advance_read(&mut self, len: usize) {
        assert!(
            len <= self.readable_len(),
            "advance_read({}) past readable length {}",
            len,
            self.readable_len()
        );
        self.read += len;
    }

    /// Rewind both cursors; the allocation is kept.
    pub fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
    }

    /// Exchange storage and cursors with `other` without copying.
    pub fn swap(&mut self, other: &mut ElasticBuffer) {
        std::mem::swap(self, other);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    /// Capacity the buffer grows to when `len` more bytes must fit.
    pub fn grown_capacity(current: usize, len: usize) -> usize {
        if current < THRESHOLD_BUFFER_SIZE {
            current * 2 + len
        } else {
            current + INCREMENT_BUFFER_SIZE + len
        }
    }

    fn ensure_writable(&mut self, len: usize) {
        if len <= self.writable_len() {
            return;
        }
        let new_capacity = Self::grown_capacity(self.capacity(), len);
        self.data.resize(new_capacity, 0);
    }
}

impl Default for ElasticBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_read() {
        let mut buffer = ElasticBuffer::with_capacity(16);
        buffer.append(b"hello ");
        buffer.append(b"world");

        assert_eq!(buffer.readable_span(), b"hello world");
        assert_eq!(buffer.readable_len(), 11);
        assert_eq!(buffer.writable_len(), 5);
    }

    #[test]
    fn test_growth_doubles_below_threshold() {
        let mut buffer = ElasticBuffer::with_capacity(8);
        buffer.append(b"12345678");
        buffer.append(b"abc");

        assert_eq!(buffer.capacity(), 8 * 2 + 3);
        assert_eq!(buffer.readable_span(), b"12345678abc");
    }

    #[test]
    fn test_growth_is_linear_above_threshold() {
        assert_eq!(
            ElasticBuffer::grown_capacity(THRESHOLD_BUFFER_SIZE, 7),
            THRESHOLD_BUFFER_SIZE + INCREMENT_BUFFER_SIZE + 7
        );
        assert_eq!(
            ElasticBuffer::grown_capacity(THRESHOLD_BUFFER_SIZE - 1, 7),
            (THRESHOLD_BUFFER_SIZE - 1) * 2 + 7
        );
    }

    #[test]
    fn test_advance_and_reset_keep_capacity() {
        let mut buffer = ElasticBuffer::with_capacity(4);
        buffer.append(b"abcdef");
        let grown = buffer.capacity();

        buffer.advance_read(2);
        assert_eq!(buffer.readable_span(), b"cdef");

        buffer.advance_read(4);
        assert!(buffer.is_empty());

        buffer.reset();
        assert_eq!(buffer.capacity(), grown);
        assert_eq!(buffer.writable_len(), grown);
    }

    #[test]
    #[should_panic(expected = "past readable length")]
    fn test_advance_past_readable_panics() {
        let mut buffer = ElasticBuffer::with_capacity(4);
        buffer.append(b"ab");
        buffer.advance_read(3);
    }

    #[test]
    fn test_swap_exchanges_contents() {
        let mut producer = ElasticBuffer::with_capacity(4);
        let mut consumer = ElasticBuffer::with_capacity(32);
        producer.append(b"data");

        producer.swap(&mut consumer);

        assert!(producer.is_empty());
        assert_eq!(producer.capacity(), 32);
        assert_eq!(consumer.readable_span(), b"data");
        assert_eq!(consumer.capacity(), 4);
    }

    #[test]
    fn test_default_capacity() {
        let buffer = ElasticBuffer::default();
        assert_eq!(buffer.capacity(), DEFAULT_BUFFER_SIZE);
        assert!(buffer.is_empty());
    }
}
