//! Bounded byte queues
//!
//! The only place the application and the poll loop exchange bytes.
//! Capacity is chosen at `begin` time, so storage comes from the heap
//! rather than a const generic.

use alloc::collections::{TryReserveError, VecDeque};

/// FIFO of bytes with a hard capacity
///
/// Pushes accept what fits and report the count; nothing is ever
/// overwritten or silently dropped below capacity.
#[derive(Debug, Default)]
pub struct ByteQueue {
    bytes: VecDeque<u8>,
    capacity: usize,
}

impl ByteQueue {
    /// An unsized queue; holds nothing until [`ByteQueue::resize`]
    pub const fn new() -> Self {
        Self {
            bytes: VecDeque::new(),
            capacity: 0,
        }
    }

    /// Discard contents and reserve storage for `capacity` bytes
    ///
    /// On allocation failure the queue is left unsized.
    pub fn resize(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        self.bytes = VecDeque::new();
        self.capacity = 0;
        self.bytes.try_reserve_exact(capacity)?;
        self.capacity = capacity;
        Ok(())
    }

    /// Drop all storage
    pub fn release(&mut self) {
        self.bytes = VecDeque::new();
        self.capacity = 0;
    }

    /// Discard queued bytes, keeping the capacity
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Maximum number of bytes the queue can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes waiting to be taken
    pub fn available(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes that can still be pushed
    pub fn space(&self) -> usize {
        self.capacity - self.bytes.len()
    }

    /// Append as much of `data` as fits, returning the count accepted
    pub fn push(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.space());
        self.bytes.extend(&data[..n]);
        n
    }

    /// Copy up to `buf.len()` bytes from the front without removing them
    pub fn peek(&self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.bytes.len());
        for (dst, src) in buf[..n].iter_mut().zip(self.bytes.iter()) {
            *dst = *src;
        }
        n
    }

    /// Remove up to `n` bytes from the front
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.bytes.len());
        self.bytes.drain(..n);
    }

    /// Move up to `buf.len()` bytes from the front into `buf`
    pub fn pop(&mut self, buf: &mut [u8]) -> usize {
        let n = self.peek(buf);
        self.consume(n);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unsized_queue_accepts_nothing() {
        let mut queue = ByteQueue::new();
        assert_eq!(queue.push(&[1, 2, 3]), 0);
        assert_eq!(queue.available(), 0);
        assert_eq!(queue.space(), 0);
    }

    #[test]
    fn test_push_stops_at_capacity() {
        let mut queue = ByteQueue::new();
        queue.resize(4).unwrap();

        assert_eq!(queue.push(&[1, 2, 3]), 3);
        assert_eq!(queue.push(&[4, 5, 6]), 1);
        assert_eq!(queue.space(), 0);

        let mut out = [0u8; 8];
        assert_eq!(queue.pop(&mut out), 4);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut queue = ByteQueue::new();
        queue.resize(8).unwrap();
        queue.push(b"abcdef");

        let mut out = [0u8; 3];
        assert_eq!(queue.peek(&mut out), 3);
        assert_eq!(&out, b"abc");
        assert_eq!(queue.available(), 6);

        queue.consume(3);
        assert_eq!(queue.pop(&mut out), 3);
        assert_eq!(&out, b"def");
    }

    #[test]
    fn test_resize_discards_contents() {
        let mut queue = ByteQueue::new();
        queue.resize(8).unwrap();
        queue.push(b"stale");

        queue.resize(16).unwrap();
        assert_eq!(queue.available(), 0);
        assert_eq!(queue.capacity(), 16);
    }

    #[test]
    fn test_release_and_clear() {
        let mut queue = ByteQueue::new();
        queue.resize(8).unwrap();
        queue.push(b"abc");

        queue.clear();
        assert_eq!(queue.available(), 0);
        assert_eq!(queue.capacity(), 8);

        queue.release();
        assert_eq!(queue.capacity(), 0);
        assert_eq!(queue.push(b"x"), 0);
    }

    proptest! {
        #[test]
        fn prop_accepted_bytes_come_out_in_order(
            capacity in 1usize..256,
            writes in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..64),
                0..16,
            ),
        ) {
            let mut queue = ByteQueue::new();
            queue.resize(capacity).unwrap();

            let mut expected = Vec::new();
            for chunk in &writes {
                let space = queue.space();
                let accepted = queue.push(chunk);
                prop_assert_eq!(accepted, chunk.len().min(space));
                expected.extend_from_slice(&chunk[..accepted]);
            }

            prop_assert!(queue.available() <= capacity);

            let mut out = vec![0u8; capacity];
            let n = queue.pop(&mut out);
            prop_assert_eq!(&out[..n], expected.as_slice());
        }
    }
}
