//! Encode queue
//!
//! FIFO of filled input buffers between the producer thread and the encoder
//! worker, guarded by one mutex and one condition variable. The worker wakes
//! when the queue becomes non-empty or a stop is requested.
//!
//! Timestamps are assigned under the queue lock, as milliseconds since the
//! first push, so they follow push order.

use std::collections::VecDeque;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::pool::InputBuffer;

/// One filled buffer awaiting submission to the engine
#[derive(Debug)]
pub struct EncodeRequest {
    /// Filled input buffer
    pub buffer: InputBuffer,
    /// Presentation timestamp, ms since the first submission
    pub timestamp_ms: u64,
    /// Submission index, starting at 0
    pub sequence: u64,
}

#[derive(Debug, Default)]
struct QueueState {
    entries: VecDeque<EncodeRequest>,
    stop_requested: bool,
    started_at: Option<Instant>,
    last_timestamp_ms: u64,
    next_sequence: u64,
}

/// Mutex + condvar protected FIFO of encode requests
#[derive(Debug, Default)]
pub struct EncodeQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl EncodeQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filled buffer and wake the worker
    ///
    /// Returns the timestamp assigned to the request.
    pub fn push(&self, buffer: InputBuffer) -> u64 {
        let mut state = self.state.lock();

        let now = Instant::now();
        let started_at = *state.started_at.get_or_insert(now);
        let elapsed = now.duration_since(started_at).as_millis() as u64;
        let timestamp_ms = elapsed.max(state.last_timestamp_ms);
        state.last_timestamp_ms = timestamp_ms;

        let sequence = state.next_sequence;
        state.next_sequence += 1;

        state.entries.push_back(EncodeRequest {
            buffer,
            timestamp_ms,
            sequence,
        });
        self.ready.notify_one();
        timestamp_ms
    }

    /// Block until a request is available or a stop was requested
    ///
    /// Returns `None` only once a stop was requested and the queue is empty,
    /// so queued requests are always drained.
    pub fn wait_next(&self) -> Option<EncodeRequest> {
        let mut state = self.state.lock();
        while state.entries.is_empty() && !state.stop_requested {
            self.ready.wait(&mut state);
        }
        state.entries.pop_front()
    }

    /// Ask the worker to drain and stop
    pub fn request_stop(&self) {
        self.state.lock().stop_requested = true;
        self.ready.notify_all();
    }

    /// Whether a stop was requested
    pub fn is_stop_requested(&self) -> bool {
        self.state.lock().stop_requested
    }

    /// Requests waiting
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether no requests are waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::pool::BufferPool;

    fn filled(pool: &BufferPool, marker: u8) -> InputBuffer {
        let mut buffer = pool.try_acquire().expect("buffer");
        buffer.fill(&[marker]).expect("fill");
        buffer
    }

    #[test]
    fn test_fifo_order_and_timestamps() {
        let pool = BufferPool::new(4, 1);
        let queue = EncodeQueue::new();

        for marker in 0..4 {
            queue.push(filled(&pool, marker));
        }
        queue.request_stop();

        let mut last_ts = 0;
        for expected in 0..4u8 {
            let request = queue.wait_next().expect("queued request");
            assert_eq!(request.buffer.filled(), &[expected]);
            assert_eq!(request.sequence, u64::from(expected));
            assert!(request.timestamp_ms >= last_ts);
            last_ts = request.timestamp_ms;
        }
        assert!(queue.wait_next().is_none());
    }

    #[test]
    fn test_first_timestamp_is_zero() {
        let pool = BufferPool::new(1, 1);
        let queue = EncodeQueue::new();
        assert_eq!(queue.push(filled(&pool, 1)), 0);
    }

    #[test]
    fn test_stop_wakes_waiting_worker() {
        let queue = Arc::new(EncodeQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.wait_next().is_none())
        };

        thread::sleep(Duration::from_millis(20));
        queue.request_stop();
        assert!(waiter.join().expect("waiter thread"));
        assert!(queue.is_stop_requested());
    }

    #[test]
    fn test_push_wakes_waiting_worker() {
        let pool = BufferPool::new(1, 1);
        let queue = Arc::new(EncodeQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.wait_next().map(|r| r.buffer.filled().to_vec()))
        };

        thread::sleep(Duration::from_millis(20));
        queue.push(filled(&pool, 9));
        assert_eq!(waiter.join().expect("waiter thread"), Some(vec![9]));
        assert!(queue.is_empty());
    }
}
