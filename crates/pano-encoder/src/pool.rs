//! Encoder input buffer pool
//!
//! A fixed set of input buffers, allocated once when the pipeline starts.
//! [`BufferPool::try_acquire`] never blocks: an empty pool means the caller
//! must drop the frame. A buffer returns to the pool when its
//! [`InputBuffer`] handle is dropped, which the worker does right after the
//! engine has taken the payload.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{EncoderError, Result};

#[derive(Debug)]
struct PoolInner {
    free: Mutex<Vec<Vec<u8>>>,
    buffer_size: usize,
    capacity: usize,
}

/// Fixed-size pool of input buffers
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// Allocate `count` buffers of `buffer_size` bytes each
    pub fn new(count: usize, buffer_size: usize) -> Self {
        let free = (0..count).map(|_| vec![0u8; buffer_size]).collect();
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(free),
                buffer_size,
                capacity: count,
            }),
        }
    }

    /// Take a free buffer, or `None` if all are in flight
    pub fn try_acquire(&self) -> Option<InputBuffer> {
        let data = self.inner.free.lock().pop()?;
        Some(InputBuffer {
            data,
            filled_len: 0,
            pool: Arc::clone(&self.inner),
        })
    }

    /// Buffers currently free
    pub fn available(&self) -> usize {
        self.inner.free.lock().len()
    }

    /// Total number of buffers
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Size of each buffer in bytes
    pub fn buffer_size(&self) -> usize {
        self.inner.buffer_size
    }
}

/// An acquired input buffer
///
/// Returned to its pool on drop.
#[derive(Debug)]
pub struct InputBuffer {
    data: Vec<u8>,
    filled_len: usize,
    pool: Arc<PoolInner>,
}

impl InputBuffer {
    /// Buffer capacity in bytes
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes marked as payload
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.filled_len]
    }

    /// Number of payload bytes
    pub fn filled_len(&self) -> usize {
        self.filled_len
    }

    /// Copy `bytes` in and mark them as the payload
    pub fn fill(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.capacity() {
            return Err(EncoderError::FrameSizeMismatch {
                expected: self.capacity(),
                actual: bytes.len(),
            });
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.filled_len = bytes.len();
        Ok(())
    }

    /// Writable storage; call [`set_filled_len`](Self::set_filled_len) afterwards
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Mark the first `len` bytes as payload (clamped to capacity)
    pub fn set_filled_len(&mut self, len: usize) {
        self.filled_len = len.min(self.data.len());
    }
}

impl Drop for InputBuffer {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        self.pool.free.lock().push(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_until_exhausted() {
        let pool = BufferPool::new(2, 16);
        assert_eq!(pool.capacity(), 2);

        let a = pool.try_acquire().expect("first buffer");
        let b = pool.try_acquire().expect("second buffer");
        assert_eq!(pool.available(), 0);
        assert!(pool.try_acquire().is_none());

        drop(a);
        assert_eq!(pool.available(), 1);
        let c = pool.try_acquire().expect("recycled buffer");
        assert_eq!(c.capacity(), 16);
        drop((b, c));
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_fill() {
        let pool = BufferPool::new(1, 8);
        let mut buffer = pool.try_acquire().expect("buffer");

        buffer.fill(&[1, 2, 3]).expect("fits");
        assert_eq!(buffer.filled(), &[1, 2, 3]);

        let err = buffer.fill(&[0; 9]).expect_err("too large");
        assert!(matches!(err, EncoderError::FrameSizeMismatch { expected: 8, actual: 9 }));

        buffer.as_mut_slice()[..2].copy_from_slice(&[7, 7]);
        buffer.set_filled_len(100);
        assert_eq!(buffer.filled_len(), 8);
    }
}
