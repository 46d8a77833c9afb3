//! Pipeline statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Encoder pipeline statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderStats {
    /// Frames accepted into the encode queue
    pub frames_queued: u64,

    /// Frames dropped because no input buffer was free
    pub frames_dropped: u64,

    /// Output segments written to the sink
    pub segments_written: u64,

    /// Total bytes written to the sink
    pub bytes_written: u64,

    /// Input buffers the engine rejected
    pub submit_failures: u64,

    /// Output retrievals that failed or gave up
    pub retrieval_failures: u64,

    /// Segments the sink failed to accept
    pub write_failures: u64,
}

impl EncoderStats {
    /// Fraction of offered frames that were dropped
    #[must_use]
    pub fn drop_rate(&self) -> f64 {
        let total = self.frames_queued + self.frames_dropped;
        if total == 0 {
            return 0.0;
        }
        self.frames_dropped as f64 / total as f64
    }

    /// Average bytes per written segment
    #[must_use]
    pub fn avg_segment_size(&self) -> u64 {
        if self.segments_written == 0 {
            return 0;
        }
        self.bytes_written / self.segments_written
    }
}

/// Live counters shared between the producer and the worker
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) frames_queued: AtomicU64,
    pub(crate) frames_dropped: AtomicU64,
    pub(crate) segments_written: AtomicU64,
    pub(crate) bytes_written: AtomicU64,
    pub(crate) submit_failures: AtomicU64,
    pub(crate) retrieval_failures: AtomicU64,
    pub(crate) write_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_segment(&self, len: usize) {
        self.segments_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> EncoderStats {
        EncoderStats {
            frames_queued: self.frames_queued.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            segments_written: self.segments_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            submit_failures: self.submit_failures.load(Ordering::Relaxed),
            retrieval_failures: self.retrieval_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats() {
        let counters = StatsCounters::default();
        StatsCounters::bump(&counters.frames_queued);
        StatsCounters::bump(&counters.frames_queued);
        StatsCounters::bump(&counters.frames_queued);
        StatsCounters::bump(&counters.frames_dropped);
        counters.record_segment(100);
        counters.record_segment(300);

        let stats = counters.snapshot();
        assert_eq!(stats.frames_queued, 3);
        assert_eq!(stats.segments_written, 2);
        assert_eq!(stats.bytes_written, 400);
        assert_eq!(stats.avg_segment_size(), 200);
        assert!((stats.drop_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats() {
        let stats = EncoderStats::default();
        assert_eq!(stats.drop_rate(), 0.0);
        assert_eq!(stats.avg_segment_size(), 0);
    }
}
