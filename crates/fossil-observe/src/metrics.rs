//! In-process RPC statistics for one client connection.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Calls, failures and latency of every RPC a client has made.
#[derive(Debug, Default)]
pub struct RpcStats {
    calls: AtomicU64,
    failures: AtomicU64,
    total_ns: AtomicU64,
    max_ns: AtomicU64,
}

impl RpcStats {
    /// Starts timing one call; see [`CallTimer::finish`].
    pub fn start(&self) -> CallTimer<'_> {
        CallTimer {
            stats: self,
            start: Instant::now(),
            finished: false,
        }
    }

    pub fn record(&self, elapsed: Duration, ok: bool) {
        let ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        self.total_ns.fetch_add(ns, Ordering::Relaxed);
        self.max_ns.fetch_max(ns, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RpcSnapshot {
        RpcSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            total_ns: self.total_ns.load(Ordering::Relaxed),
            max_ns: self.max_ns.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpcSnapshot {
    pub calls: u64,
    pub failures: u64,
    pub total_ns: u64,
    pub max_ns: u64,
}

impl RpcSnapshot {
    pub fn avg_ms(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        (self.total_ns / self.calls) as f64 / 1_000_000.0
    }

    pub fn max_ms(&self) -> f64 {
        self.max_ns as f64 / 1_000_000.0
    }
}

/// Status-line form: `rpc=12 failed=1 avg=3.5ms`.
impl fmt::Display for RpcSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rpc={} failed={} avg={:.1}ms",
            self.calls,
            self.failures,
            self.avg_ms()
        )
    }
}

/// Times one call. A timer dropped without [`finish`](Self::finish) counts
/// as a failed call, so cancelled requests still show up.
#[derive(Debug)]
pub struct CallTimer<'a> {
    stats: &'a RpcStats,
    start: Instant,
    finished: bool,
}

impl CallTimer<'_> {
    pub fn finish(mut self, ok: bool) {
        self.finished = true;
        self.stats.record(self.start.elapsed(), ok);
    }
}

impl Drop for CallTimer<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.stats.record(self.start.elapsed(), false);
        }
    }
}
