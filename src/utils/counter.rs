//! Run-wide tally of processed files and reported problems.
use crate::types::*;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;

/// Counts per-file outcomes plus recoverable warnings across a run.
pub struct Counter {
    ok: AtomicUsize,
    ignored: AtomicUsize,
    error: AtomicUsize,
    warning: AtomicUsize,
}

impl Counter {
    /// Creates a counter with every tally at zero.
    pub fn new() -> Self {
        Self {
            ok: AtomicUsize::new(0),
            ignored: AtomicUsize::new(0),
            error: AtomicUsize::new(0),
            warning: AtomicUsize::new(0),
        }
    }

    /// Counts a file that failed with a fatal error.
    pub fn inc_error(&self) {
        self.error.fetch_add(1, SeqCst);
    }

    /// Counts a recoverable problem that was logged and skipped.
    pub fn inc_warning(&self) {
        self.warning.fetch_add(1, SeqCst);
    }

    /// Counts a file that was processed, by outcome.
    pub fn inc(&self, result: ScriptResult) {
        match result {
            ScriptResult::Ok => {
                self.ok.fetch_add(1, SeqCst);
            }
            ScriptResult::Ignored => {
                self.ignored.fetch_add(1, SeqCst);
            }
        }
    }

    /// Number of files that failed so far. A non-zero value makes the run fail.
    pub fn errors(&self) -> usize {
        self.error.load(SeqCst)
    }

    /// Number of recoverable problems logged so far.
    pub fn warnings(&self) -> usize {
        self.warning.load(SeqCst)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OK: {}, Ignored: {}, Error: {}, Warning: {}",
            self.ok.load(SeqCst),
            self.ignored.load(SeqCst),
            self.error.load(SeqCst),
            self.warning.load(SeqCst),
        )
    }
}

#[test]
fn test_counter() {
    let counter = Counter::new();
    counter.inc(ScriptResult::Ok);
    counter.inc(ScriptResult::Ok);
    counter.inc(ScriptResult::Ignored);
    counter.inc_warning();
    counter.inc_error();
    assert_eq!(counter.errors(), 1);
    assert_eq!(counter.warnings(), 1);
    assert_eq!(
        counter.to_string(),
        "OK: 2, Ignored: 1, Error: 1, Warning: 1"
    );
}
