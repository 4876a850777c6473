//! Progress reporting for long-running operators.
//!
//! Subdivision passes and relaxation loops accept a [`Progress`] so a caller
//! (the CLI progress bar, a test, a GUI) can follow along without the
//! operators knowing who is listening.
//!
//! # Example
//!
//! ```
//! use quadsphere::algo::Progress;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = seen.clone();
//! let progress = Progress::new(move |_current, _total, _message| {
//!     counter.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! progress.report(1, 4, "Relaxing");
//! assert_eq!(seen.load(Ordering::Relaxed), 1);
//! ```

use std::fmt;
use std::sync::Arc;

type Callback = dyn Fn(usize, usize, &str) + Send + Sync;

/// A progress callback receiving `(current, total, message)` updates.
///
/// `current` counts completed steps, so a finished operation reports
/// `current == total`. Clones share the same callback.
#[derive(Clone)]
pub struct Progress {
    callback: Arc<Callback>,
}

impl Progress {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// A reporter that discards every update.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }

    /// Report `current` of `total` steps.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report progress of a sub-operation occupying stage `stage` of `stages`.
    ///
    /// The sub-operation's `[0, sub_total]` range is mapped onto
    /// `[stage, stage + 1]` in units of 1/1000 of a stage, so the caller sees a
    /// single monotone counter across a multi-stage pipeline.
    #[inline]
    pub fn report_sub(
        &self,
        sub_current: usize,
        sub_total: usize,
        stage: usize,
        stages: usize,
        message: &str,
    ) {
        const SCALE: usize = 1000;
        if sub_total == 0 || stages == 0 {
            return;
        }
        let within = sub_current.min(sub_total) * SCALE / sub_total;
        (self.callback)(stage * SCALE + within, stages * SCALE, message);
    }

    /// A reporter forwarding into stage `stage` of `stages` of this one.
    ///
    /// Operators report their own `(current, total)`; the returned reporter
    /// maps them with [`report_sub`](Self::report_sub).
    pub fn stage(&self, stage: usize, stages: usize) -> Progress {
        let outer = self.clone();
        Progress::new(move |current, total, message| {
            outer.report_sub(current, total, stage, stages, message)
        })
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_report_sub_maps_into_slice() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let progress = Progress::new(move |c, t, _| sink.lock().unwrap().push((c, t)));

        progress.report_sub(1, 2, 1, 4, "stage");
        progress.report_sub(5, 2, 3, 4, "clamped");
        progress.report_sub(1, 0, 0, 4, "ignored");

        let log = log.lock().unwrap();
        assert_eq!(*log, vec![(1500, 4000), (4000, 4000)]);
    }

    #[test]
    fn test_stage_forwards_to_parent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let progress = Progress::new(move |c, t, m: &str| {
            sink.lock().unwrap().push((c, t, m.to_string()))
        });

        let relax = progress.stage(2, 3);
        relax.report(5, 10, "Relaxing");
        assert_eq!(*log.lock().unwrap(), vec![(2500, 3000, "Relaxing".to_string())]);
    }
}
