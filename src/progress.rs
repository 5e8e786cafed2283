//! Progress reporting along a regularization path
//!
//! Reporters only observe the path solver, they never influence its results.

use log::trace;

/// Receives one tick per fitted lambda
pub trait PathProgress {
    fn start(&mut self, total: usize);
    fn advance(&mut self, n: usize);
    fn finish(&mut self);
}

/// Reporter discarding all progress
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl PathProgress for NoProgress {
    fn start(&mut self, _total: usize) {}
    fn advance(&mut self, _n: usize) {}
    fn finish(&mut self) {}
}

/// Reporter emitting `trace!` records
#[derive(Clone, Debug, Default)]
pub struct LogProgress {
    total: usize,
    done: usize,
}

impl LogProgress {
    pub fn done(&self) -> usize {
        self.done
    }
}

impl PathProgress for LogProgress {
    fn start(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        trace!("fitting path of {} lambda values", total);
    }

    fn advance(&mut self, n: usize) {
        self.done += n;
        trace!("lambda {}/{}", self.done, self.total);
    }

    fn finish(&mut self) {
        trace!("path finished after {} lambda values", self.done);
    }
}

#[cfg(feature = "progress")]
mod bar {
    use super::PathProgress;
    use indicatif::{ProgressBar, ProgressStyle};

    /// Terminal progress bar for path fits
    pub fn path_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} lambdas")
        {
            pb.set_style(style);
        }
        pb
    }

    impl PathProgress for ProgressBar {
        fn start(&mut self, total: usize) {
            self.set_length(total as u64);
            self.set_position(0);
        }

        fn advance(&mut self, n: usize) {
            self.inc(n as u64);
        }

        fn finish(&mut self) {
            ProgressBar::finish(self);
        }
    }
}

#[cfg(feature = "progress")]
pub use bar::path_progress_bar;
