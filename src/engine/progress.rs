//! Progress counter for hashed files (verbose CLI only).

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

/// Open-ended "N files" counter on stderr. The total is unknown until the walk ends.
#[derive(Clone)]
pub struct HashProgress {
    bar: Arc<Mutex<Bar>>,
}

impl HashProgress {
    /// Counter drawn immediately at "0 files".
    pub fn start(desc: &'static str) -> Self {
        let progress = Self {
            bar: Arc::new(Mutex::new(kdam::tqdm!(
                total = 0,
                desc = desc,
                animation = Animation::Classic,
                position = 0,
                unit = " files"
            ))),
        };
        progress.redraw();
        progress
    }

    fn redraw(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            let _ = bar.refresh();
        }
    }

    /// Add `n` hashed files.
    pub fn advance(&self, n: usize) {
        if let Ok(mut bar) = self.bar.lock() {
            let _ = bar.update(n);
        }
    }

    /// Batch callback for [`aggregate_with_progress`](crate::pipeline::aggregate_with_progress).
    pub fn callback(&self) -> Box<dyn Fn(usize) + Send> {
        let progress = self.clone();
        Box::new(move |n| progress.advance(n))
    }

    /// Final redraw, then move stdout output below the bar.
    pub fn finish(&self) {
        self.redraw();
        eprintln!();
    }
}
