use std::collections::BTreeSet;

use log::warn;

use crate::puzzle::PuzzleId;

/// Limits handed to every record reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Largest field accepted, in bytes. Solutions for the big cubes run to
    /// hundreds of kilobytes.
    pub max_field_len: usize,
}

impl Default for ReaderConfig {
    fn default() -> ReaderConfig {
        ReaderConfig { max_field_len: 16 << 20 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvalConfig {
    /// Worker threads for verification. `None` uses rayon's global pool.
    pub threads: Option<usize>,
    /// Only score these ids when set.
    pub specific_ids: Option<BTreeSet<PuzzleId>>,
    pub reader: ReaderConfig,
}

/// Whether candidates are verified is chosen by the `Gate` handed to the
/// combiner, not here.
#[derive(Debug, Clone, Default)]
pub struct CombineConfig {
    pub threads: Option<usize>,
    pub reader: ReaderConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportConfig {
    pub top_n: usize,
    pub reader: ReaderConfig,
}

impl Default for ReportConfig {
    fn default() -> ReportConfig {
        ReportConfig { top_n: 10, reader: ReaderConfig::default() }
    }
}

/// Runs `f` on a dedicated pool of `threads` workers, or on the global pool.
pub(crate) fn with_pool<T: Send>(threads: Option<usize>, f: impl FnOnce() -> T + Send) -> T {
    let Some(n) = threads else {
        return f();
    };
    match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
        Ok(pool) => pool.install(f),
        Err(e) => {
            warn!("could not start {n} worker threads ({e}); using the global pool");
            f()
        }
    }
}
