//! Thread pools for the permutation loop.
//!
//! Runs without an explicit job count share one lazily built pool with a
//! larger stack; an explicit `n_jobs` gets a dedicated pool of that size.
//! Only built with the `parallel` feature; the sequential path runs on the
//! calling thread.

use std::sync::OnceLock;

use rayon::ThreadPool;

static THREAD_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

const STACK_SIZE: usize = 8 * 1024 * 1024;

/// The shared pool, or `None` if it could not be built.
pub fn get_thread_pool() -> Option<&'static ThreadPool> {
    THREAD_POOL
        .get_or_init(|| match rayon::ThreadPoolBuilder::new().stack_size(STACK_SIZE).build() {
            Ok(pool) => Some(pool),
            Err(err) => {
                tracing::warn!(%err, "failed to build shared thread pool, using rayon's global pool");
                None
            }
        })
        .as_ref()
}

/// Run `op` inside the pool selected by `n_jobs`.
///
/// `None` uses the shared pool. `Some(n)` builds a pool with `n` workers
/// for this call only.
pub fn install<OP, R>(n_jobs: Option<usize>, op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    match n_jobs {
        Some(n) => match rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .stack_size(STACK_SIZE)
            .build()
        {
            Ok(pool) => pool.install(op),
            Err(err) => {
                tracing::warn!(%err, n_jobs = n, "failed to build dedicated thread pool, using shared pool");
                install(None, op)
            }
        },
        None => match get_thread_pool() {
            Some(pool) => pool.install(op),
            None => op(),
        },
    }
}
