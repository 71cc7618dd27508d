//! Internal functions that are used by tests - can be changed anytime

use crate::Error;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{LazyLock, OnceLock};

/// The thread count chosen by [crate::set_max_threads]. Fixed on first use of the pool.
pub(crate) static MAX_THREADS: OnceLock<usize> = OnceLock::new();

/// The library-specific thread pool. If it cannot be built, work runs on the calling thread.
static THREAD_POOL: LazyLock<Option<ThreadPool>> = LazyLock::new(|| {
    let threads = *MAX_THREADS.get_or_init(num_cpus::get);

    match ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|idx| format!("rngcheck-{idx}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!("could not build a thread pool with {threads} threads: {e}");
            None
        }
    }
});

/// Runs `op` inside the library thread pool, so that parallel iterators inside `op` do not use
/// the rayon global pool of the caller.
pub(crate) fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    match THREAD_POOL.as_ref() {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// Checks if the given f64 value is NaN or infinite, returning the appropriate error
pub(crate) fn check_f64(value: f64) -> Result<(), Error> {
    if value.is_nan() {
        Err(Error::NaN)
    } else if value.is_infinite() {
        Err(Error::Infinite)
    } else {
        Ok(())
    }
}

/// Allocates a zeroed working buffer, reporting a failed allocation instead of aborting.
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, Error> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::InsufficientMemory(len.saturating_mul(size_of::<T>())))?;
    buffer.resize(len, T::default());
    Ok(buffer)
}

/// Reads `length` bits starting at bit `start` as an unsigned number, the first bit being the
/// most significant one. Indices wrap around at `bit_count`, which is used for the cyclic
/// pattern counts.
#[inline]
pub(crate) fn pattern_at(
    data: &crate::BitView<'_>,
    start: usize,
    length: usize,
    bit_count: usize,
) -> usize {
    (0..length).fold(0, |pattern, offset| {
        (pattern << 1) | data.get((start + offset) % bit_count) as usize
    })
}
