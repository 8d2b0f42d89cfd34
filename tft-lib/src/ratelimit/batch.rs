use futures::future::try_join_all;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use crate::Result;

/// Run `f` for every key with at most `concurrency` calls in progress.
///
/// A fixed set of workers pull the next key as soon as their previous call
/// settles, so a slow key never holds back the rest. Results come back in
/// the order of `keys`. The first error fails the whole batch and the
/// remaining results are discarded.
///
/// `concurrency` defaults to the number of keys and is never less than one.
/// An empty batch returns right away without calling `f`.
pub async fn run_batch<K, T, F, Fut>(
    keys: Vec<K>,
    concurrency: Option<usize>,
    f: F,
) -> Result<Vec<T>>
where
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let total = keys.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let workers = concurrency.unwrap_or(total).clamp(1, total);
    log::debug!("Running batch of {total} with {workers} worker(s)");

    let pending = Mutex::new(keys.into_iter().enumerate());
    let next = || {
        pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    };
    let (next, f) = (&next, &f);

    let worker = || async move {
        let mut done = Vec::new();
        while let Some((index, key)) = next() {
            done.push((index, f(key).await?));
        }
        Ok::<_, crate::ErrorKind>(done)
    };

    let finished = try_join_all((0..workers).map(|_| worker())).await?;

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
    for (index, value) in finished.into_iter().flatten() {
        slots[index] = Some(value);
    }
    Ok(slots.into_iter().flatten().collect())
}
