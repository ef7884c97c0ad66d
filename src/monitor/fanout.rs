// Order-preserving fan-out: one tokio task per input, results scattered back by index

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::warn;

/// Runs `task(input)` concurrently for every input and returns the outputs in input order,
/// whatever order the tasks complete in. A task that panics or outlives `deadline`
/// yields `fallback(index)` instead.
pub(crate) async fn gather_indexed<I, T, F, Fut, D>(
    inputs: Vec<I>,
    deadline: Option<Duration>,
    task: F,
    fallback: D,
) -> Vec<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
    D: Fn(usize) -> T,
{
    let count = inputs.len();
    let mut set = JoinSet::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let work = task(input);
        set.spawn(async move {
            let value = match deadline {
                Some(limit) => tokio::time::timeout(limit, work).await.ok(),
                None => Some(work.await),
            };
            (index, value)
        });
    }

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(count).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, Some(value))) => slots[index] = Some(value),
            Ok((index, None)) => warn!(
                index,
                deadline_ms = deadline.map(|d| d.as_millis() as u64),
                "sampling task timed out"
            ),
            Err(e) => warn!(error = %e, "sampling task failed"),
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.unwrap_or_else(|| fallback(index)))
        .collect()
}
